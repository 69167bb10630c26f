//! Python bindings for optim-orient via PyO3.
//!
//! Exposes the batch orientation optimizer to Python as the `optim_orient_py` module.

mod camera_model;
mod helpers;

use std::sync::Arc;

use numpy::ndarray;
use numpy::{PyArray1, PyArray2, PyArray3, PyReadonlyArray2};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use optim_orient::{
    ApproximatorProperties, GridConfig, OrientBatch, OrientConfig, QuadraticVisibility,
    VisibilityApproximator,
};

use camera_model::PyPinholeCamera;
use helpers::{parse_methods, parse_metrics, parse_points};

// ═══════════════════════════════════════════════════════════════════════════
// PyVisibilityApproximator — wraps Arc<VisibilityApproximator>
// ═══════════════════════════════════════════════════════════════════════════

/// A trained visibility approximator for the regression search.
///
/// Example:
///     approx = optim_orient_py.VisibilityApproximator.load_from_file("fov45.rkyv")
#[pyclass(name = "VisibilityApproximator", frozen)]
struct PyVisibilityApproximator {
    inner: Arc<VisibilityApproximator>,
}

#[pymethods]
impl PyVisibilityApproximator {
    /// Build an approximator from trained radial-basis parameters.
    ///
    /// Args:
    ///     centers: Basis centers (cosine of the off-axis angle).
    ///     weights: Basis weights, one per center.
    ///     bias: Constant offset.
    ///     half_fov_deg: Half field of view the approximator was trained for.
    ///     num_direction_bins: Landmark compression bins. Default 200.
    ///     length_scale: Basis length scale in cosine units. Default 0.1.
    #[new]
    #[pyo3(signature = (centers, weights, bias, half_fov_deg = 45.0, num_direction_bins = 200, length_scale = 0.1, num_training_landmarks = 0))]
    fn new(
        centers: Vec<f64>,
        weights: Vec<f64>,
        bias: f64,
        half_fov_deg: f64,
        num_direction_bins: u32,
        length_scale: f64,
        num_training_landmarks: u32,
    ) -> PyResult<Self> {
        let props = ApproximatorProperties {
            half_fov_rad: half_fov_deg.to_radians(),
            num_direction_bins,
            length_scale,
            num_training_landmarks,
        };
        let approx = VisibilityApproximator::new(props, centers, weights, bias)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(approx),
        })
    }

    /// Save the approximator to a file.
    fn save_to_file(&self, path: &str) -> PyResult<()> {
        self.inner
            .save_to_file(path)
            .map_err(|e| pyo3::exceptions::PyIOError::new_err(e.to_string()))
    }

    /// Load an approximator from a file.
    #[staticmethod]
    fn load_from_file(path: &str) -> PyResult<Self> {
        let inner = VisibilityApproximator::load_shared(path)
            .map_err(|e| pyo3::exceptions::PyIOError::new_err(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Predicted visibility for the cosine between optical axis and bearing.
    fn predict(&self, x: f64) -> f64 {
        self.inner.predict(x)
    }

    #[getter]
    fn half_fov_deg(&self) -> f64 {
        self.inner.props.half_fov_rad.to_degrees()
    }

    #[getter]
    fn num_bins(&self) -> usize {
        self.inner.num_bins()
    }

    fn __repr__(&self) -> String {
        format!(
            "VisibilityApproximator(basis={}, bins={}, hfov={:.1}°)",
            self.inner.centers.len(),
            self.inner.num_bins(),
            self.inner.props.half_fov_rad.to_degrees(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// optimize_orientations — the batch optimizer
// ═══════════════════════════════════════════════════════════════════════════

fn batch_to_dict<'py>(py: Python<'py>, batch: &OrientBatch) -> PyResult<Bound<'py, PyDict>> {
    let results = PyDict::new(py);
    for (result, ms) in batch.results.iter().zip(&batch.timings.query_ms) {
        let n = result.len();
        let rotations = ndarray::Array3::from_shape_vec((n, 3, 3), result.rotation_matrices_flat())
            .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))?;
        let entry = PyDict::new(py);
        entry.set_item("rotations", PyArray3::from_owned_array(py, rotations))?;
        entry.set_item("values", PyArray1::from_vec(py, result.values.clone()))?;
        entry.set_item("query_time_ms", *ms)?;
        results.set_item(&result.name, entry)?;
    }

    let faults: Vec<(usize, String, String)> = batch
        .faults
        .iter()
        .map(|f| (f.position_index, f.result.clone(), f.reason.clone()))
        .collect();

    let timings = PyDict::new(py);
    timings.set_item("build_info_kernels_ms", batch.timings.build_info_kernels_ms)?;
    timings.set_item("build_trace_kernels_ms", batch.timings.build_trace_kernels_ms)?;
    timings.set_item("build_regression_info_ms", batch.timings.build_regression_info_ms)?;
    timings.set_item("build_regression_trace_ms", batch.timings.build_regression_trace_ms)?;

    let dict = PyDict::new(py);
    dict.set_item("results", results)?;
    dict.set_item("faults", faults)?;
    dict.set_item("closed_form_fallbacks", batch.closed_form_fallbacks.clone())?;
    dict.set_item("timings", timings)?;
    dict.set_item("num_samples", batch.num_samples)?;
    dict.set_item("num_exact_samples", batch.num_exact_samples)?;
    Ok(dict)
}

/// Find the optimal camera orientation at each candidate position.
///
/// Args:
///     landmarks: Nx3 numpy array of landmark positions.
///     positions: Mx3 numpy array of candidate camera positions.
///     half_fov_deg: Half field of view of the visibility surrogate. Default 45.
///     boundary_value: Surrogate visibility at the FOV boundary. Default 0.8.
///     rear_value: Surrogate visibility straight behind the camera. Default 0.
///     angle_res_deg: Rotation sampling resolution in degrees. Default 10.
///     roll_steps: Roll samples per optical axis. Default 1.
///     metrics: Metric names ("min_eig", "det", "trace"). None = all.
///     methods: Method names ("kernel", "regression", "exact"). None = all
///         (regression is dropped if no approximator is given).
///     closed_form: Also compute the closed-form and sampled worst trace views.
///     approximator: VisibilityApproximator for the regression search.
///     camera: PinholeCamera for the exact search. None = the default 600x600,
///         f=300 camera.
///     exact_on_surrogate: Run the exact search through the quadratic surrogate
///         instead of a camera. Its results then match the kernel search, so it
///         only checks kernel reconstruction. Cannot be combined with `camera`.
///
/// Returns:
///     dict with keys 'results' (name -> {'rotations': Mx3x3, 'values': M,
///     'query_time_ms'}), 'faults', 'closed_form_fallbacks', 'timings',
///     'num_samples', 'num_exact_samples'.
#[pyfunction]
#[pyo3(signature = (
    landmarks,
    positions,
    half_fov_deg = 45.0,
    boundary_value = 0.8,
    rear_value = 0.0,
    angle_res_deg = 10.0,
    roll_steps = 1,
    metrics = None,
    methods = None,
    closed_form = true,
    approximator = None,
    camera = None,
    exact_on_surrogate = false,
))]
fn optimize_orientations<'py>(
    py: Python<'py>,
    landmarks: PyReadonlyArray2<f64>,
    positions: PyReadonlyArray2<f64>,
    half_fov_deg: f64,
    boundary_value: f64,
    rear_value: f64,
    angle_res_deg: f64,
    roll_steps: usize,
    metrics: Option<Vec<String>>,
    methods: Option<Vec<String>>,
    closed_form: bool,
    approximator: Option<&Bound<'py, PyVisibilityApproximator>>,
    camera: Option<PyPinholeCamera>,
    exact_on_surrogate: bool,
) -> PyResult<Bound<'py, PyDict>> {
    if exact_on_surrogate && camera.is_some() {
        return Err(pyo3::exceptions::PyValueError::new_err(
            "exact_on_surrogate cannot be combined with an explicit camera",
        ));
    }
    let explicit_methods = methods.is_some();
    let landmarks = parse_points(&landmarks, "landmarks")?;
    let positions = parse_points(&positions, "positions")?;
    let approximator = approximator.map(|a| a.get().inner.clone());

    let mut config = OrientConfig {
        half_fov_rad: half_fov_deg.to_radians(),
        boundary_value,
        rear_value,
        angle_res_deg,
        roll_steps,
        metrics: parse_metrics(metrics)?,
        methods: parse_methods(methods)?,
        closed_form,
    };
    if approximator.is_none() && !explicit_methods {
        config
            .methods
            .retain(|m| *m != optim_orient::SearchMethod::Regression);
    }

    let camera = camera.map(|c| c.inner).unwrap_or_default();
    let batch = py
        .detach(|| {
            if exact_on_surrogate {
                let vis: QuadraticVisibility = config.visibility()?;
                optim_orient::optimize_orientations(&config, &landmarks, &positions, &vis, approximator)
            } else {
                optim_orient::optimize_orientations(
                    &config,
                    &landmarks,
                    &positions,
                    &camera,
                    approximator,
                )
            }
        })
        .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))?;

    batch_to_dict(py, &batch)
}

/// Candidate positions on a uniform grid centred at the origin.
///
/// Returns:
///     Nx3 numpy array of grid points.
#[pyfunction]
#[pyo3(signature = (x_range = 5.0, y_range = 5.0, z_range = 2.0, voxel_res = 0.5))]
fn uniform_grid_points<'py>(
    py: Python<'py>,
    x_range: f64,
    y_range: f64,
    z_range: f64,
    voxel_res: f64,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let config = GridConfig {
        x_range,
        y_range,
        z_range,
        voxel_res,
        ..Default::default()
    };
    let points = optim_orient::uniform_grid_points(&config)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
    let mut data = ndarray::Array2::<f64>::zeros((points.len(), 3));
    for (i, p) in points.iter().enumerate() {
        data[[i, 0]] = p.x;
        data[[i, 1]] = p.y;
        data[[i, 2]] = p.z;
    }
    Ok(PyArray2::from_owned_array(py, data))
}

// ═══════════════════════════════════════════════════════════════════════════
// Module definition
// ═══════════════════════════════════════════════════════════════════════════

/// optim_orient_py: camera orientation optimization over landmark maps
#[pymodule]
fn optim_orient_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyVisibilityApproximator>()?;
    m.add_class::<PyPinholeCamera>()?;
    m.add_function(wrap_pyfunction!(optimize_orientations, m)?)?;
    m.add_function(wrap_pyfunction!(uniform_grid_points, m)?)?;
    Ok(())
}
