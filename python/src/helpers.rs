use nalgebra::Vector3;
use numpy::PyReadonlyArray2;
use pyo3::prelude::*;

use optim_orient::{MetricKind, SearchMethod};

/// Parse an Nx3 array of points.
pub(crate) fn parse_points(points: &PyReadonlyArray2<f64>, what: &str) -> PyResult<Vec<Vector3<f64>>> {
    let a = points.as_array();
    if a.shape()[1] != 3 {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "{} must be an Nx3 array, got {} columns",
            what,
            a.shape()[1]
        )));
    }
    Ok((0..a.shape()[0])
        .map(|i| Vector3::new(a[[i, 0]], a[[i, 1]], a[[i, 2]]))
        .collect())
}

/// Parse metric names ("min_eig", "det", "trace"). None = all metrics.
pub(crate) fn parse_metrics(names: Option<Vec<String>>) -> PyResult<Vec<MetricKind>> {
    let Some(names) = names else {
        return Ok(MetricKind::ALL.to_vec());
    };
    names
        .iter()
        .map(|n| {
            MetricKind::ALL
                .into_iter()
                .find(|k| k.name() == n.as_str())
                .ok_or_else(|| {
                    pyo3::exceptions::PyValueError::new_err(format!(
                        "unknown metric '{}', expected one of: min_eig, det, trace",
                        n
                    ))
                })
        })
        .collect()
}

/// Parse method names ("app"/"kernel", "reg"/"regression", "exact"). None = all methods.
pub(crate) fn parse_methods(names: Option<Vec<String>>) -> PyResult<Vec<SearchMethod>> {
    let Some(names) = names else {
        return Ok(vec![
            SearchMethod::Kernel,
            SearchMethod::Regression,
            SearchMethod::Exact,
        ]);
    };
    names
        .iter()
        .map(|n| match n.as_str() {
            "app" | "kernel" => Ok(SearchMethod::Kernel),
            "reg" | "regression" => Ok(SearchMethod::Regression),
            "exact" => Ok(SearchMethod::Exact),
            other => Err(pyo3::exceptions::PyValueError::new_err(format!(
                "unknown method '{}', expected one of: kernel, regression, exact",
                other
            ))),
        })
        .collect()
}
