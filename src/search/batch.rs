//! Batch orientation optimization over many candidate positions.
//!
//! Each position is an independent task: build the kernels and voxels it needs,
//! run every requested (method, metric) search, and solve the closed-form trace
//! problem. Tasks run on the rayon pool and share only read-only state (the
//! rotation samples, the visibility surrogate, the camera and the approximator).
//!
//! A numerical fault in one search never aborts the batch. The affected entry is
//! given a NaN score and the first sample's rotation, and an [`OrientFault`] is
//! recorded. Timings are measured per task and summed in position order after
//! all tasks finish, so the totals are reproducible.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use nalgebra::{Rotation3, UnitQuaternion, Vector3};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::camera_model::FieldOfView;
use crate::kernels::{InfoKernels, TraceKernels};
use crate::metric::{DetMetric, MetricFault, MetricKind, MinEigMetric, TraceMetric};
use crate::regression::{RegressionInfoVoxel, RegressionTraceVoxel, VisibilityApproximator};
use crate::sampler::RotationSampler;
use crate::visibility::{QuadraticVisibility, DEFAULT_BOUNDARY_VALUE, DEFAULT_REAR_VALUE};

use super::closed_form::{closed_form_trace_optimum, TraceExtremum};
use super::optim::{
    search_exact, search_kernel, search_kernel_trace, search_regression, search_regression_trace,
    search_worst,
};
use super::OptimalView;

/// Name of the closed-form trace result.
pub const CLOSED_FORM_RESULT: &str = "trace_closed_form";
/// Name of the sampled worst-trace result.
pub const WORST_RESULT: &str = "trace_worst";

// ── Configuration ───────────────────────────────────────────────────────────

/// Source of the information matrix for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    /// Quadratic visibility surrogate recombined from precomputed kernels.
    Kernel,
    /// Learned visibility approximator over direction-binned voxels.
    Regression,
    /// Direct summation through the camera model (ground truth).
    Exact,
}

impl SearchMethod {
    /// Suffix used in result names, e.g. `min_eig_app`.
    pub fn suffix(&self) -> &'static str {
        match self {
            SearchMethod::Kernel => "app",
            SearchMethod::Regression => "reg",
            SearchMethod::Exact => "exact",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Configuration for [`optimize_orientations`].
#[derive(Debug, Clone)]
pub struct OrientConfig {
    /// Half field of view of the visibility surrogate (radians).
    pub half_fov_rad: f64,
    /// Surrogate visibility at the field-of-view boundary.
    pub boundary_value: f64,
    /// Surrogate visibility straight behind the camera.
    pub rear_value: f64,
    /// Angular resolution of the rotation samples (degrees).
    pub angle_res_deg: f64,
    /// Roll samples per optical axis.
    ///
    /// Kernel and regression scores only depend on the optical axis, so one roll
    /// is enough for them. The exact search on a camera that is not
    /// [roll invariant](FieldOfView::roll_invariant) does depend on roll; when this
    /// is 1 it sweeps a full turn at `angle_res_deg` instead (see
    /// [`OrientConfig::exact_sampler`]).
    pub roll_steps: usize,
    /// Metrics to optimize.
    pub metrics: Vec<MetricKind>,
    /// Information sources to search with.
    pub methods: Vec<SearchMethod>,
    /// Also report the sampled worst view and the closed-form trace minimum.
    pub closed_form: bool,
}

impl Default for OrientConfig {
    fn default() -> Self {
        Self {
            half_fov_rad: std::f64::consts::FRAC_PI_4,
            boundary_value: DEFAULT_BOUNDARY_VALUE,
            rear_value: DEFAULT_REAR_VALUE,
            angle_res_deg: 10.0,
            roll_steps: 1,
            metrics: MetricKind::ALL.to_vec(),
            methods: vec![SearchMethod::Kernel, SearchMethod::Regression, SearchMethod::Exact],
            closed_form: true,
        }
    }
}

impl OrientConfig {
    /// Visibility surrogate described by this configuration.
    pub fn visibility(&self) -> anyhow::Result<QuadraticVisibility> {
        QuadraticVisibility::new(self.half_fov_rad, self.boundary_value, self.rear_value)
    }

    /// Rotation samples described by this configuration.
    pub fn sampler(&self) -> anyhow::Result<RotationSampler> {
        anyhow::ensure!(
            self.angle_res_deg > 0.0 && self.angle_res_deg <= 180.0,
            "angular resolution must be in (0, 180] degrees, got {}",
            self.angle_res_deg
        );
        anyhow::ensure!(self.roll_steps > 0, "roll_steps must be > 0");
        Ok(RotationSampler::with_roll_steps(
            self.angle_res_deg.to_radians(),
            self.roll_steps,
        ))
    }

    /// Rotation samples for the exact search through `camera`.
    ///
    /// Same optical axes as [`OrientConfig::sampler`]. For a camera whose
    /// visibility changes with roll, a single configured roll step is widened to
    /// `⌈360° / angle_res_deg⌉` rolls so the exact search covers all of SO(3). The
    /// first sample is the same in both sets.
    pub fn exact_sampler<C: FieldOfView + ?Sized>(
        &self,
        camera: &C,
    ) -> anyhow::Result<RotationSampler> {
        let sampler = self.sampler()?;
        if camera.roll_invariant() || self.roll_steps > 1 {
            return Ok(sampler);
        }
        let full_turn = ((360.0 / self.angle_res_deg) - 1e-9).ceil().max(1.0) as usize;
        Ok(RotationSampler::with_roll_steps(
            self.angle_res_deg.to_radians(),
            full_turn,
        ))
    }

    /// Names of the results produced, in output order.
    pub fn result_names(&self) -> Vec<String> {
        self.result_slots().into_iter().map(|s| s.name()).collect()
    }

    fn result_slots(&self) -> Vec<ResultSlot> {
        let mut slots: Vec<ResultSlot> = self
            .methods
            .iter()
            .flat_map(|&method| {
                self.metrics
                    .iter()
                    .map(move |&metric| ResultSlot::Search { method, metric })
            })
            .collect();
        if self.closed_form {
            // worst first: it is the closed form's fallback
            slots.push(ResultSlot::Worst);
            slots.push(ResultSlot::ClosedForm);
        }
        slots
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultSlot {
    Search { method: SearchMethod, metric: MetricKind },
    ClosedForm,
    Worst,
}

impl ResultSlot {
    fn name(&self) -> String {
        match self {
            ResultSlot::Search { method, metric } => format!("{}_{}", metric, method),
            ResultSlot::ClosedForm => CLOSED_FORM_RESULT.to_string(),
            ResultSlot::Worst => WORST_RESULT.to_string(),
        }
    }
}

// ── Results ─────────────────────────────────────────────────────────────────

/// Optimal rotation and score for every position, for one (method, metric).
#[derive(Debug, Clone)]
pub struct OptimOrientResult {
    pub name: String,
    /// Camera-to-world rotation per position.
    pub rotations: Vec<Rotation3<f64>>,
    /// Score per position; NaN where the search faulted.
    pub values: Vec<f64>,
}

impl OptimOrientResult {
    /// `n` entries with identity rotations and NaN scores.
    pub fn new(n: usize, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rotations: vec![Rotation3::identity(); n],
            values: vec![f64::NAN; n],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn set(&mut self, index: usize, view: &OptimalView) {
        self.rotations[index] = view.rotation;
        self.values[index] = view.value;
    }

    pub fn view(&self, index: usize) -> OptimalView {
        OptimalView {
            rotation: self.rotations[index],
            value: self.values[index],
        }
    }

    /// Rotation matrices flattened row-major, 9 values per position.
    pub fn rotation_matrices_flat(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.rotations.len() * 9);
        for r in &self.rotations {
            let m = r.matrix();
            for row in 0..3 {
                for col in 0..3 {
                    out.push(m[(row, col)]);
                }
            }
        }
        out
    }

    /// Rotations as unit quaternions `[w, x, y, z]`.
    pub fn quaternions(&self) -> Vec<[f64; 4]> {
        self.rotations
            .iter()
            .map(|r| {
                let q = UnitQuaternion::from_rotation_matrix(r);
                [q.w, q.i, q.j, q.k]
            })
            .collect()
    }

    /// Number of positions with a finite score.
    pub fn num_valid(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }
}

/// Diagnostic for a search that could not produce a score.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientFault {
    pub position_index: usize,
    /// Name of the affected result, e.g. `det_reg`.
    pub result: String,
    pub reason: String,
}

/// Accumulated wall-clock time per phase, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchTimings {
    pub build_info_kernels_ms: f64,
    pub build_trace_kernels_ms: f64,
    pub build_regression_info_ms: f64,
    pub build_regression_trace_ms: f64,
    /// Query time per result, aligned with [`OrientBatch::results`].
    pub query_ms: Vec<f64>,
}

impl BatchTimings {
    fn with_results(n: usize) -> Self {
        Self {
            query_ms: vec![0.0; n],
            ..Default::default()
        }
    }

    fn accumulate(&mut self, other: &BatchTimings) {
        self.build_info_kernels_ms += other.build_info_kernels_ms;
        self.build_trace_kernels_ms += other.build_trace_kernels_ms;
        self.build_regression_info_ms += other.build_regression_info_ms;
        self.build_regression_trace_ms += other.build_regression_trace_ms;
        for (a, b) in self.query_ms.iter_mut().zip(&other.query_ms) {
            *a += b;
        }
    }
}

/// Output of [`optimize_orientations`].
#[derive(Debug, Clone)]
pub struct OrientBatch {
    pub positions: Vec<Vector3<f64>>,
    pub results: Vec<OptimOrientResult>,
    pub faults: Vec<OrientFault>,
    /// Positions where the closed form failed and the sampled worst view was used.
    pub closed_form_fallbacks: Vec<usize>,
    pub timings: BatchTimings,
    pub num_samples: usize,
    /// Rotation samples per position for the exact search; zero if it was not run.
    pub num_exact_samples: usize,
}

impl OrientBatch {
    /// Result by name, e.g. `"trace_exact"`.
    pub fn result(&self, name: &str) -> Option<&OptimOrientResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

// ── Per-position task ───────────────────────────────────────────────────────

struct BatchContext<'a, C: FieldOfView> {
    slots: Vec<ResultSlot>,
    samples: RotationSampler,
    exact_samples: Option<RotationSampler>,
    visibility: QuadraticVisibility,
    landmarks: &'a [Vector3<f64>],
    camera: &'a C,
    approximator: Option<Arc<VisibilityApproximator>>,
}

struct PositionOutcome {
    views: Vec<OptimalView>,
    faults: Vec<OrientFault>,
    closed_form_fallback: bool,
    timings: BatchTimings,
}

/// What each position needs built, derived once from the requested slots.
#[derive(Debug, Clone, Copy, Default)]
struct BuildPlan {
    info_kernels: bool,
    trace_kernels: bool,
    regression_info: bool,
    regression_trace: bool,
}

impl BuildPlan {
    fn from_slots(slots: &[ResultSlot]) -> Self {
        let mut plan = BuildPlan::default();
        for slot in slots {
            match *slot {
                ResultSlot::Search { method: SearchMethod::Kernel, metric: MetricKind::Trace } => {
                    plan.trace_kernels = true
                }
                ResultSlot::Search { method: SearchMethod::Kernel, .. } => plan.info_kernels = true,
                ResultSlot::Search { method: SearchMethod::Regression, metric: MetricKind::Trace } => {
                    plan.regression_trace = true
                }
                ResultSlot::Search { method: SearchMethod::Regression, .. } => {
                    plan.regression_info = true
                }
                ResultSlot::Search { method: SearchMethod::Exact, .. } => {}
                ResultSlot::ClosedForm | ResultSlot::Worst => plan.trace_kernels = true,
            }
        }
        plan
    }
}

fn elapsed_ms(t0: Instant) -> f64 {
    t0.elapsed().as_secs_f64() * 1000.0
}

fn timed<T>(acc: &mut f64, f: impl FnOnce() -> T) -> T {
    let t0 = Instant::now();
    let out = f();
    *acc += elapsed_ms(t0);
    out
}

fn optimize_position<C: FieldOfView>(
    ctx: &BatchContext<'_, C>,
    plan: BuildPlan,
    index: usize,
    position: &Vector3<f64>,
) -> PositionOutcome {
    let mut timings = BatchTimings::with_results(ctx.slots.len());
    let landmarks = ctx.landmarks;

    let info = plan
        .info_kernels
        .then(|| timed(&mut timings.build_info_kernels_ms, || InfoKernels::build(position, landmarks)));
    let trace = plan
        .trace_kernels
        .then(|| timed(&mut timings.build_trace_kernels_ms, || TraceKernels::build(position, landmarks)));
    let (reg_info, reg_trace) = match &ctx.approximator {
        Some(approx) => (
            plan.regression_info.then(|| {
                timed(&mut timings.build_regression_info_ms, || {
                    RegressionInfoVoxel::build(approx.clone(), position, landmarks)
                })
            }),
            plan.regression_trace.then(|| {
                timed(&mut timings.build_regression_trace_ms, || {
                    RegressionTraceVoxel::build(approx.clone(), position, landmarks)
                })
            }),
        ),
        None => (None, None),
    };

    let samples = &ctx.samples;
    let vis = &ctx.visibility;
    let fallback_view = OptimalView {
        rotation: samples.rotations()[0],
        value: f64::NAN,
    };

    let mut views = Vec::with_capacity(ctx.slots.len());
    let mut faults = Vec::new();
    let mut worst: Option<OptimalView> = None;
    let mut closed_form_fallback = false;

    for (slot_idx, slot) in ctx.slots.iter().enumerate() {
        let t0 = Instant::now();
        let outcome: Result<OptimalView, String> = match *slot {
            ResultSlot::Search { method, metric } => {
                let searched = match (method, metric) {
                    (SearchMethod::Kernel, MetricKind::Trace) => {
                        trace.as_ref().map(|k| search_kernel_trace(samples, vis, k))
                    }
                    (SearchMethod::Kernel, kind) => {
                        info.as_ref().map(|k| kernel_info(samples, vis, k, kind))
                    }
                    (SearchMethod::Regression, MetricKind::Trace) => {
                        reg_trace.as_ref().map(|v| search_regression_trace(samples, v))
                    }
                    (SearchMethod::Regression, kind) => {
                        reg_info.as_ref().map(|v| regression_info(samples, v, kind))
                    }
                    (SearchMethod::Exact, kind) => ctx
                        .exact_samples
                        .as_ref()
                        .map(|exact_samples| exact(ctx, exact_samples, position, kind)),
                };
                match searched {
                    Some(result) => result.map_err(|e| e.to_string()),
                    None => Err("information source was not built".to_string()),
                }
            }
            ResultSlot::Worst => match &trace {
                Some(k) => search_worst(samples, vis, k).map_err(|e| e.to_string()),
                None => Err("trace kernels were not built".to_string()),
            },
            ResultSlot::ClosedForm => match &trace {
                Some(k) => match closed_form_trace_optimum(vis, k, TraceExtremum::Minimum) {
                    Ok(view) => Ok(view),
                    Err(failure) => {
                        closed_form_fallback = true;
                        warn!(
                            "Position {}: closed-form trace optimum failed ({}), using sampled worst view",
                            index, failure
                        );
                        worst.ok_or_else(|| format!("closed form failed ({failure}) and no fallback"))
                    }
                },
                None => Err("trace kernels were not built".to_string()),
            },
        };
        timings.query_ms[slot_idx] += elapsed_ms(t0);

        match outcome {
            Ok(view) => {
                if *slot == ResultSlot::Worst {
                    worst = Some(view);
                }
                views.push(view);
            }
            Err(reason) => {
                let result = slot.name();
                warn!("Position {} [{}]: {}", index, result, reason);
                faults.push(OrientFault {
                    position_index: index,
                    result,
                    reason,
                });
                views.push(fallback_view);
            }
        }
    }

    debug!(
        "Position {} ({:.2}, {:.2}, {:.2}): {} results, {} faults",
        index,
        position.x,
        position.y,
        position.z,
        views.len(),
        faults.len()
    );

    PositionOutcome {
        views,
        faults,
        closed_form_fallback,
        timings,
    }
}

// One monomorphized search per metric strategy.

fn kernel_info(
    samples: &RotationSampler,
    vis: &QuadraticVisibility,
    kernels: &InfoKernels,
    kind: MetricKind,
) -> Result<OptimalView, MetricFault> {
    match kind {
        MetricKind::MinEig => search_kernel(samples, vis, kernels, &MinEigMetric),
        MetricKind::Det => search_kernel(samples, vis, kernels, &DetMetric),
        MetricKind::Trace => search_kernel(samples, vis, kernels, &TraceMetric),
    }
}

fn regression_info(
    samples: &RotationSampler,
    voxel: &RegressionInfoVoxel,
    kind: MetricKind,
) -> Result<OptimalView, MetricFault> {
    match kind {
        MetricKind::MinEig => search_regression(samples, voxel, &MinEigMetric),
        MetricKind::Det => search_regression(samples, voxel, &DetMetric),
        MetricKind::Trace => search_regression(samples, voxel, &TraceMetric),
    }
}

fn exact<C: FieldOfView>(
    ctx: &BatchContext<'_, C>,
    samples: &RotationSampler,
    position: &Vector3<f64>,
    kind: MetricKind,
) -> Result<OptimalView, MetricFault> {
    let (landmarks, camera) = (ctx.landmarks, ctx.camera);
    match kind {
        MetricKind::MinEig => search_exact(samples, position, landmarks, camera, &MinEigMetric),
        MetricKind::Det => search_exact(samples, position, landmarks, camera, &DetMetric),
        MetricKind::Trace => search_exact(samples, position, landmarks, camera, &TraceMetric),
    }
}

// ── Batch entry point ───────────────────────────────────────────────────────

/// Optimal orientation at every position in `positions`.
///
/// `camera` is the visibility model for [`SearchMethod::Exact`].
/// `approximator` is required when [`SearchMethod::Regression`] is requested.
pub fn optimize_orientations<C: FieldOfView>(
    config: &OrientConfig,
    landmarks: &[Vector3<f64>],
    positions: &[Vector3<f64>],
    camera: &C,
    approximator: Option<Arc<VisibilityApproximator>>,
) -> anyhow::Result<OrientBatch> {
    let visibility = config.visibility()?;
    let samples = config.sampler()?;
    let slots = config.result_slots();
    anyhow::ensure!(!slots.is_empty(), "no methods, metrics or closed form requested");
    let exact_samples = if config.methods.contains(&SearchMethod::Exact) {
        let exact_samples = config.exact_sampler(camera)?;
        if exact_samples.len() != samples.len() {
            info!(
                "Camera visibility depends on roll: exact search uses {} rolls per axis ({} samples)",
                exact_samples.roll_steps(),
                exact_samples.len()
            );
        }
        Some(exact_samples)
    } else {
        None
    };

    if config.methods.contains(&SearchMethod::Regression) {
        match &approximator {
            None => anyhow::bail!("regression search requested without a visibility approximator"),
            Some(approx) => {
                if (approx.props.half_fov_rad - config.half_fov_rad).abs() > 1e-6 {
                    warn!(
                        "Approximator was trained for hfov {:.1}° but the batch uses {:.1}°",
                        approx.props.half_fov_rad.to_degrees(),
                        config.half_fov_rad.to_degrees()
                    );
                }
            }
        }
    }

    info!(
        "Optimizing orientations at {} positions with {} landmarks: {} rotation samples ({}° resolution), {} results",
        positions.len(),
        landmarks.len(),
        samples.len(),
        config.angle_res_deg,
        slots.len()
    );

    let plan = BuildPlan::from_slots(&slots);
    let ctx = BatchContext {
        slots,
        samples,
        exact_samples,
        visibility,
        landmarks,
        camera,
        approximator,
    };

    let t0 = Instant::now();
    let outcomes: Vec<PositionOutcome> = positions
        .par_iter()
        .enumerate()
        .map(|(i, p)| optimize_position(&ctx, plan, i, p))
        .collect();
    let wall_ms = elapsed_ms(t0);

    let mut results: Vec<OptimOrientResult> = ctx
        .slots
        .iter()
        .map(|s| OptimOrientResult::new(positions.len(), s.name()))
        .collect();
    let mut faults = Vec::new();
    let mut closed_form_fallbacks = Vec::new();
    let mut timings = BatchTimings::with_results(ctx.slots.len());
    for (i, outcome) in outcomes.into_iter().enumerate() {
        for (result, view) in results.iter_mut().zip(&outcome.views) {
            result.set(i, view);
        }
        if outcome.closed_form_fallback {
            closed_form_fallbacks.push(i);
        }
        faults.extend(outcome.faults);
        timings.accumulate(&outcome.timings);
    }

    info!(
        "Built kernels in {:.1}ms (info) / {:.1}ms (trace), regression voxels in {:.1}ms (info) / {:.1}ms (trace)",
        timings.build_info_kernels_ms,
        timings.build_trace_kernels_ms,
        timings.build_regression_info_ms,
        timings.build_regression_trace_ms
    );
    for (result, ms) in results.iter().zip(&timings.query_ms) {
        info!("  {}: {:.1}ms total query time", result.name, ms);
    }
    info!(
        "Batch finished in {:.1}ms: {} faults, {} closed-form fallbacks",
        wall_ms,
        faults.len(),
        closed_form_fallbacks.len()
    );

    Ok(OrientBatch {
        positions: positions.to_vec(),
        results,
        faults,
        closed_form_fallbacks,
        timings,
        num_samples: ctx.samples.len(),
        num_exact_samples: ctx.exact_samples.as_ref().map_or(0, RotationSampler::len),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_names() {
        let config = OrientConfig::default();
        let names = config.result_names();
        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "min_eig_app");
        assert_eq!(names[2], "trace_app");
        assert_eq!(names[4], "det_reg");
        assert_eq!(names[8], "trace_exact");
        assert_eq!(names[9], WORST_RESULT);
        assert_eq!(names[10], CLOSED_FORM_RESULT);
    }

    #[test]
    fn test_build_plan() {
        let config = OrientConfig {
            methods: vec![SearchMethod::Kernel],
            metrics: vec![MetricKind::Trace],
            closed_form: false,
            ..Default::default()
        };
        let plan = BuildPlan::from_slots(&config.result_slots());
        assert!(plan.trace_kernels);
        assert!(!plan.info_kernels && !plan.regression_info && !plan.regression_trace);
    }

    #[test]
    fn test_flat_views() {
        let mut result = OptimOrientResult::new(2, "x");
        assert_eq!(result.num_valid(), 0);
        let r = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.3);
        result.set(1, &OptimalView { rotation: r, value: 2.0 });
        let flat = result.rotation_matrices_flat();
        assert_eq!(flat.len(), 18);
        assert_eq!(&flat[..9], &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        assert!((flat[9 + 2] - r.matrix()[(0, 2)]).abs() < 1e-15);
        assert!((flat[9 + 6] - r.matrix()[(2, 0)]).abs() < 1e-15);
        assert_eq!(result.num_valid(), 1);
        let q = result.quaternions()[0];
        assert_eq!(q, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_each_metric_kind_uses_its_own_strategy() {
        let position = Vector3::zeros();
        let landmarks = [
            Vector3::new(3.0, 0.2, 0.1),
            Vector3::new(2.5, -0.5, 0.4),
            Vector3::new(0.0, 4.0, 1.0),
            Vector3::new(-1.0, 0.5, 3.0),
        ];
        let vis = QuadraticVisibility::second_order(std::f64::consts::FRAC_PI_4).unwrap();
        let kernels = InfoKernels::build(&position, &landmarks);
        let samples = RotationSampler::from_degrees(20.0);

        let min_eig = kernel_info(&samples, &vis, &kernels, MetricKind::MinEig).unwrap();
        let det = kernel_info(&samples, &vis, &kernels, MetricKind::Det).unwrap();
        let trace = kernel_info(&samples, &vis, &kernels, MetricKind::Trace).unwrap();
        assert_eq!(min_eig, search_kernel(&samples, &vis, &kernels, &MinEigMetric).unwrap());
        assert_eq!(det, search_kernel(&samples, &vis, &kernels, &DetMetric).unwrap());
        assert_eq!(trace, search_kernel(&samples, &vis, &kernels, &TraceMetric).unwrap());
        assert!(min_eig.value != det.value && det.value != trace.value);
    }

    #[test]
    fn test_exact_sampler_sweeps_roll_for_pinhole() {
        let config = OrientConfig {
            angle_res_deg: 20.0,
            ..Default::default()
        };
        let base = config.sampler().unwrap();
        let vis = config.visibility().unwrap();
        assert_eq!(config.exact_sampler(&vis).unwrap().len(), base.len());

        let cam = crate::camera_model::PinholeCamera::default();
        let exact = config.exact_sampler(&cam).unwrap();
        assert_eq!(exact.roll_steps(), 18);
        assert_eq!(exact.len(), 18 * base.len());
        assert_eq!(exact.axes(), base.axes());
        assert_eq!(exact.rotations()[0], base.rotations()[0]);

        // An explicit roll count is kept as is
        let rolled = OrientConfig {
            roll_steps: 3,
            ..config
        };
        assert_eq!(rolled.exact_sampler(&cam).unwrap().roll_steps(), 3);
    }

    #[test]
    fn test_regression_requires_approximator() {
        let cam = crate::camera_model::PinholeCamera::default();
        let err = optimize_orientations(
            &OrientConfig::default(),
            &[Vector3::new(1.0, 0.0, 0.0)],
            &[Vector3::zeros()],
            &cam,
            None,
        );
        assert!(err.is_err());
    }
}
