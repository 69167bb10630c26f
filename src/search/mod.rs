//! Orientation search over rotation samples.
//!
//! Every search is the same loop: score each sampled rotation, keep the best
//! (or worst). What differs is how a rotation is scored, which is captured by
//! [`ViewScorer`]:
//!
//! - [`MetricScorer`] — an [`InformationField`] followed by an [`InfoMetric`]
//! - [`TraceScorer`] — a [`TraceField`] used directly as the score
//!
//! The named entry points in [`optim`] wire the fields from [`crate::field`] and
//! [`crate::regression`] into these scorers. [`closed_form`] solves the trace
//! problem analytically, and [`batch`] runs everything over many candidate
//! positions in parallel.

pub mod batch;
pub mod closed_form;
pub mod optim;

use nalgebra::{Matrix3, Rotation3, UnitQuaternion};

use crate::field::{InformationField, TraceField};
use crate::metric::{InfoMetric, MetricFault};

pub use batch::{
    optimize_orientations, BatchTimings, OptimOrientResult, OrientBatch, OrientConfig,
    OrientFault, SearchMethod,
};
pub use closed_form::{closed_form_trace_optimum, ClosedFormFailure, TraceExtremum};
pub use optim::{
    search_best, search_exact, search_kernel, search_kernel_trace, search_regression,
    search_regression_trace, search_worst, search_worst_by,
};

/// A rotation and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimalView {
    /// Camera-to-world rotation (+Z is the optical axis).
    pub rotation: Rotation3<f64>,
    pub value: f64,
}

impl OptimalView {
    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&self.rotation)
    }
}

/// "Given a rotation, produce a score."
pub trait ViewScorer: Sync {
    fn score(&self, rotation: &Rotation3<f64>) -> Result<f64, MetricFault>;
}

/// Scores a rotation by evaluating a metric on a field's information matrix.
pub struct MetricScorer<'a, F: InformationField + ?Sized, M: InfoMetric> {
    pub field: &'a F,
    pub metric: &'a M,
}

impl<'a, F: InformationField + ?Sized, M: InfoMetric> MetricScorer<'a, F, M> {
    pub fn new(field: &'a F, metric: &'a M) -> Self {
        Self { field, metric }
    }

    /// Information matrix behind the score, for diagnostics.
    pub fn information(&self, rotation: &Rotation3<f64>) -> Matrix3<f64> {
        self.field.information(rotation)
    }
}

impl<F: InformationField + ?Sized, M: InfoMetric> ViewScorer for MetricScorer<'_, F, M> {
    fn score(&self, rotation: &Rotation3<f64>) -> Result<f64, MetricFault> {
        let info = self.field.information(rotation);
        self.metric.evaluate(&info)
    }
}

/// Scores a rotation by the trace of a trace-only field.
pub struct TraceScorer<'a, T: TraceField + ?Sized> {
    pub field: &'a T,
}

impl<'a, T: TraceField + ?Sized> TraceScorer<'a, T> {
    pub fn new(field: &'a T) -> Self {
        Self { field }
    }
}

impl<T: TraceField + ?Sized> ViewScorer for TraceScorer<'_, T> {
    fn score(&self, rotation: &Rotation3<f64>) -> Result<f64, MetricFault> {
        let t = self.field.trace(rotation);
        if t.is_finite() {
            Ok(t)
        } else {
            Err(MetricFault::NonFiniteTrace)
        }
    }
}

