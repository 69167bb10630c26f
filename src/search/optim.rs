//! Exhaustive search over rotation samples.
//!
//! Ties resolve to the earliest sample: a later sample replaces the incumbent
//! only if it is strictly better. For a degenerate position (no visible
//! landmarks) every score is zero and the first sample is returned.

use nalgebra::{Rotation3, Vector3};

use crate::camera_model::FieldOfView;
use crate::field::{ExactField, QuadraticInfoField, QuadraticTraceField};
use crate::kernels::{InfoKernels, TraceKernels};
use crate::metric::{InfoMetric, MetricFault};
use crate::regression::{RegressionInfoVoxel, RegressionTraceVoxel};
use crate::sampler::RotationSampler;
use crate::visibility::QuadraticVisibility;

use super::{MetricScorer, OptimalView, TraceScorer, ViewScorer};

/// Sample with the largest score.
///
/// Stops at the first fault: a single bad matrix makes the whole search
/// unreliable for this position. An empty `samples` slice is
/// [`MetricFault::NoSamples`].
pub fn search_best<S: ViewScorer + ?Sized>(
    samples: &[Rotation3<f64>],
    scorer: &S,
) -> Result<OptimalView, MetricFault> {
    extremum(samples, scorer, |candidate, incumbent| candidate > incumbent)
}

/// Sample with the smallest score.
pub fn search_worst_by<S: ViewScorer + ?Sized>(
    samples: &[Rotation3<f64>],
    scorer: &S,
) -> Result<OptimalView, MetricFault> {
    extremum(samples, scorer, |candidate, incumbent| candidate < incumbent)
}

fn extremum<S, F>(samples: &[Rotation3<f64>], scorer: &S, better: F) -> Result<OptimalView, MetricFault>
where
    S: ViewScorer + ?Sized,
    F: Fn(f64, f64) -> bool,
{
    let (first, rest) = samples.split_first().ok_or(MetricFault::NoSamples)?;
    let mut best = OptimalView {
        rotation: *first,
        value: scorer.score(first)?,
    };
    for rotation in rest {
        let value = scorer.score(rotation)?;
        if better(value, best.value) {
            best = OptimalView {
                rotation: *rotation,
                value,
            };
        }
    }
    Ok(best)
}

/// Best rotation from info kernels recombined with the visibility coefficients.
pub fn search_kernel<M: InfoMetric>(
    samples: &RotationSampler,
    visibility: &QuadraticVisibility,
    kernels: &InfoKernels,
    metric: &M,
) -> Result<OptimalView, MetricFault> {
    let field = QuadraticInfoField::new(visibility, kernels);
    search_best(samples.rotations(), &MetricScorer::new(&field, metric))
}

/// Best rotation for the trace metric from the cheaper trace kernels.
pub fn search_kernel_trace(
    samples: &RotationSampler,
    visibility: &QuadraticVisibility,
    kernels: &TraceKernels,
) -> Result<OptimalView, MetricFault> {
    let field = QuadraticTraceField::new(visibility, kernels);
    search_best(samples.rotations(), &TraceScorer::new(&field))
}

/// Worst rotation for the trace metric from trace kernels.
pub fn search_worst(
    samples: &RotationSampler,
    visibility: &QuadraticVisibility,
    kernels: &TraceKernels,
) -> Result<OptimalView, MetricFault> {
    let field = QuadraticTraceField::new(visibility, kernels);
    search_worst_by(samples.rotations(), &TraceScorer::new(&field))
}

/// Best rotation using a regression voxel as the information source.
pub fn search_regression<M: InfoMetric>(
    samples: &RotationSampler,
    voxel: &RegressionInfoVoxel,
    metric: &M,
) -> Result<OptimalView, MetricFault> {
    search_best(samples.rotations(), &MetricScorer::new(voxel, metric))
}

/// Best rotation for the trace metric using a trace-only regression voxel.
pub fn search_regression_trace(
    samples: &RotationSampler,
    voxel: &RegressionTraceVoxel,
) -> Result<OptimalView, MetricFault> {
    search_best(samples.rotations(), &TraceScorer::new(voxel))
}

/// Ground-truth search: per sample, sum the visible landmarks through `camera`.
///
/// Cost is `O(|samples|·|landmarks|)`; use it to validate the fast paths.
pub fn search_exact<C: FieldOfView, M: InfoMetric>(
    samples: &RotationSampler,
    position: &Vector3<f64>,
    landmarks: &[Vector3<f64>],
    camera: &C,
    metric: &M,
) -> Result<OptimalView, MetricFault> {
    let field = ExactField::new(*position, landmarks, camera);
    search_best(samples.rotations(), &MetricScorer::new(&field, metric))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{DetMetric, MinEigMetric, TraceMetric};

    fn scene() -> (Vector3<f64>, Vec<Vector3<f64>>) {
        let position = Vector3::new(0.0, 0.0, 0.0);
        let landmarks = vec![
            Vector3::new(3.0, 0.2, 0.1),
            Vector3::new(2.5, -0.5, 0.4),
            Vector3::new(3.2, 0.6, -0.6),
            Vector3::new(-4.0, 0.0, 1.0),
            Vector3::new(0.0, 5.0, -0.5),
        ];
        (position, landmarks)
    }

    #[test]
    fn test_best_dominates_every_sample() {
        let (position, landmarks) = scene();
        let vis = QuadraticVisibility::second_order(std::f64::consts::FRAC_PI_4).unwrap();
        let kernels = InfoKernels::build(&position, &landmarks);
        let samples = RotationSampler::from_degrees(15.0);
        let field = QuadraticInfoField::new(&vis, &kernels);

        let best = search_kernel(&samples, &vis, &kernels, &MinEigMetric).unwrap();
        let scorer = MetricScorer::new(&field, &MinEigMetric);
        for r in samples.rotations() {
            assert!(best.value >= scorer.score(r).unwrap());
        }
    }

    #[test]
    fn test_trace_kernels_agree_with_info_trace() {
        let (position, landmarks) = scene();
        let vis = QuadraticVisibility::second_order(std::f64::consts::FRAC_PI_4).unwrap();
        let info = InfoKernels::build(&position, &landmarks);
        let trace = TraceKernels::build(&position, &landmarks);
        let samples = RotationSampler::from_degrees(15.0);

        let a = search_kernel(&samples, &vis, &info, &TraceMetric).unwrap();
        let b = search_kernel_trace(&samples, &vis, &trace).unwrap();
        assert!((a.value - b.value).abs() < 1e-9);
        let worst = search_worst(&samples, &vis, &trace).unwrap();
        assert!(worst.value <= b.value);
    }

    #[test]
    fn test_best_faces_landmark_cluster() {
        let (position, landmarks) = scene();
        let cam = crate::camera_model::PinholeCamera::default();
        let samples = RotationSampler::from_degrees(10.0);
        let best = search_exact(&samples, &position, &landmarks, &cam, &TraceMetric).unwrap();
        // Three of five landmarks are clustered around +X and some sample sees all
        // of them.
        let cluster_trace = 2.0 / landmarks[0].norm_squared()
            + 2.0 / landmarks[1].norm_squared()
            + 2.0 / landmarks[2].norm_squared();
        assert!(best.value >= cluster_trace - 1e-12);
        let axis = crate::sampler::optical_axis(&best.rotation);
        assert!(axis.x > 0.3, "optical axis {:?} should face +X", axis);
    }

    #[test]
    fn test_degenerate_position_returns_first_sample() {
        let vis = QuadraticVisibility::second_order(std::f64::consts::FRAC_PI_4).unwrap();
        let kernels = InfoKernels::build(&Vector3::zeros(), &[]);
        let samples = RotationSampler::from_degrees(20.0);
        for view in [
            search_kernel(&samples, &vis, &kernels, &MinEigMetric).unwrap(),
            search_kernel(&samples, &vis, &kernels, &DetMetric).unwrap(),
            search_kernel(&samples, &vis, &kernels, &TraceMetric).unwrap(),
        ] {
            assert_eq!(view.value, 0.0);
            assert_eq!(view.rotation, samples.rotations()[0]);
        }
    }

    struct Faulty;

    impl ViewScorer for Faulty {
        fn score(&self, rotation: &Rotation3<f64>) -> Result<f64, MetricFault> {
            if rotation.matrix()[(2, 2)] < 0.0 {
                Err(MetricFault::NonFinite)
            } else {
                Ok(1.0)
            }
        }
    }

    #[test]
    fn test_empty_samples_are_a_fault() {
        assert_eq!(search_best(&[], &Faulty), Err(MetricFault::NoSamples));
        assert_eq!(search_worst_by(&[], &Faulty), Err(MetricFault::NoSamples));
    }

    #[test]
    fn test_fault_propagates() {
        let samples = RotationSampler::from_degrees(20.0);
        assert_eq!(
            search_best(samples.rotations(), &Faulty),
            Err(MetricFault::NonFinite)
        );
    }
}
