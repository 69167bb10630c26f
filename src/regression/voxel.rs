//! Per-position voxels queried through the shared approximator.

use std::sync::Arc;

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::field::{InformationField, TraceField};
use crate::kernels::{bearing_and_weight, bearing_information};
use crate::sampler::optical_axis;

use super::VisibilityApproximator;

/// Landmarks of one direction bin, collapsed to a representative bearing.
#[derive(Debug, Clone, PartialEq)]
struct Bin<T> {
    direction: Vector3<f64>,
    value: T,
}

/// Weighted mean bearing of a bin, or the bin center if the bearings cancel.
fn representative(sum_wf: &Vector3<f64>, approx: &VisibilityApproximator, idx: usize) -> Vector3<f64> {
    let n = sum_wf.norm();
    if n > 0.0 {
        sum_wf / n
    } else {
        approx.bin_direction(idx)
    }
}

/// Full-matrix regression voxel.
#[derive(Debug, Clone)]
pub struct RegressionInfoVoxel {
    approximator: Arc<VisibilityApproximator>,
    bins: Vec<Bin<Matrix3<f64>>>,
}

impl RegressionInfoVoxel {
    /// Compress `landmarks` seen from `position` into the approximator's bins.
    pub fn build(
        approximator: Arc<VisibilityApproximator>,
        position: &Vector3<f64>,
        landmarks: &[Vector3<f64>],
    ) -> Self {
        let n = approximator.num_bins();
        let mut sum_wf = vec![Vector3::zeros(); n];
        let mut info = vec![Matrix3::zeros(); n];
        let mut used = vec![false; n];
        for l in landmarks {
            let Some((f, w)) = bearing_and_weight(position, l) else {
                continue;
            };
            let b = approximator.bin_for(&f);
            sum_wf[b] += f * w;
            info[b] += bearing_information(&f, w);
            used[b] = true;
        }

        let bins = (0..n)
            .filter(|&b| used[b])
            .map(|b| Bin {
                direction: representative(&sum_wf[b], &approximator, b),
                value: info[b],
            })
            .collect();

        Self { approximator, bins }
    }

    /// Number of non-empty bins evaluated per query.
    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn approximator(&self) -> &Arc<VisibilityApproximator> {
        &self.approximator
    }
}

impl InformationField for RegressionInfoVoxel {
    fn information(&self, rotation: &Rotation3<f64>) -> Matrix3<f64> {
        let z = optical_axis(rotation);
        self.bins.iter().fold(Matrix3::zeros(), |acc, bin| {
            acc + bin.value * self.approximator.predict(z.dot(&bin.direction))
        })
    }
}

/// Trace-only regression voxel.
#[derive(Debug, Clone)]
pub struct RegressionTraceVoxel {
    approximator: Arc<VisibilityApproximator>,
    bins: Vec<Bin<f64>>,
}

impl RegressionTraceVoxel {
    /// Compress `landmarks` seen from `position` into the approximator's bins.
    pub fn build(
        approximator: Arc<VisibilityApproximator>,
        position: &Vector3<f64>,
        landmarks: &[Vector3<f64>],
    ) -> Self {
        let n = approximator.num_bins();
        let mut sum_wf = vec![Vector3::zeros(); n];
        let mut trace = vec![0.0; n];
        for l in landmarks {
            let Some((f, w)) = bearing_and_weight(position, l) else {
                continue;
            };
            let b = approximator.bin_for(&f);
            sum_wf[b] += f * w;
            trace[b] += 2.0 * w;
        }

        let bins = (0..n)
            .filter(|&b| trace[b] > 0.0)
            .map(|b| Bin {
                direction: representative(&sum_wf[b], &approximator, b),
                value: trace[b],
            })
            .collect();

        Self { approximator, bins }
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }
}

impl TraceField for RegressionTraceVoxel {
    fn trace(&self, rotation: &Rotation3<f64>) -> f64 {
        let z = optical_axis(rotation);
        self.bins
            .iter()
            .map(|bin| bin.value * self.approximator.predict(z.dot(&bin.direction)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::InfoKernels;
    use crate::regression::ApproximatorProperties;
    use crate::sampler::RotationSampler;

    fn approximator(centers: Vec<f64>, weights: Vec<f64>, bias: f64) -> Arc<VisibilityApproximator> {
        let props = ApproximatorProperties {
            half_fov_rad: std::f64::consts::FRAC_PI_4,
            num_direction_bins: 40,
            length_scale: 0.15,
            num_training_landmarks: 1000,
        };
        Arc::new(VisibilityApproximator::new(props, centers, weights, bias).unwrap())
    }

    fn landmarks() -> Vec<Vector3<f64>> {
        (0..30)
            .map(|i| {
                let t = i as f64 * 0.7;
                Vector3::new(2.0 * t.cos(), 2.0 * t.sin(), (i as f64 - 15.0) * 0.2)
            })
            .collect()
    }

    #[test]
    fn test_constant_approximator_matches_constant_kernel() {
        let approx = approximator(vec![], vec![], 0.7);
        let position = Vector3::new(0.1, 0.0, 0.2);
        let lms = landmarks();
        let voxel = RegressionInfoVoxel::build(approx.clone(), &position, &lms);
        let trace_voxel = RegressionTraceVoxel::build(approx, &position, &lms);
        let kernels = InfoKernels::build(&position, &lms);

        for r in RotationSampler::from_degrees(30.0).rotations() {
            let expected = kernels.information(0.7, 0.0, 0.0, &optical_axis(r));
            assert!((voxel.information(r) - expected).amax() < 1e-12);
            assert!((trace_voxel.trace(r) - expected.trace()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bins_are_shared_across_voxels() {
        let approx = approximator(vec![1.0], vec![1.0], 0.0);
        let lms = landmarks();
        let a = RegressionInfoVoxel::build(approx.clone(), &Vector3::zeros(), &lms);
        let b = RegressionInfoVoxel::build(approx.clone(), &Vector3::new(1.0, 1.0, 0.0), &lms);
        assert!(Arc::ptr_eq(a.approximator(), b.approximator()));
        assert!(a.num_bins() > 0 && a.num_bins() <= 40);
    }

    #[test]
    fn test_forward_landmark_dominates() {
        let approx = approximator(vec![1.0], vec![1.0], 0.0);
        let lms = vec![Vector3::new(0.0, 0.0, 3.0)];
        let voxel = RegressionTraceVoxel::build(approx, &Vector3::zeros(), &lms);
        let facing = Rotation3::identity();
        let away = Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI);
        assert!(voxel.trace(&facing) > voxel.trace(&away));
    }

    #[test]
    fn test_empty_voxel_is_zero() {
        let approx = approximator(vec![1.0], vec![1.0], 0.0);
        let voxel = RegressionInfoVoxel::build(approx, &Vector3::zeros(), &[]);
        assert_eq!(voxel.num_bins(), 0);
        assert_eq!(voxel.information(&Rotation3::identity()), Matrix3::zeros());
    }
}
