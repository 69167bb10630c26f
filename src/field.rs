//! Sources of the orientation-dependent information at one position.
//!
//! [`InformationField`] produces the full information matrix for a rotation and
//! [`TraceField`] only its trace. Each has three kinds of implementation:
//!
//! - quadratic kernels combined with the visibility coefficients
//!   ([`QuadraticInfoField`], [`QuadraticTraceField`]), `O(1)` per rotation
//! - regression voxels ([`crate::regression`]), `O(bins)` per rotation
//! - exact per-landmark summation through a camera model ([`ExactField`]),
//!   `O(|L|)` per rotation
//!
//! Searches only see the traits, so the strategy is fixed when the field is
//! built rather than branched on inside the sample loop.

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::camera_model::FieldOfView;
use crate::kernels::{bearing_and_weight, bearing_information, InfoKernels, TraceKernels};
use crate::sampler::optical_axis;
use crate::visibility::QuadraticVisibility;

/// Full information matrix as a function of camera orientation.
pub trait InformationField: Sync {
    fn information(&self, rotation: &Rotation3<f64>) -> Matrix3<f64>;
}

/// Trace of the information matrix as a function of camera orientation.
pub trait TraceField: Sync {
    fn trace(&self, rotation: &Rotation3<f64>) -> f64;
}

/// Info kernels recombined with the visibility coefficients.
#[derive(Debug, Clone, Copy)]
pub struct QuadraticInfoField<'a> {
    pub visibility: &'a QuadraticVisibility,
    pub kernels: &'a InfoKernels,
}

impl<'a> QuadraticInfoField<'a> {
    pub fn new(visibility: &'a QuadraticVisibility, kernels: &'a InfoKernels) -> Self {
        Self {
            visibility,
            kernels,
        }
    }
}

impl InformationField for QuadraticInfoField<'_> {
    fn information(&self, rotation: &Rotation3<f64>) -> Matrix3<f64> {
        let v = self.visibility;
        self.kernels
            .information(v.k1(), v.k2(), v.k3(), &optical_axis(rotation))
    }
}

/// Trace kernels recombined with the visibility coefficients.
#[derive(Debug, Clone, Copy)]
pub struct QuadraticTraceField<'a> {
    pub visibility: &'a QuadraticVisibility,
    pub kernels: &'a TraceKernels,
}

impl<'a> QuadraticTraceField<'a> {
    pub fn new(visibility: &'a QuadraticVisibility, kernels: &'a TraceKernels) -> Self {
        Self {
            visibility,
            kernels,
        }
    }
}

impl TraceField for QuadraticTraceField<'_> {
    fn trace(&self, rotation: &Rotation3<f64>) -> f64 {
        let v = self.visibility;
        self.kernels
            .trace(v.k1(), v.k2(), v.k3(), &optical_axis(rotation))
    }
}

/// Direct summation over raw landmarks through a camera visibility test.
///
/// With a [`PinholeCamera`](crate::camera_model::PinholeCamera) this is the
/// ground truth. With the [`QuadraticVisibility`] surrogate as the "camera" it
/// reproduces the kernel fields exactly, which is how the kernel algebra is
/// validated.
#[derive(Debug, Clone, Copy)]
pub struct ExactField<'a, C: FieldOfView> {
    pub position: Vector3<f64>,
    pub landmarks: &'a [Vector3<f64>],
    pub camera: &'a C,
}

impl<'a, C: FieldOfView> ExactField<'a, C> {
    pub fn new(position: Vector3<f64>, landmarks: &'a [Vector3<f64>], camera: &'a C) -> Self {
        Self {
            position,
            landmarks,
            camera,
        }
    }

    /// Number of landmarks with non-zero visibility from `rotation`.
    pub fn num_visible(&self, rotation: &Rotation3<f64>) -> usize {
        self.landmarks
            .iter()
            .filter(|l| {
                let p_cam = rotation.inverse_transform_vector(&(*l - self.position));
                self.camera.visibility(&p_cam) > 0.0
            })
            .count()
    }
}

impl<C: FieldOfView> InformationField for ExactField<'_, C> {
    fn information(&self, rotation: &Rotation3<f64>) -> Matrix3<f64> {
        let mut info = Matrix3::zeros();
        for l in self.landmarks {
            let Some((f, w)) = bearing_and_weight(&self.position, l) else {
                continue;
            };
            let vis = self
                .camera
                .visibility(&rotation.inverse_transform_vector(&f));
            if vis != 0.0 {
                info += bearing_information(&f, w) * vis;
            }
        }
        info
    }
}

impl<C: FieldOfView> TraceField for ExactField<'_, C> {
    fn trace(&self, rotation: &Rotation3<f64>) -> f64 {
        let mut trace = 0.0;
        for l in self.landmarks {
            let Some((f, w)) = bearing_and_weight(&self.position, l) else {
                continue;
            };
            let vis = self
                .camera
                .visibility(&rotation.inverse_transform_vector(&f));
            trace += 2.0 * w * vis;
        }
        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_model::PinholeCamera;
    use crate::sampler::RotationSampler;

    #[test]
    fn test_exact_surrogate_matches_kernels() {
        let vis = QuadraticVisibility::second_order(std::f64::consts::FRAC_PI_4).unwrap();
        let position = Vector3::new(0.2, 0.1, -0.3);
        let landmarks = vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 1.0),
            Vector3::new(-1.0, -1.0, 3.0),
            Vector3::new(0.5, 0.5, -2.0),
        ];
        let info = InfoKernels::build(&position, &landmarks);
        let trace = TraceKernels::build(&position, &landmarks);
        let quad_info = QuadraticInfoField::new(&vis, &info);
        let quad_trace = QuadraticTraceField::new(&vis, &trace);
        let exact = ExactField::new(position, &landmarks, &vis);

        for r in RotationSampler::from_degrees(30.0).rotations() {
            let a = quad_info.information(r);
            let b = exact.information(r);
            assert!((a - b).amax() < 1e-12, "info mismatch: {} vs {}", a, b);
            assert!((quad_trace.trace(r) - exact.trace(r)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_pinhole_exact_counts_visible() {
        let cam = PinholeCamera::default();
        let landmarks = vec![
            Vector3::new(0.0, 0.0, 5.0),
            Vector3::new(0.0, 0.0, -5.0),
            Vector3::new(1.0, 0.0, 5.0),
        ];
        let exact = ExactField::new(Vector3::zeros(), &landmarks, &cam);
        let identity = Rotation3::identity();
        assert_eq!(exact.num_visible(&identity), 2);
        // Two visible landmarks at distance ~5: trace = Σ 2/d²
        let expected = 2.0 / 25.0 + 2.0 / 26.0;
        assert!((exact.trace(&identity) - expected).abs() < 1e-12);
        assert!((exact.information(&identity).trace() - expected).abs() < 1e-12);
    }
}
