//! Near-uniform rotation samples for exhaustive orientation search.
//!
//! Every score computed by this crate depends on the camera orientation only
//! through the optical axis `z = R·e_z` (the information matrix is expressed in
//! the world frame and the visibility surrogate is a circular cone). The sampler
//! therefore covers the sphere of optical-axis directions with a Fibonacci
//! (golden-spiral) lattice and attaches a deterministic roll to each direction.
//! Additional roll steps can be requested for cameras whose visibility is not
//! rotationally symmetric, such as a rectangular pinhole image.
//!
//! The lattice is oversampled so that every direction on the sphere lies within
//! the requested angular resolution of some sample axis. The number of axes grows
//! as `O(1/resolution²)`.

use std::f64::consts::{PI, TAU};

use nalgebra::{Matrix3, Rotation3, Vector3};

/// Lattice points per spherical cap of radius `resolution`.
const CAP_OVERSAMPLING: f64 = 3.0;

/// Generate N approximately-uniform points on the unit sphere using the
/// Fibonacci sphere lattice (golden spiral).
pub fn fibonacci_sphere_lattice(n: usize) -> Vec<Vector3<f64>> {
    let golden_ratio = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        // z uniformly spaced from ~+1 to ~-1
        let z = 1.0 - (2.0 * i as f64 + 1.0) / n as f64;
        let r = (1.0 - z * z).sqrt();
        let theta = TAU * i as f64 / golden_ratio;
        points.push(Vector3::new(r * theta.cos(), r * theta.sin(), z));
    }
    points
}

/// Number of lattice axes needed for a covering radius of `resolution_rad`.
fn num_axes_for_resolution(resolution_rad: f64) -> usize {
    // Solid angle of a cap with half-angle `resolution`: 2π(1 − cos(res)).
    let cap = TAU * (1.0 - resolution_rad.cos());
    ((CAP_OVERSAMPLING * 4.0 * PI / cap).ceil() as usize).max(2)
}

/// Camera-to-world rotation whose optical axis (+Z) points along `axis`.
///
/// The camera +X axis is taken perpendicular to a reference "up" direction (world
/// +Z, or world +X when the axis is nearly vertical), then the result is rolled by
/// `roll_rad` about the optical axis.
pub fn rotation_from_optical_axis(axis: &Vector3<f64>, roll_rad: f64) -> Rotation3<f64> {
    let cam_z = axis.normalize();
    let up = if cam_z.z.abs() < 0.9 {
        Vector3::z()
    } else {
        Vector3::x()
    };
    let cam_x = up.cross(&cam_z).normalize();
    let cam_y = cam_z.cross(&cam_x);
    let base = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[cam_x, cam_y, cam_z]));
    if roll_rad == 0.0 {
        base
    } else {
        base * Rotation3::from_axis_angle(&Vector3::z_axis(), roll_rad)
    }
}

/// Optical axis (camera +Z in the world frame) of a camera-to-world rotation.
pub fn optical_axis(rotation: &Rotation3<f64>) -> Vector3<f64> {
    rotation.matrix().column(2).into_owned()
}

/// Angle between the optical axes of two rotations.
pub fn axis_distance(a: &Rotation3<f64>, b: &Rotation3<f64>) -> f64 {
    optical_axis(a).dot(&optical_axis(b)).clamp(-1.0, 1.0).acos()
}

/// Fixed set of rotation samples at a target angular resolution.
#[derive(Debug, Clone)]
pub struct RotationSampler {
    resolution_rad: f64,
    roll_steps: usize,
    axes: Vec<Vector3<f64>>,
    rotations: Vec<Rotation3<f64>>,
}

impl RotationSampler {
    /// Sample optical axes at `resolution_rad` with a single roll per axis.
    pub fn new(resolution_rad: f64) -> Self {
        Self::with_roll_steps(resolution_rad, 1)
    }

    /// Same as [`RotationSampler::new`] with the resolution given in degrees.
    pub fn from_degrees(resolution_deg: f64) -> Self {
        Self::new(resolution_deg.to_radians())
    }

    /// Sample optical axes at `resolution_rad`, each with `roll_steps` rolls evenly
    /// spaced over a full turn.
    ///
    /// Samples are ordered axis-major: all rolls of the first axis come first.
    pub fn with_roll_steps(resolution_rad: f64, roll_steps: usize) -> Self {
        assert!(
            resolution_rad > 0.0 && resolution_rad <= PI,
            "resolution must be in (0, π]"
        );
        assert!(roll_steps > 0, "roll_steps must be > 0");

        let axes = fibonacci_sphere_lattice(num_axes_for_resolution(resolution_rad));
        let mut rotations = Vec::with_capacity(axes.len() * roll_steps);
        for axis in &axes {
            for k in 0..roll_steps {
                let roll = TAU * k as f64 / roll_steps as f64;
                rotations.push(rotation_from_optical_axis(axis, roll));
            }
        }

        Self {
            resolution_rad,
            roll_steps,
            axes,
            rotations,
        }
    }

    pub fn resolution_rad(&self) -> f64 {
        self.resolution_rad
    }

    pub fn roll_steps(&self) -> usize {
        self.roll_steps
    }

    /// Number of rotation samples.
    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }

    /// Sampled optical axes (one per lattice point).
    pub fn axes(&self) -> &[Vector3<f64>] {
        &self.axes
    }

    /// All rotation samples.
    pub fn rotations(&self) -> &[Rotation3<f64>] {
        &self.rotations
    }

    /// Index of the sample whose optical axis is closest to `rotation`'s, and the
    /// angle between the two axes.
    pub fn nearest(&self, rotation: &Rotation3<f64>) -> (usize, f64) {
        let z = optical_axis(rotation);
        let (best_axis, best_dot) = self
            .axes
            .iter()
            .enumerate()
            .map(|(i, a)| (i, a.dot(&z)))
            .fold((0, f64::NEG_INFINITY), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
        (best_axis * self.roll_steps, best_dot.clamp(-1.0, 1.0).acos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_from_optical_axis_is_proper() {
        let axes = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(0.3, -0.7, 0.2),
        ];
        for axis in &axes {
            for &roll in &[0.0, 1.0, -2.5] {
                let r = rotation_from_optical_axis(axis, roll);
                let m = r.matrix();
                assert!((m.transpose() * m - Matrix3::identity()).norm() < 1e-12);
                assert!((m.determinant() - 1.0).abs() < 1e-12);
                assert!((optical_axis(&r) - axis.normalize()).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_lattice_points_are_unit() {
        for p in fibonacci_sphere_lattice(100) {
            assert!((p.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_roll_steps_multiply_samples() {
        let single = RotationSampler::from_degrees(20.0);
        let rolled = RotationSampler::with_roll_steps(20.0_f64.to_radians(), 4);
        assert_eq!(rolled.len(), 4 * single.len());
        assert_eq!(rolled.axes().len(), single.axes().len());
        // Rolls share the optical axis of their lattice point.
        for k in 0..4 {
            assert!(axis_distance(&rolled.rotations()[k], &single.rotations()[0]) < 1e-6);
        }
    }

    #[test]
    fn test_nearest_finds_exact_sample() {
        let sampler = RotationSampler::from_degrees(15.0);
        let probe = sampler.rotations()[17];
        let (idx, angle) = sampler.nearest(&probe);
        assert_eq!(idx, 17);
        assert!(angle < 1e-6);
    }
}
