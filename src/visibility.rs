//! Smooth quadratic approximation of field-of-view membership.
//!
//! A landmark is visible when the angle between the optical axis and its bearing
//! is below the half field of view. That indicator is not smooth, and it cannot be
//! pulled out of a sum over landmarks. The surrogate used here is a quadratic in
//! the cosine of that angle,
//!
//! ```text
//! v(x) = k1 + k2·x + k3·x²,    x = zᵀf
//! ```
//!
//! where `z` is the optical axis and `f` the unit bearing (both in the world frame).
//! Because `v` is polynomial in `z`, the per-landmark sums can be precomputed once
//! per position (see [`crate::kernels`]) and recombined with `(k1, k2, k3)` for any
//! rotation.
//!
//! The quadratic is pinned by three conditions:
//!
//! - `v(1) = 1` on the optical axis,
//! - `v(cos(hfov)) = boundary_value` on the cone boundary,
//! - `v(-1) = rear_value` directly behind the camera.
//!
//! A larger `boundary_value` flattens the surrogate (less curvature, more bias
//! outside the cone); a smaller one steepens the transition around the boundary.

use nalgebra::Vector3;

use crate::camera_model::FieldOfView;

/// Default surrogate value on the cone boundary.
pub const DEFAULT_BOUNDARY_VALUE: f64 = 0.8;
/// Default surrogate value for a landmark directly behind the camera.
pub const DEFAULT_REAR_VALUE: f64 = 0.0;

/// Quadratic visibility surrogate and its coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticVisibility {
    half_fov_rad: f64,
    cos_half_fov: f64,
    boundary_value: f64,
    rear_value: f64,
    k1: f64,
    k2: f64,
    k3: f64,
}

impl QuadraticVisibility {
    /// Build the surrogate for a half field of view and two shape parameters.
    ///
    /// Requires `0 < half_fov_rad < π`, `0 <= rear_value < boundary_value < 1`, and
    /// the resulting quadratic must stay non-negative on `[-1, 1]`.
    pub fn new(half_fov_rad: f64, boundary_value: f64, rear_value: f64) -> anyhow::Result<Self> {
        anyhow::ensure!(
            half_fov_rad > 0.0 && half_fov_rad < std::f64::consts::PI,
            "half field of view must be in (0, π), got {}",
            half_fov_rad
        );
        anyhow::ensure!(
            boundary_value > 0.0 && boundary_value < 1.0,
            "boundary value must be in (0, 1), got {}",
            boundary_value
        );
        anyhow::ensure!(
            rear_value >= 0.0 && rear_value < boundary_value,
            "rear value must be in [0, boundary value), got {}",
            rear_value
        );

        let xb = half_fov_rad.cos();
        let k2 = (1.0 - rear_value) / 2.0;
        let k3 = ((1.0 + rear_value) / 2.0 - boundary_value + k2 * xb) / (1.0 - xb * xb);
        let k1 = (1.0 + rear_value) / 2.0 - k3;

        let vis = Self {
            half_fov_rad,
            cos_half_fov: xb,
            boundary_value,
            rear_value,
            k1,
            k2,
            k3,
        };
        let min_value = vis.min_value();
        anyhow::ensure!(
            min_value >= -1e-12,
            "surrogate dips to {:.4} on [-1, 1]; raise the boundary value or the rear value",
            min_value
        );
        Ok(vis)
    }

    /// Surrogate with the default shape parameters.
    pub fn second_order(half_fov_rad: f64) -> anyhow::Result<Self> {
        Self::new(half_fov_rad, DEFAULT_BOUNDARY_VALUE, DEFAULT_REAR_VALUE)
    }

    /// Constant coefficient.
    pub fn k1(&self) -> f64 {
        self.k1
    }

    /// Linear coefficient.
    pub fn k2(&self) -> f64 {
        self.k2
    }

    /// Quadratic coefficient.
    pub fn k3(&self) -> f64 {
        self.k3
    }

    pub fn half_fov_rad(&self) -> f64 {
        self.half_fov_rad
    }

    pub fn boundary_value(&self) -> f64 {
        self.boundary_value
    }

    pub fn rear_value(&self) -> f64 {
        self.rear_value
    }

    /// Surrogate value for a cosine `x` between optical axis and bearing.
    pub fn value(&self, x: f64) -> f64 {
        self.k1 + self.k2 * x + self.k3 * x * x
    }

    /// The exact indicator the surrogate approximates.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.cos_half_fov
    }

    /// Minimum of the surrogate over `[-1, 1]`.
    fn min_value(&self) -> f64 {
        let mut m = self.value(-1.0).min(self.value(1.0));
        if self.k3 > 0.0 {
            let xv = -self.k2 / (2.0 * self.k3);
            if xv > -1.0 && xv < 1.0 {
                m = m.min(self.value(xv));
            }
        }
        m
    }
}

impl FieldOfView for QuadraticVisibility {
    fn visibility(&self, point_cam: &Vector3<f64>) -> f64 {
        let norm = point_cam.norm();
        if norm <= 0.0 {
            return 0.0;
        }
        self.value(point_cam.z / norm)
    }

    fn roll_invariant(&self) -> bool {
        true
    }
}
