//! Camera models used to decide which landmarks are visible from a pose.
//!
//! The exact search path needs a true, non-smooth field-of-view test. A
//! [`PinholeCamera`] provides that test by projecting into the image and checking
//! the pixel bounds. The [`FieldOfView`] trait is the seam between the exact path
//! and the camera: anything that maps a camera-frame point to a visibility weight
//! can be plugged in, including the smooth [`QuadraticVisibility`] surrogate.
//!
//! # Coordinate conventions
//!
//! - **Camera frame**: +X right, +Y down, +Z optical axis.
//! - **Pixel coordinates**: origin at the top-left corner, +X right, +Y down.
//!
//! ```text
//! camera point → divide by z → multiply by f → add principal point → pixel
//! pixel → subtract principal point → divide by f → normalize → bearing
//! ```
//!
//! [`QuadraticVisibility`]: crate::visibility::QuadraticVisibility

use nalgebra::Vector3;

/// Visibility weight of a point expressed in the camera frame.
///
/// Implementations return `1.0` for fully visible points and `0.0` for points
/// outside the field of view; smooth surrogates may return anything in between.
pub trait FieldOfView: Sync {
    fn visibility(&self, point_cam: &Vector3<f64>) -> f64;

    /// Whether visibility is unchanged by a roll about the optical axis.
    ///
    /// A rectangular image is not: its corners reach further off axis than its
    /// edges, so searching it exhaustively needs several rolls per optical axis.
    fn roll_invariant(&self) -> bool {
        false
    }
}

/// Pinhole camera intrinsics with a rectangular image.
#[derive(Debug, Clone, PartialEq)]
pub struct PinholeCamera {
    /// Focal lengths in pixels `[fx, fy]`.
    pub focal_length_px: [f64; 2],
    /// Principal point in pixels `[cx, cy]`, measured from the top-left corner.
    pub principal_point_px: [f64; 2],
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
}

impl Default for PinholeCamera {
    /// 600×600 image with f = 300 px, i.e. a 45° half field of view.
    fn default() -> Self {
        Self {
            focal_length_px: [300.0, 300.0],
            principal_point_px: [300.0, 300.0],
            image_width: 600,
            image_height: 600,
        }
    }
}

impl PinholeCamera {
    /// Create a centred camera from a horizontal field of view and image size.
    ///
    /// Square pixels are assumed: `fx = fy = (width/2) / tan(fov/2)`.
    pub fn from_fov(fov_rad: f64, image_width: u32, image_height: u32) -> Self {
        let f = (image_width as f64 / 2.0) / (fov_rad / 2.0).tan();
        Self {
            focal_length_px: [f, f],
            principal_point_px: [image_width as f64 / 2.0, image_height as f64 / 2.0],
            image_width,
            image_height,
        }
    }

    /// Horizontal field of view in radians.
    pub fn fov_rad(&self) -> f64 {
        2.0 * ((self.image_width as f64 / 2.0) / self.focal_length_px[0]).atan()
    }

    /// Project a camera-frame point to pixel coordinates.
    ///
    /// Returns `None` for points on or behind the image plane.
    pub fn project(&self, point_cam: &Vector3<f64>) -> Option<(f64, f64)> {
        if point_cam.z <= 0.0 {
            return None;
        }
        let u = self.focal_length_px[0] * point_cam.x / point_cam.z + self.principal_point_px[0];
        let v = self.focal_length_px[1] * point_cam.y / point_cam.z + self.principal_point_px[1];
        Some((u, v))
    }

    /// Unit bearing vector in the camera frame for a pixel.
    pub fn unproject(&self, u: f64, v: f64) -> Vector3<f64> {
        let x = (u - self.principal_point_px[0]) / self.focal_length_px[0];
        let y = (v - self.principal_point_px[1]) / self.focal_length_px[1];
        Vector3::new(x, y, 1.0).normalize()
    }

    /// Whether a pixel lies inside the image bounds.
    pub fn contains_pixel(&self, u: f64, v: f64) -> bool {
        u >= 0.0 && v >= 0.0 && u < self.image_width as f64 && v < self.image_height as f64
    }
}

impl FieldOfView for PinholeCamera {
    fn visibility(&self, point_cam: &Vector3<f64>) -> f64 {
        match self.project(point_cam) {
            Some((u, v)) if self.contains_pixel(u, v) => 1.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fov_and_recovery() {
        let fov_rad = 90.0_f64.to_radians();
        let cam = PinholeCamera::from_fov(fov_rad, 600, 600);

        let recovered_fov = cam.fov_rad();
        assert!(
            (recovered_fov - fov_rad).abs() < 1e-12,
            "FOV recovery: expected {:.6}, got {:.6}",
            fov_rad,
            recovered_fov,
        );
        // tan(45°) is not exactly 1, so compare against the default within rounding
        let default = PinholeCamera::default();
        for i in 0..2 {
            assert!((cam.focal_length_px[i] - default.focal_length_px[i]).abs() < 1e-9);
            assert!((cam.principal_point_px[i] - default.principal_point_px[i]).abs() < 1e-12);
        }
        assert_eq!(
            (cam.image_width, cam.image_height),
            (default.image_width, default.image_height)
        );
    }

    #[test]
    fn test_project_unproject_roundtrip() {
        let cam = PinholeCamera::default();

        let test_pixels = [(300.0, 300.0), (10.0, 590.0), (450.0, 120.0), (599.0, 0.0)];
        for &(u, v) in &test_pixels {
            let bearing = cam.unproject(u, v);
            assert!((bearing.norm() - 1.0).abs() < 1e-12);
            let (u2, v2) = cam.project(&(bearing * 3.5)).unwrap();
            assert!(
                (u - u2).abs() < 1e-9 && (v - v2).abs() < 1e-9,
                "Roundtrip failed for ({}, {}): got ({}, {})",
                u,
                v,
                u2,
                v2
            );
        }
    }

    #[test]
    fn test_hard_visibility() {
        let cam = PinholeCamera::default();
        // On the optical axis
        assert_eq!(cam.visibility(&Vector3::new(0.0, 0.0, 2.0)), 1.0);
        // Behind the camera
        assert_eq!(cam.visibility(&Vector3::new(0.0, 0.0, -2.0)), 0.0);
        // 40° off axis horizontally: inside the 45° half FOV
        let a = 40.0_f64.to_radians();
        assert_eq!(cam.visibility(&Vector3::new(a.sin(), 0.0, a.cos())), 1.0);
        // 50° off axis: outside
        let a = 50.0_f64.to_radians();
        assert_eq!(cam.visibility(&Vector3::new(0.0, a.sin(), a.cos())), 0.0);
        // On the image plane
        assert_eq!(cam.visibility(&Vector3::new(1.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_corners_depend_on_roll() {
        let cam = PinholeCamera::default();
        assert!(!cam.roll_invariant());
        // 50° off axis is outside along the edge but inside along the diagonal
        let a = 50.0_f64.to_radians();
        let diag = std::f64::consts::FRAC_1_SQRT_2 * a.sin();
        assert_eq!(cam.visibility(&Vector3::new(a.sin(), 0.0, a.cos())), 0.0);
        assert_eq!(cam.visibility(&Vector3::new(diag, diag, a.cos())), 1.0);
    }
}
