use pyo3::prelude::*;

use optim_orient::PinholeCamera;

/// Pinhole camera used as the ground-truth visibility model.
///
/// A landmark is visible when it projects inside the image.
///
/// Example:
///     cam = optim_orient_py.PinholeCamera.from_fov(fov_deg=90.0, image_width=600, image_height=600)
#[pyclass(name = "PinholeCamera", frozen, from_py_object)]
#[derive(Clone)]
pub(crate) struct PyPinholeCamera {
    pub(crate) inner: PinholeCamera,
}

#[pymethods]
impl PyPinholeCamera {
    /// Create a camera with explicit intrinsics.
    ///
    /// Args:
    ///     fx, fy: Focal lengths in pixels. Default 300.
    ///     cx, cy: Principal point in pixels. Default 300.
    ///     image_width, image_height: Image size in pixels. Default 600.
    #[new]
    #[pyo3(signature = (fx = 300.0, fy = 300.0, cx = 300.0, cy = 300.0, image_width = 600, image_height = 600))]
    fn new(fx: f64, fy: f64, cx: f64, cy: f64, image_width: u32, image_height: u32) -> Self {
        Self {
            inner: PinholeCamera {
                focal_length_px: [fx, fy],
                principal_point_px: [cx, cy],
                image_width,
                image_height,
            },
        }
    }

    /// Create a centred camera from a horizontal field of view and image size.
    #[staticmethod]
    #[pyo3(signature = (fov_deg, image_width, image_height))]
    fn from_fov(fov_deg: f64, image_width: u32, image_height: u32) -> Self {
        Self {
            inner: PinholeCamera::from_fov(fov_deg.to_radians(), image_width, image_height),
        }
    }

    /// Horizontal field of view in degrees.
    #[getter]
    fn fov_deg(&self) -> f64 {
        self.inner.fov_rad().to_degrees()
    }

    /// Pixel coordinates of a camera-frame point, or None if it is behind the camera.
    fn project(&self, point: [f64; 3]) -> Option<(f64, f64)> {
        self.inner
            .project(&nalgebra::Vector3::new(point[0], point[1], point[2]))
    }

    fn __repr__(&self) -> String {
        format!(
            "PinholeCamera(f=[{:.1}, {:.1}], c=[{:.1}, {:.1}], {}x{})",
            self.inner.focal_length_px[0],
            self.inner.focal_length_px[1],
            self.inner.principal_point_px[0],
            self.inner.principal_point_px[1],
            self.inner.image_width,
            self.inner.image_height,
        )
    }
}
