//! # optim-orient
//!
//! Fast **camera orientation optimization** over a landmark map.
//!
//! Given a set of 3D landmarks and a candidate camera position, find the camera
//! rotation whose visible landmarks constrain the position best. "Best" is a scalar
//! metric (smallest eigenvalue, determinant or trace) of the 3×3 Fisher
//! information matrix of the position, accumulated over the landmarks the camera
//! can see.
//!
//! Evaluating visibility for every landmark and every candidate rotation is
//! expensive. The crate instead replaces the hard field-of-view test with a
//! smooth quadratic surrogate of the bearing cosine, which lets the information
//! matrix be written as a quadratic form in the optical axis with
//! rotation-independent kernels. The kernels are built once per position in
//! `O(|landmarks|)`; every rotation query afterwards is `O(1)`.
//!
//! ## Example
//!
//! ```no_run
//! use nalgebra::Vector3;
//! use optim_orient::{
//!     search_kernel, InfoKernels, MinEigMetric, QuadraticVisibility, RotationSampler,
//! };
//!
//! let landmarks = vec![
//!     Vector3::new(3.0, 0.2, 0.1),
//!     Vector3::new(2.5, -0.5, 0.4),
//!     Vector3::new(-4.0, 0.0, 1.0),
//! ];
//! let position = Vector3::zeros();
//!
//! let vis = QuadraticVisibility::second_order(std::f64::consts::FRAC_PI_4).unwrap();
//! let kernels = InfoKernels::build(&position, &landmarks);
//! let samples = RotationSampler::from_degrees(10.0);
//!
//! let best = search_kernel(&samples, &vis, &kernels, &MinEigMetric).unwrap();
//! println!("best rotation: {}, min eigenvalue {:.4}", best.quaternion(), best.value);
//! ```
//!
//! ## Overview
//!
//! 1. **Visibility** ([`visibility`]) — quadratic surrogate `v(x) = k1 + k2·x + k3·x²`
//!    of the cosine between optical axis and bearing
//! 2. **Kernels** ([`kernels`]) — per-position sums that turn the surrogate into a
//!    closed-form information matrix (full or trace-only)
//! 3. **Regression** ([`regression`]) — a learned visibility approximator applied to
//!    direction-binned landmark voxels
//! 4. **Sampling** ([`sampler`]) — near-uniform rotations at a given resolution
//! 5. **Search** ([`search`]) — exhaustive best/worst search, an exact reference, a
//!    closed-form trace optimum and a parallel batch driver
//!

pub mod camera_model;
pub mod field;
pub mod grid;
pub mod kernels;
pub mod metric;
pub mod regression;
pub mod sampler;
pub mod search;
pub mod visibility;

pub use camera_model::{FieldOfView, PinholeCamera};
pub use field::{ExactField, InformationField, QuadraticInfoField, QuadraticTraceField, TraceField};
pub use grid::{sample_positions, uniform_grid_points, GridConfig};
pub use kernels::{InfoKernels, TraceKernels};
pub use metric::{DetMetric, InfoMetric, MetricFault, MetricKind, MinEigMetric, TraceMetric};
pub use regression::{
    ApproximatorProperties, RegressionInfoVoxel, RegressionTraceVoxel, VisibilityApproximator,
};
pub use sampler::RotationSampler;
pub use search::{
    closed_form_trace_optimum, optimize_orientations, search_exact, search_kernel,
    search_kernel_trace, search_regression, search_regression_trace, search_worst,
    BatchTimings, ClosedFormFailure, OptimOrientResult, OptimalView, OrientBatch, OrientConfig,
    OrientFault, SearchMethod, TraceExtremum,
};
pub use visibility::QuadraticVisibility;

// Commonly used types
pub type Rotation = nalgebra::Rotation3<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;
pub type Matrix3 = nalgebra::Matrix3<f64>;
