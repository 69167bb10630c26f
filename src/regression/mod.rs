//! Regression-based information voxels.
//!
//! The quadratic surrogate in [`crate::visibility`] is cheap but crude. The
//! regression path instead uses a pre-trained [`VisibilityApproximator`], a radial
//! basis regression of visibility over the bearing cosine, loaded once from an
//! rkyv artifact and shared read-only through an `Arc`.
//!
//! The learned visibility is not polynomial, so it cannot be folded into
//! rotation-independent kernels. Instead each [`RegressionInfoVoxel`] /
//! [`RegressionTraceVoxel`] compresses the landmarks seen from its position into a
//! fixed set of direction bins (defined by the approximator). A rotation query
//! then evaluates the approximator once per non-empty bin, with no per-landmark
//! work.
//!
//! Training the approximator is out of scope; artifacts are produced elsewhere.

pub mod approximator;
pub mod voxel;

pub use approximator::{ApproximatorProperties, VisibilityApproximator};
pub use voxel::{RegressionInfoVoxel, RegressionTraceVoxel};
