//! Rotation-independent quadratic kernels aggregated over landmarks.
//!
//! For a candidate position `p` each landmark `x_i` contributes a bearing
//! `f_i = (x_i − p)/|x_i − p|` and the position information of a unit-bearing
//! measurement, `P_i = w_i (I − f_i f_iᵀ)` with `w_i = 1/|x_i − p|²`. Weighted by
//! the quadratic visibility surrogate `v(x) = k1 + k2·x + k3·x²` at `x = zᵀf_i`,
//! the aggregate information for optical axis `z` is
//!
//! ```text
//! I(z)[rc] = k1·K1[rc] + k2·K2[rc]ᵀz + k3·zᵀK3[rc]z
//!   K1[rc] = Σ P_i[rc],   K2[rc] = Σ P_i[rc] f_i,   K3[rc] = Σ P_i[rc] f_i f_iᵀ
//! ```
//!
//! and, since `tr(P_i) = 2w_i`, its trace is
//!
//! ```text
//! tr I(z) = k1·T1 + k2·T2ᵀz + k3·zᵀT3z
//!   T1 = Σ 2w_i,   T2 = Σ 2w_i f_i,   T3 = Σ 2w_i f_i f_iᵀ
//! ```
//!
//! None of the kernels depend on the rotation, so they are built once per
//! position in `O(|L|)` and every later rotation query is `O(1)`.
//!
//! Kernels form a commutative monoid under `+`: a single landmark produces a
//! kernel, and any grouping or ordering of the sum gives the same result up to
//! rounding. This is what allows [`InfoKernels::build_par`] to reduce in parallel.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

/// Landmarks closer than this to the candidate position have no usable bearing.
pub const MIN_LANDMARK_DISTANCE: f64 = 1e-6;

/// Upper-triangular entries `(r, c)` of a symmetric 3×3 matrix.
pub const UPPER_ENTRIES: [(usize, usize); 6] = [(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)];

/// Unit bearing and inverse squared distance from `position` to `landmark`.
///
/// Returns `None` when the landmark coincides with the position.
pub fn bearing_and_weight(
    position: &Vector3<f64>,
    landmark: &Vector3<f64>,
) -> Option<(Vector3<f64>, f64)> {
    let d = landmark - position;
    let dist2 = d.norm_squared();
    if dist2 < MIN_LANDMARK_DISTANCE * MIN_LANDMARK_DISTANCE {
        return None;
    }
    Some((d / dist2.sqrt(), 1.0 / dist2))
}

/// Position information of one bearing measurement: `w (I − f fᵀ)`.
pub fn bearing_information(bearing: &Vector3<f64>, weight: f64) -> Matrix3<f64> {
    (Matrix3::identity() - bearing * bearing.transpose()) * weight
}

/// Expand the 6 unique entries of a symmetric matrix.
pub(crate) fn symmetric_from_upper(upper: &[f64; 6]) -> Matrix3<f64> {
    let mut m = Matrix3::zeros();
    for (k, &(r, c)) in UPPER_ENTRIES.iter().enumerate() {
        m[(r, c)] = upper[k];
        m[(c, r)] = upper[k];
    }
    m
}

// ── Info kernels ────────────────────────────────────────────────────────────

/// Full-matrix kernels: enough to reconstruct the whole information matrix.
///
/// Only the upper-triangular entries are stored; index `k` refers to
/// [`UPPER_ENTRIES`]`[k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoKernels {
    pub k1: [f64; 6],
    pub k2: [Vector3<f64>; 6],
    pub k3: [Matrix3<f64>; 6],
}

impl Default for InfoKernels {
    fn default() -> Self {
        Self {
            k1: [0.0; 6],
            k2: [Vector3::zeros(); 6],
            k3: [Matrix3::zeros(); 6],
        }
    }
}

impl InfoKernels {
    /// Contribution of a single landmark.
    pub fn from_landmark(position: &Vector3<f64>, landmark: &Vector3<f64>) -> Self {
        let Some((f, w)) = bearing_and_weight(position, landmark) else {
            return Self::default();
        };
        let info = bearing_information(&f, w);
        let ff = f * f.transpose();
        let mut out = Self::default();
        for (k, &(r, c)) in UPPER_ENTRIES.iter().enumerate() {
            let p = info[(r, c)];
            out.k1[k] = p;
            out.k2[k] = f * p;
            out.k3[k] = ff * p;
        }
        out
    }

    /// Sequential accumulation over `landmarks`.
    pub fn build(position: &Vector3<f64>, landmarks: &[Vector3<f64>]) -> Self {
        landmarks
            .iter()
            .map(|l| Self::from_landmark(position, l))
            .sum()
    }

    /// Parallel accumulation over `landmarks`.
    pub fn build_par(position: &Vector3<f64>, landmarks: &[Vector3<f64>]) -> Self {
        landmarks
            .par_iter()
            .map(|l| Self::from_landmark(position, l))
            .reduce(Self::default, |a, b| a + b)
    }

    /// Reconstruct the information matrix for optical axis `z` from the visibility
    /// coefficients.
    pub fn information(&self, k1: f64, k2: f64, k3: f64, z: &Vector3<f64>) -> Matrix3<f64> {
        let mut upper = [0.0; 6];
        for (k, v) in upper.iter_mut().enumerate() {
            *v = k1 * self.k1[k] + k2 * self.k2[k].dot(z) + k3 * z.dot(&(self.k3[k] * z));
        }
        symmetric_from_upper(&upper)
    }

    /// Largest absolute difference to another kernel set.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        let mut d = 0.0_f64;
        for k in 0..6 {
            d = d.max((self.k1[k] - other.k1[k]).abs());
            d = d.max((self.k2[k] - other.k2[k]).amax());
            d = d.max((self.k3[k] - other.k3[k]).amax());
        }
        d
    }

    pub fn is_finite(&self) -> bool {
        self.k1.iter().all(|v| v.is_finite())
            && self.k2.iter().all(|v| v.iter().all(|x| x.is_finite()))
            && self.k3.iter().all(|m| m.iter().all(|x| x.is_finite()))
    }
}

impl AddAssign<&InfoKernels> for InfoKernels {
    fn add_assign(&mut self, rhs: &InfoKernels) {
        for k in 0..6 {
            self.k1[k] += rhs.k1[k];
            self.k2[k] += rhs.k2[k];
            self.k3[k] += rhs.k3[k];
        }
    }
}

impl Add for InfoKernels {
    type Output = InfoKernels;

    fn add(mut self, rhs: InfoKernels) -> InfoKernels {
        self += &rhs;
        self
    }
}

impl Sum for InfoKernels {
    fn sum<I: Iterator<Item = InfoKernels>>(iter: I) -> Self {
        iter.fold(Self::default(), |a, b| a + b)
    }
}

// ── Trace kernels ───────────────────────────────────────────────────────────

/// Trace-only kernels: a scalar, a vector and a symmetric matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceKernels {
    pub k1: f64,
    pub k2: Vector3<f64>,
    pub k3: Matrix3<f64>,
}

impl Default for TraceKernels {
    fn default() -> Self {
        Self {
            k1: 0.0,
            k2: Vector3::zeros(),
            k3: Matrix3::zeros(),
        }
    }
}

impl TraceKernels {
    /// Contribution of a single landmark.
    pub fn from_landmark(position: &Vector3<f64>, landmark: &Vector3<f64>) -> Self {
        let Some((f, w)) = bearing_and_weight(position, landmark) else {
            return Self::default();
        };
        let t = 2.0 * w;
        Self {
            k1: t,
            k2: f * t,
            k3: f * f.transpose() * t,
        }
    }

    /// Sequential accumulation over `landmarks`.
    pub fn build(position: &Vector3<f64>, landmarks: &[Vector3<f64>]) -> Self {
        landmarks
            .iter()
            .map(|l| Self::from_landmark(position, l))
            .sum()
    }

    /// Parallel accumulation over `landmarks`.
    pub fn build_par(position: &Vector3<f64>, landmarks: &[Vector3<f64>]) -> Self {
        landmarks
            .par_iter()
            .map(|l| Self::from_landmark(position, l))
            .reduce(Self::default, |a, b| a + b)
    }

    /// Trace of the information matrix for optical axis `z`.
    pub fn trace(&self, k1: f64, k2: f64, k3: f64, z: &Vector3<f64>) -> f64 {
        k1 * self.k1 + k2 * self.k2.dot(z) + k3 * z.dot(&(self.k3 * z))
    }

    /// Largest absolute difference to another kernel set.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        (self.k1 - other.k1)
            .abs()
            .max((self.k2 - other.k2).amax())
            .max((self.k3 - other.k3).amax())
    }

    pub fn is_finite(&self) -> bool {
        self.k1.is_finite()
            && self.k2.iter().all(|x| x.is_finite())
            && self.k3.iter().all(|x| x.is_finite())
    }
}

impl AddAssign<&TraceKernels> for TraceKernels {
    fn add_assign(&mut self, rhs: &TraceKernels) {
        self.k1 += rhs.k1;
        self.k2 += rhs.k2;
        self.k3 += rhs.k3;
    }
}

impl Add for TraceKernels {
    type Output = TraceKernels;

    fn add(mut self, rhs: TraceKernels) -> TraceKernels {
        self += &rhs;
        self
    }
}

impl Sum for TraceKernels {
    fn sum<I: Iterator<Item = TraceKernels>>(iter: I) -> Self {
        iter.fold(Self::default(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landmarks() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(1.0, 0.2, 0.5),
            Vector3::new(-2.0, 1.0, 0.0),
            Vector3::new(0.3, -1.5, 2.2),
            Vector3::new(0.0, 0.0, -3.0),
            Vector3::new(4.0, 4.0, 1.0),
        ]
    }

    #[test]
    fn test_single_landmark_trace() {
        let p = Vector3::new(0.0, 0.0, 0.0);
        let l = Vector3::new(0.0, 0.0, 2.0);
        let t = TraceKernels::from_landmark(&p, &l);
        assert!((t.k1 - 0.5).abs() < 1e-15);
        assert!((t.k2 - Vector3::new(0.0, 0.0, 0.5)).norm() < 1e-15);
        // Only the constant term: trace of w (I − f fᵀ) = 2w
        let info = InfoKernels::from_landmark(&p, &l);
        let m = info.information(1.0, 0.0, 0.0, &Vector3::z());
        assert!((m.trace() - 0.5).abs() < 1e-15);
        assert!((m - bearing_information(&Vector3::z(), 0.25)).norm() < 1e-15);
    }

    #[test]
    fn test_coincident_landmark_is_skipped() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(TraceKernels::from_landmark(&p, &p), TraceKernels::default());
        assert_eq!(InfoKernels::from_landmark(&p, &p), InfoKernels::default());
    }

    #[test]
    fn test_info_trace_matches_trace_kernels() {
        let p = Vector3::new(0.1, -0.2, 0.3);
        let lms = landmarks();
        let info = InfoKernels::build(&p, &lms);
        let trace = TraceKernels::build(&p, &lms);
        let (k1, k2, k3) = (0.4, 0.5, 0.1);
        for z in [Vector3::x(), -Vector3::y(), Vector3::new(0.3, 0.4, -0.5).normalize()] {
            let m = info.information(k1, k2, k3, &z);
            assert!((m.trace() - trace.trace(k1, k2, k3, &z)).abs() < 1e-12);
            assert_eq!(m, m.transpose());
        }
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let p = Vector3::new(0.5, 0.5, 0.0);
        let lms = landmarks();
        let seq = InfoKernels::build(&p, &lms);
        let par = InfoKernels::build_par(&p, &lms);
        assert!(seq.max_abs_diff(&par) < 1e-12);
        let seq = TraceKernels::build(&p, &lms);
        let par = TraceKernels::build_par(&p, &lms);
        assert!(seq.max_abs_diff(&par) < 1e-12);
    }
}
