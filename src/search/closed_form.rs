//! Closed-form extremum of the trace over optical-axis directions.
//!
//! With trace kernels `(T1, T2, T3)` and visibility coefficients `(k1, k2, k3)`
//! the trace for optical axis `z` is
//!
//! ```text
//! t(z) = k1·T1 + zᵀ M z + gᵀ z,    M = k3·T3,  g = k2·T2,  |z| = 1
//! ```
//!
//! Minimizing a quadratic on the unit sphere is a trust-region subproblem. With
//! `M = Q diag(μ) Qᵀ` (μ ascending) and `ĝ = Qᵀg`, the global minimizer is
//!
//! ```text
//! ẑ_j = −ĝ_j / (2(μ_j − λ)),   λ ≤ μ_0,   Σ ẑ_j² = 1
//! ```
//!
//! found by bisection on the secular equation. When `ĝ` has no component in the
//! smallest eigenspace (the "hard case") and the remaining step is shorter than
//! one, the step is completed along the first eigenvector of that eigenspace with a
//! positive coefficient. Eigenvectors are sign-normalized (largest component
//! positive) so the result is deterministic.
//!
//! The maximum is the minimum of `−t`. Trace does not depend on roll, so the
//! returned rotation uses the sampler's canonical roll for the optimal axis.

use std::cmp::Ordering;

use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use thiserror::Error;

use crate::kernels::TraceKernels;
use crate::sampler::rotation_from_optical_axis;
use crate::visibility::QuadraticVisibility;

use super::OptimalView;

/// Relative tolerance for eigenvalue/gradient degeneracy.
const EIGEN_TOL: f64 = 1e-10;
/// Bisection iterations on the secular equation (interval halves each time).
const MAX_BISECTIONS: usize = 200;

/// Which extremum of the trace to solve for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceExtremum {
    /// Least informative direction; compare with `search_worst`.
    #[default]
    Minimum,
    /// Most informative direction; compare with `search_kernel_trace`.
    Maximum,
}

/// Why no closed-form optimum could be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClosedFormFailure {
    #[error("trace kernels contain non-finite values")]
    NonFiniteKernels,
    #[error("trace is constant over orientations; no unique optimum")]
    Degenerate,
    #[error("eigendecomposition produced non-finite values")]
    NonFiniteEigen,
    #[error("secular equation did not yield a unit direction")]
    NoConvergence,
}

/// Optical axis extremizing the trace, with its trace value.
pub fn closed_form_trace_optimum(
    visibility: &QuadraticVisibility,
    kernels: &TraceKernels,
    extremum: TraceExtremum,
) -> Result<OptimalView, ClosedFormFailure> {
    if !kernels.is_finite() {
        return Err(ClosedFormFailure::NonFiniteKernels);
    }
    let sign = match extremum {
        TraceExtremum::Minimum => 1.0,
        TraceExtremum::Maximum => -1.0,
    };
    let m = kernels.k3 * (sign * visibility.k3());
    let g = kernels.k2 * (sign * visibility.k2());

    let z = minimize_on_sphere(&m, &g)?;
    let value = kernels.trace(visibility.k1(), visibility.k2(), visibility.k3(), &z);
    Ok(OptimalView {
        rotation: rotation_from_optical_axis(&z, 0.0),
        value,
    })
}

/// Flip `v` so that its largest-magnitude component is positive.
fn canonical_sign(v: Vector3<f64>) -> Vector3<f64> {
    if v[v.iamax()] < 0.0 {
        -v
    } else {
        v
    }
}

/// Global minimizer of `zᵀMz + gᵀz` over the unit sphere.
fn minimize_on_sphere(m: &Matrix3<f64>, g: &Vector3<f64>) -> Result<Vector3<f64>, ClosedFormFailure> {
    let eig = SymmetricEigen::new(*m);
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| {
        eig.eigenvalues[a]
            .partial_cmp(&eig.eigenvalues[b])
            .unwrap_or(Ordering::Equal)
    });
    let mu = order.map(|i| eig.eigenvalues[i]);
    let q = order.map(|i| canonical_sign(eig.eigenvectors.column(i).into_owned()));
    let gt = q.map(|qi| qi.dot(g));
    if mu.iter().chain(gt.iter()).any(|v| !v.is_finite()) {
        return Err(ClosedFormFailure::NonFiniteEigen);
    }

    let g_norm = g.norm();
    let eps = EIGEN_TOL * (m.norm() + g_norm);
    if mu[2] - mu[0] <= eps && g_norm <= eps {
        return Err(ClosedFormFailure::Degenerate);
    }

    let in_min_space = mu.map(|v| v - mu[0] <= eps);
    let g_par = (0..3)
        .filter(|&j| in_min_space[j])
        .map(|j| gt[j] * gt[j])
        .sum::<f64>()
        .sqrt();

    // Step for multiplier λ. Components of the smallest eigenspace share μ_0 and
    // are dropped when `exclude_min` is set (they carry no gradient).
    let step = |lambda: f64, exclude_min: bool| -> [f64; 3] {
        let mut s = [0.0; 3];
        for j in 0..3 {
            if in_min_space[j] {
                if !exclude_min {
                    s[j] = -gt[j] / (2.0 * (mu[0] - lambda));
                }
            } else {
                s[j] = -gt[j] / (2.0 * (mu[j] - lambda));
            }
        }
        s
    };
    let norm2 = |s: &[f64; 3]| s.iter().map(|v| v * v).sum::<f64>();

    let solve = |lo: f64, hi: f64, exclude_min: bool| -> [f64; 3] {
        let (mut lo, mut hi) = (lo, hi);
        for _ in 0..MAX_BISECTIONS {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            if norm2(&step(mid, exclude_min)) > 1.0 {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        step(lo, exclude_min)
    };

    let coeffs = if g_par > eps {
        // φ(μ_0 − |g|/2) ≤ 1 ≤ φ(μ_0 − |g_par|/2)
        solve(mu[0] - g_norm / 2.0, mu[0] - g_par / 2.0, false)
    } else {
        let rest = step(mu[0], true);
        let r2 = norm2(&rest);
        if r2 <= 1.0 {
            let mut s = rest;
            s[0] = (1.0 - r2).sqrt();
            s
        } else {
            solve(mu[0] - g_norm / 2.0, mu[0], true)
        }
    };

    let z = q[0] * coeffs[0] + q[1] * coeffs[1] + q[2] * coeffs[2];
    let n = z.norm();
    if !n.is_finite() || n < 0.5 {
        return Err(ClosedFormFailure::NoConvergence);
    }
    Ok(z / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::fibonacci_sphere_lattice;

    fn objective(m: &Matrix3<f64>, g: &Vector3<f64>, z: &Vector3<f64>) -> f64 {
        z.dot(&(m * z)) + g.dot(z)
    }

    /// Dense brute force over the sphere.
    fn brute_min(m: &Matrix3<f64>, g: &Vector3<f64>) -> f64 {
        fibonacci_sphere_lattice(20_000)
            .iter()
            .map(|z| objective(m, g, z))
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_easy_case_matches_brute_force() {
        let m = Matrix3::new(2.0, 0.3, -0.1, 0.3, 1.0, 0.2, -0.1, 0.2, 0.5);
        let g = Vector3::new(0.4, -1.0, 0.7);
        let z = minimize_on_sphere(&m, &g).unwrap();
        assert!((z.norm() - 1.0).abs() < 1e-12);
        let v = objective(&m, &g, &z);
        let brute = brute_min(&m, &g);
        assert!(v <= brute + 1e-12);
        assert!(brute - v < 5e-3, "closed {} vs brute {}", v, brute);
    }

    #[test]
    fn test_hard_case_interior_step() {
        // Gradient only along the largest eigenvector, short step
        let m = Matrix3::from_diagonal(&Vector3::new(0.0, 0.0, 1.0));
        let g = Vector3::new(0.0, 0.0, 0.5);
        let z = minimize_on_sphere(&m, &g).unwrap();
        assert!((z.norm() - 1.0).abs() < 1e-12);
        assert!((z.z + 0.25).abs() < 1e-9);
        assert!((objective(&m, &g, &z) + 0.0625).abs() < 1e-9);
        // Deterministic
        assert_eq!(z, minimize_on_sphere(&m, &g).unwrap());
    }

    #[test]
    fn test_single_landmark_extrema() {
        let vis = QuadraticVisibility::second_order(std::f64::consts::FRAC_PI_4).unwrap();
        let kernels = TraceKernels::from_landmark(&Vector3::zeros(), &Vector3::new(0.0, 0.0, 2.0));

        let min = closed_form_trace_optimum(&vis, &kernels, TraceExtremum::Minimum).unwrap();
        let axis = min.rotation.matrix().column(2).into_owned();
        assert!((axis + Vector3::z()).norm() < 1e-6, "min axis {:?}", axis);
        assert!((min.value - 0.5 * vis.value(-1.0)).abs() < 1e-9);

        let max = closed_form_trace_optimum(&vis, &kernels, TraceExtremum::Maximum).unwrap();
        let axis = max.rotation.matrix().column(2).into_owned();
        assert!((axis - Vector3::z()).norm() < 1e-6, "max axis {:?}", axis);
        assert!((max.value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_failures() {
        let vis = QuadraticVisibility::second_order(std::f64::consts::FRAC_PI_4).unwrap();
        assert_eq!(
            closed_form_trace_optimum(&vis, &TraceKernels::default(), TraceExtremum::Minimum),
            Err(ClosedFormFailure::Degenerate)
        );
        let mut bad = TraceKernels::default();
        bad.k2.x = f64::NAN;
        assert_eq!(
            closed_form_trace_optimum(&vis, &bad, TraceExtremum::Maximum),
            Err(ClosedFormFailure::NonFiniteKernels)
        );
    }
}
