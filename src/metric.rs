//! Scalar observability metrics over a symmetric 3×3 information matrix.
//!
//! Three strategies are provided, each implementing [`InfoMetric`]:
//!
//! - [`MinEigMetric`] — smallest eigenvalue (weakest observable direction)
//! - [`DetMetric`] — determinant (information-ellipsoid volume)
//! - [`TraceMetric`] — trace (sum of eigenvalues, no decomposition needed)
//!
//! Larger is better for all three. Searches are generic over the metric so the
//! strategy is fixed once per run instead of being re-dispatched per sample.
//!
//! Evaluation is checked: a matrix that is not symmetric, contains non-finite
//! values, or (for the eigenvalue metrics) has a clearly negative eigenvalue is
//! reported as a [`MetricFault`] instead of producing a misleading score.

use std::fmt;

use nalgebra::{Matrix3, SymmetricEigen};
use thiserror::Error;

/// Relative tolerance for the symmetry check.
const SYMMETRY_TOL: f64 = 1e-9;
/// Relative tolerance for the positive semi-definiteness check.
const PSD_TOL: f64 = 1e-9;

/// Numerical fault raised while scoring a matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricFault {
    #[error("information matrix contains non-finite values")]
    NonFinite,
    #[error("information matrix is not symmetric (max asymmetry {max_asymmetry:.3e})")]
    Asymmetric { max_asymmetry: f64 },
    #[error("information matrix is not positive semi-definite (min eigenvalue {min_eigenvalue:.3e})")]
    NotPsd { min_eigenvalue: f64 },
    #[error("trace score is not finite")]
    NonFiniteTrace,
    #[error("no rotation samples to search")]
    NoSamples,
}

/// The closed set of metric strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    MinEig,
    Det,
    Trace,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::MinEig, MetricKind::Det, MetricKind::Trace];

    /// Short name used to label results.
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::MinEig => "min_eig",
            MetricKind::Det => "det",
            MetricKind::Trace => "trace",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a symmetric information matrix to a scalar score (larger is better).
pub trait InfoMetric: Sync {
    fn kind(&self) -> MetricKind;

    fn evaluate(&self, info: &Matrix3<f64>) -> Result<f64, MetricFault>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MinEigMetric;

#[derive(Debug, Clone, Copy, Default)]
pub struct DetMetric;

#[derive(Debug, Clone, Copy, Default)]
pub struct TraceMetric;

impl InfoMetric for MinEigMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::MinEig
    }

    fn evaluate(&self, info: &Matrix3<f64>) -> Result<f64, MetricFault> {
        let eig = checked_eigenvalues(info)?;
        Ok(eig[0])
    }
}

impl InfoMetric for DetMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Det
    }

    fn evaluate(&self, info: &Matrix3<f64>) -> Result<f64, MetricFault> {
        let eig = checked_eigenvalues(info)?;
        Ok(eig[0] * eig[1] * eig[2])
    }
}

impl InfoMetric for TraceMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Trace
    }

    fn evaluate(&self, info: &Matrix3<f64>) -> Result<f64, MetricFault> {
        check_symmetric(info)?;
        Ok(info.trace())
    }
}

/// Verify that `m` is finite and symmetric within a relative tolerance.
pub fn check_symmetric(m: &Matrix3<f64>) -> Result<(), MetricFault> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(MetricFault::NonFinite);
    }
    let scale = 1.0 + m.amax();
    let max_asymmetry = (m - m.transpose()).amax();
    if max_asymmetry > SYMMETRY_TOL * scale {
        return Err(MetricFault::Asymmetric { max_asymmetry });
    }
    Ok(())
}

/// Eigenvalues of a checked symmetric PSD matrix, sorted ascending.
///
/// Tiny negative eigenvalues from rounding are clamped to zero.
pub fn checked_eigenvalues(m: &Matrix3<f64>) -> Result<[f64; 3], MetricFault> {
    check_symmetric(m)?;
    let eig = SymmetricEigen::new(*m);
    let mut vals = [eig.eigenvalues[0], eig.eigenvalues[1], eig.eigenvalues[2]];
    if vals.iter().any(|v| !v.is_finite()) {
        return Err(MetricFault::NonFinite);
    }
    vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let tol = PSD_TOL * vals[2].abs().max(1.0);
    if vals[0] < -tol {
        return Err(MetricFault::NotPsd {
            min_eigenvalue: vals[0],
        });
    }
    for v in vals.iter_mut() {
        *v = v.max(0.0);
    }
    Ok(vals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(a: f64, b: f64, c: f64) -> Matrix3<f64> {
        Matrix3::from_diagonal(&nalgebra::Vector3::new(a, b, c))
    }

    #[test]
    fn test_metrics_on_diagonal_matrix() {
        let m = diag(3.0, 1.0, 2.0);
        assert!((MinEigMetric.evaluate(&m).unwrap() - 1.0).abs() < 1e-12);
        assert!((DetMetric.evaluate(&m).unwrap() - 6.0).abs() < 1e-12);
        assert!((TraceMetric.evaluate(&m).unwrap() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_are_rotation_invariant() {
        let r = nalgebra::Rotation3::from_euler_angles(0.3, -1.1, 2.0);
        let m = diag(3.0, 1.0, 2.0);
        let rotated = r.matrix() * m * r.matrix().transpose();
        // Symmetrize away rounding before evaluation
        let rotated = (rotated + rotated.transpose()) * 0.5;
        assert!((MinEigMetric.evaluate(&rotated).unwrap() - 1.0).abs() < 1e-9);
        assert!((DetMetric.evaluate(&rotated).unwrap() - 6.0).abs() < 1e-9);
        assert!((TraceMetric.evaluate(&rotated).unwrap() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_matrix_degenerates_to_zero() {
        let z = Matrix3::zeros();
        assert_eq!(MinEigMetric.evaluate(&z).unwrap(), 0.0);
        assert_eq!(DetMetric.evaluate(&z).unwrap(), 0.0);
        assert_eq!(TraceMetric.evaluate(&z).unwrap(), 0.0);
    }

    #[test]
    fn test_faults() {
        let mut asym = diag(1.0, 1.0, 1.0);
        asym[(0, 1)] = 0.5;
        assert!(matches!(
            TraceMetric.evaluate(&asym),
            Err(MetricFault::Asymmetric { .. })
        ));

        let mut nan = diag(1.0, 1.0, 1.0);
        nan[(2, 2)] = f64::NAN;
        assert_eq!(MinEigMetric.evaluate(&nan), Err(MetricFault::NonFinite));

        let neg = diag(1.0, -0.5, 2.0);
        assert!(matches!(
            DetMetric.evaluate(&neg),
            Err(MetricFault::NotPsd { .. })
        ));
    }

    #[test]
    fn test_kind_names() {
        let names: Vec<_> = MetricKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["min_eig", "det", "trace"]);
        assert_eq!(MinEigMetric.kind(), MetricKind::MinEig);
        assert_eq!(format!("{}", MetricKind::Det), "det");
    }
}
