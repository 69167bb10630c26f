//! Pre-trained visibility approximator and its rkyv artifact format.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use nalgebra::Vector3;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::sampler::fibonacci_sphere_lattice;

/// Metadata describing how an approximator was trained.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct ApproximatorProperties {
    /// Half field of view of the camera the approximator was fitted to (radians).
    pub half_fov_rad: f64,
    /// Number of direction bins voxels use to compress landmarks.
    pub num_direction_bins: u32,
    /// Length scale of the Gaussian basis, in cosine units.
    pub length_scale: f64,
    /// Number of landmarks in the training scenes (informational).
    pub num_training_landmarks: u32,
}

/// Radial-basis regression of visibility over the bearing cosine:
///
/// ```text
/// v̂(x) = bias + Σ_j w_j · exp(−(x − c_j)² / (2ℓ²))
/// ```
///
/// Immutable once built or loaded. Share it through [`Arc`] between voxels.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct VisibilityApproximator {
    /// Basis centers `c_j` (cosine of the off-axis angle).
    pub centers: Vec<f64>,
    /// Basis weights `w_j`, matching `centers`.
    pub weights: Vec<f64>,
    /// Constant offset.
    pub bias: f64,
    /// Unit directions of the landmark compression bins.
    pub bin_directions: Vec<[f64; 3]>,
    pub props: ApproximatorProperties,
}

impl VisibilityApproximator {
    /// Assemble an approximator from trained parameters.
    ///
    /// Direction bins are laid out on a Fibonacci lattice of
    /// `props.num_direction_bins` points.
    pub fn new(
        props: ApproximatorProperties,
        centers: Vec<f64>,
        weights: Vec<f64>,
        bias: f64,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            props.num_direction_bins > 0,
            "approximator needs at least one direction bin"
        );
        let bin_directions = fibonacci_sphere_lattice(props.num_direction_bins as usize)
            .into_iter()
            .map(|v| [v.x, v.y, v.z])
            .collect();

        let approx = Self {
            centers,
            weights,
            bias,
            bin_directions,
            props,
        };
        approx.validate()?;
        Ok(approx)
    }

    /// Check the parameters a prediction depends on.
    ///
    /// Run on construction and on every load, so a corrupt artifact is rejected
    /// up front instead of faulting every regression query.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.centers.len() == self.weights.len(),
            "approximator has {} centers but {} weights",
            self.centers.len(),
            self.weights.len()
        );
        anyhow::ensure!(
            self.props.length_scale.is_finite() && self.props.length_scale > 0.0,
            "length scale must be positive, got {}",
            self.props.length_scale
        );
        anyhow::ensure!(
            !self.bin_directions.is_empty(),
            "approximator needs at least one direction bin"
        );
        anyhow::ensure!(
            self.bias.is_finite()
                && self.centers.iter().all(|c| c.is_finite())
                && self.weights.iter().all(|w| w.is_finite()),
            "approximator parameters must be finite"
        );
        anyhow::ensure!(
            self.bin_directions.iter().flatten().all(|d| d.is_finite()),
            "direction bins must be finite"
        );
        Ok(())
    }

    /// Predicted visibility for cosine `x` between optical axis and bearing.
    pub fn predict(&self, x: f64) -> f64 {
        let inv_two_l2 = 1.0 / (2.0 * self.props.length_scale * self.props.length_scale);
        self.centers
            .iter()
            .zip(&self.weights)
            .fold(self.bias, |acc, (c, w)| {
                let d = x - c;
                acc + w * (-d * d * inv_two_l2).exp()
            })
    }

    pub fn num_bins(&self) -> usize {
        self.bin_directions.len()
    }

    /// Unit direction of bin `idx`.
    pub fn bin_direction(&self, idx: usize) -> Vector3<f64> {
        let d = self.bin_directions[idx];
        Vector3::new(d[0], d[1], d[2])
    }

    /// Index of the bin closest to the unit bearing `f`.
    pub fn bin_for(&self, f: &Vector3<f64>) -> usize {
        let mut best = 0;
        let mut best_dot = f64::NEG_INFINITY;
        for (i, d) in self.bin_directions.iter().enumerate() {
            let dot = d[0] * f.x + d[1] * f.y + d[2] * f.z;
            if dot > best_dot {
                best_dot = dot;
                best = i;
            }
        }
        best
    }
}

// ── Serialization ───────────────────────────────────────────────────────────

impl VisibilityApproximator {
    /// Serialize the approximator to bytes using rkyv.
    pub fn to_rkyv_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| anyhow::anyhow!("rkyv serialization failed: {}", e))?;
        Ok(bytes.to_vec())
    }

    /// Save the approximator to a file using rkyv.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let bytes = self.to_rkyv_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            "Saved visibility approximator to {} ({} bytes)",
            path.as_ref().display(),
            bytes.len()
        );
        Ok(())
    }

    /// Load an approximator from an rkyv file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let approx = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&bytes)
            .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))?;
        approx
            .validate()
            .with_context(|| format!("corrupt approximator in {}", path.as_ref().display()))?;
        info!(
            "Loaded visibility approximator: {} basis functions, {} direction bins, hfov {:.1}°",
            approx.centers.len(),
            approx.bin_directions.len(),
            approx.props.half_fov_rad.to_degrees()
        );
        Ok(approx)
    }

    /// Load an approximator ready to be shared between voxels.
    pub fn load_shared<P: AsRef<Path>>(path: P) -> anyhow::Result<Arc<Self>> {
        Ok(Arc::new(Self::load_from_file(path)?))
    }
}
