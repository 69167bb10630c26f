//! Candidate positions on a uniform grid.
//!
//! Orientation optimization is usually run for a random subset of the voxel
//! centers of a box-shaped map region. The box is centred at the origin with the
//! configured side lengths.

use nalgebra::Vector3;
use rand::RngExt;

/// Uniform grid inside a box centred at the origin.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Side length of the box along X.
    pub x_range: f64,
    /// Side length of the box along Y.
    pub y_range: f64,
    /// Side length of the box along Z.
    pub z_range: f64,
    /// Spacing between neighbouring grid points.
    pub voxel_res: f64,
    /// Fraction of grid points to evaluate.
    pub check_ratio: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            x_range: 5.0,
            y_range: 5.0,
            z_range: 2.0,
            voxel_res: 0.5,
            check_ratio: 0.05,
        }
    }
}

/// Coordinates `−range/2, −range/2 + res, …` up to `range/2` (inclusive within rounding).
fn axis_values(range: f64, res: f64) -> Vec<f64> {
    let half = 0.5 * range;
    let n = ((range / res) + 1e-9).floor() as usize + 1;
    (0..n).map(|i| -half + i as f64 * res).collect()
}

/// All grid points, X fastest.
pub fn uniform_grid_points(config: &GridConfig) -> anyhow::Result<Vec<Vector3<f64>>> {
    anyhow::ensure!(
        config.voxel_res > 0.0,
        "voxel resolution must be positive, got {}",
        config.voxel_res
    );
    anyhow::ensure!(
        config.x_range >= 0.0 && config.y_range >= 0.0 && config.z_range >= 0.0,
        "grid ranges must be non-negative"
    );
    let xs = axis_values(config.x_range, config.voxel_res);
    let ys = axis_values(config.y_range, config.voxel_res);
    let zs = axis_values(config.z_range, config.voxel_res);

    let mut points = Vec::with_capacity(xs.len() * ys.len() * zs.len());
    for &z in &zs {
        for &y in &ys {
            for &x in &xs {
                points.push(Vector3::new(x, y, z));
            }
        }
    }
    Ok(points)
}

/// Draw `floor(check_ratio · |grid|)` grid points uniformly, with replacement.
pub fn sample_positions<R: RngExt>(
    config: &GridConfig,
    rng: &mut R,
) -> anyhow::Result<Vec<Vector3<f64>>> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&config.check_ratio),
        "check ratio must be in [0, 1], got {}",
        config.check_ratio
    );
    let grid = uniform_grid_points(config)?;
    let n = (config.check_ratio * grid.len() as f64) as usize;
    Ok((0..n)
        .map(|_| grid[rng.random_range(0..grid.len())])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_grid() {
        let grid = uniform_grid_points(&GridConfig::default()).unwrap();
        // 11 × 11 × 5
        assert_eq!(grid.len(), 605);
        assert_eq!(grid[0], Vector3::new(-2.5, -2.5, -1.0));
        let last = grid[grid.len() - 1];
        assert!((last - Vector3::new(2.5, 2.5, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_sample_positions() {
        let config = GridConfig::default();
        let grid = uniform_grid_points(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let positions = sample_positions(&config, &mut rng).unwrap();
        assert_eq!(positions.len(), 30);
        assert!(positions.iter().all(|p| grid.contains(p)));

        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(positions, sample_positions(&config, &mut rng).unwrap());
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = GridConfig {
            voxel_res: 0.0,
            ..Default::default()
        };
        assert!(uniform_grid_points(&config).is_err());
        let config = GridConfig {
            check_ratio: 1.5,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_positions(&config, &mut rng).is_err());
    }
}
