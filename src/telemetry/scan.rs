//! Fake range-finder data

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LidarPoint {
    /// Degrees, `[0, 360)`
    pub angle: f64,
    /// Meters
    pub distance: f64,
}

pub const SWEEP_STEP_DEG: u32 = 5;

/// Full 360° sweep: 72 points, `3 + 1.5 sin(3θ) + U(0, 0.3)`
pub fn lidar_sweep<R: Rng>(rng: &mut R) -> Vec<LidarPoint> {
    (0..360)
        .step_by(SWEEP_STEP_DEG as usize)
        .map(|deg| {
            let angle = deg as f64;
            let base = 3.0 + (angle.to_radians() * 3.0).sin() * 1.5;
            LidarPoint {
                angle,
                distance: base + rng.random_range(0.0..0.3),
            }
        })
        .collect()
}

pub const RING_SAMPLES: usize = 8;
pub const RING_MIN: f64 = 2.0;
pub const RING_MAX: f64 = 10.0;

/// Eight coarse samples in `[2, 10)` around the field robot
pub fn lidar_ring<R: Rng>(rng: &mut R) -> Vec<f64> {
    (0..RING_SAMPLES)
        .map(|_| rng.random_range(RING_MIN..RING_MAX))
        .collect()
}

/// Roughly one tick in twenty reports an obstacle
pub fn obstacle_detected<R: Rng>(rng: &mut R) -> bool {
    rng.random::<f64>() > 0.95
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sweep_shape() {
        let mut rng = StdRng::seed_from_u64(3);
        let sweep = lidar_sweep(&mut rng);
        assert_eq!(sweep.len(), 72);
        assert_eq!(sweep[1].angle, 5.0);
        assert_eq!(sweep[71].angle, 355.0);
        for p in &sweep {
            assert!(p.distance >= 1.5 - 1e-9 && p.distance < 4.8);
        }
    }

    #[test]
    fn test_ring_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let ring = lidar_ring(&mut rng);
            assert_eq!(ring.len(), RING_SAMPLES);
            assert!(ring.iter().all(|d| (RING_MIN..RING_MAX).contains(d)));
        }
    }

    #[test]
    fn test_obstacles_are_rare() {
        let mut rng = StdRng::seed_from_u64(11);
        let hits = (0..10_000).filter(|_| obstacle_detected(&mut rng)).count();
        assert!(hits > 300 && hits < 700, "{hits}");
    }
}
