use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Fixed circle the field robot drives around
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularPath {
    pub radius: f64,
    /// Radians per step
    pub angle_step: f64,
    angle: f64,
}

impl Default for CircularPath {
    fn default() -> Self {
        Self {
            radius: 5.0,
            angle_step: 0.01,
            angle: 0.0,
        }
    }
}

/// Position on the ground plane plus heading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSample {
    pub x: f64,
    /// Ground-plane Z (shown as "y" on the map readout)
    pub z: f64,
    /// Model yaw in radians: tangent to the circle
    pub yaw: f64,
    /// Whole degrees in `[0, 360)`
    pub heading_deg: i64,
}

impl CircularPath {
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn sample(&self) -> PathSample {
        let (sin, cos) = self.angle.sin_cos();
        PathSample {
            x: sin * self.radius,
            z: cos * self.radius,
            yaw: self.angle + FRAC_PI_2,
            heading_deg: (self.angle.to_degrees().round() as i64).rem_euclid(360),
        }
    }

    pub fn step(&mut self) -> PathSample {
        self.angle += self.angle_step;
        self.sample()
    }

    pub fn reset(&mut self) {
        self.angle = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stays_on_circle() {
        let mut path = CircularPath::default();
        for _ in 0..1000 {
            let s = path.step();
            assert!(((s.x * s.x + s.z * s.z).sqrt() - 5.0).abs() < 1e-9);
            assert!((0..360).contains(&s.heading_deg));
        }
    }

    #[test]
    fn test_heading_wraps() {
        let mut path = CircularPath {
            angle_step: std::f64::consts::PI / 180.0,
            ..CircularPath::default()
        };
        let mut last = 0;
        for _ in 0..360 {
            last = path.step().heading_deg;
        }
        assert_eq!(last, 0);
        path.reset();
        assert_eq!(path.sample().yaw, FRAC_PI_2);
        assert_eq!(path.sample().z, 5.0);
    }
}
