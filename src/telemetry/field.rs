//! Field robot simulation: circular drive, spinning LiDAR, phase readings

use super::path::{CircularPath, PathSample};
use super::presets::field_robot;
use super::reading::round_to;
use super::scan::{lidar_ring, obstacle_detected};
use super::{Telemetry, TelemetryError, TelemetrySnapshot};
use crate::scene::ScenePose;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Radians the LiDAR head turns per step
pub const LIDAR_SPIN: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct FieldSimulation {
    path: CircularPath,
    telemetry: Telemetry,
    lidar: Vec<f64>,
    obstacle: bool,
    spin_angle: f32,
    running: bool,
}

/// Map readout of the field robot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    #[serde(flatten)]
    pub telemetry: TelemetrySnapshot,
    pub position: PathSample,
    pub lidar_ring: Vec<f64>,
    pub obstacle_detected: bool,
    pub running: bool,
}

impl FieldSimulation {
    pub fn new(seed: u64) -> Result<Self, TelemetryError> {
        Ok(Self {
            path: CircularPath::default(),
            telemetry: field_robot(seed)?,
            lidar: Vec::new(),
            obstacle: false,
            spin_angle: 0.0,
            running: false,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        if self.running != running {
            tracing::info!("Field simulation {}", if running { "started" } else { "paused" });
        }
        self.running = running;
    }

    pub fn toggle(&mut self) {
        self.set_running(!self.running);
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn lidar(&self) -> &[f64] {
        &self.lidar
    }

    pub fn obstacle_detected(&self) -> bool {
        self.obstacle
    }

    pub fn position(&self) -> PathSample {
        self.path.sample()
    }

    /// One animation step. Paused simulations do not move.
    pub fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.path.step();
        self.spin_angle = (self.spin_angle + LIDAR_SPIN) % std::f32::consts::TAU;
        self.telemetry.tick();
        let rng = self.telemetry.rng_mut();
        self.lidar = lidar_ring(rng);
        self.obstacle = obstacle_detected(rng);
        true
    }

    /// Stop and park the robot at the origin
    pub fn reset(&mut self) {
        self.set_running(false);
        self.path.reset();
        self.spin_angle = 0.0;
    }

    /// Place the robot model; the origin when parked after a reset
    pub fn apply_to(&self, pose: &mut ScenePose) {
        pose.spin_angle = self.spin_angle;
        if self.path.angle() == 0.0 {
            pose.root_position = Vec3::ZERO;
            pose.root_yaw = 0.0;
            return;
        }
        let sample = self.path.sample();
        pose.root_position = Vec3::new(sample.x as f32, 0.0, sample.z as f32);
        pose.root_yaw = sample.yaw as f32;
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        let mut position = self.path.sample();
        position.x = round_to(position.x, 2);
        position.z = round_to(position.z, 2);
        FieldSnapshot {
            telemetry: self.telemetry.snapshot(),
            position,
            lidar_ring: self.lidar.clone(),
            obstacle_detected: self.obstacle,
            running: self.running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paused_does_not_move() {
        let mut sim = FieldSimulation::new(1).unwrap();
        assert!(!sim.step());
        assert_eq!(sim.telemetry().ticks(), 0);

        sim.toggle();
        assert!(sim.step());
        assert_eq!(sim.lidar().len(), 8);
        assert_eq!(sim.telemetry().ticks(), 1);
    }

    #[test]
    fn test_pose_follows_path_and_reset_parks() {
        let mut sim = FieldSimulation::new(1).unwrap();
        let mut pose = ScenePose::default();
        sim.set_running(true);
        for _ in 0..10 {
            sim.step();
        }
        sim.apply_to(&mut pose);
        assert!((pose.root_position.length() - 5.0).abs() < 1e-4);
        assert!((pose.spin_angle - 2.0).abs() < 1e-4);

        sim.reset();
        sim.apply_to(&mut pose);
        assert!(!sim.is_running());
        assert_eq!(pose.root_position, Vec3::ZERO);
        assert_eq!(pose.root_yaw, 0.0);
    }

    #[test]
    fn test_snapshot_rounds_position() {
        let mut sim = FieldSimulation::new(4).unwrap();
        sim.set_running(true);
        sim.step();
        let snap = sim.snapshot();
        assert_eq!(snap.position.x, 0.05);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["source"], "field_robot");
        assert_eq!(json["lidar_ring"].as_array().map(Vec::len), Some(8));
    }
}
