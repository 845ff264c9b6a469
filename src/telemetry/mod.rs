//! Telemetry Simulator
//!
//! Purely cosmetic readings regenerated on a fixed interval. Every instance
//! owns a seeded [`StdRng`] so a given seed always replays the same
//! sequence; nothing here touches system entropy.

mod field;
mod path;
mod presets;
mod reading;
mod scan;

pub use field::*;
pub use path::*;
pub use presets::*;
pub use reading::*;
pub use scan::*;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TelemetryError {
    #[error("reading {0:?} has an invalid range or model")]
    InvalidReading(String),
    #[error("reading {0:?} is declared twice")]
    DuplicateReading(String),
    #[error("tick interval must be non-zero")]
    ZeroInterval,
}

/// Set of independent readings sharing one clock and one generator
#[derive(Debug, Clone)]
pub struct Telemetry {
    source: String,
    interval: Duration,
    /// Simulated seconds added per tick (phase readings use this clock)
    time_step: f64,
    readings: Vec<Reading>,
    sweep: Option<Vec<LidarPoint>>,
    rng: StdRng,
    time: f64,
    ticks: u64,
}

impl Telemetry {
    pub fn new(
        source: &str,
        interval: Duration,
        seed: u64,
        readings: Vec<Reading>,
    ) -> Result<Self, TelemetryError> {
        if interval.is_zero() {
            return Err(TelemetryError::ZeroInterval);
        }
        for (i, reading) in readings.iter().enumerate() {
            if !reading.is_valid() {
                return Err(TelemetryError::InvalidReading(reading.name.clone()));
            }
            if readings[..i].iter().any(|r| r.name == reading.name) {
                return Err(TelemetryError::DuplicateReading(reading.name.clone()));
            }
        }

        Ok(Self {
            source: source.to_string(),
            interval,
            time_step: interval.as_secs_f64(),
            readings,
            sweep: None,
            rng: StdRng::seed_from_u64(seed),
            time: 0.0,
            ticks: 0,
        })
    }

    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    /// Regenerate a 360° LiDAR sweep on every tick
    pub fn with_sweep(mut self) -> Self {
        self.sweep = Some(Vec::new());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn reading(&self, name: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.name == name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.reading(name).map(Reading::value)
    }

    pub fn sweep(&self) -> &[LidarPoint] {
        self.sweep.as_deref().unwrap_or(&[])
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Advance the clock one step and regenerate every reading
    pub fn tick(&mut self) {
        self.ticks += 1;
        self.time += self.time_step;
        for reading in &mut self.readings {
            reading.update(&mut self.rng, self.time);
        }
        if let Some(sweep) = self.sweep.as_mut() {
            *sweep = lidar_sweep(&mut self.rng);
        }
        tracing::trace!("{} tick {}", self.source, self.ticks);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            source: self.source.clone(),
            tick: self.ticks,
            time: self.time,
            timestamp: Utc::now(),
            readings: self
                .readings
                .iter()
                .map(|r| ReadingSnapshot {
                    name: r.name.clone(),
                    unit: r.unit.clone(),
                    value: r.value(),
                    min: r.min,
                    max: r.max,
                    status: r.status(),
                })
                .collect(),
            lidar: self.sweep().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSnapshot {
    pub name: String,
    pub unit: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReadingStatus>,
}

/// Current values of one simulator, stamped with wall-clock time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub source: String,
    pub tick: u64,
    pub time: f64,
    pub timestamp: DateTime<Utc>,
    pub readings: Vec<ReadingSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lidar: Vec<LidarPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(t: &Telemetry) -> Vec<f64> {
        t.readings().iter().map(Reading::value).collect()
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = sensor_panel(42).unwrap();
        let mut b = sensor_panel(42).unwrap();
        let mut c = sensor_panel(43).unwrap();
        for _ in 0..50 {
            a.tick();
            b.tick();
            c.tick();
        }
        assert_eq!(values(&a), values(&b));
        assert_eq!(a.sweep(), b.sweep());
        assert_ne!(values(&a), values(&c));
    }

    #[test]
    fn test_readings_stay_in_range() {
        let mut presets = vec![
            sensor_panel(1).unwrap(),
            dashboard(2).unwrap(),
            field_robot(3).unwrap(),
        ];
        for telemetry in &mut presets {
            for _ in 0..5_000 {
                telemetry.tick();
                for r in telemetry.readings() {
                    assert!(
                        r.value() >= r.min && r.value() <= r.max,
                        "{} = {} outside [{}, {}]",
                        r.name,
                        r.value(),
                        r.min,
                        r.max
                    );
                }
            }
        }
    }

    #[test]
    fn test_rejects_bad_declarations() {
        let bad = Reading::walk("Broken", "", 10.0, 0.0, 5.0);
        assert_eq!(
            Telemetry::new("t", Duration::from_millis(100), 0, vec![bad]).unwrap_err(),
            TelemetryError::InvalidReading("Broken".into())
        );

        let twice = vec![
            Reading::walk("Wind", "km/h", 0.0, 50.0, 10.0),
            Reading::walk("Wind", "km/h", 0.0, 50.0, 10.0),
        ];
        assert_eq!(
            Telemetry::new("t", Duration::from_millis(100), 0, twice).unwrap_err(),
            TelemetryError::DuplicateReading("Wind".into())
        );

        assert_eq!(
            Telemetry::new("t", Duration::ZERO, 0, vec![]).unwrap_err(),
            TelemetryError::ZeroInterval
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut telemetry = sensor_panel(9).unwrap();
        telemetry.tick();
        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.lidar.len(), 72);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: TelemetrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.readings, snapshot.readings);

        let quiet = dashboard(9).unwrap().snapshot();
        let json = serde_json::to_string(&quiet).unwrap();
        assert!(!json.contains("lidar"));
        assert!(!json.contains("status"));
    }
}
