//! The three simulator instances shown on the site

use super::reading::{Reading, ReadingModel};
use super::{Telemetry, TelemetryError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SENSOR_PANEL_INTERVAL: Duration = Duration::from_millis(100);
pub const DASHBOARD_INTERVAL: Duration = Duration::from_millis(2000);
/// Field robot readings advance once per rendered frame
pub const FIELD_STEP: f64 = 0.02;

/// Named simulator instance, selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryPreset {
    SensorPanel,
    Dashboard,
    FieldRobot,
}

impl TelemetryPreset {
    pub fn build(self, seed: u64) -> Result<Telemetry, TelemetryError> {
        match self {
            TelemetryPreset::SensorPanel => sensor_panel(seed),
            TelemetryPreset::Dashboard => dashboard(seed),
            TelemetryPreset::FieldRobot => field_robot(seed),
        }
    }
}

impl std::str::FromStr for TelemetryPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sensor_panel" | "sensors" => Ok(TelemetryPreset::SensorPanel),
            "dashboard" => Ok(TelemetryPreset::Dashboard),
            "field_robot" | "field" => Ok(TelemetryPreset::FieldRobot),
            other => Err(format!("unknown telemetry preset: {other}")),
        }
    }
}

fn walk(name: &str, unit: &str, min: f64, max: f64, initial: f64, delta: f64) -> Reading {
    Reading::new(name, unit, min, max, initial, ReadingModel::RandomWalk { delta })
}

fn drift(name: &str, unit: &str, min: f64, max: f64, initial: f64, steps: (f64, f64)) -> Reading {
    Reading::new(
        name,
        unit,
        min,
        max,
        initial,
        ReadingModel::Drift {
            min_step: steps.0,
            max_step: steps.1,
        },
    )
}

/// Environmental sensors plus system stats, 100 ms cadence, with a LiDAR sweep
pub fn sensor_panel(seed: u64) -> Result<Telemetry, TelemetryError> {
    let readings = vec![
        Reading::walk("Soil Temperature", "°C", 10.0, 40.0, 22.4).classified(),
        Reading::walk("Soil Moisture", "%", 0.0, 100.0, 45.0).classified(),
        Reading::walk("Wind Speed", "km/h", 0.0, 50.0, 12.3).classified(),
        Reading::walk("Solar Radiation", "W/m²", 0.0, 1000.0, 680.0).classified(),
        Reading::walk("Heading", "°", 0.0, 360.0, 127.0).classified(),
        Reading::walk("Crop Health (NDVI)", "", 0.0, 1.0, 0.72).classified(),
        walk("CPU", "%", 20.0, 80.0, 34.0, 2.5),
        drift("Battery", "%", 0.0, 100.0, 87.0, (-0.05, 0.0)),
        walk("Signal", "%", 60.0, 100.0, 92.0, 1.5),
        walk("GPS Accuracy", "cm", 0.5, 5.0, 2.1, 0.1),
        walk("Speed", "km/h", 0.0, 5.0, 3.2, 0.15),
        drift("Coverage", "ha", 0.0, 10_000.0, 12.4, (0.0, 0.02)),
    ];
    Ok(Telemetry::new("sensor_panel", SENSOR_PANEL_INTERVAL, seed, readings)?.with_sweep())
}

/// Fleet dashboard, 2 s cadence
pub fn dashboard(seed: u64) -> Result<Telemetry, TelemetryError> {
    let readings = vec![
        drift("Battery", "%", 10.0, 100.0, 78.0, (-0.5, 0.0)),
        drift("Area Covered", "ha", 0.0, 10_000.0, 12.5, (0.0, 0.1)),
        walk("Soil Moisture", "%", 0.0, 100.0, 42.0, 1.0).rounded(0),
        walk("Temperature", "°C", -10.0, 50.0, 24.0, 0.25).rounded(1),
        walk("Humidity", "%", 0.0, 100.0, 65.0, 1.5).rounded(0),
        walk("Wind Speed", "km/h", 0.0, 60.0, 8.0, 1.0).rounded(0),
    ];
    Telemetry::new("dashboard", DASHBOARD_INTERVAL, seed, readings)
}

/// Phase readings of the field simulator; the clock advances 0.02 per step
pub fn field_robot(seed: u64) -> Result<Telemetry, TelemetryError> {
    let readings = vec![
        Reading::new(
            "Soil Moisture",
            "%",
            0.0,
            100.0,
            45.0,
            ReadingModel::Phase {
                base: 40.0,
                amplitude: 10.0,
                rate: 1.0,
            },
        )
        .rounded(0),
        Reading::new(
            "Crop Health",
            "%",
            0.0,
            100.0,
            82.0,
            ReadingModel::Phase {
                base: 75.0,
                amplitude: 10.0,
                rate: 0.5,
            },
        )
        .rounded(0),
    ];
    Ok(
        Telemetry::new("field_robot", Duration::from_millis(16), seed, readings)?
            .with_time_step(FIELD_STEP),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::ReadingStatus;

    #[test]
    fn test_preset_cadences() {
        assert_eq!(sensor_panel(0).unwrap().interval(), Duration::from_millis(100));
        assert_eq!(dashboard(0).unwrap().interval(), Duration::from_secs(2));
        assert_eq!(sensor_panel(0).unwrap().readings().len(), 12);
    }

    #[test]
    fn test_preset_names_parse() {
        assert_eq!("sensors".parse::<TelemetryPreset>(), Ok(TelemetryPreset::SensorPanel));
        assert_eq!("dashboard".parse::<TelemetryPreset>(), Ok(TelemetryPreset::Dashboard));
        assert!("weather".parse::<TelemetryPreset>().is_err());
        let built = TelemetryPreset::Dashboard.build(1).unwrap();
        assert_eq!(built.source(), "dashboard");
    }

    #[test]
    fn test_field_phase_values() {
        let mut field = field_robot(0).unwrap();
        assert_eq!(field.value("Crop Health"), Some(82.0));
        for _ in 0..50 {
            field.tick();
        }
        // t = 1.0
        assert!((field.time() - 1.0).abs() < 1e-9);
        assert_eq!(field.value("Soil Moisture"), Some((40.0 + 1f64.sin() * 10.0).round()));
        assert_eq!(field.value("Crop Health"), Some((75.0 + 0.5f64.sin() * 10.0).round()));
    }

    #[test]
    fn test_only_environmental_sensors_are_classified() {
        let panel = sensor_panel(1).unwrap();
        let classified: Vec<&str> = panel
            .readings()
            .iter()
            .filter(|r| r.status().is_some())
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(
            classified,
            [
                "Soil Temperature",
                "Soil Moisture",
                "Wind Speed",
                "Solar Radiation",
                "Heading",
                "Crop Health (NDVI)",
            ]
        );
    }

    #[test]
    fn test_starting_values_raise_no_alarms() {
        let panel = sensor_panel(1).unwrap();
        let dash = dashboard(1).unwrap();
        for reading in panel.readings().iter().chain(dash.readings()) {
            assert!(
                !matches!(
                    reading.status(),
                    Some(ReadingStatus::Warning | ReadingStatus::Critical)
                ),
                "{} = {} is flagged",
                reading.name,
                reading.value()
            );
        }
        assert!(dash.readings().iter().all(|r| r.status().is_none()));
    }

    #[test]
    fn test_dashboard_rounding() {
        let mut dash = dashboard(5).unwrap();
        for _ in 0..20 {
            dash.tick();
            let humidity = dash.value("Humidity").unwrap();
            assert_eq!(humidity, humidity.round());
        }
    }
}
