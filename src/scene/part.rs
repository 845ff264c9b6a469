//! Part identifiers and display metadata

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical component of the robot model.
///
/// Closed set: a shape can only ever be tagged with one of these, so a pick
/// can never resolve to an unknown part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PartId {
    #[serde(rename = "chassis")]
    Chassis,
    #[serde(rename = "wheels")]
    Wheels,
    #[serde(rename = "sensorArray")]
    SensorArray,
    #[serde(rename = "camera")]
    Camera,
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "solar")]
    Solar,
}

impl PartId {
    pub const ALL: [PartId; 6] = [
        PartId::Chassis,
        PartId::Wheels,
        PartId::SensorArray,
        PartId::Camera,
        PartId::Arm,
        PartId::Solar,
    ];

    /// Stable key used by the presentation layer
    pub fn key(self) -> &'static str {
        match self {
            PartId::Chassis => "chassis",
            PartId::Wheels => "wheels",
            PartId::SensorArray => "sensorArray",
            PartId::Camera => "camera",
            PartId::Arm => "arm",
            PartId::Solar => "solar",
        }
    }

    /// Direction a part moves away from the chassis in exploded view.
    pub fn explode_offset(self) -> [f32; 3] {
        match self {
            PartId::Chassis => [0.0, 0.0, 0.0],
            PartId::Wheels => [0.0, -0.5, 0.0],
            PartId::SensorArray => [0.0, 1.5, 0.0],
            PartId::Camera => [1.5, 0.5, 0.0],
            PartId::Arm => [-1.5, 1.0, 0.0],
            PartId::Solar => [0.0, 2.0, -1.0],
        }
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown part identifier: {0:?}")]
pub struct UnknownPartKey(pub String);

impl FromStr for PartId {
    type Err = UnknownPartKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PartId::ALL
            .iter()
            .copied()
            .find(|part| part.key() == s)
            .ok_or_else(|| UnknownPartKey(s.to_string()))
    }
}

/// Display metadata for one part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    /// Human readable name for the detail panel
    pub name: String,
    /// Free-text specification line
    pub specs: String,
    /// Display color (0xRRGGBB)
    pub color: u32,
}

impl Part {
    pub fn new(id: PartId, name: &str, specs: &str, color: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            specs: specs.to_string(),
            color,
        }
    }

    /// Color as sRGB floats in `[0, 1]`
    pub fn rgb(&self) -> [f32; 3] {
        hex_to_rgb(self.color)
    }

    /// `#rrggbb` string for swatches
    pub fn hex(&self) -> String {
        format!("#{:06x}", self.color & 0xFF_FFFF)
    }
}

pub fn hex_to_rgb(color: u32) -> [f32; 3] {
    [
        ((color >> 16) & 0xFF) as f32 / 255.0,
        ((color >> 8) & 0xFF) as f32 / 255.0,
        (color & 0xFF) as f32 / 255.0,
    ]
}

/// Part table shown next to the CAD viewer.
pub fn robot_parts() -> Vec<Part> {
    vec![
        Part::new(
            PartId::Chassis,
            "Main Chassis",
            "6061 Aluminum, 45kg capacity, IP67 rated",
            0x2d3748,
        ),
        Part::new(
            PartId::Wheels,
            "All-Terrain Wheels",
            "4x Independent drive, 30cm diameter, rubber compound",
            0x1a202c,
        ),
        Part::new(
            PartId::SensorArray,
            "Sensor Array",
            "LiDAR + Multispectral + Soil probe mount",
            0x48bb78,
        ),
        Part::new(
            PartId::Camera,
            "Vision System",
            "4K stereo cameras, 120° FOV, IR capable",
            0x4299e1,
        ),
        Part::new(
            PartId::Arm,
            "Manipulator Arm",
            "6-DOF, 5kg payload, precision gripper",
            0xed8936,
        ),
        Part::new(
            PartId::Solar,
            "Solar Panel",
            "200W monocrystalline, self-cleaning coating",
            0x9f7aea,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_parse_back() {
        for part in PartId::ALL {
            assert_eq!(part.key().parse::<PartId>().unwrap(), part);
        }
        assert!("turret".parse::<PartId>().is_err());
    }

    #[test]
    fn test_serde_uses_keys() {
        let json = serde_json::to_string(&PartId::SensorArray).unwrap();
        assert_eq!(json, "\"sensorArray\"");
        let back: PartId = serde_json::from_str("\"solar\"").unwrap();
        assert_eq!(back, PartId::Solar);
    }

    #[test]
    fn test_hex_swatch() {
        let parts = robot_parts();
        assert_eq!(parts.len(), PartId::ALL.len());
        assert_eq!(parts[0].hex(), "#2d3748");
        let rgb = parts[4].rgb();
        assert!((rgb[0] - 0xed as f32 / 255.0).abs() < 1e-6);
    }
}
