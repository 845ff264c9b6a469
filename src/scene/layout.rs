//! Declarative shape tables for the two robot models
//!
//! Each table is a flat list of `(part, geometry, transform)` rows that the
//! generic [`SceneBuilder`](super::SceneBuilder) instances. Keeping the
//! layout as data lets tests inspect it without a GPU.

use super::geometry::{Geometry, Transform};
use super::part::PartId;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

/// Which hard-coded model a viewport shows
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Exploded-view CAD model with clickable parts
    #[default]
    CadRobot,
    /// Simplified robot driving around a crop field
    FieldRobot,
}

/// One row of a layout table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSpec {
    pub part: PartId,
    pub geometry: Geometry,
    pub transform: Transform,
    /// Overrides the part color (lenses, solar cells...)
    pub tint: Option<u32>,
    /// Spins about local Y with the simulation clock
    pub spin: bool,
    /// Facet count around round geometry; the renderer default when `None`
    pub segments: Option<u32>,
}

impl ShapeSpec {
    pub fn new(part: PartId, geometry: Geometry, transform: Transform) -> Self {
        Self {
            part,
            geometry,
            transform,
            tint: None,
            spin: false,
            segments: None,
        }
    }

    pub fn tinted(mut self, color: u32) -> Self {
        self.tint = Some(color);
        self
    }

    pub fn spinning(mut self) -> Self {
        self.spin = true;
        self
    }

    pub fn faceted(mut self, segments: u32) -> Self {
        self.segments = Some(segments);
        self
    }
}

/// Non-pickable scenery (ground, crop rows)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prop {
    pub geometry: Geometry,
    pub transform: Transform,
    pub color: u32,
}

pub const CAD_BACKGROUND: u32 = 0x0f172a;
pub const FIELD_BACKGROUND: u32 = 0x1a2f1a;

const WHEEL: Geometry = Geometry::Cylinder {
    radius_top: 0.4,
    radius_bottom: 0.4,
    height: 0.3,
};

pub fn cad_robot_shapes() -> Vec<ShapeSpec> {
    let mut rows = vec![ShapeSpec::new(
        PartId::Chassis,
        Geometry::cuboid(3.0, 0.6, 2.0),
        Transform::at(0.0, 0.8, 0.0),
    )];

    for (x, y, z) in [
        (-1.2, 0.4, 1.2),
        (1.2, 0.4, 1.2),
        (-1.2, 0.4, -1.2),
        (1.2, 0.4, -1.2),
    ] {
        rows.push(ShapeSpec::new(
            PartId::Wheels,
            WHEEL,
            Transform::at(x, y, z).rotated(0.0, 0.0, FRAC_PI_2),
        ));
    }

    rows.push(
        ShapeSpec::new(
            PartId::SensorArray,
            Geometry::cylinder(0.6, 0.8, 0.3),
            Transform::at(0.0, 1.4, 0.0),
        )
        .faceted(8),
    );
    rows.push(
        ShapeSpec::new(
            PartId::SensorArray,
            Geometry::Dome { radius: 0.3 },
            Transform::at(0.0, 1.55, 0.0),
        )
        .tinted(0x38a169),
    );

    rows.push(ShapeSpec::new(
        PartId::Camera,
        Geometry::cuboid(0.8, 0.4, 0.3),
        Transform::at(1.2, 1.3, 0.0),
    ));
    for offset in [-0.15, 0.15] {
        rows.push(
            ShapeSpec::new(
                PartId::Camera,
                Geometry::cylinder(0.08, 0.1, 0.15),
                Transform::at(1.55, 1.3, offset).rotated(0.0, 0.0, FRAC_PI_2),
            )
            .tinted(0x1a365d),
        );
    }

    rows.push(ShapeSpec::new(
        PartId::Arm,
        Geometry::cylinder(0.25, 0.3, 0.3),
        Transform::at(-0.8, 1.25, 0.0),
    ));
    rows.push(ShapeSpec::new(
        PartId::Arm,
        Geometry::cuboid(0.15, 0.8, 0.15),
        Transform::at(-0.8, 1.8, 0.0),
    ));
    rows.push(ShapeSpec::new(
        PartId::Arm,
        Geometry::Sphere { radius: 0.12 },
        Transform::at(-0.8, 2.2, 0.0),
    ));
    rows.push(ShapeSpec::new(
        PartId::Arm,
        Geometry::cuboid(0.12, 0.6, 0.12),
        Transform::at(-0.5, 2.4, 0.0).rotated(0.0, 0.0, FRAC_PI_4),
    ));

    rows.push(ShapeSpec::new(
        PartId::Solar,
        Geometry::cuboid(1.5, 0.05, 1.0),
        Transform::at(0.0, 1.15, -0.3).rotated(-0.2, 0.0, 0.0),
    ));
    // 5 x 3 grid of cells over the panel
    for xi in 0..5 {
        for zi in 0..3 {
            let x = -0.5 + xi as f32 * 0.25;
            let z = -0.3 + zi as f32 * 0.25;
            rows.push(
                ShapeSpec::new(
                    PartId::Solar,
                    Geometry::Plane {
                        width: 0.2,
                        height: 0.2,
                    },
                    Transform::at(x, 1.18, z - 0.3).rotated(-FRAC_PI_2 - 0.2, 0.0, 0.0),
                )
                .tinted(0x2d3748),
            );
        }
    }

    rows
}

pub fn field_robot_shapes() -> Vec<ShapeSpec> {
    let mut rows = vec![
        ShapeSpec::new(
            PartId::Chassis,
            Geometry::cuboid(2.0, 0.8, 3.0),
            Transform::at(0.0, 0.8, 0.0),
        )
        .tinted(0x22c55e),
        ShapeSpec::new(
            PartId::SensorArray,
            Geometry::Sphere { radius: 0.4 },
            Transform::at(0.0, 1.4, 0.0),
        )
        .tinted(0x60a5fa),
        ShapeSpec::new(
            PartId::SensorArray,
            Geometry::cylinder(0.2, 0.2, 0.3),
            Transform::at(0.0, 1.7, 0.0),
        )
        .tinted(0xfbbf24)
        .spinning(),
    ];

    for (x, z) in [(-1.0, 1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)] {
        rows.push(
            ShapeSpec::new(
                PartId::Wheels,
                WHEEL,
                Transform::at(x, 0.4, z).rotated(0.0, 0.0, FRAC_PI_2),
            )
            .tinted(0x1f2937),
        );
    }

    rows
}

pub fn field_props() -> Vec<Prop> {
    let mut props = vec![Prop {
        geometry: Geometry::Plane {
            width: 30.0,
            height: 30.0,
        },
        transform: Transform::default().rotated(-FRAC_PI_2, 0.0, 0.0),
        color: 0x2d4a2d,
    }];
    for i in (-12..=12).step_by(2) {
        props.push(Prop {
            geometry: Geometry::cuboid(0.3, 0.5, 25.0),
            transform: Transform::at(i as f32, 0.25, 0.0),
            color: 0x3d6b3d,
        });
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cad_table_counts() {
        let rows = cad_robot_shapes();
        let count = |part| rows.iter().filter(|r| r.part == part).count();
        assert_eq!(count(PartId::Chassis), 1);
        assert_eq!(count(PartId::Wheels), 4);
        assert_eq!(count(PartId::SensorArray), 2);
        assert_eq!(count(PartId::Camera), 3);
        assert_eq!(count(PartId::Arm), 4);
        assert_eq!(count(PartId::Solar), 16);
        assert!(rows.iter().all(|r| r.geometry.is_valid()));
    }

    #[test]
    fn test_field_table_has_single_spinner() {
        let rows = field_robot_shapes();
        assert_eq!(rows.iter().filter(|r| r.spin).count(), 1);
        assert_eq!(field_props().len(), 14);
    }
}
