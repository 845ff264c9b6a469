//! Scene construction
//!
//! A [`Scene`] is immutable once built: the part table, the pickable
//! shapes and the static scenery. Everything that moves (exploded view,
//! robot pose, spinning LiDAR) lives in [`ScenePose`], owned by the
//! viewport.

mod geometry;
mod layout;
mod part;

pub use geometry::*;
pub use layout::*;
pub use part::*;

use glam::{Affine3A, Quat, Vec3};

/// Scene construction failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("shape {shape} references part {part} missing from the part table")]
    UnknownPart { shape: usize, part: PartId },
    #[error("part {0} appears more than once in the part table")]
    DuplicatePart(PartId),
    #[error("shape {shape} has non-positive or non-finite dimensions")]
    InvalidGeometry { shape: usize },
    #[error("scene has no pickable shapes")]
    Empty,
}

/// One renderable primitive tagged with its owning part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub part: PartId,
    pub geometry: Geometry,
    pub transform: Transform,
    pub tint: Option<u32>,
    pub spin: bool,
    pub segments: Option<u32>,
}

/// Immutable scene: parts, shapes and scenery
#[derive(Debug, Clone)]
pub struct Scene {
    layout: Option<Layout>,
    parts: Vec<Part>,
    shapes: Vec<Shape>,
    props: Vec<Prop>,
    background: u32,
}

impl Scene {
    /// Build one of the built-in layouts
    pub fn from_layout(layout: Layout) -> Result<Self, SceneError> {
        SceneBuilder::for_layout(layout).build()
    }

    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    pub fn background(&self) -> u32 {
        self.background
    }

    /// Display color of a shape: its tint, else its part color
    pub fn shape_color(&self, shape: &Shape) -> u32 {
        shape
            .tint
            .or_else(|| self.part(shape.part).map(|p| p.color))
            .unwrap_or(0x808080)
    }

    /// World transform of shape `index` under the given pose
    pub fn shape_world(&self, index: usize, pose: &ScenePose) -> Option<Affine3A> {
        let shape = self.shapes.get(index)?;
        let offset = Vec3::from(shape.part.explode_offset()) * pose.explode.factor();
        let mut rotation = shape.transform.quat();
        if shape.spin {
            rotation = Quat::from_rotation_y(pose.spin_angle) * rotation;
        }
        let local =
            Affine3A::from_rotation_translation(rotation, shape.transform.position + offset);
        Some(pose.root_affine() * local)
    }

    /// Parts that own at least one shape
    pub fn pickable_parts(&self) -> Vec<PartId> {
        let mut ids: Vec<PartId> = self.shapes.iter().map(|s| s.part).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Generic instancer over a declarative shape table
pub struct SceneBuilder {
    layout: Option<Layout>,
    parts: Vec<Part>,
    shapes: Vec<ShapeSpec>,
    props: Vec<Prop>,
    background: u32,
}

impl SceneBuilder {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            layout: None,
            parts,
            shapes: Vec::new(),
            props: Vec::new(),
            background: CAD_BACKGROUND,
        }
    }

    pub fn for_layout(layout: Layout) -> Self {
        let builder = Self {
            layout: Some(layout),
            ..Self::new(robot_parts())
        };
        match layout {
            Layout::CadRobot => builder
                .shapes(cad_robot_shapes())
                .background(CAD_BACKGROUND),
            Layout::FieldRobot => builder
                .shapes(field_robot_shapes())
                .props(field_props())
                .background(FIELD_BACKGROUND),
        }
    }

    pub fn shape(mut self, spec: ShapeSpec) -> Self {
        self.shapes.push(spec);
        self
    }

    pub fn shapes(mut self, specs: impl IntoIterator<Item = ShapeSpec>) -> Self {
        self.shapes.extend(specs);
        self
    }

    pub fn props(mut self, props: impl IntoIterator<Item = Prop>) -> Self {
        self.props.extend(props);
        self
    }

    pub fn background(mut self, color: u32) -> Self {
        self.background = color;
        self
    }

    pub fn build(self) -> Result<Scene, SceneError> {
        for (i, part) in self.parts.iter().enumerate() {
            if self.parts[..i].iter().any(|p| p.id == part.id) {
                return Err(SceneError::DuplicatePart(part.id));
            }
        }
        if self.shapes.is_empty() {
            return Err(SceneError::Empty);
        }

        let mut shapes = Vec::with_capacity(self.shapes.len());
        for (index, spec) in self.shapes.into_iter().enumerate() {
            if !self.parts.iter().any(|p| p.id == spec.part) {
                return Err(SceneError::UnknownPart {
                    shape: index,
                    part: spec.part,
                });
            }
            if !spec.geometry.is_valid() || spec.segments.is_some_and(|n| n < 3) {
                return Err(SceneError::InvalidGeometry { shape: index });
            }
            shapes.push(Shape {
                part: spec.part,
                geometry: spec.geometry,
                transform: spec.transform,
                tint: spec.tint,
                spin: spec.spin,
                segments: spec.segments,
            });
        }

        tracing::debug!(
            "Scene built: {} parts, {} shapes, {} props",
            self.parts.len(),
            shapes.len(),
            self.props.len()
        );

        Ok(Scene {
            layout: self.layout,
            parts: self.parts,
            shapes,
            props: self.props,
            background: self.background,
        })
    }
}

/// Eased exploded-view factor in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Explode {
    target: f32,
    factor: f32,
}

impl Explode {
    /// Fraction of the remaining gap closed per frame
    pub const EASE: f32 = 0.1;
    const SNAP: f32 = 1e-3;

    pub fn set(&mut self, exploded: bool) {
        self.target = if exploded { 1.0 } else { 0.0 };
    }

    pub fn toggle(&mut self) {
        self.set(!self.is_exploded());
    }

    pub fn is_exploded(&self) -> bool {
        self.target > 0.5
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn is_settled(&self) -> bool {
        self.factor == self.target
    }

    /// Advance one frame; returns whether the factor moved
    pub fn step(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }
        self.factor += (self.target - self.factor) * Self::EASE;
        if (self.target - self.factor).abs() < Self::SNAP {
            self.factor = self.target;
        }
        true
    }
}

/// Mutable presentation state applied on top of a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScenePose {
    /// Model position on the ground plane
    pub root_position: Vec3,
    /// Model heading about +Y (radians)
    pub root_yaw: f32,
    pub explode: Explode,
    /// Angle of spinning shapes (radians)
    pub spin_angle: f32,
}

impl ScenePose {
    pub fn root_affine(&self) -> Affine3A {
        Affine3A::from_rotation_translation(Quat::from_rotation_y(self.root_yaw), self.root_position)
    }

    pub fn reset(&mut self) {
        self.root_position = Vec3::ZERO;
        self.root_yaw = 0.0;
        self.spin_angle = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_layouts_build() {
        let cad = Scene::from_layout(Layout::CadRobot).unwrap();
        assert_eq!(cad.shapes().len(), 30);
        assert_eq!(cad.pickable_parts(), PartId::ALL.to_vec());
        assert!(cad.props().is_empty());

        let field = Scene::from_layout(Layout::FieldRobot).unwrap();
        assert_eq!(field.background(), FIELD_BACKGROUND);
        assert_eq!(field.shapes().len(), 7);
    }

    #[test]
    fn test_unknown_part_is_rejected() {
        let parts = vec![Part::new(PartId::Chassis, "Chassis", "", 0x111111)];
        let err = SceneBuilder::new(parts)
            .shape(ShapeSpec::new(
                PartId::Chassis,
                Geometry::cuboid(1.0, 1.0, 1.0),
                Transform::default(),
            ))
            .shape(ShapeSpec::new(
                PartId::Wheels,
                Geometry::Sphere { radius: 1.0 },
                Transform::default(),
            ))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::UnknownPart {
                shape: 1,
                part: PartId::Wheels
            }
        );
    }

    #[test]
    fn test_duplicate_and_invalid() {
        let dup = vec![
            Part::new(PartId::Arm, "a", "", 0),
            Part::new(PartId::Arm, "b", "", 0),
        ];
        assert_eq!(
            SceneBuilder::new(dup).build().unwrap_err(),
            SceneError::DuplicatePart(PartId::Arm)
        );

        let err = SceneBuilder::new(robot_parts())
            .shape(ShapeSpec::new(
                PartId::Arm,
                Geometry::cuboid(1.0, -1.0, 1.0),
                Transform::default(),
            ))
            .build()
            .unwrap_err();
        assert_eq!(err, SceneError::InvalidGeometry { shape: 0 });

        let err = SceneBuilder::new(robot_parts())
            .shape(
                ShapeSpec::new(PartId::Arm, Geometry::cylinder(0.5, 0.5, 1.0), Transform::default())
                    .faceted(2),
            )
            .build()
            .unwrap_err();
        assert_eq!(err, SceneError::InvalidGeometry { shape: 0 });

        assert_eq!(
            SceneBuilder::new(robot_parts()).build().unwrap_err(),
            SceneError::Empty
        );
    }

    #[test]
    fn test_explode_eases_to_target() {
        let mut explode = Explode::default();
        assert!(!explode.step());
        explode.set(true);
        assert!(explode.step());
        assert!((explode.factor() - 0.1).abs() < 1e-6);
        let mut frames = 1;
        while explode.step() {
            frames += 1;
            assert!(frames < 200);
        }
        assert_eq!(explode.factor(), 1.0);
        explode.toggle();
        assert!(!explode.is_exploded());
    }

    #[test]
    fn test_exploded_parts_move_outward() {
        let scene = Scene::from_layout(Layout::CadRobot).unwrap();
        let mut pose = ScenePose::default();
        let solar = scene
            .shapes()
            .iter()
            .position(|s| s.part == PartId::Solar)
            .unwrap();
        let before = scene.shape_world(solar, &pose).unwrap().translation;

        pose.explode.set(true);
        while pose.explode.step() {}
        let after = scene.shape_world(solar, &pose).unwrap().translation;
        let moved = Vec3::from(after) - Vec3::from(before);
        assert!((moved - Vec3::new(0.0, 2.0, -1.0)).length() < 1e-5);

        // Chassis stays put
        let chassis = scene.shape_world(0, &pose).unwrap().translation;
        assert!((Vec3::from(chassis) - Vec3::new(0.0, 0.8, 0.0)).length() < 1e-5);
    }
}
