//! Click-to-select raycasting
//!
//! Pointer coordinates are converted to NDC against the surface rectangle
//! passed in at call time, a ray is cast from the camera, and the nearest
//! shape hit resolves to its owning [`PartId`].

use crate::camera::OrbitCamera;
use crate::scene::{PartId, Ray, Scene, ScenePose};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Bounds of the render surface in the pointer's coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rect anchored at the origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left
            && point.y >= self.top
            && point.x <= self.left + self.width
            && point.y <= self.top + self.height
    }

    /// Inverse of [`pointer_to_ndc`]
    pub fn ndc_to_pointer(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            self.left + (ndc.x + 1.0) * 0.5 * self.width,
            self.top + (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

/// Pointer position to normalized device coordinates (+Y up).
///
/// `None` when the rect has no area.
pub fn pointer_to_ndc(pointer: Vec2, rect: &SurfaceRect) -> Option<Vec2> {
    if rect.is_degenerate() || !pointer.is_finite() {
        return None;
    }
    Some(Vec2::new(
        (pointer.x - rect.left) / rect.width * 2.0 - 1.0,
        -((pointer.y - rect.top) / rect.height) * 2.0 + 1.0,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub part: PartId,
    /// Index into [`Scene::shapes`]
    pub shape: usize,
    /// Distance along the ray in world units
    pub distance: f32,
}

/// Nearest shape under the pointer
pub fn pick(
    pointer: Vec2,
    rect: &SurfaceRect,
    camera: &OrbitCamera,
    scene: &Scene,
    pose: &ScenePose,
) -> Option<PickHit> {
    let ndc = pointer_to_ndc(pointer, rect)?;
    pick_ray(&camera.ray_through_ndc(ndc), scene, pose)
}

/// Nearest shape along an arbitrary world-space ray. Ties keep the
/// earlier shape.
pub fn pick_ray(ray: &Ray, scene: &Scene, pose: &ScenePose) -> Option<PickHit> {
    if ray.direction == Vec3::ZERO {
        return None;
    }

    let mut best: Option<PickHit> = None;
    for (index, shape) in scene.shapes().iter().enumerate() {
        let Some(world) = scene.shape_world(index, pose) else {
            continue;
        };

        // Bounding sphere early-out
        let center = Vec3::from(world.translation);
        let radius = shape.geometry.bounding_radius();
        let to_center = center - ray.origin;
        let along = to_center.dot(ray.direction);
        if to_center.length_squared() - along * along > radius * radius {
            continue;
        }

        let local_ray = ray.to_local(&world);
        let Some(t) = shape.geometry.intersect_local(&local_ray) else {
            continue;
        };
        let distance = (world.transform_point3(local_ray.at(t)) - ray.origin).length();

        let closer = best.map_or(true, |b| distance < b.distance);
        if closer {
            best = Some(PickHit {
                part: shape.part,
                shape: index,
                distance,
            });
        }
    }
    best
}

/// At most one selected part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    current: Option<PartId>,
}

impl Selection {
    pub fn get(&self) -> Option<PartId> {
        self.current
    }

    pub fn is_selected(&self, part: PartId) -> bool {
        self.current == Some(part)
    }

    /// Replace the selection with a pick result; a miss clears it.
    /// Returns whether the selection changed.
    pub fn apply_pick(&mut self, part: Option<PartId>) -> bool {
        let changed = self.current != part;
        self.current = part;
        if changed {
            tracing::debug!("Selection: {:?}", part.map(PartId::key));
        }
        changed
    }

    /// Parts list click: selecting the selected part clears it.
    pub fn toggle(&mut self, part: PartId) {
        let next = if self.is_selected(part) {
            None
        } else {
            Some(part)
        };
        self.apply_pick(next);
    }

    pub fn clear(&mut self) {
        self.apply_pick(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Geometry, Layout, Part, SceneBuilder, ShapeSpec, Transform};
    use std::f32::consts::FRAC_PI_2;

    fn chassis_and_wheels() -> Scene {
        let parts = vec![
            Part::new(PartId::Chassis, "Main Chassis", "", 0x2d3748),
            Part::new(PartId::Wheels, "Wheels", "", 0x1a202c),
        ];
        let mut builder = SceneBuilder::new(parts).shape(ShapeSpec::new(
            PartId::Chassis,
            Geometry::cuboid(3.0, 0.6, 2.0),
            Transform::at(0.0, 0.8, 0.0),
        ));
        for (x, z) in [(-1.2, 1.2), (1.2, 1.2), (-1.2, -1.2), (1.2, -1.2)] {
            builder = builder.shape(ShapeSpec::new(
                PartId::Wheels,
                Geometry::cylinder(0.4, 0.4, 0.3),
                Transform::at(x, 0.4, z).rotated(0.0, 0.0, FRAC_PI_2),
            ));
        }
        builder.build().unwrap()
    }

    fn camera_for(rect: &SurfaceRect) -> OrbitCamera {
        let mut camera = OrbitCamera::cad_viewer();
        camera.set_aspect(rect.width / rect.height);
        camera
    }

    #[test]
    fn test_ndc_mapping() {
        let rect = SurfaceRect::new(100.0, 50.0, 800.0, 600.0);
        let ndc = pointer_to_ndc(Vec2::new(500.0, 350.0), &rect).unwrap();
        assert!(ndc.length() < 1e-6);
        let corner = pointer_to_ndc(Vec2::new(100.0, 50.0), &rect).unwrap();
        assert_eq!(corner, Vec2::new(-1.0, 1.0));
        assert_eq!(rect.ndc_to_pointer(corner), Vec2::new(100.0, 50.0));
        assert!(pointer_to_ndc(Vec2::ZERO, &SurfaceRect::from_size(0.0, 600.0)).is_none());
    }

    #[test]
    fn test_click_chassis_then_empty_space() {
        let scene = chassis_and_wheels();
        let pose = ScenePose::default();
        let rect = SurfaceRect::new(100.0, 50.0, 800.0, 600.0);
        let camera = camera_for(&rect);
        let mut selection = Selection::default();

        let ndc = camera.project(Vec3::new(0.0, 0.8, 0.0)).unwrap();
        let pointer = rect.ndc_to_pointer(ndc.truncate());
        let hit = pick(pointer, &rect, &camera, &scene, &pose);
        selection.apply_pick(hit.map(|h| h.part));
        assert_eq!(selection.get(), Some(PartId::Chassis));

        let hit = pick(Vec2::new(101.0, 51.0), &rect, &camera, &scene, &pose);
        selection.apply_pick(hit.map(|h| h.part));
        assert_eq!(selection.get(), None);
    }

    #[test]
    fn test_rect_is_read_at_call_time() {
        let scene = chassis_and_wheels();
        let pose = ScenePose::default();
        let rect = SurfaceRect::from_size(800.0, 600.0);
        let camera = camera_for(&rect);
        let ndc = camera.project(Vec3::new(0.0, 0.8, 0.0)).unwrap();
        let pointer = rect.ndc_to_pointer(ndc.truncate());
        assert!(pick(pointer, &rect, &camera, &scene, &pose).is_some());

        // Same pointer after the surface scrolled far away
        let scrolled = SurfaceRect::new(0.0, -5000.0, 800.0, 600.0);
        assert!(pick(pointer, &scrolled, &camera, &scene, &pose).is_none());
    }

    #[test]
    fn test_nearest_hit_wins() {
        let scene = Scene::from_layout(Layout::CadRobot).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y);
        let hit = pick_ray(&ray, &scene, &ScenePose::default()).unwrap();
        assert_eq!(hit.part, PartId::SensorArray);
        assert!((hit.distance - (10.0 - 1.85)).abs() < 1e-4);
    }

    #[test]
    fn test_exploded_parts_are_picked_where_drawn() {
        let scene = Scene::from_layout(Layout::CadRobot).unwrap();
        let mut pose = ScenePose::default();
        let ray = Ray::new(Vec3::new(2.7, 10.0, 0.0), Vec3::NEG_Y);
        assert!(pick_ray(&ray, &scene, &pose).is_none());

        pose.explode.set(true);
        while pose.explode.step() {}
        let hit = pick_ray(&ray, &scene, &pose).unwrap();
        assert_eq!(hit.part, PartId::Camera);
    }

    #[test]
    fn test_selection_toggle() {
        let mut selection = Selection::default();
        selection.toggle(PartId::Arm);
        assert!(selection.is_selected(PartId::Arm));
        selection.toggle(PartId::Solar);
        assert_eq!(selection.get(), Some(PartId::Solar));
        selection.toggle(PartId::Solar);
        assert_eq!(selection.get(), None);
        selection.apply_pick(Some(PartId::Camera));
        selection.clear();
        assert_eq!(selection.get(), None);
    }
}
