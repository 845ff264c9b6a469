//! Orbit camera

use crate::scene::Ray;
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Clamp ranges for orbit pitch and camera distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitLimits {
    /// Pitch is kept in `[-pitch_max, pitch_max]` (radians)
    pub pitch_max: f32,
    pub distance_min: f32,
    pub distance_max: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            pitch_max: 0.5,
            distance_min: 5.0,
            distance_max: 20.0,
        }
    }
}

impl OrbitLimits {
    /// High overhead view used by the field simulator
    pub fn field() -> Self {
        Self {
            pitch_max: 1.2,
            distance_min: 5.0,
            distance_max: 30.0,
        }
    }

    pub fn clamp_pitch(&self, pitch: f32) -> f32 {
        pitch.clamp(-self.pitch_max, self.pitch_max)
    }

    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.distance_min, self.distance_max)
    }
}

/// Orbit parameters around a look-at point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitPose {
    pub target: Vec3,
    /// Angle about +Y measured from +Z toward +X
    pub yaw: f32,
    /// Elevation above the XZ plane
    pub pitch: f32,
    pub distance: f32,
}

impl OrbitPose {
    pub fn from_eye(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(1e-4);
        Self {
            target,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }
}

/// Perspective camera orbiting a target
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pose: OrbitPose,
    home: OrbitPose,
    /// Vertical field of view (radians)
    pub fov_y: f32,
    aspect: f32,
    pub near: f32,
    pub far: f32,
    limits: OrbitLimits,
}

impl OrbitCamera {
    pub fn new(pose: OrbitPose, fov_y: f32, near: f32, far: f32, limits: OrbitLimits) -> Self {
        let pose = OrbitPose {
            pitch: limits.clamp_pitch(pose.pitch),
            distance: limits.clamp_distance(pose.distance),
            ..pose
        };
        Self {
            pose,
            home: pose,
            fov_y,
            aspect: 1.0,
            near,
            far,
            limits,
        }
    }

    /// CAD viewer start: eye (8, 6, 8), 50° FOV
    pub fn cad_viewer() -> Self {
        Self::new(
            OrbitPose::from_eye(Vec3::new(8.0, 6.0, 8.0), Vec3::ZERO),
            50f32.to_radians(),
            0.1,
            1000.0,
            OrbitLimits::default(),
        )
    }

    /// Field simulator start: eye (10, 15, 10), 60° FOV
    pub fn field_view() -> Self {
        Self::new(
            OrbitPose::from_eye(Vec3::new(10.0, 15.0, 10.0), Vec3::ZERO),
            60f32.to_radians(),
            0.1,
            100.0,
            OrbitLimits::field(),
        )
    }

    pub fn with_limits(mut self, limits: OrbitLimits) -> Self {
        self.limits = limits;
        self.pose.pitch = limits.clamp_pitch(self.pose.pitch);
        self.pose.distance = limits.clamp_distance(self.pose.distance);
        self.home = self.pose;
        self
    }

    pub fn pose(&self) -> &OrbitPose {
        &self.pose
    }

    pub fn limits(&self) -> &OrbitLimits {
        &self.limits
    }

    pub fn yaw(&self) -> f32 {
        self.pose.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pose.pitch
    }

    pub fn distance(&self) -> f32 {
        self.pose.distance
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn eye(&self) -> Vec3 {
        self.pose.eye()
    }

    /// Set the distance directly (still clamped)
    pub fn set_distance(&mut self, distance: f32) {
        self.pose.distance = self.limits.clamp_distance(distance);
    }

    /// Returns false (and keeps the old projection) for a degenerate aspect.
    pub fn set_aspect(&mut self, aspect: f32) -> bool {
        if !aspect.is_finite() || aspect <= 0.0 {
            return false;
        }
        self.aspect = aspect;
        true
    }

    /// Rotate around the target; pitch is clamped after the update.
    pub fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32) {
        if yaw_delta.is_finite() {
            self.pose.yaw = (self.pose.yaw + yaw_delta + PI).rem_euclid(TAU) - PI;
        }
        if pitch_delta.is_finite() {
            self.pose.pitch = self.limits.clamp_pitch(self.pose.pitch + pitch_delta);
        }
    }

    /// Multiply the distance by `factor`, clamped to the limits.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.set_distance(self.pose.distance * factor);
        }
    }

    /// Back to the starting pose
    pub fn reset(&mut self) {
        self.pose = self.home;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.pose.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Ray from the eye through a point in normalized device coordinates
    pub fn ray_through_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let eye = self.eye();
        Ray::new(eye, far - eye)
    }

    /// World point to NDC; `None` when behind the camera
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_eye_roundtrips_position() {
        let camera = OrbitCamera::cad_viewer();
        assert!((camera.eye() - Vec3::new(8.0, 6.0, 8.0)).length() < 1e-4);
        assert!(camera.pitch() <= 0.5);
        assert!((camera.distance() - 164f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_pitch_and_distance_clamped() {
        let mut camera = OrbitCamera::cad_viewer();
        camera.orbit(0.0, 10.0);
        assert_eq!(camera.pitch(), 0.5);
        camera.orbit(0.0, -10.0);
        assert_eq!(camera.pitch(), -0.5);
        camera.zoom(100.0);
        assert_eq!(camera.distance(), 20.0);
        camera.zoom(0.001);
        assert_eq!(camera.distance(), 5.0);
    }

    #[test]
    fn test_yaw_wraps() {
        let mut camera = OrbitCamera::cad_viewer();
        camera.orbit(50.0, 0.0);
        assert!(camera.yaw() >= -PI && camera.yaw() < PI);
    }

    #[test]
    fn test_degenerate_aspect_is_ignored() {
        let mut camera = OrbitCamera::cad_viewer();
        assert!(camera.set_aspect(2.0));
        assert!(!camera.set_aspect(0.0));
        assert!(!camera.set_aspect(f32::NAN));
        assert_eq!(camera.aspect(), 2.0);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = OrbitCamera::cad_viewer();
        let ray = camera.ray_through_ndc(Vec2::ZERO);
        let expected = (Vec3::ZERO - camera.eye()).normalize();
        assert!((ray.direction - expected).length() < 1e-4);
    }

    #[test]
    fn test_project_then_ray_passes_through_point() {
        let mut camera = OrbitCamera::cad_viewer();
        camera.set_aspect(16.0 / 9.0);
        let point = Vec3::new(0.5, 1.0, -0.3);
        let ndc = camera.project(point).unwrap();
        let ray = camera.ray_through_ndc(ndc.truncate());
        let to_point = (point - ray.origin).normalize();
        assert!((to_point - ray.direction).length() < 1e-3);
    }

    #[test]
    fn test_reset_restores_home() {
        let mut camera = OrbitCamera::cad_viewer();
        let home = *camera.pose();
        camera.orbit(1.0, 0.3);
        camera.zoom(0.5);
        camera.reset();
        assert_eq!(*camera.pose(), home);
    }
}
