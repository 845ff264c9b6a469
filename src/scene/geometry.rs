//! Shape primitives, transforms and exact ray intersection

use glam::{Affine3A, EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

const EPSILON: f32 = 1e-6;

/// Half-line used for picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Re-express the ray in the local frame of a rigid transform.
    pub fn to_local(&self, world_from_local: &Affine3A) -> Ray {
        let local_from_world = world_from_local.inverse();
        Ray {
            origin: local_from_world.transform_point3(self.origin),
            direction: local_from_world
                .transform_vector3(self.direction)
                .normalize_or_zero(),
        }
    }
}

/// Geometry descriptor (kind + dimensions), centered on the local origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Cuboid {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// Truncated cone along local Y
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
    },
    Sphere {
        radius: f32,
    },
    /// Upper half of a sphere, open at the base
    Dome {
        radius: f32,
    },
    /// Double sided rectangle in the local XY plane
    Plane {
        width: f32,
        height: f32,
    },
}

impl Geometry {
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Geometry::Cuboid {
            width,
            height,
            depth,
        }
    }

    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32) -> Self {
        Geometry::Cylinder {
            radius_top,
            radius_bottom,
            height,
        }
    }

    /// Dimensions that must be finite and strictly positive
    pub fn dimensions(&self) -> Vec<f32> {
        match *self {
            Geometry::Cuboid {
                width,
                height,
                depth,
            } => vec![width, height, depth],
            Geometry::Cylinder {
                radius_top,
                radius_bottom,
                height,
            } => vec![radius_top, radius_bottom, height],
            Geometry::Sphere { radius } | Geometry::Dome { radius } => vec![radius],
            Geometry::Plane { width, height } => vec![width, height],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.dimensions().iter().all(|d| d.is_finite() && *d > 0.0)
    }

    /// Radius of a sphere around the local origin enclosing the shape
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Geometry::Cuboid {
                width,
                height,
                depth,
            } => Vec3::new(width, height, depth).length() * 0.5,
            Geometry::Cylinder {
                radius_top,
                radius_bottom,
                height,
            } => {
                let r = radius_top.max(radius_bottom);
                (r * r + height * height * 0.25).sqrt()
            }
            Geometry::Sphere { radius } | Geometry::Dome { radius } => radius,
            Geometry::Plane { width, height } => (width * width + height * height).sqrt() * 0.5,
        }
    }

    /// Nearest non-negative hit distance of a ray given in the local frame.
    pub fn intersect_local(&self, ray: &Ray) -> Option<f32> {
        match *self {
            Geometry::Cuboid {
                width,
                height,
                depth,
            } => intersect_box(ray, Vec3::new(width, height, depth) * 0.5),
            Geometry::Cylinder {
                radius_top,
                radius_bottom,
                height,
            } => intersect_cylinder(ray, radius_top, radius_bottom, height),
            Geometry::Sphere { radius } => {
                sphere_roots(ray, radius).and_then(|(t0, t1)| nearest_valid(&[t0, t1]))
            }
            Geometry::Dome { radius } => sphere_roots(ray, radius).and_then(|(t0, t1)| {
                let upper = |t: f32| ray.at(t).y >= -EPSILON;
                let candidates: Vec<f32> = [t0, t1].into_iter().filter(|t| upper(*t)).collect();
                nearest_valid(&candidates)
            }),
            Geometry::Plane { width, height } => intersect_plane(ray, width * 0.5, height * 0.5),
        }
    }
}

/// Local placement of a shape: translation plus XYZ Euler rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Radians, applied as X then Y then Z (intrinsic)
    pub rotation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        }
    }
}

impl Transform {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            rotation: Vec3::ZERO,
        }
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_rotation_translation(self.quat(), self.position)
    }
}

fn nearest_valid(candidates: &[f32]) -> Option<f32> {
    candidates
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .min_by(|a, b| a.total_cmp(b))
}

fn intersect_box(ray: &Ray, half: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let o = ray.origin[axis];
        let d = ray.direction[axis];
        let h = half[axis];
        if d.abs() < EPSILON {
            // Parallel to this slab pair
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let t1 = (-h - o) / d;
        let t2 = (h - o) / d;
        let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
        t_min = t_min.max(near);
        t_max = t_max.min(far);
        if t_min > t_max {
            return None;
        }
    }

    if t_max < 0.0 {
        None
    } else if t_min >= 0.0 {
        Some(t_min)
    } else {
        // Origin inside the box
        Some(t_max)
    }
}

fn sphere_roots(ray: &Ray, radius: f32) -> Option<(f32, f32)> {
    let b = ray.origin.dot(ray.direction);
    let c = ray.origin.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    Some((-b - sq, -b + sq))
}

fn intersect_cylinder(ray: &Ray, radius_top: f32, radius_bottom: f32, height: f32) -> Option<f32> {
    let half = height * 0.5;
    // r(y) = r0 + k * y over y in [-half, half]
    let k = (radius_top - radius_bottom) / height;
    let r0 = (radius_top + radius_bottom) * 0.5;

    let (o, d) = (ray.origin, ray.direction);
    let ro = r0 + k * o.y;
    let a = d.x * d.x + d.z * d.z - k * k * d.y * d.y;
    let b = 2.0 * (o.x * d.x + o.z * d.z - k * ro * d.y);
    let c = o.x * o.x + o.z * o.z - ro * ro;

    let mut candidates = Vec::with_capacity(4);
    if a.abs() > EPSILON {
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let sq = disc.sqrt();
            candidates.push((-b - sq) / (2.0 * a));
            candidates.push((-b + sq) / (2.0 * a));
        }
    } else if b.abs() > EPSILON {
        candidates.push(-c / b);
    }
    candidates.retain(|t| {
        let p = ray.at(*t);
        p.y.abs() <= half + EPSILON && r0 + k * p.y >= 0.0
    });

    if d.y.abs() > EPSILON {
        for (cap_y, cap_r) in [(half, radius_top), (-half, radius_bottom)] {
            let t = (cap_y - o.y) / d.y;
            let p = ray.at(t);
            if p.x * p.x + p.z * p.z <= cap_r * cap_r {
                candidates.push(t);
            }
        }
    }

    nearest_valid(&candidates)
}

fn intersect_plane(ray: &Ray, half_w: f32, half_h: f32) -> Option<f32> {
    if ray.direction.z.abs() < EPSILON {
        return None;
    }
    let t = -ray.origin.z / ray.direction.z;
    if t < 0.0 {
        return None;
    }
    let p = ray.at(t);
    (p.x.abs() <= half_w && p.y.abs() <= half_h).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn down_from(x: f32, y: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, y, z), Vec3::NEG_Y)
    }

    #[test]
    fn test_box_hit_and_miss() {
        let g = Geometry::cuboid(3.0, 0.6, 2.0);
        let hit = g.intersect_local(&down_from(0.0, 5.0, 0.0)).unwrap();
        assert!((hit - 4.7).abs() < 1e-5);
        assert!(g.intersect_local(&down_from(1.6, 5.0, 0.0)).is_none());
        // Pointing away
        assert!(g
            .intersect_local(&Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Y))
            .is_none());
    }

    #[test]
    fn test_box_from_inside_reports_exit() {
        let g = Geometry::cuboid(2.0, 2.0, 2.0);
        let t = g
            .intersect_local(&Ray::new(Vec3::ZERO, Vec3::X))
            .unwrap();
        assert!((t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cylinder_side_and_caps() {
        let g = Geometry::cylinder(0.4, 0.4, 0.3);
        // Cap from above
        let t = g.intersect_local(&down_from(0.2, 2.0, 0.0)).unwrap();
        assert!((t - 1.85).abs() < 1e-5);
        // Side from +X
        let side = Ray::new(Vec3::new(3.0, 0.0, 0.0), Vec3::NEG_X);
        assert!((g.intersect_local(&side).unwrap() - 2.6).abs() < 1e-5);
        // Outside radius
        assert!(g.intersect_local(&down_from(0.5, 2.0, 0.0)).is_none());
    }

    #[test]
    fn test_tapered_cylinder_uses_local_radius() {
        // Narrow top (0.6), wide bottom (0.8)
        let g = Geometry::cylinder(0.6, 0.8, 0.3);
        let side = Ray::new(Vec3::new(3.0, 0.15 - 1e-4, 0.0), Vec3::NEG_X);
        let t = g.intersect_local(&side).unwrap();
        assert!((3.0 - t - 0.6).abs() < 1e-3);
        let low = Ray::new(Vec3::new(3.0, -0.15 + 1e-4, 0.0), Vec3::NEG_X);
        let t = g.intersect_local(&low).unwrap();
        assert!((3.0 - t - 0.8).abs() < 1e-3);
    }

    #[test]
    fn test_dome_ignores_lower_half() {
        let g = Geometry::Dome { radius: 0.3 };
        assert!(g.intersect_local(&down_from(0.0, 2.0, 0.0)).is_some());
        // Horizontal ray below the equator
        let below = Ray::new(Vec3::new(2.0, -0.1, 0.0), Vec3::NEG_X);
        assert!(g.intersect_local(&below).is_none());
        let sphere = Geometry::Sphere { radius: 0.3 };
        assert!(sphere.intersect_local(&below).is_some());
    }

    #[test]
    fn test_plane_is_double_sided() {
        let g = Geometry::Plane {
            width: 1.0,
            height: 1.0,
        };
        let front = Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::NEG_Z);
        let back = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z);
        assert_eq!(g.intersect_local(&front), Some(2.0));
        assert_eq!(g.intersect_local(&back), Some(2.0));
        let edge = Ray::new(Vec3::new(0.6, 0.0, 2.0), Vec3::NEG_Z);
        assert!(g.intersect_local(&edge).is_none());
    }

    #[test]
    fn test_rotated_transform_moves_ray_into_local_frame() {
        // A wheel: cylinder lying along X after a quarter turn about Z
        let transform = Transform::at(1.0, 0.4, 0.0).rotated(0.0, 0.0, FRAC_PI_2);
        let geometry = Geometry::cylinder(0.4, 0.4, 0.3);
        let ray = Ray::new(Vec3::new(5.0, 0.4, 0.0), Vec3::NEG_X);
        let local = ray.to_local(&transform.to_affine());
        let t = geometry.intersect_local(&local).unwrap();
        // Hits the cap at x = 1.15
        assert!((t - 3.85).abs() < 1e-4);
    }

    #[test]
    fn test_validation_rejects_bad_dimensions() {
        assert!(Geometry::cuboid(1.0, 1.0, 1.0).is_valid());
        assert!(!Geometry::cuboid(1.0, 0.0, 1.0).is_valid());
        assert!(!Geometry::Sphere { radius: f32::NAN }.is_valid());
    }
}
