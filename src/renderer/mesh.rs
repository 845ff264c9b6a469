//! Triangle tessellation of scene primitives
//!
//! Meshes are built once per scene in local space. Every frame the vertices
//! are transformed to world space on the CPU; the scenes are a few thousand
//! triangles at most.

use crate::scene::{hex_to_rgb, Geometry, PartId, Scene, ScenePose};
use glam::{Affine3A, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

const SEGMENTS: u32 = 24;
const RINGS: u32 = 12;

/// Extra brightness added to the selected part
pub const SELECTION_GLOW: f32 = 0.35;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Linear RGB plus emissive amount in `w`
    pub color: [f32; 4],
}

/// Unindexed triangle list with per-vertex normals
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Push a triangle wound counter-clockwise around `facing`
    fn triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, normals: [Vec3; 3], facing: Vec3) {
        if (b - a).cross(c - a).dot(facing) < 0.0 {
            self.positions.extend([a, c, b]);
            self.normals.extend([normals[0], normals[2], normals[1]]);
        } else {
            self.positions.extend([a, b, c]);
            self.normals.extend(normals);
        }
    }

    fn flat_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let n = [normal; 3];
        self.triangle(corners[0], corners[1], corners[2], n, normal);
        self.triangle(corners[0], corners[2], corners[3], n, normal);
    }

    fn append_transformed(&self, world: &Affine3A, color: [f32; 4], out: &mut Vec<Vertex>) {
        for (p, n) in self.positions.iter().zip(&self.normals) {
            out.push(Vertex {
                position: world.transform_point3(*p).to_array(),
                normal: world.transform_vector3(*n).normalize_or_zero().to_array(),
                color,
            });
        }
    }
}

pub fn tessellate(geometry: &Geometry) -> Mesh {
    tessellate_with(geometry, SEGMENTS)
}

/// Tessellate with `segments` facets around round geometry
pub fn tessellate_with(geometry: &Geometry, segments: u32) -> Mesh {
    let segments = segments.max(3);
    let mut mesh = Mesh::default();
    match *geometry {
        Geometry::Cuboid {
            width,
            height,
            depth,
        } => cuboid(&mut mesh, Vec3::new(width, height, depth) * 0.5),
        Geometry::Cylinder {
            radius_top,
            radius_bottom,
            height,
        } => cylinder(&mut mesh, radius_top, radius_bottom, height, segments),
        Geometry::Sphere { radius } => sphere(&mut mesh, radius, PI, segments),
        Geometry::Dome { radius } => sphere(&mut mesh, radius, FRAC_PI_2, segments),
        Geometry::Plane { width, height } => {
            let (hx, hy) = (width * 0.5, height * 0.5);
            let corners = [
                Vec3::new(-hx, -hy, 0.0),
                Vec3::new(hx, -hy, 0.0),
                Vec3::new(hx, hy, 0.0),
                Vec3::new(-hx, hy, 0.0),
            ];
            mesh.flat_quad(corners, Vec3::Z);
            mesh.flat_quad(corners, Vec3::NEG_Z);
        }
    }
    mesh
}

fn cuboid(mesh: &mut Mesh, h: Vec3) {
    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
        for sign in [1.0, -1.0] {
            let normal = axis * sign;
            // Two in-plane axes
            let u = if axis == Vec3::Y { Vec3::Z } else { Vec3::Y };
            let v = axis.cross(u);
            let center = normal * h;
            let (u, v) = (u * h, v * h);
            mesh.flat_quad(
                [
                    center - u - v,
                    center + u - v,
                    center + u + v,
                    center - u + v,
                ],
                normal,
            );
        }
    }
}

fn cylinder(mesh: &mut Mesh, radius_top: f32, radius_bottom: f32, height: f32, segments: u32) {
    let half = height * 0.5;
    let slope = (radius_bottom - radius_top) / height;
    for i in 0..segments {
        let a0 = i as f32 / segments as f32 * TAU;
        let a1 = (i + 1) as f32 / segments as f32 * TAU;
        let dir = |a: f32| Vec3::new(a.cos(), 0.0, a.sin());
        let (d0, d1) = (dir(a0), dir(a1));

        let top0 = d0 * radius_top + Vec3::Y * half;
        let top1 = d1 * radius_top + Vec3::Y * half;
        let bot0 = d0 * radius_bottom - Vec3::Y * half;
        let bot1 = d1 * radius_bottom - Vec3::Y * half;
        let n0 = (d0 + Vec3::Y * slope).normalize();
        let n1 = (d1 + Vec3::Y * slope).normalize();
        let facing = dir((a0 + a1) * 0.5);

        mesh.triangle(bot0, bot1, top1, [n0, n1, n1], facing);
        mesh.triangle(bot0, top1, top0, [n0, n1, n0], facing);

        let top_center = Vec3::Y * half;
        mesh.triangle(top_center, top0, top1, [Vec3::Y; 3], Vec3::Y);
        let bottom_center = -top_center;
        mesh.triangle(bottom_center, bot0, bot1, [Vec3::NEG_Y; 3], Vec3::NEG_Y);
    }
}

/// Sphere cap from the north pole down to polar angle `extent`
fn sphere(mesh: &mut Mesh, radius: f32, extent: f32, segments: u32) {
    let rings = if extent < PI { RINGS / 2 } else { RINGS };
    let point = |ring: u32, seg: u32| {
        let theta = ring as f32 / rings as f32 * extent;
        let phi = seg as f32 / segments as f32 * TAU;
        Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin())
    };
    for ring in 0..rings {
        for seg in 0..segments {
            let n00 = point(ring, seg);
            let n01 = point(ring, seg + 1);
            let n10 = point(ring + 1, seg);
            let n11 = point(ring + 1, seg + 1);
            let facing = (n00 + n01 + n10 + n11).normalize_or_zero();
            if ring > 0 {
                mesh.triangle(n00 * radius, n01 * radius, n11 * radius, [n00, n01, n11], facing);
            }
            mesh.triangle(n00 * radius, n11 * radius, n10 * radius, [n00, n11, n10], facing);
        }
    }
}

/// Approximate sRGB to linear conversion for GPU colors
pub fn srgb_to_linear(color: u32) -> [f32; 3] {
    hex_to_rgb(color).map(|c| c.powf(2.2))
}

/// Local meshes for every shape and prop of one scene
pub struct SceneMeshes {
    shapes: Vec<Mesh>,
    props: Vec<Mesh>,
}

impl SceneMeshes {
    pub fn build(scene: &Scene) -> Self {
        let shapes = scene
            .shapes()
            .iter()
            .map(|s| tessellate_with(&s.geometry, s.segments.unwrap_or(SEGMENTS)))
            .collect();
        let props = scene.props().iter().map(|p| tessellate(&p.geometry)).collect();
        Self { shapes, props }
    }

    /// Whether these meshes were built for `scene`
    pub fn matches(&self, scene: &Scene) -> bool {
        self.shapes.len() == scene.shapes().len() && self.props.len() == scene.props().len()
    }

    /// World-space vertices for the current pose
    pub fn write_vertices(
        &self,
        scene: &Scene,
        pose: &ScenePose,
        selection: Option<PartId>,
        out: &mut Vec<Vertex>,
    ) {
        out.clear();
        for (prop, mesh) in scene.props().iter().zip(&self.props) {
            let [r, g, b] = srgb_to_linear(prop.color);
            mesh.append_transformed(&prop.transform.to_affine(), [r, g, b, 0.0], out);
        }
        for (index, (shape, mesh)) in scene.shapes().iter().zip(&self.shapes).enumerate() {
            let Some(world) = scene.shape_world(index, pose) else {
                continue;
            };
            let [r, g, b] = srgb_to_linear(scene.shape_color(shape));
            let glow = if selection == Some(shape.part) {
                SELECTION_GLOW
            } else {
                0.0
            };
            mesh.append_transformed(&world, [r, g, b, glow], out);
        }
    }
}
