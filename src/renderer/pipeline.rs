//! Lit mesh pipeline with a depth buffer

use super::mesh::{srgb_to_linear, Vertex};
use glam::{Mat4, Vec3};
use wgpu::*;

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Key light position; the light shines toward the origin
pub const KEY_LIGHT: Vec3 = Vec3::new(10.0, 15.0, 10.0);
pub const KEY_INTENSITY: f32 = 0.8;
pub const FILL_LIGHT: Vec3 = Vec3::new(-5.0, 5.0, -5.0);
pub const FILL_COLOR: u32 = 0x48bb78;
pub const FILL_INTENSITY: f32 = 0.3;
pub const AMBIENT: f32 = 0.4;

/// Scene uniforms
/// WGSL uniform layout: mat4 then four vec4, 128 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    view_proj: [[f32; 4]; 4], // offset 0
    key_light: [f32; 4],      // offset 64, xyz toward light, w intensity
    fill_light: [f32; 4],     // offset 80
    fill_color: [f32; 4],     // offset 96
    ambient: [f32; 4],        // offset 112
}

impl SceneUniforms {
    pub fn new(view_proj: Mat4) -> Self {
        let [fr, fg, fb] = srgb_to_linear(FILL_COLOR);
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            key_light: KEY_LIGHT.normalize().extend(KEY_INTENSITY).to_array(),
            fill_light: FILL_LIGHT.normalize().extend(FILL_INTENSITY).to_array(),
            fill_color: [fr, fg, fb, 1.0],
            ambient: [AMBIENT, AMBIENT, AMBIENT, 1.0],
        }
    }
}

pub struct ScenePipeline {
    render_pipeline: RenderPipeline,
    uniform_buffer: Buffer,
    bind_group: BindGroup,
    vertex_buffer: Buffer,
    vertex_capacity: usize,
    vertex_count: u32,
}

impl ScenePipeline {
    const INITIAL_VERTICES: usize = 16 * 1024;

    pub fn new(device: &Device, format: TextureFormat) -> Self {
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: ShaderSource::Wgsl(include_str!("../shaders/scene.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &bind_group_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Scene Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
                    step_mode: VertexStepMode::Vertex,
                    attributes: &vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4],
                }],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(ColorTargetState {
                    format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: Some(Face::Back),
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState::default(),
            multiview: None,
        });

        let vertex_buffer = Self::vertex_buffer(device, Self::INITIAL_VERTICES);

        Self {
            render_pipeline,
            uniform_buffer,
            bind_group,
            vertex_buffer,
            vertex_capacity: Self::INITIAL_VERTICES,
            vertex_count: 0,
        }
    }

    fn vertex_buffer(device: &Device, capacity: usize) -> Buffer {
        device.create_buffer(&BufferDescriptor {
            label: Some("Scene Vertex Buffer"),
            size: (capacity * std::mem::size_of::<Vertex>()) as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Upload camera uniforms and this frame's world-space vertices
    pub fn update(&mut self, device: &Device, queue: &Queue, view_proj: Mat4, vertices: &[Vertex]) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[SceneUniforms::new(view_proj)]),
        );

        if vertices.len() > self.vertex_capacity {
            self.vertex_capacity = vertices.len().next_power_of_two();
            self.vertex_buffer = Self::vertex_buffer(device, self.vertex_capacity);
            tracing::debug!("Grew scene vertex buffer to {} vertices", self.vertex_capacity);
        }
        if !vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }
        self.vertex_count = vertices.len() as u32;
    }

    pub fn render<'a>(&'a self, render_pass: &mut RenderPass<'a>) {
        if self.vertex_count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

/// Depth attachment sized to the surface
pub fn create_depth_view(device: &Device, width: u32, height: u32) -> TextureView {
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("Depth Texture"),
        size: Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&TextureViewDescriptor::default())
}
