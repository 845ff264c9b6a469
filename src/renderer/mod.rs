//! wgpu render surface for a winit window

mod mesh;
mod pipeline;

pub use mesh::*;
pub use pipeline::*;

use crate::ui::Overlay;
use crate::viewport::{Frame, RenderSurface, SurfaceProvider, SurfaceSize, ViewportError, ViewportEvent};
use std::sync::Arc;
use wgpu::*;
use winit::{dpi::PhysicalSize, event::WindowEvent, window::Window};

impl From<PhysicalSize<u32>> for SurfaceSize {
    fn from(size: PhysicalSize<u32>) -> Self {
        SurfaceSize::new(size.width, size.height)
    }
}

fn unavailable(err: impl std::fmt::Display) -> ViewportError {
    ViewportError::SurfaceUnavailable(err.to_string())
}

/// Everything released together when the viewport lets go of the surface
struct GpuState {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    depth_view: TextureView,
    scene_pipeline: ScenePipeline,
    meshes: Option<SceneMeshes>,
    vertices: Vec<Vertex>,
    egui_renderer: egui_wgpu::Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
}

pub struct GpuSurface {
    window: Arc<Window>,
    size: SurfaceSize,
    gpu: Option<GpuState>,
    overlay: Overlay,
    events: Vec<ViewportEvent>,
}

impl GpuSurface {
    pub async fn new(window: Arc<Window>, show_stats: bool) -> Result<Self, ViewportError> {
        let size = window.inner_size();

        let instance = Instance::new(InstanceDescriptor {
            backends: Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).map_err(unavailable)?;

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| unavailable("no suitable GPU adapter"))?;

        tracing::info!("GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("TerraBot Device"),
                    required_features: Features::empty(),
                    required_limits: Limits::default(),
                },
                None,
            )
            .await
            .map_err(unavailable)?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| unavailable("surface reports no formats"))?;

        let present_mode = if surface_caps.present_modes.contains(&PresentMode::Mailbox) {
            PresentMode::Mailbox
        } else {
            PresentMode::Fifo
        };

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, config.width, config.height);
        let scene_pipeline = ScenePipeline::new(&device, surface_format);

        let egui_ctx = egui::Context::default();
        let viewport_id = egui_ctx.viewport_id();
        let egui_state = egui_winit::State::new(egui_ctx.clone(), viewport_id, &window, None, None);
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1);

        Ok(Self {
            window,
            size: size.into(),
            gpu: Some(GpuState {
                surface,
                device,
                queue,
                config,
                depth_view,
                scene_pipeline,
                meshes: None,
                vertices: Vec::new(),
                egui_renderer,
                egui_state,
                egui_ctx,
            }),
            overlay: Overlay::new(show_stats),
            events: Vec::new(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Feed a window event to the overlay; true when egui consumed it
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        match self.gpu.as_mut() {
            Some(gpu) => gpu.egui_state.on_window_event(&self.window, event).consumed,
            None => false,
        }
    }

    pub fn toggle_stats(&mut self) {
        self.overlay.toggle_stats();
    }

    fn acquire_texture(gpu: &GpuState) -> Result<SurfaceTexture, ViewportError> {
        match gpu.surface.get_current_texture() {
            Ok(output) => Ok(output),
            Err(SurfaceError::Outdated | SurfaceError::Lost) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                gpu.surface
                    .get_current_texture()
                    .map_err(|e| ViewportError::Frame(e.to_string()))
            }
            Err(e) => Err(ViewportError::Frame(e.to_string())),
        }
    }
}

impl RenderSurface for GpuSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn configure(&mut self, size: SurfaceSize) -> Result<(), ViewportError> {
        let gpu = self.gpu.as_mut().ok_or(ViewportError::Released)?;
        if size.is_empty() {
            return Ok(());
        }
        self.size = size;
        gpu.config.width = size.width;
        gpu.config.height = size.height;
        gpu.surface.configure(&gpu.device, &gpu.config);
        gpu.depth_view = create_depth_view(&gpu.device, size.width, size.height);
        tracing::debug!("Surface configured at {}", size);
        Ok(())
    }

    fn present(&mut self, frame: &Frame<'_>) -> Result<(), ViewportError> {
        let gpu = self.gpu.as_mut().ok_or(ViewportError::Released)?;
        let output = Self::acquire_texture(gpu)?;
        let view = output.texture.create_view(&TextureViewDescriptor::default());

        if !gpu.meshes.as_ref().is_some_and(|m| m.matches(frame.scene)) {
            let meshes = SceneMeshes::build(frame.scene);
            tracing::debug!("Tessellated {} shapes", frame.scene.shapes().len());
            gpu.meshes = Some(meshes);
        }
        if let Some(meshes) = &gpu.meshes {
            meshes.write_vertices(frame.scene, frame.pose, frame.selection, &mut gpu.vertices);
        }
        gpu.scene_pipeline.update(
            &gpu.device,
            &gpu.queue,
            frame.camera.view_projection(),
            &gpu.vertices,
        );

        let mut encoder = gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        let [r, g, b] = srgb_to_linear(frame.scene.background());
        {
            let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &gpu.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            gpu.scene_pipeline.render(&mut render_pass);
        }

        let raw_input = gpu.egui_state.take_egui_input(&self.window);
        let size = self.size;
        let overlay = &mut self.overlay;
        let mut raised = Vec::new();
        let full_output = gpu.egui_ctx.run(raw_input, |ctx| {
            raised = overlay.run(ctx, frame, size);
        });
        self.events.extend(raised);
        gpu.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };
        let clipped_primitives = gpu
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            gpu.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn release(&mut self) {
        if self.gpu.take().is_some() {
            self.events.clear();
            tracing::info!("GPU surface released");
        }
    }

    fn take_events(&mut self) -> Vec<ViewportEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Creates the GPU surface for one window
pub struct GpuProvider {
    window: Arc<Window>,
    show_stats: bool,
}

impl GpuProvider {
    pub fn new(window: Arc<Window>, show_stats: bool) -> Self {
        Self { window, show_stats }
    }
}

impl SurfaceProvider for GpuProvider {
    type Surface = GpuSurface;

    fn acquire(&mut self, _size: SurfaceSize) -> Result<GpuSurface, ViewportError> {
        pollster::block_on(GpuSurface::new(self.window.clone(), self.show_stats))
    }
}
