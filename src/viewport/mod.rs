//! Viewport Controller
//!
//! A [`Viewport`] is the explicit context object for one interactive view:
//! it owns the scene, camera, input state, selection, simulators and the
//! render surface. `initialize` returns it; every other operation is a
//! method on it. After [`Viewport::dispose`] every call is a no-op.

mod headless;
mod schedule;
mod surface;

pub use headless::*;
pub use schedule::*;
pub use surface::*;

use crate::camera::{OrbitCamera, OrbitLimits};
use crate::input::{OrbitInput, OrbitSensitivity};
use crate::pick::{self, PickHit, Selection, SurfaceRect};
use crate::scene::{Layout, PartId, Scene, SceneError, ScenePose};
use crate::telemetry::{FieldSimulation, Telemetry, TelemetryError, TelemetryPreset};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telemetry ticks applied per call at most; the rest are dropped.
/// Covers one second at the fastest preset interval.
const MAX_CATCH_UP: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    /// Fatal for the viewport instance; never retried
    #[error("rendering surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("frame failed: {0}")]
    Frame(String),
    #[error("surface used after release")]
    Released,
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Input delivered by the host, in surface-relative pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    /// A short press-release also selects, so hosts that send this need not
    /// send `Click` as well
    PointerUp { x: f32, y: f32 },
    /// Focus lost or pointer captured elsewhere
    PointerCancel,
    /// Positive is a downward notch
    Wheel { delta_y: f32 },
    Click { x: f32, y: f32 },
    /// Parts list entry: select, or clear if already selected
    TogglePart(PartId),
    ClearSelection,
    ToggleExplode,
    ResetView,
    ToggleSimulation,
    ResetSimulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// The surface failed; the loop keeps going
    Skipped,
    /// Render loop stopped
    Stopped,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViewportStats {
    pub presented: u64,
    pub skipped: u64,
    pub telemetry_ticks: u64,
    pub dropped_ticks: u64,
}

/// What a viewport shows and how it reacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    pub layout: Layout,
    /// Side-panel simulator, if any
    pub telemetry: Option<TelemetryPreset>,
    pub seed: u64,
    pub sensitivity: OrbitSensitivity,
    /// Overrides the layout's default clamps
    pub limits: Option<OrbitLimits>,
    /// Start the field simulation immediately
    pub autostart: bool,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            layout: Layout::CadRobot,
            telemetry: None,
            seed: 0x7e44_ab07,
            sensitivity: OrbitSensitivity::default(),
            limits: None,
            autostart: false,
        }
    }
}

pub struct Viewport<S: RenderSurface> {
    surface: Option<S>,
    scene: Scene,
    pose: ScenePose,
    camera: OrbitCamera,
    input: OrbitInput,
    selection: Selection,
    telemetry: Option<Telemetry>,
    telemetry_timer: IntervalTimer,
    field: Option<FieldSimulation>,
    frames: FrameLoop,
    stats: ViewportStats,
}

impl<S: RenderSurface> Viewport<S> {
    /// Build the scene and acquire a surface. A surface that fails its
    /// first configure is released before the error is returned.
    pub fn initialize<P>(
        provider: &mut P,
        size: SurfaceSize,
        options: &ViewportOptions,
    ) -> Result<Self, ViewportError>
    where
        P: SurfaceProvider<Surface = S>,
    {
        let scene = Scene::from_layout(options.layout)?;
        let mut camera = match options.layout {
            Layout::CadRobot => OrbitCamera::cad_viewer(),
            Layout::FieldRobot => OrbitCamera::field_view(),
        };
        if let Some(limits) = options.limits {
            camera = camera.with_limits(limits);
        }

        let telemetry = options
            .telemetry
            .map(|preset| preset.build(options.seed))
            .transpose()?;
        let mut field = match options.layout {
            Layout::FieldRobot => Some(FieldSimulation::new(options.seed)?),
            Layout::CadRobot => None,
        };
        if let Some(field) = field.as_mut() {
            field.set_running(options.autostart);
        }

        let mut surface = provider.acquire(size)?;
        if !size.is_empty() {
            if let Err(e) = surface.configure(size) {
                surface.release();
                return Err(ViewportError::SurfaceUnavailable(e.to_string()));
            }
        }
        if let Some(aspect) = size.aspect() {
            camera.set_aspect(aspect);
        }

        let mut telemetry_timer = IntervalTimer::new(
            telemetry
                .as_ref()
                .map_or(Duration::ZERO, Telemetry::interval),
        );
        if telemetry.is_some() {
            telemetry_timer.start();
        }
        let mut frames = FrameLoop::default();
        frames.start();

        tracing::info!(
            "Viewport initialized: {:?} at {}, {} shapes",
            options.layout,
            size,
            scene.shapes().len()
        );

        Ok(Self {
            surface: Some(surface),
            scene,
            pose: ScenePose::default(),
            camera,
            input: OrbitInput::new(options.sensitivity),
            selection: Selection::default(),
            telemetry,
            telemetry_timer,
            field,
            frames,
            stats: ViewportStats::default(),
        })
    }

    pub fn is_disposed(&self) -> bool {
        self.surface.is_none()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn pose(&self) -> &ScenePose {
        &self.pose
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn input(&self) -> &OrbitInput {
        &self.input
    }

    pub fn selection(&self) -> Option<PartId> {
        self.selection.get()
    }

    pub fn telemetry(&self) -> Option<&Telemetry> {
        self.telemetry.as_ref()
    }

    pub fn field(&self) -> Option<&FieldSimulation> {
        self.field.as_ref()
    }

    pub fn stats(&self) -> ViewportStats {
        self.stats
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Bounds of the surface right now, anchored at the origin
    pub fn surface_rect(&self) -> Option<SurfaceRect> {
        let size = self.surface.as_ref()?.size();
        Some(SurfaceRect::from_size(size.width as f32, size.height as f32))
    }

    pub fn start_rendering(&mut self) {
        if !self.is_disposed() {
            self.frames.start();
        }
    }

    pub fn stop_rendering(&mut self) {
        self.frames.stop();
    }

    pub fn is_rendering(&self) -> bool {
        self.frames.is_running()
    }

    pub fn start_telemetry(&mut self) {
        if !self.is_disposed() && self.telemetry.is_some() {
            self.telemetry_timer.start();
        }
    }

    pub fn stop_telemetry(&mut self) {
        self.telemetry_timer.stop();
    }

    /// Zero or invalid sizes are ignored and the last projection is kept.
    pub fn resize(&mut self, size: SurfaceSize) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            tracing::debug!("Resize after dispose ignored");
            return false;
        };
        let Some(aspect) = size.aspect() else {
            tracing::debug!("Ignoring resize to {}", size);
            return false;
        };
        if let Err(e) = surface.configure(size) {
            tracing::warn!("Surface rejected resize to {}: {}", size, e);
            return false;
        }
        self.camera.set_aspect(aspect)
    }

    /// Release the surface and stop both loops. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.frames.stop();
        self.telemetry_timer.stop();
        self.input.cancel();
        match self.surface.take() {
            Some(mut surface) => {
                surface.release();
                tracing::info!(
                    "Viewport disposed after {} frames ({} skipped)",
                    self.stats.presented,
                    self.stats.skipped
                );
            }
            None => tracing::debug!("Viewport already disposed"),
        }
    }

    /// Nearest part under `pointer`, against the rect as it is now
    pub fn pick_at(&self, pointer: Vec2, rect: &SurfaceRect) -> Option<PickHit> {
        if self.is_disposed() {
            return None;
        }
        pick::pick(pointer, rect, &self.camera, &self.scene, &self.pose)
    }

    fn select_at(&mut self, pointer: Vec2) -> bool {
        let hit = self
            .surface_rect()
            .and_then(|rect| self.pick_at(pointer, &rect));
        self.selection.apply_pick(hit.map(|h| h.part))
    }

    /// Apply one host or overlay event. Returns whether anything visible
    /// changed.
    pub fn handle(&mut self, event: ViewportEvent) -> bool {
        if self.is_disposed() {
            tracing::debug!("Event after dispose ignored: {:?}", event);
            return false;
        }
        match event {
            ViewportEvent::PointerDown { x, y } => {
                self.input.pointer_down(Vec2::new(x, y));
                false
            }
            ViewportEvent::PointerMove { x, y } => {
                self.input.pointer_move(Vec2::new(x, y), &mut self.camera)
            }
            ViewportEvent::PointerUp { x, y } => {
                if self.input.pointer_up() {
                    self.select_at(Vec2::new(x, y))
                } else {
                    false
                }
            }
            ViewportEvent::PointerCancel => {
                self.input.cancel();
                false
            }
            ViewportEvent::Wheel { delta_y } => self.input.wheel(delta_y, &mut self.camera),
            ViewportEvent::Click { x, y } => self.select_at(Vec2::new(x, y)),
            ViewportEvent::TogglePart(part) => {
                self.selection.toggle(part);
                true
            }
            ViewportEvent::ClearSelection => self.selection.apply_pick(None),
            ViewportEvent::ToggleExplode => {
                self.pose.explode.toggle();
                tracing::info!("Exploded view: {}", self.pose.explode.is_exploded());
                true
            }
            ViewportEvent::ResetView => {
                self.camera.reset();
                true
            }
            ViewportEvent::ToggleSimulation => match self.field.as_mut() {
                Some(field) => {
                    field.toggle();
                    true
                }
                None => false,
            },
            ViewportEvent::ResetSimulation => match self.field.as_mut() {
                Some(field) => {
                    field.reset();
                    field.apply_to(&mut self.pose);
                    true
                }
                None => false,
            },
        }
    }

    /// Advance the telemetry timer by `dt` and apply the ticks that fell due.
    /// Runs whether or not the render loop is.
    pub fn tick_telemetry(&mut self, dt: Duration) -> u32 {
        if self.is_disposed() {
            return 0;
        }
        let Some(telemetry) = self.telemetry.as_mut() else {
            return 0;
        };
        let due = self.telemetry_timer.advance(dt);
        let applied = due.min(MAX_CATCH_UP);
        for _ in 0..applied {
            telemetry.tick();
        }
        if due > applied {
            tracing::debug!("Dropped {} telemetry ticks after a {:?} stall", due - applied, dt);
        }
        self.stats.telemetry_ticks += applied as u64;
        self.stats.dropped_ticks += (due - applied) as u64;
        applied
    }

    pub fn is_telemetry_running(&self) -> bool {
        self.telemetry.is_some() && self.telemetry_timer.is_running()
    }

    fn animate(&mut self) {
        if let Some(field) = self.field.as_mut() {
            field.step();
            field.apply_to(&mut self.pose);
        }
        self.pose.explode.step();
    }

    /// Advance simulators and animations by `dt`
    pub fn update(&mut self, dt: Duration) {
        if self.is_disposed() {
            return;
        }
        self.tick_telemetry(dt);
        self.animate();
    }

    /// Host frame callback. Telemetry follows its own timer; animations and
    /// drawing only happen while the render loop is running.
    pub fn frame(&mut self, dt: Duration) -> FrameOutcome {
        if self.is_disposed() {
            return FrameOutcome::Disposed;
        }
        self.tick_telemetry(dt);
        if self.frames.advance(dt) == 0 {
            return FrameOutcome::Stopped;
        }
        self.animate();
        self.render_frame()
    }

    /// Draw the current scene from the current camera. A failing frame is
    /// logged and skipped.
    pub fn render_frame(&mut self) -> FrameOutcome {
        let Some(surface) = self.surface.as_mut() else {
            return FrameOutcome::Disposed;
        };
        let frame = Frame {
            index: self.stats.presented + self.stats.skipped,
            scene: &self.scene,
            pose: &self.pose,
            camera: &self.camera,
            selection: self.selection.get(),
            telemetry: self.telemetry.as_ref(),
            field: self.field.as_ref(),
            skipped_frames: self.stats.skipped,
        };
        let outcome = match surface.present(&frame) {
            Ok(()) => {
                self.stats.presented += 1;
                FrameOutcome::Presented
            }
            Err(e) => {
                self.stats.skipped += 1;
                tracing::warn!("Frame {} skipped: {}", frame.index, e);
                FrameOutcome::Skipped
            }
        };
        // Overlay events raised during present take effect on the next frame
        let events = surface.take_events();
        for event in events {
            self.handle(event);
        }
        outcome
    }
}

impl<S: RenderSurface> Drop for Viewport<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const SIZE: SurfaceSize = SurfaceSize {
        width: 800,
        height: 600,
    };

    fn cad(provider: &mut HeadlessProvider) -> Viewport<HeadlessSurface> {
        Viewport::initialize(provider, SIZE, &ViewportOptions::default()).unwrap()
    }

    fn pointer_over(viewport: &Viewport<HeadlessSurface>, world: Vec3) -> Vec2 {
        let ndc = viewport.camera().project(world).unwrap();
        viewport
            .surface_rect()
            .unwrap()
            .ndc_to_pointer(ndc.truncate())
    }

    #[test]
    fn test_unavailable_surface_is_fatal() {
        let mut provider = HeadlessProvider {
            unavailable: true,
            ..Default::default()
        };
        let result = Viewport::initialize(&mut provider, SIZE, &ViewportOptions::default());
        assert!(matches!(result, Err(ViewportError::SurfaceUnavailable(_))));
    }

    #[test]
    fn test_partial_init_releases_surface() {
        let mut provider = HeadlessProvider {
            reject_configure: true,
            ..Default::default()
        };
        let result = Viewport::initialize(&mut provider, SIZE, &ViewportOptions::default());
        assert!(matches!(result, Err(ViewportError::SurfaceUnavailable(_))));
        assert_eq!(provider.log.borrow().releases, 1);
    }

    #[test]
    fn test_dispose_is_idempotent_and_final() {
        let mut provider = HeadlessProvider::new();
        let mut viewport = cad(&mut provider);
        assert_eq!(viewport.render_frame(), FrameOutcome::Presented);

        viewport.dispose();
        viewport.dispose();
        assert_eq!(viewport.render_frame(), FrameOutcome::Disposed);
        assert_eq!(viewport.frame(Duration::from_millis(16)), FrameOutcome::Disposed);
        assert!(!viewport.resize(SurfaceSize::new(640, 480)));
        assert!(!viewport.handle(ViewportEvent::Click { x: 400.0, y: 300.0 }));
        assert!(viewport.pick_at(Vec2::ZERO, &SurfaceRect::from_size(800.0, 600.0)).is_none());
        drop(viewport);

        let log = provider.log.borrow();
        assert_eq!(log.releases, 1);
        assert_eq!(log.used_after_release, 0);
        assert_eq!(log.frames.len(), 1);
    }

    #[test]
    fn test_zero_resize_keeps_projection() {
        let mut provider = HeadlessProvider::new();
        let mut viewport = cad(&mut provider);
        let projection = viewport.camera().projection_matrix();
        assert!(!viewport.resize(SurfaceSize::new(0, 600)));
        assert_eq!(viewport.camera().projection_matrix(), projection);

        assert!(viewport.resize(SurfaceSize::new(1200, 600)));
        assert_eq!(viewport.camera().aspect(), 2.0);
        assert_eq!(viewport.surface().unwrap().size(), SurfaceSize::new(1200, 600));
    }

    #[test]
    fn test_failing_frame_is_skipped() {
        let mut provider = HeadlessProvider::new();
        let mut viewport = cad(&mut provider);
        viewport.surface().unwrap().fail_next_presents(2);

        let dt = Duration::from_millis(16);
        assert_eq!(viewport.frame(dt), FrameOutcome::Skipped);
        assert_eq!(viewport.frame(dt), FrameOutcome::Skipped);
        assert_eq!(viewport.frame(dt), FrameOutcome::Presented);
        assert_eq!(viewport.stats().skipped, 2);
        assert_eq!(viewport.stats().presented, 1);
    }

    #[test]
    fn test_stop_rendering() {
        let mut provider = HeadlessProvider::new();
        let mut viewport = cad(&mut provider);
        viewport.stop_rendering();
        assert_eq!(viewport.frame(Duration::from_millis(16)), FrameOutcome::Stopped);
        viewport.start_rendering();
        assert_eq!(viewport.frame(Duration::from_millis(16)), FrameOutcome::Presented);
    }

    #[test]
    fn test_click_selects_then_clears() {
        let mut provider = HeadlessProvider::new();
        let mut viewport = cad(&mut provider);

        let over_chassis = pointer_over(&viewport, Vec3::new(0.0, 0.8, 0.0));
        viewport.handle(ViewportEvent::PointerDown {
            x: over_chassis.x,
            y: over_chassis.y,
        });
        viewport.handle(ViewportEvent::PointerUp {
            x: over_chassis.x,
            y: over_chassis.y,
        });
        assert_eq!(viewport.selection(), Some(PartId::Chassis));

        viewport.handle(ViewportEvent::Click { x: 2.0, y: 2.0 });
        assert_eq!(viewport.selection(), None);

        viewport.render_frame();
        assert_eq!(provider.log.borrow().frames[0].selection, None);
    }

    #[test]
    fn test_drag_does_not_select() {
        let mut provider = HeadlessProvider::new();
        let mut viewport = cad(&mut provider);
        let start = pointer_over(&viewport, Vec3::new(0.0, 0.8, 0.0));
        viewport.handle(ViewportEvent::PointerDown {
            x: start.x,
            y: start.y,
        });
        assert!(viewport.handle(ViewportEvent::PointerMove {
            x: start.x + 40.0,
            y: start.y,
        }));
        viewport.handle(ViewportEvent::PointerUp {
            x: start.x + 40.0,
            y: start.y,
        });
        assert_eq!(viewport.selection(), None);
        assert!(!viewport.input().is_dragging());
    }

    #[test]
    fn test_telemetry_follows_its_interval() {
        let mut provider = HeadlessProvider::new();
        let options = ViewportOptions {
            telemetry: Some(TelemetryPreset::SensorPanel),
            ..Default::default()
        };
        let mut viewport = Viewport::initialize(&mut provider, SIZE, &options).unwrap();
        for _ in 0..10 {
            viewport.frame(Duration::from_millis(50));
        }
        assert_eq!(viewport.telemetry().unwrap().ticks(), 5);

        viewport.stop_telemetry();
        viewport.frame(Duration::from_millis(500));
        assert_eq!(viewport.telemetry().unwrap().ticks(), 5);
    }

    #[test]
    fn test_telemetry_ticks_while_rendering_is_stopped() {
        let mut provider = HeadlessProvider::new();
        let options = ViewportOptions {
            telemetry: Some(TelemetryPreset::SensorPanel),
            ..Default::default()
        };
        let mut viewport = Viewport::initialize(&mut provider, SIZE, &options).unwrap();
        viewport.stop_rendering();
        for _ in 0..10 {
            assert_eq!(viewport.frame(Duration::from_millis(100)), FrameOutcome::Stopped);
        }
        assert_eq!(viewport.telemetry().unwrap().ticks(), 10);
        assert!(viewport.is_telemetry_running());
        assert!(provider.log.borrow().frames.is_empty());
    }

    #[test]
    fn test_long_frame_catches_up_to_the_cap() {
        let mut provider = HeadlessProvider::new();
        let options = ViewportOptions {
            telemetry: Some(TelemetryPreset::SensorPanel),
            ..Default::default()
        };
        let mut viewport = Viewport::initialize(&mut provider, SIZE, &options).unwrap();

        viewport.frame(Duration::from_secs(1));
        assert_eq!(viewport.telemetry().unwrap().ticks(), 10);
        assert_eq!(viewport.stats().dropped_ticks, 0);

        assert_eq!(viewport.tick_telemetry(Duration::from_secs(3)), MAX_CATCH_UP);
        assert_eq!(viewport.telemetry().unwrap().ticks(), 20);
        assert_eq!(viewport.stats().telemetry_ticks, 20);
        assert_eq!(viewport.stats().dropped_ticks, 20);
    }

    #[test]
    fn test_field_robot_drives_its_path() {
        let mut provider = HeadlessProvider::new();
        let options = ViewportOptions {
            layout: Layout::FieldRobot,
            autostart: true,
            ..Default::default()
        };
        let mut viewport = Viewport::initialize(&mut provider, SIZE, &options).unwrap();
        for _ in 0..20 {
            viewport.frame(Duration::from_millis(16));
        }
        assert!((viewport.pose().root_position.length() - 5.0).abs() < 1e-4);

        viewport.handle(ViewportEvent::ResetSimulation);
        assert_eq!(viewport.pose().root_position, Vec3::ZERO);
        assert!(!viewport.field().unwrap().is_running());
    }

    #[test]
    fn test_explode_animates_over_frames() {
        let mut provider = HeadlessProvider::new();
        let mut viewport = cad(&mut provider);
        viewport.handle(ViewportEvent::ToggleExplode);
        viewport.frame(Duration::from_millis(16));
        viewport.frame(Duration::from_millis(16));
        let log = provider.log.borrow();
        assert!((log.frames[0].explode - 0.1).abs() < 1e-6);
        assert!((log.frames[1].explode - 0.19).abs() < 1e-6);
    }
}
