//! Window host for one viewport (winit 0.29)
//!
//! Translates window events into [`ViewportEvent`]s; everything else is the
//! viewport's business.

use crate::config::ViewerConfig;
use crate::renderer::{GpuProvider, GpuSurface};
use crate::viewport::{FrameOutcome, SurfaceSize, Viewport, ViewportEvent};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::EventLoopWindowTarget,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

/// Pixels of trackpad scroll per wheel notch
const PIXELS_PER_NOTCH: f64 = 100.0;

/// Wheel delta in the viewport's convention: positive is a downward notch
pub fn wheel_delta(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y,
        MouseScrollDelta::PixelDelta(pos) => (-pos.y / PIXELS_PER_NOTCH) as f32,
    }
}

/// Shortcut keys
pub fn key_event(key: KeyCode) -> Option<ViewportEvent> {
    match key {
        KeyCode::KeyR => Some(ViewportEvent::ResetView),
        KeyCode::KeyE => Some(ViewportEvent::ToggleExplode),
        KeyCode::Space => Some(ViewportEvent::ToggleSimulation),
        KeyCode::Escape => Some(ViewportEvent::ClearSelection),
        _ => None,
    }
}

pub struct App {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    viewport: Option<Viewport<GpuSurface>>,
    cursor: PhysicalPosition<f64>,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            window: None,
            viewport: None,
            cursor: PhysicalPosition::new(0.0, 0.0),
            last_frame: Instant::now(),
            error: None,
        }
    }

    /// Fatal error that ended the event loop, if any
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    /// Create the window and its viewport
    pub fn init(&mut self, target: &EventLoopWindowTarget<()>) -> anyhow::Result<()> {
        if self.window.is_some() {
            return Ok(());
        }

        let window = Arc::new(
            WindowBuilder::new()
                .with_title(&self.config.title)
                .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
                .build(target)
                .context("failed to create window")?,
        );

        let mut provider = GpuProvider::new(window.clone(), self.config.show_stats);
        let viewport = Viewport::initialize(
            &mut provider,
            window.inner_size().into(),
            &self.config.viewport,
        )
        .context("viewport initialization failed")?;

        self.viewport = Some(viewport);
        self.last_frame = Instant::now();
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn dispatch(&mut self, event: ViewportEvent) {
        if let Some(viewport) = self.viewport.as_mut() {
            if viewport.handle(event) {
                self.request_redraw();
            }
        }
    }

    fn pointer(&self) -> (f32, f32) {
        (self.cursor.x as f32, self.cursor.y as f32)
    }

    fn handle_key(&mut self, key: KeyCode) {
        tracing::debug!("Key pressed: {:?}", key);
        match key {
            KeyCode::F2 => {
                if let Some(surface) = self.viewport.as_mut().and_then(|v| v.surface_mut()) {
                    surface.toggle_stats();
                }
            }
            KeyCode::F11 => {
                if let Some(window) = &self.window {
                    let fullscreen = window.fullscreen();
                    window.set_fullscreen(if fullscreen.is_some() {
                        None
                    } else {
                        Some(winit::window::Fullscreen::Borderless(None))
                    });
                }
            }
            other => {
                if let Some(event) = key_event(other) {
                    self.dispatch(event);
                }
            }
        }
    }

    fn redraw(&mut self, target: &EventLoopWindowTarget<()>) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame);
        self.last_frame = now;

        let Some(viewport) = self.viewport.as_mut() else {
            return;
        };
        match viewport.frame(dt) {
            FrameOutcome::Presented | FrameOutcome::Skipped => self.request_redraw(),
            FrameOutcome::Stopped => {
                if viewport.is_telemetry_running() {
                    self.request_redraw();
                }
            }
            FrameOutcome::Disposed => target.exit(),
        }
    }

    fn shutdown(&mut self, target: &EventLoopWindowTarget<()>) {
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.dispose();
        }
        target.exit();
    }

    /// Main event handling logic (winit 0.29 style)
    pub fn handle_event(&mut self, event: Event<()>, target: &EventLoopWindowTarget<()>) {
        let event = match event {
            Event::Resumed => {
                if let Err(e) = self.init(target) {
                    tracing::error!("{:#}", e);
                    self.error = Some(e);
                    target.exit();
                }
                return;
            }
            Event::LoopExiting => {
                self.viewport = None;
                return;
            }
            Event::WindowEvent { event, .. } => event,
            _ => return,
        };

        if let WindowEvent::CursorMoved { position, .. } = &event {
            self.cursor = *position;
        }
        let consumed = self
            .viewport
            .as_mut()
            .and_then(|v| v.surface_mut())
            .is_some_and(|surface| surface.on_window_event(&event));

        match event {
            WindowEvent::CloseRequested => self.shutdown(target),
            WindowEvent::Resized(size) => {
                if let Some(viewport) = self.viewport.as_mut() {
                    viewport.resize(SurfaceSize::from(size));
                }
                self.request_redraw();
            }
            WindowEvent::RedrawRequested => self.redraw(target),
            WindowEvent::Focused(false) | WindowEvent::CursorLeft { .. } => {
                self.dispatch(ViewportEvent::PointerCancel);
            }
            // A release over a widget must still end a drag
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.pointer();
                self.dispatch(if consumed {
                    ViewportEvent::PointerCancel
                } else {
                    ViewportEvent::PointerUp { x, y }
                });
            }
            _ if consumed => self.request_redraw(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.handle_key(key);
                self.request_redraw();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.dispatch(ViewportEvent::Wheel {
                    delta_y: wheel_delta(delta),
                });
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.pointer();
                self.dispatch(ViewportEvent::PointerDown { x, y });
            }
            WindowEvent::CursorMoved { .. } => {
                let (x, y) = self.pointer();
                self.dispatch(ViewportEvent::PointerMove { x, y });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_down_is_positive() {
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, -1.0)), 1.0);
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, 2.0)), -2.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -50.0));
        assert!((wheel_delta(pixels) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_shortcuts() {
        assert_eq!(key_event(KeyCode::KeyE), Some(ViewportEvent::ToggleExplode));
        assert_eq!(key_event(KeyCode::Space), Some(ViewportEvent::ToggleSimulation));
        assert_eq!(key_event(KeyCode::KeyQ), None);
    }
}
