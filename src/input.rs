//! Pointer-drag orbit and wheel zoom
//!
//! Two states: idle and dragging. Motion is applied directly to the camera
//! on every move event; there is no inertia after release.

use crate::camera::OrbitCamera;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Radians of orbit per pixel of drag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitSensitivity {
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for OrbitSensitivity {
    fn default() -> Self {
        Self {
            yaw: 0.01,
            pitch: 0.005,
        }
    }
}

/// Distance multiplier for one downward wheel notch
pub const ZOOM_OUT: f32 = 1.1;
/// Distance multiplier for one upward wheel notch
pub const ZOOM_IN: f32 = 0.9;

/// A release that travelled less than this (pixels) counts as a click
pub const CLICK_SLOP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        last: Vec2,
        travelled: f32,
    },
}

#[derive(Debug, Clone, Default)]
pub struct OrbitInput {
    state: DragState,
    sensitivity: OrbitSensitivity,
}

impl OrbitInput {
    pub fn new(sensitivity: OrbitSensitivity) -> Self {
        Self {
            state: DragState::Idle,
            sensitivity,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.state = DragState::Dragging {
            last: position,
            travelled: 0.0,
        };
    }

    /// Orbit the camera by the delta since the last event. Returns whether
    /// the camera moved.
    pub fn pointer_move(&mut self, position: Vec2, camera: &mut OrbitCamera) -> bool {
        let DragState::Dragging { last, travelled } = self.state else {
            return false;
        };
        let delta = position - last;
        self.state = DragState::Dragging {
            last: position,
            travelled: travelled + delta.length(),
        };
        if delta == Vec2::ZERO {
            return false;
        }
        camera.orbit(
            delta.x * self.sensitivity.yaw,
            delta.y * self.sensitivity.pitch,
        );
        true
    }

    /// Always returns to idle, wherever the pointer is. Returns true when
    /// the gesture was short enough to be a click.
    pub fn pointer_up(&mut self) -> bool {
        let was_click = matches!(
            self.state,
            DragState::Dragging { travelled, .. } if travelled < CLICK_SLOP
        );
        self.state = DragState::Idle;
        was_click
    }

    /// Focus lost or the pointer was captured elsewhere
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            tracing::debug!("Orbit drag cancelled");
        }
        self.state = DragState::Idle;
    }

    /// One wheel notch: positive `delta_y` zooms out, negative zooms in.
    pub fn wheel(&mut self, delta_y: f32, camera: &mut OrbitCamera) -> bool {
        if delta_y > 0.0 {
            camera.zoom(ZOOM_OUT);
        } else if delta_y < 0.0 {
            camera.zoom(ZOOM_IN);
        } else {
            return false;
        }
        true
    }
}
