//! Host rendering surface seam

use super::{ViewportError, ViewportEvent};
use crate::camera::OrbitCamera;
use crate::scene::{PartId, Scene, ScenePose};
use crate::telemetry::{FieldSimulation, Telemetry};
use serde::{Deserialize, Serialize};

/// Drawable size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> Option<f32> {
        (!self.is_empty()).then(|| self.width as f32 / self.height as f32)
    }
}

impl std::fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Everything a surface needs to draw one frame
pub struct Frame<'a> {
    pub index: u64,
    pub scene: &'a Scene,
    pub pose: &'a ScenePose,
    pub camera: &'a OrbitCamera,
    pub selection: Option<PartId>,
    pub telemetry: Option<&'a Telemetry>,
    pub field: Option<&'a FieldSimulation>,
    pub skipped_frames: u64,
}

/// A drawable owned by exactly one viewport
pub trait RenderSurface {
    fn size(&self) -> SurfaceSize;

    fn configure(&mut self, size: SurfaceSize) -> Result<(), ViewportError>;

    fn present(&mut self, frame: &Frame<'_>) -> Result<(), ViewportError>;

    /// Free GPU-side resources. Called once by the owning viewport.
    fn release(&mut self);

    /// Events raised by the surface's own widgets since the last frame
    fn take_events(&mut self) -> Vec<ViewportEvent> {
        Vec::new()
    }
}

/// Source of render surfaces
pub trait SurfaceProvider {
    type Surface: RenderSurface;

    fn acquire(&mut self, size: SurfaceSize) -> Result<Self::Surface, ViewportError>;
}
