//! Offscreen surface that records what it was asked to draw
//!
//! Used by tests and by the `telemetry-feed` binary, which drives the full
//! viewport without a window.

use super::surface::{Frame, RenderSurface, SurfaceProvider, SurfaceSize};
use super::ViewportError;
use crate::scene::PartId;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Summary of one presented frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub index: u64,
    pub size: SurfaceSize,
    pub selection: Option<PartId>,
    pub explode: f32,
    pub eye: [f32; 3],
    pub root_position: [f32; 3],
    pub shapes: usize,
}

#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub frames: Vec<FrameRecord>,
    pub configured: Vec<SurfaceSize>,
    pub releases: u32,
    /// Calls made after release; must stay zero
    pub used_after_release: u32,
    fail_presents: u32,
    fail_configure: bool,
}

pub type SharedLog = Rc<RefCell<SurfaceLog>>;

pub struct HeadlessSurface {
    size: SurfaceSize,
    released: bool,
    log: SharedLog,
}

impl HeadlessSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self::with_log(size, SharedLog::default())
    }

    pub fn with_log(size: SurfaceSize, log: SharedLog) -> Self {
        Self {
            size,
            released: false,
            log,
        }
    }

    pub fn log(&self) -> SharedLog {
        Rc::clone(&self.log)
    }

    /// Make the next `count` presents fail
    pub fn fail_next_presents(&self, count: u32) {
        self.log.borrow_mut().fail_presents = count;
    }

    fn check_live(&self) -> bool {
        if self.released {
            self.log.borrow_mut().used_after_release += 1;
        }
        !self.released
    }
}

impl RenderSurface for HeadlessSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn configure(&mut self, size: SurfaceSize) -> Result<(), ViewportError> {
        if !self.check_live() {
            return Err(ViewportError::Released);
        }
        let mut log = self.log.borrow_mut();
        if log.fail_configure {
            return Err(ViewportError::Frame("configure rejected".into()));
        }
        log.configured.push(size);
        self.size = size;
        Ok(())
    }

    fn present(&mut self, frame: &Frame<'_>) -> Result<(), ViewportError> {
        if !self.check_live() {
            return Err(ViewportError::Released);
        }
        let mut log = self.log.borrow_mut();
        if log.fail_presents > 0 {
            log.fail_presents -= 1;
            return Err(ViewportError::Frame("injected failure".into()));
        }
        log.frames.push(FrameRecord {
            index: frame.index,
            size: self.size,
            selection: frame.selection,
            explode: frame.pose.explode.factor(),
            eye: frame.camera.eye().to_array(),
            root_position: frame.pose.root_position.to_array(),
            shapes: frame.scene.shapes().len(),
        });
        Ok(())
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.log.borrow_mut().releases += 1;
        }
    }
}

/// Hands out [`HeadlessSurface`]s sharing one log
#[derive(Default)]
pub struct HeadlessProvider {
    pub log: SharedLog,
    /// Refuse to hand out a surface
    pub unavailable: bool,
    /// Hand out a surface whose first configure fails
    pub reject_configure: bool,
}

impl HeadlessProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SurfaceProvider for HeadlessProvider {
    type Surface = HeadlessSurface;

    fn acquire(&mut self, size: SurfaceSize) -> Result<HeadlessSurface, ViewportError> {
        if self.unavailable {
            return Err(ViewportError::SurfaceUnavailable(
                "headless provider disabled".into(),
            ));
        }
        self.log.borrow_mut().fail_configure = self.reject_configure;
        Ok(HeadlessSurface::with_log(size, Rc::clone(&self.log)))
    }
}
