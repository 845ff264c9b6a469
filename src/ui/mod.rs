//! egui overlay drawn over the 3D view
//!
//! The overlay never mutates viewport state directly. Widgets push
//! [`ViewportEvent`]s which the surface hands back to the viewport after
//! the frame.

mod parts;
mod stats;
mod telemetry;

pub use parts::*;
pub use stats::*;
pub use telemetry::*;

use crate::viewport::{Frame, SurfaceSize, ViewportEvent};

pub struct Overlay {
    stats_collector: StatsCollector,
    show_stats: bool,
}

impl Overlay {
    pub fn new(show_stats: bool) -> Self {
        Self {
            stats_collector: StatsCollector::new(),
            show_stats,
        }
    }

    pub fn show_stats(&self) -> bool {
        self.show_stats
    }

    pub fn toggle_stats(&mut self) {
        self.show_stats = !self.show_stats;
    }

    pub fn fps(&self) -> f32 {
        self.stats_collector.fps()
    }

    /// Build this frame's widgets; returns the events they raised
    pub fn run(
        &mut self,
        ctx: &egui::Context,
        frame: &Frame<'_>,
        size: SurfaceSize,
    ) -> Vec<ViewportEvent> {
        self.stats_collector.record_frame();
        let mut events = Vec::new();

        render_toolbar(ctx, frame, &mut events);
        render_parts_list(ctx, frame, &mut events);
        render_telemetry_panel(ctx, frame);
        render_detail_panel(ctx, frame, &mut events);
        if self.show_stats {
            render_stats_overlay(ctx, frame, size, &mut self.stats_collector);
        }

        events
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;
    use crate::scene::{Layout, Scene, ScenePose};

    #[test]
    fn test_overlay_runs_without_input() {
        let scene = Scene::from_layout(Layout::CadRobot).unwrap();
        let pose = ScenePose::default();
        let camera = OrbitCamera::cad_viewer();
        let frame = Frame {
            index: 0,
            scene: &scene,
            pose: &pose,
            camera: &camera,
            selection: scene.parts().first().map(|p| p.id),
            telemetry: None,
            field: None,
            skipped_frames: 0,
        };

        let ctx = egui::Context::default();
        let mut overlay = Overlay::new(true);
        let mut events = Vec::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            events = overlay.run(ctx, &frame, SurfaceSize::new(800, 600));
        });
        // Nothing was clicked
        assert!(events.is_empty());
        overlay.toggle_stats();
        assert!(!overlay.show_stats());
    }
}
