//! Frame-time statistics overlay
//!
//! Frame times live in a fixed ring buffer so recording a frame never
//! allocates.

use crate::viewport::{Frame, SurfaceSize};
use egui::epaint::PathShape;
use egui::{Color32, Pos2, Stroke};
use std::time::Instant;

/// Frame-time ring buffer with a running sum
pub struct StatsCollector {
    /// Milliseconds per frame
    frame_times: Vec<f32>,
    head: usize,
    total_time: f32,
    last_frame: Instant,
    graph_points_buffer: Vec<Pos2>,
}

impl StatsCollector {
    /// Two seconds at 60 fps
    pub const CAPACITY: usize = 120;

    pub fn new() -> Self {
        Self {
            frame_times: vec![0.0; Self::CAPACITY],
            head: 0,
            total_time: 0.0,
            last_frame: Instant::now(),
            graph_points_buffer: Vec::with_capacity(Self::CAPACITY),
        }
    }

    /// Record the time since the previous call
    pub fn record_frame(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;
        self.record(delta);
    }

    pub fn record(&mut self, frame_ms: f32) {
        let old = self.frame_times[self.head];
        self.frame_times[self.head] = frame_ms;
        self.total_time = self.total_time - old + frame_ms;
        self.head = (self.head + 1) % self.frame_times.len();
    }

    /// Average over the whole window; zero until something was recorded
    pub fn fps(&self) -> f32 {
        let avg_ms = self.total_time / self.frame_times.len() as f32;
        if avg_ms > 0.001 {
            1000.0 / avg_ms
        } else {
            0.0
        }
    }

    pub fn capacity(&self) -> usize {
        self.frame_times.len()
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn fps_color(fps: f32) -> Color32 {
    if fps > 55.0 {
        Color32::GREEN
    } else if fps > 30.0 {
        Color32::YELLOW
    } else {
        Color32::RED
    }
}

pub fn render_stats_overlay(
    ctx: &egui::Context,
    frame: &Frame<'_>,
    size: SurfaceSize,
    collector: &mut StatsCollector,
) {
    egui::Area::new(egui::Id::new("stats_overlay"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -10.0])
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style())
                .fill(Color32::from_rgba_premultiplied(10, 10, 10, 230))
                .stroke(Stroke::new(1.0, Color32::from_gray(60)))
                .inner_margin(8.0)
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("RENDER STATS").strong().color(Color32::WHITE));
                    ui.add_space(4.0);

                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(200.0, 40.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, Color32::from_black_alpha(100));

                    collector.graph_points_buffer.clear();
                    let history_len = collector.frame_times.len();
                    for i in 0..history_len {
                        let ms = collector.frame_times[(collector.head + i) % history_len];
                        let x = rect.min.x + (i as f32 / history_len as f32) * rect.width();
                        // 33 ms (30 fps) at the top
                        let h = (ms / 33.3).min(1.0);
                        collector
                            .graph_points_buffer
                            .push(Pos2::new(x, rect.max.y - h * rect.height()));
                    }
                    if collector.graph_points_buffer.len() >= 2 {
                        ui.painter().add(PathShape::line(
                            collector.graph_points_buffer.clone(),
                            Stroke::new(1.5, Color32::GREEN),
                        ));
                    }
                    let target_y = rect.max.y - (16.6 / 33.3) * rect.height();
                    ui.painter().line_segment(
                        [Pos2::new(rect.min.x, target_y), Pos2::new(rect.max.x, target_y)],
                        Stroke::new(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, 50)),
                    );

                    ui.add_space(4.0);
                    let fps = collector.fps();
                    egui::Grid::new("stats_grid")
                        .num_columns(2)
                        .spacing([20.0, 4.0])
                        .show(ui, |ui| {
                            ui.label("FPS:");
                            ui.colored_label(fps_color(fps), format!("{fps:.0}"));
                            ui.end_row();

                            ui.label("Frame:");
                            ui.label(format!("{:.2} ms", 1000.0 / fps.max(1.0)));
                            ui.end_row();

                            ui.label("Skipped:");
                            ui.label(frame.skipped_frames.to_string());
                            ui.end_row();

                            ui.label("Resolution:");
                            ui.label(size.to_string());
                            ui.end_row();

                            ui.label("Distance:");
                            ui.label(format!("{:.2}", frame.camera.distance()));
                            ui.end_row();
                        });
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_from_ring_buffer() {
        let mut stats = StatsCollector::new();
        assert_eq!(stats.fps(), 0.0);
        for _ in 0..StatsCollector::CAPACITY {
            stats.record(20.0);
        }
        assert!((stats.fps() - 50.0).abs() < 0.01);

        // A full window of faster frames replaces the old ones
        for _ in 0..stats.capacity() {
            stats.record(10.0);
        }
        assert!((stats.fps() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_fps_colors() {
        assert_eq!(fps_color(60.0), Color32::GREEN);
        assert_eq!(fps_color(40.0), Color32::YELLOW);
        assert_eq!(fps_color(10.0), Color32::RED);
    }
}
