//! Telemetry side panel: readings, LiDAR plot, obstacle flag

use crate::telemetry::{LidarPoint, Reading, ReadingStatus, Telemetry};
use crate::viewport::Frame;
use egui::{Color32, Pos2, RichText, Stroke};

pub fn status_color(status: ReadingStatus) -> Color32 {
    match status {
        ReadingStatus::Normal => Color32::from_rgb(0x48, 0xbb, 0x78),
        ReadingStatus::Warning => Color32::from_rgb(0xec, 0xc9, 0x4b),
        ReadingStatus::Critical => Color32::from_rgb(0xf5, 0x65, 0x65),
    }
}

/// Unclassified readings
const NEUTRAL: Color32 = Color32::from_rgb(0xa0, 0xae, 0xc0);

fn reading_color(reading: &Reading) -> Color32 {
    reading.status().map_or(NEUTRAL, status_color)
}

fn reading_row(ui: &mut egui::Ui, reading: &Reading) {
    let color = reading_color(reading);
    ui.horizontal(|ui| {
        ui.label(&reading.name);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(reading.display()).monospace().color(color));
        });
    });
    ui.add(
        egui::ProgressBar::new(reading.fraction() as f32)
            .desired_height(4.0)
            .fill(color),
    );
}

/// Polar plot of a sweep; `max_range` meters maps to the plot radius
fn lidar_plot(ui: &mut egui::Ui, points: impl Iterator<Item = LidarPoint>, max_range: f64) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(160.0, 160.0), egui::Sense::hover());
    let painter = ui.painter();
    let center = rect.center();
    let radius = rect.width() * 0.5;
    painter.circle_filled(center, radius, Color32::from_black_alpha(120));
    painter.circle_stroke(center, radius * 0.5, Stroke::new(1.0, Color32::from_gray(50)));
    for point in points {
        let r = (point.distance / max_range).min(1.0) as f32 * radius;
        let a = (point.angle as f32).to_radians();
        let pos = Pos2::new(center.x + a.cos() * r, center.y - a.sin() * r);
        painter.circle_filled(pos, 2.0, Color32::from_rgb(0x48, 0xbb, 0x78));
    }
}

/// Ring samples are evenly spaced around the robot
fn ring_points(ring: &[f64]) -> impl Iterator<Item = LidarPoint> + '_ {
    let step = 360.0 / ring.len().max(1) as f64;
    ring.iter().enumerate().map(move |(i, &distance)| LidarPoint {
        angle: i as f64 * step,
        distance,
    })
}

fn readings_section(ui: &mut egui::Ui, telemetry: &Telemetry) {
    for reading in telemetry.readings() {
        reading_row(ui, reading);
    }
    if !telemetry.sweep().is_empty() {
        ui.separator();
        ui.label(RichText::new("LiDAR").strong());
        lidar_plot(ui, telemetry.sweep().iter().copied(), 5.0);
    }
}

pub fn render_telemetry_panel(ctx: &egui::Context, frame: &Frame<'_>) {
    if frame.telemetry.is_none() && frame.field.is_none() {
        return;
    }
    egui::SidePanel::right("telemetry")
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Telemetry");
            ui.separator();
            if let Some(telemetry) = frame.telemetry {
                readings_section(ui, telemetry);
            }
            if let Some(field) = frame.field {
                if frame.telemetry.is_some() {
                    ui.separator();
                }
                readings_section(ui, field.telemetry());
                ui.separator();
                ui.label(RichText::new("LiDAR ring").strong());
                lidar_plot(ui, ring_points(field.lidar()), 10.0);
                let (text, color) = if field.obstacle_detected() {
                    ("Obstacle detected", status_color(ReadingStatus::Critical))
                } else {
                    ("Path clear", status_color(ReadingStatus::Normal))
                };
                ui.label(RichText::new(text).color(color));
            }
        });
}
