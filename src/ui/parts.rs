//! Parts list, detail panel and view toolbar

use crate::scene::Part;
use crate::viewport::{Frame, ViewportEvent};
use egui::{Color32, RichText};

pub fn part_color(part: &Part) -> Color32 {
    let [r, g, b] = part.rgb().map(|c| (c * 255.0).round() as u8);
    Color32::from_rgb(r, g, b)
}

/// Explode / reset buttons, plus simulation controls when a field robot runs
pub fn render_toolbar(ctx: &egui::Context, frame: &Frame<'_>, events: &mut Vec<ViewportEvent>) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let explode_label = if frame.pose.explode.is_exploded() {
                "Assemble"
            } else {
                "Explode"
            };
            if ui.button(explode_label).clicked() {
                events.push(ViewportEvent::ToggleExplode);
            }
            if ui.button("Reset View").clicked() {
                events.push(ViewportEvent::ResetView);
            }

            if let Some(field) = frame.field {
                ui.separator();
                let run_label = if field.is_running() { "Pause" } else { "Start" };
                if ui.button(run_label).clicked() {
                    events.push(ViewportEvent::ToggleSimulation);
                }
                if ui.button("Reset").clicked() {
                    events.push(ViewportEvent::ResetSimulation);
                }
                let position = field.position();
                ui.separator();
                ui.label(format!(
                    "x {:.2}  y {:.2}  heading {}°",
                    position.x, position.z, position.heading_deg
                ));
            }
        });
    });
}

/// Clickable component list; clicking the selected entry clears it
pub fn render_parts_list(ctx: &egui::Context, frame: &Frame<'_>, events: &mut Vec<ViewportEvent>) {
    let pickable = frame.scene.pickable_parts();
    if pickable.is_empty() {
        return;
    }
    egui::SidePanel::left("parts_list")
        .resizable(false)
        .default_width(180.0)
        .show(ctx, |ui| {
            ui.heading("Components");
            ui.separator();
            for part in frame.scene.parts().iter().filter(|p| pickable.contains(&p.id)) {
                let selected = frame.selection == Some(part.id);
                ui.horizontal(|ui| {
                    let (swatch, _) =
                        ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                    ui.painter().rect_filled(swatch, 2.0, part_color(part));
                    if ui.selectable_label(selected, &part.name).clicked() {
                        events.push(ViewportEvent::TogglePart(part.id));
                    }
                });
            }
            ui.add_space(8.0);
            ui.label(RichText::new("Drag to orbit, scroll to zoom").small().weak());
        });
}

/// Name and specs of the selected part
pub fn render_detail_panel(ctx: &egui::Context, frame: &Frame<'_>, events: &mut Vec<ViewportEvent>) {
    let Some(part) = frame.selection.and_then(|id| frame.scene.part(id)) else {
        return;
    };
    egui::Window::new("Component")
        .anchor(egui::Align2::LEFT_BOTTOM, [200.0, -10.0])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&part.name).strong().color(part_color(part)));
                ui.label(RichText::new(part.hex()).monospace().weak());
            });
            ui.label(&part.specs);
            if ui.small_button("Close").clicked() {
                events.push(ViewportEvent::ClearSelection);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PartId;

    #[test]
    fn test_part_color_from_hex() {
        let part = Part::new(PartId::Chassis, "Chassis", "steel", 0x48bb78);
        assert_eq!(part_color(&part), Color32::from_rgb(0x48, 0xbb, 0x78));
    }
}
