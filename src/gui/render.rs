//! Viewer rendering functions.

use eframe::egui::{self, Color32, RichText, TextureHandle, Vec2};

use super::state::{ViewerState, ViewerStatus, overlay_text};
use crate::automation::get_last_count;

/// Position of the count label, relative to the frame's top-left corner.
const OVERLAY_OFFSET: Vec2 = Vec2::new(10.0, 30.0);

/// Render the status line above the frame.
pub fn render_status(ui: &mut egui::Ui, state: &ViewerState) {
    let color = match &state.status {
        ViewerStatus::Waiting => Color32::GRAY,
        ViewerStatus::Detected { .. } => Color32::from_rgb(0, 150, 0),
        ViewerStatus::Failed { .. } => Color32::from_rgb(200, 0, 0),
    };

    ui.horizontal(|ui| {
        ui.label(RichText::new(state.status.status_text()).color(color));
        if let Some(at) = state.last_update {
            ui.label(RichText::new(at.format("%H:%M:%S").to_string()).weak());
        }
    });
    let entered = match get_last_count() {
        Some(count) => format!("Entered on device: {}", count),
        None => "Entered on device: -".to_string(),
    };
    ui.horizontal(|ui| {
        ui.label(RichText::new(entered).small());
        ui.label(RichText::new("Press q to quit").small().weak());
    });
}

/// Render the annotated frame, scaled to fit, with the count drawn over it.
pub fn render_frame(ui: &mut egui::Ui, texture: Option<&TextureHandle>, count: Option<u8>) {
    let Some(texture) = texture else {
        ui.centered_and_justified(|ui| {
            ui.label("No frame yet");
        });
        return;
    };

    let size = texture.size_vec2();
    let available = ui.available_size();
    let scale = (available.x / size.x).min(available.y / size.y).min(1.0);
    let (rect, _response) = ui.allocate_exact_size(size * scale, egui::Sense::hover());

    let painter = ui.painter_at(rect);
    painter.image(
        texture.id(),
        rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        Color32::WHITE,
    );

    if let Some(count) = count {
        painter.text(
            rect.min + OVERLAY_OFFSET,
            egui::Align2::LEFT_BOTTOM,
            overlay_text(count),
            egui::FontId::proportional(16.0),
            Color32::WHITE,
        );
    }
}
