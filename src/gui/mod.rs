//! Viewer window.
//!
//! Shows the latest annotated half-scale frame with the detected count using
//! egui/eframe. Pressing `q` stops detection and closes the window.

pub mod render;
pub mod state;

use std::sync::mpsc::Receiver;
use std::time::Duration;

use eframe::egui::{self, TextureHandle, TextureOptions, Vec2};

use crate::automation::queue::{FrameUpdate, latest_update};
use crate::automation::{is_abort_requested, is_loop_running, request_abort};

use state::ViewerState;

/// Window title.
pub const WINDOW_TITLE: &str = "Detected Blocks";

/// How often the viewer polls for new frames.
const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Main viewer application struct.
pub struct ViewerApp {
    state: ViewerState,
    frames: Receiver<FrameUpdate>,
    texture: Option<TextureHandle>,
}

impl ViewerApp {
    pub fn new(frames: Receiver<FrameUpdate>) -> Self {
        Self {
            state: ViewerState::default(),
            frames,
            texture: None,
        }
    }

    /// Pull the newest cycle result and upload its frame.
    fn poll_frames(&mut self, ctx: &egui::Context) {
        let Some(update) = latest_update(&self.frames) else {
            return;
        };
        let Some(preview) = self.state.apply(update) else {
            return;
        };

        let size = [preview.width() as usize, preview.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, preview.as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("detected_blocks", image, TextureOptions::LINEAR))
            }
        }
    }

    /// Close on `q`, or once the loop has stopped for any other reason.
    fn handle_exit(&self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Q)) {
            crate::log("Viewer: q pressed, stopping detection");
            request_abort();
        }
        if is_abort_requested() || !is_loop_running() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_frames(ctx);
        self.handle_exit(ctx);

        ctx.request_repaint_after(REFRESH_INTERVAL);

        egui::CentralPanel::default().show(ctx, |ui| {
            render::render_status(ui, &self.state);
            ui.separator();
            render::render_frame(ui, self.texture.as_ref(), self.state.shown_count);
        });
    }
}

/// Run the viewer.
/// This function blocks until the window is closed.
pub fn run_viewer(frames: Receiver<FrameUpdate>) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(420.0, 800.0))
            .with_min_inner_size(Vec2::new(240.0, 320.0))
            .with_title(WINDOW_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(|_cc| Ok(Box::new(ViewerApp::new(frames)))),
    )
}
