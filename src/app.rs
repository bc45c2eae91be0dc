use eframe::egui;

use crate::state::AppState;
use crate::ui::{grid, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ApplicantFilterApp {
    pub state: AppState,
}

impl eframe::App for ApplicantFilterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut commands = Vec::new();
        let blocked = self.state.notice.is_some();

        // ---- Top panel: load / export / filter controls ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_enabled_ui(!blocked, |ui| {
                commands.extend(panels::top_bar(ui, &mut self.state));
                ui.separator();
                commands.extend(panels::filter_bar(ui, &mut self.state));
            });
        });

        // ---- Central panel: results grid ----
        egui::CentralPanel::default().show(ctx, |ui| {
            grid::results_grid(ui, &self.state);
        });

        // ---- Notice window on top of everything ----
        commands.extend(panels::notice_window(ctx, &self.state));

        for command in commands {
            self.state.dispatch(command);
        }
    }
}
