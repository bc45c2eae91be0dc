mod app;
mod data;
mod error;
mod state;
mod ui;

use app::ApplicantFilterApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Applicant Filter (Rank Sorted)",
        options,
        Box::new(|_cc| Ok(Box::new(ApplicantFilterApp::default()))),
    )
}
