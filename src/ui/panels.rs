use eframe::egui::{self, Align2, Color32, RichText, Ui};

use crate::data::loader::SourceFormat;
use crate::data::model::PREFERENCE_COLUMNS;
use crate::state::{AppState, Command, NoticeLevel, Phase};

const DEFAULT_EXPORT_NAME: &str = "filtered_results.xlsx";

// ---------------------------------------------------------------------------
// Top bar – load / export and status
// ---------------------------------------------------------------------------

/// Render the toolbar. Returns the command the user triggered, if any.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) -> Option<Command> {
    let mut command = None;

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Load File…").clicked() {
            command = open_file_dialog().map(Command::Load);
        }
        if ui.button("Export Filtered Results…").clicked() {
            command = export_requested(state);
        }

        ui.separator();

        if state.phase() == Phase::Unloaded {
            ui.label("No file loaded.");
        } else if let (Some(table), Some(source)) = (&state.table, &state.source) {
            let file = source
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            let shown = state.filtered.as_ref().map_or(0, |f| f.len());
            ui.label(format!("{file}: {} rows loaded, {shown} shown", table.len()));
        }
    });

    command
}

/// Check there is something to export, then ask where to put it.
fn export_requested(state: &mut AppState) -> Option<Command> {
    if let Err(err) = state.check_exportable() {
        log::warn!("{err}");
        state.notice = Some((&err).into());
        return None;
    }
    save_file_dialog().map(Command::Export)
}

// ---------------------------------------------------------------------------
// Filter controls
// ---------------------------------------------------------------------------

/// Preference selector, value field, apply button and the search-all toggle.
pub fn filter_bar(ui: &mut Ui, state: &mut AppState) -> Option<Command> {
    let mut command = None;

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Select Preference (p1–p9):");
        egui::ComboBox::from_id_salt("preference")
            .selected_text(state.preference_column())
            .show_ui(ui, |ui: &mut Ui| {
                for (i, name) in PREFERENCE_COLUMNS.iter().enumerate() {
                    ui.selectable_value(&mut state.preference, i, *name);
                }
            });

        ui.label("Value(s):");
        let field = ui.add(
            egui::TextEdit::singleline(&mut state.value_text)
                .hint_text("e.g. 11, 12")
                .desired_width(140.0),
        );
        let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        if ui.button("Apply Filter").clicked() || submitted {
            command = Some(Command::ApplyFilter);
        }
    });

    ui.checkbox(&mut state.search_all, "Search in all preferences (p1–p9)");

    command
}

// ---------------------------------------------------------------------------
// Blocking notice
// ---------------------------------------------------------------------------

/// Show the pending notice, if any. Returns `DismissNotice` once acknowledged.
pub fn notice_window(ctx: &egui::Context, state: &AppState) -> Option<Command> {
    let notice = state.notice.as_ref()?;
    let (title, color) = match notice.level {
        NoticeLevel::Info => ("Success", Color32::from_rgb(60, 160, 80)),
        NoticeLevel::Warning => ("Warning", Color32::from_rgb(220, 160, 40)),
        NoticeLevel::Error => ("Error", Color32::RED),
    };

    let mut command = None;
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            ui.label(RichText::new(&notice.text).color(color));
            ui.add_space(8.0);
            ui.vertical_centered(|ui: &mut Ui| {
                if ui.button("OK").clicked() {
                    command = Some(Command::DismissNotice);
                }
            });
        });
    command
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog() -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title("Load applicant list")
        .add_filter("Supported files", &SourceFormat::EXTENSIONS)
        .add_filter("Excel files", &["xlsx"])
        .add_filter("CSV files", &["csv"])
        .add_filter("PDF files", &["pdf"])
        .pick_file()
}

pub fn save_file_dialog() -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export filtered results")
        .set_file_name(DEFAULT_EXPORT_NAME)
        .add_filter("Excel files", &["xlsx"])
        .add_filter("CSV files", &["csv"])
        .save_file()
}
