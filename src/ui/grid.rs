use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::export::SERIAL_COLUMN;
use crate::data::model::{Table, APPLICANT_NAME, DISTRICT, GENDER, PREFERENCE_COLUMNS, RANK};
use crate::state::AppState;

const ROW_HEIGHT: f32 = 20.0;
const MIN_COLUMN_WIDTH: f32 = 60.0;

/// Header of the results grid: running index, identity fields, p1..p9.
pub fn display_columns() -> Vec<&'static str> {
    [SERIAL_COLUMN, RANK, APPLICANT_NAME, GENDER, DISTRICT]
        .into_iter()
        .chain(PREFERENCE_COLUMNS)
        .collect()
}

/// Build grid rows from the filtered table.
///
/// Missing cells and columns the table doesn't have render blank.
pub fn display_rows(table: &Table) -> Vec<Vec<String>> {
    let columns = display_columns();
    let indices: Vec<Option<usize>> = columns[1..]
        .iter()
        .map(|name| table.column_index(name))
        .collect();

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            std::iter::once((i + 1).to_string())
                .chain(indices.iter().map(|idx| match idx {
                    Some(idx) => row[*idx].to_string(),
                    None => String::new(),
                }))
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Results grid (central panel)
// ---------------------------------------------------------------------------

pub fn results_grid(ui: &mut Ui, state: &AppState) {
    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Load a file to get started  (Load File…)");
        });
        return;
    }

    let columns = display_columns();
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::centered_and_justified(egui::Direction::LeftToRight))
        .columns(Column::auto().at_least(MIN_COLUMN_WIDTH), columns.len())
        .header(ROW_HEIGHT, |mut header| {
            for name in &columns {
                header.col(|ui| {
                    ui.strong(*name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, state.grid.len(), |mut row| {
                let cells = &state.grid[row.index()];
                for cell in cells {
                    row.col(|ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}
