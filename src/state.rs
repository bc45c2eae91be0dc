use std::path::{Path, PathBuf};

use crate::data::export::ExportFormat;
use crate::data::filter::{self, FilterSpec};
use crate::data::loader::SourceFormat;
use crate::data::model::{Table, PREFERENCE_COLUMNS};
use crate::error::{AppError, AppResult};
use crate::ui::grid;

// ---------------------------------------------------------------------------
// Commands – everything the UI can ask the session to do
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(PathBuf),
    ApplyFilter,
    Export(PathBuf),
    DismissNotice,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unloaded,
    Loaded,
    Filtered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message the user has to acknowledge before continuing.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }
}

impl From<&AppError> for Notice {
    fn from(err: &AppError) -> Self {
        Notice {
            level: if err.is_user_error() {
                NoticeLevel::Warning
            } else {
                NoticeLevel::Error
            },
            text: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Most recently loaded table (None until user loads a file).
    pub table: Option<Table>,

    /// Path the current table came from.
    pub source: Option<PathBuf>,

    /// Result of the last successful filter.
    pub filtered: Option<Table>,

    /// Display rows for the results grid, rebuilt on every filter.
    pub grid: Vec<Vec<String>>,

    /// Index into `PREFERENCE_COLUMNS` of the selected preference.
    pub preference: usize,

    /// Raw text of the value field.
    pub value_text: String,

    /// Search all nine preference columns instead of the selected one.
    pub search_all: bool,

    /// Notice shown in a blocking window.
    pub notice: Option<Notice>,
}

impl AppState {
    pub fn phase(&self) -> Phase {
        match (&self.table, &self.filtered) {
            (None, _) => Phase::Unloaded,
            (Some(_), None) => Phase::Loaded,
            (Some(_), Some(_)) => Phase::Filtered,
        }
    }

    /// Name of the selected preference column.
    pub fn preference_column(&self) -> &'static str {
        PREFERENCE_COLUMNS[self.preference.min(PREFERENCE_COLUMNS.len() - 1)]
    }

    /// Run a command. Failures become a notice and leave state untouched.
    pub fn dispatch(&mut self, command: Command) {
        let result = match command {
            Command::Load(path) => self.load(&path),
            Command::ApplyFilter => self.apply_filter().map(|_| None),
            Command::Export(path) => self.export(&path),
            Command::DismissNotice => {
                self.notice = None;
                Ok(None)
            }
        };

        match result {
            Ok(Some(notice)) => self.notice = Some(notice),
            Ok(None) => {}
            Err(err) => {
                if err.is_user_error() {
                    log::warn!("{err}");
                } else {
                    log::error!("{err}");
                }
                self.notice = Some(Notice::from(&err));
            }
        }
    }

    /// Replace the loaded table and drop any previous filter result.
    pub fn load(&mut self, path: &Path) -> AppResult<Option<Notice>> {
        let format = SourceFormat::from_path(path)
            .ok_or_else(|| AppError::UnsupportedFormat(path.display().to_string()))?;
        let table = format.read(path).map_err(AppError::LoadFailure)?;

        log::info!(
            "Loaded {} rows with columns {:?} from {}",
            table.len(),
            table.columns,
            path.display()
        );
        self.table = Some(table);
        self.source = Some(path.to_path_buf());
        self.filtered = None;
        self.grid.clear();
        Ok(Some(Notice::info("File loaded successfully!")))
    }

    /// Filter the loaded table with the current control values.
    pub fn apply_filter(&mut self) -> AppResult<()> {
        let table = self.table.as_ref().ok_or(AppError::NoFileLoaded)?;
        let spec = FilterSpec::from_input(
            self.search_all,
            self.preference_column(),
            &self.value_text,
        )?;
        let filtered = filter::apply(table, &spec)?;

        log::info!(
            "Filter {:?} on {:?} kept {} of {} rows",
            spec.values,
            spec.mode,
            filtered.len(),
            table.len()
        );
        self.grid = grid::display_rows(&filtered);
        self.filtered = Some(filtered);
        Ok(())
    }

    /// Make sure there is something to export before asking for a path.
    pub fn check_exportable(&self) -> AppResult<&Table> {
        if self.table.is_none() {
            return Err(AppError::NoFileLoaded);
        }
        match &self.filtered {
            Some(filtered) if !filtered.is_empty() => Ok(filtered),
            _ => Err(AppError::EmptyResult),
        }
    }

    /// Write the filtered table to `path`.
    pub fn export(&self, path: &Path) -> AppResult<Option<Notice>> {
        let filtered = self.check_exportable()?;
        let (format, path) = ExportFormat::resolve(path)
            .ok_or_else(|| AppError::UnsupportedFormat(path.display().to_string()))?;
        format
            .write(filtered, &path)
            .map_err(AppError::ExportFailure)?;

        log::info!("Exported {} rows to {}", filtered.len(), path.display());
        Ok(Some(Notice::info(format!(
            "Filtered results saved to:\n{}",
            path.display()
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Rank,Applicant Name,Gender,District,p1,p2,p3
3,Gita,F,Ilam,11,5,
1,Hari,M,Jhapa,12,7,5
2,Sita,F,Kaski,4,,11
";

    fn loaded(dir: &tempfile::TempDir) -> AppState {
        let path = dir.path().join("list.csv");
        std::fs::write(&path, CSV).unwrap();
        let mut state = AppState::default();
        state.dispatch(Command::Load(path));
        assert_eq!(state.phase(), Phase::Loaded);
        state
    }

    #[test]
    fn starts_unloaded() {
        let state = AppState::default();
        assert_eq!(state.phase(), Phase::Unloaded);
        assert_eq!(state.preference_column(), "p1");
    }

    #[test]
    fn filter_before_load_reports_and_changes_nothing() {
        let mut state = AppState::default();
        state.value_text = "11".into();
        state.dispatch(Command::ApplyFilter);

        assert_eq!(state.phase(), Phase::Unloaded);
        assert!(state.grid.is_empty());
        let notice = state.notice.clone().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.text, AppError::NoFileLoaded.to_string());

        state.dispatch(Command::DismissNotice);
        assert!(state.notice.is_none());
    }

    #[test]
    fn successful_filter_rebuilds_grid() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded(&dir);
        state.preference = 0;
        state.value_text = "11, 12".into();
        state.dispatch(Command::ApplyFilter);

        assert_eq!(state.phase(), Phase::Filtered);
        let ranks: Vec<&str> = state.grid.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(ranks, vec!["1", "3"]);
        let serials: Vec<&str> = state.grid.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(serials, vec!["1", "2"]);
    }

    #[test]
    fn invalid_values_keep_previous_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded(&dir);
        state.search_all = true;
        state.value_text = "5".into();
        state.dispatch(Command::ApplyFilter);
        let before = (state.filtered.clone(), state.grid.clone());
        assert_eq!(state.grid.len(), 2);

        state.value_text = "11,abc".into();
        state.dispatch(Command::ApplyFilter);
        assert_eq!((state.filtered.clone(), state.grid.clone()), before);
        assert!(state.notice.is_some());
    }

    #[test]
    fn absent_preference_column_keeps_previous_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded(&dir);
        state.search_all = true;
        state.value_text = "5".into();
        state.dispatch(Command::ApplyFilter);
        let before = (state.filtered.clone(), state.grid.clone());
        state.dispatch(Command::DismissNotice);

        // The list only has p1..p3.
        state.search_all = false;
        state.preference = 6;
        state.value_text = "1".into();
        state.dispatch(Command::ApplyFilter);

        assert_eq!((state.filtered.clone(), state.grid.clone()), before);
        let notice = state.notice.clone().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.text, AppError::MissingColumn("p7".into()).to_string());
    }

    #[test]
    fn reload_discards_filter_and_bad_load_keeps_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded(&dir);
        state.value_text = "4".into();
        state.dispatch(Command::ApplyFilter);
        assert_eq!(state.phase(), Phase::Filtered);

        state.dispatch(Command::Load(dir.path().join("list.txt")));
        assert_eq!(state.phase(), Phase::Filtered);
        assert_eq!(state.notice.as_ref().unwrap().level, NoticeLevel::Error);

        state.dispatch(Command::Load(dir.path().join("list.csv")));
        assert_eq!(state.phase(), Phase::Loaded);
        assert!(state.grid.is_empty());
    }

    #[test]
    fn export_requires_non_empty_filter() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::default().check_exportable(),
            Err(AppError::NoFileLoaded)
        ));

        let mut state = loaded(&dir);
        let out = dir.path().join("out.csv");
        assert!(matches!(state.export(&out), Err(AppError::EmptyResult)));

        state.value_text = "99".into();
        state.dispatch(Command::ApplyFilter);
        assert!(matches!(state.export(&out), Err(AppError::EmptyResult)));
        assert!(!out.exists());
    }

    #[test]
    fn export_writes_filtered_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded(&dir);
        state.search_all = true;
        state.value_text = "5".into();
        state.dispatch(Command::ApplyFilter);

        let out = dir.path().join("picked");
        state.dispatch(Command::Export(out));
        assert_eq!(state.notice.as_ref().unwrap().level, NoticeLevel::Info);

        let exported = SourceFormat::Spreadsheet
            .read(&dir.path().join("picked.xlsx"))
            .unwrap();
        let ranks: Vec<String> = exported.rows.iter().map(|r| r[1].to_string()).collect();
        assert_eq!(ranks, vec!["1", "3"]);
    }
}
