use thiserror::Error;

/// Failures surfaced to the user as a notice. None of them mutate state.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to load file: {0:#}")]
    LoadFailure(anyhow::Error),

    #[error("Please load a file first.")]
    NoFileLoaded,

    #[error("Please enter valid number(s), separated by commas (got '{0}').")]
    InvalidFilterInput(String),

    #[error("Column '{0}' is not present in the loaded file.")]
    MissingColumn(String),

    #[error("No filtered results to export.")]
    EmptyResult,

    #[error("Failed to save file: {0:#}")]
    ExportFailure(anyhow::Error),
}

impl AppError {
    /// Problems with what the user typed or clicked, as opposed to I/O failures.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AppError::NoFileLoaded
                | AppError::InvalidFilterInput(_)
                | AppError::MissingColumn(_)
                | AppError::EmptyResult
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
