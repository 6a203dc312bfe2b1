use rm_cycle::CycleError;
use rm_fluids::FluidError;
use rm_results::ResultsError;
use rm_search::SearchError;
use std::path::PathBuf;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Results(#[from] ResultsError),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error(transparent)]
    Fluid(#[from] FluidError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {message}", path = path.display())]
    FileParsing { path: PathBuf, message: String },

    #[error("Oracle backend '{backend}' is not available in this build")]
    BackendUnavailable { backend: &'static str },

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
