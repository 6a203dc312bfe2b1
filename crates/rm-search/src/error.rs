use rm_cycle::{CycleError, CycleErrorKind};
use rm_fluids::FluidError;
use thiserror::Error;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Oracle setup failed: {message}")]
    OracleSetup { message: String },

    #[error("Baseline {fluid} could not run the cycle: {kind}")]
    Baseline { fluid: String, kind: CycleErrorKind },

    #[error("Invalid search settings: {what}")]
    InvalidSettings { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("Cycle error: {0}")]
    Cycle(#[from] CycleError),

    #[error("Core error: {0}")]
    Core(#[from] rm_core::CoreError),
}
