//! Fluid property errors.

use rm_core::CoreError;
use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur during fluid property calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Non-physical values (negative pressure, fractions outside [0,1], etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Value out of valid range.
    #[error("Value out of range for {what}")]
    OutOfRange { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Operation not supported (e.g., mixture critical point queries).
    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    /// Backend (CoolProp or surrogate) error.
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// Convergence failure (e.g., solving for T given P,h).
    #[error("Convergence failed for {what}")]
    ConvergenceFailed { what: &'static str },

    /// The property backend could not be set up (missing native library, bad config).
    #[error("Oracle setup failed: {message}")]
    Setup { message: String },
}

impl From<CoreError> for FluidError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NonFinite { what, .. } => FluidError::NonPhysical { what },
            CoreError::InvalidArg { what } => FluidError::InvalidArg { what },
            CoreError::OutOfRange { what, .. } => FluidError::OutOfRange { what },
        }
    }
}
