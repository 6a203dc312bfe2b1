//! Configuration errors.
//!
//! Physical infeasibility of a blend is not an error here; it is reported as a
//! [`CycleErrorKind`](crate::CycleErrorKind) inside the result.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CycleError {
    #[error("Invalid boundary conditions: {what}")]
    InvalidBoundary { what: &'static str },

    #[error("Invalid cycle settings: {what}")]
    InvalidSettings { what: &'static str },
}
