//! rm-cycle: single-stage vapor-compression heat pump cycle for refmix.
//!
//! Contains:
//! - boundary conditions (secondary-fluid temperature pairs)
//! - cycle settings (every numeric threshold of the model, named)
//! - the cycle evaluator with its adaptive approach-temperature search
//! - `CycleResult`, a success/failure sum type that never carries partial data

pub mod boundary;
pub mod error;
pub mod evaluator;
pub mod result;
pub mod settings;

pub use boundary::BoundaryConditions;
pub use error::CycleError;
pub use evaluator::CycleEvaluator;
pub use result::{
    CycleErrorKind, CycleOutcome, CyclePoints, CycleResult, CycleSummary, FlowRatios, Glide,
    SaturationPoints,
};
pub use settings::{CycleSettings, SecondaryFluids};
