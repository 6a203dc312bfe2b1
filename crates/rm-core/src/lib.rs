//! rm-core: stable foundation for refmix.
//!
//! Contains:
//! - units (uom SI types + engineering-unit constructors: bar, °C, kJ/kg)
//! - numeric (Real + grid helpers: linspace, inclusive ranges, rounding)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
