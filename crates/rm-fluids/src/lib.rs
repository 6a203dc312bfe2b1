//! rm-fluids: fluid property access for refmix.
//!
//! Provides:
//! - Species definitions (refrigerant candidates and secondary fluids)
//! - Blend compositions (pure baseline, binary, ternary)
//! - `PropertyOracle` trait isolating the cycle code from property backends
//! - `CyclePoint`, a memoizing two-input state
//! - An ideal-solution surrogate oracle (always available)
//! - A CoolProp oracle via `rfluids` (feature `coolprop`)
//!
//! # Example
//!
//! ```
//! use rm_fluids::{IdealMixtureOracle, MixtureComposition, Property, PropertyOracle, Species, StateSpec};
//!
//! let mut oracle = IdealMixtureOracle::new();
//! let blend = MixtureComposition::binary(Species::Propane, Species::Isobutane, 0.6).unwrap();
//! let t_bubble = oracle
//!     .value(&blend, Property::Temperature, StateSpec::PQ { p: 10.0, q: 0.0 })
//!     .unwrap();
//! assert!(t_bubble > 0.0 && t_bubble < 60.0);
//! ```

pub mod composition;
#[cfg(feature = "coolprop")]
pub mod coolprop;
pub mod error;
pub mod ideal;
pub mod oracle;
pub mod point;
pub mod property;
pub mod species;

// Re-exports for ergonomics
pub use composition::{Component, MixtureComposition};
#[cfg(feature = "coolprop")]
pub use coolprop::{CoolPropFactory, CoolPropOracle};
pub use error::{FluidError, FluidResult};
pub use ideal::{IdealMixtureOracle, IdealOracleFactory};
pub use oracle::{CriticalSearch, OracleFactory, PropertyOracle, critical_point_by_bisection};
pub use point::CyclePoint;
pub use property::{CriticalPoint, PointState, Property, PropertyMap, StateSpec};
pub use species::{Species, SurrogateParams};
