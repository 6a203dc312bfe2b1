//! Property names, two-input state specifications and resolved point states.
//!
//! Units at this boundary: pressure [bar], temperature [°C], enthalpy [kJ/kg],
//! entropy [kJ/(kg·K)], density [kg/m³], specific volume [m³/kg].

use crate::error::{FluidError, FluidResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Properties a [`PropertyOracle`](crate::PropertyOracle) can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Property {
    Temperature,
    Pressure,
    Density,
    SpecificVolume,
    Enthalpy,
    Entropy,
    /// Mass vapor quality; below 0 subcooled, above 1 superheated.
    Quality,
    CriticalTemperature,
    CriticalPressure,
}

impl Property {
    /// Properties a fully resolved cycle point carries.
    pub const STATE: [Property; 6] = [
        Property::Pressure,
        Property::Temperature,
        Property::Enthalpy,
        Property::Entropy,
        Property::Density,
        Property::Quality,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Property::Temperature => "T",
            Property::Pressure => "P",
            Property::Density => "D",
            Property::SpecificVolume => "V",
            Property::Enthalpy => "H",
            Property::Entropy => "S",
            Property::Quality => "Q",
            Property::CriticalTemperature => "Tcrit",
            Property::CriticalPressure => "Pcrit",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved property values from one oracle query.
pub type PropertyMap = HashMap<Property, f64>;

/// Two independent inputs that fix a thermodynamic state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StateSpec {
    /// Pressure [bar] and temperature [°C]
    PT { p: f64, t: f64 },
    /// Pressure [bar] and enthalpy [kJ/kg]
    PH { p: f64, h: f64 },
    /// Pressure [bar] and entropy [kJ/(kg·K)]
    PS { p: f64, s: f64 },
    /// Pressure [bar] and mass quality
    PQ { p: f64, q: f64 },
    /// Temperature [°C] and mass quality
    TQ { t: f64, q: f64 },
    /// Temperature [°C] and enthalpy [kJ/kg]
    TH { t: f64, h: f64 },
}

impl StateSpec {
    /// The two input values, keyed by property.
    pub fn inputs(&self) -> [(Property, f64); 2] {
        match *self {
            StateSpec::PT { p, t } => [(Property::Pressure, p), (Property::Temperature, t)],
            StateSpec::PH { p, h } => [(Property::Pressure, p), (Property::Enthalpy, h)],
            StateSpec::PS { p, s } => [(Property::Pressure, p), (Property::Entropy, s)],
            StateSpec::PQ { p, q } => [(Property::Pressure, p), (Property::Quality, q)],
            StateSpec::TQ { t, q } => [(Property::Temperature, t), (Property::Quality, q)],
            StateSpec::TH { t, h } => [(Property::Temperature, t), (Property::Enthalpy, h)],
        }
    }

    /// Reject non-finite inputs and out-of-range pressures or qualities.
    pub fn validate(&self) -> FluidResult<()> {
        for (property, value) in self.inputs() {
            if !value.is_finite() {
                return Err(FluidError::NonPhysical {
                    what: "non-finite state input",
                });
            }
            match property {
                Property::Pressure if value <= 0.0 => {
                    return Err(FluidError::NonPhysical {
                        what: "pressure must be positive",
                    });
                }
                Property::Temperature if value <= -rm_core::KELVIN_OFFSET => {
                    return Err(FluidError::NonPhysical {
                        what: "temperature below absolute zero",
                    });
                }
                Property::Quality if !(0.0..=1.0).contains(&value) => {
                    return Err(FluidError::OutOfRange {
                        what: "saturation quality must lie in [0,1]",
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl fmt::Display for StateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [(a, va), (b, vb)] = self.inputs();
        write!(f, "{a}={va:.4}, {b}={vb:.4}")
    }
}

/// Mixture critical point (°C, bar).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalPoint {
    pub temperature: f64,
    pub pressure: f64,
}

/// A fully resolved thermodynamic state, detached from the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointState {
    /// Pressure [bar]
    pub pressure: f64,
    /// Temperature [°C]
    pub temperature: f64,
    /// Specific enthalpy [kJ/kg]
    pub enthalpy: f64,
    /// Specific entropy [kJ/(kg·K)]
    pub entropy: f64,
    /// Density [kg/m³]
    pub density: f64,
    /// Mass vapor quality
    pub quality: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_bad_inputs() {
        assert!(StateSpec::PT { p: 1.0, t: 20.0 }.validate().is_ok());
        assert!(StateSpec::PT { p: -1.0, t: 20.0 }.validate().is_err());
        assert!(StateSpec::PT { p: 1.0, t: -300.0 }.validate().is_err());
        assert!(StateSpec::PQ { p: 1.0, q: 1.5 }.validate().is_err());
        assert!(StateSpec::PH { p: 1.0, h: f64::NAN }.validate().is_err());
        assert!(StateSpec::TH { t: 10.0, h: -50.0 }.validate().is_ok());
    }

    #[test]
    fn display_shows_both_inputs() {
        let text = StateSpec::PQ { p: 19.0, q: 0.0 }.to_string();
        assert!(text.contains("P=19.0000"));
        assert!(text.contains("Q=0.0000"));
    }
}
