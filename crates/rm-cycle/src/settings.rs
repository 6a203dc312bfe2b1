//! Cycle model parameters.

use crate::error::CycleError;
use rm_fluids::Species;
use serde::{Deserialize, Serialize};

pub const APPROACH_INITIAL: f64 = 6.5;
pub const APPROACH_STEP: f64 = 0.5;
pub const APPROACH_MAX: f64 = 20.0;
pub const EVAPORATOR_APPROACH: f64 = 3.0;
pub const SUPERHEAT: f64 = 5.0;
pub const SUBCOOLING_MARGIN: f64 = 1.0;
pub const ISENTROPIC_EFFICIENCY: f64 = 0.6;
pub const MIN_PINCH: f64 = 1.0;
pub const SECONDARY_PRESSURE: f64 = 1.0;

/// Secondary fluids and their (constant) pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryFluids {
    /// Fluid heated in the condenser
    pub hot: Species,
    /// Fluid cooled in the evaporator
    pub cold: Species,
    /// Pressure on both secondary sides [bar]
    pub pressure: f64,
}

impl Default for SecondaryFluids {
    fn default() -> Self {
        Self {
            hot: Species::Water,
            cold: Species::EthyleneGlycol,
            pressure: SECONDARY_PRESSURE,
        }
    }
}

/// Tunable parameters of the cycle model. Temperatures in K differences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleSettings {
    /// First condenser approach tried (t3 = hot inlet + approach)
    pub approach_initial: f64,
    pub approach_step: f64,
    /// Largest approach tried before giving up with `LowPinch`
    pub approach_max: f64,
    /// t4 = cold outlet - evaporator approach
    pub evaporator_approach: f64,
    /// Suction superheat above the dew temperature
    pub superheat: f64,
    /// Condensing pressure is the bubble pressure at t3 + this margin
    pub subcooling_margin: f64,
    pub isentropic_efficiency: f64,
    /// Smallest acceptable condenser pinch
    pub min_pinch: f64,
    pub secondary: SecondaryFluids,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            approach_initial: APPROACH_INITIAL,
            approach_step: APPROACH_STEP,
            approach_max: APPROACH_MAX,
            evaporator_approach: EVAPORATOR_APPROACH,
            superheat: SUPERHEAT,
            subcooling_margin: SUBCOOLING_MARGIN,
            isentropic_efficiency: ISENTROPIC_EFFICIENCY,
            min_pinch: MIN_PINCH,
            secondary: SecondaryFluids::default(),
        }
    }
}

impl CycleSettings {
    pub fn validate(&self) -> Result<(), CycleError> {
        let values = [
            self.approach_initial,
            self.approach_step,
            self.approach_max,
            self.evaporator_approach,
            self.superheat,
            self.subcooling_margin,
            self.isentropic_efficiency,
            self.min_pinch,
            self.secondary.pressure,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CycleError::InvalidSettings {
                what: "all settings must be finite",
            });
        }
        if self.approach_step <= 0.0 {
            return Err(CycleError::InvalidSettings {
                what: "approach_step must be positive",
            });
        }
        if self.approach_max < self.approach_initial {
            return Err(CycleError::InvalidSettings {
                what: "approach_max below approach_initial",
            });
        }
        if !(self.isentropic_efficiency > 0.0 && self.isentropic_efficiency <= 1.0) {
            return Err(CycleError::InvalidSettings {
                what: "isentropic_efficiency must lie in (0,1]",
            });
        }
        if self.superheat < 0.0 || self.subcooling_margin < 0.0 || self.evaporator_approach < 0.0 {
            return Err(CycleError::InvalidSettings {
                what: "superheat, subcooling and evaporator approach must be non-negative",
            });
        }
        if self.secondary.pressure <= 0.0 {
            return Err(CycleError::InvalidSettings {
                what: "secondary pressure must be positive",
            });
        }
        Ok(())
    }

    /// Approach temperatures tried in order, up to and including `approach_max`.
    pub fn approach_schedule(&self) -> impl Iterator<Item = f64> + '_ {
        (0..)
            .map(move |k| self.approach_initial + k as f64 * self.approach_step)
            .take_while(move |a| *a <= self.approach_max + 1e-9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(CycleSettings::default().validate().is_ok());
    }

    #[test]
    fn schedule_includes_the_maximum() {
        let s = CycleSettings::default();
        let approaches: Vec<f64> = s.approach_schedule().collect();
        assert_eq!(approaches.len(), 28);
        assert_eq!(approaches[0], 6.5);
        assert!((approaches[27] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_efficiency() {
        let s = CycleSettings {
            isentropic_efficiency: 1.2,
            ..CycleSettings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: CycleSettings = serde_json::from_str(r#"{"min_pinch": 2.0}"#).unwrap();
        assert_eq!(s.min_pinch, 2.0);
        assert_eq!(s.approach_initial, APPROACH_INITIAL);
        assert_eq!(s.secondary.hot, Species::Water);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn schedule_is_increasing_and_bounded(
            initial in 0.0_f64..20.0,
            span in 0.0_f64..20.0,
            step in 0.05_f64..5.0,
        ) {
            let s = CycleSettings {
                approach_initial: initial,
                approach_max: initial + span,
                approach_step: step,
                ..CycleSettings::default()
            };
            let approaches: Vec<f64> = s.approach_schedule().collect();
            prop_assert!(!approaches.is_empty());
            prop_assert_eq!(approaches[0], initial);
            prop_assert!(approaches.windows(2).all(|w| w[1] > w[0]));
            let last = approaches[approaches.len() - 1];
            prop_assert!(last <= s.approach_max + 1e-9);
            prop_assert!(last + step > s.approach_max - 1e-9);
        }
    }
}
