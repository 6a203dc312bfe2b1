//! Secondary-fluid temperature pairs.

use crate::error::CycleError;
use serde::{Deserialize, Serialize};

/// Hot-side (heated water) and cold-side (cooled brine) temperatures [°C].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConditions {
    pub hot_inlet: f64,
    pub hot_outlet: f64,
    pub cold_inlet: f64,
    pub cold_outlet: f64,
}

impl BoundaryConditions {
    pub fn new(
        hot_inlet: f64,
        hot_outlet: f64,
        cold_inlet: f64,
        cold_outlet: f64,
    ) -> Result<Self, CycleError> {
        let bc = Self {
            hot_inlet,
            hot_outlet,
            cold_inlet,
            cold_outlet,
        };
        bc.validate()?;
        Ok(bc)
    }

    pub fn validate(&self) -> Result<(), CycleError> {
        let all = [self.hot_inlet, self.hot_outlet, self.cold_inlet, self.cold_outlet];
        if all.iter().any(|t| !t.is_finite()) {
            return Err(CycleError::InvalidBoundary {
                what: "temperatures must be finite",
            });
        }
        if self.hot_outlet <= self.hot_inlet {
            return Err(CycleError::InvalidBoundary {
                what: "hot side must be heated (outlet above inlet)",
            });
        }
        if self.cold_outlet >= self.cold_inlet {
            return Err(CycleError::InvalidBoundary {
                what: "cold side must be cooled (outlet below inlet)",
            });
        }
        if self.cold_inlet >= self.hot_inlet {
            return Err(CycleError::InvalidBoundary {
                what: "cold side must be colder than hot side",
            });
        }
        Ok(())
    }

    /// Short label such as `47->55 / 0->-3`.
    pub fn label(&self) -> String {
        format!(
            "{}->{} / {}->{}",
            self.hot_inlet, self.hot_outlet, self.cold_inlet, self.cold_outlet
        )
    }
}

impl Default for BoundaryConditions {
    /// Space-heating case: water 47 → 55 °C, brine 0 → -3 °C.
    fn default() -> Self {
        Self {
            hot_inlet: 47.0,
            hot_outlet: 55.0,
            cold_inlet: 0.0,
            cold_outlet: -3.0,
        }
    }
}
