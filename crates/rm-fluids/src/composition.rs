//! Blend composition (pure baseline, binary or ternary).

use crate::error::{FluidError, FluidResult};
use crate::species::Species;
use serde::{Deserialize, Serialize};

/// Fractions must sum to one within this tolerance.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// Largest blend handled by the screening engine.
pub const MAX_COMPONENTS: usize = 3;

/// One blend component and its mole fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub species: Species,
    pub fraction: f64,
}

/// Ordered mole-fraction vector over 1-3 distinct species.
///
/// Every fraction lies in [0,1] and the sum is 1 within [`SUM_TOLERANCE`].
/// Zero fractions are kept: a binary grid endpoint `[0.0, 1.0]` is still a
/// two-component composition that behaves like the pure second species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Component>", into = "Vec<Component>")]
pub struct MixtureComposition {
    components: Vec<Component>,
}

impl MixtureComposition {
    /// Create a composition from ordered (species, mole fraction) pairs.
    pub fn new(fractions: Vec<(Species, f64)>) -> FluidResult<Self> {
        if fractions.is_empty() {
            return Err(FluidError::InvalidArg {
                what: "empty composition",
            });
        }
        if fractions.len() > MAX_COMPONENTS {
            return Err(FluidError::InvalidArg {
                what: "composition has more than three components",
            });
        }

        let mut sum = 0.0;
        for (i, (species, frac)) in fractions.iter().enumerate() {
            if !frac.is_finite() {
                return Err(FluidError::NonPhysical {
                    what: "non-finite mole fraction",
                });
            }
            if !(0.0..=1.0).contains(frac) {
                return Err(FluidError::NonPhysical {
                    what: "mole fraction outside [0,1]",
                });
            }
            if fractions[..i].iter().any(|(s, _)| s == species) {
                return Err(FluidError::InvalidArg {
                    what: "duplicated species in composition",
                });
            }
            sum += frac;
        }

        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(FluidError::NonPhysical {
                what: "mole fractions do not sum to one",
            });
        }

        Ok(Self {
            components: fractions
                .into_iter()
                .map(|(species, fraction)| Component { species, fraction })
                .collect(),
        })
    }

    /// Create a pure-species composition `[1.0]`.
    pub fn pure(species: Species) -> Self {
        Self {
            components: vec![Component {
                species,
                fraction: 1.0,
            }],
        }
    }

    /// Binary blend with `x_a` of the first species.
    pub fn binary(a: Species, b: Species, x_a: f64) -> FluidResult<Self> {
        Self::new(vec![(a, x_a), (b, 1.0 - x_a)])
    }

    /// Ternary blend from the two free coordinates; the third takes the rest.
    ///
    /// A remainder that is negative only through rounding noise is clamped to zero.
    pub fn ternary(species: [Species; 3], x_a: f64, x_b: f64) -> FluidResult<Self> {
        let mut x_c = 1.0 - x_a - x_b;
        if x_c < 0.0 && x_c > -1e-12 {
            x_c = 0.0;
        }
        Self::new(vec![(species[0], x_a), (species[1], x_b), (species[2], x_c)])
    }

    /// Build a composition over `species` from a same-length fraction slice.
    pub fn from_parts(species: &[Species], fractions: &[f64]) -> FluidResult<Self> {
        if species.len() != fractions.len() {
            return Err(FluidError::InvalidArg {
                what: "species and fraction counts differ",
            });
        }
        Self::new(species.iter().copied().zip(fractions.iter().copied()).collect())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn species(&self) -> Vec<Species> {
        self.components.iter().map(|c| c.species).collect()
    }

    pub fn fractions(&self) -> Vec<f64> {
        self.components.iter().map(|c| c.fraction).collect()
    }

    /// Mole fraction of a species (0.0 if not present).
    pub fn mole_fraction(&self, species: Species) -> f64 {
        self.components
            .iter()
            .find(|c| c.species == species)
            .map(|c| c.fraction)
            .unwrap_or(0.0)
    }

    /// Iterate over all components, including zero fractions.
    pub fn iter(&self) -> impl Iterator<Item = Component> + '_ {
        self.components.iter().copied()
    }

    /// Components with a non-zero fraction.
    pub fn active(&self) -> impl Iterator<Item = Component> + '_ {
        self.components.iter().copied().filter(|c| c.fraction > 0.0)
    }

    /// Returns `Some(species)` if exactly one component carries the whole blend.
    pub fn is_pure(&self) -> Option<Species> {
        let mut active = self.active();
        match (active.next(), active.next()) {
            (Some(only), None) => Some(only.species),
            _ => None,
        }
    }

    /// Mixture molar mass [kg/kmol].
    pub fn molar_mass(&self) -> f64 {
        self.components
            .iter()
            .map(|c| c.species.molar_mass() * c.fraction)
            .sum()
    }

    /// Short label such as `PROPANE/BUTANE 0.250/0.750`.
    pub fn label(&self) -> String {
        let names: Vec<&str> = self.components.iter().map(|c| c.species.key()).collect();
        let fracs: Vec<String> = self
            .components
            .iter()
            .map(|c| format!("{:.3}", c.fraction))
            .collect();
        format!("{} {}", names.join("/"), fracs.join("/"))
    }
}

impl TryFrom<Vec<Component>> for MixtureComposition {
    type Error = FluidError;

    fn try_from(components: Vec<Component>) -> Result<Self, Self::Error> {
        Self::new(
            components
                .into_iter()
                .map(|c| (c.species, c.fraction))
                .collect(),
        )
    }
}

impl From<MixtureComposition> for Vec<Component> {
    fn from(mixture: MixtureComposition) -> Self {
        mixture.components
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ternary_lattice_points_are_valid(i in 0usize..=20, j in 0usize..=20) {
            prop_assume!(i + j <= 20);
            let comp = MixtureComposition::ternary(
                [Species::Propane, Species::NButane, Species::DimethylEther],
                i as f64 / 20.0,
                j as f64 / 20.0,
            ).unwrap();
            let sum: f64 = comp.fractions().iter().sum();
            prop_assert!((sum - 1.0).abs() <= SUM_TOLERANCE);
            prop_assert!(comp.fractions().iter().all(|f| (0.0..=1.0).contains(f)));
        }
    }
}
