//! Memoizing thermodynamic point.

use crate::composition::MixtureComposition;
use crate::error::{FluidError, FluidResult};
use crate::oracle::PropertyOracle;
use crate::property::{PointState, Property, StateSpec};
use std::collections::HashMap;

/// A state fixed by two inputs whose other properties resolve on demand.
///
/// The two inputs are cached at construction. Each further property is asked
/// of the oracle at most once; later reads hit the cache.
#[derive(Debug, Clone)]
pub struct CyclePoint {
    mixture: MixtureComposition,
    spec: StateSpec,
    values: HashMap<Property, f64>,
}

impl CyclePoint {
    pub fn new(mixture: &MixtureComposition, spec: StateSpec) -> Self {
        Self {
            mixture: mixture.clone(),
            spec,
            values: spec.inputs().into_iter().collect(),
        }
    }

    pub fn spec(&self) -> StateSpec {
        self.spec
    }

    pub fn mixture(&self) -> &MixtureComposition {
        &self.mixture
    }

    /// Value already resolved, if any.
    pub fn cached(&self, property: Property) -> Option<f64> {
        self.values.get(&property).copied()
    }

    /// Resolve one property, querying the oracle only on a cache miss.
    pub fn get(&mut self, oracle: &mut dyn PropertyOracle, property: Property) -> FluidResult<f64> {
        if let Some(value) = self.cached(property) {
            return Ok(value);
        }
        self.resolve(oracle, &[property])?;
        self.cached(property).ok_or_else(|| FluidError::Backend {
            message: format!("{} did not resolve {property}", oracle.name()),
        })
    }

    /// Resolve several properties with a single oracle query for the misses.
    pub fn resolve(
        &mut self,
        oracle: &mut dyn PropertyOracle,
        properties: &[Property],
    ) -> FluidResult<()> {
        let missing: Vec<Property> = properties
            .iter()
            .copied()
            .filter(|p| !self.values.contains_key(p))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let resolved = oracle.query(&self.mixture, &missing, self.spec)?;
        for property in missing {
            let value = resolved
                .get(&property)
                .copied()
                .ok_or_else(|| FluidError::Backend {
                    message: format!("{} did not return {property}", oracle.name()),
                })?;
            if !value.is_finite() {
                return Err(FluidError::NonPhysical {
                    what: "oracle returned a non-finite property",
                });
            }
            self.values.insert(property, value);
        }
        Ok(())
    }

    /// Resolve the full state property set into a detached [`PointState`].
    pub fn snapshot(&mut self, oracle: &mut dyn PropertyOracle) -> FluidResult<PointState> {
        self.resolve(oracle, &Property::STATE)?;
        let value = |p: Property| self.values.get(&p).copied().unwrap_or(f64::NAN);
        Ok(PointState {
            pressure: value(Property::Pressure),
            temperature: value(Property::Temperature),
            enthalpy: value(Property::Enthalpy),
            entropy: value(Property::Entropy),
            density: value(Property::Density),
            quality: value(Property::Quality),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{CriticalPoint, PropertyMap};
    use crate::species::Species;

    /// Returns 1.0 for everything and counts queries.
    #[derive(Default)]
    struct CountingOracle {
        queries: usize,
        requested: Vec<Property>,
    }

    impl PropertyOracle for CountingOracle {
        fn name(&self) -> &str {
            "counting"
        }

        fn query(
            &mut self,
            _mixture: &MixtureComposition,
            outputs: &[Property],
            _spec: StateSpec,
        ) -> FluidResult<PropertyMap> {
            self.queries += 1;
            self.requested.extend_from_slice(outputs);
            Ok(outputs.iter().map(|o| (*o, 1.0)).collect())
        }

        fn pure_critical_point(&mut self, _species: Species) -> FluidResult<CriticalPoint> {
            Err(FluidError::NotSupported { what: "critical" })
        }
    }

    fn point() -> CyclePoint {
        CyclePoint::new(
            &MixtureComposition::pure(Species::Propane),
            StateSpec::PT { p: 5.0, t: 10.0 },
        )
    }

    #[test]
    fn inputs_are_cached_without_query() {
        let mut oracle = CountingOracle::default();
        let mut p = point();
        assert_eq!(p.get(&mut oracle, Property::Pressure).unwrap(), 5.0);
        assert_eq!(p.get(&mut oracle, Property::Temperature).unwrap(), 10.0);
        assert_eq!(oracle.queries, 0);
    }

    #[test]
    fn each_property_resolves_once() {
        let mut oracle = CountingOracle::default();
        let mut p = point();
        p.get(&mut oracle, Property::Enthalpy).unwrap();
        p.get(&mut oracle, Property::Enthalpy).unwrap();
        assert_eq!(oracle.queries, 1);
        assert_eq!(p.cached(Property::Enthalpy), Some(1.0));
    }

    #[test]
    fn snapshot_only_requests_missing_properties() {
        let mut oracle = CountingOracle::default();
        let mut p = point();
        p.get(&mut oracle, Property::Density).unwrap();
        let state = p.snapshot(&mut oracle).unwrap();
        assert_eq!(oracle.queries, 2);
        assert_eq!(state.pressure, 5.0);
        assert!(!oracle.requested[1..].contains(&Property::Density));
        assert!(!oracle.requested.contains(&Property::Pressure));
    }
}
