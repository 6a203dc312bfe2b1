//! Property oracle trait and the mixture critical-point approximation.

use crate::composition::MixtureComposition;
use crate::error::{FluidError, FluidResult};
use crate::property::{CriticalPoint, Property, PropertyMap, StateSpec};
use crate::species::Species;
use tracing::trace;

/// Source of thermodynamic properties.
///
/// An oracle handle is owned by exactly one thread; implementations only need
/// to be `Send`. Every call takes exactly two independent inputs.
pub trait PropertyOracle: Send {
    /// Get the oracle name (for debugging/logging).
    fn name(&self) -> &str;

    /// Resolve `outputs` at the state fixed by `spec`.
    ///
    /// The returned map holds every requested property.
    fn query(
        &mut self,
        mixture: &MixtureComposition,
        outputs: &[Property],
        spec: StateSpec,
    ) -> FluidResult<PropertyMap>;

    /// Critical point of a pure species.
    fn pure_critical_point(&mut self, species: Species) -> FluidResult<CriticalPoint>;

    /// Critical point of a blend.
    ///
    /// Pure compositions are answered directly. Blends fall back to
    /// [`critical_point_by_bisection`], an approximation whose accuracy depends on
    /// where the backend stops converging bubble-point flashes.
    fn critical_point(&mut self, mixture: &MixtureComposition) -> FluidResult<CriticalPoint> {
        if let Some(species) = mixture.is_pure() {
            return self.pure_critical_point(species);
        }
        critical_point_by_bisection(self, mixture, CriticalSearch::default())
    }

    /// Resolve a single property.
    fn value(
        &mut self,
        mixture: &MixtureComposition,
        output: Property,
        spec: StateSpec,
    ) -> FluidResult<f64> {
        let values = self.query(mixture, &[output], spec)?;
        values
            .get(&output)
            .copied()
            .ok_or_else(|| FluidError::Backend {
                message: format!("{} did not return {output}", self.name()),
            })
    }

    /// Saturation pressure [bar] at `temperature` [°C]; `quality` 0 gives the
    /// bubble point, 1 the dew point.
    fn sat_pressure(
        &mut self,
        mixture: &MixtureComposition,
        temperature: f64,
        quality: f64,
    ) -> FluidResult<f64> {
        self.value(
            mixture,
            Property::Pressure,
            StateSpec::TQ {
                t: temperature,
                q: quality,
            },
        )
    }

    /// Saturation temperature [°C] at `pressure` [bar].
    fn sat_temperature(
        &mut self,
        mixture: &MixtureComposition,
        pressure: f64,
        quality: f64,
    ) -> FluidResult<f64> {
        self.value(
            mixture,
            Property::Temperature,
            StateSpec::PQ {
                p: pressure,
                q: quality,
            },
        )
    }
}

/// Builds one oracle per worker.
///
/// Creation runs on the worker thread, once, before any task is handled.
pub trait OracleFactory: Send + Sync {
    fn name(&self) -> &str;

    fn create(&self) -> FluidResult<Box<dyn PropertyOracle>>;
}

impl<F> OracleFactory for F
where
    F: Fn() -> FluidResult<Box<dyn PropertyOracle>> + Send + Sync,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn create(&self) -> FluidResult<Box<dyn PropertyOracle>> {
        self()
    }
}

/// Bracket and tolerance of the blend critical-point search [bar].
#[derive(Debug, Clone, Copy)]
pub struct CriticalSearch {
    pub p_low: f64,
    pub p_high: f64,
    pub tolerance: f64,
}

impl Default for CriticalSearch {
    fn default() -> Self {
        Self {
            p_low: 5.0,
            p_high: 1000.0,
            tolerance: 0.1,
        }
    }
}

/// Approximate a blend critical point by bisection on pressure.
///
/// A bubble-point flash (`PQ`, Q=0) is attempted at the bracket midpoint: if
/// it converges the lower bound moves up, otherwise the upper bound moves
/// down. The critical temperature is the last converged bubble temperature.
pub fn critical_point_by_bisection<O: PropertyOracle + ?Sized>(
    oracle: &mut O,
    mixture: &MixtureComposition,
    search: CriticalSearch,
) -> FluidResult<CriticalPoint> {
    if !(search.p_low > 0.0 && search.p_high > search.p_low && search.tolerance > 0.0) {
        return Err(FluidError::InvalidArg {
            what: "critical search bracket",
        });
    }

    let mut p_low = search.p_low;
    let mut p_high = search.p_high;
    let mut last_temperature = None;

    while p_high - p_low > search.tolerance {
        let p_mid = 0.5 * (p_low + p_high);
        match oracle.value(mixture, Property::Temperature, StateSpec::PQ { p: p_mid, q: 0.0 }) {
            Ok(t) if t.is_finite() => {
                last_temperature = Some(t);
                p_low = p_mid;
            }
            _ => p_high = p_mid,
        }
        trace!(p_low, p_high, "critical point bracket");
    }

    let temperature = last_temperature.ok_or(FluidError::ConvergenceFailed {
        what: "blend critical point (no bubble point converged)",
    })?;

    Ok(CriticalPoint {
        temperature,
        pressure: 0.5 * (p_low + p_high),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bubble points converge below 42 bar, temperature rises with pressure.
    struct CappedOracle;

    impl PropertyOracle for CappedOracle {
        fn name(&self) -> &str {
            "capped"
        }

        fn query(
            &mut self,
            _mixture: &MixtureComposition,
            outputs: &[Property],
            spec: StateSpec,
        ) -> FluidResult<PropertyMap> {
            let StateSpec::PQ { p, .. } = spec else {
                return Err(FluidError::NotSupported { what: "spec" });
            };
            if p > 42.0 {
                return Err(FluidError::ConvergenceFailed { what: "flash" });
            }
            Ok(outputs.iter().map(|o| (*o, p * 2.0)).collect())
        }

        fn pure_critical_point(&mut self, _species: Species) -> FluidResult<CriticalPoint> {
            Ok(CriticalPoint {
                temperature: 96.7,
                pressure: 42.5,
            })
        }
    }

    fn blend() -> MixtureComposition {
        MixtureComposition::binary(Species::Propane, Species::NButane, 0.5).unwrap()
    }

    #[test]
    fn bisection_converges_to_flash_limit() {
        let cp = CappedOracle.critical_point(&blend()).unwrap();
        assert!((cp.pressure - 42.0).abs() <= 0.1, "p = {}", cp.pressure);
        assert!(cp.temperature <= 84.0 && cp.temperature > 83.0);
    }

    #[test]
    fn pure_uses_direct_query() {
        let cp = CappedOracle
            .critical_point(&MixtureComposition::pure(Species::Propane))
            .unwrap();
        assert_eq!(cp.pressure, 42.5);
    }

    #[test]
    fn bisection_fails_when_nothing_converges() {
        let search = CriticalSearch {
            p_low: 50.0,
            p_high: 100.0,
            tolerance: 0.1,
        };
        let err = critical_point_by_bisection(&mut CappedOracle, &blend(), search).unwrap_err();
        assert!(matches!(err, FluidError::ConvergenceFailed { .. }));
    }

    #[test]
    fn saturation_helpers_use_quality_specs() {
        let mut oracle = CappedOracle;
        assert_eq!(oracle.sat_temperature(&blend(), 10.0, 0.0).unwrap(), 20.0);
        assert!(oracle.sat_temperature(&blend(), 50.0, 0.0).is_err());
        // TQ inputs are not answered by this oracle
        assert!(oracle.sat_pressure(&blend(), 10.0, 0.0).is_err());
    }

    #[test]
    fn closures_act_as_factories() {
        let factory = || -> FluidResult<Box<dyn PropertyOracle>> { Ok(Box::new(CappedOracle)) };
        let mut oracle = factory.create().unwrap();
        assert_eq!(oracle.name(), "capped");
        assert!(oracle.critical_point(&blend()).is_ok());
    }
}
