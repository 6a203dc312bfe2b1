//! CoolProp-based property oracle (feature `coolprop`).

use crate::composition::MixtureComposition;
use crate::error::{FluidError, FluidResult};
use crate::oracle::{OracleFactory, PropertyOracle};
use crate::property::{CriticalPoint, Property, PropertyMap, StateSpec};
use crate::species::Species;
use rfluids::prelude::*;
use rm_core::{bar_to_pa, celsius_to_kelvin, from_kilo, kelvin_to_celsius, pa_to_bar, to_kilo};
use std::collections::HashMap;

/// Mass fraction of the ethylene glycol brine on the cold side.
pub const GLYCOL_MASS_FRACTION: f64 = 0.3;

/// CoolProp backend for blend properties.
///
/// Pure fluids use the Helmholtz EOS, blends use CoolProp's mixture model via
/// a mole-based custom mix. Mixture critical points are not queried directly;
/// the trait default bisection approximates them.
#[derive(Debug, Default)]
pub struct CoolPropOracle {}

impl CoolPropOracle {
    /// Create a new CoolProp oracle.
    pub fn new() -> Self {
        Self {}
    }

    /// Check that the native library loads and answers a trivial query.
    pub fn probe() -> FluidResult<Self> {
        let mut water = Fluid::from(Pure::Water);
        water.critical_temperature().map_err(|e| FluidError::Setup {
            message: format!("CoolProp not usable: {e}"),
        })?;
        Ok(Self::new())
    }

    fn fluid(&self, mixture: &MixtureComposition) -> FluidResult<Fluid<Undefined>> {
        if let Some(species) = mixture.is_pure() {
            return Self::pure_fluid(species);
        }

        let mut components = HashMap::new();
        for c in mixture.active() {
            let pure = c.species.rfluids_pure().ok_or(FluidError::NotSupported {
                what: "species in a CoolProp custom mix",
            })?;
            components.insert(pure, c.fraction);
        }
        let mix = CustomMix::mole_based(components).map_err(|e| FluidError::Backend {
            message: format!("rfluids mixture error for {}: {}", mixture.label(), e),
        })?;
        Fluid::try_from(mix).map_err(|e| FluidError::Backend {
            message: format!("rfluids build error for {}: {}", mixture.label(), e),
        })
    }

    fn pure_fluid(species: Species) -> FluidResult<Fluid<Undefined>> {
        match species.rfluids_pure() {
            Some(pure) => Ok(Fluid::from(pure)),
            None => {
                let brine = BinaryMixKind::MEG
                    .with_fraction(GLYCOL_MASS_FRACTION)
                    .map_err(|e| FluidError::Backend {
                        message: format!("rfluids brine error: {}", e),
                    })?;
                Ok(Fluid::from(brine))
            }
        }
    }

    fn inputs(spec: StateSpec) -> (FluidInput, FluidInput) {
        match spec {
            StateSpec::PT { p, t } => (
                FluidInput::pressure(bar_to_pa(p)),
                FluidInput::temperature(celsius_to_kelvin(t)),
            ),
            StateSpec::PH { p, h } => (
                FluidInput::pressure(bar_to_pa(p)),
                FluidInput::enthalpy(from_kilo(h)),
            ),
            StateSpec::PS { p, s } => (
                FluidInput::pressure(bar_to_pa(p)),
                FluidInput::entropy(from_kilo(s)),
            ),
            StateSpec::PQ { p, q } => (
                FluidInput::pressure(bar_to_pa(p)),
                FluidInput::quality(q),
            ),
            StateSpec::TQ { t, q } => (
                FluidInput::temperature(celsius_to_kelvin(t)),
                FluidInput::quality(q),
            ),
            StateSpec::TH { t, h } => (
                FluidInput::temperature(celsius_to_kelvin(t)),
                FluidInput::enthalpy(from_kilo(h)),
            ),
        }
    }

    fn state(&self, mixture: &MixtureComposition, spec: StateSpec) -> FluidResult<Fluid> {
        let (a, b) = Self::inputs(spec);
        self.fluid(mixture)?
            .in_state(a, b)
            .map_err(|e| FluidError::Backend {
                message: format!("rfluids error for {} at {}: {}", mixture.label(), spec, e),
            })
    }

    /// Quality outside the dome, extrapolated on enthalpy between the
    /// saturated liquid and vapor at the same pressure.
    fn extrapolated_quality(
        &self,
        mixture: &MixtureComposition,
        pressure_bar: f64,
        enthalpy: f64,
    ) -> FluidResult<f64> {
        let h_bubble = self.enthalpy_at(mixture, StateSpec::PQ { p: pressure_bar, q: 0.0 })?;
        let h_dew = self.enthalpy_at(mixture, StateSpec::PQ { p: pressure_bar, q: 1.0 })?;
        if h_dew <= h_bubble {
            return Err(FluidError::NonPhysical {
                what: "dew enthalpy not above bubble enthalpy",
            });
        }
        Ok((enthalpy - h_bubble) / (h_dew - h_bubble))
    }

    fn enthalpy_at(&self, mixture: &MixtureComposition, spec: StateSpec) -> FluidResult<f64> {
        let mut fluid = self.state(mixture, spec)?;
        fluid.enthalpy().map(to_kilo).map_err(backend_output)
    }
}

fn backend_output(e: impl std::fmt::Display) -> FluidError {
    FluidError::Backend {
        message: format!("rfluids output error: {}", e),
    }
}

impl PropertyOracle for CoolPropOracle {
    fn name(&self) -> &str {
        "coolprop"
    }

    fn query(
        &mut self,
        mixture: &MixtureComposition,
        outputs: &[Property],
        spec: StateSpec,
    ) -> FluidResult<PropertyMap> {
        spec.validate()?;
        let mut fluid = self.state(mixture, spec)?;

        let mut values = PropertyMap::with_capacity(outputs.len());
        for &output in outputs {
            let value = match output {
                Property::Temperature => fluid.temperature().map(kelvin_to_celsius),
                Property::Pressure => fluid.pressure().map(pa_to_bar),
                Property::Enthalpy => fluid.enthalpy().map(to_kilo),
                Property::Entropy => fluid.entropy().map(to_kilo),
                Property::Density => fluid.density(),
                Property::SpecificVolume => fluid.specific_volume(),
                Property::Quality => match fluid.quality() {
                    Ok(q) => Ok(q),
                    Err(_) => {
                        let p = fluid.pressure().map(pa_to_bar).map_err(backend_output)?;
                        let h = fluid.enthalpy().map(to_kilo).map_err(backend_output)?;
                        values.insert(output, self.extrapolated_quality(mixture, p, h)?);
                        continue;
                    }
                },
                Property::CriticalTemperature | Property::CriticalPressure => {
                    let cp = self.critical_point(mixture)?;
                    values.insert(
                        output,
                        if output == Property::CriticalTemperature {
                            cp.temperature
                        } else {
                            cp.pressure
                        },
                    );
                    continue;
                }
            };
            values.insert(output, value.map_err(backend_output)?);
        }
        Ok(values)
    }

    fn pure_critical_point(&mut self, species: Species) -> FluidResult<CriticalPoint> {
        let mut fluid = Self::pure_fluid(species)?;
        let temperature = fluid
            .critical_temperature()
            .map(kelvin_to_celsius)
            .map_err(backend_output)?;
        let pressure = fluid
            .critical_pressure()
            .map(pa_to_bar)
            .map_err(backend_output)?;
        Ok(CriticalPoint {
            temperature,
            pressure,
        })
    }
}

/// Builds [`CoolPropOracle`] handles, probing the native library first.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoolPropFactory;

impl OracleFactory for CoolPropFactory {
    fn name(&self) -> &str {
        "coolprop"
    }

    fn create(&self) -> FluidResult<Box<dyn PropertyOracle>> {
        Ok(Box::new(CoolPropOracle::probe()?))
    }
}
