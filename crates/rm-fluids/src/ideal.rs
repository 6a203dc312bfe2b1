//! Ideal-solution blend surrogate.
//!
//! Vapor pressures follow the Wilson correlation, phase split follows Raoult's
//! law (Rachford-Rice flash), liquids have constant heat capacity and density,
//! vapors are ideal gases. Latent heat comes from the slope of the Wilson
//! curve, so the Clausius-Clapeyron relation holds at the reference state.
//!
//! The model is coarse next to a reference equation of state. It still gives
//! plausible saturation pressures, glide for zeotropic blends and a
//! superheated discharge after compression, and it is deterministic.
//!
//! Reference state: saturated liquid at 0 °C has h = 0 and s = 0 per component.

use crate::composition::MixtureComposition;
use crate::error::{FluidError, FluidResult};
use crate::oracle::{OracleFactory, PropertyOracle};
use crate::property::{CriticalPoint, Property, PropertyMap, StateSpec};
use crate::species::Species;
use rm_core::{KELVIN_OFFSET, celsius_to_kelvin, kelvin_to_celsius};

/// Universal gas constant [kJ/(kmol·K)].
const R: f64 = 8.314_462_618;
const T_REF_K: f64 = KELVIN_OFFSET;
const WILSON: f64 = 5.373;

// Temperature search bounds [K]
const T_MIN_K: f64 = 120.0;
const T_MAX_K: f64 = 900.0;
const MAX_ITER: usize = 200;

/// Ideal-solution property oracle.
#[derive(Debug, Clone, Default)]
pub struct IdealMixtureOracle {
    failing: Vec<Species>,
}

impl IdealMixtureOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// An oracle that refuses any blend containing one of `species`.
    ///
    /// Used to engineer solver failures in tests.
    pub fn with_failing(species: impl IntoIterator<Item = Species>) -> Self {
        Self {
            failing: species.into_iter().collect(),
        }
    }

    fn check_supported(&self, mixture: &MixtureComposition) -> FluidResult<()> {
        if let Some(c) = mixture.active().find(|c| self.failing.contains(&c.species)) {
            return Err(FluidError::Backend {
                message: format!("surrogate has no data for {}", c.species),
            });
        }
        Ok(())
    }
}

impl PropertyOracle for IdealMixtureOracle {
    fn name(&self) -> &str {
        "ideal-mixture"
    }

    fn query(
        &mut self,
        mixture: &MixtureComposition,
        outputs: &[Property],
        spec: StateSpec,
    ) -> FluidResult<PropertyMap> {
        spec.validate()?;
        self.check_supported(mixture)?;

        let blend = Blend::new(mixture)?;
        let eq = blend.solve(spec)?;

        let mut values = PropertyMap::with_capacity(outputs.len());
        for &output in outputs {
            let value = match output {
                Property::Temperature => kelvin_to_celsius(eq.t),
                Property::Pressure => eq.p,
                Property::Enthalpy => blend.enthalpy(&eq),
                Property::Entropy => blend.entropy(&eq),
                Property::Density => 1.0 / blend.volume(&eq),
                Property::SpecificVolume => blend.volume(&eq),
                Property::Quality => blend.quality(&eq)?,
                Property::CriticalTemperature => kelvin_to_celsius(blend.pseudo_critical().0),
                Property::CriticalPressure => blend.pseudo_critical().1,
            };
            if !value.is_finite() {
                return Err(FluidError::NonPhysical {
                    what: "surrogate produced a non-finite property",
                });
            }
            values.insert(output, value);
        }
        Ok(values)
    }

    fn pure_critical_point(&mut self, species: Species) -> FluidResult<CriticalPoint> {
        self.critical_point(&MixtureComposition::pure(species))
    }

    /// Kay's rule pseudo-critical point.
    fn critical_point(&mut self, mixture: &MixtureComposition) -> FluidResult<CriticalPoint> {
        self.check_supported(mixture)?;
        let (tc, pc) = Blend::new(mixture)?.pseudo_critical();
        Ok(CriticalPoint {
            temperature: kelvin_to_celsius(tc),
            pressure: pc,
        })
    }
}

/// Builds [`IdealMixtureOracle`] handles.
#[derive(Debug, Clone, Default)]
pub struct IdealOracleFactory {
    pub failing: Vec<Species>,
}

impl OracleFactory for IdealOracleFactory {
    fn name(&self) -> &str {
        "ideal-mixture"
    }

    fn create(&self) -> FluidResult<Box<dyn PropertyOracle>> {
        Ok(Box::new(IdealMixtureOracle::with_failing(
            self.failing.iter().copied(),
        )))
    }
}

/// One active component, molar basis.
#[derive(Debug, Clone, Copy)]
struct Comp {
    z: f64,
    tc: f64,
    pc: f64,
    /// Wilson slope 5.373(1+ω)
    a: f64,
    m: f64,
    cp_liquid: f64,
    cp_vapor: f64,
    v_liquid: f64,
}

impl Comp {
    fn new(species: Species, z: f64) -> Self {
        let p = species.surrogate();
        Self {
            z,
            tc: p.tc_k,
            pc: p.pc_bar,
            a: WILSON * (1.0 + p.omega),
            m: p.molar_mass,
            cp_liquid: p.cp_liquid * p.molar_mass,
            cp_vapor: p.cp_vapor * p.molar_mass,
            v_liquid: p.molar_mass / p.rho_liquid,
        }
    }

    fn psat(&self, t: f64) -> f64 {
        self.pc * (self.a * (1.0 - self.tc / t)).exp()
    }

    fn latent(&self) -> f64 {
        R * self.a * self.tc
    }

    fn h_liquid(&self, t: f64) -> f64 {
        self.cp_liquid * (t - T_REF_K)
    }

    fn h_vapor(&self, t: f64) -> f64 {
        self.latent() + self.cp_vapor * (t - T_REF_K)
    }

    fn s_liquid(&self, t: f64) -> f64 {
        self.cp_liquid * (t / T_REF_K).ln()
    }

    fn s_vapor(&self, t: f64, partial_p: f64) -> f64 {
        self.latent() / T_REF_K + self.cp_vapor * (t / T_REF_K).ln()
            - R * (partial_p / self.psat(T_REF_K)).ln()
    }
}

/// Phase-equilibrium state: temperature [K], pressure [bar], molar vapor
/// fraction and phase compositions.
#[derive(Debug, Clone)]
struct Equilibrium {
    t: f64,
    p: f64,
    beta: f64,
    x: Vec<f64>,
    y: Vec<f64>,
}

struct Blend {
    comps: Vec<Comp>,
    molar_mass: f64,
}

impl Blend {
    fn new(mixture: &MixtureComposition) -> FluidResult<Self> {
        let comps: Vec<Comp> = mixture
            .active()
            .map(|c| Comp::new(c.species, c.fraction))
            .collect();
        if comps.is_empty() {
            return Err(FluidError::InvalidArg {
                what: "blend has no active component",
            });
        }
        let molar_mass = comps.iter().map(|c| c.z * c.m).sum();
        Ok(Self { comps, molar_mass })
    }

    fn is_pure(&self) -> bool {
        self.comps.len() == 1
    }

    fn feed(&self) -> Vec<f64> {
        self.comps.iter().map(|c| c.z).collect()
    }

    fn pseudo_critical(&self) -> (f64, f64) {
        self.comps
            .iter()
            .fold((0.0, 0.0), |(t, p), c| (t + c.z * c.tc, p + c.z * c.pc))
    }

    fn bubble_pressure(&self, t: f64) -> f64 {
        self.comps.iter().map(|c| c.z * c.psat(t)).sum()
    }

    fn dew_pressure(&self, t: f64) -> f64 {
        1.0 / self.comps.iter().map(|c| c.z / c.psat(t)).sum::<f64>()
    }

    fn bubble_temperature(&self, p: f64) -> FluidResult<f64> {
        bisect(T_MIN_K, T_MAX_K, p, "bubble temperature", |t| {
            self.bubble_pressure(t)
        })
    }

    fn dew_temperature(&self, p: f64) -> FluidResult<f64> {
        bisect(T_MIN_K, T_MAX_K, p, "dew temperature", |t| {
            self.dew_pressure(t)
        })
    }

    fn single_phase(&self, t: f64, p: f64, beta: f64) -> Equilibrium {
        Equilibrium {
            t,
            p,
            beta,
            x: self.feed(),
            y: self.feed(),
        }
    }

    /// Saturated liquid with its incipient vapor.
    fn bubble_state(&self, t: f64, p: f64) -> Equilibrium {
        let y = normalized(self.comps.iter().map(|c| c.z * c.psat(t) / p));
        Equilibrium {
            t,
            p,
            beta: 0.0,
            x: self.feed(),
            y,
        }
    }

    /// Saturated vapor with its incipient liquid.
    fn dew_state(&self, t: f64, p: f64) -> Equilibrium {
        let x = normalized(self.comps.iter().map(|c| c.z * p / c.psat(t)));
        Equilibrium {
            t,
            p,
            beta: 1.0,
            x,
            y: self.feed(),
        }
    }

    /// Isothermal flash at (T, P).
    fn flash(&self, t: f64, p: f64) -> Equilibrium {
        let k: Vec<f64> = self.comps.iter().map(|c| c.psat(t) / p).collect();
        let bubble_sum: f64 = self.comps.iter().zip(&k).map(|(c, k)| c.z * k).sum();
        if bubble_sum <= 1.0 {
            return self.single_phase(t, p, 0.0);
        }
        let dew_sum: f64 = self.comps.iter().zip(&k).map(|(c, k)| c.z / k).sum();
        if dew_sum <= 1.0 {
            return self.single_phase(t, p, 1.0);
        }

        // Rachford-Rice residual decreases monotonically in beta.
        let residual = |beta: f64| -> f64 {
            self.comps
                .iter()
                .zip(&k)
                .map(|(c, k)| c.z * (k - 1.0) / (1.0 + beta * (k - 1.0)))
                .sum()
        };
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        for _ in 0..MAX_ITER {
            let mid = 0.5 * (lo + hi);
            if residual(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo < 1e-14 {
                break;
            }
        }
        let beta = 0.5 * (lo + hi);
        let x = normalized(
            self.comps
                .iter()
                .zip(&k)
                .map(|(c, k)| c.z / (1.0 + beta * (k - 1.0))),
        );
        let y = normalized(x.iter().zip(&k).map(|(x, k)| x * k));
        Equilibrium { t, p, beta, x, y }
    }

    fn solve(&self, spec: StateSpec) -> FluidResult<Equilibrium> {
        match spec {
            StateSpec::PT { p, t } => Ok(self.flash(celsius_to_kelvin(t), p)),
            StateSpec::PQ { p, q } => self.at_pq(p, q),
            StateSpec::TQ { t, q } => self.at_tq(celsius_to_kelvin(t), q),
            StateSpec::PH { p, h } => self.on_isobar(p, h, Self::enthalpy),
            StateSpec::PS { p, s } => self.on_isobar(p, s, Self::entropy),
            StateSpec::TH { t, h } => self.at_th(celsius_to_kelvin(t), h),
        }
    }

    fn at_pq(&self, p: f64, q: f64) -> FluidResult<Equilibrium> {
        if self.is_pure() {
            let t = self.bubble_temperature(p)?;
            return Ok(self.single_phase(t, p, q));
        }
        let t_bubble = self.bubble_temperature(p)?;
        if q <= 0.0 {
            return Ok(self.bubble_state(t_bubble, p));
        }
        let t_dew = self.dew_temperature(p)?;
        if q >= 1.0 {
            return Ok(self.dew_state(t_dew, p));
        }
        let t = bisect(t_bubble, t_dew, q, "saturation temperature", |t| {
            self.mass_quality(&self.flash(t, p))
        })?;
        Ok(self.flash(t, p))
    }

    fn at_tq(&self, t: f64, q: f64) -> FluidResult<Equilibrium> {
        if self.is_pure() {
            let p = self.bubble_pressure(t);
            return Ok(self.single_phase(t, p, q));
        }
        let p_bubble = self.bubble_pressure(t);
        if q <= 0.0 {
            return Ok(self.bubble_state(t, p_bubble));
        }
        let p_dew = self.dew_pressure(t);
        if q >= 1.0 {
            return Ok(self.dew_state(t, p_dew));
        }
        let p = bisect(p_dew, p_bubble, q, "saturation pressure", |p| {
            self.mass_quality(&self.flash(t, p))
        })?;
        Ok(self.flash(t, p))
    }

    /// Solve for temperature at fixed pressure such that `f` hits `target`.
    ///
    /// Pure fluids split the search at the saturation temperature, where the
    /// two-phase state is linear in the vapor fraction.
    fn on_isobar(
        &self,
        p: f64,
        target: f64,
        f: fn(&Self, &Equilibrium) -> f64,
    ) -> FluidResult<Equilibrium> {
        if !self.is_pure() {
            let t = bisect(T_MIN_K, T_MAX_K, target, "temperature on isobar", |t| {
                f(self, &self.flash(t, p))
            })?;
            return Ok(self.flash(t, p));
        }

        let t_sat = self.bubble_temperature(p)?;
        let f_liquid = f(self, &self.single_phase(t_sat, p, 0.0));
        let f_vapor = f(self, &self.single_phase(t_sat, p, 1.0));
        if (f_liquid..=f_vapor).contains(&target) {
            let beta = (target - f_liquid) / (f_vapor - f_liquid);
            return Ok(self.single_phase(t_sat, p, beta));
        }
        let (lo, hi) = if target < f_liquid {
            (T_MIN_K, t_sat)
        } else {
            (t_sat, T_MAX_K)
        };
        let t = bisect(lo, hi, target, "temperature on isobar", |t| {
            f(self, &self.flash(t, p))
        })?;
        Ok(self.flash(t, p))
    }

    /// Isothermal enthalpy only fixes pressure inside the two-phase region.
    fn at_th(&self, t: f64, h: f64) -> FluidResult<Equilibrium> {
        if self.is_pure() {
            let p = self.bubble_pressure(t);
            let h_liquid = self.enthalpy(&self.single_phase(t, p, 0.0));
            let h_vapor = self.enthalpy(&self.single_phase(t, p, 1.0));
            if !(h_liquid..=h_vapor).contains(&h) {
                return Err(FluidError::OutOfRange {
                    what: "enthalpy outside two-phase range at given temperature",
                });
            }
            let beta = (h - h_liquid) / (h_vapor - h_liquid);
            return Ok(self.single_phase(t, p, beta));
        }

        let p_bubble = self.bubble_pressure(t);
        let p_dew = self.dew_pressure(t);
        let p = bisect(p_dew, p_bubble, h, "pressure on isotherm", |p| {
            self.enthalpy(&self.flash(t, p))
        })?;
        Ok(self.flash(t, p))
    }

    /// Specific enthalpy [kJ/kg].
    fn enthalpy(&self, eq: &Equilibrium) -> f64 {
        let liquid: f64 = self
            .comps
            .iter()
            .zip(&eq.x)
            .map(|(c, x)| x * c.h_liquid(eq.t))
            .sum();
        let vapor: f64 = self
            .comps
            .iter()
            .zip(&eq.y)
            .map(|(c, y)| y * c.h_vapor(eq.t))
            .sum();
        ((1.0 - eq.beta) * liquid + eq.beta * vapor) / self.molar_mass
    }

    /// Specific entropy [kJ/(kg·K)], including ideal mixing.
    fn entropy(&self, eq: &Equilibrium) -> f64 {
        let liquid: f64 = self
            .comps
            .iter()
            .zip(&eq.x)
            .filter(|(_, x)| **x > 0.0)
            .map(|(c, x)| x * (c.s_liquid(eq.t) - R * x.ln()))
            .sum();
        let vapor: f64 = self
            .comps
            .iter()
            .zip(&eq.y)
            .filter(|(_, y)| **y > 0.0)
            .map(|(c, y)| y * c.s_vapor(eq.t, y * eq.p))
            .sum();
        ((1.0 - eq.beta) * liquid + eq.beta * vapor) / self.molar_mass
    }

    /// Specific volume [m³/kg].
    fn volume(&self, eq: &Equilibrium) -> f64 {
        let liquid: f64 = self
            .comps
            .iter()
            .zip(&eq.x)
            .map(|(c, x)| x * c.v_liquid)
            .sum();
        // bar -> kPa so that R*T/P is in m³/kmol
        let vapor = R * eq.t / (100.0 * eq.p);
        ((1.0 - eq.beta) * liquid + eq.beta * vapor) / self.molar_mass
    }

    fn mass_quality(&self, eq: &Equilibrium) -> f64 {
        let vapor_molar_mass: f64 = self.comps.iter().zip(&eq.y).map(|(c, y)| y * c.m).sum();
        eq.beta * vapor_molar_mass / self.molar_mass
    }

    /// Mass quality; single-phase states extrapolate on enthalpy between the
    /// bubble and dew points at the same pressure.
    fn quality(&self, eq: &Equilibrium) -> FluidResult<f64> {
        if eq.beta > 0.0 && eq.beta < 1.0 {
            return Ok(self.mass_quality(eq));
        }
        let (h_bubble, h_dew) = if self.is_pure() {
            let t_sat = self.bubble_temperature(eq.p)?;
            (
                self.enthalpy(&self.single_phase(t_sat, eq.p, 0.0)),
                self.enthalpy(&self.single_phase(t_sat, eq.p, 1.0)),
            )
        } else {
            let t_bubble = self.bubble_temperature(eq.p)?;
            let t_dew = self.dew_temperature(eq.p)?;
            (
                self.enthalpy(&self.bubble_state(t_bubble, eq.p)),
                self.enthalpy(&self.dew_state(t_dew, eq.p)),
            )
        };
        if h_dew <= h_bubble {
            return Err(FluidError::NonPhysical {
                what: "dew enthalpy not above bubble enthalpy",
            });
        }
        Ok((self.enthalpy(eq) - h_bubble) / (h_dew - h_bubble))
    }
}

fn normalized(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let values: Vec<f64> = values.collect();
    let sum: f64 = values.iter().sum();
    values.into_iter().map(|v| v / sum).collect()
}

/// Bisection of a monotonic `f` on `[lo, hi]` for `f(x) = target`.
fn bisect(
    lo: f64,
    hi: f64,
    target: f64,
    what: &'static str,
    mut f: impl FnMut(f64) -> f64,
) -> FluidResult<f64> {
    let f_lo = f(lo);
    let f_hi = f(hi);
    let increasing = f_hi >= f_lo;
    let (min, max) = if increasing { (f_lo, f_hi) } else { (f_hi, f_lo) };
    if !(min..=max).contains(&target) {
        return Err(FluidError::OutOfRange { what });
    }

    let (mut lo, mut hi) = (lo, hi);
    for _ in 0..MAX_ITER {
        let mid = 0.5 * (lo + hi);
        let value = f(mid);
        if !value.is_finite() {
            return Err(FluidError::ConvergenceFailed { what });
        }
        if (value < target) == increasing {
            lo = mid;
        } else {
            hi = mid;
        }
        if (hi - lo).abs() <= 1e-12 * mid.abs().max(1.0) {
            break;
        }
    }
    Ok(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle() -> IdealMixtureOracle {
        IdealMixtureOracle::new()
    }

    fn propane() -> MixtureComposition {
        MixtureComposition::pure(Species::Propane)
    }

    fn propane_butane() -> MixtureComposition {
        MixtureComposition::binary(Species::Propane, Species::NButane, 0.5).unwrap()
    }

    #[test]
    fn propane_saturation_pressure_is_plausible() {
        // Reference data: ~18.8 bar at 54.5 °C
        let p = oracle()
            .value(&propane(), Property::Pressure, StateSpec::TQ { t: 54.5, q: 0.0 })
            .unwrap();
        assert!(p > 17.0 && p < 21.0, "p = {p}");
    }

    #[test]
    fn pure_bubble_and_dew_coincide() {
        let mut o = oracle();
        let t0 = o
            .value(&propane(), Property::Temperature, StateSpec::PQ { p: 5.0, q: 0.0 })
            .unwrap();
        let t1 = o
            .value(&propane(), Property::Temperature, StateSpec::PQ { p: 5.0, q: 1.0 })
            .unwrap();
        assert!((t0 - t1).abs() < 1e-9);
    }

    #[test]
    fn zeotropic_blend_has_glide() {
        let mut o = oracle();
        let mix = propane_butane();
        let t_bubble = o
            .value(&mix, Property::Temperature, StateSpec::PQ { p: 10.0, q: 0.0 })
            .unwrap();
        let t_dew = o
            .value(&mix, Property::Temperature, StateSpec::PQ { p: 10.0, q: 1.0 })
            .unwrap();
        assert!(t_dew - t_bubble > 1.0, "glide = {}", t_dew - t_bubble);
    }

    #[test]
    fn ph_inverts_pt() {
        let mut o = oracle();
        for mix in [propane(), propane_butane()] {
            for (p, t) in [(2.0, 40.0), (20.0, 10.0), (20.0, 90.0)] {
                let h = o
                    .value(&mix, Property::Enthalpy, StateSpec::PT { p, t })
                    .unwrap();
                let back = o
                    .value(&mix, Property::Temperature, StateSpec::PH { p, h })
                    .unwrap();
                assert!((back - t).abs() < 1e-6, "{} at ({p}, {t}): {back}", mix.label());
            }
        }
    }

    #[test]
    fn quality_extrapolates_outside_dome() {
        let mut o = oracle();
        let sub = o
            .value(&propane(), Property::Quality, StateSpec::PT { p: 20.0, t: 20.0 })
            .unwrap();
        let sup = o
            .value(&propane(), Property::Quality, StateSpec::PT { p: 2.0, t: 40.0 })
            .unwrap();
        assert!(sub < 0.0);
        assert!(sup > 1.0);
    }

    #[test]
    fn pure_two_phase_enthalpy_gives_fractional_quality() {
        let mut o = oracle();
        let p = 5.0;
        let h_l = o
            .value(&propane(), Property::Enthalpy, StateSpec::PQ { p, q: 0.0 })
            .unwrap();
        let h_v = o
            .value(&propane(), Property::Enthalpy, StateSpec::PQ { p, q: 1.0 })
            .unwrap();
        let q = o
            .value(
                &propane(),
                Property::Quality,
                StateSpec::PH {
                    p,
                    h: 0.25 * h_l + 0.75 * h_v,
                },
            )
            .unwrap();
        assert!((q - 0.75).abs() < 1e-9);
    }

    #[test]
    fn isothermal_enthalpy_sets_two_phase_pressure() {
        let mut o = oracle();
        let mix = propane_butane();
        let h_liquid = o
            .value(&mix, Property::Enthalpy, StateSpec::PT { p: 30.0, t: 40.0 })
            .unwrap();
        let p = o
            .value(&mix, Property::Pressure, StateSpec::TH { t: -5.0, h: h_liquid })
            .unwrap();
        let p_bubble = o
            .value(&mix, Property::Pressure, StateSpec::TQ { t: -5.0, q: 0.0 })
            .unwrap();
        let p_dew = o
            .value(&mix, Property::Pressure, StateSpec::TQ { t: -5.0, q: 1.0 })
            .unwrap();
        assert!(p > p_dew && p < p_bubble, "{p_dew} < {p} < {p_bubble}");
    }

    #[test]
    fn water_is_liquid_at_one_bar() {
        let water = MixtureComposition::pure(Species::Water);
        let rho = oracle()
            .value(&water, Property::Density, StateSpec::PT { p: 1.0, t: 50.0 })
            .unwrap();
        assert!((rho - 997.0).abs() < 1.0);
    }

    #[test]
    fn kay_rule_critical_point() {
        let cp = oracle()
            .critical_point(&MixtureComposition::pure(Species::CO2))
            .unwrap();
        assert!((cp.temperature - 30.98).abs() < 0.01);
        assert!((cp.pressure - 73.77).abs() < 1e-9);

        let mix = propane_butane();
        let cp = oracle().critical_point(&mix).unwrap();
        assert!(cp.temperature > 96.0 && cp.temperature < 152.0);
    }

    #[test]
    fn failing_species_is_reported_as_backend_error() {
        let mut o = IdealMixtureOracle::with_failing([Species::NButane]);
        let err = o
            .value(&propane_butane(), Property::Enthalpy, StateSpec::PT { p: 5.0, t: 20.0 })
            .unwrap_err();
        assert!(matches!(err, FluidError::Backend { .. }));
        // Zero fraction of the failing species is not an active component.
        let endpoint = MixtureComposition::binary(Species::Propane, Species::NButane, 1.0).unwrap();
        assert!(
            o.value(&endpoint, Property::Enthalpy, StateSpec::PT { p: 5.0, t: 20.0 })
                .is_ok()
        );
    }

    #[test]
    fn identical_queries_are_bit_identical() {
        let mix = propane_butane();
        let spec = StateSpec::PS { p: 15.0, s: 2.1 };
        let a = oracle().value(&mix, Property::Temperature, spec);
        let b = oracle().value(&mix, Property::Temperature, spec);
        assert_eq!(a, b);
    }

    #[test]
    fn factory_builds_independent_handles() {
        let factory = IdealOracleFactory {
            failing: vec![Species::Toluene],
        };
        let mut handle = factory.create().unwrap();
        assert_eq!(handle.name(), "ideal-mixture");
        assert!(
            handle
                .critical_point(&MixtureComposition::pure(Species::Toluene))
                .is_err()
        );
    }
}
