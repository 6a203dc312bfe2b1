//! Cycle evaluator with the adaptive condenser approach search.
//!
//! One pass fixes the condenser outlet temperature `t3 = hot_inlet + approach`
//! and resolves the cycle:
//!
//! 1. condensing pressure `Pk` = bubble pressure at `t3 + subcooling_margin`
//! 2. point 3 at (`Pk`, `t3`)
//! 3. point 4 isenthalpic from 3 at `t4 = cold_outlet - evaporator_approach`,
//!    which sets the evaporating pressure `P0`
//! 4. point 1 superheated above the dew temperature at `P0`
//! 5. point 2 from the isentropic discharge enthalpy and the efficiency
//! 6. COP, VCC, saturated states, secondary flow ratios, pinch and glides
//!
//! A pass whose pinch is below the limit is repeated with a larger approach.

use crate::boundary::BoundaryConditions;
use crate::error::CycleError;
use crate::result::{
    CycleErrorKind, CyclePoints, CycleResult, CycleSummary, FlowRatios, Glide, SaturationPoints,
};
use crate::settings::CycleSettings;
use rm_fluids::{CyclePoint, FluidError, MixtureComposition, Property, PropertyOracle, StateSpec};
use thiserror::Error;
use tracing::{debug, trace};

/// Reason a single pass stopped.
#[derive(Error, Debug)]
enum PassFailure {
    #[error("condenser outlet {t3:.2} °C above critical temperature {t_crit:.2} °C")]
    Transcritical { t3: f64, t_crit: f64 },

    #[error("discharge quality {quality:.4} is not superheated")]
    TwoPhaseDischarge { quality: f64 },

    #[error("zero or non-finite denominator in {what}")]
    DivisionByZero { what: &'static str },

    #[error(transparent)]
    Oracle(#[from] FluidError),
}

impl PassFailure {
    fn kind(&self) -> CycleErrorKind {
        match self {
            PassFailure::Transcritical { .. } => CycleErrorKind::Transcritical,
            PassFailure::TwoPhaseDischarge { .. } => CycleErrorKind::TwoPhaseDischarge,
            PassFailure::DivisionByZero { .. } => CycleErrorKind::DivisionByZero,
            PassFailure::Oracle(_) => CycleErrorKind::OracleFailure,
        }
    }
}

fn ratio(num: f64, den: f64, what: &'static str) -> Result<f64, PassFailure> {
    let value = num / den;
    if den == 0.0 || !value.is_finite() {
        return Err(PassFailure::DivisionByZero { what });
    }
    Ok(value)
}

/// A resolved pass whose points are not yet snapshotted.
struct Pass {
    approach: f64,
    points: [CyclePoint; 4],
    saturation: [CyclePoint; 4],
    cop: f64,
    vcc: f64,
    mass_flow_ratio: FlowRatios,
    volume_flow_ratio: FlowRatios,
    pinch: f64,
    glide: Glide,
}

impl Pass {
    fn into_summary(self, oracle: &mut dyn PropertyOracle) -> Result<CycleSummary, PassFailure> {
        let [mut p1, mut p2, mut p3, mut p4] = self.points;
        let [mut k_liq, mut k_vap, mut o_liq, mut o_vap] = self.saturation;
        Ok(CycleSummary {
            approach: self.approach,
            points: CyclePoints {
                suction: p1.snapshot(oracle)?,
                discharge: p2.snapshot(oracle)?,
                condenser_outlet: p3.snapshot(oracle)?,
                evaporator_inlet: p4.snapshot(oracle)?,
            },
            saturation: SaturationPoints {
                condensing_liquid: k_liq.snapshot(oracle)?,
                condensing_vapor: k_vap.snapshot(oracle)?,
                evaporating_liquid: o_liq.snapshot(oracle)?,
                evaporating_vapor: o_vap.snapshot(oracle)?,
            },
            cop: self.cop,
            vcc: self.vcc,
            mass_flow_ratio: self.mass_flow_ratio,
            volume_flow_ratio: self.volume_flow_ratio,
            pinch: self.pinch,
            glide: self.glide,
        })
    }
}

/// Evaluates blends in the heat pump cycle.
///
/// Stateless apart from its settings; the oracle is passed per call so that
/// each worker can reuse its own handle.
#[derive(Debug, Clone, Default)]
pub struct CycleEvaluator {
    settings: CycleSettings,
}

impl CycleEvaluator {
    pub fn new(settings: CycleSettings) -> Result<Self, CycleError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// Evaluate with the adaptive approach search.
    ///
    /// Approaches from `approach_initial` to `approach_max` (inclusive) are
    /// tried in `approach_step` increments until the pinch reaches `min_pinch`.
    /// Any other failure ends the search immediately.
    pub fn evaluate(
        &self,
        oracle: &mut dyn PropertyOracle,
        mixture: &MixtureComposition,
        boundary: &BoundaryConditions,
    ) -> CycleResult {
        let kind = match self.search(oracle, mixture, boundary) {
            Ok(summary) => return CycleResult::success(mixture.clone(), *boundary, summary),
            Err(kind) => kind,
        };
        CycleResult::failure(mixture.clone(), *boundary, kind)
    }

    /// Evaluate at one fixed approach, without the pinch retry.
    ///
    /// A pinch below the limit is reported as `LowPinch`.
    pub fn evaluate_at_approach(
        &self,
        oracle: &mut dyn PropertyOracle,
        mixture: &MixtureComposition,
        boundary: &BoundaryConditions,
        approach: f64,
    ) -> CycleResult {
        match self.single_pass(oracle, mixture, boundary, approach) {
            Ok(summary) => CycleResult::success(mixture.clone(), *boundary, summary),
            Err(kind) => CycleResult::failure(mixture.clone(), *boundary, kind),
        }
    }

    fn single_pass(
        &self,
        oracle: &mut dyn PropertyOracle,
        mixture: &MixtureComposition,
        boundary: &BoundaryConditions,
        approach: f64,
    ) -> Result<CycleSummary, CycleErrorKind> {
        let t_crit = self
            .critical_temperature(oracle, mixture)
            .map_err(|f| self.report(mixture, &f))?;
        let pass = self
            .run_pass(oracle, mixture, boundary, t_crit, approach)
            .map_err(|f| self.report(mixture, &f))?;
        if pass.pinch < self.settings.min_pinch {
            return Err(CycleErrorKind::LowPinch);
        }
        pass.into_summary(oracle)
            .map_err(|f| self.report(mixture, &f))
    }

    fn search(
        &self,
        oracle: &mut dyn PropertyOracle,
        mixture: &MixtureComposition,
        boundary: &BoundaryConditions,
    ) -> Result<CycleSummary, CycleErrorKind> {
        let t_crit = self
            .critical_temperature(oracle, mixture)
            .map_err(|f| self.report(mixture, &f))?;

        for approach in self.settings.approach_schedule() {
            let pass = self
                .run_pass(oracle, mixture, boundary, t_crit, approach)
                .map_err(|f| self.report(mixture, &f))?;
            if pass.pinch >= self.settings.min_pinch {
                return pass
                    .into_summary(oracle)
                    .map_err(|f| self.report(mixture, &f));
            }
            debug!(
                blend = %mixture.label(),
                approach,
                pinch = pass.pinch,
                "pinch below limit, raising approach"
            );
        }

        debug!(blend = %mixture.label(), "no approach satisfied the pinch limit");
        Err(CycleErrorKind::LowPinch)
    }

    fn report(&self, mixture: &MixtureComposition, failure: &PassFailure) -> CycleErrorKind {
        debug!(blend = %mixture.label(), reason = %failure, "cycle evaluation failed");
        failure.kind()
    }

    fn critical_temperature(
        &self,
        oracle: &mut dyn PropertyOracle,
        mixture: &MixtureComposition,
    ) -> Result<f64, PassFailure> {
        Ok(oracle.critical_point(mixture)?.temperature)
    }

    fn run_pass(
        &self,
        oracle: &mut dyn PropertyOracle,
        mixture: &MixtureComposition,
        boundary: &BoundaryConditions,
        t_crit: f64,
        approach: f64,
    ) -> Result<Pass, PassFailure> {
        let s = &self.settings;

        let t3 = boundary.hot_inlet + approach;
        if t3 > t_crit {
            return Err(PassFailure::Transcritical { t3, t_crit });
        }

        let p_k = oracle.sat_pressure(mixture, t3 + s.subcooling_margin, 0.0)?;
        let mut p3 = CyclePoint::new(mixture, StateSpec::PT { p: p_k, t: t3 });
        p3.resolve(oracle, &[Property::Enthalpy, Property::Density])?;
        let h3 = p3.get(oracle, Property::Enthalpy)?;
        let d3 = p3.get(oracle, Property::Density)?;

        let t4 = boundary.cold_outlet - s.evaporator_approach;
        let mut p4 = CyclePoint::new(mixture, StateSpec::TH { t: t4, h: h3 });
        let p_0 = p4.get(oracle, Property::Pressure)?;
        let h4 = h3;

        let t_dew_0 = oracle.sat_temperature(mixture, p_0, 1.0)?;
        let mut p1 = CyclePoint::new(
            mixture,
            StateSpec::PT {
                p: p_0,
                t: t_dew_0 + s.superheat,
            },
        );
        p1.resolve(
            oracle,
            &[Property::Enthalpy, Property::Entropy, Property::SpecificVolume],
        )?;
        let h1 = p1.get(oracle, Property::Enthalpy)?;
        let s1 = p1.get(oracle, Property::Entropy)?;
        let v1 = p1.get(oracle, Property::SpecificVolume)?;

        let h2s = oracle.value(mixture, Property::Enthalpy, StateSpec::PS { p: p_k, s: s1 })?;
        let h2 = h1 + (h2s - h1) / s.isentropic_efficiency;
        let mut p2 = CyclePoint::new(mixture, StateSpec::PH { p: p_k, h: h2 });
        p2.resolve(oracle, &[Property::Quality, Property::Density])?;
        let q2 = p2.get(oracle, Property::Quality)?;
        if q2 <= 1.0 {
            return Err(PassFailure::TwoPhaseDischarge { quality: q2 });
        }
        let d2 = p2.get(oracle, Property::Density)?;

        let work = h2 - h1;
        let cop = ratio(h2 - h3, work, "COP")?;
        let vcc = ratio(work, v1, "volumetric capacity")?;

        let saturated = |p: f64, q: f64| CyclePoint::new(mixture, StateSpec::PQ { p, q });
        let mut k_liq = saturated(p_k, 0.0);
        let mut k_vap = saturated(p_k, 1.0);
        let o_liq = saturated(p_0, 0.0);
        let mut o_vap = saturated(p_0, 1.0);
        k_vap.resolve(oracle, &[Property::Temperature, Property::Enthalpy])?;
        let t_k_vap = k_vap.get(oracle, Property::Temperature)?;
        let h_k_vap = k_vap.get(oracle, Property::Enthalpy)?;
        let t_k_liq = k_liq.get(oracle, Property::Temperature)?;
        let t_o_vap = o_vap.get(oracle, Property::Temperature)?;
        let t4_actual = p4.get(oracle, Property::Temperature)?;

        let hot = MixtureComposition::pure(s.secondary.hot);
        let cold = MixtureComposition::pure(s.secondary.cold);
        let p_sec = s.secondary.pressure;
        let secondary =
            |fluid: &MixtureComposition, t: f64| CyclePoint::new(fluid, StateSpec::PT { p: p_sec, t });
        let mut hw_in = secondary(&hot, boundary.hot_inlet);
        let mut hw_out = secondary(&hot, boundary.hot_outlet);
        let mut cw_in = secondary(&cold, boundary.cold_inlet);
        let mut cw_out = secondary(&cold, boundary.cold_outlet);
        hw_in.resolve(oracle, &[Property::Enthalpy, Property::Density])?;
        cw_in.resolve(oracle, &[Property::Enthalpy, Property::Density])?;
        let h_hw_in = hw_in.get(oracle, Property::Enthalpy)?;
        let d_hw_in = hw_in.get(oracle, Property::Density)?;
        let h_hw_out = hw_out.get(oracle, Property::Enthalpy)?;
        let h_cw_in = cw_in.get(oracle, Property::Enthalpy)?;
        let d_cw_in = cw_in.get(oracle, Property::Density)?;
        let h_cw_out = cw_out.get(oracle, Property::Enthalpy)?;

        let m_hot = ratio(h2 - h3, h_hw_out - h_hw_in, "hot-side mass ratio")?;
        let m_cold = ratio(h1 - h4, h_cw_in - h_cw_out, "cold-side mass ratio")?;
        let v_hot = ratio(m_hot * d2, d_hw_in, "hot-side volume ratio")?;
        let v_cold = ratio(m_cold * d3, d_cw_in, "cold-side volume ratio")?;

        // Water enthalpy where the refrigerant reaches its dew point.
        let h_w = h_hw_out - ratio(h2 - h_k_vap, m_hot, "pinch water enthalpy")?;
        let t_w = oracle.value(&hot, Property::Temperature, StateSpec::PH { p: p_sec, h: h_w })?;
        let pinch = t_k_vap - t_w;

        trace!(
            blend = %mixture.label(),
            approach, p_k, p_0, h1, h2, h3, cop, vcc, pinch,
            "cycle pass"
        );

        Ok(Pass {
            approach,
            points: [p1, p2, p3, p4],
            saturation: [k_liq, k_vap, o_liq, o_vap],
            cop,
            vcc,
            mass_flow_ratio: FlowRatios {
                hot: m_hot,
                cold: m_cold,
            },
            volume_flow_ratio: FlowRatios {
                hot: v_hot,
                cold: v_cold,
            },
            pinch,
            glide: Glide {
                condenser: t_k_vap - t_k_liq,
                evaporator: t_o_vap - t4_actual,
            },
        })
    }
}
