//! Cycle evaluation results.

use crate::boundary::BoundaryConditions;
use rm_fluids::{MixtureComposition, PointState, Species};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a blend could not run the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CycleErrorKind {
    /// Condenser outlet temperature above the critical temperature
    Transcritical,
    /// Compressor discharge not superheated
    TwoPhaseDischarge,
    /// No approach up to the maximum satisfied the pinch limit
    LowPinch,
    /// A ratio had a zero or non-finite denominator
    DivisionByZero,
    /// The property oracle failed or did not converge
    OracleFailure,
    /// The worker's oracle was never initialized
    OracleNotReady,
    /// The worker did not answer within the task timeout
    OracleTimeout,
}

impl CycleErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleErrorKind::Transcritical => "transcritical",
            CycleErrorKind::TwoPhaseDischarge => "two-phase discharge",
            CycleErrorKind::LowPinch => "low pinch",
            CycleErrorKind::DivisionByZero => "division by zero",
            CycleErrorKind::OracleFailure => "oracle failure",
            CycleErrorKind::OracleNotReady => "oracle not ready",
            CycleErrorKind::OracleTimeout => "oracle timeout",
        }
    }
}

impl fmt::Display for CycleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four main cycle states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CyclePoints {
    /// 1: compressor suction (superheated vapor)
    pub suction: PointState,
    /// 2: compressor discharge
    pub discharge: PointState,
    /// 3: condenser outlet (subcooled liquid)
    pub condenser_outlet: PointState,
    /// 4: evaporator inlet after isenthalpic expansion
    pub evaporator_inlet: PointState,
}

/// Saturated states at condensing and evaporating pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaturationPoints {
    pub condensing_liquid: PointState,
    pub condensing_vapor: PointState,
    pub evaporating_liquid: PointState,
    pub evaporating_vapor: PointState,
}

/// Secondary-to-refrigerant ratios on the hot and cold side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowRatios {
    pub hot: f64,
    pub cold: f64,
}

/// Temperature glides [K].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glide {
    /// Dew minus bubble temperature at condensing pressure
    pub condenser: f64,
    /// Dew temperature minus evaporator inlet temperature
    pub evaporator: f64,
}

impl Glide {
    pub fn max(&self) -> f64 {
        self.condenser.max(self.evaporator)
    }
}

/// Everything a successful evaluation reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    /// Condenser approach that satisfied the pinch limit [K]
    pub approach: f64,
    pub points: CyclePoints,
    pub saturation: SaturationPoints,
    /// Heating coefficient of performance
    pub cop: f64,
    /// Volumetric heating capacity [kJ/m³]
    pub vcc: f64,
    pub mass_flow_ratio: FlowRatios,
    pub volume_flow_ratio: FlowRatios,
    /// Condenser pinch [K]
    pub pinch: f64,
    pub glide: Glide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    Success(Box<CycleSummary>),
    Failure(CycleErrorKind),
}

/// Outcome of one (composition, boundary conditions) evaluation.
///
/// A failure carries only its kind; numeric fields are absent rather than
/// partially filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    pub mixture: MixtureComposition,
    pub boundary: BoundaryConditions,
    pub outcome: CycleOutcome,
}

impl CycleResult {
    pub fn success(
        mixture: MixtureComposition,
        boundary: BoundaryConditions,
        summary: CycleSummary,
    ) -> Self {
        Self {
            mixture,
            boundary,
            outcome: CycleOutcome::Success(Box::new(summary)),
        }
    }

    pub fn failure(
        mixture: MixtureComposition,
        boundary: BoundaryConditions,
        kind: CycleErrorKind,
    ) -> Self {
        Self {
            mixture,
            boundary,
            outcome: CycleOutcome::Failure(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Success(_))
    }

    pub fn error(&self) -> Option<CycleErrorKind> {
        match self.outcome {
            CycleOutcome::Failure(kind) => Some(kind),
            CycleOutcome::Success(_) => None,
        }
    }

    pub fn summary(&self) -> Option<&CycleSummary> {
        match &self.outcome {
            CycleOutcome::Success(summary) => Some(summary),
            CycleOutcome::Failure(_) => None,
        }
    }

    pub fn species(&self) -> Vec<Species> {
        self.mixture.species()
    }

    pub fn fractions(&self) -> Vec<f64> {
        self.mixture.fractions()
    }

    pub fn cop(&self) -> Option<f64> {
        self.summary().map(|s| s.cop)
    }

    pub fn vcc(&self) -> Option<f64> {
        self.summary().map(|s| s.vcc)
    }

    /// Compressor discharge temperature [°C].
    pub fn discharge_temperature(&self) -> Option<f64> {
        self.summary().map(|s| s.points.discharge.temperature)
    }

    /// Compressor discharge pressure [bar].
    pub fn discharge_pressure(&self) -> Option<f64> {
        self.summary().map(|s| s.points.discharge.pressure)
    }

    pub fn pinch(&self) -> Option<f64> {
        self.summary().map(|s| s.pinch)
    }

    pub fn max_glide(&self) -> Option<f64> {
        self.summary().map(|s| s.glide.max())
    }
}

impl fmt::Display for CycleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CycleOutcome::Success(s) => write!(
                f,
                "{}: COP {:.3}, VCC {:.0} kJ/m³, T2 {:.1} °C, P2 {:.2} bar, pinch {:.2} K",
                self.mixture.label(),
                s.cop,
                s.vcc,
                s.points.discharge.temperature,
                s.points.discharge.pressure,
                s.pinch
            ),
            CycleOutcome::Failure(kind) => write!(f, "{}: failed ({kind})", self.mixture.label()),
        }
    }
}
