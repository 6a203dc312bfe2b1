//! Baseline reference values.

use crate::error::{SearchError, SearchResult};
use rm_cycle::{BoundaryConditions, CycleErrorKind, CycleEvaluator, CycleResult};
use rm_fluids::{MixtureComposition, PropertyOracle, Species};
use serde::{Deserialize, Serialize};
use tracing::info;

/// VCC band and COP of the pure baseline for one set of boundary conditions.
///
/// Computed once and shared read-only with every filter call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceValues {
    pub vcc_min: f64,
    pub vcc_max: f64,
    pub baseline_cop: f64,
}

impl ReferenceValues {
    /// Band of `±band` around `baseline_vcc`.
    pub fn from_baseline(baseline_vcc: f64, baseline_cop: f64, band: f64) -> Self {
        Self {
            vcc_min: (1.0 - band) * baseline_vcc,
            vcc_max: (1.0 + band) * baseline_vcc,
            baseline_cop,
        }
    }

    /// Evaluate the pure baseline and derive the reference values from it.
    ///
    /// Also returns the baseline result itself for reporting.
    pub fn compute(
        evaluator: &CycleEvaluator,
        oracle: &mut dyn PropertyOracle,
        baseline: Species,
        boundary: &BoundaryConditions,
        band: f64,
    ) -> SearchResult<(Self, CycleResult)> {
        let result = evaluator.evaluate(oracle, &MixtureComposition::pure(baseline), boundary);
        let (Some(cop), Some(vcc)) = (result.cop(), result.vcc()) else {
            return Err(SearchError::Baseline {
                fluid: baseline.key().to_string(),
                kind: result.error().unwrap_or(CycleErrorKind::OracleFailure),
            });
        };
        let reference = Self::from_baseline(vcc, cop, band);
        info!(
            baseline = baseline.key(),
            cop,
            vcc,
            vcc_min = reference.vcc_min,
            vcc_max = reference.vcc_max,
            "reference values"
        );
        Ok((reference, result))
    }

    /// Relative COP improvement over the baseline [%].
    pub fn cop_gain_percent(&self, cop: f64) -> f64 {
        (cop / self.baseline_cop - 1.0) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rm_fluids::IdealMixtureOracle;

    #[test]
    fn band_is_symmetric() {
        let r = ReferenceValues::from_baseline(1000.0, 3.0, 0.3);
        assert!((r.vcc_min - 700.0).abs() < 1e-9);
        assert!((r.vcc_max - 1300.0).abs() < 1e-9);
        assert!((r.cop_gain_percent(3.3) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn propane_baseline_computes() {
        let mut oracle = IdealMixtureOracle::new();
        let (r, baseline) = ReferenceValues::compute(
            &CycleEvaluator::default(),
            &mut oracle,
            Species::Propane,
            &BoundaryConditions::default(),
            0.3,
        )
        .unwrap();
        assert!(baseline.is_success());
        assert!(r.baseline_cop > 0.0);
        assert!(r.vcc_min < r.vcc_max);
    }

    #[test]
    fn failing_baseline_is_fatal() {
        let mut oracle = IdealMixtureOracle::new();
        let err = ReferenceValues::compute(
            &CycleEvaluator::default(),
            &mut oracle,
            Species::CO2,
            &BoundaryConditions::default(),
            0.3,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Baseline {
                kind: CycleErrorKind::Transcritical,
                ..
            }
        ));
    }
}
