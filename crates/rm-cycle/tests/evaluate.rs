//! End-to-end cycle evaluations against the ideal-solution oracle.

use rm_cycle::{BoundaryConditions, CycleErrorKind, CycleEvaluator, CycleResult};
use rm_fluids::{
    CriticalPoint, FluidResult, IdealMixtureOracle, MixtureComposition, Property, PropertyMap,
    PropertyOracle, Species, StateSpec,
};

/// Forwards to the ideal oracle, then rewrites selected answers.
struct Tampered<F: FnMut(&MixtureComposition, StateSpec, &mut PropertyMap) + Send> {
    inner: IdealMixtureOracle,
    tamper: F,
}

impl<F: FnMut(&MixtureComposition, StateSpec, &mut PropertyMap) + Send> PropertyOracle
    for Tampered<F>
{
    fn name(&self) -> &str {
        "tampered"
    }

    fn query(
        &mut self,
        mixture: &MixtureComposition,
        outputs: &[Property],
        spec: StateSpec,
    ) -> FluidResult<PropertyMap> {
        let mut values = self.inner.query(mixture, outputs, spec)?;
        (self.tamper)(mixture, spec, &mut values);
        Ok(values)
    }

    fn pure_critical_point(&mut self, species: Species) -> FluidResult<CriticalPoint> {
        self.inner.pure_critical_point(species)
    }

    fn critical_point(&mut self, mixture: &MixtureComposition) -> FluidResult<CriticalPoint> {
        self.inner.critical_point(mixture)
    }
}

fn evaluate(oracle: &mut dyn PropertyOracle, mixture: &MixtureComposition) -> CycleResult {
    CycleEvaluator::default().evaluate(oracle, mixture, &BoundaryConditions::default())
}

#[test]
fn binary_blend_shows_glide() {
    let blend = MixtureComposition::binary(Species::Propane, Species::NButane, 0.7)
        .expect("valid blend");
    let r = evaluate(&mut IdealMixtureOracle::new(), &blend);
    let s = r.summary().expect("blend should run the cycle");
    assert!(s.glide.condenser > 0.5, "glide = {}", s.glide.condenser);
    assert!(s.glide.evaporator > 0.5);
    assert!(s.saturation.condensing_vapor.temperature > s.saturation.condensing_liquid.temperature);
    assert!(s.mass_flow_ratio.hot > 0.0 && s.mass_flow_ratio.cold > 0.0);
}

#[test]
fn repeated_evaluation_is_identical() {
    let blend = MixtureComposition::binary(Species::Propane, Species::Isobutane, 0.5)
        .expect("valid blend");
    let mut oracle = IdealMixtureOracle::new();
    let first = evaluate(&mut oracle, &blend);
    let second = evaluate(&mut oracle, &blend);
    let fresh = evaluate(&mut IdealMixtureOracle::new(), &blend);
    assert_eq!(first, second);
    assert_eq!(first, fresh);
}

#[test]
fn saturated_discharge_is_rejected() {
    let mut oracle = Tampered {
        inner: IdealMixtureOracle::new(),
        tamper: |_: &MixtureComposition, spec: StateSpec, values: &mut PropertyMap| {
            if matches!(spec, StateSpec::PH { .. }) && values.contains_key(&Property::Quality) {
                values.insert(Property::Quality, 0.98);
            }
        },
    };
    let r = evaluate(&mut oracle, &MixtureComposition::pure(Species::Propane));
    assert_eq!(r.error(), Some(CycleErrorKind::TwoPhaseDischarge));
}

#[test]
fn flat_secondary_enthalpy_is_division_by_zero() {
    let mut oracle = Tampered {
        inner: IdealMixtureOracle::new(),
        tamper: |mixture: &MixtureComposition, spec: StateSpec, values: &mut PropertyMap| {
            if mixture.is_pure() == Some(Species::Water) && matches!(spec, StateSpec::PT { .. }) {
                values.insert(Property::Enthalpy, 200.0);
            }
        },
    };
    let r = evaluate(&mut oracle, &MixtureComposition::pure(Species::Propane));
    assert_eq!(r.error(), Some(CycleErrorKind::DivisionByZero));
}

#[test]
fn computed_results_round_trip_through_json() {
    let mut oracle = IdealMixtureOracle::new();
    let mut successes = 0;
    for (i, &a) in Species::CANDIDATES.iter().enumerate() {
        for &b in &Species::CANDIDATES[i + 1..] {
            for step in 0..=10 {
                let blend = MixtureComposition::binary(a, b, step as f64 / 10.0)
                    .expect("valid blend");
                let r = evaluate(&mut oracle, &blend);
                successes += usize::from(r.is_success());
                let json = serde_json::to_string(&r).expect("serialize");
                let back: CycleResult = serde_json::from_str(&json).expect("deserialize");
                assert_eq!(back, r, "{}", blend.label());
            }
        }
    }
    assert!(successes > 0);
}
