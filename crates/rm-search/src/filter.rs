//! Constraint filter.

use crate::reference::ReferenceValues;
use crate::settings::FilterSettings;
use rm_cycle::{CycleResult, CycleSummary};
use tracing::trace;

type Predicate<'a> = (&'static str, Box<dyn Fn(&CycleSummary) -> bool + 'a>);

fn predicates<'a>(
    reference: &'a ReferenceValues,
    settings: &'a FilterSettings,
) -> Vec<Predicate<'a>> {
    vec![
        (
            "vcc band",
            Box::new(move |s: &CycleSummary| {
                reference.vcc_min <= s.vcc && s.vcc <= reference.vcc_max
            }),
        ),
        (
            "discharge temperature",
            Box::new(move |s: &CycleSummary| {
                s.points.discharge.temperature < settings.max_discharge_temperature
            }),
        ),
        (
            "discharge pressure",
            Box::new(move |s: &CycleSummary| {
                settings
                    .max_discharge_pressure
                    .is_none_or(|limit| s.points.discharge.pressure < limit)
            }),
        ),
        (
            "pinch",
            Box::new(move |s: &CycleSummary| s.pinch > settings.min_pinch),
        ),
        (
            "glide",
            Box::new(move |s: &CycleSummary| {
                s.glide.condenser < settings.max_glide && s.glide.evaporator < settings.max_glide
            }),
        ),
    ]
}

/// Keep feasible results, best COP first.
///
/// Predicates run in a fixed order (success, VCC band, discharge temperature,
/// discharge pressure, pinch, glide) and stop as soon as nothing survives.
/// The sort is stable, so equal COPs keep their input order.
pub fn filter(
    results: Vec<CycleResult>,
    reference: &ReferenceValues,
    settings: &FilterSettings,
) -> Vec<CycleResult> {
    let mut survivors: Vec<CycleResult> = results.into_iter().filter(|r| r.is_success()).collect();
    trace!(predicate = "success", survivors = survivors.len(), "filter");

    for (name, keep) in predicates(reference, settings) {
        if survivors.is_empty() {
            return survivors;
        }
        survivors.retain(|r| r.summary().is_some_and(|s| keep(s)));
        trace!(predicate = name, survivors = survivors.len(), "filter");
    }

    survivors.sort_by(|a, b| {
        let (a, b) = (a.cop().unwrap_or(f64::NEG_INFINITY), b.cop().unwrap_or(f64::NEG_INFINITY));
        b.total_cmp(&a)
    });
    survivors
}

#[cfg(test)]
mod tests {
    use super::*;
    use rm_cycle::{BoundaryConditions, CycleErrorKind, CycleEvaluator};
    use rm_fluids::{IdealMixtureOracle, MixtureComposition, Species};

    fn propane() -> CycleResult {
        CycleEvaluator::default().evaluate(
            &mut IdealMixtureOracle::new(),
            &MixtureComposition::pure(Species::Propane),
            &BoundaryConditions::default(),
        )
    }

    fn with_cop(base: &CycleResult, cop: f64) -> CycleResult {
        let mut summary = base.summary().cloned().expect("success");
        summary.cop = cop;
        CycleResult::success(base.mixture.clone(), base.boundary, summary)
    }

    fn wide_reference(base: &CycleResult) -> ReferenceValues {
        ReferenceValues::from_baseline(base.vcc().expect("vcc"), 3.0, 0.3)
    }

    #[test]
    fn sorts_by_cop_descending_and_drops_failures() {
        let base = propane();
        let failed = CycleResult::failure(
            MixtureComposition::pure(Species::CO2),
            BoundaryConditions::default(),
            CycleErrorKind::Transcritical,
        );
        let input = vec![with_cop(&base, 2.0), failed, with_cop(&base, 4.0), with_cop(&base, 3.0)];
        let out = filter(input, &wide_reference(&base), &FilterSettings::default());
        let cops: Vec<f64> = out.iter().filter_map(|r| r.cop()).collect();
        assert_eq!(cops, vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn is_idempotent() {
        let base = propane();
        let input = vec![with_cop(&base, 2.5), with_cop(&base, 3.5)];
        let reference = wide_reference(&base);
        let settings = FilterSettings::default();
        let once = filter(input, &reference, &settings);
        let twice = filter(once.clone(), &reference, &settings);
        assert_eq!(once, twice);
    }

    #[test]
    fn ties_keep_input_order() {
        let base = propane();
        let mut a = with_cop(&base, 3.0);
        a.mixture = MixtureComposition::binary(Species::Propane, Species::NButane, 0.9).unwrap();
        let mut b = with_cop(&base, 3.0);
        b.mixture = MixtureComposition::binary(Species::Propane, Species::NButane, 0.8).unwrap();
        let out = filter(
            vec![a.clone(), b.clone()],
            &wide_reference(&base),
            &FilterSettings::default(),
        );
        assert_eq!(out, vec![a, b]);
    }

    #[test]
    fn vcc_band_excludes_everything() {
        let base = propane();
        let vcc = base.vcc().expect("vcc");
        let reference = ReferenceValues::from_baseline(vcc * 10.0, 3.0, 0.1);
        let out = filter(vec![base], &reference, &FilterSettings::default());
        assert!(out.is_empty());
    }

    #[test]
    fn early_rejection_is_final() {
        let base = propane();
        let permissive = FilterSettings {
            vcc_band: 0.3,
            max_discharge_temperature: f64::INFINITY,
            max_discharge_pressure: None,
            min_pinch: f64::NEG_INFINITY,
            max_glide: f64::INFINITY,
        };
        let wide = wide_reference(&base);
        assert_eq!(filter(vec![base.clone()], &wide, &permissive), vec![base.clone()]);

        let vcc = base.vcc().expect("vcc");
        let outside = ReferenceValues::from_baseline(vcc * 10.0, 3.0, 0.1);
        assert!(filter(vec![base.clone()], &outside, &permissive).is_empty());

        let too_hot = FilterSettings {
            max_discharge_temperature: f64::NEG_INFINITY,
            ..permissive
        };
        assert!(filter(vec![base], &wide, &too_hot).is_empty());
    }

    #[test]
    fn pressure_check_can_be_disabled() {
        let base = propane();
        let strict = FilterSettings {
            max_discharge_pressure: Some(1.0),
            ..FilterSettings::default()
        };
        let reference = wide_reference(&base);
        assert!(filter(vec![base.clone()], &reference, &strict).is_empty());
        let off = FilterSettings {
            max_discharge_pressure: None,
            ..strict
        };
        assert_eq!(filter(vec![base], &reference, &off).len(), 1);
    }
}
