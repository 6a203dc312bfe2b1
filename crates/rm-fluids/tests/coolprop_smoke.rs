//! CoolProp integration tests.
//!
//! Broad tolerances avoid backend version issues while still enforcing
//! physical plausibility.

#![cfg(feature = "coolprop")]

use rm_fluids::{
    CoolPropOracle, MixtureComposition, OracleFactory, Property, PropertyOracle, Species,
    StateSpec,
};

#[test]
fn propane_saturation_pressure() {
    let mut oracle = CoolPropOracle::new();
    let p = oracle
        .value(
            &MixtureComposition::pure(Species::Propane),
            Property::Pressure,
            StateSpec::TQ { t: 54.5, q: 0.0 },
        )
        .expect("propane saturation pressure");
    assert!(p > 18.0 && p < 20.0, "p = {p} bar");
}

#[test]
fn superheated_vapor_quality_is_above_one() {
    let mut oracle = CoolPropOracle::new();
    let q = oracle
        .value(
            &MixtureComposition::pure(Species::Propane),
            Property::Quality,
            StateSpec::PT { p: 2.0, t: 40.0 },
        )
        .expect("extrapolated quality");
    assert!(q > 1.0, "q = {q}");
}

#[test]
fn pure_critical_point_matches_reference() {
    let mut oracle = CoolPropOracle::new();
    let cp = oracle
        .pure_critical_point(Species::CO2)
        .expect("CO2 critical point");
    assert!((cp.temperature - 30.98).abs() < 0.1);
    assert!((cp.pressure - 73.77).abs() < 0.1);
}

#[test]
fn glycol_brine_is_liquid_near_zero() {
    let mut oracle = CoolPropOracle::new();
    let rho = oracle
        .value(
            &MixtureComposition::pure(Species::EthyleneGlycol),
            Property::Density,
            StateSpec::PT { p: 1.0, t: 0.0 },
        )
        .expect("brine density");
    assert!(rho > 1000.0 && rho < 1100.0, "rho = {rho}");
}

#[test]
fn factory_probes_native_library() {
    let factory = rm_fluids::CoolPropFactory;
    assert!(factory.create().is_ok());
}
