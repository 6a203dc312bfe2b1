// rm-core/src/units.rs
//
// The screening core speaks engineering units (bar, °C, kJ/kg). Backends that
// work in SI convert through these helpers.

use uom::si::f64::{Pressure as UomPressure, ThermodynamicTemperature as UomTemperature};

// Public canonical unit types (SI, f64)
pub type Pressure = UomPressure;
pub type Temperature = UomTemperature;

/// Offset between the Celsius and Kelvin scales.
pub const KELVIN_OFFSET: f64 = 273.15;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn degc(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn bar_to_pa(v: f64) -> f64 {
    use uom::si::pressure::pascal;
    bar(v).get::<pascal>()
}

#[inline]
pub fn pa_to_bar(v: f64) -> f64 {
    use uom::si::pressure::bar;
    pa(v).get::<bar>()
}

#[inline]
pub fn celsius_to_kelvin(v: f64) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    degc(v).get::<kelvin>()
}

#[inline]
pub fn kelvin_to_celsius(v: f64) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    k(v).get::<degree_celsius>()
}

/// J/kg (or J/kg/K) to kJ/kg (or kJ/kg/K).
#[inline]
pub fn to_kilo(v: f64) -> f64 {
    v * 1e-3
}

/// kJ/kg (or kJ/kg/K) to J/kg (or J/kg/K).
#[inline]
pub fn from_kilo(v: f64) -> f64 {
    v * 1e3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _b = bar(1.0);
        let _t = k(300.0);
        let _c = degc(25.0);
    }

    #[test]
    fn bar_pascal_roundtrip() {
        assert!((bar_to_pa(1.0) - 100_000.0).abs() < 1e-9);
        assert!((pa_to_bar(2_500_000.0) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn celsius_kelvin_roundtrip() {
        assert!((celsius_to_kelvin(0.0) - KELVIN_OFFSET).abs() < 1e-9);
        assert!((kelvin_to_celsius(373.15) - 100.0).abs() < 1e-9);
    }
}
