use crate::CoreError;

/// Floating point type used for grid arithmetic
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Round to a fixed number of decimals (removes accumulated grid noise).
pub fn round_to(v: Real, decimals: i32) -> Real {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}

/// `n` evenly spaced values in `[start, end]` with an exact endpoint.
pub fn linspace(start: Real, end: Real, n: usize) -> Vec<Real> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let delta = (end - start) / (n - 1) as Real;
            let mut points: Vec<Real> = (0..n).map(|i| start + i as Real * delta).collect();
            points[n - 1] = end;
            points
        }
    }
}

/// Values `min + k*step` for `k = 0, 1, ...` while not beyond `max`.
///
/// Accepts `max` within a tiny fraction of a step so `[0.10, 0.20]` with step
/// `0.005` includes the upper bound.
pub fn arange_inclusive(min: Real, max: Real, step: Real) -> Result<Vec<Real>, CoreError> {
    ensure_finite(min, "range minimum")?;
    ensure_finite(max, "range maximum")?;
    if !step.is_finite() || step <= 0.0 {
        return Err(CoreError::InvalidArg {
            what: "range step must be positive and finite",
        });
    }
    if max < min {
        return Ok(Vec::new());
    }
    let count = ((max - min) / step + 1e-9).floor() as usize + 1;
    Ok((0..count).map(|k| min + k as Real * step).collect())
}
