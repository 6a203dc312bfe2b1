//! Composition sampling: candidate combinations, coarse grids, refinement
//! windows and their discretization.
//!
//! Fractions are plain vectors ordered like the combination's species. The
//! free coordinates are the first `arity - 1` fractions; the last one is
//! implied.

use crate::error::{SearchError, SearchResult};
use crate::settings::SamplerSettings;
use rm_core::{arange_inclusive, linspace, round_to};
use rm_fluids::Species;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Absolute tolerance for comparing grid coordinates.
const COORD_EPS: f64 = 1e-9;

/// Decimals kept when discretizing a window.
const GRID_DECIMALS: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    Binary,
    Ternary,
}

impl Arity {
    pub fn components(&self) -> usize {
        match self {
            Arity::Binary => 2,
            Arity::Ternary => 3,
        }
    }

    pub fn free_coordinates(&self) -> usize {
        self.components() - 1
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Binary => write!(f, "binary"),
            Arity::Ternary => write!(f, "ternary"),
        }
    }
}

impl FromStr for Arity {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "2" => Ok(Arity::Binary),
            "ternary" | "3" => Ok(Arity::Ternary),
            _ => Err("arity must be binary or ternary"),
        }
    }
}

/// All `i < j` pairs or `i < j < k` triples of the candidate list, in order.
pub fn combinations(candidates: &[Species], arity: Arity) -> Vec<Vec<Species>> {
    let n = candidates.len();
    let mut out = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            match arity {
                Arity::Binary => out.push(vec![candidates[i], candidates[j]]),
                Arity::Ternary => {
                    for k in j + 1..n {
                        out.push(vec![candidates[i], candidates[j], candidates[k]]);
                    }
                }
            }
        }
    }
    out
}

/// Evenly spaced compositions covering the simplex.
///
/// Binary: `n_points` fractions of the first species in [0,1]. Ternary: the
/// lattice `i + j <= n_points - 1` over the first two species.
pub fn coarse_grid(n_points: usize, arity: Arity) -> Vec<Vec<f64>> {
    let axis = linspace(0.0, 1.0, n_points);
    match arity {
        Arity::Binary => axis.iter().map(|&a| vec![a, 1.0 - a]).collect(),
        Arity::Ternary => {
            let mut points = Vec::with_capacity(n_points * (n_points + 1) / 2);
            for (i, &a) in axis.iter().enumerate() {
                for &b in &axis[..n_points - i] {
                    let c = 1.0 - a - b;
                    // i + j = n - 1 may leave a rounding residue below zero
                    let c = if c < 0.0 && c > -COORD_EPS { 0.0 } else { c };
                    points.push(vec![a, b, c]);
                }
            }
            points
        }
    }
}

/// Axis-aligned box over the free coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// `(min, max)` per free coordinate
    pub ranges: Vec<(f64, f64)>,
}

impl Window {
    fn clipped(ranges: Vec<(f64, f64)>) -> Self {
        Self {
            ranges: ranges
                .into_iter()
                .map(|(lo, hi)| (lo.max(0.0), hi.min(1.0)))
                .collect(),
        }
    }

    fn around(center: &[f64], half_width: f64) -> Self {
        Self::clipped(
            center
                .iter()
                .map(|&c| (c - half_width, c + half_width))
                .collect(),
        )
    }

    pub fn contains(&self, point: &[f64]) -> bool {
        self.ranges
            .iter()
            .zip(point)
            .all(|(&(lo, hi), &x)| x >= lo - COORD_EPS && x <= hi + COORD_EPS)
    }
}

fn span(a: f64, b: f64) -> (f64, f64) {
    (a.min(b), a.max(b))
}

/// Windows around the best coarse candidates (one or two of them).
///
/// Binary: two candidates within `merge_distance` share one window spanning
/// both; otherwise each gets `±half_width`. Ternary:
/// - candidates not close on both coordinates: a square per candidate
/// - close, differing on both coordinates: their bounding box
/// - same first coordinate: that coordinate `±half_width`, the other spanning both
/// - same second coordinate: the mirror case
///
/// Windows are clipped to [0,1].
pub fn refinement_windows(
    top: &[Vec<f64>],
    arity: Arity,
    settings: &SamplerSettings,
) -> SearchResult<Vec<Window>> {
    let free = arity.free_coordinates();
    if top.iter().any(|p| p.len() < free) {
        return Err(SearchError::InvalidArg {
            what: "candidate has fewer fractions than free coordinates",
        });
    }
    let coords: Vec<&[f64]> = top.iter().map(|p| &p[..free]).collect();
    let hw = settings.half_width;
    let close = |d: f64| d.abs() <= settings.merge_distance + COORD_EPS;
    let same = |d: f64| d.abs() <= COORD_EPS;

    let windows = match (arity, coords.as_slice()) {
        (_, [p]) => vec![Window::around(p, hw)],
        (Arity::Binary, [p, q]) => {
            if close(p[0] - q[0]) {
                vec![Window::clipped(vec![span(p[0], q[0])])]
            } else {
                vec![Window::around(p, hw), Window::around(q, hw)]
            }
        }
        (Arity::Ternary, [p, q]) => {
            let (dx, dy) = (p[0] - q[0], p[1] - q[1]);
            if !(close(dx) && close(dy)) {
                vec![Window::around(p, hw), Window::around(q, hw)]
            } else if !(same(dx) || same(dy)) {
                vec![Window::clipped(vec![span(p[0], q[0]), span(p[1], q[1])])]
            } else if same(dx) {
                vec![Window::clipped(vec![
                    (p[0] - hw, p[0] + hw),
                    span(p[1], q[1]),
                ])]
            } else {
                vec![Window::clipped(vec![
                    span(p[0], q[0]),
                    (p[1] - hw, p[1] + hw),
                ])]
            }
        }
        _ => {
            return Err(SearchError::InvalidArg {
                what: "refinement needs one or two candidates",
            });
        }
    };
    Ok(windows)
}

fn valid(fractions: &[f64]) -> bool {
    fractions.iter().all(|f| (0.0..=1.0).contains(f))
}

/// Grid points of a window at `step` along each free coordinate.
///
/// Values are `min + k·step` rounded to 1e-9; points whose implied last
/// fraction leaves [0,1] are dropped.
pub fn discretize(window: &Window, step: f64) -> SearchResult<Vec<Vec<f64>>> {
    let axis = |(lo, hi): (f64, f64)| -> SearchResult<Vec<f64>> {
        Ok(arange_inclusive(lo, hi, step)?
            .into_iter()
            .map(|x| round_to(x, GRID_DECIMALS))
            .collect())
    };

    let points: Vec<Vec<f64>> = match window.ranges.as_slice() {
        [x] => axis(*x)?
            .into_iter()
            .map(|a| vec![a, round_to(1.0 - a, GRID_DECIMALS)])
            .collect(),
        [x, y] => {
            let ys = axis(*y)?;
            axis(*x)?
                .into_iter()
                .flat_map(|a| {
                    ys.iter()
                        .map(move |&b| vec![a, b, round_to(1.0 - a - b, GRID_DECIMALS)])
                })
                .collect()
        }
        _ => {
            return Err(SearchError::InvalidArg {
                what: "window must have one or two free coordinates",
            });
        }
    };
    Ok(points.into_iter().filter(|p| valid(p)).collect())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn discretized_points_lie_on_simplex(
            x in 0.0f64..1.0, y in 0.0f64..1.0,
            wx in 0.0f64..0.2, wy in 0.0f64..0.2,
            step in 0.005f64..0.05,
        ) {
            let window = Window::clipped(vec![(x, x + wx), (y, y + wy)]);
            for p in discretize(&window, step).unwrap() {
                prop_assert_eq!(p.len(), 3);
                prop_assert!(p.iter().all(|f| (0.0..=1.0).contains(f)));
                prop_assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-6);
            }
        }

        #[test]
        fn binary_windows_cover_candidates(i in 0usize..21, j in 0usize..21) {
            prop_assume!(i != j);
            let grid = coarse_grid(21, Arity::Binary);
            let top = vec![grid[i].clone(), grid[j].clone()];
            let windows = refinement_windows(&top, Arity::Binary, &SamplerSettings::default()).unwrap();
            for candidate in &top {
                prop_assert!(windows.iter().any(|w| w.contains(&candidate[..1])));
            }
            for w in &windows {
                let (lo, hi) = w.ranges[0];
                prop_assert!(0.0 <= lo && lo <= hi && hi <= 1.0);
            }
        }
    }
}
