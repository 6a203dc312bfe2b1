//! Filter, sampler and executor settings.

use crate::error::{SearchError, SearchResult};
use rm_fluids::Species;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const VCC_BAND: f64 = 0.3;
pub const MAX_DISCHARGE_TEMPERATURE: f64 = 130.0;
pub const MAX_DISCHARGE_PRESSURE: f64 = 25.0;
pub const FILTER_MIN_PINCH: f64 = 1.0;
pub const MAX_GLIDE: f64 = 10.0;

pub const COARSE_POINTS: usize = 21;
pub const TOP_CANDIDATES: usize = 2;
pub const WINDOW_HALF_WIDTH: f64 = 0.05;
pub const MERGE_DISTANCE: f64 = 0.10;
pub const FINE_STEP: f64 = 0.005;

pub const CHUNK_SIZE: usize = 2;

/// Feasibility limits applied after evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Relative half-width of the VCC band around the baseline
    pub vcc_band: f64,
    /// Discharge temperature must stay below this [°C]
    pub max_discharge_temperature: f64,
    /// Discharge pressure must stay below this [bar]; `None` disables the check
    pub max_discharge_pressure: Option<f64>,
    /// Pinch must exceed this [K]
    pub min_pinch: f64,
    /// Both glides must stay below this [K]
    pub max_glide: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            vcc_band: VCC_BAND,
            max_discharge_temperature: MAX_DISCHARGE_TEMPERATURE,
            max_discharge_pressure: Some(MAX_DISCHARGE_PRESSURE),
            min_pinch: FILTER_MIN_PINCH,
            max_glide: MAX_GLIDE,
        }
    }
}

impl FilterSettings {
    pub fn validate(&self) -> SearchResult<()> {
        if !(self.vcc_band >= 0.0 && self.vcc_band < 1.0) {
            return Err(SearchError::InvalidSettings {
                what: "vcc_band must lie in [0,1)",
            });
        }
        let limits = [self.max_discharge_temperature, self.min_pinch, self.max_glide];
        if limits.iter().any(|v| !v.is_finite())
            || self.max_discharge_pressure.is_some_and(|p| !(p > 0.0))
        {
            return Err(SearchError::InvalidSettings {
                what: "filter limits must be finite (pressure positive)",
            });
        }
        Ok(())
    }
}

/// Coarse grid density and refinement window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// Points per axis of the coarse grid (21 gives a 0.05 spacing)
    pub coarse_points: usize,
    /// Best coarse survivors refined per combination
    pub top_candidates: usize,
    pub half_width: f64,
    /// Candidates closer than this share a window
    pub merge_distance: f64,
    /// Fine grid step along each free coordinate
    pub step: f64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            coarse_points: COARSE_POINTS,
            top_candidates: TOP_CANDIDATES,
            half_width: WINDOW_HALF_WIDTH,
            merge_distance: MERGE_DISTANCE,
            step: FINE_STEP,
        }
    }
}

impl SamplerSettings {
    pub fn validate(&self) -> SearchResult<()> {
        if self.coarse_points < 2 {
            return Err(SearchError::InvalidSettings {
                what: "coarse_points must be at least 2",
            });
        }
        if !(1..=2).contains(&self.top_candidates) {
            return Err(SearchError::InvalidSettings {
                what: "top_candidates must be 1 or 2",
            });
        }
        if !(self.step > 0.0 && self.step <= 1.0) {
            return Err(SearchError::InvalidSettings {
                what: "step must lie in (0,1]",
            });
        }
        if !(self.half_width >= 0.0 && self.merge_distance >= 0.0) {
            return Err(SearchError::InvalidSettings {
                what: "window sizes must be non-negative",
            });
        }
        Ok(())
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// Worker threads; `None` uses half the available cores (at least one)
    pub workers: Option<usize>,
    /// Tasks a worker claims at a time
    pub chunk_size: usize,
    /// Longest wait for the next result before outstanding tasks time out [s]
    pub task_timeout_secs: Option<f64>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            workers: None,
            chunk_size: CHUNK_SIZE,
            task_timeout_secs: None,
        }
    }
}

impl ExecutorSettings {
    pub fn validate(&self) -> SearchResult<()> {
        if self.workers == Some(0) {
            return Err(SearchError::InvalidSettings {
                what: "workers must be at least 1",
            });
        }
        if self.chunk_size == 0 {
            return Err(SearchError::InvalidSettings {
                what: "chunk_size must be at least 1",
            });
        }
        if self.task_timeout_secs.is_some_and(|t| !(t > 0.0 && t.is_finite())) {
            return Err(SearchError::InvalidSettings {
                what: "task_timeout_secs must be positive",
            });
        }
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get() / 2)
                .unwrap_or(1)
                .max(1)
        })
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_secs.map(Duration::from_secs_f64)
    }
}

/// Everything the orchestrator needs besides the cycle model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Pure fluid the blends are compared against
    pub baseline: Species,
    pub filter: FilterSettings,
    pub sampler: SamplerSettings,
    pub executor: ExecutorSettings,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            baseline: Species::Propane,
            filter: FilterSettings::default(),
            sampler: SamplerSettings::default(),
            executor: ExecutorSettings::default(),
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> SearchResult<()> {
        self.filter.validate()?;
        self.sampler.validate()?;
        self.executor.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SearchSettings::default().validate().is_ok());
        assert!(ExecutorSettings::default().worker_count() >= 1);
    }

    #[test]
    fn pressure_limit_can_be_disabled() {
        let f: FilterSettings =
            serde_json::from_str(r#"{"max_discharge_pressure": null}"#).unwrap();
        assert_eq!(f.max_discharge_pressure, None);
        assert_eq!(f.max_glide, MAX_GLIDE);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn rejects_zero_chunk() {
        let e = ExecutorSettings {
            chunk_size: 0,
            ..ExecutorSettings::default()
        };
        assert!(e.validate().is_err());
    }

    #[test]
    fn timeout_converts_to_duration() {
        let e = ExecutorSettings {
            task_timeout_secs: Some(1.5),
            ..ExecutorSettings::default()
        };
        assert_eq!(e.task_timeout(), Some(Duration::from_millis(1500)));
    }
}
