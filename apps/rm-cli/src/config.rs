//! Screening configuration, loaded from YAML or JSON.

use crate::error::{AppError, AppResult};
use rm_cycle::{BoundaryConditions, CycleEvaluator, CycleSettings};
use rm_fluids::{IdealOracleFactory, OracleFactory, Species};
use rm_search::{Arity, ExecutorSettings, FilterSettings, SamplerSettings, SearchSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Property backend used by the workers and the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackend {
    #[default]
    Ideal,
    CoolProp,
}

impl OracleBackend {
    pub fn factory(&self) -> AppResult<Arc<dyn OracleFactory>> {
        match self {
            OracleBackend::Ideal => Ok(Arc::new(IdealOracleFactory::default())),
            #[cfg(feature = "coolprop")]
            OracleBackend::CoolProp => Ok(Arc::new(rm_fluids::CoolPropFactory)),
            #[cfg(not(feature = "coolprop"))]
            OracleBackend::CoolProp => Err(AppError::BackendUnavailable {
                backend: "coolprop",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub boundary: BoundaryConditions,
    pub cycle: CycleSettings,
    pub filter: FilterSettings,
    pub sampler: SamplerSettings,
    pub executor: ExecutorSettings,
    pub candidates: Vec<Species>,
    pub arity: Arity,
    pub baseline: Species,
    pub oracle: OracleBackend,
    /// Directory holding stored runs
    pub runs_dir: PathBuf,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        let search = SearchSettings::default();
        Self {
            boundary: BoundaryConditions::default(),
            cycle: CycleSettings::default(),
            filter: search.filter,
            sampler: search.sampler,
            executor: search.executor,
            candidates: Species::CANDIDATES.to_vec(),
            arity: Arity::Binary,
            baseline: search.baseline,
            oracle: OracleBackend::default(),
            runs_dir: PathBuf::from("runs"),
        }
    }
}

impl ScreeningConfig {
    /// Load from `path`; `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed: Result<Self, String> = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        let config = parsed.map_err(|message| AppError::FileParsing {
            path: path.to_path_buf(),
            message,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            baseline: self.baseline,
            filter: self.filter,
            sampler: self.sampler,
            executor: self.executor,
        }
    }

    pub fn evaluator(&self) -> AppResult<CycleEvaluator> {
        Ok(CycleEvaluator::new(self.cycle)?)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.boundary.validate()?;
        self.cycle.validate()?;
        self.search_settings().validate()?;

        if self.baseline.is_secondary() {
            return Err(AppError::Config(format!(
                "baseline {} is a secondary fluid",
                self.baseline
            )));
        }
        if let Some(s) = self.candidates.iter().find(|s| s.is_secondary()) {
            return Err(AppError::Config(format!("candidate {s} is a secondary fluid")));
        }
        for (i, s) in self.candidates.iter().enumerate() {
            if self.candidates[..i].contains(s) {
                return Err(AppError::Config(format!("candidate {s} is listed twice")));
            }
        }
        if self.candidates.len() < self.arity.components() {
            return Err(AppError::Config(format!(
                "{} candidates cannot form a {} blend",
                self.candidates.len(),
                self.arity
            )));
        }
        Ok(())
    }
}
