//! Run metadata.

use rm_cycle::BoundaryConditions;
use rm_fluids::{MixtureComposition, Species};
use rm_search::{Arity, ReferenceValues, ScreeningReport};
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunKind {
    Screen {
        arity: Arity,
        candidates: Vec<Species>,
    },
    Refine {
        species: Vec<Species>,
    },
    Evaluate {
        mixture: MixtureComposition,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub kind: RunKind,
    /// Name of the property oracle backend
    pub oracle: String,
    pub engine_version: String,
    pub boundary: BoundaryConditions,
    pub reference: Option<ReferenceValues>,
    #[serde(default)]
    pub combinations_evaluated: usize,
    #[serde(default)]
    pub combinations_skipped: usize,
    #[serde(default)]
    pub tasks_evaluated: usize,
}

impl RunManifest {
    /// Manifest stamped with the current time.
    pub fn new(
        run_id: RunId,
        kind: RunKind,
        oracle: &str,
        engine_version: &str,
        boundary: BoundaryConditions,
    ) -> Self {
        Self {
            run_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind,
            oracle: oracle.to_string(),
            engine_version: engine_version.to_string(),
            boundary,
            reference: None,
            combinations_evaluated: 0,
            combinations_skipped: 0,
            tasks_evaluated: 0,
        }
    }

    /// Copy the counts and reference values of a screening report.
    pub fn with_report(mut self, report: &ScreeningReport) -> Self {
        self.reference = Some(report.reference);
        self.combinations_evaluated = report.combinations_evaluated;
        self.combinations_skipped = report.combinations_skipped;
        self.tasks_evaluated = report.tasks_evaluated;
        self
    }
}
