//! Run storage API.
//!
//! Layout: `<root>/<run_id>/manifest.json`, `results.json` (best blend per
//! combination) and, for screening runs, `coarse.json` (every coarse scan).

use crate::nested::NestedResults;
use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST: &str = "manifest.json";
const RESULTS: &str = "results.json";
const COARSE: &str = "coarse.json";

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST).exists()
    }

    fn write_json<T: Serialize>(path: PathBuf, value: &T) -> ResultsResult<()> {
        fs::write(path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, run_id: &str, file: &str) -> ResultsResult<T> {
        let path = self.run_dir(run_id).join(file);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write a run; `coarse` is omitted for runs without a coarse scan.
    pub fn save_run(
        &self,
        manifest: &RunManifest,
        results: &NestedResults,
        coarse: Option<&NestedResults>,
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        Self::write_json(run_dir.join(MANIFEST), manifest)?;
        Self::write_json(run_dir.join(RESULTS), results)?;
        if let Some(coarse) = coarse {
            Self::write_json(run_dir.join(COARSE), coarse)?;
        }
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        self.read_json(run_id, MANIFEST)
    }

    pub fn load_results(&self, run_id: &str) -> ResultsResult<NestedResults> {
        self.read_json(run_id, RESULTS)
    }

    pub fn load_coarse(&self, run_id: &str) -> ResultsResult<NestedResults> {
        self.read_json(run_id, COARSE)
    }

    /// All stored runs, most recent first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
