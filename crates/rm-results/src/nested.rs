//! Results keyed by species, one map level per component.
//!
//! Binary results live under both `[a][b]` and `[b][a]`; the mirrored copy
//! lists its fractions in the reversed order, and a mirrored scan is also
//! reversed as a list. Ternary results live under
//! `[a][b][c]` in combination order.

use crate::ResultsResult;
use rm_cycle::CycleResult;
use rm_fluids::{MixtureComposition, Species};
use rm_search::ScreeningReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    One(Box<CycleResult>),
    Many(Vec<CycleResult>),
    Nested(NestedResults),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NestedResults(BTreeMap<String, Entry>);

fn reversed(mixture: &MixtureComposition) -> ResultsResult<MixtureComposition> {
    let mut components: Vec<(Species, f64)> =
        mixture.iter().map(|c| (c.species, c.fraction)).collect();
    components.reverse();
    Ok(MixtureComposition::new(components)?)
}

fn mirrored(result: &CycleResult) -> ResultsResult<CycleResult> {
    let mut mirror = result.clone();
    mirror.mixture = reversed(&result.mixture)?;
    Ok(mirror)
}

fn path(species: &[Species]) -> Vec<String> {
    species.iter().map(|s| s.key().to_string()).collect()
}

impl NestedResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn insert_path(&mut self, keys: &[String], leaf: Entry) {
        match keys {
            [] => {}
            [last] => {
                self.0.insert(last.clone(), leaf);
            }
            [first, rest @ ..] => {
                let entry = self
                    .0
                    .entry(first.clone())
                    .or_insert_with(|| Entry::Nested(NestedResults::default()));
                if let Entry::Nested(child) = entry {
                    child.insert_path(rest, leaf);
                } else {
                    let mut child = NestedResults::default();
                    child.insert_path(rest, leaf);
                    *entry = Entry::Nested(child);
                }
            }
        }
    }

    /// Store the best result of a combination.
    pub fn insert_best(&mut self, result: &CycleResult) -> ResultsResult<()> {
        let species = result.species();
        if species.len() == 2 {
            let mirror = mirrored(result)?;
            self.insert_path(&path(&mirror.species()), Entry::One(Box::new(mirror)));
        }
        self.insert_path(&path(&species), Entry::One(Box::new(result.clone())));
        Ok(())
    }

    /// Store every scan result of a combination, in scan order. The mirrored
    /// binary copy is listed in reverse, so it too runs in ascending order of
    /// its own first fraction.
    pub fn insert_scan(
        &mut self,
        species: &[Species],
        results: &[CycleResult],
    ) -> ResultsResult<()> {
        if species.len() == 2 {
            let mut mirror = results.iter().map(mirrored).collect::<ResultsResult<Vec<_>>>()?;
            mirror.reverse();
            let reversed_species: Vec<Species> = species.iter().rev().copied().collect();
            self.insert_path(&path(&reversed_species), Entry::Many(mirror));
        }
        self.insert_path(&path(species), Entry::Many(results.to_vec()));
        Ok(())
    }

    pub fn get(&self, keys: &[&str]) -> Option<&Entry> {
        let (first, rest) = keys.split_first()?;
        let entry = self.0.get(*first)?;
        if rest.is_empty() {
            return Some(entry);
        }
        match entry {
            Entry::Nested(child) => child.get(rest),
            _ => None,
        }
    }

    /// Best result stored for `species`.
    pub fn best(&self, species: &[Species]) -> Option<&CycleResult> {
        let keys: Vec<&str> = species.iter().map(|s| s.key()).collect();
        match self.get(&keys)? {
            Entry::One(result) => Some(result.as_ref()),
            _ => None,
        }
    }

    /// Scan results stored for `species`.
    pub fn scan(&self, species: &[Species]) -> Option<&[CycleResult]> {
        let keys: Vec<&str> = species.iter().map(|s| s.key()).collect();
        match self.get(&keys)? {
            Entry::Many(results) => Some(results.as_slice()),
            _ => None,
        }
    }

    /// Every stored result, mirrored copies included, in key order.
    pub fn results(&self) -> Vec<&CycleResult> {
        let mut out = Vec::new();
        for entry in self.0.values() {
            match entry {
                Entry::One(result) => out.push(result.as_ref()),
                Entry::Many(results) => out.extend(results.iter()),
                Entry::Nested(child) => out.extend(child.results()),
            }
        }
        out
    }

    /// Best blends of a screening report.
    pub fn best_of(report: &ScreeningReport) -> ResultsResult<Self> {
        let mut nested = Self::new();
        for ranked in &report.ranked {
            nested.insert_best(&ranked.result)?;
        }
        Ok(nested)
    }

    /// Coarse scans of a screening report.
    pub fn scans_of(report: &ScreeningReport) -> ResultsResult<Self> {
        let mut nested = Self::new();
        for outcome in &report.outcomes {
            nested.insert_scan(&outcome.species, &outcome.coarse)?;
        }
        Ok(nested)
    }
}
