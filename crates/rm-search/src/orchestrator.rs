//! Coarse scan, filtering and refinement over candidate combinations.
//!
//! Per combination the pipeline is: coarse scan, filter (stop when empty),
//! take the best one or two survivors, build refinement windows, fine scan,
//! filter, keep the best. The coarse tasks of all combinations run as one
//! coordinator batch, then all fine tasks as a second one.

use crate::coordinator::{Coordinator, Task};
use crate::error::{SearchError, SearchResult};
use crate::filter::filter;
use crate::progress::ProgressReporter;
use crate::reference::ReferenceValues;
use crate::sampler::{Arity, coarse_grid, combinations, discretize, refinement_windows};
use crate::settings::SearchSettings;
use rm_cycle::{BoundaryConditions, CycleEvaluator, CycleResult};
use rm_fluids::{MixtureComposition, OracleFactory, PropertyOracle, Species};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What the search found for one combination of species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationOutcome {
    pub species: Vec<Species>,
    /// Every coarse evaluation, in grid order
    pub coarse: Vec<CycleResult>,
    /// Number of fine evaluations run
    pub fine_evaluated: usize,
    /// Best feasible refined blend; `None` when the combination was skipped
    pub best: Option<CycleResult>,
}

impl CombinationOutcome {
    pub fn label(&self) -> String {
        let keys: Vec<&str> = self.species.iter().map(|s| s.key()).collect();
        keys.join("/")
    }
}

/// A refined blend with its COP improvement over the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedBlend {
    pub result: CycleResult,
    /// `(COP / baseline COP - 1) · 100`
    pub cop_gain_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub arity: Arity,
    pub boundary: BoundaryConditions,
    pub reference: ReferenceValues,
    pub baseline: CycleResult,
    /// Best blend per combination, COP descending
    pub ranked: Vec<RankedBlend>,
    pub outcomes: Vec<CombinationOutcome>,
    pub combinations_evaluated: usize,
    pub combinations_skipped: usize,
    pub tasks_evaluated: usize,
}

impl ScreeningReport {
    pub fn best(&self) -> Option<&RankedBlend> {
        self.ranked.first()
    }
}

/// Drives screening runs.
///
/// Owns one oracle handle for baseline and single evaluations; batch work goes
/// through the coordinator, whose workers own theirs.
pub struct Orchestrator {
    evaluator: CycleEvaluator,
    settings: SearchSettings,
    coordinator: Coordinator,
    oracle: Box<dyn PropertyOracle>,
}

impl Orchestrator {
    pub fn new(
        factory: Arc<dyn OracleFactory>,
        evaluator: CycleEvaluator,
        settings: SearchSettings,
    ) -> SearchResult<Self> {
        settings.validate()?;
        let oracle = factory.create().map_err(|e| SearchError::OracleSetup {
            message: e.to_string(),
        })?;
        let coordinator = Coordinator::new(factory, evaluator.clone(), settings.executor)?;
        Ok(Self {
            evaluator,
            settings,
            coordinator,
            oracle,
        })
    }

    pub fn with_progress(mut self, reporter: ProgressReporter) -> Self {
        self.coordinator = self.coordinator.with_progress(reporter);
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn evaluator(&self) -> &CycleEvaluator {
        &self.evaluator
    }

    /// Evaluate one composition on the orchestrator's own oracle.
    pub fn evaluate(
        &mut self,
        mixture: &MixtureComposition,
        boundary: &BoundaryConditions,
    ) -> CycleResult {
        self.evaluator
            .evaluate(self.oracle.as_mut(), mixture, boundary)
    }

    /// Reference values (and the baseline result) for `boundary`.
    pub fn reference(
        &mut self,
        boundary: &BoundaryConditions,
    ) -> SearchResult<(ReferenceValues, CycleResult)> {
        ReferenceValues::compute(
            &self.evaluator,
            self.oracle.as_mut(),
            self.settings.baseline,
            boundary,
            self.settings.filter.vcc_band,
        )
    }

    /// Best refined blend of one combination, `None` if nothing is feasible.
    pub fn refine(
        &mut self,
        combination: &[Species],
        boundary: &BoundaryConditions,
    ) -> SearchResult<Option<CycleResult>> {
        let arity = match combination.len() {
            2 => Arity::Binary,
            3 => Arity::Ternary,
            _ => {
                return Err(SearchError::InvalidArg {
                    what: "a combination has two or three species",
                });
            }
        };
        let (reference, _) = self.reference(boundary)?;
        let mut outcomes = self.run(&[combination.to_vec()], arity, boundary, &reference)?;
        Ok(outcomes.pop().and_then(|o| o.best))
    }

    /// Screen every pair or triple of `candidates`.
    #[instrument(skip_all, fields(candidates = candidates.len(), arity = %arity))]
    pub fn screen(
        &mut self,
        candidates: &[Species],
        arity: Arity,
        boundary: &BoundaryConditions,
    ) -> SearchResult<ScreeningReport> {
        let combos = combinations(candidates, arity);
        if combos.is_empty() {
            return Err(SearchError::InvalidArg {
                what: "not enough candidates for the requested arity",
            });
        }
        let (reference, baseline) = self.reference(boundary)?;
        info!(combinations = combos.len(), "screening");

        let outcomes = self.run(&combos, arity, boundary, &reference)?;

        let mut ranked: Vec<RankedBlend> = outcomes
            .iter()
            .filter_map(|o| o.best.clone())
            .filter_map(|result| {
                let cop = result.cop()?;
                Some(RankedBlend {
                    cop_gain_percent: reference.cop_gain_percent(cop),
                    result,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.cop_gain_percent.total_cmp(&a.cop_gain_percent));

        let combinations_skipped = outcomes.iter().filter(|o| o.best.is_none()).count();
        let tasks_evaluated = outcomes
            .iter()
            .map(|o| o.coarse.len() + o.fine_evaluated)
            .sum();
        info!(
            ranked = ranked.len(),
            skipped = combinations_skipped,
            tasks = tasks_evaluated,
            "screening finished"
        );

        Ok(ScreeningReport {
            arity,
            boundary: *boundary,
            reference,
            baseline,
            ranked,
            combinations_evaluated: outcomes.len(),
            combinations_skipped,
            tasks_evaluated,
            outcomes,
        })
    }

    #[instrument(skip_all, fields(combinations = combos.len()))]
    fn run(
        &self,
        combos: &[Vec<Species>],
        arity: Arity,
        boundary: &BoundaryConditions,
        reference: &ReferenceValues,
    ) -> SearchResult<Vec<CombinationOutcome>> {
        let sampler = &self.settings.sampler;
        let grid = coarse_grid(sampler.coarse_points, arity);

        let mut coarse_tasks = Vec::with_capacity(combos.len() * grid.len());
        for combo in combos {
            for fractions in &grid {
                let mixture = MixtureComposition::from_parts(combo, fractions)?;
                coarse_tasks.push(Task::new(mixture, *boundary));
            }
        }
        info!(tasks = coarse_tasks.len(), "coarse scan");
        let coarse = self.coordinator.evaluate_batch(coarse_tasks)?;
        let coarse: Vec<Vec<CycleResult>> = coarse.chunks(grid.len()).map(<[_]>::to_vec).collect();

        let mut fine_tasks = Vec::new();
        let mut fine_counts = Vec::with_capacity(combos.len());
        for (combo, results) in combos.iter().zip(&coarse) {
            let survivors = filter(results.clone(), reference, &self.settings.filter);
            if survivors.is_empty() {
                debug!(combination = ?combo, "no feasible coarse point, skipping");
                fine_counts.push(0);
                continue;
            }
            let top: Vec<Vec<f64>> = survivors
                .iter()
                .take(sampler.top_candidates)
                .map(|r| r.fractions())
                .collect();
            let windows = refinement_windows(&top, arity, sampler)?;
            let before = fine_tasks.len();
            for window in &windows {
                for fractions in discretize(window, sampler.step)? {
                    let mixture = MixtureComposition::from_parts(combo, &fractions)?;
                    fine_tasks.push(Task::new(mixture, *boundary));
                }
            }
            debug!(
                combination = ?combo,
                survivors = survivors.len(),
                windows = windows.len(),
                points = fine_tasks.len() - before,
                "refinement planned"
            );
            fine_counts.push(fine_tasks.len() - before);
        }

        info!(tasks = fine_tasks.len(), "fine scan");
        let mut fine = self.coordinator.evaluate_batch(fine_tasks)?.into_iter();

        let outcomes = combos
            .iter()
            .zip(coarse)
            .zip(fine_counts)
            .map(|((combo, coarse), count)| {
                let refined: Vec<CycleResult> = fine.by_ref().take(count).collect();
                let best = if count == 0 {
                    None
                } else {
                    filter(refined, reference, &self.settings.filter)
                        .into_iter()
                        .next()
                };
                if let Some(best) = &best {
                    debug!(result = %best, "best refined blend");
                }
                CombinationOutcome {
                    species: combo.clone(),
                    coarse,
                    fine_evaluated: count,
                    best,
                }
            })
            .collect();
        Ok(outcomes)
    }
}
