//! rm-search: composition screening for refmix.
//!
//! Contains:
//! - reference values from a pure-fluid baseline
//! - the constraint filter
//! - the composition sampler (coarse grids, refinement windows)
//! - the parallel coordinator with per-worker oracle initialization
//! - the orchestrator driving coarse scan, filtering and refinement

pub mod coordinator;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod progress;
pub mod reference;
pub mod sampler;
pub mod settings;

pub use coordinator::{Coordinator, Task, Worker};
pub use error::{SearchError, SearchResult};
pub use filter::filter;
pub use orchestrator::{CombinationOutcome, Orchestrator, RankedBlend, ScreeningReport};
pub use progress::{Progress, ProgressReporter};
pub use reference::ReferenceValues;
pub use sampler::{Arity, Window, coarse_grid, combinations, discretize, refinement_windows};
pub use settings::{ExecutorSettings, FilterSettings, SamplerSettings, SearchSettings};
