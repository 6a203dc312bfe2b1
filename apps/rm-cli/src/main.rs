mod config;
mod error;
mod logging;

use clap::{Parser, Subcommand};
use config::ScreeningConfig;
use error::{AppError, AppResult};
use rm_cycle::{CycleOutcome, CycleResult};
use rm_fluids::{MixtureComposition, PointState, Species};
use rm_results::{NestedResults, RunKind, RunManifest, RunStore, compute_run_id};
use rm_search::{Arity, Orchestrator, Progress, ProgressReporter, ReferenceValues};
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "refmix")]
#[command(about = "refmix - Refrigerant blend screening for heat pump cycles", long_about = None)]
struct Cli {
    /// Screening configuration (YAML, or JSON by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Directory holding stored runs
    #[arg(long, global = true)]
    runs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the cycle for a single composition
    Evaluate {
        /// Species, comma separated (e.g. PROPANE,ISOBUTANE)
        #[arg(short, long, value_delimiter = ',', required = true)]
        species: Vec<Species>,
        /// Mole fractions in species order; may be omitted for a pure fluid
        #[arg(short, long, value_delimiter = ',')]
        fractions: Vec<f64>,
        /// Evaluate at this condenser approach [K] instead of searching
        #[arg(long)]
        approach: Option<f64>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Screen every binary or ternary combination of the candidates
    Screen {
        /// binary or ternary (overrides the configuration)
        #[arg(short, long)]
        arity: Option<Arity>,
        /// Candidate species, comma separated (overrides the configuration)
        #[arg(long, value_delimiter = ',')]
        candidates: Option<Vec<Species>>,
        /// Do not store the run
        #[arg(long)]
        no_save: bool,
    },
    /// Find the best composition of one combination
    Refine {
        /// Two or three species
        #[arg(required = true, num_args = 2..=3)]
        species: Vec<Species>,
        /// Do not store the run
        #[arg(long)]
        no_save: bool,
    },
    /// Show a stored run, or list all runs
    Show {
        /// Run ID to display
        run_id: Option<String>,
        /// Also print the coarse scans
        #[arg(long)]
        coarse: bool,
    },
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => {
            let config = ScreeningConfig::load(path)?;
            debug!(path = %path.display(), "configuration loaded");
            config
        }
        None => ScreeningConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.executor.workers = Some(workers);
    }
    if let Some(dir) = cli.runs_dir {
        config.runs_dir = dir;
    }

    match cli.command {
        Commands::Evaluate {
            species,
            fractions,
            approach,
            json,
        } => {
            config.validate()?;
            cmd_evaluate(&config, &species, &fractions, approach, json)
        }
        Commands::Screen {
            arity,
            candidates,
            no_save,
        } => {
            if let Some(arity) = arity {
                config.arity = arity;
            }
            if let Some(candidates) = candidates {
                config.candidates = candidates;
            }
            config.validate()?;
            cmd_screen(&config, !no_save)
        }
        Commands::Refine { species, no_save } => {
            config.validate()?;
            cmd_refine(&config, &species, !no_save)
        }
        Commands::Show { run_id, coarse } => cmd_show(&config, run_id.as_deref(), coarse),
    }
}

fn cmd_evaluate(
    config: &ScreeningConfig,
    species: &[Species],
    fractions: &[f64],
    approach: Option<f64>,
    json: bool,
) -> AppResult<()> {
    let fractions = match (species.len(), fractions.is_empty()) {
        (1, true) => vec![1.0],
        (_, true) => {
            return Err(AppError::Argument(
                "--fractions is required for blends".to_string(),
            ));
        }
        _ => fractions.to_vec(),
    };
    let mixture = MixtureComposition::from_parts(species, &fractions)?;
    let evaluator = config.evaluator()?;
    let mut oracle = config.oracle.factory()?.create()?;

    let result = match approach {
        Some(approach) => {
            evaluator.evaluate_at_approach(oracle.as_mut(), &mixture, &config.boundary, approach)
        }
        None => evaluator.evaluate(oracle.as_mut(), &mixture, &config.boundary),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Boundary: {}", config.boundary.label());
    print_result_details(&result);
    Ok(())
}

fn cmd_screen(config: &ScreeningConfig, save: bool) -> AppResult<()> {
    let factory = config.oracle.factory()?;
    let oracle_name = factory.name().to_string();
    let mut orchestrator =
        Orchestrator::new(factory, config.evaluator()?, config.search_settings())?
            .with_progress(progress_reporter());

    println!(
        "Screening {} blends of {} candidates ({} oracle)",
        config.arity,
        config.candidates.len(),
        oracle_name
    );
    println!("  Boundary: {}", config.boundary.label());

    let started = Instant::now();
    let report = orchestrator.screen(&config.candidates, config.arity, &config.boundary)?;
    clear_progress_line();
    log_run_counts(
        report.combinations_evaluated,
        report.combinations_skipped,
        report.tasks_evaluated,
    );

    print_reference(&report.reference, &report.baseline);
    println!(
        "\n{} combinations, {} without a feasible blend, {} evaluations in {:.1}s",
        report.combinations_evaluated,
        report.combinations_skipped,
        report.tasks_evaluated,
        started.elapsed().as_secs_f64()
    );

    if report.ranked.is_empty() {
        println!("No blend passed the filter");
    } else {
        print_ranking_header();
        for (rank, blend) in report.ranked.iter().enumerate() {
            print_ranking_row(rank + 1, &blend.result, Some(blend.cop_gain_percent));
        }
    }

    if save {
        let kind = RunKind::Screen {
            arity: config.arity,
            candidates: config.candidates.clone(),
        };
        let run_id = compute_run_id(&(config, &kind), ENGINE_VERSION)?;
        let manifest = RunManifest::new(run_id, kind, &oracle_name, ENGINE_VERSION, config.boundary)
            .with_report(&report);
        let store = RunStore::new(config.runs_dir.clone())?;
        store.save_run(
            &manifest,
            &NestedResults::best_of(&report)?,
            Some(&NestedResults::scans_of(&report)?),
        )?;
        log_stored_run(&manifest.run_id, store.root());
        println!("\n✓ Stored run: {}", manifest.run_id);
    }
    Ok(())
}

fn cmd_refine(config: &ScreeningConfig, species: &[Species], save: bool) -> AppResult<()> {
    let factory = config.oracle.factory()?;
    let oracle_name = factory.name().to_string();
    let mut orchestrator =
        Orchestrator::new(factory, config.evaluator()?, config.search_settings())?
            .with_progress(progress_reporter());

    let keys: Vec<&str> = species.iter().map(|s| s.key()).collect();
    println!("Refining {} ({} oracle)", keys.join("/"), oracle_name);
    println!("  Boundary: {}", config.boundary.label());

    let (reference, baseline) = orchestrator.reference(&config.boundary)?;
    let best = orchestrator.refine(species, &config.boundary)?;
    clear_progress_line();
    if best.is_none() {
        warn!(combination = %keys.join("/"), "no feasible composition");
    }

    print_reference(&reference, &baseline);
    match &best {
        Some(result) => {
            let gain = result.cop().map(|cop| reference.cop_gain_percent(cop));
            print_ranking_header();
            print_ranking_row(1, result, gain);
            println!();
            print_result_details(result);
        }
        None => println!("\nNo feasible composition for {}", keys.join("/")),
    }

    if save {
        let kind = RunKind::Refine {
            species: species.to_vec(),
        };
        let run_id = compute_run_id(&(config, &kind), ENGINE_VERSION)?;
        let mut manifest =
            RunManifest::new(run_id, kind, &oracle_name, ENGINE_VERSION, config.boundary);
        manifest.reference = Some(reference);
        manifest.combinations_evaluated = 1;
        manifest.combinations_skipped = usize::from(best.is_none());

        let mut results = NestedResults::new();
        if let Some(result) = &best {
            results.insert_best(result)?;
        }
        let store = RunStore::new(config.runs_dir.clone())?;
        store.save_run(&manifest, &results, None)?;
        log_stored_run(&manifest.run_id, store.root());
        println!("\n✓ Stored run: {}", manifest.run_id);
    }
    Ok(())
}

fn log_run_counts(combinations: usize, skipped: usize, evaluations: usize) {
    info!(combinations, evaluations, "screening finished");
    if skipped > 0 {
        warn!(skipped, "combinations without a feasible blend");
    }
}

fn log_stored_run(run_id: &str, root: &Path) {
    info!(run_id, dir = %root.display(), "run stored");
}

fn cmd_show(config: &ScreeningConfig, run_id: Option<&str>, coarse: bool) -> AppResult<()> {
    let store = RunStore::new(config.runs_dir.clone())?;

    let Some(run_id) = run_id else {
        let runs = store.list_runs()?;
        if runs.is_empty() {
            println!("No stored runs in {}", store.root().display());
        } else {
            println!("Stored runs in {}:", store.root().display());
            for manifest in runs {
                println!(
                    "  {}  {}  {}  ({} oracle)",
                    manifest.run_id,
                    manifest.timestamp,
                    describe_kind(&manifest.kind),
                    manifest.oracle
                );
            }
        }
        return Ok(());
    };

    let manifest = store.load_manifest(run_id)?;
    let results = store.load_results(run_id)?;

    println!("Run: {}", manifest.run_id);
    println!("  Timestamp: {}", manifest.timestamp);
    println!("  Kind: {}", describe_kind(&manifest.kind));
    println!("  Oracle: {}", manifest.oracle);
    println!("  Engine version: {}", manifest.engine_version);
    println!("  Boundary: {}", manifest.boundary.label());
    if let Some(reference) = &manifest.reference {
        println!(
            "  Baseline COP: {:.3}, VCC band: {:.0}..{:.0} kJ/m³",
            reference.baseline_cop, reference.vcc_min, reference.vcc_max
        );
    }
    println!(
        "  Combinations: {} ({} skipped), evaluations: {}",
        manifest.combinations_evaluated, manifest.combinations_skipped, manifest.tasks_evaluated
    );

    let mut best = unique_results(results.results());
    best.sort_by(|a, b| {
        let cop = |r: &CycleResult| r.cop().unwrap_or(f64::NEG_INFINITY);
        cop(*b).total_cmp(&cop(*a))
    });
    if best.is_empty() {
        println!("\nNo stored blends");
    } else {
        print_ranking_header();
        for (rank, result) in best.iter().enumerate() {
            let gain = manifest
                .reference
                .zip(result.cop())
                .map(|(reference, cop)| reference.cop_gain_percent(cop));
            print_ranking_row(rank + 1, result, gain);
        }
    }

    if coarse && store.has_run(run_id) {
        match store.load_coarse(run_id) {
            Ok(scans) => {
                println!("\nCoarse scans:");
                for result in unique_results(scans.results()) {
                    println!("  {}", result);
                }
            }
            Err(_) => println!("\nRun has no coarse scans"),
        }
    }
    Ok(())
}

fn describe_kind(kind: &RunKind) -> String {
    let keys = |species: &[Species]| {
        species
            .iter()
            .map(|s| s.key())
            .collect::<Vec<_>>()
            .join(",")
    };
    match kind {
        RunKind::Screen { arity, candidates } => {
            format!("screen {} [{}]", arity, keys(candidates.as_slice()))
        }
        RunKind::Refine { species } => format!("refine {}", keys(species.as_slice())),
        RunKind::Evaluate { mixture } => format!("evaluate {}", mixture.label()),
    }
}

/// Drop the mirrored copies binary results are stored with.
fn unique_results(results: Vec<&CycleResult>) -> Vec<&CycleResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| {
            let mut parts: Vec<(Species, u64)> = r
                .species()
                .into_iter()
                .zip(r.fractions().into_iter().map(f64::to_bits))
                .collect();
            parts.sort();
            seen.insert(parts)
        })
        .collect()
}

fn print_reference(reference: &ReferenceValues, baseline: &CycleResult) {
    println!("\nBaseline: {}", baseline);
    println!(
        "  VCC band: {:.0}..{:.0} kJ/m³",
        reference.vcc_min, reference.vcc_max
    );
}

fn print_ranking_header() {
    println!(
        "\n{:>4}  {:<40} {:>7} {:>8} {:>8} {:>7} {:>7} {:>6} {:>6}",
        "Rank", "Blend", "COP", "Gain %", "VCC", "T2", "P2", "Pinch", "Glide"
    );
}

fn print_ranking_row(rank: usize, result: &CycleResult, gain: Option<f64>) {
    let Some(s) = result.summary() else {
        println!(
            "{:>4}  {:<40} failed ({})",
            rank,
            result.mixture.label(),
            result.error().map(|e| e.as_str()).unwrap_or("unknown")
        );
        return;
    };
    let gain = gain.map_or_else(|| "-".to_string(), |g| format!("{:+.2}", g));
    println!(
        "{:>4}  {:<40} {:>7.3} {:>8} {:>8.0} {:>7.1} {:>7.2} {:>6.2} {:>6.2}",
        rank,
        result.mixture.label(),
        s.cop,
        gain,
        s.vcc,
        s.points.discharge.temperature,
        s.points.discharge.pressure,
        s.pinch,
        s.glide.max()
    );
}

fn print_result_details(result: &CycleResult) {
    println!("Mixture: {}", result.mixture.label());
    let s = match &result.outcome {
        CycleOutcome::Success(s) => s,
        CycleOutcome::Failure(kind) => {
            println!("✗ Evaluation failed: {}", kind);
            return;
        }
    };

    println!("  COP: {:.4}", s.cop);
    println!("  VCC: {:.1} kJ/m³", s.vcc);
    println!("  Condenser approach: {:.1} K", s.approach);
    println!("  Pinch: {:.2} K", s.pinch);
    println!(
        "  Glide: condenser {:.2} K, evaporator {:.2} K",
        s.glide.condenser, s.glide.evaporator
    );
    println!(
        "  Mass flow ratio: hot {:.4}, cold {:.4}",
        s.mass_flow_ratio.hot, s.mass_flow_ratio.cold
    );
    println!(
        "  Volume flow ratio: hot {:.4}, cold {:.4}",
        s.volume_flow_ratio.hot, s.volume_flow_ratio.cold
    );

    println!(
        "\n  {:<18} {:>9} {:>9} {:>10} {:>9} {:>9} {:>8}",
        "State", "P [bar]", "T [°C]", "h [kJ/kg]", "s", "ρ", "Q"
    );
    let rows: [(&str, &PointState); 8] = [
        ("1 suction", &s.points.suction),
        ("2 discharge", &s.points.discharge),
        ("3 condenser out", &s.points.condenser_outlet),
        ("4 evaporator in", &s.points.evaporator_inlet),
        ("cond. sat. liquid", &s.saturation.condensing_liquid),
        ("cond. sat. vapor", &s.saturation.condensing_vapor),
        ("evap. sat. liquid", &s.saturation.evaporating_liquid),
        ("evap. sat. vapor", &s.saturation.evaporating_vapor),
    ];
    for (name, state) in rows {
        println!(
            "  {:<18} {:>9.3} {:>9.2} {:>10.2} {:>9.4} {:>9.2} {:>8.3}",
            name,
            state.pressure,
            state.temperature,
            state.enthalpy,
            state.entropy,
            state.density,
            state.quality
        );
    }
}

fn progress_reporter() -> ProgressReporter {
    Arc::new(|event: Progress| match event {
        Progress::BatchStarted { total } => {
            print!("\r  evaluating {} compositions", total);
            let _ = io::stdout().flush();
        }
        Progress::TaskCompleted { done, total } => {
            if done == total || done % 4 == 0 {
                render_progress(event.fraction(), done, total);
            }
        }
        Progress::BatchFinished { .. } => clear_progress_line(),
    })
}

fn render_progress(fraction: f64, done: usize, total: usize) {
    let width = 28usize;
    let filled = ((fraction * width as f64).round() as usize).min(width);
    print!(
        "\r[{}{}] {:>6.2}%  {}/{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled)),
        fraction * 100.0,
        done,
        total
    );
    let _ = io::stdout().flush();
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(80));
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rm_cycle::{BoundaryConditions, CycleErrorKind};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn evaluate_parses_species_lists() {
        let cli = Cli::try_parse_from([
            "refmix", "-vv", "evaluate", "--species", "PROPANE,ISOBUTANE", "--fractions",
            "0.7,0.3",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);
        let Commands::Evaluate {
            species, fractions, ..
        } = cli.command
        else {
            panic!("expected evaluate");
        };
        assert_eq!(species, vec![Species::Propane, Species::Isobutane]);
        assert_eq!(fractions, vec![0.7, 0.3]);
    }

    #[test]
    fn refine_takes_two_or_three_species() {
        assert!(Cli::try_parse_from(["refmix", "refine", "PROPANE"]).is_err());
        assert!(Cli::try_parse_from(["refmix", "refine", "PROPANE", "DME"]).is_ok());
        assert!(Cli::try_parse_from(["refmix", "refine", "PROPANE", "UNOBTAINIUM"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["refmix", "screen", "--arity", "ternary", "-w", "3", "-q"])
            .expect("parse");
        assert_eq!(cli.workers, Some(3));
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Commands::Screen {
                arity: Some(Arity::Ternary),
                ..
            }
        ));
    }

    #[test]
    fn mirrored_results_are_listed_once() {
        let boundary = BoundaryConditions::default();
        let a = CycleResult::failure(
            MixtureComposition::binary(Species::Propane, Species::Isobutane, 0.25).expect("mix"),
            boundary,
            CycleErrorKind::LowPinch,
        );
        let b = CycleResult::failure(
            MixtureComposition::binary(Species::Isobutane, Species::Propane, 0.75).expect("mix"),
            boundary,
            CycleErrorKind::LowPinch,
        );
        let c = CycleResult::failure(
            MixtureComposition::binary(Species::Isobutane, Species::Propane, 0.5).expect("mix"),
            boundary,
            CycleErrorKind::LowPinch,
        );
        assert_eq!(unique_results(vec![&a, &b, &c]).len(), 2);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn captured_logs(f: impl FnOnce()) -> String {
        let sink = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = sink.0.lock().expect("lock").clone();
        String::from_utf8(bytes).expect("utf-8 logs")
    }

    #[test]
    fn run_events_are_logged() {
        let logs = captured_logs(|| {
            log_run_counts(10, 3, 210);
            log_stored_run("abc123", Path::new("runs"));
        });
        assert!(logs.contains("screening finished"), "{logs}");
        assert!(logs.contains("evaluations=210"), "{logs}");
        assert!(logs.contains("WARN") && logs.contains("skipped=3"), "{logs}");
        assert!(logs.contains("run stored") && logs.contains("abc123"), "{logs}");
    }

    #[test]
    fn complete_screen_logs_no_warning() {
        let logs = captured_logs(|| log_run_counts(10, 0, 210));
        assert!(logs.contains("screening finished"), "{logs}");
        assert!(!logs.contains("WARN"), "{logs}");
    }
}
