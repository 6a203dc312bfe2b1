//! Worker pool behavior: ordering, failure isolation, timeouts, setup errors.

use rm_cycle::{BoundaryConditions, CycleErrorKind, CycleEvaluator};
use rm_fluids::{
    CriticalPoint, FluidError, FluidResult, IdealMixtureOracle, IdealOracleFactory,
    MixtureComposition, OracleFactory, Property, PropertyMap, PropertyOracle, Species, StateSpec,
};
use rm_search::{Coordinator, ExecutorSettings, Progress, SearchError, Task};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn tasks(n: usize) -> Vec<Task> {
    (0..n)
        .map(|i| {
            let x = i as f64 / (n - 1) as f64;
            let mixture = MixtureComposition::binary(Species::Propane, Species::Isobutane, x)
                .expect("valid blend");
            Task::new(mixture, BoundaryConditions::default())
        })
        .collect()
}

fn coordinator(factory: Arc<dyn OracleFactory>, settings: ExecutorSettings) -> Coordinator {
    Coordinator::new(factory, CycleEvaluator::default(), settings).expect("valid settings")
}

#[test]
fn results_follow_input_order() {
    let input = tasks(9);
    let c = coordinator(
        Arc::new(IdealOracleFactory::default()),
        ExecutorSettings {
            workers: Some(4),
            chunk_size: 2,
            task_timeout_secs: None,
        },
    );
    let results = c.evaluate_batch(input.clone()).expect("batch runs");
    assert_eq!(results.len(), input.len());
    for (task, result) in input.iter().zip(&results) {
        assert_eq!(task.mixture, result.mixture);
    }
}

#[test]
fn parallel_matches_sequential() {
    let input = tasks(6);
    let settings = |workers| ExecutorSettings {
        workers: Some(workers),
        chunk_size: 1,
        task_timeout_secs: None,
    };
    let factory: Arc<dyn OracleFactory> = Arc::new(IdealOracleFactory::default());
    let serial = coordinator(Arc::clone(&factory), settings(1))
        .evaluate_batch(input.clone())
        .expect("serial batch");
    let parallel = coordinator(factory, settings(3))
        .evaluate_batch(input)
        .expect("parallel batch");
    assert_eq!(serial, parallel);
}

#[test]
fn oracle_failure_stays_in_its_task() {
    let input = tasks(5);
    let c = coordinator(
        Arc::new(IdealOracleFactory {
            failing: vec![Species::Isobutane],
        }),
        ExecutorSettings {
            workers: Some(2),
            ..ExecutorSettings::default()
        },
    );
    let results = c.evaluate_batch(input).expect("batch runs");
    // x = 1.0 is pure propane; every other point contains isobutane
    for r in &results[..4] {
        assert_eq!(r.error(), Some(CycleErrorKind::OracleFailure));
    }
    assert!(results[4].is_success());
}

#[test]
fn factory_failure_aborts_batch() {
    let factory = || -> FluidResult<Box<dyn PropertyOracle>> {
        Err(FluidError::Setup {
            message: "engine library missing".to_string(),
        })
    };
    let c = coordinator(Arc::new(factory), ExecutorSettings::default());
    let err = c.evaluate_batch(tasks(3)).unwrap_err();
    match err {
        SearchError::OracleSetup { message } => assert!(message.contains("engine library missing")),
        other => panic!("unexpected error: {other}"),
    }
}

/// Blocks on any blend containing dimethyl ether.
struct Hanging(IdealMixtureOracle);

impl PropertyOracle for Hanging {
    fn name(&self) -> &str {
        "hanging"
    }

    fn query(
        &mut self,
        mixture: &MixtureComposition,
        outputs: &[Property],
        spec: StateSpec,
    ) -> FluidResult<PropertyMap> {
        if mixture.mole_fraction(Species::DimethylEther) > 0.0 {
            thread::sleep(Duration::from_secs(5));
        }
        self.0.query(mixture, outputs, spec)
    }

    fn pure_critical_point(&mut self, species: Species) -> FluidResult<CriticalPoint> {
        self.0.pure_critical_point(species)
    }

    fn critical_point(&mut self, mixture: &MixtureComposition) -> FluidResult<CriticalPoint> {
        self.0.critical_point(mixture)
    }
}

fn hanging_factory() -> Arc<dyn OracleFactory> {
    let factory = || -> FluidResult<Box<dyn PropertyOracle>> {
        Ok(Box::new(Hanging(IdealMixtureOracle::new())))
    };
    Arc::new(factory)
}

fn dme_blend(x: f64) -> Task {
    let mixture = MixtureComposition::binary(Species::Propane, Species::DimethylEther, x)
        .expect("valid blend");
    Task::new(mixture, BoundaryConditions::default())
}

fn evaluated_alone(task: &Task) -> rm_cycle::CycleResult {
    CycleEvaluator::default().evaluate(
        &mut IdealMixtureOracle::new(),
        &task.mixture,
        &task.boundary,
    )
}

#[test]
fn hung_tasks_time_out_alone() {
    let mut input = vec![dme_blend(0.3), dme_blend(0.6)];
    input.extend(tasks(5));
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let c = coordinator(
        hanging_factory(),
        ExecutorSettings {
            workers: Some(2),
            chunk_size: 1,
            task_timeout_secs: Some(1.0),
        },
    )
    .with_progress(Arc::new(move |p: Progress| sink.lock().expect("lock").push(p)));

    let results = c.evaluate_batch(input.clone()).expect("batch returns");
    assert_eq!(results.len(), input.len());
    assert_eq!(results[0].error(), Some(CycleErrorKind::OracleTimeout));
    assert_eq!(results[1].error(), Some(CycleErrorKind::OracleTimeout));
    for (task, result) in input.iter().zip(&results).skip(2) {
        assert_eq!(result, &evaluated_alone(task), "{}", task.mixture.label());
    }
    assert_eq!(
        events.lock().expect("lock").last(),
        Some(&Progress::BatchFinished {
            total: 7,
            timed_out: 2
        })
    );
}

#[test]
fn rest_of_a_hung_chunk_is_still_evaluated() {
    let boundary = BoundaryConditions::default();
    let input = vec![
        Task::new(MixtureComposition::pure(Species::Propane), boundary),
        dme_blend(0.5),
        Task::new(
            MixtureComposition::binary(Species::Propane, Species::Isobutane, 0.5)
                .expect("valid blend"),
            boundary,
        ),
        Task::new(MixtureComposition::pure(Species::Isobutane), boundary),
    ];
    let c = coordinator(
        hanging_factory(),
        ExecutorSettings {
            workers: Some(1),
            chunk_size: 2,
            task_timeout_secs: Some(1.0),
        },
    );
    let results = c.evaluate_batch(input.clone()).expect("batch returns");
    assert!(results[0].is_success());
    assert_eq!(results[1].error(), Some(CycleErrorKind::OracleTimeout));
    assert_eq!(results[2], evaluated_alone(&input[2]));
    assert_eq!(results[3], evaluated_alone(&input[3]));
}

#[test]
fn progress_is_reported() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let c = coordinator(
        Arc::new(IdealOracleFactory::default()),
        ExecutorSettings {
            workers: Some(2),
            ..ExecutorSettings::default()
        },
    )
    .with_progress(Arc::new(move |p: Progress| sink.lock().expect("lock").push(p)));
    c.evaluate_batch(tasks(4)).expect("batch runs");

    let events = events.lock().expect("lock");
    assert_eq!(events.first(), Some(&Progress::BatchStarted { total: 4 }));
    assert_eq!(
        events.last(),
        Some(&Progress::BatchFinished {
            total: 4,
            timed_out: 0
        })
    );
    let completed = events
        .iter()
        .filter(|p| matches!(p, Progress::TaskCompleted { .. }))
        .count();
    assert_eq!(completed, 4);
    assert_eq!(events[events.len() - 2].fraction(), 1.0);
}
