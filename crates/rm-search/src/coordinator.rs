//! Parallel batch evaluation on a fixed pool of worker threads.
//!
//! Every worker builds its own oracle from the factory, once, before taking
//! any task. Workers claim chunks of task indices from a shared counter and
//! send back `(index, result)` pairs, so the output order always matches the
//! input order regardless of chunking or scheduling.

use crate::error::{SearchError, SearchResult};
use crate::progress::{Progress, ProgressReporter};
use crate::settings::ExecutorSettings;
use rm_cycle::{BoundaryConditions, CycleErrorKind, CycleEvaluator, CycleResult};
use rm_fluids::{FluidResult, MixtureComposition, OracleFactory, PropertyOracle};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One evaluation request.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub mixture: MixtureComposition,
    pub boundary: BoundaryConditions,
}

impl Task {
    pub fn new(mixture: MixtureComposition, boundary: BoundaryConditions) -> Self {
        Self { mixture, boundary }
    }
}

/// Evaluation context of one pool thread.
pub struct Worker {
    id: usize,
    evaluator: CycleEvaluator,
    oracle: Option<Box<dyn PropertyOracle>>,
}

impl Worker {
    /// A worker without an oracle; call [`Worker::initialize`] before use.
    pub fn new(id: usize, evaluator: CycleEvaluator) -> Self {
        Self {
            id,
            evaluator,
            oracle: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_ready(&self) -> bool {
        self.oracle.is_some()
    }

    /// Build this worker's oracle. Runs once per worker.
    pub fn initialize(&mut self, factory: &dyn OracleFactory) -> FluidResult<()> {
        if self.oracle.is_none() {
            let oracle = factory.create()?;
            debug!(worker = self.id, oracle = oracle.name(), "worker oracle ready");
            self.oracle = Some(oracle);
        }
        Ok(())
    }

    /// Evaluate one task; an uninitialized worker answers `OracleNotReady`.
    pub fn run_task(&mut self, task: &Task) -> CycleResult {
        match self.oracle.as_deref_mut() {
            Some(oracle) => self.evaluator.evaluate(oracle, &task.mixture, &task.boundary),
            None => CycleResult::failure(
                task.mixture.clone(),
                task.boundary,
                CycleErrorKind::OracleNotReady,
            ),
        }
    }
}

enum WorkerMessage {
    SetupFailed { worker: usize, message: String },
    Started { worker: usize, index: usize, chunk_end: usize },
    Done { worker: usize, index: usize, result: Box<CycleResult> },
}

/// Upper bound on one wait of the collecting thread.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Shared state of one batch.
struct Batch {
    tasks: Vec<Task>,
    next: AtomicUsize,
    requeued: Mutex<Vec<usize>>,
    stop: AtomicBool,
    chunk_size: usize,
}

impl Batch {
    fn new(tasks: Vec<Task>, chunk_size: usize) -> Self {
        Self {
            tasks,
            next: AtomicUsize::new(0),
            requeued: Mutex::new(Vec::new()),
            stop: AtomicBool::new(false),
            chunk_size,
        }
    }

    fn requeued(&self) -> MutexGuard<'_, Vec<usize>> {
        self.requeued.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Claim the next chunk of task indices, if any remain. Requeued tasks go
    /// first, one at a time.
    fn claim(&self) -> Option<Range<usize>> {
        if self.stopped() {
            return None;
        }
        if let Some(index) = self.requeued().pop() {
            return Some(index..index + 1);
        }
        let start = self.next.fetch_add(self.chunk_size, Ordering::Relaxed);
        (start < self.tasks.len()).then(|| start..(start + self.chunk_size).min(self.tasks.len()))
    }

    /// Hand unstarted indices back to the pool, lowest first.
    fn requeue(&self, indices: Range<usize>) {
        self.requeued().extend(indices.rev());
    }
}

/// A pool thread and its detach flag.
struct PoolWorker {
    handle: JoinHandle<()>,
    abandoned: Arc<AtomicBool>,
}

impl PoolWorker {
    fn detach(self) {
        self.abandoned.store(true, Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Task a worker reported as started and has not finished yet.
struct Running {
    index: usize,
    chunk_end: usize,
    since: Instant,
}

/// Collected answers of one batch.
struct Outcomes {
    results: Vec<Option<CycleResult>>,
    running: HashMap<usize, Running>,
    done: usize,
    timed_out: usize,
}

impl Outcomes {
    fn new(total: usize) -> Self {
        Self {
            results: vec![None; total],
            running: HashMap::new(),
            done: 0,
            timed_out: 0,
        }
    }

    /// Store the first answer for `index`; later duplicates are dropped.
    fn record(&mut self, index: usize, result: CycleResult) -> bool {
        if self.results[index].is_some() {
            return false;
        }
        self.results[index] = Some(result);
        self.done += 1;
        true
    }

    /// Workers whose current task has run for `limit` or longer.
    fn expired(&self, limit: Duration) -> Vec<usize> {
        let now = Instant::now();
        let mut workers: Vec<usize> = self
            .running
            .iter()
            .filter(|(_, r)| now.duration_since(r.since) >= limit)
            .map(|(&worker, _)| worker)
            .collect();
        workers.sort_unstable();
        workers
    }

    /// How long to wait for the next message.
    fn wait(&self, timeout: Option<Duration>) -> Duration {
        let Some(limit) = timeout else {
            return POLL_INTERVAL;
        };
        let now = Instant::now();
        self.running
            .values()
            .map(|r| (r.since + limit).saturating_duration_since(now))
            .min()
            .map_or(POLL_INTERVAL, |d| d.min(POLL_INTERVAL))
    }
}

/// Fixed-size worker pool with per-worker oracle initialization.
pub struct Coordinator {
    factory: Arc<dyn OracleFactory>,
    evaluator: CycleEvaluator,
    settings: ExecutorSettings,
    reporter: Option<ProgressReporter>,
}

impl Coordinator {
    pub fn new(
        factory: Arc<dyn OracleFactory>,
        evaluator: CycleEvaluator,
        settings: ExecutorSettings,
    ) -> SearchResult<Self> {
        settings.validate()?;
        Ok(Self {
            factory,
            evaluator,
            settings,
            reporter: None,
        })
    }

    pub fn with_progress(mut self, reporter: ProgressReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn worker_count(&self) -> usize {
        self.settings.worker_count()
    }

    fn report(&self, event: Progress) {
        if let Some(reporter) = &self.reporter {
            reporter(event);
        }
    }

    /// Evaluate `tasks` in parallel; `results[i]` answers `tasks[i]`.
    ///
    /// Evaluation failures stay inside their own result. The batch itself
    /// fails only when a worker cannot build its oracle. With a task timeout
    /// set, a task running longer than the limit is reported as
    /// `OracleTimeout`; its worker is detached, the unstarted rest of its
    /// chunk is requeued and a fresh worker takes its place.
    pub fn evaluate_batch(&self, tasks: Vec<Task>) -> SearchResult<Vec<CycleResult>> {
        let total = tasks.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let chunk_size = self.settings.chunk_size;
        let n_workers = self.worker_count().min(total.div_ceil(chunk_size)).max(1);
        debug!(tasks = total, workers = n_workers, chunk_size, "batch started");
        self.report(Progress::BatchStarted { total });

        let batch = Arc::new(Batch::new(tasks, chunk_size));
        let (tx, rx) = mpsc::channel();

        let mut pool = HashMap::with_capacity(n_workers);
        for id in 0..n_workers {
            pool.insert(id, self.spawn_worker(id, Arc::clone(&batch), tx.clone())?);
        }
        let mut next_id = n_workers;

        let timeout = self.settings.task_timeout();
        let mut outcomes = Outcomes::new(total);

        while outcomes.done < total {
            match rx.recv_timeout(outcomes.wait(timeout)) {
                Ok(message) => {
                    if let Err(e) = self.receive(&mut outcomes, message) {
                        batch.stop.store(true, Ordering::Relaxed);
                        return Err(e);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    let idle = pool.values().all(PoolWorker::is_finished);
                    if idle && (timeout.is_none() || outcomes.running.is_empty()) {
                        while let Ok(message) = rx.try_recv() {
                            self.receive(&mut outcomes, message)?;
                        }
                        if outcomes.done < total {
                            warn!(outstanding = total - outcomes.done, "all workers exited early");
                        }
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let Some(limit) = timeout else { continue };
            for worker in outcomes.expired(limit) {
                let Some(task) = outcomes.running.remove(&worker) else {
                    continue;
                };
                if let Some(hung) = pool.remove(&worker) {
                    hung.detach();
                }
                warn!(worker, index = task.index, "task exceeded timeout, detaching worker");
                let unanswered = CycleResult::failure(
                    batch.tasks[task.index].mixture.clone(),
                    batch.tasks[task.index].boundary,
                    CycleErrorKind::OracleTimeout,
                );
                if outcomes.record(task.index, unanswered) {
                    outcomes.timed_out += 1;
                    self.report(Progress::TaskCompleted {
                        done: outcomes.done,
                        total,
                    });
                }
                batch.requeue(task.index + 1..task.chunk_end);
                if outcomes.done < total {
                    pool.insert(next_id, self.spawn_worker(next_id, Arc::clone(&batch), tx.clone())?);
                    next_id += 1;
                }
            }
        }

        batch.stop.store(true, Ordering::Relaxed);
        if timeout.is_none() {
            for worker in pool.into_values() {
                if worker.handle.join().is_err() {
                    warn!("worker thread panicked");
                }
            }
        }

        self.report(Progress::BatchFinished {
            total,
            timed_out: outcomes.timed_out,
        });

        Ok(outcomes
            .results
            .into_iter()
            .zip(batch.tasks.iter())
            .map(|(result, task)| {
                result.unwrap_or_else(|| {
                    CycleResult::failure(
                        task.mixture.clone(),
                        task.boundary,
                        CycleErrorKind::OracleFailure,
                    )
                })
            })
            .collect())
    }

    fn receive(&self, outcomes: &mut Outcomes, message: WorkerMessage) -> SearchResult<()> {
        match message {
            WorkerMessage::Started {
                worker,
                index,
                chunk_end,
            } => {
                outcomes.running.insert(
                    worker,
                    Running {
                        index,
                        chunk_end,
                        since: Instant::now(),
                    },
                );
            }
            WorkerMessage::Done {
                worker,
                index,
                result,
            } => {
                if outcomes.running.get(&worker).is_some_and(|r| r.index == index) {
                    outcomes.running.remove(&worker);
                }
                if outcomes.record(index, *result) {
                    self.report(Progress::TaskCompleted {
                        done: outcomes.done,
                        total: outcomes.results.len(),
                    });
                }
            }
            WorkerMessage::SetupFailed { worker, message } => {
                warn!(worker, %message, "worker oracle setup failed, aborting batch");
                return Err(SearchError::OracleSetup { message });
            }
        }
        Ok(())
    }

    fn spawn_worker(
        &self,
        id: usize,
        batch: Arc<Batch>,
        tx: Sender<WorkerMessage>,
    ) -> SearchResult<PoolWorker> {
        let factory = Arc::clone(&self.factory);
        let mut worker = Worker::new(id, self.evaluator.clone());
        let abandoned = Arc::new(AtomicBool::new(false));
        let detached = Arc::clone(&abandoned);
        let handle = thread::Builder::new()
            .name(format!("refmix-worker-{id}"))
            .spawn(move || {
                if let Err(e) = worker.initialize(factory.as_ref()) {
                    let _ = tx.send(WorkerMessage::SetupFailed {
                        worker: id,
                        message: e.to_string(),
                    });
                    return;
                }
                let cancelled = || detached.load(Ordering::Relaxed) || batch.stopped();
                while let Some(chunk) = batch.claim() {
                    let chunk_end = chunk.end;
                    for index in chunk {
                        if cancelled() {
                            return;
                        }
                        let started = WorkerMessage::Started {
                            worker: id,
                            index,
                            chunk_end,
                        };
                        if tx.send(started).is_err() {
                            return;
                        }
                        let result = worker.run_task(&batch.tasks[index]);
                        if detached.load(Ordering::Relaxed) {
                            return;
                        }
                        let message = WorkerMessage::Done {
                            worker: id,
                            index,
                            result: Box::new(result),
                        };
                        if tx.send(message).is_err() {
                            return;
                        }
                    }
                }
            })?;
        Ok(PoolWorker { handle, abandoned })
    }
}
