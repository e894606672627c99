//! Suite Orchestrator
//!
//! Runs an ordered collection of benchmarks one after another and keeps
//! their runs for comparison. Benchmarks never run concurrently.
//!
//! In queue mode each benchmark is detached from the front of the suite
//! once its run finishes, so a queued suite is empty after a full pass.
//!
//! Listeners cannot borrow the suite while it runs. They push through an
//! [`Enqueuer`] instead; pushed benchmarks join the back of the suite before
//! the next one is fetched.

use crate::benchmark::Benchmark;
use crate::clock::ClockSource;
use crate::event::{Emitter, Event, EventKind, Target};
use crate::run::BenchmarkRun;
use crate::scheduler::{AbortHandle, Execution};
use paceline_stats::Ordering;
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// Ordered container operations shared by benchmark collections.
pub trait Collection {
    /// Element type
    type Item;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Whether the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append to the back.
    fn push(&mut self, item: Self::Item);

    /// Element at `index`, front first.
    fn get(&self, index: usize) -> Option<&Self::Item>;

    /// Detach the front element.
    fn shift(&mut self) -> Option<Self::Item>;

    /// Keep only the elements matching `keep`.
    fn retain(&mut self, keep: impl FnMut(&Self::Item) -> bool);

    /// Elements in order.
    fn iter(&self) -> impl Iterator<Item = &Self::Item>;
}

/// Cloneable handle that appends benchmarks to a suite, even mid-run.
#[derive(Debug, Clone)]
pub struct Enqueuer {
    tx: mpsc::UnboundedSender<Benchmark>,
}

impl Enqueuer {
    /// Append a benchmark. Returns `false` once the suite is gone.
    pub fn push(&self, bench: Benchmark) -> bool {
        self.tx.send(bench).is_ok()
    }
}

/// An ordered collection of benchmarks.
#[derive(Debug)]
pub struct Suite {
    name: String,
    benchmarks: VecDeque<Benchmark>,
    pending_tx: mpsc::UnboundedSender<Benchmark>,
    pending: mpsc::UnboundedReceiver<Benchmark>,
    results: Vec<BenchmarkRun>,
    events: Emitter,
    abort: AbortHandle,
    queued: bool,
    next_index: usize,
}

impl Suite {
    /// An empty suite.
    pub fn new(name: impl Into<String>) -> Self {
        let (pending_tx, pending) = mpsc::unbounded_channel();
        Self {
            name: name.into(),
            benchmarks: VecDeque::new(),
            pending_tx,
            pending,
            results: Vec::new(),
            events: Emitter::new(),
            abort: AbortHandle::new(),
            queued: false,
            next_index: 0,
        }
    }

    /// Detach benchmarks from the front as they finish.
    pub fn queued(mut self, queued: bool) -> Self {
        self.queued = queued;
        self
    }

    /// Append a benchmark (builder style).
    pub fn with(mut self, bench: Benchmark) -> Self {
        self.benchmarks.push_back(bench);
        self
    }

    /// Append a benchmark.
    pub fn add(&mut self, bench: Benchmark) -> &mut Self {
        self.benchmarks.push_back(bench);
        self
    }

    /// Handle for appending benchmarks from listeners or other threads.
    pub fn enqueuer(&self) -> Enqueuer {
        Enqueuer {
            tx: self.pending_tx.clone(),
        }
    }

    /// Listen for suite events and every relayed benchmark event.
    pub fn on(&mut self, kind: EventKind, listener: impl FnMut(&mut Event<'_>) + Send + 'static) {
        self.events.on(kind, listener);
    }

    /// Listener registry.
    pub fn events_mut(&mut self) -> &mut Emitter {
        &mut self.events
    }

    /// Suite name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether queue mode is on.
    pub fn is_queued(&self) -> bool {
        self.queued
    }

    /// Runs from the last execution, in execution order.
    pub fn results(&self) -> &[BenchmarkRun] {
        &self.results
    }

    /// Handle that aborts the in-flight benchmark and skips the rest.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Fastest runs of the last execution.
    pub fn fastest(&self) -> Vec<&BenchmarkRun> {
        fastest(&self.results)
    }

    /// Slowest runs of the last execution.
    pub fn slowest(&self) -> Vec<&BenchmarkRun> {
        slowest(&self.results)
    }

    /// Discard results and arm a fresh abort handle.
    ///
    /// Benchmarks already detached in queue mode are not restored.
    pub fn reset(&mut self) {
        self.results.clear();
        self.abort = AbortHandle::new();
        tracing::debug!(suite = %self.name, "suite reset");
        self.emit(EventKind::Reset);
    }

    /// Run every benchmark on the current thread.
    pub fn run_sync(&mut self, clock: &ClockSource) -> &[BenchmarkRun] {
        if self.begin() {
            while !self.abort.is_aborted() {
                self.take_pending();
                let Some(bench) = self.benchmarks.get_mut(self.next_index) else {
                    break;
                };
                let run = Execution::new(bench, clock)
                    .with_abort_handle(self.abort.clone())
                    .relay_to(&mut self.events)
                    .run_sync();
                self.record(run);
            }
        }
        self.finish()
    }

    /// Run every benchmark asynchronously, one at a time.
    pub async fn run_async(
        &mut self,
        clock: &ClockSource,
        yield_between_cycles: bool,
    ) -> &[BenchmarkRun] {
        if self.begin() {
            while !self.abort.is_aborted() {
                self.take_pending();
                let Some(bench) = self.benchmarks.get_mut(self.next_index) else {
                    break;
                };
                let run = Execution::new(bench, clock)
                    .with_abort_handle(self.abort.clone())
                    .relay_to(&mut self.events)
                    .run_async(yield_between_cycles)
                    .await;
                self.record(run);
            }
        }
        self.finish()
    }

    fn begin(&mut self) -> bool {
        self.results.clear();
        self.next_index = 0;
        tracing::info!(
            suite = %self.name,
            benchmarks = self.benchmarks.len(),
            queued = self.queued,
            "starting suite"
        );
        if self.emit(EventKind::Start) {
            self.abort.abort();
            return false;
        }
        !self.abort.is_aborted()
    }

    fn take_pending(&mut self) {
        while let Ok(bench) = self.pending.try_recv() {
            tracing::debug!(suite = %self.name, benchmark = bench.name(), "benchmark enqueued");
            self.benchmarks.push_back(bench);
        }
    }

    fn record(&mut self, run: BenchmarkRun) {
        self.results.push(run);
        if self.queued {
            self.benchmarks.pop_front();
        } else {
            self.next_index += 1;
        }
    }

    fn finish(&mut self) -> &[BenchmarkRun] {
        if self.abort.is_aborted() {
            tracing::info!(suite = %self.name, completed = self.results.len(), "suite aborted");
            self.emit(EventKind::Abort);
        }
        self.emit(EventKind::Complete);
        tracing::info!(
            suite = %self.name,
            runs = self.results.len(),
            errors = self.results.iter().filter(|r| r.error().is_some()).count(),
            "suite complete"
        );
        &self.results
    }

    fn emit(&mut self, kind: EventKind) -> bool {
        let mut event = Event::new(
            kind,
            Target::Suite {
                name: &self.name,
                results: &self.results,
            },
        );
        self.events.emit(&mut event);
        event.cancelled
    }
}

impl Collection for Suite {
    type Item = Benchmark;

    fn len(&self) -> usize {
        self.benchmarks.len()
    }

    fn push(&mut self, item: Benchmark) {
        self.benchmarks.push_back(item);
    }

    fn get(&self, index: usize) -> Option<&Benchmark> {
        self.benchmarks.get(index)
    }

    fn shift(&mut self) -> Option<Benchmark> {
        self.benchmarks.pop_front()
    }

    fn retain(&mut self, keep: impl FnMut(&Benchmark) -> bool) {
        self.benchmarks.retain(keep);
    }

    fn iter(&self) -> impl Iterator<Item = &Benchmark> {
        self.benchmarks.iter()
    }
}

/// Runs tied for fastest.
///
/// Only measured runs take part. They are ordered by `mean + margin of
/// error`, and every run indistinguishable from the best is returned.
pub fn fastest(runs: &[BenchmarkRun]) -> Vec<&BenchmarkRun> {
    extremes(runs, false)
}

/// Runs tied for slowest, mirroring [`fastest`].
pub fn slowest(runs: &[BenchmarkRun]) -> Vec<&BenchmarkRun> {
    extremes(runs, true)
}

fn extremes(runs: &[BenchmarkRun], slowest: bool) -> Vec<&BenchmarkRun> {
    let mut measured: Vec<&BenchmarkRun> = runs.iter().filter(|r| r.is_measured()).collect();
    measured.sort_by(|a, b| {
        let order = a.stats().upper_bound().total_cmp(&b.stats().upper_bound());
        if slowest { order.reverse() } else { order }
    });

    let Some(&extreme) = measured.first() else {
        return Vec::new();
    };
    measured
        .into_iter()
        .filter(|run| run.compare(extreme) == Ordering::Indeterminate)
        .collect()
}
