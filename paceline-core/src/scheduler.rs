//! Execution Scheduler
//!
//! Drives one benchmark run from `Pending` to `Completed` or `Aborted`.
//! [`Execution::run_sync`] loops without pausing; [`Execution::run_async`]
//! runs the same state machine and hands control back to the runtime
//! between cycles.
//!
//! Every cycle:
//! 1. setup (untimed)
//! 2. `count` invocations of the test (timed)
//! 3. teardown (untimed)
//! 4. calibrate, then either retry with a larger count or accept the period
//!
//! Panics in user callbacks are caught, recorded on the run and broadcast
//! as an `error` event. They never escape the scheduler.

use crate::benchmark::{Benchmark, Callback, Deferred, Settings, Test};
use crate::calibrate::{Calibrator, Step};
use crate::clock::ClockSource;
use crate::collector::Collector;
use crate::error::{RunError, panic_message};
use crate::event::{Emitter, Event, EventKind, Target};
use crate::run::BenchmarkRun;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const UNRESOLVED: &str = "deferred test dropped its handle without resolving";
const BLOCKING_IN_RUNTIME: &str =
    "deferred test cannot block inside an async runtime; use run_async";

/// Shared, idempotent abort flag.
///
/// Aborts are observed at cycle boundaries; a cycle already in flight
/// always finishes.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// A fresh, unset handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an abort. Repeated calls have no further effect.
    pub fn abort(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether an abort was requested.
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One pending execution of a benchmark.
pub struct Execution<'a> {
    bench: &'a mut Benchmark,
    clock: &'a ClockSource,
    abort: AbortHandle,
    relay: Option<&'a mut Emitter>,
}

impl<'a> Execution<'a> {
    /// Prepare to run `bench` against `clock`.
    pub fn new(bench: &'a mut Benchmark, clock: &'a ClockSource) -> Self {
        Self {
            bench,
            clock,
            abort: AbortHandle::new(),
            relay: None,
        }
    }

    /// Observe an externally owned abort handle instead of a private one.
    pub fn with_abort_handle(mut self, handle: AbortHandle) -> Self {
        self.abort = handle;
        self
    }

    /// Forward every event to `emitter` after the benchmark's own listeners.
    pub fn relay_to(mut self, emitter: &'a mut Emitter) -> Self {
        self.relay = Some(emitter);
        self
    }

    /// Handle that aborts this execution.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Run every cycle on the current thread.
    ///
    /// Deferred tests block until resolved, so this must not be called
    /// from inside an async runtime when the benchmark is deferred.
    pub fn run_sync(self) -> BenchmarkRun {
        let (mut driver, mut callbacks) = self.split();
        if driver.begin() {
            while !driver.should_stop() {
                let outcome = callbacks.cycle_blocking(driver.clock, driver.run.count());
                if !driver.after_cycle(outcome) {
                    break;
                }
            }
        }
        driver.finish()
    }

    /// Run every cycle, yielding to the runtime between cycles when
    /// `yield_between_cycles` is set.
    ///
    /// The configured delay is slept between cycles; a zero delay yields
    /// once instead.
    pub async fn run_async(self, yield_between_cycles: bool) -> BenchmarkRun {
        let (mut driver, mut callbacks) = self.split();
        if driver.begin() {
            while !driver.should_stop() {
                let outcome = callbacks.cycle_async(driver.clock, driver.run.count()).await;
                if !driver.after_cycle(outcome) {
                    break;
                }
                if yield_between_cycles {
                    pause(driver.settings.delay).await;
                }
            }
        }
        driver.finish()
    }

    fn split(self) -> (Driver<'a>, Callbacks<'a>) {
        let Execution {
            bench,
            clock,
            abort,
            relay,
        } = self;
        let Benchmark {
            name,
            test,
            setup,
            teardown,
            options,
            events,
        } = bench;

        let settings = options.resolve(clock);
        let driver = Driver {
            run: BenchmarkRun::new(name.clone(), settings.initial_count),
            calibrator: Calibrator::new(settings.min_time),
            collector: Collector::new(settings.min_samples, settings.max_time),
            settings,
            clock,
            abort,
            events,
            relay,
            started: clock.now(),
        };
        let callbacks = Callbacks {
            test,
            setup,
            teardown,
        };
        (driver, callbacks)
    }
}

/// Run `bench` to completion on the current thread.
pub fn run_sync(bench: &mut Benchmark, clock: &ClockSource) -> BenchmarkRun {
    Execution::new(bench, clock).run_sync()
}

/// Run `bench` to completion, yielding between cycles when asked.
pub async fn run_async(
    bench: &mut Benchmark,
    clock: &ClockSource,
    yield_between_cycles: bool,
) -> BenchmarkRun {
    Execution::new(bench, clock)
        .run_async(yield_between_cycles)
        .await
}

async fn pause(delay: f64) {
    if delay > 0.0 {
        let delay = Duration::try_from_secs_f64(delay).unwrap_or(Duration::MAX);
        tokio::time::sleep(delay).await;
    } else {
        tokio::task::yield_now().await;
    }
}

/// Durations of one cycle, in seconds.
#[derive(Debug, Clone, Copy)]
struct CycleTiming {
    /// The `count` invocations only
    timed: f64,
    /// Setup through teardown
    total: f64,
}

struct Callbacks<'a> {
    test: &'a mut Test,
    setup: &'a mut Option<Callback>,
    teardown: &'a mut Option<Callback>,
}

impl Callbacks<'_> {
    fn cycle_blocking(&mut self, clock: &ClockSource, count: u64) -> Result<CycleTiming, RunError> {
        let begin = clock.now();
        self.run_setup()?;

        let timed = match &mut *self.test {
            Test::Sync(f) => invoke_sync(f.as_mut(), clock, count),
            // Blocking on the handle would panic on a runtime worker.
            Test::Deferred(_) if tokio::runtime::Handle::try_current().is_ok() => {
                Err(RunError::TestCallable {
                    message: BLOCKING_IN_RUNTIME.to_string(),
                })
            }
            Test::Deferred(f) => {
                let start = clock.now();
                let mut result = Ok(());
                for _ in 0..count {
                    let (deferred, rx) = Deferred::channel();
                    result = call_deferred(f.as_mut(), deferred).and_then(|()| {
                        rx.blocking_recv().map_err(|_| RunError::TestCallable {
                            message: UNRESOLVED.to_string(),
                        })
                    });
                    if result.is_err() {
                        break;
                    }
                }
                result.map(|()| clock.now() - start)
            }
        };

        let torn = self.run_teardown();
        let timed = timed?;
        torn?;
        Ok(CycleTiming {
            timed,
            total: clock.now() - begin,
        })
    }

    async fn cycle_async(
        &mut self,
        clock: &ClockSource,
        count: u64,
    ) -> Result<CycleTiming, RunError> {
        let begin = clock.now();
        self.run_setup()?;

        let timed = match &mut *self.test {
            Test::Sync(f) => invoke_sync(f.as_mut(), clock, count),
            Test::Deferred(f) => {
                let start = clock.now();
                let mut result = Ok(());
                for _ in 0..count {
                    let (deferred, rx) = Deferred::channel();
                    result = call_deferred(f.as_mut(), deferred);
                    if result.is_ok() {
                        result = rx.await.map_err(|_| RunError::TestCallable {
                            message: UNRESOLVED.to_string(),
                        });
                    }
                    if result.is_err() {
                        break;
                    }
                }
                result.map(|()| clock.now() - start)
            }
        };

        let torn = self.run_teardown();
        let timed = timed?;
        torn?;
        Ok(CycleTiming {
            timed,
            total: clock.now() - begin,
        })
    }

    fn run_setup(&mut self) -> Result<(), RunError> {
        match self.setup.as_mut() {
            Some(setup) => catch_unwind(AssertUnwindSafe(|| setup())).map_err(|payload| {
                RunError::Setup {
                    message: panic_message(payload),
                }
            }),
            None => Ok(()),
        }
    }

    fn run_teardown(&mut self) -> Result<(), RunError> {
        match self.teardown.as_mut() {
            Some(teardown) => catch_unwind(AssertUnwindSafe(|| teardown())).map_err(|payload| {
                RunError::Teardown {
                    message: panic_message(payload),
                }
            }),
            None => Ok(()),
        }
    }
}

/// Time `count` back-to-back invocations of a synchronous test.
#[inline(never)]
fn invoke_sync(
    f: &mut dyn FnMut(),
    clock: &ClockSource,
    count: u64,
) -> Result<f64, RunError> {
    let start = clock.now();
    let result = catch_unwind(AssertUnwindSafe(|| {
        for _ in 0..count {
            f();
        }
    }));
    let elapsed = clock.now() - start;
    result
        .map(|()| elapsed)
        .map_err(|payload| RunError::TestCallable {
            message: panic_message(payload),
        })
}

fn call_deferred(
    f: &mut dyn FnMut(Deferred),
    deferred: Deferred,
) -> Result<(), RunError> {
    catch_unwind(AssertUnwindSafe(|| f(deferred))).map_err(|payload| RunError::TestCallable {
        message: panic_message(payload),
    })
}

/// Run state machine shared by the sync and async loops.
struct Driver<'a> {
    run: BenchmarkRun,
    calibrator: Calibrator,
    collector: Collector,
    settings: Settings,
    clock: &'a ClockSource,
    abort: AbortHandle,
    events: &'a mut Emitter,
    relay: Option<&'a mut Emitter>,
    started: f64,
}

impl Driver<'_> {
    /// Enter `Running`. Returns false if the run was aborted before the
    /// first cycle.
    fn begin(&mut self) -> bool {
        self.started = self.clock.now();
        self.run.start();
        tracing::debug!(
            benchmark = self.run.name(),
            min_time = self.settings.min_time,
            max_time = self.settings.max_time,
            min_samples = self.settings.min_samples,
            "starting benchmark"
        );

        if self.emit(EventKind::Start) {
            self.abort_run();
            return false;
        }
        !self.should_stop()
    }

    /// Whether the loop must end, aborting the run if the flag is set.
    fn should_stop(&mut self) -> bool {
        if self.run.state().is_terminal() {
            return true;
        }
        if self.abort.is_aborted() {
            self.abort_run();
            return true;
        }
        false
    }

    /// Account for one finished cycle. Returns whether to keep cycling.
    fn after_cycle(&mut self, outcome: Result<CycleTiming, RunError>) -> bool {
        let timing = match outcome {
            Ok(timing) => timing,
            Err(error) => {
                self.fail(error);
                return false;
            }
        };

        self.run.finish_cycle(timing.total.max(0.0));
        self.collector.record_elapsed(timing.total);

        match self.calibrator.observe(self.run.count(), timing.timed) {
            Ok(Step::Retry { count }) => {
                tracing::trace!(benchmark = self.run.name(), count, "recalibrating");
                self.run.set_count(count);
            }
            Ok(Step::Settled { period }) => {
                let (sample, stats, slot) = self.run.sampling_parts();
                *slot = period;
                let phase = self.collector.accept(sample, stats, period);
                self.run.set_phase(phase);
            }
            Err(error) => {
                self.fail(error);
                return false;
            }
        }

        if self.emit(EventKind::Cycle) {
            self.abort_run();
            return false;
        }
        if self.collector.phase().is_terminal() {
            self.run.complete();
            return false;
        }
        true
    }

    fn fail(&mut self, error: RunError) {
        tracing::warn!(benchmark = self.run.name(), %error, "benchmark failed");
        if self.run.fail(error) {
            self.emit(EventKind::Error);
        }
        self.abort_run();
    }

    fn abort_run(&mut self) {
        if self.run.abort() {
            self.collector.abort();
            tracing::debug!(benchmark = self.run.name(), "benchmark aborted");
            self.emit(EventKind::Abort);
        }
    }

    /// Broadcast an event about the run. Returns whether a listener
    /// cancelled it.
    fn emit(&mut self, kind: EventKind) -> bool {
        let mut event = Event::new(kind, Target::Run(&self.run));
        self.events.emit(&mut event);
        if !event.aborted {
            if let Some(relay) = self.relay.as_deref_mut() {
                relay.emit(&mut event);
            }
        }
        event.cancelled
    }

    fn finish(mut self) -> BenchmarkRun {
        self.run.finish(self.clock.now() - self.started);
        self.emit(EventKind::Complete);

        let run = &self.run;
        if run.is_measured() {
            tracing::info!(
                benchmark = run.name(),
                hz = run.hz(),
                rme = run.stats().relative_margin_of_error,
                samples = run.sample().len(),
                cycles = run.cycles(),
                "benchmark complete"
            );
        } else {
            tracing::info!(
                benchmark = run.name(),
                state = %run.state(),
                cycles = run.cycles(),
                "benchmark finished without a measurement"
            );
        }
        self.run
    }
}
