#![warn(missing_docs)]
//! Paceline Core - Measurement Engine
//!
//! This crate drives benchmarks from definition to statistics:
//! - Timer selection and resolution measurement
//! - Cycle calibration and adaptive sampling
//! - Sync and async execution with abort support
//! - Suites with lifecycle events and fastest/slowest ranking

mod benchmark;
mod calibrate;
mod clock;
mod collector;
mod error;
mod event;
mod run;
mod scheduler;
mod suite;

pub use benchmark::{
    Benchmark, Callback, DEFAULT_DELAY, DEFAULT_INITIAL_COUNT, DEFAULT_MAX_TIME,
    DEFAULT_MIN_SAMPLES, Deferred, Options, Settings, Test,
};
pub use calibrate::{Calibrator, ESCALATION_DIVISORS, ESCALATION_TARGET, Step};
pub use clock::{
    ClockSource, MAX_TIMER_UNCERTAINTY, MIN_TIME_FLOOR, RESOLUTION_TRIALS, TimeFn, TimerKind,
    measure_resolution, select_timer,
};
pub use collector::{Collector, Phase};
pub use error::{EngineError, RunError};
pub use event::{Emitter, Event, EventKind, Listener, Target};
pub use run::{BenchmarkRun, RunState, Times, group_digits};
pub use scheduler::{AbortHandle, Execution, run_async, run_sync};
pub use suite::{Collection, Enqueuer, Suite, fastest, slowest};

/// Benchmark definition registered with [`register!`].
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkDef {
    /// Unique identifier, used by suite files and filters
    pub id: &'static str,
    /// Source file path
    pub file: &'static str,
    /// Source line number
    pub line: u32,
    /// Builds a fresh benchmark
    pub build: fn() -> Benchmark,
}

impl BenchmarkDef {
    /// Build a fresh benchmark from this definition.
    pub fn instantiate(&self) -> Benchmark {
        (self.build)()
    }
}

inventory::collect!(BenchmarkDef);

/// Every registered benchmark, sorted by id.
pub fn registered() -> Vec<&'static BenchmarkDef> {
    let mut defs: Vec<_> = inventory::iter::<BenchmarkDef>.into_iter().collect();
    defs.sort_by_key(|def| def.id);
    defs
}

/// Look up a registered benchmark by id.
pub fn find_registered(id: &str) -> Option<&'static BenchmarkDef> {
    inventory::iter::<BenchmarkDef>
        .into_iter()
        .find(|def| def.id == id)
}

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<BenchmarkDef> {}
};

/// Register a benchmark so the CLI and suite files can find it by id.
///
/// ```ignore
/// paceline_core::register!("vec-push", || {
///     paceline_core::Benchmark::new("vec-push", || {
///         let mut v = Vec::with_capacity(64);
///         v.extend(0..64u32);
///         v
///     })
/// });
/// ```
#[macro_export]
macro_rules! register {
    ($id:expr, $build:expr $(,)?) => {
        $crate::internal::inventory::submit! {
            $crate::BenchmarkDef {
                id: $id,
                file: file!(),
                line: line!(),
                build: $build,
            }
        }
    };
}

/// Internal re-exports used by [`register!`].
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}
