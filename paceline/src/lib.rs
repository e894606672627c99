#![warn(missing_docs)]
//! # Paceline
//!
//! Adaptive micro-benchmarking with statistically grounded comparisons.
//!
//! - **Timer selection**: picks the finest working clock and derives the
//!   shortest cycle that keeps timer error at or below 1%
//! - **Calibration**: grows the invocations per cycle until a cycle is long
//!   enough to time
//! - **Adaptive sampling**: collects periods until the minimum sample size
//!   and the time budget are both met
//! - **Comparison**: Mann-Whitney U for small samples, a z-test beyond 30,
//!   with overlapping results reported as indeterminate
//! - **Suites**: ordered runs with lifecycle events, abort and fastest/slowest
//!
//! ## Quick Start
//!
//! ```ignore
//! use paceline::prelude::*;
//!
//! let clock = ClockSource::select()?;
//! let mut suite = Suite::new("strings")
//!     .with(Benchmark::new("concat", || format!("{}{}", "a", "b")))
//!     .with(Benchmark::new("push_str", || {
//!         let mut s = String::from("a");
//!         s.push_str("b");
//!         s
//!     }));
//! suite.run_sync(&clock);
//! for run in suite.fastest() {
//!     println!("Fastest is {}", run.name());
//! }
//! ```
//!
//! ## Deferred Benchmarks
//!
//! ```ignore
//! let bench = Benchmark::deferred("spawned", |deferred| {
//!     std::thread::spawn(move || deferred.resolve());
//! });
//! ```
//!
//! ## Registered Benchmarks
//!
//! ```ignore
//! paceline::register!("vec-push", || paceline::Benchmark::new("vec-push", || vec![0u8; 64]));
//!
//! fn main() {
//!     if let Err(e) = paceline::run() {
//!         eprintln!("Error: {e:#}");
//!         std::process::exit(1);
//!     }
//! }
//! ```

// Re-export core types
pub use paceline_core::{
    AbortHandle, Benchmark, BenchmarkDef, BenchmarkRun, ClockSource, Collection, Deferred,
    EngineError, Enqueuer, Event, EventKind, Execution, Options, Phase, RunError, RunState, Suite,
    Target, Test, TimerKind, Times, fastest, find_registered, register, registered, run_async,
    run_sync, select_timer, slowest,
};

// Re-export stats
pub use paceline_stats::{Ordering, Stats, compare};

// Re-export reporting
pub use paceline_report::{OutputFormat, Report, ReportConfig, build_report, render};

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use paceline_core::internal::inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Benchmark, BenchmarkRun, ClockSource, Deferred, EventKind, Options, Ordering, RunState,
        Suite,
    };
}

/// Run the Paceline CLI harness.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() {
///     paceline::run().unwrap();
/// }
/// ```
pub use paceline_cli::run;
