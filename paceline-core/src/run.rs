//! Benchmark Run
//!
//! Engine-owned record of one execution of a benchmark. Once a run reaches
//! `Aborted` or `Completed` nothing about it changes again.

use crate::clock::unix_timestamp;
use crate::collector::Phase;
use crate::error::RunError;
use paceline_stats::{Ordering, Stats};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Created, not started
    #[default]
    Pending,
    /// Cycles are executing
    Running,
    /// Stopped by an abort request or an error
    Aborted,
    /// Sampling finished without error
    Completed,
}

impl RunState {
    /// Whether the run can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Aborted | RunState::Completed)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Pending => write!(f, "pending"),
            RunState::Running => write!(f, "running"),
            RunState::Aborted => write!(f, "aborted"),
            RunState::Completed => write!(f, "completed"),
        }
    }
}

/// Timing bookkeeping, all in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Times {
    /// Duration of the last cycle
    pub cycle: f64,
    /// Last settled period (seconds per invocation)
    pub period: f64,
    /// Wall time from start to finish, including delays
    pub elapsed: f64,
    /// Unix time at which the run started
    pub timestamp: f64,
}

/// One execution of a benchmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    name: String,
    count: u64,
    cycles: u32,
    sample: Vec<f64>,
    stats: Stats,
    times: Times,
    state: RunState,
    phase: Phase,
    error: Option<RunError>,
}

impl BenchmarkRun {
    /// A pending run that will start with `count` invocations per cycle.
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count: count.max(1),
            ..Self::default()
        }
    }

    /// Benchmark name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invocations in the current (or last) cycle.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Cycles executed, calibration cycles included.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Settled periods in chronological order.
    pub fn sample(&self) -> &[f64] {
        &self.sample
    }

    /// Statistics over [`BenchmarkRun::sample`].
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Timing bookkeeping.
    pub fn times(&self) -> &Times {
        &self.times
    }

    /// Lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Phase the sample collector ended in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The error that aborted this run, if any.
    pub fn error(&self) -> Option<&RunError> {
        self.error.as_ref()
    }

    /// Operations per second.
    pub fn hz(&self) -> f64 {
        self.stats.hz
    }

    /// Completed without error and produced a usable measurement.
    pub fn is_measured(&self) -> bool {
        self.state == RunState::Completed
            && self.error.is_none()
            && !self.sample.is_empty()
            && self.stats.is_measured()
    }

    /// Compare this run's sample against another's.
    ///
    /// A run compared with itself is always indeterminate.
    pub fn compare(&self, other: &BenchmarkRun) -> Ordering {
        if std::ptr::eq(self, other) {
            return Ordering::Indeterminate;
        }
        paceline_stats::compare(&self.sample, &other.sample)
    }

    /// Abort the run. Has no effect once the run is terminal.
    pub fn abort(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = RunState::Aborted;
        if !self.phase.is_terminal() {
            self.phase = Phase::Aborted;
        }
        true
    }

    pub(crate) fn start(&mut self) -> bool {
        if self.state != RunState::Pending {
            return false;
        }
        self.state = RunState::Running;
        self.times.timestamp = unix_timestamp();
        true
    }

    /// Record a per-run error. Only the first error is kept.
    pub(crate) fn fail(&mut self, error: RunError) -> bool {
        if self.state.is_terminal() || self.error.is_some() {
            return false;
        }
        self.error = Some(error);
        true
    }

    pub(crate) fn complete(&mut self) -> bool {
        if self.state != RunState::Running {
            return false;
        }
        self.state = RunState::Completed;
        true
    }

    pub(crate) fn set_count(&mut self, count: u64) {
        self.count = count.max(1);
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn finish_cycle(&mut self, seconds: f64) {
        self.cycles = self.cycles.saturating_add(1);
        self.times.cycle = seconds;
    }

    pub(crate) fn finish(&mut self, elapsed: f64) {
        self.times.elapsed = elapsed.max(0.0);
    }

    /// Mutable sample, stats and period slot, for the collector.
    pub(crate) fn sampling_parts(&mut self) -> (&mut Vec<f64>, &mut Stats, &mut f64) {
        (&mut self.sample, &mut self.stats, &mut self.times.period)
    }
}

impl std::fmt::Display for BenchmarkRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(error) = &self.error {
            return write!(f, "{}: {}", self.name, error);
        }
        if self.state == RunState::Aborted {
            return write!(f, "{}: aborted", self.name);
        }
        if !self.stats.is_measured() {
            return write!(f, "{}: not measured", self.name);
        }

        let hz = self.stats.hz;
        let decimals = if hz < 100.0 { 2 } else { 0 };
        let size = self.sample.len();
        write!(
            f,
            "{} x {} ops/sec \u{b1}{:.2}% ({} run{} sampled)",
            self.name,
            group_digits(&format!("{hz:.decimals$}")),
            self.stats.relative_margin_of_error,
            size,
            if size == 1 { "" } else { "s" }
        )
    }
}

/// Insert thousands separators into the integer part of a decimal number.
pub fn group_digits(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(number.len() + int_part.len() / 3);
    grouped.push_str(sign);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
