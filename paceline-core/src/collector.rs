//! Sample Collector
//!
//! Accumulates settled periods into the run's sample and decides when to
//! stop. Stats are recomputed from the whole sample after every accepted
//! period.

use paceline_stats::Stats;
use serde::{Deserialize, Serialize};

/// Sampling phase of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// No period accepted yet
    #[default]
    AwaitingFirstSample,
    /// Collecting periods
    Sampling,
    /// The test was too fast to measure; the sample was discarded
    Converged,
    /// Enough periods and the time budget is spent
    TimedOut,
    /// The run was aborted
    Aborted,
}

impl Phase {
    /// Whether sampling has stopped.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Converged | Phase::TimedOut | Phase::Aborted)
    }
}

/// Stopping-rule state for one run.
#[derive(Debug, Clone)]
pub struct Collector {
    min_samples: usize,
    max_time: f64,
    elapsed: f64,
    phase: Phase,
}

impl Collector {
    /// Stop once `min_samples` periods exist and more than `max_time`
    /// seconds were spent in cycles.
    pub fn new(min_samples: usize, max_time: f64) -> Self {
        Self {
            min_samples: min_samples.max(1),
            max_time,
            elapsed: 0.0,
            phase: Phase::AwaitingFirstSample,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Seconds counted against the budget so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Count one cycle's duration against the budget.
    ///
    /// Inter-cycle delays must not be passed here.
    pub fn record_elapsed(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.elapsed += seconds;
        }
    }

    /// Accept a settled period and return the phase that follows.
    ///
    /// A period whose throughput would be infinite discards the sample and
    /// resets `stats`.
    pub fn accept(&mut self, sample: &mut Vec<f64>, stats: &mut Stats, period: f64) -> Phase {
        if self.phase.is_terminal() {
            return self.phase;
        }

        if period.is_nan() || period <= 0.0 || (1.0 / period).is_infinite() {
            sample.clear();
            *stats = Stats::default();
            self.phase = Phase::Converged;
            return self.phase;
        }

        sample.push(period);
        *stats = Stats::from_sample(sample);

        self.phase = if sample.len() >= self.min_samples && self.elapsed > self.max_time {
            Phase::TimedOut
        } else {
            Phase::Sampling
        };
        self.phase
    }

    /// Stop sampling because the run was aborted.
    pub fn abort(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = Phase::Aborted;
        }
    }
}
