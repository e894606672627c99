//! Cycle Calibrator
//!
//! Chooses how many invocations make up one timed cycle so that the cycle
//! lasts at least `min_time`.
//!
//! Two regimes:
//! - Elapsed time of zero: the timer cannot see the cycle at all, so the
//!   count jumps to `4_000_000 / divisor` using a fixed escalation table
//! - Non-zero but short: extrapolate from the observed period and add the
//!   invocations still missing

use crate::error::RunError;

/// Numerator of the escalation formula.
pub const ESCALATION_TARGET: f64 = 4_000_000.0;

/// Divisors applied to consecutive zero-elapsed cycles (1-based).
///
/// A zero divisor means the timer is saturated.
pub const ESCALATION_DIVISORS: [(u32, u64); 5] = [(1, 4096), (2, 512), (3, 64), (4, 8), (5, 0)];

/// What to do after one observed cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// The cycle was too short; run again with `count` invocations
    Retry {
        /// New invocation count
        count: u64,
    },
    /// The cycle was long enough; `period` is seconds per invocation
    Settled {
        /// `elapsed / count`
        period: f64,
    },
}

/// Per-run calibration state.
#[derive(Debug, Clone)]
pub struct Calibrator {
    min_time: f64,
    zero_streak: u32,
}

impl Calibrator {
    /// Calibrate towards cycles of at least `min_time` seconds.
    pub fn new(min_time: f64) -> Self {
        Self {
            min_time,
            zero_streak: 0,
        }
    }

    /// Target cycle length in seconds.
    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    /// Judge a cycle of `count` invocations that took `elapsed` seconds.
    pub fn observe(&mut self, count: u64, elapsed: f64) -> Result<Step, RunError> {
        let count = count.max(1);

        if elapsed <= 0.0 || !elapsed.is_finite() {
            self.zero_streak += 1;
            let divisor = ESCALATION_DIVISORS
                .iter()
                .find(|(cycle, _)| *cycle == self.zero_streak)
                .map(|(_, divisor)| *divisor)
                .unwrap_or(0);
            if divisor == 0 {
                return Err(RunError::ClockSaturated {
                    cycles: self.zero_streak,
                });
            }
            let escalated = (ESCALATION_TARGET / divisor as f64).floor() as u64;
            return Ok(Step::Retry {
                count: escalated.max(count.saturating_add(1)),
            });
        }
        self.zero_streak = 0;

        let period = elapsed / count as f64;
        if period <= 0.0 {
            return Err(RunError::ClockSaturated { cycles: 1 });
        }

        if elapsed < self.min_time {
            // Float-to-int casts saturate, so an absurd target caps at u64::MAX.
            let missing = ((self.min_time - elapsed) / period).ceil().max(1.0) as u64;
            return Ok(Step::Retry {
                count: count.saturating_add(missing),
            });
        }

        Ok(Step::Settled { period })
    }
}
