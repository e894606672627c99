//! Clock Source
//!
//! Picks the highest-resolution timer the host offers and measures how fine
//! its ticks really are. Candidates, best first:
//! - `CLOCK_MONOTONIC_RAW` via `clock_gettime` (Linux/Android)
//! - `std::time::Instant`
//! - `SystemTime` wall clock (coarse, last resort)

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Number of tick measurements averaged into a resolution estimate.
pub const RESOLUTION_TRIALS: usize = 30;

/// Reads spent waiting for a single tick before a trial is given up.
const TICK_SPIN_BUDGET: usize = 1_000_000;

/// Largest relative uncertainty the timer may add to a measurement (1%).
pub const MAX_TIMER_UNCERTAINTY: f64 = 0.01;

/// Floor for the derived minimum cycle time, in seconds.
pub const MIN_TIME_FLOOR: f64 = 0.05;

/// Which timer backs a [`ClockSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerKind {
    /// Raw hardware-backed monotonic counter
    MonotonicRaw,
    /// `std::time::Instant`
    Instant,
    /// System wall clock
    WallClock,
    /// Caller-supplied time function
    Custom,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerKind::MonotonicRaw => write!(f, "monotonic-raw"),
            TimerKind::Instant => write!(f, "instant"),
            TimerKind::WallClock => write!(f, "wall-clock"),
            TimerKind::Custom => write!(f, "custom"),
        }
    }
}

/// Time function: seconds elapsed since an arbitrary, fixed origin.
pub type TimeFn = Arc<dyn Fn() -> f64 + Send + Sync>;

/// An immutable, validated timer.
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct ClockSource {
    kind: TimerKind,
    resolution: f64,
    now: TimeFn,
}

impl std::fmt::Debug for ClockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockSource")
            .field("kind", &self.kind)
            .field("resolution", &self.resolution)
            .finish_non_exhaustive()
    }
}

impl ClockSource {
    /// Select the best working timer on this host.
    pub fn select() -> Result<Self, EngineError> {
        for (kind, now) in candidates() {
            let resolution = measure_resolution(&*now);
            if resolution.is_finite() && resolution > 0.0 {
                tracing::debug!(%kind, resolution, "selected timer");
                return Ok(Self {
                    kind,
                    resolution,
                    now,
                });
            }
            tracing::debug!(%kind, "timer never advanced, trying next candidate");
        }
        Err(EngineError::NoWorkingTimer)
    }

    /// Build a source from a time function, measuring its resolution.
    pub fn from_fn(
        kind: TimerKind,
        now: impl Fn() -> f64 + Send + Sync + 'static,
    ) -> Result<Self, EngineError> {
        let now: TimeFn = Arc::new(now);
        let resolution = measure_resolution(&*now);
        Self::validated(kind, resolution, now)
    }

    /// Build a source with a known resolution, skipping measurement.
    ///
    /// Useful for deterministic clocks in tests and for hosts that bring
    /// their own calibrated timer.
    pub fn with_resolution(
        kind: TimerKind,
        resolution: f64,
        now: impl Fn() -> f64 + Send + Sync + 'static,
    ) -> Result<Self, EngineError> {
        Self::validated(kind, resolution, Arc::new(now))
    }

    fn validated(kind: TimerKind, resolution: f64, now: TimeFn) -> Result<Self, EngineError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(EngineError::NoWorkingTimer);
        }
        Ok(Self {
            kind,
            resolution,
            now,
        })
    }

    /// Current reading in seconds.
    #[inline(always)]
    pub fn now(&self) -> f64 {
        (self.now)()
    }

    /// Smallest observable tick, in seconds.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Which timer this is.
    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Shortest cycle that keeps timer uncertainty at or below 1%.
    ///
    /// `max(resolution / 2 / 0.01, 0.05)` seconds.
    pub fn default_min_time(&self) -> f64 {
        (self.resolution / 2.0 / MAX_TIMER_UNCERTAINTY).max(MIN_TIME_FLOOR)
    }
}

/// Select the best working timer on this host.
pub fn select_timer() -> Result<ClockSource, EngineError> {
    ClockSource::select()
}

/// Estimate how far apart consecutive distinct readings of `now` are.
///
/// Returns `f64::INFINITY` when the timer never advances within the trial
/// budget; callers treat that as "not usable".
pub fn measure_resolution(now: &dyn Fn() -> f64) -> f64 {
    let mut deltas = Vec::with_capacity(RESOLUTION_TRIALS);

    for _ in 0..RESOLUTION_TRIALS {
        let begin = now();
        let mut measured = begin;
        let mut spins = 0;
        while measured == begin && spins < TICK_SPIN_BUDGET {
            measured = now();
            spins += 1;
        }
        let delta = measured - begin;
        if delta > 0.0 {
            deltas.push(delta);
        }
    }

    if deltas.is_empty() {
        f64::INFINITY
    } else {
        paceline_stats::mean(&deltas)
    }
}

/// Seconds since the Unix epoch, for run timestamps.
pub(crate) fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn candidates() -> Vec<(TimerKind, TimeFn)> {
    let mut list: Vec<(TimerKind, TimeFn)> = Vec::with_capacity(3);
    #[cfg(any(target_os = "linux", target_os = "android"))]
    list.push((TimerKind::MonotonicRaw, Arc::new(monotonic_raw)));
    list.push((TimerKind::Instant, Arc::new(instant_seconds)));
    list.push((TimerKind::WallClock, Arc::new(unix_timestamp)));
    list
}

/// Read `CLOCK_MONOTONIC_RAW`, unaffected by NTP slewing.
#[cfg(any(target_os = "linux", target_os = "android"))]
#[inline(always)]
fn monotonic_raw() -> f64 {
    // SAFETY: an all-zero timespec is a valid value; the clock id is a
    // constant supported by every Linux kernel since 2.6.28.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC_RAW, &mut ts) };
    if rc != 0 {
        // A clock that reads constant is rejected by `measure_resolution`.
        return 0.0;
    }
    ts.tv_sec as f64 + ts.tv_nsec as f64 * 1e-9
}

#[inline(always)]
fn instant_seconds() -> f64 {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64()
}
