//! Benchmark Definition
//!
//! A [`Benchmark`] bundles the callable under test with optional setup and
//! teardown callbacks, sampling [`Options`] and its own event listeners.
//! The engine never clones or rewrites the callable; it only invokes it.

use crate::clock::ClockSource;
use crate::event::{Emitter, Event, EventKind};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Default sampling budget in seconds.
pub const DEFAULT_MAX_TIME: f64 = 5.0;

/// Default minimum number of periods in a sample.
pub const DEFAULT_MIN_SAMPLES: u32 = 5;

/// Default number of invocations in the first cycle.
pub const DEFAULT_INITIAL_COUNT: u64 = 1;

/// Default pause between asynchronous cycles, in seconds.
pub const DEFAULT_DELAY: f64 = 0.005;

/// Untimed callback run around every cycle.
pub type Callback = Box<dyn FnMut() + Send>;

/// Completion handle passed to deferred tests.
///
/// Calling [`Deferred::resolve`] ends the current invocation. Dropping the
/// handle without resolving fails the run.
#[derive(Debug)]
pub struct Deferred {
    tx: oneshot::Sender<()>,
}

impl Deferred {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Signal that this invocation has finished.
    pub fn resolve(self) {
        // Fails only when the receiver was dropped because the run aborted
        // before this handle resolved. Nobody is waiting then.
        let _ = self.tx.send(());
    }
}

/// The callable under test.
pub enum Test {
    /// Returns when one invocation is done
    Sync(Box<dyn FnMut() + Send>),
    /// Signals completion through a [`Deferred`] handle
    Deferred(Box<dyn FnMut(Deferred) + Send>),
}

impl Test {
    /// Whether invocations complete through a [`Deferred`] handle.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Test::Deferred(_))
    }
}

impl std::fmt::Debug for Test {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Test::Sync(_) => f.write_str("Test::Sync"),
            Test::Deferred(_) => f.write_str("Test::Deferred"),
        }
    }
}

/// Sampling options. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Minimum timed length of one cycle in seconds (`None` = derive from the clock)
    pub min_time: Option<f64>,
    /// Sampling budget in seconds, checked at cycle boundaries
    pub max_time: f64,
    /// Minimum number of periods before sampling may stop
    pub min_samples: u32,
    /// Invocations in the first cycle
    pub initial_count: u64,
    /// Pause between asynchronous cycles in seconds (not counted toward `max_time`)
    pub delay: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_time: None,
            max_time: DEFAULT_MAX_TIME,
            min_samples: DEFAULT_MIN_SAMPLES,
            initial_count: DEFAULT_INITIAL_COUNT,
            delay: DEFAULT_DELAY,
        }
    }
}

impl Options {
    /// Set the minimum cycle time.
    pub fn min_time(mut self, seconds: f64) -> Self {
        self.min_time = Some(seconds);
        self
    }

    /// Set the sampling budget.
    pub fn max_time(mut self, seconds: f64) -> Self {
        self.max_time = seconds;
        self
    }

    /// Set the minimum sample size.
    pub fn min_samples(mut self, samples: u32) -> Self {
        self.min_samples = samples;
        self
    }

    /// Set the first cycle's invocation count.
    pub fn initial_count(mut self, count: u64) -> Self {
        self.initial_count = count;
        self
    }

    /// Set the pause between asynchronous cycles.
    pub fn delay(mut self, seconds: f64) -> Self {
        self.delay = seconds;
        self
    }

    /// Fill derived defaults and clamp everything into range.
    pub fn resolve(&self, clock: &ClockSource) -> Settings {
        let min_time = self
            .min_time
            .filter(|t| t.is_finite() && *t > 0.0)
            .unwrap_or_else(|| clock.default_min_time());
        Settings {
            min_time,
            max_time: finite_or(self.max_time, DEFAULT_MAX_TIME).max(0.0),
            min_samples: self.min_samples.max(1) as usize,
            initial_count: self.initial_count.max(1),
            delay: finite_or(self.delay, DEFAULT_DELAY).max(0.0),
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Fully resolved sampling settings for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Minimum timed length of a cycle in seconds
    pub min_time: f64,
    /// Sampling budget in seconds
    pub max_time: f64,
    /// Minimum sample size
    pub min_samples: usize,
    /// Invocations in the first cycle
    pub initial_count: u64,
    /// Pause between asynchronous cycles in seconds
    pub delay: f64,
}

/// A named benchmark.
pub struct Benchmark {
    pub(crate) name: String,
    pub(crate) test: Test,
    pub(crate) setup: Option<Callback>,
    pub(crate) teardown: Option<Callback>,
    pub(crate) options: Options,
    pub(crate) events: Emitter,
}

impl std::fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmark")
            .field("name", &self.name)
            .field("test", &self.test)
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl Benchmark {
    /// Benchmark a synchronous closure. Its return value is passed through
    /// `black_box` so the work cannot be optimized away.
    pub fn new<T, F>(name: impl Into<String>, mut f: F) -> Self
    where
        F: FnMut() -> T + Send + 'static,
    {
        Self::from_test(
            name,
            Test::Sync(Box::new(move || {
                std::hint::black_box(f());
            })),
        )
    }

    /// Benchmark a deferred test that calls [`Deferred::resolve`] when done.
    pub fn deferred<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(Deferred) + Send + 'static,
    {
        Self::from_test(name, Test::Deferred(Box::new(f)))
    }

    fn from_test(name: impl Into<String>, test: Test) -> Self {
        Self {
            name: name.into(),
            test,
            setup: None,
            teardown: None,
            options: Options::default(),
            events: Emitter::new(),
        }
    }

    /// Run `setup` before every cycle, outside the timed region.
    pub fn with_setup(mut self, setup: impl FnMut() + Send + 'static) -> Self {
        self.setup = Some(Box::new(setup));
        self
    }

    /// Run `teardown` after every cycle, outside the timed region.
    pub fn with_teardown(mut self, teardown: impl FnMut() + Send + 'static) -> Self {
        self.teardown = Some(Box::new(teardown));
        self
    }

    /// Change the display name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the sampling options.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Register a listener and return the benchmark (builder style).
    pub fn with_listener(
        mut self,
        kind: EventKind,
        listener: impl FnMut(&mut Event<'_>) + Send + 'static,
    ) -> Self {
        self.events.on(kind, listener);
        self
    }

    /// Register a listener for one kind of event.
    pub fn on(&mut self, kind: EventKind, listener: impl FnMut(&mut Event<'_>) + Send + 'static) {
        self.events.on(kind, listener);
    }

    /// Benchmark name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sampling options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Mutable sampling options.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// The callable under test.
    pub fn test(&self) -> &Test {
        &self.test
    }

    /// Listener registry.
    pub fn events_mut(&mut self) -> &mut Emitter {
        &mut self.events
    }
}
