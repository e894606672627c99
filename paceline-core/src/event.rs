//! Lifecycle Events
//!
//! Typed replacement for string-named listener arrays. Listeners run in
//! registration order and receive a mutable [`Event`]:
//! - setting `cancelled` vetoes the default action that follows the event
//!   (a cancelled `start` or `cycle` aborts the run or suite)
//! - setting `aborted` stops delivery to the remaining listeners

use crate::run::BenchmarkRun;
use serde::{Deserialize, Serialize};

/// Kind of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A run or suite is starting
    Start,
    /// A benchmark finished one timed cycle
    Cycle,
    /// A run recorded an error
    Error,
    /// A run or suite was aborted
    Abort,
    /// A suite discarded its results
    Reset,
    /// A run or suite finished (also after an abort)
    Complete,
}

impl EventKind {
    /// Every event kind, in lifecycle order.
    pub const ALL: [EventKind; 6] = [
        EventKind::Start,
        EventKind::Cycle,
        EventKind::Error,
        EventKind::Abort,
        EventKind::Reset,
        EventKind::Complete,
    ];

    /// Lowercase event name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Cycle => "cycle",
            EventKind::Error => "error",
            EventKind::Abort => "abort",
            EventKind::Reset => "reset",
            EventKind::Complete => "complete",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an event is about.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A single benchmark run
    Run(&'a BenchmarkRun),
    /// A suite and the results it holds so far
    Suite {
        /// Suite name
        name: &'a str,
        /// Completed runs, in execution order
        results: &'a [BenchmarkRun],
    },
}

/// A lifecycle event delivered to listeners.
#[derive(Debug)]
pub struct Event<'a> {
    kind: EventKind,
    target: Target<'a>,
    /// Set by a listener to veto the default action
    pub cancelled: bool,
    /// Set by a listener to stop delivery to later listeners
    pub aborted: bool,
}

impl<'a> Event<'a> {
    /// Create a fresh event.
    pub fn new(kind: EventKind, target: Target<'a>) -> Self {
        Self {
            kind,
            target,
            cancelled: false,
            aborted: false,
        }
    }

    /// Event kind.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Event target.
    pub fn target(&self) -> Target<'a> {
        self.target
    }

    /// The run this event is about, if any.
    pub fn run(&self) -> Option<&'a BenchmarkRun> {
        match self.target {
            Target::Run(run) => Some(run),
            Target::Suite { .. } => None,
        }
    }

    /// Veto the default action.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Stop delivery to the remaining listeners.
    pub fn stop_propagation(&mut self) {
        self.aborted = true;
    }
}

/// Boxed event listener.
pub type Listener = Box<dyn FnMut(&mut Event<'_>) + Send>;

/// Ordered listener registry.
#[derive(Default)]
pub struct Emitter {
    listeners: Vec<(Option<EventKind>, Listener)>,
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Emitter {
    /// Create an emitter with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for one kind of event.
    pub fn on(&mut self, kind: EventKind, listener: impl FnMut(&mut Event<'_>) + Send + 'static) {
        self.listeners.push((Some(kind), Box::new(listener)));
    }

    /// Listen for every event.
    pub fn on_any(&mut self, listener: impl FnMut(&mut Event<'_>) + Send + 'static) {
        self.listeners.push((None, Box::new(listener)));
    }

    /// Remove the listeners registered for `kind` with [`Emitter::on`].
    pub fn off(&mut self, kind: EventKind) {
        self.listeners.retain(|(filter, _)| *filter != Some(kind));
    }

    /// Remove every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to matching listeners until one sets `aborted`.
    pub fn emit(&mut self, event: &mut Event<'_>) {
        for (filter, listener) in self.listeners.iter_mut() {
            if event.aborted {
                break;
            }
            if filter.is_none_or(|kind| kind == event.kind) {
                listener(event);
            }
        }
    }
}
