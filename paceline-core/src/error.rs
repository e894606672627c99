//! Error Taxonomy
//!
//! Two levels:
//! - [`EngineError`]: nothing can be benchmarked (fatal, returned to the caller)
//! - [`RunError`]: one run failed; it is recorded on the run and broadcast,
//!   sibling benchmarks keep going

use serde::{Deserialize, Serialize};
use std::any::Any;

/// Engine-level failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Every candidate timer failed to advance
    #[error("no working timer: every candidate clock failed to advance")]
    NoWorkingTimer,
}

/// Failure of a single benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RunError {
    /// Calibration never produced a non-zero elapsed time
    #[error("clock saturated: no measurable time after {cycles} calibration cycles")]
    ClockSaturated {
        /// Calibration cycles attempted
        cycles: u32,
    },
    /// The test callable panicked or left a deferred cycle unresolved
    #[error("test failed: {message}")]
    TestCallable {
        /// Panic payload or failure description
        message: String,
    },
    /// The setup callback panicked
    #[error("setup failed: {message}")]
    Setup {
        /// Panic payload
        message: String,
    },
    /// The teardown callback panicked
    #[error("teardown failed: {message}")]
    Teardown {
        /// Panic payload
        message: String,
    },
}

impl RunError {
    /// Short machine-friendly name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::ClockSaturated { .. } => "clock-saturated",
            RunError::TestCallable { .. } => "test-callable",
            RunError::Setup { .. } => "setup",
            RunError::Teardown { .. } => "teardown",
        }
    }
}

/// Extract a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload), "boom 7");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(5u8)).unwrap_err();
        assert_eq!(panic_message(payload), "Unknown panic");
    }

    #[test]
    fn test_display() {
        let err = RunError::ClockSaturated { cycles: 5 };
        assert_eq!(
            err.to_string(),
            "clock saturated: no measurable time after 5 calibration cycles"
        );
        assert_eq!(err.kind(), "clock-saturated");
        assert_eq!(
            RunError::Setup {
                message: "x".into()
            }
            .to_string(),
            "setup failed: x"
        );
    }
}
