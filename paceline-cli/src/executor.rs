//! Suite Execution
//!
//! Drives a [`Suite`] in the configured [`ExecutionMode`] with a progress bar
//! fed by suite events.

use crate::config::ExecutionMode;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use paceline_core::{BenchmarkRun, ClockSource, Collection, EventKind, Suite, Target};

/// Runs suites and reports progress on stderr
pub struct Executor {
    mode: ExecutionMode,
    show_progress: bool,
}

impl Executor {
    /// Executor with a visible progress bar.
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            show_progress: true,
        }
    }

    /// Disable the progress bar.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Run every benchmark in `suite` and return the finished runs.
    pub fn execute(
        &self,
        suite: &mut Suite,
        clock: &ClockSource,
    ) -> anyhow::Result<Vec<BenchmarkRun>> {
        let pb = self.progress_bar(suite.len());
        attach_progress(suite, &pb);

        let runs = match self.mode {
            ExecutionMode::Sync => suite.run_sync(clock).to_vec(),
            ExecutionMode::Async => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .context("failed to start async runtime")?;
                runtime.block_on(suite.run_async(clock, true)).to_vec()
            }
        };

        pb.finish_with_message("Complete");
        Ok(runs)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

fn attach_progress(suite: &mut Suite, pb: &ProgressBar) {
    let bar = pb.clone();
    suite.on(EventKind::Start, move |event| {
        if let Target::Run(run) = event.target() {
            bar.set_message(run.name().to_string());
        }
    });
    let bar = pb.clone();
    suite.on(EventKind::Cycle, move |event| {
        if let Some(run) = event.run() {
            bar.set_message(format!(
                "{} (cycle {}, x{})",
                run.name(),
                run.cycles(),
                run.count()
            ));
        }
    });
    let bar = pb.clone();
    suite.on(EventKind::Complete, move |event| {
        if event.run().is_some() {
            bar.inc(1);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use paceline_core::{Benchmark, Options, RunState};

    fn quick_suite() -> Suite {
        let options = Options::default()
            .min_time(0.001)
            .max_time(0.0)
            .min_samples(5)
            .delay(0.0);
        Suite::new("executor")
            .with(Benchmark::new("sum", || (0..64u64).sum::<u64>()).with_options(options.clone()))
            .with(Benchmark::new("fails", || -> u64 { panic!("nope") }).with_options(options))
    }

    #[test]
    fn test_execute_sync() {
        let clock = ClockSource::select().unwrap();
        let mut suite = quick_suite();

        let runs = Executor::new(ExecutionMode::Sync)
            .quiet()
            .execute(&mut suite, &clock)
            .unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].state(), RunState::Completed);
        assert!(runs[0].sample().len() >= 5);
        assert_eq!(runs[1].state(), RunState::Aborted);
        assert!(runs[1].error().is_some());
    }

    #[test]
    fn test_execute_async() {
        let clock = ClockSource::select().unwrap();
        let mut suite = quick_suite();

        let runs = Executor::new(ExecutionMode::Async)
            .quiet()
            .execute(&mut suite, &clock)
            .unwrap();

        assert_eq!(runs.len(), 2);
        assert!(runs[0].is_measured());
        assert!(runs[1].error().is_some());
    }
}
