//! Report Data Structures

use chrono::{DateTime, Utc};
use paceline_core::{BenchmarkRun, ClockSource, Options, RunState, TimerKind};
use paceline_stats::{CONFIDENCE_LEVEL, Ordering};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Version of the JSON layout below.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete suite report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub results: Vec<BenchmarkReportResult>,
    /// Names of the runs tied for fastest
    pub fastest: Vec<String>,
    /// Names of the runs tied for slowest
    pub slowest: Vec<String>,
    pub summary: ReportSummary,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub suite: String,
    pub timer: TimerKind,
    /// Measured timer resolution in seconds
    pub resolution: f64,
    pub config: ReportConfig,
}

/// Sampling configuration captured in report metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub min_time: f64,
    pub max_time: f64,
    pub min_samples: usize,
    pub initial_count: u64,
    pub delay: f64,
    pub confidence_level: f64,
}

impl ReportConfig {
    /// Resolve `options` against `clock` the way a run does.
    pub fn from_options(options: &Options, clock: &ClockSource) -> Self {
        let settings = options.resolve(clock);
        Self {
            min_time: settings.min_time,
            max_time: settings.max_time,
            min_samples: settings.min_samples,
            initial_count: settings.initial_count,
            delay: settings.delay,
            confidence_level: CONFIDENCE_LEVEL,
        }
    }
}

/// Individual benchmark result in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReportResult {
    pub name: String,
    pub status: BenchmarkStatus,
    pub state: RunState,
    /// One-line summary, e.g. `name x 1,234 ops/sec ±0.52% (64 runs sampled)`
    pub line: String,
    pub metrics: Option<BenchmarkMetrics>,
    /// Comparison against the fastest run, for measured runs
    pub versus_fastest: Option<Ordering>,
    /// How much lower the throughput is than the fastest, in percent
    pub percent_slower: Option<f64>,
    pub failure: Option<FailureInfo>,
}

/// What a run produced.
///
/// Unmeasured, aborted and errored runs carry no metrics and are never
/// ranked; a measured run may still compare as indeterminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    Measured,
    Unmeasured,
    Aborted,
    Errored,
}

impl BenchmarkStatus {
    /// Classify a finished run.
    pub fn of(run: &BenchmarkRun) -> Self {
        if run.error().is_some() {
            BenchmarkStatus::Errored
        } else if run.state() == RunState::Aborted {
            BenchmarkStatus::Aborted
        } else if run.is_measured() {
            BenchmarkStatus::Measured
        } else {
            BenchmarkStatus::Unmeasured
        }
    }
}

/// Timing metrics, in seconds unless noted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub samples: usize,
    pub cycles: u32,
    /// Invocations per cycle at the end of the run
    pub count: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub std_err_mean: f64,
    pub margin_of_error: f64,
    /// Margin of error as a percentage of the mean
    pub relative_margin_of_error: f64,
    pub hz: f64,
    pub elapsed: f64,
}

impl From<&BenchmarkRun> for BenchmarkMetrics {
    fn from(run: &BenchmarkRun) -> Self {
        let stats = run.stats();
        Self {
            samples: run.sample().len(),
            cycles: run.cycles(),
            count: run.count(),
            mean: stats.mean,
            std_dev: stats.std_dev,
            std_err_mean: stats.std_err_mean,
            margin_of_error: stats.margin_of_error,
            relative_margin_of_error: stats.relative_margin_of_error,
            hz: stats.hz,
            elapsed: run.times().elapsed,
        }
    }
}

/// Failure information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureInfo {
    pub kind: String,
    pub message: String,
}

/// Report summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_benchmarks: usize,
    pub measured: usize,
    pub unmeasured: usize,
    pub aborted: usize,
    pub errored: usize,
    /// Sum of every run's elapsed time, in seconds
    pub total_duration: f64,
}

impl ReportSummary {
    /// Whether any run recorded an error.
    pub fn has_errors(&self) -> bool {
        self.errored > 0
    }
}

/// Build a report from finished runs.
///
/// Per-run comparisons against the fastest run are computed in parallel.
pub fn build_report(
    suite: &str,
    runs: &[BenchmarkRun],
    clock: &ClockSource,
    config: ReportConfig,
) -> Report {
    let fastest = paceline_core::fastest(runs);
    let slowest = paceline_core::slowest(runs);
    let leader = fastest.first().copied();

    let results: Vec<BenchmarkReportResult> = runs
        .par_iter()
        .map(|run| {
            let status = BenchmarkStatus::of(run);
            let measured = status == BenchmarkStatus::Measured;
            let versus_fastest = leader.filter(|_| measured).map(|best| run.compare(best));
            let percent_slower = leader
                .filter(|best| measured && best.hz() > 0.0)
                .map(|best| ((1.0 - run.hz() / best.hz()) * 100.0).max(0.0));

            BenchmarkReportResult {
                name: run.name().to_string(),
                status,
                state: run.state(),
                line: run.to_string(),
                metrics: measured.then(|| BenchmarkMetrics::from(run)),
                versus_fastest,
                percent_slower,
                failure: run.error().map(|error| FailureInfo {
                    kind: error.kind().to_string(),
                    message: error.to_string(),
                }),
            }
        })
        .collect();

    let mut summary = ReportSummary {
        total_benchmarks: results.len(),
        total_duration: runs.iter().map(|run| run.times().elapsed).sum(),
        ..ReportSummary::default()
    };
    for result in &results {
        match result.status {
            BenchmarkStatus::Measured => summary.measured += 1,
            BenchmarkStatus::Unmeasured => summary.unmeasured += 1,
            BenchmarkStatus::Aborted => summary.aborted += 1,
            BenchmarkStatus::Errored => summary.errored += 1,
        }
    }

    Report {
        meta: ReportMeta {
            schema_version: SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            suite: suite.to_string(),
            timer: clock.kind(),
            resolution: clock.resolution(),
            config,
        },
        results,
        fastest: fastest.iter().map(|run| run.name().to_string()).collect(),
        slowest: slowest.iter().map(|run| run.name().to_string()).collect(),
        summary,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use paceline_core::{Benchmark, EventKind, Suite};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

    /// Runs "fast" (8 ticks), "slow" (16 ticks) and a panicking "broken".
    pub(crate) fn sample_runs() -> (ClockSource, Vec<BenchmarkRun>) {
        let ticks = Arc::new(AtomicU64::new(0));
        let reader = ticks.clone();
        let clock = ClockSource::with_resolution(TimerKind::Custom, 1.0 / 1024.0, move || {
            reader.load(AtomicOrdering::SeqCst) as f64 / 1024.0
        })
        .unwrap();
        let options = Options::default()
            .min_time(5.0 / 128.0)
            .max_time(0.0)
            .min_samples(5);

        let bench = |name: &str, cost: u64| {
            let ticks = ticks.clone();
            Benchmark::new(name, move || ticks.fetch_add(cost, AtomicOrdering::SeqCst))
                .with_options(options.clone())
        };
        let mut suite = Suite::new("report")
            .with(bench("fast", 8))
            .with(bench("slow", 16))
            .with(Benchmark::new("broken", || -> u64 { panic!("broken") }));
        let runs = suite.run_sync(&clock).to_vec();
        (clock, runs)
    }

    #[test]
    fn test_build_report() {
        let (clock, runs) = sample_runs();
        let config = ReportConfig::from_options(&Options::default(), &clock);
        let report = build_report("report", &runs, &clock, config);

        assert_eq!(report.meta.suite, "report");
        assert_eq!(report.meta.timer, TimerKind::Custom);
        assert_eq!(report.meta.config.min_time, 0.05);
        assert_eq!(report.fastest, ["fast"]);
        assert_eq!(report.slowest, ["slow"]);

        let fast = &report.results[0];
        assert_eq!(fast.status, BenchmarkStatus::Measured);
        assert_eq!(fast.versus_fastest, Some(Ordering::Indeterminate));
        assert_eq!(fast.percent_slower, Some(0.0));
        assert_eq!(fast.metrics.as_ref().map(|m| m.hz), Some(128.0));

        let slow = &report.results[1];
        assert_eq!(slow.versus_fastest, Some(Ordering::Slower));
        assert_eq!(slow.percent_slower, Some(50.0));

        let broken = &report.results[2];
        assert_eq!(broken.status, BenchmarkStatus::Errored);
        assert!(broken.metrics.is_none());
        assert!(broken.versus_fastest.is_none());
        assert_eq!(
            broken.failure.as_ref().map(|f| f.kind.as_str()),
            Some("test-callable")
        );

        assert_eq!(report.summary.total_benchmarks, 3);
        assert_eq!(report.summary.measured, 2);
        assert_eq!(report.summary.errored, 1);
        assert!(report.summary.has_errors());
    }

    #[test]
    fn test_aborted_partial_run_is_not_fastest() {
        let ticks = Arc::new(AtomicU64::new(0));
        let reader = ticks.clone();
        let clock = ClockSource::with_resolution(TimerKind::Custom, 1.0 / 1024.0, move || {
            reader.load(AtomicOrdering::SeqCst) as f64 / 1024.0
        })
        .unwrap();
        let options = Options::default()
            .min_time(5.0 / 128.0)
            .max_time(0.0)
            .min_samples(5);

        let cheap = ticks.clone();
        let partial = Benchmark::new("fast-aborted", move || {
            cheap.fetch_add(4, AtomicOrdering::SeqCst)
        })
        .with_options(options.clone().min_samples(50))
        .with_listener(EventKind::Cycle, |event| {
            if event.run().is_some_and(|run| run.sample().len() >= 6) {
                event.cancel();
            }
        });
        let costly = ticks.clone();
        let slow = Benchmark::new("slow", move || costly.fetch_add(16, AtomicOrdering::SeqCst))
            .with_options(options);
        let runs = Suite::new("partial")
            .with(partial)
            .with(slow)
            .run_sync(&clock)
            .to_vec();

        let config = ReportConfig::from_options(&Options::default(), &clock);
        let report = build_report("partial", &runs, &clock, config);

        assert_eq!(report.fastest, ["slow"]);
        assert_eq!(report.slowest, ["slow"]);

        let aborted = &report.results[0];
        assert_eq!(aborted.status, BenchmarkStatus::Aborted);
        assert!(aborted.metrics.is_none());
        assert!(aborted.versus_fastest.is_none());
        assert!(aborted.failure.is_none());

        let slow = &report.results[1];
        assert_eq!(slow.status, BenchmarkStatus::Measured);
        assert_eq!(slow.versus_fastest, Some(Ordering::Indeterminate));
        assert_eq!(report.summary.measured, 1);
        assert_eq!(report.summary.aborted, 1);
    }

    #[test]
    fn test_status_of_unstarted_run() {
        let run = BenchmarkRun::new("idle", 1);
        assert_eq!(BenchmarkStatus::of(&run), BenchmarkStatus::Unmeasured);

        let mut aborted = BenchmarkRun::new("stopped", 1);
        aborted.abort();
        assert_eq!(BenchmarkStatus::of(&aborted), BenchmarkStatus::Aborted);
    }
}
