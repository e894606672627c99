//! Integration tests for Paceline
//!
//! These tests verify the end-to-end behavior of the benchmarking system.

use paceline::{
    Benchmark, ClockSource, EventKind, Options, Ordering, ReportConfig, RunError, RunState, Stats,
    Suite, TimerKind, build_report, compare, find_registered, run_async, run_sync,
};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};

/// Clock that reads `ticks / 1024` seconds; only benchmark bodies advance it.
fn tick_clock() -> (ClockSource, Arc<AtomicU64>) {
    let ticks = Arc::new(AtomicU64::new(0));
    let reader = ticks.clone();
    let clock = ClockSource::with_resolution(TimerKind::Custom, 1.0 / 1024.0, move || {
        reader.load(AtomicOrdering::SeqCst) as f64 / 1024.0
    })
    .unwrap();
    (clock, ticks)
}

fn costs(ticks: &Arc<AtomicU64>, name: &str, cost: u64, options: &Options) -> Benchmark {
    let ticks = ticks.clone();
    Benchmark::new(name, move || ticks.fetch_add(cost, AtomicOrdering::SeqCst))
        .with_options(options.clone())
}

fn quick_options() -> Options {
    Options::default()
        .min_time(0.002)
        .max_time(0.0)
        .min_samples(5)
        .delay(0.0)
}

#[test]
fn test_millisecond_timer_default_min_time() {
    let clock = ClockSource::with_resolution(TimerKind::Custom, 0.001, || 0.0).unwrap();
    assert_eq!(clock.default_min_time(), 0.05);
}

#[test]
fn test_selected_timer_is_usable() {
    let clock = ClockSource::select().unwrap();
    assert!(clock.resolution() > 0.0);
    assert!(clock.default_min_time() >= 0.05);
}

#[test]
fn test_ten_millisecond_test_converges_at_count_five() {
    let (clock, ticks) = tick_clock();
    // Ten ticks is just under 10ms; fifty ticks is the minimum cycle
    let options = Options::default()
        .min_time(50.0 / 1024.0)
        .max_time(0.0)
        .min_samples(5);
    let mut bench = costs(&ticks, "sleepy", 10, &options);

    let run = run_sync(&mut bench, &clock);

    assert_eq!(run.state(), RunState::Completed);
    assert_eq!(run.count(), 5);
    assert_eq!(run.cycles(), 6);
    assert_eq!(run.sample(), &[10.0 / 1024.0; 5]);
    assert!((run.hz() - 102.4).abs() < 1e-9);
}

#[test]
fn test_small_sample_comparison_uses_u_table() {
    let a = [0.010, 0.011, 0.0105, 0.0108, 0.0102];
    let b = [0.020, 0.021, 0.019, 0.0205, 0.0195];

    assert_eq!(compare(&a, &b), Ordering::Faster);
    assert_eq!(compare(&b, &a), Ordering::Slower);
}

#[test]
fn test_below_sample_floor_is_indeterminate() {
    let a = [0.001, 0.001, 0.001, 0.001];
    let b = [1.0, 1.1, 1.2, 1.3, 1.4];
    assert_eq!(compare(&a, &b), Ordering::Indeterminate);
    assert_eq!(compare(&b, &a), Ordering::Indeterminate);
}

#[test]
fn test_always_failing_test_aborts_with_one_error() {
    let errors = Arc::new(AtomicUsize::new(0));
    let counter = errors.clone();
    let mut bench = Benchmark::new("explodes", || -> u64 { panic!("kaboom") })
        .with_options(quick_options())
        .with_listener(EventKind::Error, move |_| {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
        });
    let clock = ClockSource::select().unwrap();

    let run = run_sync(&mut bench, &clock);

    assert_eq!(run.state(), RunState::Aborted);
    assert_eq!(errors.load(AtomicOrdering::SeqCst), 1);
    assert!(matches!(run.error(), Some(RunError::TestCallable { message }) if message == "kaboom"));
    assert_eq!(*run.stats(), Stats::default());
    assert!(!run.is_measured());
    assert!(run.sample().is_empty());
}

#[test]
fn test_abort_is_idempotent() {
    let clock = ClockSource::select().unwrap();
    let mut bench = Benchmark::new("sum", || (0..128u64).sum::<u64>()).with_options(quick_options());
    let mut run = run_sync(&mut bench, &clock);
    let finished = run.clone();

    assert!(!run.abort());
    assert!(!run.abort());
    assert_eq!(run, finished);

    let mut pending = paceline::BenchmarkRun::new("pending", 1);
    assert!(pending.abort());
    let once = pending.clone();
    assert!(!pending.abort());
    assert_eq!(pending, once);
    assert_eq!(pending.state(), RunState::Aborted);
}

#[test]
fn test_run_compared_with_itself_is_indeterminate() {
    let clock = ClockSource::select().unwrap();
    let mut bench = Benchmark::new("sum", || (0..256u64).sum::<u64>()).with_options(quick_options());

    let run = run_sync(&mut bench, &clock);

    assert!(run.sample().len() >= 5);
    assert_eq!(run.compare(&run), Ordering::Indeterminate);
}

#[test]
fn test_sample_statistics_properties() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let len = rng.gen_range(2..64);
        let mut sample: Vec<f64> = (0..len).map(|_| rng.gen_range(1e-6..1e-2)).collect();
        let stats = Stats::from_sample(&sample);

        assert!(stats.variance >= 0.0);
        assert!(stats.std_err_mean <= stats.std_dev);

        sample.shuffle(&mut rng);
        let shuffled = Stats::from_sample(&sample);
        assert!((stats.mean - shuffled.mean).abs() <= 1e-12 * stats.mean.abs().max(1.0));
    }
}

#[test]
fn test_suite_ranks_and_reports() {
    let (clock, ticks) = tick_clock();
    let options = Options::default()
        .min_time(5.0 / 128.0)
        .max_time(0.0)
        .min_samples(5);
    let mut suite = Suite::new("ranking")
        .with(costs(&ticks, "quick", 8, &options))
        .with(costs(&ticks, "also-quick", 8, &options))
        .with(costs(&ticks, "slow", 16, &options))
        .with(Benchmark::new("broken", || -> u64 { panic!("broken") }));

    let runs = suite.run_sync(&clock).to_vec();

    let fastest: Vec<_> = suite.fastest().iter().map(|r| r.name().to_string()).collect();
    let slowest: Vec<_> = suite.slowest().iter().map(|r| r.name().to_string()).collect();
    assert_eq!(fastest, ["quick", "also-quick"]);
    assert_eq!(slowest, ["slow"]);

    let config = ReportConfig::from_options(&options, &clock);
    let report = build_report(suite.name(), &runs, &clock, config);
    assert_eq!(report.fastest, ["quick", "also-quick"]);
    assert_eq!(report.summary.measured, 3);
    assert_eq!(report.summary.errored, 1);
    assert_eq!(report.results[0].line, "quick x 128 ops/sec ±0.00% (5 runs sampled)");
}

#[test]
fn test_suite_abort_stops_remaining_benchmarks() {
    let clock = ClockSource::select().unwrap();
    let mut suite = Suite::new("abortable")
        .with(Benchmark::new("first", || 1u64).with_options(quick_options()))
        .with(Benchmark::new("second", || 2u64).with_options(quick_options()));
    let handle = suite.abort_handle();
    suite.on(EventKind::Complete, move |event| {
        if event.run().is_some() {
            handle.abort();
        }
    });

    let runs = suite.run_sync(&clock);

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].name(), "first");
}

#[tokio::test]
async fn test_async_deferred_benchmark() {
    let clock = ClockSource::select().unwrap();
    let mut bench = Benchmark::deferred("spawned", |deferred| {
        std::thread::spawn(move || deferred.resolve());
    })
    .with_options(Options::default().min_time(0.005).max_time(0.0).delay(0.0));

    let run = run_async(&mut bench, &clock, true).await;

    assert_eq!(run.state(), RunState::Completed);
    assert!(run.is_measured());
    assert!(run.sample().len() >= 5);
}

paceline::register!("integration-noop", || Benchmark::new("integration-noop", || ()));

#[test]
fn test_registered_benchmark_runs() {
    let def = find_registered("integration-noop").unwrap();
    let mut bench = def.instantiate().with_options(quick_options());
    let clock = ClockSource::select().unwrap();

    let run = run_sync(&mut bench, &clock);

    assert_eq!(run.name(), "integration-noop");
    assert!(run.is_measured());
}
