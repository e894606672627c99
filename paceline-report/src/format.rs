//! Human Output
//!
//! Terminal-friendly rendering of a [`Report`]:
//! - One line per benchmark with a status icon
//! - The fastest and slowest sets
//! - A one-line summary

use crate::report::{BenchmarkStatus, Report};
use std::fmt::Write;

/// Format a report for terminal display.
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    output.push('\n');
    let _ = writeln!(output, "Paceline Results: {}", report.meta.suite);
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    for result in &report.results {
        let icon = match result.status {
            BenchmarkStatus::Measured => "✓",
            BenchmarkStatus::Unmeasured => "?",
            BenchmarkStatus::Aborted => "⊘",
            BenchmarkStatus::Errored => "✗",
        };
        let _ = writeln!(output, "  {} {}", icon, result.line);

        if let Some(metrics) = &result.metrics {
            let _ = writeln!(
                output,
                "      mean: {}  ±{}  cycles: {}  count: {}",
                format_duration(metrics.mean),
                format_duration(metrics.margin_of_error),
                metrics.cycles,
                metrics.count
            );
        }
        if let Some(percent) = result.percent_slower.filter(|p| *p > 0.0) {
            let _ = writeln!(output, "      {:.1}% slower than the fastest", percent);
        }
    }

    if !report.fastest.is_empty() {
        let _ = writeln!(output, "\nFastest is {}", report.fastest.join(", "));
    }
    if !report.slowest.is_empty() && report.results.len() > 1 {
        let _ = writeln!(output, "Slowest is {}", report.slowest.join(", "));
    }

    let summary = &report.summary;
    output.push('\n');
    output.push_str(&"-".repeat(60));
    output.push('\n');
    let _ = writeln!(
        output,
        "{} benchmarks: {} measured, {} unmeasured, {} aborted, {} errored ({})",
        summary.total_benchmarks,
        summary.measured,
        summary.unmeasured,
        summary.aborted,
        summary.errored,
        format_duration(summary.total_duration)
    );

    output
}

/// Render seconds with a readable unit (`ns`, `µs`, `ms`, `s`).
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "n/a".to_string();
    }
    let magnitude = seconds.abs();
    if magnitude >= 1.0 {
        format!("{:.2} s", seconds)
    } else if magnitude >= 1e-3 {
        format!("{:.2} ms", seconds * 1e3)
    } else if magnitude >= 1e-6 {
        format!("{:.2} µs", seconds * 1e6)
    } else {
        format!("{:.2} ns", seconds * 1e9)
    }
}
