#![warn(missing_docs)]
//! Paceline Report - Suite Reporting
//!
//! Turns finished benchmark runs into a report and renders it:
//! - JSON (machine-readable)
//! - Human (terminal text with fastest/slowest sets)

mod format;
mod json;
mod report;

pub use format::{format_duration, format_human_output};
pub use json::{ReportSchema, generate_json_report};
pub use report::{
    BenchmarkMetrics, BenchmarkReportResult, BenchmarkStatus, FailureInfo, Report, ReportConfig,
    ReportMeta, ReportSummary, SCHEMA_VERSION, build_report,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// JSON with full schema
    Json,
    /// Human-readable terminal output
    #[default]
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render `report` in the requested format.
pub fn render(report: &Report, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => generate_json_report(report),
        OutputFormat::Human => Ok(format_human_output(report)),
    }
}
