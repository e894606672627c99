//! Configuration loading from paceline.toml
//!
//! Paceline configuration can be specified in a `paceline.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use paceline_core::Options;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name searched for by [`PacelineConfig::discover`].
pub const CONFIG_FILE: &str = "paceline.toml";

/// Paceline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PacelineConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// How the runner drives each benchmark
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Tight loop on the calling thread (default)
    #[default]
    Sync,
    /// On an async runtime, pausing `delay` between cycles
    Async,
}

impl ExecutionMode {
    /// Whether cycles yield to a runtime
    pub fn is_async(self) -> bool {
        matches!(self, ExecutionMode::Async)
    }
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Minimum timed length of a cycle (e.g., "50ms"); derived from the timer when unset
    #[serde(default)]
    pub min_time: Option<String>,
    /// Sampling budget per benchmark (e.g., "5s")
    #[serde(default = "default_max_time")]
    pub max_time: String,
    /// Minimum number of periods per benchmark
    #[serde(default = "default_min_samples")]
    pub min_samples: u32,
    /// Invocations in the first cycle
    #[serde(default = "default_initial_count")]
    pub initial_count: u64,
    /// Pause between async cycles (e.g., "5ms")
    #[serde(default = "default_delay")]
    pub delay: String,
    /// Execution mode: "sync" or "async"
    #[serde(default)]
    pub mode: ExecutionMode,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            min_time: None,
            max_time: default_max_time(),
            min_samples: default_min_samples(),
            initial_count: default_initial_count(),
            delay: default_delay(),
            mode: ExecutionMode::default(),
        }
    }
}

fn default_max_time() -> String {
    "5s".to_string()
}
fn default_min_samples() -> u32 {
    paceline_core::DEFAULT_MIN_SAMPLES
}
fn default_initial_count() -> u64 {
    paceline_core::DEFAULT_INITIAL_COUNT
}
fn default_delay() -> String {
    "5ms".to_string()
}

impl RunnerConfig {
    /// Convert to engine sampling options.
    pub fn to_options(&self) -> anyhow::Result<Options> {
        let mut options = Options::default()
            .max_time(PacelineConfig::parse_duration(&self.max_time)?)
            .min_samples(self.min_samples)
            .initial_count(self.initial_count)
            .delay(PacelineConfig::parse_duration(&self.delay)?);
        if let Some(min_time) = &self.min_time {
            options = options.min_time(PacelineConfig::parse_duration(min_time)?);
        }
        Ok(options)
    }
}

/// Sampling settings given on the command line; these win over every file.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overrides {
    /// `--min-time`, in seconds
    pub min_time: Option<f64>,
    /// `--max-time`, in seconds
    pub max_time: Option<f64>,
    /// `--min-samples`
    pub min_samples: Option<u32>,
}

impl Overrides {
    /// Overlay the set fields onto `options`.
    pub fn apply(&self, mut options: Options) -> Options {
        if let Some(min_time) = self.min_time {
            options.min_time = Some(min_time);
        }
        if let Some(max_time) = self.max_time {
            options.max_time = max_time;
        }
        if let Some(min_samples) = self.min_samples {
            options.min_samples = min_samples;
        }
        options
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Output directory for reports
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            directory: default_output_dir(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}
fn default_output_dir() -> String {
    "target/paceline".to_string()
}

impl PacelineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), "ignoring config: {e:#}");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Paceline Configuration

[runner]
# Minimum timed length of one cycle (uncomment to override the timer-derived default)
# min_time = "50ms"
# Sampling budget per benchmark
max_time = "5s"
# Minimum number of periods per benchmark
min_samples = 5
# Invocations in the first cycle
initial_count = 1
# Pause between async cycles (not counted toward max_time)
delay = "5ms"
# Execution mode: "sync" or "async"
mode = "sync"

[output]
# Default output format: human or json
format = "human"
# Output directory for reports
directory = "target/paceline"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to seconds
    pub fn parse_duration(s: &str) -> anyhow::Result<f64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Duration must be a non-negative number: {}", s));
        }

        let multiplier = match unit_part.to_lowercase().as_str() {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" | "" => 1.0,
            "m" | "min" => 60.0,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(value * multiplier)
    }
}
