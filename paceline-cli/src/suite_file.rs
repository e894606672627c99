//! Suite Files
//!
//! A suite file is a TOML document listing benchmarks in run order:
//!
//! ```toml
//! name = "collections"
//! queue = false
//!
//! [[bench]]
//! id = "vec-push"          # registered with paceline::register!
//! min_samples = 10
//!
//! [[bench]]
//! name = "spawn true"
//! command = ["true"]      # external program, one invocation per call
//! max_time = "2s"
//! ```
//!
//! Each entry names either a registered benchmark id or a `command`.
//! Per-entry settings override the `[runner]` section of `paceline.toml`;
//! CLI flags override both.

use crate::config::{Overrides, PacelineConfig};
use anyhow::{Context, bail};
use paceline_core::{Benchmark, Options, Suite};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};

/// Parsed suite file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteFile {
    /// Suite name; defaults to the file stem
    #[serde(default)]
    pub name: Option<String>,
    /// Detach each benchmark once it has run
    #[serde(default)]
    pub queue: bool,
    /// Benchmarks in run order
    #[serde(default, rename = "bench")]
    pub benchmarks: Vec<SuiteEntry>,
}

/// One benchmark entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteEntry {
    /// Registered benchmark id
    #[serde(default)]
    pub id: Option<String>,
    /// External program and arguments
    #[serde(default)]
    pub command: Option<Vec<String>>,
    /// Display name; defaults to the id or the command line
    #[serde(default)]
    pub name: Option<String>,
    /// Minimum cycle time (e.g. "50ms")
    #[serde(default)]
    pub min_time: Option<String>,
    /// Sampling budget (e.g. "5s")
    #[serde(default)]
    pub max_time: Option<String>,
    /// Minimum number of periods
    #[serde(default)]
    pub min_samples: Option<u32>,
    /// Invocations in the first cycle
    #[serde(default)]
    pub initial_count: Option<u64>,
    /// Pause between async cycles (e.g. "5ms")
    #[serde(default)]
    pub delay: Option<String>,
}

impl SuiteFile {
    /// Load and validate a suite file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read suite file {}", path.display()))?;
        let mut suite = Self::parse(&content)
            .with_context(|| format!("invalid suite file {}", path.display()))?;
        if suite.name.is_none() {
            suite.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        Ok(suite)
    }

    /// Parse and validate suite file contents.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let suite: Self = toml::from_str(content)?;
        for (index, entry) in suite.benchmarks.iter().enumerate() {
            entry
                .validate()
                .with_context(|| format!("bench entry #{}", index + 1))?;
        }
        Ok(suite)
    }

    /// Suite name, or `"suite"` when neither the file nor its path named one.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("suite")
    }

    /// Instantiate every entry into a runnable [`Suite`].
    ///
    /// `resolve` maps a registered id to a fresh benchmark. Options are
    /// layered as `base` → entry settings → `overrides`.
    pub fn build(
        &self,
        base: &Options,
        overrides: &Overrides,
        resolve: impl Fn(&str) -> Option<Benchmark>,
    ) -> anyhow::Result<Suite> {
        let mut suite = Suite::new(self.display_name()).queued(self.queue);
        for entry in &self.benchmarks {
            let options = overrides.apply(entry.options(base.clone())?);
            let bench = match (&entry.id, &entry.command) {
                (Some(id), _) => resolve(id)
                    .with_context(|| format!("no registered benchmark with id `{id}`"))?,
                (None, Some(argv)) => command_benchmark(entry.display_name(), argv.clone()),
                (None, None) => bail!("bench entry has neither `id` nor `command`"),
            };
            let bench = match &entry.name {
                Some(name) => bench.renamed(name.clone()),
                None => bench,
            };
            suite.add(bench.with_options(options));
        }
        Ok(suite)
    }
}

impl SuiteEntry {
    fn validate(&self) -> anyhow::Result<()> {
        match (&self.id, &self.command) {
            (Some(_), Some(_)) => bail!("`id` and `command` are mutually exclusive"),
            (None, None) => bail!("either `id` or `command` is required"),
            (None, Some(argv)) if argv.is_empty() => bail!("`command` must not be empty"),
            _ => {}
        }
        self.options(Options::default()).map(|_| ())
    }

    /// Name shown in results.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match (&self.id, &self.command) {
            (Some(id), _) => id.clone(),
            (None, Some(argv)) => argv.join(" "),
            (None, None) => String::new(),
        }
    }

    /// Apply this entry's settings on top of `base`.
    pub fn options(&self, mut base: Options) -> anyhow::Result<Options> {
        if let Some(min_time) = &self.min_time {
            base.min_time = Some(PacelineConfig::parse_duration(min_time)?);
        }
        if let Some(max_time) = &self.max_time {
            base.max_time = PacelineConfig::parse_duration(max_time)?;
        }
        if let Some(min_samples) = self.min_samples {
            base.min_samples = min_samples;
        }
        if let Some(initial_count) = self.initial_count {
            base.initial_count = initial_count;
        }
        if let Some(delay) = &self.delay {
            base.delay = PacelineConfig::parse_duration(delay)?;
        }
        Ok(base)
    }
}

/// Benchmark that spawns `argv` once per invocation.
///
/// A spawn failure or non-zero exit panics inside the test callable, which
/// the scheduler records as a test error for this run only.
fn command_benchmark(name: String, argv: Vec<String>) -> Benchmark {
    Benchmark::new(name, move || {
        let (program, args) = match argv.split_first() {
            Some(split) => split,
            None => panic!("empty command"),
        };
        match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => {}
            Ok(status) => panic!("`{}` exited with {}", argv.join(" "), status),
            Err(e) => panic!("failed to spawn `{}`: {}", program, e),
        }
    })
}
