#![warn(missing_docs)]
//! Paceline CLI Library
//!
//! Command-line runner for benchmark suites. Benchmark binaries call
//! `paceline::run()` (or `paceline_cli::run()`) from `main` so suite files
//! can refer to the benchmarks they register.
//!
//! # Example
//!
//! ```ignore
//! paceline::register!("vec-push", || {
//!     paceline::Benchmark::new("vec-push", || {
//!         let mut v = Vec::with_capacity(64);
//!         v.extend(0..64u32);
//!         v
//!     })
//! });
//!
//! fn main() {
//!     if let Err(e) = paceline_cli::run() {
//!         eprintln!("Error: {e:#}");
//!         std::process::exit(1);
//!     }
//! }
//! ```

mod config;
mod executor;
mod planner;
mod suite_file;

pub use config::*;
pub use executor::Executor;
pub use planner::select;
pub use suite_file::{SuiteEntry, SuiteFile};

use anyhow::Context;
use clap::{Parser, Subcommand};
use paceline_core::{ClockSource, EngineError, find_registered, registered, select_timer};
use paceline_report::{OutputFormat, ReportConfig, build_report, render};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Paceline CLI arguments
#[derive(Parser, Debug)]
#[command(name = "paceline")]
#[command(author, version, about = "Paceline - adaptive micro-benchmarking")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the benchmarks listed in a suite file
    Run(RunArgs),
    /// List registered benchmarks
    List {
        /// Filter benchmark ids by regex pattern
        #[arg(default_value = ".*")]
        filter: String,
    },
    /// Write a default paceline.toml into the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Arguments of `paceline run`
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Suite file (TOML)
    pub suite_file: PathBuf,

    /// Minimum timed length of one cycle (e.g. "50ms", "0.2")
    #[arg(long)]
    pub min_time: Option<String>,

    /// Sampling budget per benchmark (e.g. "5s")
    #[arg(long)]
    pub max_time: Option<String>,

    /// Minimum number of periods per benchmark
    #[arg(long)]
    pub min_samples: Option<u32>,

    /// Execution mode; defaults to paceline.toml
    #[arg(long, value_enum)]
    pub mode: Option<ExecutionMode>,

    /// Output format: human, json
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also save a JSON report under the configured output directory
    #[arg(long)]
    pub save: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

/// How a CLI invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every benchmark ran without error
    Success,
    /// At least one benchmark recorded an error
    RunErrors,
    /// No usable timer on this host
    NoWorkingTimer,
}

impl Outcome {
    /// Process exit code: 0, 1 or 2.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::RunErrors => 1,
            Outcome::NoWorkingTimer => 2,
        }
    }
}

/// Run the Paceline CLI with the process arguments.
///
/// Exits the process with code 1 when a benchmark errored and 2 when no
/// timer works; returns `Ok(())` on success.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let outcome = run_with_cli(cli)?;
    if outcome != Outcome::Success {
        std::process::exit(outcome.exit_code());
    }
    Ok(())
}

/// Run the Paceline CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<Outcome> {
    // A second init (tests, embedding hosts) keeps the existing subscriber
    let filter = if cli.verbose {
        "paceline=debug"
    } else {
        "paceline=info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = PacelineConfig::discover().unwrap_or_default();

    match cli.command {
        Commands::Run(args) => run_suite(&args, &config),
        Commands::List { filter } => {
            list_benchmarks(&filter)?;
            Ok(Outcome::Success)
        }
        Commands::Init { force } => {
            init_config(Path::new(CONFIG_FILE), force)?;
            Ok(Outcome::Success)
        }
    }
}

/// Execute `paceline run`.
pub fn run_suite(args: &RunArgs, config: &PacelineConfig) -> anyhow::Result<Outcome> {
    let clock = match select_timer() {
        Ok(clock) => clock,
        Err(e @ EngineError::NoWorkingTimer) => {
            eprintln!("Error: {e}");
            return Ok(Outcome::NoWorkingTimer);
        }
    };
    run_suite_with_clock(args, config, &clock)
}

/// Execute `paceline run` against a given clock.
pub fn run_suite_with_clock(
    args: &RunArgs,
    config: &PacelineConfig,
    clock: &ClockSource,
) -> anyhow::Result<Outcome> {
    let suite_file = SuiteFile::load(&args.suite_file)?;
    let base = config
        .runner
        .to_options()
        .context("invalid [runner] section in paceline.toml")?;
    let overrides = overrides_from(args)?;
    let mut suite = suite_file.build(&base, &overrides, |id| {
        find_registered(id).map(|def| def.instantiate())
    })?;

    let format: OutputFormat = args
        .format
        .as_deref()
        .unwrap_or(&config.output.format)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let mode = args.mode.unwrap_or(config.runner.mode);

    let executor = if args.quiet {
        Executor::new(mode).quiet()
    } else {
        Executor::new(mode)
    };
    let runs = executor.execute(&mut suite, clock)?;

    let report_config = ReportConfig::from_options(&overrides.apply(base), clock);
    let report = build_report(suite.name(), &runs, clock, report_config);
    let output = render(&report, format)?;

    if let Some(ref path) = args.output {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(output.as_bytes())?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    if args.save {
        let dir = PathBuf::from(&config.output.directory);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(format!("{}.json", suite.name()));
        std::fs::write(&path, render(&report, OutputFormat::Json)?)?;
        println!("Saved: {}", path.display());
    }

    if report.summary.has_errors() {
        eprintln!("\n{} benchmark(s) failed", report.summary.errored);
        Ok(Outcome::RunErrors)
    } else {
        Ok(Outcome::Success)
    }
}

fn overrides_from(args: &RunArgs) -> anyhow::Result<Overrides> {
    let seconds = |flag: &str, value: &Option<String>| {
        value
            .as_deref()
            .map(PacelineConfig::parse_duration)
            .transpose()
            .with_context(|| format!("invalid --{flag}"))
    };
    Ok(Overrides {
        min_time: seconds("min-time", &args.min_time)?,
        max_time: seconds("max-time", &args.max_time)?,
        min_samples: args.min_samples,
    })
}

fn list_benchmarks(filter: &str) -> anyhow::Result<()> {
    let re = Regex::new(filter).with_context(|| format!("invalid filter `{filter}`"))?;
    let all = registered();
    let selected = select(all.iter().copied(), Some(&re));

    println!("Paceline Registry:");
    for def in &selected {
        println!("├── {} ({}:{})", def.id, def.file, def.line);
    }
    println!("{} of {} benchmarks shown.", selected.len(), all.len());
    Ok(())
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(path, PacelineConfig::default_toml())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
