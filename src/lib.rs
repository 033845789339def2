//! Droid Triage
//!
//! Bounded-time triage of Android application packages. The artifacts of a package are obtained
//! from an isolated inspector under a hard timeout, with a lightweight fallback, and then run
//! through a set of heuristics that flag risky permissions, exported or debuggable components and
//! hardcoded secrets.

#![forbid(anonymous_parameters)]
#![warn(
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,
    variant_size_differences,
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts
)]

pub mod artifacts;
pub mod cli;
mod config;
pub mod criticality;
pub mod error;
pub mod inspector;
pub mod orchestrator;
mod results;
pub mod static_analysis;
mod utils;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use env_logger::Builder;
use log::{info, Level, LevelFilter};
use std::{
    env, fmt,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

pub use crate::{
    artifacts::{AnalysisOutcome, PackageArtifacts},
    config::Config,
    criticality::Criticality,
    error::{ConfigError, Degradation, InspectorError},
    inspector::{CommandInspector, InProcessInspector, Inspector, PackageInspector},
    orchestrator::{run_analysis, run_with_ceiling, AnalysisOptions},
    results::{FingerPrint, Results},
    static_analysis::{static_analysis, Finding},
    utils::{get_package_name, print_vulnerability, print_warning},
};

/// Initialize the config with the config files and command line options.
///
/// On UNIX, if local file (`config.toml`) does not exists, but the global one does
/// (`/etc/droid-triage/config.toml`), the latter is used. Otherwise, the local file is used.
/// Finally, if none of the files could be loaded, the default config is used.
pub fn initialize_config(cli: &ArgMatches<'_>) -> Result<Config> {
    let config_path = PathBuf::from("config.toml");
    let global_config_path = PathBuf::from("/etc/droid-triage/config.toml");

    let mut config =
        if cfg!(target_family = "unix") && !config_path.exists() && global_config_path.exists() {
            Config::from_file(&global_config_path).context(
                "there was an error when reading the /etc/droid-triage/config.toml file",
            )?
        } else if config_path.exists() {
            Config::from_file(&config_path)
                .context("there was an error when reading the config.toml file")?
        } else {
            print_warning("Config file not found. Using default configuration");
            Config::default()
        };

    config
        .decorate_with_cli(cli)
        .context("there was an error reading config from CLI")?;

    Ok(config)
}

/// Initializes the logger.
///
/// The `RUST_LOG` environment variable overrides the level selected by the verbose flag.
pub fn initialize_logger(is_verbose: bool) {
    let log_level = if is_verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::new();
    let _ = builder.format(|buf, record| match record.level() {
        Level::Warn => writeln!(
            buf,
            "{}{}",
            "Warning: ".bold().yellow(),
            record.args().to_string().yellow()
        ),
        Level::Error => writeln!(
            buf,
            "{}{}",
            "Error: ".bold().red(),
            record.args().to_string().red()
        ),
        Level::Debug => writeln!(
            buf,
            "{}{}",
            "Debug: ".bold(),
            record.args().to_string().bold()
        ),
        Level::Info => writeln!(buf, "{}", record.args()),
        Level::Trace => writeln!(buf, "{}: {}", record.level(), record.args()),
    });

    if let Ok(env_log) = env::var("RUST_LOG") {
        let _ = builder.parse_filters(&env_log);
    } else {
        let _ = builder.filter(Some("droid_triage"), log_level);
    }

    if let Err(e) = builder.try_init() {
        eprintln!("Could not initialize logger: {}", e);
    }
}

/// Analyzes the given package with the given config.
///
/// The analysis itself never fails: a package for which no artifacts can be obtained produces
/// failed results. Only report generation errors are returned.
pub fn analyze_package<P: AsRef<Path>>(
    package: P,
    config: &Config,
    benchmarks: &mut Vec<Benchmark>,
) -> Result<Results> {
    let package_name = get_package_name(&package);
    if !config.is_quiet() {
        info!("Starting analysis of {}.", package_name.italic());
    }
    let start_time = Instant::now();

    let inspector = Arc::new(config.inspector());
    let outcome = run_with_ceiling(
        inspector,
        package.as_ref(),
        &config.analysis_options(),
        config.ceiling(),
    );
    if config.is_bench() {
        benchmarks.push(Benchmark::new("Package inspection", start_time.elapsed()));
    }
    if let Some(warning) = outcome.warning() {
        print_warning(format!(
            "Only a partial analysis of {} was possible: {}",
            package_name, warning
        ));
    }

    let static_start = Instant::now();
    let results = Results::new(config, &package, &outcome);
    if config.is_bench() {
        benchmarks.push(Benchmark::new("Static analysis", static_start.elapsed()));
    }

    if !config.is_quiet() {
        results.print(config);
    }

    let report_start = Instant::now();
    let _ = results.generate_report(config).with_context(|| {
        format!(
            "there was an error generating the results report. Tried to generate at: {}",
            config.results_folder().join(results.report_name()).display()
        )
    })?;

    if config.is_bench() {
        benchmarks.push(Benchmark::new("Report generation", report_start.elapsed()));
        benchmarks.push(Benchmark::new(
            format!("Total time for {}", package_name),
            start_time.elapsed(),
        ));
    }

    Ok(results)
}

/// Structure to store a benchmark information.
#[derive(Debug, Clone, PartialEq)]
pub struct Benchmark {
    label: String,
    duration: Duration,
}

impl Benchmark {
    /// Creates a new benchmark.
    pub fn new<L: Into<String>>(label: L, duration: Duration) -> Self {
        Self {
            label: label.into(),
            duration,
        }
    }

    /// Gets the label of the benchmark.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Gets the measured duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}.{:03}s",
            self.label,
            self.duration.as_secs(),
            self.duration.subsec_millis()
        )
    }
}
