//! Configuration module.
//!
//! Handles the configuration of the analyzer: the limits of the orchestrator, the external
//! inspector to run and the report options. Values come from a TOML file and can be overridden
//! from the command line.

use crate::{
    criticality::Criticality,
    error::ConfigError,
    inspector::CommandInspector,
    orchestrator::{
        AnalysisOptions, DEFAULT_CEILING, DEFAULT_GRACE_PERIOD, DEFAULT_HARD_TIMEOUT,
        DEFAULT_SIZE_THRESHOLD,
    },
};
use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

/// Default inspector program, looked up in the `PATH`.
pub const DEFAULT_INSPECTOR: &str = "droid-triage-inspector";

/// Config structure.
///
/// Contains the configuration of the application.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Packages to analyze.
    #[serde(skip)]
    packages: Vec<PathBuf>,
    /// Boolean to represent `--verbose` mode.
    #[serde(skip)]
    verbose: bool,
    /// Boolean to represent `--quiet` mode.
    #[serde(skip)]
    quiet: bool,
    /// Boolean to represent `--bench` mode.
    #[serde(skip)]
    bench: bool,
    /// Generate the JSON report.
    json: bool,
    /// Size in bytes above which the full inspection is skipped.
    size_threshold: u64,
    /// Full inspection budget, in seconds.
    hard_timeout: u64,
    /// Time to wait for a terminated inspection, in seconds.
    grace_period: u64,
    /// Ceiling for a whole analysis, in seconds.
    ceiling: u64,
    /// Inspector program.
    inspector: String,
    /// Arguments given to the inspector before the inspection mode.
    inspector_args: Vec<String>,
    /// Folder where the reports are written.
    results_folder: PathBuf,
    /// Minimum criticality of the reported findings.
    min_criticality: Criticality,
    /// Maximum number of hardcoded strings printed in the terminal.
    max_displayed_strings: usize,
}

impl Config {
    /// Loads the configuration from the given TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let toml = fs::read_to_string(path.as_ref())
            .with_context(|| format!("could not read `{}`", path.as_ref().display()))?;
        let config: Self = toml::from_str(&toml)
            .with_context(|| format!("could not parse `{}`", path.as_ref().display()))?;
        config.validate()?;

        Ok(config)
    }

    /// Modifies the configuration with the options given in the command line.
    pub fn decorate_with_cli(&mut self, cli: &ArgMatches<'_>) -> Result<()> {
        if let Some(packages) = cli.values_of("packages") {
            self.packages = packages.map(PathBuf::from).collect();
        }
        self.verbose = cli.is_present("verbose");
        self.quiet = cli.is_present("quiet");
        self.bench = cli.is_present("bench");
        if cli.is_present("json") {
            self.json = true;
        }

        if let Some(threshold) = cli.value_of("size_threshold") {
            self.size_threshold = parse_option("size_threshold", threshold)?;
        }
        if let Some(timeout) = cli.value_of("timeout") {
            self.hard_timeout = parse_option("hard_timeout", timeout)?;
        }
        if let Some(ceiling) = cli.value_of("ceiling") {
            self.ceiling = parse_option("ceiling", ceiling)?;
        }
        if let Some(inspector) = cli.value_of("inspector") {
            self.inspector = inspector.to_owned();
        }
        if let Some(folder) = cli.value_of("results") {
            self.results_folder = PathBuf::from(folder);
        }
        if let Some(criticality) = cli.value_of("min_criticality") {
            self.min_criticality = Criticality::from_str(criticality)?;
        }

        self.validate()?;
        Ok(())
    }

    /// Checks that the limits are usable.
    ///
    /// The full inspection, including the grace period given to a terminated inspector, must end
    /// before the analysis ceiling, so that the lightweight inspection never runs next to it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_threshold == 0 {
            return Err(ConfigError::Zero("size_threshold"));
        }
        if self.hard_timeout == 0 {
            return Err(ConfigError::Zero("hard_timeout"));
        }
        if self.ceiling == 0 {
            return Err(ConfigError::Zero("ceiling"));
        }
        if self.hard_timeout.saturating_add(self.grace_period) >= self.ceiling {
            return Err(ConfigError::CeilingTooShort {
                hard_timeout: self.hard_timeout,
                grace_period: self.grace_period,
                ceiling: self.ceiling,
            });
        }
        if self.inspector.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                option: "inspector",
                value: self.inspector.clone(),
            });
        }
        Ok(())
    }

    /// Gets the packages to analyze.
    pub fn packages(&self) -> &[PathBuf] {
        &self.packages
    }

    /// Returns true if the application is running in `--verbose` mode, false otherwise.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Returns true if the application is running in `--quiet` mode, false otherwise.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Returns true if the application is running in `--bench` mode, false otherwise.
    pub fn is_bench(&self) -> bool {
        self.bench
    }

    /// Returns true if the JSON report has to be generated.
    pub fn has_to_generate_json(&self) -> bool {
        self.json
    }

    /// Gets the limits for the orchestrator.
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            size_threshold: self.size_threshold,
            hard_timeout: Duration::from_secs(self.hard_timeout),
            grace_period: Duration::from_secs(self.grace_period),
        }
    }

    /// Gets the ceiling for a whole analysis.
    pub fn ceiling(&self) -> Duration {
        Duration::from_secs(self.ceiling)
    }

    /// Gets the inspector described by the configuration.
    pub fn inspector(&self) -> CommandInspector {
        CommandInspector::new(self.inspector.as_str())
            .with_args(self.inspector_args.iter().cloned())
    }

    /// Gets the path to the results folder.
    pub fn results_folder(&self) -> &Path {
        &self.results_folder
    }

    /// Gets the minimum criticality of the reported findings.
    pub fn min_criticality(&self) -> Criticality {
        self.min_criticality
    }

    /// Gets the maximum number of hardcoded strings printed in the terminal.
    pub fn max_displayed_strings(&self) -> usize {
        self.max_displayed_strings
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            verbose: false,
            quiet: false,
            bench: false,
            json: false,
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            hard_timeout: DEFAULT_HARD_TIMEOUT.as_secs(),
            grace_period: DEFAULT_GRACE_PERIOD.as_secs(),
            ceiling: DEFAULT_CEILING.as_secs(),
            inspector: String::from(DEFAULT_INSPECTOR),
            inspector_args: Vec::new(),
            results_folder: PathBuf::from("results"),
            min_criticality: Criticality::Warning,
            max_displayed_strings: 20,
        }
    }
}

/// Parses a positive integer option given in the command line.
fn parse_option(option: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        option,
        value: value.to_owned(),
    })
}
