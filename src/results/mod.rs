//! Analysis results and report generation.

mod report;
mod utils;

use crate::{
    artifacts::AnalysisOutcome,
    config::Config,
    criticality::Criticality,
    static_analysis::{static_analysis, Finding},
    utils::{get_package_name, print_vulnerability, print_warning},
};
use anyhow::{Context, Result};
use chrono::Local;
use clap::crate_version;
use colored::Colorize;
use log::debug;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::{
    collections::BTreeSet,
    fs,
    path::{Component, Path},
};

use self::report::{Generator, Json};
pub use self::utils::FingerPrint;

/// Results of the analysis of one package.
#[derive(Debug)]
pub struct Results {
    package_name: String,
    app_package: String,
    app_version: String,
    app_version_num: u64,
    outcome: &'static str,
    warning: Option<String>,
    error: Option<String>,
    fingerprint: Option<FingerPrint>,
    permissions: BTreeSet<String>,
    warnings: Vec<Finding>,
    low: Vec<Finding>,
    medium: Vec<Finding>,
    high: Vec<Finding>,
    critical: Vec<Finding>,
}

impl Results {
    /// Builds the results of a package from the outcome of its analysis.
    ///
    /// Runs the heuristics over the available artifacts and keeps the findings at or above the
    /// configured minimum criticality.
    pub fn new<P: AsRef<Path>>(config: &Config, package: P, outcome: &AnalysisOutcome) -> Self {
        let fingerprint = match FingerPrint::new(package.as_ref()) {
            Ok(f) => Some(f),
            Err(e) => {
                print_warning(format!(
                    "An error occurred when trying to fingerprint the application: {:#}",
                    e
                ));
                None
            }
        };

        let (outcome_name, error) = match outcome {
            AnalysisOutcome::Full(_) => ("full", None),
            AnalysisOutcome::Degraded { .. } => ("degraded", None),
            AnalysisOutcome::Failed { message } => ("failed", Some(message.clone())),
        };

        let mut results = Self {
            package_name: get_package_name(package.as_ref()),
            app_package: String::new(),
            app_version: String::new(),
            app_version_num: 0,
            outcome: outcome_name,
            warning: outcome.warning().map(str::to_owned),
            error,
            fingerprint,
            permissions: BTreeSet::new(),
            warnings: Vec::new(),
            low: Vec::new(),
            medium: Vec::new(),
            high: Vec::new(),
            critical: Vec::new(),
        };

        if let Some(artifacts) = outcome.artifacts() {
            results.app_package = artifacts.package_id.clone();
            results.app_version = artifacts.version_name.clone();
            results.app_version_num = artifacts.version_code;
            results.permissions = artifacts.permissions.clone();

            for finding in static_analysis(artifacts) {
                if finding.criticality() >= config.min_criticality() {
                    results.add_finding(finding);
                }
            }
            debug!(
                "{} findings recorded for {}",
                results.total_findings(),
                results.report_name()
            );
        }

        results
    }

    /// Records a finding in the bucket of its criticality.
    pub fn add_finding(&mut self, finding: Finding) {
        match finding.criticality() {
            Criticality::Warning => self.warnings.push(finding),
            Criticality::Low => self.low.push(finding),
            Criticality::Medium => self.medium.push(finding),
            Criticality::High => self.high.push(finding),
            Criticality::Critical => self.critical.push(finding),
        }
    }

    /// Gets the application package identifier, empty if the analysis failed.
    pub fn app_package(&self) -> &str {
        &self.app_package
    }

    /// Name of the report folder: the package identifier, or the file name when unknown.
    ///
    /// The identifier comes from the inspector, so it is only used when it is a single plain
    /// path component. Anything else would place the report outside of the results folder.
    pub fn report_name(&self) -> &str {
        if is_plain_component(&self.app_package) {
            &self.app_package
        } else {
            &self.package_name
        }
    }

    /// Returns true if no artifacts could be obtained for the package.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Total number of recorded findings.
    pub fn total_findings(&self) -> usize {
        self.warnings.len() + self.low.len() + self.medium.len() + self.high.len() + self.critical.len()
    }

    /// Findings from most to least critical.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.critical
            .iter()
            .chain(&self.high)
            .chain(&self.medium)
            .chain(&self.low)
            .chain(&self.warnings)
    }

    /// Prints the results in the terminal.
    pub fn print(&self, config: &Config) {
        if let Some(error) = &self.error {
            println!("{} {}", "Analysis failed:".bold().red(), error.red());
            return;
        }

        println!();
        println!(
            "{} {} ({} {})",
            "Package:".bold(),
            self.app_package.italic(),
            self.app_version,
            self.app_version_num
        );
        if let Some(warning) = &self.warning {
            println!("{} {}", "Partial analysis:".bold().yellow(), warning.yellow());
        }
        if config.is_verbose() {
            for permission in &self.permissions {
                println!("  - {}", permission);
            }
        }

        let mut displayed_strings = 0;
        let mut hidden_strings = 0;
        for finding in self.findings() {
            if let Finding::HardcodedString { .. } = finding {
                if displayed_strings == config.max_displayed_strings() {
                    hidden_strings += 1;
                    continue;
                }
                displayed_strings += 1;
            }
            print_vulnerability(
                format!("{}: {}", finding.label(), finding.description()),
                finding.criticality(),
            );
        }
        if hidden_strings > 0 {
            println!(
                "... and {} more hardcoded strings, see the JSON report.",
                hidden_strings
            );
        }

        if self.total_findings() == 0 {
            println!("No findings for this package.");
        }
    }

    /// Generates the reports enabled in the configuration.
    ///
    /// Returns whether a report was written.
    pub fn generate_report(&self, config: &Config) -> Result<bool> {
        if !config.has_to_generate_json() {
            return Ok(false);
        }

        let path = config.results_folder().join(self.report_name());
        fs::create_dir_all(&path)
            .with_context(|| format!("could not create the results folder `{}`", path.display()))?;

        let mut json_reporter = Json::new();
        json_reporter.generate(config, self)?;
        debug!("JSON report generated in {}", path.display());

        Ok(true)
    }
}

impl Serialize for Results {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let now = Local::now();
        let mut ser_struct = serializer.serialize_struct("Results", 24)?;

        ser_struct.serialize_field("droid_triage_version", crate_version!())?;
        ser_struct.serialize_field("now", &now)?;
        ser_struct.serialize_field("now_rfc2822", &now.to_rfc2822())?;
        ser_struct.serialize_field("now_rfc3339", &now.to_rfc3339())?;

        ser_struct.serialize_field("package_name", &self.package_name)?;
        ser_struct.serialize_field("app_package", &self.app_package)?;
        ser_struct.serialize_field("app_version", &self.app_version)?;
        ser_struct.serialize_field("app_version_number", &self.app_version_num)?;
        ser_struct.serialize_field("app_fingerprint", &self.fingerprint)?;
        ser_struct.serialize_field("permissions", &self.permissions)?;

        ser_struct.serialize_field("outcome", self.outcome)?;
        ser_struct.serialize_field("warning", &self.warning)?;
        ser_struct.serialize_field("error", &self.error)?;

        ser_struct.serialize_field("total_findings", &self.total_findings())?;
        ser_struct.serialize_field("criticals", &self.critical)?;
        ser_struct.serialize_field("criticals_len", &self.critical.len())?;
        ser_struct.serialize_field("highs", &self.high)?;
        ser_struct.serialize_field("highs_len", &self.high.len())?;
        ser_struct.serialize_field("mediums", &self.medium)?;
        ser_struct.serialize_field("mediums_len", &self.medium.len())?;
        ser_struct.serialize_field("lows", &self.low)?;
        ser_struct.serialize_field("lows_len", &self.low.len())?;
        ser_struct.serialize_field("warnings", &self.warnings)?;
        ser_struct.serialize_field("warnings_len", &self.warnings.len())?;

        ser_struct.end()
    }
}

/// Checks that the name is exactly one normal path component, without separators.
fn is_plain_component(name: &str) -> bool {
    if name.contains(|c: char| c == '/' || c == '\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => true,
        _ => false,
    }
}
