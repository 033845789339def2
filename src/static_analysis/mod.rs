//! Heuristic detection engine.
//!
//! Pure functions from package artifacts to findings: no I/O and no shared state besides the
//! read-only catalogs. Empty or malformed input yields no findings, never an error.

pub mod manifest;
pub mod permissions;
pub mod strings;

use crate::{artifacts::PackageArtifacts, criticality::Criticality};
use serde::Serialize;

pub use self::{
    manifest::{detect_manifest_issues, ManifestIssues},
    permissions::{detect_permission_risks, RISK_PERMISSIONS},
    strings::{detect_hardcoded_strings, SUSPICIOUS_KEYWORDS},
};

/// A single flagged condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A declared permission is in the risk catalog.
    PermissionRisk {
        /// Permission identifier.
        permission: String,
        /// Why the permission is risky.
        description: String,
    },
    /// A component is exported to other applications.
    ExportedComponent {
        /// Raw text of the matched attribute.
        raw_match: String,
    },
    /// The application is debuggable.
    DebuggableFlag {
        /// Manifest line of the attribute, starting at 1.
        line: Option<usize>,
    },
    /// A string constant looks like a hardcoded secret or endpoint.
    HardcodedString {
        /// The string constant.
        value: String,
        /// The first suspicious keyword it contains.
        matched_keyword: String,
    },
}

impl Finding {
    /// Gets the criticality of the finding.
    pub fn criticality(&self) -> Criticality {
        match self {
            Self::DebuggableFlag { .. } => Criticality::Critical,
            Self::PermissionRisk { .. } => Criticality::Medium,
            Self::HardcodedString { .. } => Criticality::Low,
            Self::ExportedComponent { .. } => Criticality::Warning,
        }
    }

    /// Gets a short label for the finding.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PermissionRisk { .. } => "Risky permission",
            Self::ExportedComponent { .. } => "Exported component",
            Self::DebuggableFlag { .. } => "Manifest debug",
            Self::HardcodedString { .. } => "Hardcoded string",
        }
    }

    /// Gets a human readable description of the finding.
    pub fn description(&self) -> String {
        match self {
            Self::PermissionRisk {
                permission,
                description,
            } => format!("{}: {}", permission, description),
            Self::ExportedComponent { raw_match } => format!(
                "Exported component found ({}). It can be used by other applications.",
                raw_match
            ),
            Self::DebuggableFlag { line } => {
                let description = "The application is in debug mode. This allows any malicious \
                                   person to inject arbitrary code in the application. This \
                                   option should only be used while in development.";
                match line {
                    Some(line) => format!("{} (manifest line {})", description, line),
                    None => description.to_owned(),
                }
            }
            Self::HardcodedString {
                value,
                matched_keyword,
            } => format!("`{}` (contains keyword '{}')", value, matched_keyword),
        }
    }
}

/// Runs every heuristic over the artifacts.
///
/// Findings are ordered by heuristic: risky permissions, the debuggable flag, exported
/// components and finally hardcoded strings.
pub fn static_analysis(artifacts: &PackageArtifacts) -> Vec<Finding> {
    let mut findings = detect_permission_risks(&artifacts.permissions);

    let manifest = detect_manifest_issues(&artifacts.manifest_xml);
    if manifest.debuggable {
        findings.push(Finding::DebuggableFlag {
            line: manifest.debuggable_line,
        });
    }
    findings.extend(
        manifest
            .exported_components
            .into_iter()
            .map(|raw_match| Finding::ExportedComponent { raw_match }),
    );

    findings.extend(detect_hardcoded_strings(&artifacts.string_constants));
    findings
}
