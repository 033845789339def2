//! Package artifacts and analysis outcomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Minimum length for a string constant to be kept as a candidate.
pub const MIN_STRING_LENGTH: usize = 4;

/// Structural artifacts extracted from a package by the inspector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageArtifacts {
    /// Package identifier, e.g. `com.example.app`.
    pub package_id: String,
    /// Human readable version.
    pub version_name: String,
    /// Internal version number.
    pub version_code: u64,
    /// Serialized `AndroidManifest.xml`.
    pub manifest_xml: String,
    /// Declared permissions.
    pub permissions: BTreeSet<String>,
    /// String constants found in the code, deduplicated and sorted.
    #[serde(default)]
    pub string_constants: Vec<String>,
}

impl PackageArtifacts {
    /// Enforces the producer invariants on the string constants.
    ///
    /// Constants are trimmed, the ones shorter than [`MIN_STRING_LENGTH`] characters are dropped
    /// and the rest are deduplicated and sorted lexicographically.
    pub fn normalize(mut self) -> Self {
        let strings: BTreeSet<String> = self
            .string_constants
            .drain(..)
            .map(|s| s.trim().to_owned())
            .filter(|s| s.chars().count() >= MIN_STRING_LENGTH)
            .collect();
        self.string_constants = strings.into_iter().collect();
        self
    }

    /// Drops the string constants, as the lightweight path cannot extract them.
    pub fn into_partial(mut self) -> Self {
        self.string_constants.clear();
        self
    }
}

/// Result of a single analysis run.
///
/// Exactly one variant is produced per run. `Failed` is terminal and carries no artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Full inspection succeeded in time.
    Full(PackageArtifacts),
    /// The lightweight fallback produced partial artifacts.
    Degraded {
        /// Partial artifacts, without string constants.
        artifacts: PackageArtifacts,
        /// Reason for the downgrade.
        warning: String,
    },
    /// Both the full and the lightweight inspection failed.
    Failed {
        /// Human readable message, including the proximate cause.
        message: String,
    },
}

impl AnalysisOutcome {
    /// Gets the artifacts of the outcome, if any.
    pub fn artifacts(&self) -> Option<&PackageArtifacts> {
        match self {
            Self::Full(artifacts) | Self::Degraded { artifacts, .. } => Some(artifacts),
            Self::Failed { .. } => None,
        }
    }

    /// Gets the degradation warning, if any.
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Degraded { warning, .. } => Some(warning),
            _ => None,
        }
    }

    /// Checks if the outcome comes from a complete inspection.
    pub fn is_full(&self) -> bool {
        match self {
            Self::Full(_) => true,
            _ => false,
        }
    }

    /// Checks if the outcome is a failure.
    pub fn is_failed(&self) -> bool {
        match self {
            Self::Failed { .. } => true,
            _ => false,
        }
    }
}
