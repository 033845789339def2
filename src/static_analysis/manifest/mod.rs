//! Module containing the manifest analysis logic.
//!
//! The scan is textual: it looks for the attribute patterns in the serialized manifest instead
//! of querying its XML structure. It tolerates whitespace around `=`, single or double quotes
//! and any letter case, but it does not understand namespaces, comments or `CDATA` sections, so
//! an attribute inside a comment is still reported.

#[cfg(test)]
mod tests;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref EXPORTED: Regex =
        Regex::new(r#"(?i)android:exported\s*=\s*(?:"true"|'true')"#).unwrap();
    static ref DEBUGGABLE: Regex =
        Regex::new(r#"(?i)android:debuggable\s*=\s*(?:"true"|'true')"#).unwrap();
}

/// Security relevant flags found in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestIssues {
    /// Raw text of every `android:exported="true"` match, in document order.
    pub exported_components: Vec<String>,
    /// Whether `android:debuggable="true"` is present.
    pub debuggable: bool,
    /// Line of the first `android:debuggable="true"` attribute, starting at 1.
    pub debuggable_line: Option<usize>,
}

/// Scans the manifest text for exported components and the debuggable flag.
pub fn detect_manifest_issues(manifest_xml: &str) -> ManifestIssues {
    let debuggable_line = get_line(manifest_xml, &DEBUGGABLE).map(|index| index + 1);
    ManifestIssues {
        exported_components: EXPORTED
            .find_iter(manifest_xml)
            .map(|m| m.as_str().to_owned())
            .collect(),
        debuggable: debuggable_line.is_some(),
        debuggable_line,
    }
}

/// Gets the zero based line index of the first match of the pattern, if any.
fn get_line(code: &str, pattern: &Regex) -> Option<usize> {
    pattern
        .find(code)
        .map(|m| code[..m.start()].matches('\n').count())
}
