//! Hardcoded string detection.

use super::Finding;

/// Lowercase keywords that make a string constant suspicious, in matching order.
pub static SUSPICIOUS_KEYWORDS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "apikey",
    "api_key",
    "token",
    "auth",
    "credential",
    "key",
    "username",
    "user",
    "login",
    "http://",
    "https://",
    "jwt",
    "bearer",
    "aws",
    "access",
    "private",
    "certificate",
];

/// Gets the first keyword, in catalog order, contained in the string.
pub fn matching_keyword(value: &str) -> Option<&'static str> {
    let lower = value.to_lowercase();
    SUSPICIOUS_KEYWORDS
        .iter()
        .find(|keyword| lower.contains(*keyword))
        .copied()
}

/// Detects string constants that look like hardcoded secrets or endpoints.
///
/// Each string produces at most one finding, tagged with the first matching keyword. The output
/// keeps the input order. Length filtering is done by the artifact producer, not here.
pub fn detect_hardcoded_strings(strings: &[String]) -> Vec<Finding> {
    strings
        .iter()
        .filter_map(|value| {
            matching_keyword(value).map(|keyword| Finding::HardcodedString {
                value: value.clone(),
                matched_keyword: keyword.to_owned(),
            })
        })
        .collect()
}
