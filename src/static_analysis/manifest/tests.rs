//! Tests for the manifest.

use super::{detect_manifest_issues, get_line, ManifestIssues};
use regex::Regex;

#[test]
fn it_get_line() {
    let code = "<manifest>
        <application android:debuggable=\"true\">
            <activity android:name=\".Main\"/>
        </application>
    </manifest>";

    assert_eq!(get_line(code, &Regex::new("manifest").unwrap()), Some(0));
    assert_eq!(get_line(code, &Regex::new("activity").unwrap()), Some(2));
    assert_eq!(get_line(code, &Regex::new("non-matching").unwrap()), None);
}

#[test]
fn it_debuggable_line() {
    let manifest = "<manifest>
        <uses-permission android:name=\"android.permission.CAMERA\"/>
        <application android:debuggable=\"true\">
        </application>
    </manifest>";

    let issues = detect_manifest_issues(manifest);
    assert!(issues.debuggable);
    assert_eq!(issues.debuggable_line, Some(3));

    let issues = detect_manifest_issues("<application android:debuggable=\"false\"/>");
    assert!(!issues.debuggable);
    assert_eq!(issues.debuggable_line, None);
}

#[test]
fn it_exported_and_debuggable() {
    let manifest = "<application android:debuggable=\"true\">\
                    <activity android:exported=\"true\"/>\
                    <service android:exported=\"false\"/>\
                    <receiver android:exported=\"true\"/>\
                    </application>";

    let issues = detect_manifest_issues(manifest);
    assert!(issues.debuggable);
    assert_eq!(
        issues.exported_components,
        vec!["android:exported=\"true\"", "android:exported=\"true\""]
    );
}

#[test]
fn it_tolerates_case_and_whitespace() {
    let issues = detect_manifest_issues("<activity android:exported = \"TRUE\"/>");
    assert_eq!(issues.exported_components, vec!["android:exported = \"TRUE\""]);
    assert!(!issues.debuggable);

    let issues = detect_manifest_issues("<activity ANDROID:Exported\n=\t'true'/>");
    assert_eq!(issues.exported_components.len(), 1);

    let issues = detect_manifest_issues("<application android:debuggable= 'True'>");
    assert!(issues.debuggable);
}

#[test]
fn it_mismatched_quotes() {
    let issues = detect_manifest_issues("<activity android:exported=\"true'/>");
    assert!(issues.exported_components.is_empty());
}

#[test]
fn it_matches_inside_comments() {
    let issues = detect_manifest_issues("<!-- <activity android:exported=\"true\"/> -->");
    assert_eq!(issues.exported_components.len(), 1);
}

#[test]
fn it_empty_manifest() {
    assert_eq!(detect_manifest_issues(""), ManifestIssues::default());
    assert_eq!(
        detect_manifest_issues("not even <xml"),
        ManifestIssues::default()
    );
}
