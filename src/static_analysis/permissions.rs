//! Risky permission detection.

use super::Finding;
use std::collections::BTreeSet;

/// Permissions considered risky, with the reason, in reporting order.
pub static RISK_PERMISSIONS: &[(&str, &str)] = &[
    (
        "android.permission.CAMERA",
        "Allows access to camera hardware",
    ),
    ("android.permission.RECORD_AUDIO", "Allows recording audio"),
    ("android.permission.READ_SMS", "Allows reading SMS messages"),
    ("android.permission.SEND_SMS", "Allows sending SMS messages"),
    (
        "android.permission.SYSTEM_ALERT_WINDOW",
        "Allows overlaying on top of other apps",
    ),
    ("android.permission.READ_CONTACTS", "Access to user contacts"),
    ("android.permission.WRITE_CONTACTS", "Modify user contacts"),
    ("android.permission.READ_CALL_LOG", "Access call logs"),
    (
        "android.permission.PROCESS_OUTGOING_CALLS",
        "Monitor outgoing calls",
    ),
    ("android.permission.READ_PHONE_STATE", "Access phone state"),
];

/// Detects the declared permissions that are in the risk catalog.
///
/// Findings follow the catalog order, not the order of the input.
pub fn detect_permission_risks(permissions: &BTreeSet<String>) -> Vec<Finding> {
    RISK_PERMISSIONS
        .iter()
        .filter(|(name, _)| permissions.contains(*name))
        .map(|(name, description)| Finding::PermissionRisk {
            permission: (*name).to_owned(),
            description: (*description).to_owned(),
        })
        .collect()
}
