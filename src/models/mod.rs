//! Domain models for the dirsweep reconciliation pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`DirectoryUser`] - resolved user principal with enabled flag
//! - [`MembershipRef`] - one entry of a principal's `memberOf` collection
//! - [`AuthMethod`] - one registered authentication method
//! - [`DirectoryDevice`] - device object resolved by display name
//! - [`GroupFinding`] / [`MfaFinding`] - result rows emitted by the audits
//! - [`RunCounters`] - per-run processed/errored/results accumulators

use serde::{Deserialize, Serialize};

/// Graph-style type tag carried by directory objects in mixed collections.
pub const GROUP_ODATA_TYPE: &str = "#microsoft.graph.group";

/// Prefix stripped from `@odata.type` values before mapping to a label.
const ODATA_TYPE_PREFIX: &str = "#microsoft.graph.";

// =============================================================================
// Directory objects (wire format)
// =============================================================================

/// A resolved user principal.
///
/// Fetched fresh per roster row, never cached across rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    /// Opaque directory object id.
    pub id: String,
    /// UPN used to resolve the user.
    pub user_principal_name: String,
    /// Display name, absent on some service principals.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Whether the account is enabled for sign-in.
    #[serde(default)]
    pub account_enabled: Option<bool>,
}

impl DirectoryUser {
    /// Enabled flag with the directory's default (missing means enabled).
    pub fn is_enabled(&self) -> bool {
        self.account_enabled.unwrap_or(true)
    }
}

/// One entry of a principal's membership collection.
///
/// `memberOf` returns heterogeneous directory objects; `odata_type` tags the
/// concrete kind (group, directory role, administrative unit).
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipRef {
    pub id: String,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "@odata.type", default)]
    pub odata_type: String,
}

impl MembershipRef {
    /// Whether this membership entry is a group.
    pub fn is_group(&self) -> bool {
        self.odata_type == GROUP_ODATA_TYPE
    }
}

/// One registered authentication method. The `@odata.type` value is the
/// method type code mapped to a label by [`method_label`].
#[derive(Debug, Clone, Deserialize)]
pub struct AuthMethod {
    pub id: String,
    #[serde(rename = "@odata.type", default)]
    pub odata_type: String,
}

/// A device object resolved by exact display-name match.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryDevice {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub account_enabled: Option<bool>,
}

// =============================================================================
// Method type code mapping
// =============================================================================

/// Map an authentication method type code to a human-readable label.
///
/// Total function: every code yields a label. Known codes (with or without
/// the `#microsoft.graph.` prefix) map to their display name; anything else
/// passes through as the raw code string so new method types degrade
/// gracefully instead of dropping rows.
pub fn method_label(code: &str) -> String {
    let short = code.strip_prefix(ODATA_TYPE_PREFIX).unwrap_or(code);
    match short {
        "passwordAuthenticationMethod" => "Password".to_string(),
        "microsoftAuthenticatorAuthenticationMethod" => "Microsoft Authenticator".to_string(),
        "phoneAuthenticationMethod" => "Phone".to_string(),
        "fido2AuthenticationMethod" => "FIDO2 Security Key".to_string(),
        "windowsHelloForBusinessAuthenticationMethod" => "Windows Hello for Business".to_string(),
        "emailAuthenticationMethod" => "Email".to_string(),
        "temporaryAccessPassAuthenticationMethod" => "Temporary Access Pass".to_string(),
        "softwareOathAuthenticationMethod" => "Software OATH Token".to_string(),
        "certificateBasedAuthMethod" => "Certificate".to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// Result rows
// =============================================================================

/// Result row of the group audit: a disabled account still present in a
/// matching group. Zero or many per roster row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFinding {
    pub user_principal_name: String,
    pub user_id: String,
    pub group_name: String,
    pub group_id: String,
    pub account_enabled: bool,
}

/// Result row of the MFA audit: one per resolved user, with the ordered
/// list of method labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaFinding {
    pub user_principal_name: String,
    pub display_name: String,
    /// Labels in registration order, comma-joined on output.
    #[serde(serialize_with = "join_methods")]
    pub methods: Vec<String>,
}

fn join_methods<S: serde::Serializer>(methods: &[String], ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(&methods.join(", "))
}

impl MfaFinding {
    /// Comma-joined method labels, as rendered in tables and exports.
    pub fn methods_joined(&self) -> String {
        self.methods.join(", ")
    }
}

// =============================================================================
// Run counters
// =============================================================================

/// Process-wide accumulators for one batch run.
///
/// Mutated once per roster row per counter: `processed` always, `errored` on
/// any row-local failure, `results` once per emitted result row (so it can
/// exceed `processed`). Read only at the end for the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub processed: usize,
    pub errored: usize,
    pub results: usize,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one roster row as processed.
    pub fn row_processed(&mut self) {
        self.processed += 1;
    }

    /// Mark the current row as failed.
    pub fn row_errored(&mut self) {
        self.errored += 1;
    }

    /// Mark one emitted result row.
    pub fn result_emitted(&mut self) {
        self.results += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_label_known_codes() {
        assert_eq!(method_label("passwordAuthenticationMethod"), "Password");
        assert_eq!(
            method_label("#microsoft.graph.fido2AuthenticationMethod"),
            "FIDO2 Security Key"
        );
        assert_eq!(
            method_label("microsoftAuthenticatorAuthenticationMethod"),
            "Microsoft Authenticator"
        );
    }

    #[test]
    fn test_method_label_unknown_passes_through() {
        assert_eq!(method_label("unknownFutureMethod"), "unknownFutureMethod");
        assert_eq!(
            method_label("#microsoft.graph.someNewMethod"),
            "someNewMethod"
        );
    }

    #[test]
    fn test_membership_group_tag() {
        let group = MembershipRef {
            id: "g1".into(),
            display_name: Some("W365-Users".into()),
            odata_type: GROUP_ODATA_TYPE.into(),
        };
        let role = MembershipRef {
            id: "r1".into(),
            display_name: Some("Global Reader".into()),
            odata_type: "#microsoft.graph.directoryRole".into(),
        };
        assert!(group.is_group());
        assert!(!role.is_group());
    }

    #[test]
    fn test_user_enabled_default() {
        let user: DirectoryUser = serde_json::from_str(
            r#"{"id": "u1", "userPrincipalName": "a@contoso.com"}"#,
        )
        .unwrap();
        assert!(user.is_enabled());
    }

    #[test]
    fn test_user_wire_format() {
        let user: DirectoryUser = serde_json::from_str(
            r#"{
                "id": "u1",
                "userPrincipalName": "a@contoso.com",
                "displayName": "Alice",
                "accountEnabled": false
            }"#,
        )
        .unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
        assert!(!user.is_enabled());
    }

    #[test]
    fn test_auth_method_wire_format() {
        let method: AuthMethod = serde_json::from_str(
            r##"{"@odata.type": "#microsoft.graph.passwordAuthenticationMethod", "id": "m1"}"##,
        )
        .unwrap();
        assert_eq!(method_label(&method.odata_type), "Password");
    }

    #[test]
    fn test_mfa_finding_joined() {
        let finding = MfaFinding {
            user_principal_name: "a@contoso.com".into(),
            display_name: "Alice".into(),
            methods: vec!["Password".into(), "unknownFutureMethod".into()],
        };
        assert_eq!(finding.methods_joined(), "Password, unknownFutureMethod");
    }

    #[test]
    fn test_counters_results_can_exceed_processed() {
        let mut counters = RunCounters::new();
        counters.row_processed();
        counters.result_emitted();
        counters.result_emitted();
        assert_eq!(counters.processed, 1);
        assert_eq!(counters.results, 2);
    }
}
