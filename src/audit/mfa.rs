//! MFA audit: registered authentication methods per user.
//!
//! No boolean filter here — every resolved user yields exactly one finding
//! carrying the labels of all registered methods, in registration order.
//! The code-to-label mapping is total: unrecognized method types appear
//! under their raw code rather than being dropped.

use crate::console;
use crate::graph::Directory;
use crate::models::{method_label, AuthMethod, MfaFinding, RunCounters};
use crate::roster::{identity_key, Roster};

use super::{capped, progress_tick};

/// Options for the MFA audit.
#[derive(Debug, Clone)]
pub struct MfaAuditOptions {
    /// Roster column holding the UPN.
    pub column: String,
    /// Cap on processed rows.
    pub limit: Option<usize>,
}

impl Default for MfaAuditOptions {
    fn default() -> Self {
        Self {
            column: "UserPrincipalName".to_string(),
            limit: None,
        }
    }
}

/// Aggregate of one MFA-audit run.
#[derive(Debug, Clone)]
pub struct MfaAuditReport {
    pub findings: Vec<MfaFinding>,
    pub counters: RunCounters,
}

/// Map every registered method to its label, preserving order.
pub fn method_labels(methods: &[AuthMethod]) -> Vec<String> {
    methods.iter().map(|m| method_label(&m.odata_type)).collect()
}

/// Run the MFA audit over the roster.
pub async fn run<D: Directory>(
    directory: &D,
    roster: &Roster,
    options: &MfaAuditOptions,
) -> MfaAuditReport {
    let rows = capped(&roster.rows, options.limit);
    let mut findings = Vec::new();
    let mut counters = RunCounters::new();

    for row in rows {
        counters.row_processed();

        let Some(upn) = identity_key(row, &options.column) else {
            counters.row_errored();
            console::warning(format!(
                "Row {}: empty '{}' value, skipped",
                counters.processed, options.column
            ));
            progress_tick(counters.processed, rows.len());
            continue;
        };

        match directory.user_by_upn(&upn).await {
            Ok(user) => match directory.auth_methods(&user.id).await {
                Ok(methods) => {
                    findings.push(MfaFinding {
                        user_principal_name: user.user_principal_name.clone(),
                        display_name: user
                            .display_name
                            .clone()
                            .unwrap_or_else(|| user.user_principal_name.clone()),
                        methods: method_labels(&methods),
                    });
                    counters.result_emitted();
                }
                Err(e) => {
                    counters.row_errored();
                    console::warning(format!("{}: method fetch failed: {}", upn, e));
                }
            },
            Err(e) => {
                counters.row_errored();
                console::warning(format!("{}: lookup failed: {}", upn, e));
            }
        }

        progress_tick(counters.processed, rows.len());
    }

    console::success(format!(
        "Processed {} rows: {} findings, {} errors",
        counters.processed, counters.results, counters.errored
    ));

    MfaAuditReport { findings, counters }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::testing::{roster_rows, user, FakeDirectory};

    fn method(id: &str, odata_type: &str) -> AuthMethod {
        AuthMethod {
            id: id.to_string(),
            odata_type: odata_type.to_string(),
        }
    }

    fn roster_of(values: &[&str]) -> Roster {
        Roster {
            rows: roster_rows("UserPrincipalName", values),
            headers: vec!["UserPrincipalName".to_string()],
            encoding: "utf-8".to_string(),
            delimiter: ',',
        }
    }

    #[tokio::test]
    async fn test_known_and_unknown_codes_both_labelled() {
        let directory = FakeDirectory::default()
            .with_user(user("a@contoso.com", "u1", true))
            .with_methods(
                "u1",
                vec![
                    method("m1", "#microsoft.graph.passwordAuthenticationMethod"),
                    method("m2", "#microsoft.graph.unknownFutureMethod"),
                ],
            );

        let roster = roster_of(&["a@contoso.com"]);
        let report = run(&directory, &roster, &MfaAuditOptions::default()).await;

        assert_eq!(report.findings.len(), 1);
        assert_eq!(
            report.findings[0].methods_joined(),
            "Password, unknownFutureMethod"
        );
        assert_eq!(report.counters.results, 1);
    }

    #[tokio::test]
    async fn test_user_without_methods_still_reported() {
        let directory =
            FakeDirectory::default().with_user(user("a@contoso.com", "u1", true));

        let roster = roster_of(&["a@contoso.com"]);
        let report = run(&directory, &roster, &MfaAuditOptions::default()).await;

        assert_eq!(report.findings.len(), 1);
        assert!(report.findings[0].methods.is_empty());
        assert_eq!(report.findings[0].methods_joined(), "");
    }

    #[tokio::test]
    async fn test_unresolved_user_counted_not_reported() {
        let directory =
            FakeDirectory::default().with_user(user("b@contoso.com", "u2", true));

        let roster = roster_of(&["missing@contoso.com", "b@contoso.com", ""]);
        let report = run(&directory, &roster, &MfaAuditOptions::default()).await;

        assert_eq!(report.counters.processed, 3);
        assert_eq!(report.counters.errored, 2);
        assert_eq!(report.counters.results, 1);
        assert_eq!(report.findings[0].user_principal_name, "b@contoso.com");
    }

    #[test]
    fn test_method_labels_order_preserved() {
        let labels = method_labels(&[
            method("m1", "#microsoft.graph.fido2AuthenticationMethod"),
            method("m2", "#microsoft.graph.passwordAuthenticationMethod"),
        ]);
        assert_eq!(labels, vec!["FIDO2 Security Key", "Password"]);
    }
}
