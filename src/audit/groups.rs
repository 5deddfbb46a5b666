//! Group audit: disabled accounts still present in matching groups.
//!
//! For each roster row, resolve the UPN, drain the user's membership
//! collection, and emit one finding per group whose display name contains
//! the configured needle while the account is disabled. A disabled account
//! in two matching groups yields two findings; an enabled account yields
//! none.

use crate::console;
use crate::graph::Directory;
use crate::models::{DirectoryUser, GroupFinding, MembershipRef, RunCounters};
use crate::roster::{identity_key, Roster};

use super::{capped, progress_tick};

/// Options for the group audit.
#[derive(Debug, Clone)]
pub struct GroupAuditOptions {
    /// Roster column holding the UPN.
    pub column: String,
    /// Substring a group's display name must contain (case-insensitive).
    pub name_contains: String,
    /// Cap on processed rows.
    pub limit: Option<usize>,
}

impl Default for GroupAuditOptions {
    fn default() -> Self {
        Self {
            column: "UserPrincipalName".to_string(),
            name_contains: "w365".to_string(),
            limit: None,
        }
    }
}

/// Aggregate of one group-audit run.
#[derive(Debug, Clone)]
pub struct GroupAuditReport {
    /// Findings in processing order, duplicates allowed.
    pub findings: Vec<GroupFinding>,
    pub counters: RunCounters,
}

/// The variant's predicate: group tag AND name contains the needle AND
/// account disabled. Strict conjunction.
pub fn is_orphaned_membership(
    membership: &MembershipRef,
    user: &DirectoryUser,
    needle: &str,
) -> bool {
    let name_matches = membership
        .display_name
        .as_deref()
        .map(|name| name.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false);

    membership.is_group() && name_matches && !user.is_enabled()
}

/// Run the group audit over the roster.
pub async fn run<D: Directory>(
    directory: &D,
    roster: &Roster,
    options: &GroupAuditOptions,
) -> GroupAuditReport {
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
            Ok(user) => match directory.memberships(&user.id).await {
                Ok(memberships) => {
                    for membership in memberships
                        .iter()
                        .filter(|m| is_orphaned_membership(m, &user, &options.name_contains))
                    {
                        findings.push(GroupFinding {
                            user_principal_name: user.user_principal_name.clone(),
                            user_id: user.id.clone(),
                            group_name: membership.display_name.clone().unwrap_or_default(),
                            group_id: membership.id.clone(),
                            account_enabled: user.is_enabled(),
                        });
                        counters.result_emitted();
                    }
                }
                Err(e) => {
                    counters.row_errored();
                    console::warning(format!("{}: membership fetch failed: {}", upn, e));
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

    GroupAuditReport { findings, counters }
}
