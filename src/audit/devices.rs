//! Device membership remediation: add roster devices to a target group.
//!
//! The predicate here is existence: a device found by exact display-name
//! match. Ambiguity policy: a display name matching more than one device is
//! a row-local error (warned with the match count, no write performed), as
//! is a name matching none. Only an unambiguous single match is added.
//!
//! The add is not idempotency-checked — re-adding an existing member is
//! whatever the remote makes of it, and a rejection is downgraded to a
//! warning like every other row-local failure.

use crate::console;
use crate::graph::Directory;
use crate::models::RunCounters;
use crate::roster::{identity_key, Roster};

use super::{capped, progress_tick};

/// Options for the device membership run.
#[derive(Debug, Clone)]
pub struct DeviceAddOptions {
    /// Roster column holding the device display name.
    pub column: String,
    /// Target group object id.
    pub group_id: String,
    /// Cap on processed rows.
    pub limit: Option<usize>,
}

impl DeviceAddOptions {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            column: "DeviceName".to_string(),
            group_id: group_id.into(),
            limit: None,
        }
    }
}

/// Aggregate of one device membership run.
#[derive(Debug, Clone)]
pub struct DeviceAddReport {
    /// Successful membership writes.
    pub added: usize,
    pub counters: RunCounters,
}

/// Run the device membership remediation over the roster.
pub async fn run<D: Directory>(
    directory: &D,
    roster: &Roster,
    options: &DeviceAddOptions,
) -> DeviceAddReport {
    let rows = capped(&roster.rows, options.limit);
    let mut added = 0usize;
    let mut counters = RunCounters::new();

    for row in rows {
        counters.row_processed();

        let Some(name) = identity_key(row, &options.column) else {
            counters.row_errored();
            console::warning(format!(
                "Row {}: empty '{}' value, skipped",
                counters.processed, options.column
            ));
            progress_tick(counters.processed, rows.len());
            continue;
        };

        match directory.devices_by_name(&name).await {
            Ok(devices) => match devices.as_slice() {
                [] => {
                    counters.row_errored();
                    console::warning(format!("{}: no matching device found", name));
                }
                [device] => {
                    match directory
                        .add_group_member(&options.group_id, &device.id)
                        .await
                    {
                        Ok(()) => {
                            added += 1;
                            counters.result_emitted();
                            console::info(format!("Added {} ({})", name, device.id));
                        }
                        Err(e) => {
                            counters.row_errored();
                            console::warning(format!("{}: add failed: {}", name, e));
                        }
                    }
                }
                many => {
                    counters.row_errored();
                    console::warning(format!(
                        "{}: ambiguous name, {} devices match; skipped",
                        name,
                        many.len()
                    ));
                }
            },
            Err(e) => {
                counters.row_errored();
                console::warning(format!("{}: device lookup failed: {}", name, e));
            }
        }

        progress_tick(counters.processed, rows.len());
    }

    console::success(format!(
        "Processed {} rows: {} added, {} errors",
        counters.processed, added, counters.errored
    ));

    DeviceAddReport { added, counters }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::testing::{device, roster_rows, FakeDirectory};

    fn roster_of(values: &[&str]) -> Roster {
        Roster {
            rows: roster_rows("DeviceName", values),
            headers: vec!["DeviceName".to_string()],
            encoding: "utf-8".to_string(),
            delimiter: ',',
        }
    }

    #[tokio::test]
    async fn test_single_match_is_added() {
        let directory =
            FakeDirectory::default().with_devices("PC-100", vec![device("d1", "PC-100")]);

        let roster = roster_of(&["PC-100"]);
        let report = run(&directory, &roster, &DeviceAddOptions::new("grp-1")).await;

        assert_eq!(report.added, 1);
        assert_eq!(report.counters.errored, 0);
        assert_eq!(
            *directory.added.lock().unwrap(),
            vec![("grp-1".to_string(), "d1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_no_match_warns_and_continues() {
        // "PC-100" is listed in the roster but the directory has no such device
        let directory = FakeDirectory::default();

        let roster = roster_of(&["PC-100"]);
        let report = run(&directory, &roster, &DeviceAddOptions::new("grp-1")).await;

        assert_eq!(report.added, 0);
        assert_eq!(report.counters.processed, 1);
        assert_eq!(report.counters.errored, 1);
        assert!(directory.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ambiguous_match_skips_write() {
        let directory = FakeDirectory::default().with_devices(
            "PC-100",
            vec![device("d1", "PC-100"), device("d2", "PC-100")],
        );

        let roster = roster_of(&["PC-100"]);
        let report = run(&directory, &roster, &DeviceAddOptions::new("grp-1")).await;

        assert_eq!(report.added, 0);
        assert_eq!(report.counters.errored, 1);
        assert!(directory.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_failure_is_row_local() {
        let mut directory = FakeDirectory::default()
            .with_devices("PC-100", vec![device("d1", "PC-100")])
            .with_devices("PC-200", vec![device("d2", "PC-200")]);
        directory.add_fails_for = vec!["d1".to_string()];

        let roster = roster_of(&["PC-100", "PC-200"]);
        let report = run(&directory, &roster, &DeviceAddOptions::new("grp-1")).await;

        assert_eq!(report.added, 1);
        assert_eq!(report.counters.processed, 2);
        assert_eq!(report.counters.errored, 1);
        assert_eq!(
            *directory.added.lock().unwrap(),
            vec![("grp-1".to_string(), "d2".to_string())]
        );
    }
}
