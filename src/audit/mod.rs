//! The batch reconciliation core.
//!
//! Three audit variants share one shape: iterate the roster in file order,
//! resolve each row against the directory, fetch the related collection,
//! apply the variant's predicate, and aggregate result rows — with every
//! per-row failure counted and skipped, never aborting the batch.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐     ┌────────────┐
//! │   Roster    │────▶│   Resolver   │────▶│   Fetcher    │────▶│  Predicate │
//! │  (CSV rows) │     │ (user/device)│     │ (all pages)  │     │ + Aggregate│
//! └─────────────┘     └──────────────┘     └──────────────┘     └────────────┘
//! ```
//!
//! Processing is strictly sequential: one row is fully resolved, fetched,
//! filtered, and aggregated before the next begins.

pub mod devices;
pub mod groups;
pub mod mfa;

use crate::console;
use crate::roster::RosterRow;

/// Progress is reported every this many rows, and on completion.
pub const PROGRESS_EVERY: usize = 50;

/// Fixed-cadence progress line, user feedback only.
pub(crate) fn progress_tick(processed: usize, total: usize) {
    if processed % PROGRESS_EVERY == 0 && processed < total {
        console::info(format!("... {}/{} rows processed", processed, total));
    }
}

/// Apply an optional row cap (smoke-testing against production tenants).
pub(crate) fn capped(rows: &[RosterRow], limit: Option<usize>) -> &[RosterRow] {
    match limit {
        Some(n) => &rows[..n.min(rows.len())],
        None => rows,
    }
}

// =============================================================================
// In-memory directory fake for the audit tests
// =============================================================================
