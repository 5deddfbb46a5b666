//! # Dirsweep - bulk directory audit and remediation from CSV rosters
//!
//! Dirsweep reconciles a CSV roster of identities (users or devices) against
//! a remote directory service, reporting or acting on mismatches.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Roster CSV  │────▶│  Directory  │────▶│   Audit     │────▶│   Report    │
//! │ (auto-enc)  │     │  (resolve + │     │ (predicate +│     │ (table/CSV/ │
//! │             │     │  paginate)  │     │  counters)  │     │  mutation)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Per-row failures are counted and skipped; only setup failures (missing
//! credentials, unreadable roster) abort a run.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dirsweep::{GraphClient, GraphCredentials, load_roster};
//! use dirsweep::audit::groups::{self, GroupAuditOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = GraphClient::connect(GraphCredentials::from_env().unwrap())
//!         .await
//!         .unwrap();
//!     let roster = load_roster("users.csv").unwrap();
//!     let report = groups::run(&client, &roster, &GroupAuditOptions::default()).await;
//!     println!("{} findings", report.findings.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (DirectoryUser, findings, RunCounters)
//! - [`roster`] - CSV roster loading with auto-detection
//! - [`graph`] - Directory API client (auth, pagination, mutation)
//! - [`audit`] - The batch reconciliation core (three variants)
//! - [`report`] - Terminal tables and CSV export
//! - [`console`] - Leveled status output

// Core modules
pub mod error;
pub mod models;

// Input
pub mod roster;

// Remote directory
pub mod graph;

// Reconciliation
pub mod audit;

// Output
pub mod console;
pub mod report;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AuditError,
    AuditResult,
    GraphError,
    GraphResult,
    RosterError,
    RosterResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    method_label,
    AuthMethod,
    DirectoryDevice,
    DirectoryUser,
    GroupFinding,
    MembershipRef,
    MfaFinding,
    RunCounters,
};

// =============================================================================
// Re-exports - Roster
// =============================================================================

pub use roster::{
    detect_delimiter,
    detect_encoding,
    identity_key,
    load_roster,
    parse_roster_bytes,
    Roster,
    RosterRow,
};

// =============================================================================
// Re-exports - Directory client
// =============================================================================

pub use graph::{Directory, GraphClient, GraphCredentials};

// =============================================================================
// Re-exports - Audits
// =============================================================================

pub use audit::devices::{DeviceAddOptions, DeviceAddReport};
pub use audit::groups::{GroupAuditOptions, GroupAuditReport};
pub use audit::mfa::{MfaAuditOptions, MfaAuditReport};
