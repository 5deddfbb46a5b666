//! Error types for the dirsweep reconciliation pipeline.
//!
//! This module defines a hierarchy of error types following best practices:
//!
//! - [`RosterError`] - input roster (CSV) failures, always fatal
//! - [`GraphError`] - remote directory API failures, row-local by policy
//! - [`AuditError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! [`GraphError`] is deliberately richer than the batch loop needs: the loop
//! treats every remote failure identically (count, warn, continue), but the
//! tags leave room for differentiated handling later without changing the
//! row-local contract.

use thiserror::Error;

// =============================================================================
// Roster (input CSV) Errors
// =============================================================================

/// Errors while loading the input roster. Any of these aborts the run:
/// without a readable roster there is nothing to process.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Failed to read file.
    #[error("Failed to read roster: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode file content.
    #[error("Failed to decode roster content: {0}")]
    EncodingError(String),

    /// Invalid CSV structure.
    #[error("Invalid roster format: {0}")]
    ParseError(String),

    /// Empty file.
    #[error("Roster file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No header row found in roster")]
    NoHeaders,

    /// The configured identity column does not exist in the header row.
    #[error("Roster has no '{0}' column (headers: {1})")]
    MissingColumn(String, String),
}

// =============================================================================
// Directory API Errors
// =============================================================================

/// Errors from the remote directory API.
///
/// The batch loop folds every variant into the same per-row outcome; the
/// tags exist so callers *could* distinguish "does not exist" from a
/// transient fault without a contract change.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Credentials missing or token acquisition failed. Fatal at setup.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The requested object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller lacks permission for the request.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The remote throttled the request.
    #[error("Request throttled by the directory service")]
    Throttled,

    /// Network fault or a 5xx from the remote.
    #[error("Transient remote error: {0}")]
    Transient(String),

    /// Response body could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Any other error the remote reported.
    #[error("Directory API error {code}: {message}")]
    Api { code: String, message: String },
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GraphError::Malformed(err.to_string())
        } else {
            GraphError::Transient(err.to_string())
        }
    }
}

// =============================================================================
// Audit Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
///
/// Only setup-phase failures surface here; row-local failures are absorbed
/// into [`crate::models::RunCounters`] and never abort the batch.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Roster loading error.
    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    /// Directory API error during setup (authentication).
    #[error("Directory error: {0}")]
    Graph(#[from] GraphError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for roster operations.
pub type RosterResult<T> = Result<T, RosterError>;

/// Result type for directory API operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type for audit runs.
pub type AuditResult<T> = Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // RosterError -> AuditError
        let roster_err = RosterError::EmptyFile;
        let audit_err: AuditError = roster_err.into();
        assert!(audit_err.to_string().contains("empty"));

        // GraphError -> AuditError
        let graph_err = GraphError::NotFound("user 'x'".into());
        let audit_err: AuditError = graph_err.into();
        assert!(audit_err.to_string().contains("user 'x'"));
    }

    #[test]
    fn test_missing_column_format() {
        let err = RosterError::MissingColumn(
            "UserPrincipalName".into(),
            "Name, Email".into(),
        );
        let msg = err.to_string();
        assert!(msg.contains("UserPrincipalName"));
        assert!(msg.contains("Name, Email"));
    }

    #[test]
    fn test_api_error_format() {
        let err = GraphError::Api {
            code: "Request_ResourceNotFound".into(),
            message: "Resource does not exist".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Request_ResourceNotFound"));
        assert!(msg.contains("does not exist"));
    }
}
