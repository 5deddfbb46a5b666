//! Result reporting: terminal tables, counter summaries, CSV export.
//!
//! The table is always printed, even with zero result rows. An export
//! failure is a warning, never a run failure — the audit already happened
//! and its summary still stands.

use serde::Serialize;
use std::path::Path;

use crate::console;
use crate::models::{GroupFinding, MfaFinding, RunCounters};

/// Widest a table cell may render.
const MAX_CELL_WIDTH: usize = 48;

/// Truncate a string for table display, handling Unicode safely.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Render rows as a fixed-width text table.
///
/// Column widths fit the widest cell (capped at [`MAX_CELL_WIDTH`]); an
/// empty row set still renders the header and a row count.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| truncate(c, MAX_CELL_WIDTH)).collect())
        .collect();

    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let render_line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    out.push_str(&render_line(
        headers.iter().map(|h| h.to_string()).collect(),
    ));
    out.push('\n');
    out.push_str(&render_line(
        widths.iter().map(|w| "-".repeat(*w)).collect(),
    ));
    out.push('\n');

    for row in &rows {
        out.push_str(&render_line(row.clone()));
        out.push('\n');
    }

    out.push_str(&format!("({} rows)\n", rows.len()));
    out
}

/// Table for the group audit.
pub fn group_findings_table(findings: &[GroupFinding]) -> String {
    let rows: Vec<Vec<String>> = findings
        .iter()
        .map(|f| {
            vec![
                f.user_principal_name.clone(),
                f.user_id.clone(),
                f.group_name.clone(),
                f.group_id.clone(),
                f.account_enabled.to_string(),
            ]
        })
        .collect();
    render_table(
        &["UserPrincipalName", "UserId", "GroupName", "GroupId", "Enabled"],
        &rows,
    )
}

/// Table for the MFA audit.
pub fn mfa_findings_table(findings: &[MfaFinding]) -> String {
    let rows: Vec<Vec<String>> = findings
        .iter()
        .map(|f| {
            vec![
                f.user_principal_name.clone(),
                f.display_name.clone(),
                f.methods_joined(),
            ]
        })
        .collect();
    render_table(&["UserPrincipalName", "DisplayName", "Methods"], &rows)
}

/// Final counter summary, always printed.
pub fn print_summary(counters: &RunCounters) {
    eprintln!(
        "\n📊 Summary: {} processed, {} errors, {} results",
        counters.processed, counters.errored, counters.results
    );
}

/// Serialize result rows to a CSV file.
pub fn export_csv<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Export result rows, downgrading any failure to a warning.
pub fn export_or_warn<T: Serialize>(path: &Path, rows: &[T]) {
    match export_csv(path, rows) {
        Ok(()) => console::success(format!("💾 Exported {} rows to {}", rows.len(), path.display())),
        Err(e) => console::warning(format!("Export to {} failed: {}", path.display(), e)),
    }
}
