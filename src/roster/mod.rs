//! Roster loading: CSV input with encoding and delimiter auto-detection.
//!
//! The roster is the bulk input list of identities to reconcile. Rosters
//! come from HR exports and admin consoles in assorted encodings and
//! delimiters, so both are detected before parsing. Loading failures are
//! fatal (without input there is nothing to process); an empty identity
//! value in a data row is a per-row concern handled by the audit loop.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{RosterError, RosterResult};

/// One roster row: column name to raw string value.
pub type RosterRow = HashMap<String, String>;

/// A loaded roster with parse metadata.
#[derive(Debug, Clone)]
pub struct Roster {
    /// Rows in file order.
    pub rows: Vec<RosterRow>,
    /// Column headers in file order.
    pub headers: Vec<String>,
    /// Detected encoding.
    pub encoding: String,
    /// Detected delimiter.
    pub delimiter: char,
}

impl Roster {
    /// Fail if the identity column is absent from the header row.
    pub fn require_column(&self, column: &str) -> RosterResult<()> {
        if self.headers.iter().any(|h| h == column) {
            Ok(())
        } else {
            Err(RosterError::MissingColumn(
                column.to_string(),
                self.headers.join(", "),
            ))
        }
    }
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the detected encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> RosterResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8_lossy(bytes).to_string()),
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string())
        }
        _ => {
            // Unrecognized charset: fall back to lossy UTF-8
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }
}

/// Detect the delimiter by counting occurrences in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Load a roster file with auto-detection of encoding and delimiter.
pub fn load_roster<P: AsRef<Path>>(path: P) -> RosterResult<Roster> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_roster_bytes(&bytes)
}

/// Parse roster bytes with auto-detection of encoding and delimiter.
pub fn parse_roster_bytes(bytes: &[u8]) -> RosterResult<Roster> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;

    if content.trim().is_empty() {
        return Err(RosterError::EmptyFile);
    }

    let delimiter = detect_delimiter(&content);
    parse_roster_str(&content, delimiter, encoding)
}

/// Parse roster content with an explicit delimiter.
///
/// Rows shorter than the header are padded with empty values; extra values
/// beyond the header are ignored. Blank lines are skipped.
pub fn parse_roster_str(
    content: &str,
    delimiter: char,
    encoding: String,
) -> RosterResult<Roster> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| RosterError::ParseError(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(RosterError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| RosterError::ParseError(e.to_string()))?;

        if record.iter().all(|v| v.is_empty()) {
            continue;
        }

        let mut row = RosterRow::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("");
            row.insert(header.clone(), value.to_string());
        }
        rows.push(row);
    }

    Ok(Roster {
        rows,
        headers,
        encoding,
        delimiter,
    })
}

/// Extract the identity key from a row.
///
/// Returns `None` for a missing or empty value; the audit loop counts that
/// as a row-local error and moves on.
pub fn identity_key(row: &RosterRow, column: &str) -> Option<String> {
    row.get(column)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
