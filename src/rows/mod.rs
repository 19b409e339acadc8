//! Recipient row extraction
//!
//! Turns an uploaded recipient file into an ordered sequence of flat
//! field-name → value records. The parsing strategy is selected by file
//! extension; everything downstream only sees [`RecipientRow`] values.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

mod table;

/// Field that identifies the recipient of a row
pub const NUMBER_FIELD: &str = "number";

/// Errors from recipient file extraction
#[derive(Debug, Error)]
pub enum RowError {
    #[error("Unsupported file extension '{extension}' (supported: csv, tsv)")]
    UnsupportedExtension { extension: String },

    #[error("Failed to read recipient file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse recipient file: {0}")]
    Parse(#[from] csv::Error),
}

/// One recipient record: a mapping from column header to cell value
///
/// The `number` field identifies the recipient; every other field is a
/// template variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientRow {
    fields: HashMap<String, String>,
}

impl RecipientRow {
    /// Build a row from field name/value pairs
    pub fn from_fields(fields: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Look up a field value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The recipient identifier, trimmed; `None` when absent or blank
    pub fn number(&self) -> Option<&str> {
        self.fields
            .get(NUMBER_FIELD)
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
    }

    /// Whether this row can be dispatched at all
    pub fn is_valid(&self) -> bool {
        self.number().is_some()
    }
}

/// The extracted contents of a recipient file
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    /// Column headers in file order
    pub headers: Vec<String>,
    /// Data rows in file order, including rows without a usable number
    pub rows: Vec<RecipientRow>,
}

impl RowSet {
    /// Total number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the file contained no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows with a non-empty trimmed `number` field
    pub fn valid_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_valid()).count()
    }

    /// Number of rows that will be skipped before dispatch
    pub fn skipped_count(&self) -> usize {
        self.len() - self.valid_count()
    }
}

/// Extract rows from a recipient file, dispatching on its extension
pub fn extract(path: &Path) -> Result<RowSet, RowError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    debug!(?path, %extension, "extract: called");

    let delimiter = match extension.as_str() {
        "csv" => b',',
        "tsv" => b'\t',
        _ => return Err(RowError::UnsupportedExtension { extension }),
    };

    table::read_delimited(path, delimiter)
}
