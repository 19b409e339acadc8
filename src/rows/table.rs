//! Delimited-text recipient files (CSV/TSV)

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use super::{RecipientRow, RowError, RowSet};

/// Read a delimited recipient file into a [`RowSet`]
///
/// The first record is the header row; each later record becomes one
/// [`RecipientRow`] keyed by header names. Short records leave trailing
/// fields absent; extra cells beyond the headers are dropped.
pub(super) fn read_delimited(path: &Path, delimiter: u8) -> Result<RowSet, RowError> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.clone(), cell.to_string()));
        rows.push(RecipientRow::from_fields(fields));
    }

    debug!(?path, headers = headers.len(), rows = rows.len(), "read_delimited: parsed");
    Ok(RowSet { headers, rows })
}
