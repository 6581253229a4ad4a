//! Bulk incident creation from CSV input.
//!
//! Rows are validated independently. Valid rows are committed together with
//! a single [`IncidentStore::create_many`] call; invalid rows are reported
//! back by their 1-based data-row number and never abort the batch. Only
//! input that cannot be parsed as CSV at all aborts the whole operation.

mod columns;
mod upload;

pub use columns::{ColumnMap, Field, COLUMN_FIELDS};
pub use upload::ScopedUpload;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entity::IncidentDraft;
use crate::error::{IncidentError, Result};
use crate::storage::IncidentStore;
use crate::validation::NewIncident;

/// A rejected row and every reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRow {
    pub row: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub total_rows: usize,
    pub created: usize,
    pub skipped: usize,
    pub invalid_rows: Vec<InvalidRow>,
}

/// One data row after header mapping.
#[derive(Debug, Clone)]
pub enum ParsedRow {
    Draft(IncidentDraft),
    Missing(Vec<&'static str>),
}

/// Line on which a quoted field opens and never closes, if any.
///
/// Follows the reader's quoting rules: a quote only opens a field at the
/// very start of that field, and `""` inside a quoted field is an escape.
fn unclosed_quote_line(input: &[u8]) -> Option<usize> {
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }

    let mut state = State::FieldStart;
    let mut line = 1;
    let mut opened_on = line;

    for &byte in input {
        state = match (state, byte) {
            (State::FieldStart, b'"') => {
                opened_on = line;
                State::Quoted
            }
            (State::Quoted, b'"') => State::QuoteInQuoted,
            (State::Quoted, _) => State::Quoted,
            (State::QuoteInQuoted, b'"') => State::Quoted,
            (_, b',' | b'\n' | b'\r') => State::FieldStart,
            _ => State::Unquoted,
        };
        if byte == b'\n' {
            line += 1;
        }
    }

    matches!(state, State::Quoted).then_some(opened_on)
}

/// Parse CSV bytes into mapped rows.
///
/// Values are trimmed and short rows are tolerated (their absent cells count
/// as missing fields). Undecodable input and a quote left open at the end of
/// input fail with `MalformedInput`.
pub fn parse_rows(input: &[u8]) -> Result<Vec<ParsedRow>> {
    if let Some(line) = unclosed_quote_line(input) {
        return Err(IncidentError::MalformedInput(format!(
            "Quote not closed: quoted field opened on line {} runs to end of input",
            line
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let map = ColumnMap::from_headers(reader.headers()?);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let missing = map.missing_required(&record);
        if missing.is_empty() {
            rows.push(ParsedRow::Draft(map.project(&record)));
        } else {
            rows.push(ParsedRow::Missing(missing));
        }
    }
    Ok(rows)
}

/// Split rows into commit candidates and rejected rows, keeping row order.
pub fn evaluate_rows(rows: Vec<ParsedRow>) -> (Vec<NewIncident>, Vec<InvalidRow>) {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for (idx, row) in rows.into_iter().enumerate() {
        let row_number = idx + 1;
        let outcome = match row {
            ParsedRow::Missing(fields) => Err(vec![format!(
                "Missing required fields: {}",
                fields.join(", ")
            )]),
            ParsedRow::Draft(draft) => NewIncident::from_draft(draft),
        };

        match outcome {
            Ok(new) => valid.push(new),
            Err(errors) => invalid.push(InvalidRow {
                row: row_number,
                errors,
            }),
        }
    }

    (valid, invalid)
}

/// Parse, validate and commit CSV bytes.
pub async fn ingest_bytes(store: &IncidentStore, input: &[u8]) -> Result<IngestReport> {
    let rows = parse_rows(input)?;
    let total_rows = rows.len();

    let (valid, invalid_rows) = evaluate_rows(rows);
    let created = store.create_many(valid).await?;

    let report = IngestReport {
        total_rows,
        created: created.len(),
        skipped: invalid_rows.len(),
        invalid_rows,
    };
    info!(
        total = report.total_rows,
        created = report.created,
        skipped = report.skipped,
        "bulk ingestion finished"
    );
    Ok(report)
}

/// Ingest a CSV file the caller owns. The file is left in place.
pub async fn ingest_file(store: &IncidentStore, path: &Path) -> Result<IngestReport> {
    let input = tokio::fs::read(path)
        .await
        .map_err(|e| IncidentError::storage(path, format!("cannot read CSV input: {}", e)))?;
    ingest_bytes(store, &input).await
}

/// Ingest an uploaded file and delete it afterwards, whatever the outcome.
pub async fn ingest_upload(store: &IncidentStore, upload: ScopedUpload) -> Result<IngestReport> {
    let result = ingest_file(store, upload.path()).await;
    upload.release();
    result
}
