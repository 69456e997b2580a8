//! InstrumentTable — one corpus file parsed, normalized and date-sorted.

use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;
use thiserror::Error;

use super::decode::{decode, TextEncoding};
use super::schema::{parse_timestamp, ColumnMap};
use crate::domain::NumericField;

/// Why a file was skipped for this attempt.
///
/// Every variant is recoverable: the sampler moves on to another file.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("not valid UTF-8 or GBK text")]
    Undecodable,

    #[error("malformed CSV: {0}")]
    Csv(String),

    #[error("no 'date' column")]
    MissingDateColumn,

    #[error("no row has a parseable date")]
    NoParsableDates,

    #[error("no rows dated after {threshold}")]
    NothingAfterThreshold { threshold: NaiveDate },

    #[error("only {rows} rows, fewer than the {min_forward} forward rows required")]
    TooShort { rows: usize, min_forward: usize },

    #[error("no valid start position in {rows} rows (earliest {min_idx}, latest {max_idx})")]
    EmptyRange {
        rows: usize,
        min_idx: usize,
        max_idx: usize,
    },
}

impl Rejection {
    /// True for files that could not be read as a table at all, as opposed to
    /// tables that merely miss the date/length constraints.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Rejection::Io(_)
                | Rejection::Undecodable
                | Rejection::Csv(_)
                | Rejection::MissingDateColumn
                | Rejection::NoParsableDates
        )
    }
}

/// One parsed row: its timestamp and the raw numeric cells.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentRow {
    pub timestamp: NaiveDateTime,
    pub cells: [Option<String>; NumericField::COUNT],
}

/// Rows of one instrument, sorted ascending by timestamp.
#[derive(Debug, Clone)]
pub struct InstrumentTable {
    ticker: String,
    encoding: TextEncoding,
    rows: Vec<InstrumentRow>,
    missing_fields: Vec<NumericField>,
    dropped_rows: usize,
}

impl InstrumentTable {
    /// Build a table from already-parsed rows. Rows are stable-sorted by timestamp.
    pub fn from_rows(ticker: impl Into<String>, mut rows: Vec<InstrumentRow>) -> Self {
        rows.sort_by_key(|r| r.timestamp);
        Self {
            ticker: ticker.into(),
            encoding: TextEncoding::Utf8,
            rows,
            missing_fields: Vec::new(),
            dropped_rows: 0,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn rows(&self) -> &[InstrumentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Numeric columns absent from the source file.
    pub fn missing_fields(&self) -> &[NumericField] {
        &self.missing_fields
    }

    /// Rows discarded because their date did not parse.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Index of the first row strictly after `threshold`.
    pub fn first_index_after(&self, threshold: NaiveDateTime) -> Option<usize> {
        let idx = self.rows.partition_point(|r| r.timestamp <= threshold);
        (idx < self.rows.len()).then_some(idx)
    }
}

/// Parse raw file bytes into a table.
pub fn parse_table(ticker: &str, bytes: &[u8]) -> Result<InstrumentTable, Rejection> {
    let (text, encoding) = decode(bytes).ok_or(Rejection::Undecodable)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Rejection::Csv(e.to_string()))?
        .clone();
    let columns = ColumnMap::resolve(&headers).ok_or(Rejection::MissingDateColumn)?;

    let mut rows = Vec::new();
    let mut dropped_rows = 0;
    for record in reader.records() {
        let record = record.map_err(|e| Rejection::Csv(e.to_string()))?;
        // Short rows are padded with missing cells; long rows cannot be aligned.
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(Rejection::Csv(format!(
                "line {line}: expected {} fields, saw {}",
                headers.len(),
                record.len()
            )));
        }
        let Some(timestamp) = record.get(columns.date()).and_then(parse_timestamp) else {
            dropped_rows += 1;
            continue;
        };
        rows.push(InstrumentRow {
            timestamp,
            cells: columns.extract(&record),
        });
    }

    if rows.is_empty() {
        return Err(Rejection::NoParsableDates);
    }

    let mut table = InstrumentTable::from_rows(ticker, rows);
    table.encoding = encoding;
    table.missing_fields = columns.missing_fields();
    table.dropped_rows = dropped_rows;
    Ok(table)
}

/// Read and parse one file.
pub fn load_table(ticker: &str, path: &Path) -> Result<InstrumentTable, Rejection> {
    let bytes = std::fs::read(path)?;
    parse_table(ticker, &bytes)
}
