//! Offline corpus maintenance: rewrite CSV files in ascending date order.
//!
//! Unlike the loader, the sorter does not look for a `date` header: the first
//! column is taken to be the date. All columns are preserved as text, rows with
//! unparseable dates are dropped, and the file is rewritten as UTF-8.

use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use super::corpus::{CsvCorpus, SetupError};
use super::decode::decode;
use super::schema::parse_timestamp;

#[derive(Debug, Error)]
pub enum SortError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not valid UTF-8 or GBK text")]
    Undecodable,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOutcome {
    Sorted { rows: usize, dropped: usize },
    SkippedEmpty,
}

/// Totals for a directory pass.
#[derive(Debug, Default)]
pub struct SortSummary {
    pub sorted: usize,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Sort one file in place.
pub fn sort_file(path: &Path) -> Result<SortOutcome, SortError> {
    let bytes = std::fs::read(path)?;
    let (text, _) = decode(&bytes).ok_or(SortError::Undecodable)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut keyed = Vec::new();
    let mut dropped = 0;
    for record in reader.records() {
        let record = record?;
        match record.get(0).and_then(parse_timestamp) {
            Some(ts) => keyed.push((ts, record)),
            None => dropped += 1,
        }
    }

    if keyed.is_empty() && dropped == 0 {
        return Ok(SortOutcome::SkippedEmpty);
    }
    if dropped > 0 {
        warn!(
            file = %path.display(),
            dropped,
            "dropping rows with unparseable dates"
        );
    }

    keyed.sort_by_key(|(ts, _)| *ts);

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(&headers)?;
    for (_, record) in &keyed {
        writer.write_record(record)?;
    }
    let out = writer.into_inner().map_err(|e| e.into_error())?;
    std::fs::write(path, out)?;

    Ok(SortOutcome::Sorted {
        rows: keyed.len(),
        dropped,
    })
}

/// Sort every CSV file of a data directory. Per-file failures are collected,
/// not propagated.
pub fn sort_directory(dir: &Path) -> Result<SortSummary, SetupError> {
    let corpus = CsvCorpus::open(dir)?;
    let mut summary = SortSummary::default();

    for file in corpus.files() {
        match sort_file(&file.path) {
            Ok(SortOutcome::Sorted { .. }) => {
                summary.sorted += 1;
                if summary.sorted % 100 == 0 {
                    info!(sorted = summary.sorted, "sorting corpus");
                }
            }
            Ok(SortOutcome::SkippedEmpty) => {
                info!(ticker = %file.ticker, "skipping empty file");
                summary.skipped.push(file.ticker.clone());
            }
            Err(e) => {
                warn!(ticker = %file.ticker, error = %e, "failed to sort file");
                summary.failed.push((file.ticker.clone(), e.to_string()));
            }
        }
    }

    info!(
        sorted = summary.sorted,
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "corpus sort complete"
    );
    Ok(summary)
}
