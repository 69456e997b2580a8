//! Corpus diagnostics: which files could ever yield a game, and why not.

use serde::Serialize;

use crate::config::SamplerConfig;
use crate::data::{TableSource, TextEncoding};
use crate::sampler::eligible_range;

/// Eligibility of one file under a config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Eligible {
        rows: usize,
        min_idx: usize,
        max_idx: usize,
        /// Distinct game-start rows.
        starts: usize,
        encoding: TextEncoding,
        /// Rows discarded for an unparseable date.
        dropped_rows: usize,
        /// Numeric columns absent from the file (zero-filled).
        missing_columns: Vec<&'static str>,
    },
    Rejected {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub ticker: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_eligible(&self) -> bool {
        matches!(self.status, FileStatus::Eligible { .. })
    }
}

/// Load every file once and report its eligible range or rejection reason.
pub fn check_source<S>(source: &S, config: &SamplerConfig) -> Vec<FileReport>
where
    S: TableSource + ?Sized,
{
    (0..source.len())
        .map(|index| {
            let status = match source.load(index).and_then(|table| {
                eligible_range(&table, config).map(|range| (table, range))
            }) {
                Ok((table, range)) => FileStatus::Eligible {
                    rows: table.len(),
                    min_idx: range.min_idx,
                    max_idx: range.max_idx,
                    starts: range.candidates(),
                    encoding: table.encoding(),
                    dropped_rows: table.dropped_rows(),
                    missing_columns: table
                        .missing_fields()
                        .iter()
                        .map(|f| f.column_name())
                        .collect(),
                },
                Err(reason) => FileStatus::Rejected {
                    reason: reason.to_string(),
                },
            };
            FileReport {
                ticker: source.ticker(index).to_string(),
                status,
            }
        })
        .collect()
}
