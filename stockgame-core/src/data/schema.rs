//! Column normalization and date parsing for corpus CSVs.
//!
//! Headers are matched after trimming whitespace, stripping a BOM and
//! lowercasing. Only `date` is required; each of the numeric columns is
//! optional and resolves to no cell when absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;

use crate::domain::NumericField;

/// Normalized name of the one required column.
pub const DATE_COLUMN: &str = "date";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Normalize a raw header cell for matching.
pub fn normalize_header(name: &str) -> String {
    name.trim()
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
}

/// Parse a date cell in any of the layouts seen in the corpus.
///
/// Date-only values resolve to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(day) = NaiveDate::parse_from_str(s, fmt) {
            return Some(day.and_time(NaiveTime::MIN));
        }
    }
    if let Some(day) = parse_compact_date(s) {
        return Some(day.and_time(NaiveTime::MIN));
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|ts| ts.naive_local())
}

/// `YYYYMMDD`, handled by hand since `%Y` is greedy over digit runs.
fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = s[0..4].parse().ok()?;
    let month = s[4..6].parse().ok()?;
    let day = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Resolved positions of the date column and each numeric column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    date: usize,
    fields: [Option<usize>; NumericField::COUNT],
}

impl ColumnMap {
    /// Map headers to columns. `None` if there is no `date` column.
    ///
    /// When a name repeats, the first occurrence wins.
    pub fn resolve(headers: &StringRecord) -> Option<Self> {
        let mut date = None;
        let mut fields = [None; NumericField::COUNT];

        for (idx, raw) in headers.iter().enumerate() {
            let name = normalize_header(raw);
            if name == DATE_COLUMN {
                date.get_or_insert(idx);
            } else if let Some(field) = NumericField::from_column(&name) {
                fields[field.index()].get_or_insert(idx);
            }
        }

        date.map(|date| Self { date, fields })
    }

    pub fn date(&self) -> usize {
        self.date
    }

    pub fn field(&self, field: NumericField) -> Option<usize> {
        self.fields[field.index()]
    }

    /// Numeric fields with no source column (synthesized as zero).
    pub fn missing_fields(&self) -> Vec<NumericField> {
        NumericField::ALL
            .into_iter()
            .filter(|f| self.field(*f).is_none())
            .collect()
    }

    /// Pull the raw numeric cells out of one record.
    ///
    /// Short records yield `None` for the absent trailing cells.
    pub fn extract(&self, record: &StringRecord) -> [Option<String>; NumericField::COUNT] {
        std::array::from_fn(|i| {
            self.fields[i]
                .and_then(|col| record.get(col))
                .map(str::to_owned)
        })
    }
}
