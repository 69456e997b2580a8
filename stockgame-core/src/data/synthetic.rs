//! Synthetic instruments and an in-memory table source.
//!
//! Used by tests and benchmarks to drive the sampler without touching the
//! filesystem. Synthetic prices are a seeded random walk from 10.0, so the
//! same `(ticker, seed)` always produces the same table.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::source::TableSource;
use super::table::{InstrumentRow, InstrumentTable, Rejection};
use crate::domain::NumericField;

/// Generate `rows` weekday rows starting at `start`.
///
/// Every numeric column is populated except those listed in `omit`.
pub fn synthetic_table(
    ticker: &str,
    start: NaiveDate,
    rows: usize,
    seed: u64,
    omit: &[NumericField],
) -> InstrumentTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(rows);
    let mut price = 10.0_f64;
    let mut current = start;

    while out.len() < rows {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let change: f64 = rng.gen_range(-0.05..0.05);
        let open = price;
        let close = price * (1.0 + change);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(100_000..5_000_000u64) as f64;

        let values = [
            open,
            close,
            high,
            low,
            change * 100.0,
            volume,
            rng.gen_range(0.1..5.0),
            rng.gen_range(5.0..40.0),
            rng.gen_range(0.5..6.0),
        ];
        let cells = std::array::from_fn(|i| {
            let field = NumericField::ALL[i];
            (!omit.contains(&field)).then(|| format!("{:.4}", values[i]))
        });

        out.push(InstrumentRow {
            timestamp: current.and_time(NaiveTime::MIN),
            cells,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    InstrumentTable::from_rows(ticker, out)
}

/// Fixed set of tables served from memory. Counts every `load` call.
#[derive(Debug, Default)]
pub struct MemorySource {
    tickers: Vec<String>,
    tables: Vec<Result<InstrumentTable, String>>,
    loads: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table that loads successfully.
    pub fn with_table(mut self, table: InstrumentTable) -> Self {
        self.tickers.push(table.ticker().to_string());
        self.tables.push(Ok(table));
        self
    }

    /// Add an entry whose every load fails with a CSV rejection.
    pub fn with_broken(mut self, ticker: &str, message: &str) -> Self {
        self.tickers.push(ticker.to_string());
        self.tables.push(Err(message.to_string()));
        self
    }

    /// Total `load` calls so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

impl TableSource for MemorySource {
    fn len(&self) -> usize {
        self.tables.len()
    }

    fn ticker(&self, index: usize) -> &str {
        &self.tickers[index]
    }

    fn load(&self, index: usize) -> Result<InstrumentTable, Rejection> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        match &self.tables[index] {
            Ok(table) => Ok(table.clone()),
            Err(message) => Err(Rejection::Csv(message.clone())),
        }
    }
}
