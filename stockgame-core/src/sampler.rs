//! Constrained sampler — draws one (instrument, game-start) pair.
//!
//! Rejection sampling over files: each attempt draws a file uniformly with
//! replacement, computes the eligible start range, and either carves a window
//! or records why the file was skipped. Running out of attempts is the only
//! error a caller sees.

use chrono::NaiveDate;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SamplerConfig;
use crate::data::{InstrumentTable, Rejection, TableSource};
use crate::domain::{SampleWindow, StockBar};

/// Closed interval `[min_idx, max_idx]` of valid game-start rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibleRange {
    pub min_idx: usize,
    pub max_idx: usize,
}

impl EligibleRange {
    /// Number of distinct start rows.
    pub fn candidates(&self) -> usize {
        self.max_idx - self.min_idx + 1
    }

    pub fn contains(&self, idx: usize) -> bool {
        (self.min_idx..=self.max_idx).contains(&idx)
    }

    /// Uniform draw over the closed interval; both ends are valid starts.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.min_idx..=self.max_idx)
    }
}

/// Compute where a game may start in `table`, or why it cannot.
///
/// `min_idx` is the first row strictly after the threshold date, floored at
/// `min_lookback`; `max_idx` leaves exactly `min_forward` rows counting the
/// start row itself. The table is eligible only when `min_idx < max_idx`.
pub fn eligible_range(
    table: &InstrumentTable,
    config: &SamplerConfig,
) -> Result<EligibleRange, Rejection> {
    let floor = table.first_index_after(config.threshold()).ok_or(
        Rejection::NothingAfterThreshold {
            threshold: config.threshold_date,
        },
    )?;
    let min_idx = floor.max(config.min_lookback);

    let max_idx = table
        .len()
        .checked_sub(config.min_forward)
        .ok_or(Rejection::TooShort {
            rows: table.len(),
            min_forward: config.min_forward,
        })?;

    if min_idx >= max_idx {
        return Err(Rejection::EmptyRange {
            rows: table.len(),
            min_idx,
            max_idx,
        });
    }
    Ok(EligibleRange { min_idx, max_idx })
}

/// Slice `table` from `lookback_window` rows before `target_idx` to its end
/// and clean every row.
pub fn carve_window(
    table: &InstrumentTable,
    target_idx: usize,
    lookback_window: usize,
) -> SampleWindow {
    let slice_start = target_idx.saturating_sub(lookback_window);
    let data = table.rows()[slice_start..]
        .iter()
        .map(|row| StockBar::from_cells(row.timestamp.date(), &row.cells))
        .collect();
    SampleWindow::new(table.ticker().to_string(), data, target_idx - slice_start)
}

/// Outcome of one draw.
#[derive(Debug)]
enum Attempt {
    Sampled(SampleWindow),
    Rejected { ticker: String, reason: Rejection },
}

/// The only failures a sampling call surfaces.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("the corpus has no instruments to sample from")]
    EmptyCorpus,

    #[error(
        "no instrument satisfied the constraints after {attempts} attempts \
         (rows dated after {threshold}, at least {min_lookback} rows of history \
         and {min_forward} rows of forward data); the corpus is insufficient \
         for the configured constraints"
    )]
    Exhausted {
        attempts: usize,
        threshold: NaiveDate,
        min_lookback: usize,
        min_forward: usize,
    },
}

/// Draws game windows from a [`TableSource`] under a [`SamplerConfig`].
///
/// Holds only shared references; every call owns its table and RNG.
pub struct ConstrainedSampler<'a, S: ?Sized> {
    source: &'a S,
    config: &'a SamplerConfig,
}

impl<'a, S: TableSource + ?Sized> ConstrainedSampler<'a, S> {
    pub fn new(source: &'a S, config: &'a SamplerConfig) -> Self {
        Self { source, config }
    }

    /// Draw until a file yields a window or `max_attempts` files have been tried.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SampleWindow, SampleError> {
        if self.source.is_empty() {
            return Err(SampleError::EmptyCorpus);
        }

        for attempt in 1..=self.config.max_attempts {
            match self.attempt(rng) {
                Attempt::Sampled(window) => {
                    info!(
                        ticker = %window.ticker(),
                        start_date = %window.start_date(),
                        forward_rows = window.forward_len(),
                        attempt,
                        "selected instrument"
                    );
                    return Ok(window);
                }
                Attempt::Rejected { ticker, reason } if reason.is_structural() => {
                    warn!(%ticker, attempt, %reason, "skipping unusable file");
                }
                Attempt::Rejected { ticker, reason } => {
                    debug!(%ticker, attempt, %reason, "file does not meet constraints");
                }
            }
        }

        Err(SampleError::Exhausted {
            attempts: self.config.max_attempts,
            threshold: self.config.threshold_date,
            min_lookback: self.config.min_lookback,
            min_forward: self.config.min_forward,
        })
    }

    /// Choose a start row in an already-loaded table.
    pub fn sample_table<R: Rng + ?Sized>(
        &self,
        table: &InstrumentTable,
        rng: &mut R,
    ) -> Result<SampleWindow, Rejection> {
        let range = eligible_range(table, self.config)?;
        let target_idx = range.draw(rng);
        Ok(carve_window(table, target_idx, self.config.lookback_window))
    }

    /// One draw. The source must be non-empty.
    fn attempt<R: Rng + ?Sized>(&self, rng: &mut R) -> Attempt {
        let index = rng.gen_range(0..self.source.len());
        let outcome = self
            .source
            .load(index)
            .and_then(|table| self.sample_table(&table, rng));

        match outcome {
            Ok(window) => Attempt::Sampled(window),
            Err(reason) => Attempt::Rejected {
                ticker: self.source.ticker(index).to_string(),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{synthetic_table, InstrumentRow, MemorySource};
    use crate::domain::NumericField;
    use chrono::NaiveTime;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// `rows` rows spaced `step_days` apart from `start`, every cell "1.0".
    fn spaced_table(
        ticker: &str,
        start: NaiveDate,
        rows: usize,
        step_days: i64,
    ) -> InstrumentTable {
        let rows = (0..rows)
            .map(|i| InstrumentRow {
                timestamp: (start + chrono::Duration::days(i as i64 * step_days))
                    .and_time(NaiveTime::MIN),
                cells: std::array::from_fn(|_| Some("1.0".to_string())),
            })
            .collect();
        InstrumentTable::from_rows(ticker, rows)
    }

    #[test]
    fn thousand_rows_spanning_2010_to_2023_is_eligible() {
        let table = spaced_table("LONG", date(2010, 1, 1), 1000, 5);
        assert!(table.rows().last().unwrap().timestamp.date() > date(2023, 1, 1));

        let range = eligible_range(&table, &SamplerConfig::default()).unwrap();
        // 2016-01-01 is day 2191; the first row after it is day 2195.
        assert_eq!(range.min_idx, 439);
        assert_eq!(range.max_idx, 500);
        assert!(range.min_idx < range.max_idx);
    }

    #[test]
    fn min_lookback_floors_the_range() {
        let table = spaced_table("NEW", date(2017, 1, 2), 800, 1);
        let range = eligible_range(&table, &SamplerConfig::default()).unwrap();
        assert_eq!(range.min_idx, 60);
        assert_eq!(range.max_idx, 300);
    }

    #[test]
    fn short_table_is_rejected() {
        let table = spaced_table("SHORT", date(2017, 1, 2), 400, 1);
        let err = eligible_range(&table, &SamplerConfig::default()).unwrap_err();
        assert!(matches!(err, Rejection::TooShort { rows: 400, min_forward: 500 }));
    }

    #[test]
    fn table_before_threshold_is_rejected() {
        let table = spaced_table("OLD", date(2005, 1, 1), 1000, 1);
        let err = eligible_range(&table, &SamplerConfig::default()).unwrap_err();
        assert!(matches!(err, Rejection::NothingAfterThreshold { .. }));
    }

    #[test]
    fn row_exactly_on_threshold_does_not_count() {
        let table = spaced_table("EDGE", date(2016, 1, 1), 1000, 1);
        let config = SamplerConfig {
            min_lookback: 0,
            ..SamplerConfig::default()
        };
        let range = eligible_range(&table, &config).unwrap();
        assert_eq!(range.min_idx, 1);
    }

    #[test]
    fn equal_bounds_are_ineligible() {
        // 560 rows: min_idx = 60, max_idx = 60.
        let table = spaced_table("TIGHT", date(2017, 1, 2), 560, 1);
        let err = eligible_range(&table, &SamplerConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Rejection::EmptyRange {
                rows: 560,
                min_idx: 60,
                max_idx: 60
            }
        ));
    }

    #[test]
    fn inclusive_draw_reaches_both_ends() {
        // 561 rows: starts 60 and 61 are both valid.
        let table = spaced_table("TIGHT", date(2017, 1, 2), 561, 1);
        let config = SamplerConfig::default();
        let source = MemorySource::new();
        let sampler = ConstrainedSampler::new(&source, &config);
        let mut rng = StdRng::seed_from_u64(9);

        let mut forward_lens = HashSet::new();
        for _ in 0..200 {
            let window = sampler.sample_table(&table, &mut rng).unwrap();
            forward_lens.insert(window.forward_len());
        }
        assert_eq!(forward_lens, HashSet::from([500, 501]));
    }

    #[test]
    fn carve_window_keeps_lookback_and_tail() {
        let table = spaced_table("W", date(2017, 1, 2), 1000, 1);

        let near_start = carve_window(&table, 100, 300);
        assert_eq!(near_start.data().len(), 1000);
        assert_eq!(near_start.start_index(), 100);

        let deep = carve_window(&table, 400, 300);
        assert_eq!(deep.data().len(), 900);
        assert_eq!(deep.start_index(), 300);
        assert_eq!(deep.start_date(), table.rows()[400].timestamp.date());
    }

    #[test]
    fn carve_window_zero_fills_missing_fields() {
        let table = synthetic_table("NOPE", date(2015, 1, 1), 900, 3, &[NumericField::Pe]);
        let window = carve_window(&table, 500, 300);
        assert!(window.data().iter().all(|bar| bar.pe == 0.0));
        assert!(window.data().iter().all(|bar| bar.close > 0.0));
    }

    #[test]
    fn sample_succeeds_with_valid_window() {
        let source = MemorySource::new()
            .with_table(synthetic_table("AAA", date(2014, 1, 1), 1500, 1, &[]));
        let config = SamplerConfig::default();
        let mut rng = StdRng::seed_from_u64(1);

        let window = ConstrainedSampler::new(&source, &config)
            .sample(&mut rng)
            .unwrap();
        assert_eq!(window.ticker(), "AAA");
        assert!(window.start_index() < window.data().len());
        assert!(window.forward_len() >= config.min_forward);
        assert!(window.start_date() > config.threshold_date);
        assert!(window.history().len() <= config.lookback_window);
        assert_eq!(source.loads(), 1);
    }

    #[test]
    fn rejected_files_are_retried_until_success() {
        let source = MemorySource::new()
            .with_broken("BAD1", "unterminated quote")
            .with_table(synthetic_table("SHORT", date(2017, 1, 2), 400, 2, &[]))
            .with_broken("BAD2", "ragged row")
            .with_table(synthetic_table("GOOD", date(2014, 1, 1), 1500, 3, &[]));
        let config = SamplerConfig::default();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let window = ConstrainedSampler::new(&source, &config)
                .sample(&mut rng)
                .unwrap();
            assert_eq!(window.ticker(), "GOOD");
        }
    }

    #[test]
    fn exhaustion_after_exact_budget() {
        let source = MemorySource::new()
            .with_table(synthetic_table("S1", date(2017, 1, 2), 400, 1, &[]))
            .with_table(synthetic_table("S2", date(2017, 1, 2), 300, 2, &[]));
        let config = SamplerConfig::default();
        let mut rng = StdRng::seed_from_u64(5);

        let err = ConstrainedSampler::new(&source, &config)
            .sample(&mut rng)
            .unwrap_err();
        assert!(matches!(err, SampleError::Exhausted { attempts: 100, .. }));
        assert_eq!(source.loads(), 100);
        assert!(err.to_string().contains("insufficient"));
    }

    #[test]
    fn empty_source_fails_without_drawing() {
        let source = MemorySource::new();
        let config = SamplerConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let err = ConstrainedSampler::new(&source, &config)
            .sample(&mut rng)
            .unwrap_err();
        assert!(matches!(err, SampleError::EmptyCorpus));
        assert_eq!(source.loads(), 0);
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let source = MemorySource::new()
            .with_table(synthetic_table("A", date(2014, 1, 1), 1500, 1, &[]))
            .with_table(synthetic_table("B", date(2013, 6, 3), 1800, 2, &[]));
        let config = SamplerConfig::default();
        let sampler = ConstrainedSampler::new(&source, &config);

        let a = sampler.sample(&mut StdRng::seed_from_u64(77)).unwrap();
        let b = sampler.sample(&mut StdRng::seed_from_u64(77)).unwrap();
        assert_eq!(a, b);
    }
}
