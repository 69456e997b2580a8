//! Simple moving averages of close prices.
//!
//! Lookback: period - 1 (first value at index period-1). Earlier rows have none.

use crate::domain::StockBar;

/// Periods drawn on the daily chart during play.
pub const MA_PERIODS: [usize; 5] = [5, 10, 20, 60, 250];

/// Rolling mean of `close` over `period` rows for every row of `bars`.
pub fn moving_average(bars: &[StockBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return out;
    }

    let mut sum: f64 = bars[..period].iter().map(|b| b.close).sum();
    out[period - 1] = Some(sum / period as f64);
    for i in period..bars.len() {
        sum += bars[i].close - bars[i - period].close;
        out[i] = Some(sum / period as f64);
    }
    out
}

/// Mean close of the `period` rows ending at `index` (inclusive).
pub fn moving_average_at(bars: &[StockBar], index: usize, period: usize) -> Option<f64> {
    if period == 0 || index >= bars.len() || index + 1 < period {
        return None;
    }
    let window = &bars[index + 1 - period..=index];
    Some(window.iter().map(|b| b.close).sum::<f64>() / period as f64)
}
