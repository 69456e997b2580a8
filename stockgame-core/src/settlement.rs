//! Settlement report for a finished (or abandoned) trading session.
//!
//! All rates are fractions: `0.15` means 15%. Only sells carry a profit
//! rate, so win rate and average win/loss are computed over sells.

use serde::Serialize;

use crate::session::{TradeAction, TradeRecord};

/// Which side of the profit-rate split to average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOutcome {
    /// Profit rate above zero.
    Win,
    /// Profit rate at or below zero.
    Loss,
}

/// Largest peak-to-trough decline of an asset curve, as a positive fraction.
pub fn max_drawdown(assets: &[f64]) -> f64 {
    let Some(&first) = assets.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &value in assets {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}

fn sell_rates(trades: &[TradeRecord]) -> impl Iterator<Item = f64> + '_ {
    trades
        .iter()
        .filter(|t| t.action == TradeAction::Sell)
        .map(|t| t.profit_rate.unwrap_or(0.0))
}

/// Mean profit rate of winning or losing sells. Zero when there are none.
pub fn average_profit_rate(trades: &[TradeRecord], outcome: TradeOutcome) -> f64 {
    let rates: Vec<f64> = sell_rates(trades)
        .filter(|&rate| match outcome {
            TradeOutcome::Win => rate > 0.0,
            TradeOutcome::Loss => rate <= 0.0,
        })
        .collect();
    if rates.is_empty() {
        return 0.0;
    }
    rates.iter().sum::<f64>() / rates.len() as f64
}

/// Fraction of sells with a positive profit rate.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    let (sells, wins) = sell_rates(trades).fold((0usize, 0usize), |(n, w), rate| {
        (n + 1, w + usize::from(rate > 0.0))
    });
    if sells == 0 {
        return 0.0;
    }
    wins as f64 / sells as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementReport {
    pub ticker: String,
    pub initial_assets: f64,
    pub final_assets: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    /// Number of sell trades.
    pub sells: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// Days stepped past the game start.
    pub trading_days: usize,
    pub trades: Vec<TradeRecord>,
}

impl SettlementReport {
    pub fn new(
        ticker: impl Into<String>,
        initial_assets: f64,
        final_assets: f64,
        assets_history: &[f64],
        trades: &[TradeRecord],
        trading_days: usize,
    ) -> Self {
        let total_return = if initial_assets > 0.0 {
            (final_assets - initial_assets) / initial_assets
        } else {
            0.0
        };
        Self {
            ticker: ticker.into(),
            initial_assets,
            final_assets,
            total_return,
            max_drawdown: max_drawdown(assets_history),
            sells: sell_rates(trades).count(),
            win_rate: win_rate(trades),
            avg_win: average_profit_rate(trades, TradeOutcome::Win),
            avg_loss: average_profit_rate(trades, TradeOutcome::Loss),
            trading_days,
            trades: trades.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buy() -> TradeRecord {
        TradeRecord {
            day: 0,
            action: TradeAction::Buy,
            price: 10.0,
            volume: 100,
            profit_rate: None,
        }
    }

    fn sell(rate: f64) -> TradeRecord {
        TradeRecord {
            day: 1,
            action: TradeAction::Sell,
            price: 10.0 * (1.0 + rate),
            volume: 100,
            profit_rate: Some(rate),
        }
    }

    // ── Max drawdown ──

    #[test]
    fn max_drawdown_known() {
        let assets = vec![1_000_000.0, 1_100_000.0, 900_000.0, 950_000.0];
        let expected = (1_100_000.0 - 900_000.0) / 1_100_000.0;
        assert!((max_drawdown(&assets) - expected).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_monotonic_increase() {
        let assets: Vec<f64> = (0..50).map(|i| 1_000_000.0 + i as f64 * 100.0).collect();
        assert_eq!(max_drawdown(&assets), 0.0);
    }

    #[test]
    fn max_drawdown_empty() {
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    // ── Trade statistics ──

    #[test]
    fn averages_split_on_sign() {
        let trades = vec![buy(), sell(0.10), sell(0.20), sell(-0.05), sell(0.0)];
        assert!((average_profit_rate(&trades, TradeOutcome::Win) - 0.15).abs() < 1e-10);
        // Zero counts as a loss.
        assert!((average_profit_rate(&trades, TradeOutcome::Loss) + 0.025).abs() < 1e-10);
        assert!((win_rate(&trades) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn no_sells_is_all_zero() {
        let trades = vec![buy(), buy()];
        assert_eq!(win_rate(&trades), 0.0);
        assert_eq!(average_profit_rate(&trades, TradeOutcome::Win), 0.0);
        assert_eq!(average_profit_rate(&trades, TradeOutcome::Loss), 0.0);
    }

    #[test]
    fn report_totals() {
        let trades = vec![buy(), sell(0.1)];
        let history = [1_000_000.0, 990_000.0, 1_010_000.0];
        let report =
            SettlementReport::new("000001", 1_000_000.0, 1_010_000.0, &history, &trades, 2);
        assert!((report.total_return - 0.01).abs() < 1e-12);
        assert!((report.max_drawdown - 0.01).abs() < 1e-12);
        assert_eq!(report.sells, 1);
        assert_eq!(report.win_rate, 1.0);
        assert_eq!(report.trading_days, 2);
        assert_eq!(report.trades.len(), 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["trades"][0]["action"], "buy");
        assert!(json["trades"][0].get("profit_rate").is_none());
        assert_eq!(json["trades"][1]["profit_rate"], 0.1);
    }
}
