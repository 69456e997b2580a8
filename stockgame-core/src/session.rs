//! TradingSession — day-by-day play over a sampled window.
//!
//! Play starts at the window's game-start row with all cash and no shares.
//! Every buy, sell or hold moves the session one row forward; reaching the
//! last row ends the game. Trades fill at the current row's close.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{SampleWindow, StockBar};
use crate::indicators::{moving_average_at, MA_PERIODS};
use crate::settlement::SettlementReport;

/// Starting cash for a new session.
pub const INITIAL_CASH: f64 = 1_000_000.0;

/// Shares per lot. Trade volumes must be whole lots.
pub const LOT_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// One filled trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    /// Trading days since game start (`T+day`).
    pub day: usize,
    pub action: TradeAction,
    pub price: f64,
    pub volume: u64,
    /// `(price - avg_cost) / avg_cost` at the time of a sell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeError {
    #[error("volume {0} is not a positive multiple of the 100-share lot")]
    InvalidVolume(u64),

    #[error("insufficient cash: need {needed:.2}, have {available:.2}")]
    InsufficientCash { needed: f64, available: f64 },

    #[error("insufficient holdings: requested {requested}, hold {held}")]
    InsufficientHoldings { requested: u64, held: u64 },

    #[error("the game is over")]
    SessionOver,
}

/// Where the session stands after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Advanced,
    Finished,
}

/// One scripted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Buy(u64),
    Sell(u64),
    /// Skip this many days without trading.
    Hold(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid command '{0}': expected buy:N, sell:N, hold or hold:N")]
pub struct ParseCommandError(String);

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let bad = || ParseCommandError(text.to_string());
        let (verb, arg) = match text.split_once(':') {
            Some((verb, arg)) => (verb.trim(), Some(arg.trim())),
            None => (text, None),
        };
        match (verb.to_ascii_lowercase().as_str(), arg) {
            ("buy", Some(n)) => n.parse().map(Command::Buy).map_err(|_| bad()),
            ("sell", Some(n)) => n.parse().map(Command::Sell).map_err(|_| bad()),
            ("hold", None) => Ok(Command::Hold(1)),
            ("hold", Some(n)) => match n.parse() {
                Ok(days) if days > 0 => Ok(Command::Hold(days)),
                _ => Err(bad()),
            },
            _ => Err(bad()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Buy(n) => write!(f, "buy:{n}"),
            Command::Sell(n) => write!(f, "sell:{n}"),
            Command::Hold(n) => write!(f, "hold:{n}"),
        }
    }
}

/// Game state for one player over one window.
///
/// The asset history holds total assets at game start and after every move,
/// so `assets_history().len() == day() + 1`.
#[derive(Debug, Clone)]
pub struct TradingSession {
    window: SampleWindow,
    current: usize,
    initial_cash: f64,
    cash: f64,
    holdings: u64,
    avg_cost: f64,
    trades: Vec<TradeRecord>,
    assets_history: Vec<f64>,
}

impl TradingSession {
    pub fn new(window: SampleWindow) -> Self {
        Self::with_cash(window, INITIAL_CASH)
    }

    pub fn with_cash(window: SampleWindow, cash: f64) -> Self {
        let current = window.start_index();
        Self {
            window,
            current,
            initial_cash: cash,
            cash,
            holdings: 0,
            avg_cost: 0.0,
            trades: Vec::new(),
            assets_history: vec![cash],
        }
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Days elapsed since game start.
    pub fn day(&self) -> usize {
        self.current - self.window.start_index()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_bar(&self) -> &StockBar {
        &self.window.data()[self.current]
    }

    /// Fill price for trades on the current day.
    pub fn price(&self) -> f64 {
        self.current_bar().close
    }

    /// Rows the player may see: history up to and including today.
    pub fn visible(&self) -> &[StockBar] {
        &self.window.data()[..=self.current]
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn holdings(&self) -> u64 {
        self.holdings
    }

    pub fn avg_cost(&self) -> f64 {
        self.avg_cost
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn assets_history(&self) -> &[f64] {
        &self.assets_history
    }

    pub fn is_finished(&self) -> bool {
        self.current + 1 >= self.window.data().len()
    }

    pub fn market_value(&self) -> f64 {
        self.holdings as f64 * self.price()
    }

    pub fn total_assets(&self) -> f64 {
        self.cash + self.market_value()
    }

    /// Share of total assets held in stock.
    pub fn position_ratio(&self) -> f64 {
        let total = self.total_assets();
        if total > 0.0 {
            self.market_value() / total
        } else {
            0.0
        }
    }

    pub fn total_return(&self) -> f64 {
        if self.initial_cash > 0.0 {
            (self.total_assets() - self.initial_cash) / self.initial_cash
        } else {
            0.0
        }
    }

    /// `(period, value)` for each chart moving average at the current row.
    pub fn moving_averages(&self) -> Vec<(usize, Option<f64>)> {
        MA_PERIODS
            .iter()
            .map(|&p| (p, moving_average_at(self.window.data(), self.current, p)))
            .collect()
    }

    /// Buy `volume` shares at today's close, then move to the next day.
    pub fn buy(&mut self, volume: u64) -> Result<Step, TradeError> {
        self.check_trade(volume)?;
        let price = self.price();
        let amount = volume as f64 * price;
        if amount > self.cash {
            return Err(TradeError::InsufficientCash {
                needed: amount,
                available: self.cash,
            });
        }

        let held = self.holdings + volume;
        self.avg_cost = (self.holdings as f64 * self.avg_cost + amount) / held as f64;
        self.holdings = held;
        self.cash -= amount;
        self.record(TradeAction::Buy, price, volume, None);
        Ok(self.advance())
    }

    /// Sell `volume` shares at today's close, then move to the next day.
    pub fn sell(&mut self, volume: u64) -> Result<Step, TradeError> {
        self.check_trade(volume)?;
        if volume > self.holdings {
            return Err(TradeError::InsufficientHoldings {
                requested: volume,
                held: self.holdings,
            });
        }

        let price = self.price();
        let profit_rate = if self.avg_cost > 0.0 {
            (price - self.avg_cost) / self.avg_cost
        } else {
            0.0
        };
        self.cash += volume as f64 * price;
        self.holdings -= volume;
        if self.holdings == 0 {
            self.avg_cost = 0.0;
        }
        self.record(TradeAction::Sell, price, volume, Some(profit_rate));
        Ok(self.advance())
    }

    /// Move forward up to `days` rows without trading.
    pub fn hold(&mut self, days: usize) -> Result<Step, TradeError> {
        if self.is_finished() {
            return Err(TradeError::SessionOver);
        }
        let mut step = Step::Advanced;
        for _ in 0..days {
            step = self.advance();
            if step == Step::Finished {
                break;
            }
        }
        Ok(step)
    }

    pub fn apply(&mut self, command: Command) -> Result<Step, TradeError> {
        match command {
            Command::Buy(volume) => self.buy(volume),
            Command::Sell(volume) => self.sell(volume),
            Command::Hold(days) => self.hold(days),
        }
    }

    /// Summarize the session as it stands. Open positions are valued at
    /// today's close.
    pub fn settle(&self) -> SettlementReport {
        SettlementReport::new(
            self.window.ticker(),
            self.initial_cash,
            self.total_assets(),
            &self.assets_history,
            &self.trades,
            self.day(),
        )
    }

    fn check_trade(&self, volume: u64) -> Result<(), TradeError> {
        if self.is_finished() {
            return Err(TradeError::SessionOver);
        }
        if volume == 0 || volume % LOT_SIZE != 0 {
            return Err(TradeError::InvalidVolume(volume));
        }
        Ok(())
    }

    fn record(&mut self, action: TradeAction, price: f64, volume: u64, profit_rate: Option<f64>) {
        self.trades.push(TradeRecord {
            day: self.day(),
            action,
            price,
            volume,
            profit_rate,
        });
    }

    fn advance(&mut self) -> Step {
        if !self.is_finished() {
            self.current += 1;
            self.assets_history.push(self.total_assets());
        }
        if self.is_finished() {
            Step::Finished
        } else {
            Step::Advanced
        }
    }
}
