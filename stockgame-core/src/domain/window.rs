//! SampleWindow — the result of one successful sampling call.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::StockBar;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("start_index {start_index} is out of range for {rows} rows")]
pub struct InvalidWindow {
    pub start_index: usize,
    pub rows: usize,
}

/// A contiguous slice of one instrument plus the game-start pointer into it.
///
/// `data[..start_index]` is pre-game history; `data[start_index..]` is the
/// simulated future. Every constructor, deserialization included, checks
/// that `start_index` is a valid index into `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WindowParts")]
pub struct SampleWindow {
    ticker: String,
    data: Vec<StockBar>,
    start_index: usize,
}

/// Unchecked wire form.
#[derive(Deserialize)]
struct WindowParts {
    ticker: String,
    data: Vec<StockBar>,
    start_index: usize,
}

impl TryFrom<WindowParts> for SampleWindow {
    type Error = InvalidWindow;

    fn try_from(parts: WindowParts) -> Result<Self, Self::Error> {
        Self::try_new(parts.ticker, parts.data, parts.start_index)
    }
}

impl SampleWindow {
    /// Build a window, rejecting a `start_index` outside `data`.
    pub fn try_new(
        ticker: String,
        data: Vec<StockBar>,
        start_index: usize,
    ) -> Result<Self, InvalidWindow> {
        if start_index >= data.len() {
            return Err(InvalidWindow {
                start_index,
                rows: data.len(),
            });
        }
        Ok(Self {
            ticker,
            data,
            start_index,
        })
    }

    pub(crate) fn new(ticker: String, data: Vec<StockBar>, start_index: usize) -> Self {
        debug_assert!(start_index < data.len(), "start_index out of range");
        Self {
            ticker,
            data,
            start_index,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn data(&self) -> &[StockBar] {
        &self.data
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// The game-start row.
    pub fn start_bar(&self) -> &StockBar {
        &self.data[self.start_index]
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_bar().date
    }

    /// Rows shown as context before play begins.
    pub fn history(&self) -> &[StockBar] {
        &self.data[..self.start_index]
    }

    /// Rows from the game-start row (inclusive) to the end.
    pub fn forward(&self) -> &[StockBar] {
        &self.data[self.start_index..]
    }

    pub fn forward_len(&self) -> usize {
        self.data.len() - self.start_index
    }
}
