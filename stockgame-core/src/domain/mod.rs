//! Domain types emitted by the sampler.

pub mod bar;
pub mod window;

pub use bar::{clean_numeric, clean_value, NumericField, StockBar};
pub use window::{InvalidWindow, SampleWindow};
