//! Stock game core — corpus loading and constrained game-start sampling.
//!
//! This crate picks one instrument from a directory of daily CSV files and a
//! random game-start row within it:
//! - Corpus enumeration, UTF-8/GBK decoding and column normalization
//! - Eligible-range computation (date floor, minimum history, minimum forward data)
//! - Rejection sampling across files with a bounded attempt budget
//! - Window carving and numeric cleaning into fixed-shape rows
//! - Offline corpus sorting and eligibility checks
//! - Day-by-day trading sessions over a sampled window, with settlement stats

pub mod check;
pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod sampler;
pub mod service;
pub mod session;
pub mod settlement;

pub use check::{check_source, FileReport, FileStatus};
pub use config::{ConfigError, SamplerConfig, ServiceConfig};
pub use data::{CsvCorpus, Rejection, SetupError, TableSource};
pub use domain::{NumericField, SampleWindow, StockBar};
pub use sampler::{carve_window, eligible_range, ConstrainedSampler, EligibleRange, SampleError};
pub use service::StockService;
pub use session::{Command, Step, TradeAction, TradeError, TradeRecord, TradingSession};
pub use settlement::SettlementReport;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the service and its outputs can cross threads.
    ///
    /// A serving layer shares one `StockService` across request handlers and
    /// hands each `SampleWindow` to a different task.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<StockService>();
        require_sync::<StockService>();
        require_send::<CsvCorpus>();
        require_sync::<CsvCorpus>();
        require_send::<SamplerConfig>();
        require_sync::<SamplerConfig>();
        require_send::<SampleWindow>();
        require_sync::<SampleWindow>();
        require_send::<StockBar>();
        require_sync::<StockBar>();
        require_send::<SampleError>();
        require_sync::<SampleError>();
        require_send::<SetupError>();
        require_sync::<SetupError>();
        require_send::<data::InstrumentTable>();
        require_sync::<data::InstrumentTable>();
        require_send::<data::MemorySource>();
        require_sync::<data::MemorySource>();
        require_send::<TradingSession>();
        require_sync::<TradingSession>();
        require_send::<TradeError>();
        require_sync::<TradeError>();
    }

    #[test]
    fn table_source_is_object_safe() {
        fn _check(source: &dyn TableSource, config: &SamplerConfig) {
            let _ = ConstrainedSampler::new(source, config);
        }
    }
}
