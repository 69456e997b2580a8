//! StockService — the one entry point a serving layer needs.
//!
//! Construction enumerates the corpus and validates the config; both failures
//! are fatal. After that the service is immutable and `Send + Sync`, so one
//! instance can serve concurrent callers, each with its own RNG.

use rand::Rng;
use std::path::Path;

use crate::check::{check_source, FileReport};
use crate::config::{SamplerConfig, ServiceConfig};
use crate::data::{CsvCorpus, SetupError, TableSource};
use crate::domain::SampleWindow;
use crate::sampler::{ConstrainedSampler, SampleError};

#[derive(Debug, Clone)]
pub struct StockService {
    corpus: CsvCorpus,
    config: SamplerConfig,
}

impl StockService {
    pub fn new(data_dir: impl AsRef<Path>, config: SamplerConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let corpus = CsvCorpus::open(data_dir)?;
        tracing::info!(
            dir = %corpus.dir().display(),
            files = corpus.len(),
            "corpus ready"
        );
        Ok(Self { corpus, config })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, SetupError> {
        Self::new(&config.data_dir, config.sampler.clone())
    }

    pub fn corpus(&self) -> &CsvCorpus {
        &self.corpus
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Draw one game window using the thread-local RNG.
    pub fn sample(&self) -> Result<SampleWindow, SampleError> {
        self.sample_with(&mut rand::thread_rng())
    }

    /// Draw one game window with a caller-supplied RNG (seeded runs, tests).
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SampleWindow, SampleError> {
        ConstrainedSampler::new(&self.corpus, &self.config).sample(rng)
    }

    /// Eligibility report for every file in the corpus.
    pub fn check(&self) -> Vec<FileReport> {
        check_source(&self.corpus, &self.config)
    }
}
