//! CSV directory corpus.
//!
//! The directory is listed once at construction; afterwards the corpus is
//! read-only and can be shared across threads.

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::source::TableSource;
use super::table::{load_table, InstrumentTable, Rejection};
use crate::config::ConfigError;

/// Fatal errors at service construction.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("data directory does not exist: {}", .0.display())]
    DataDirMissing(PathBuf),

    #[error("no CSV files found in {}", .0.display())]
    NoDataFiles(PathBuf),

    #[error("list data directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    pub ticker: String,
    pub path: PathBuf,
}

/// The enumerated CSV files of a data directory, sorted by file name.
#[derive(Debug, Clone)]
pub struct CsvCorpus {
    dir: PathBuf,
    files: Vec<CorpusFile>,
}

impl CsvCorpus {
    /// List `*.csv` files in `dir` (extension match ignores case).
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SetupError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(SetupError::DataDirMissing(dir));
        }

        let io_err = |source| SetupError::Io {
            path: dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() || !is_csv(&path) {
                continue;
            }
            let Some(stem) = path.file_stem() else {
                continue;
            };
            files.push(CorpusFile {
                ticker: stem.to_string_lossy().into_owned(),
                path,
            });
        }

        if files.is_empty() {
            return Err(SetupError::NoDataFiles(dir));
        }
        files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

        Ok(Self { dir, files })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[CorpusFile] {
        &self.files
    }
}

impl TableSource for CsvCorpus {
    fn len(&self) -> usize {
        self.files.len()
    }

    fn ticker(&self, index: usize) -> &str {
        &self.files[index].ticker
    }

    fn load(&self, index: usize) -> Result<InstrumentTable, Rejection> {
        let file = &self.files[index];
        load_table(&file.ticker, &file.path)
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
