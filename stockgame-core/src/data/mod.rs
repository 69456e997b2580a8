//! Corpus loading: enumeration, decoding, schema normalization and parsing.

pub mod corpus;
pub mod decode;
pub mod schema;
pub mod sort;
pub mod source;
pub mod synthetic;
pub mod table;

pub use corpus::{CorpusFile, CsvCorpus, SetupError};
pub use decode::{decode, TextEncoding};
pub use schema::{normalize_header, parse_timestamp, ColumnMap, DATE_COLUMN};
pub use sort::{sort_directory, sort_file, SortError, SortOutcome, SortSummary};
pub use source::TableSource;
pub use synthetic::{synthetic_table, MemorySource};
pub use table::{load_table, parse_table, InstrumentRow, InstrumentTable, Rejection};
