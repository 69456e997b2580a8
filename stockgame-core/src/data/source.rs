//! Table source trait.
//!
//! The sampler draws files by index from a `TableSource` so we can swap the
//! CSV directory corpus for an in-memory source in tests and benchmarks.

use super::table::{InstrumentTable, Rejection};

/// An indexable set of candidate instruments.
pub trait TableSource: Send + Sync {
    /// Number of candidate instruments.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifier of the instrument at `index`.
    fn ticker(&self, index: usize) -> &str;

    /// Materialize the instrument at `index`. Called once per attempt; never cached.
    fn load(&self, index: usize) -> Result<InstrumentTable, Rejection>;
}
