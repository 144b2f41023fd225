//! A disk-backed, segmented inverted index
//!
//! Documents are analyzed into terms and buffered in memory; buffers are
//! flushed as immutable on-disk segments that are merged pairwise as
//! they accumulate. Indices answer keyword, boolean, phrase and TF-IDF
//! ranked queries.

pub mod analysis;
pub mod base;
pub mod compress;
pub mod error;
pub mod index;
pub mod options;
pub mod search;
pub mod store;
pub mod utils;

pub use analysis::{Analyzer, NaiveAnalyzer, PunctuationAnalyzer};
pub use base::Document;
pub use error::{IndexError, Result};
pub use index::IndexManager;
pub use options::{IndexKind, IndexOptions};
