//! Index configuration
//!
//! Options are given when opening an index and stored in its manifest;
//! nothing here is process-wide.

use std::fmt;

use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::{
    base::DEFAULT_PAGE_SIZE,
    compress::PostingCodec,
    error::{IndexError, Result},
};

/// Smallest page that can hold the fixed-size headers of every section
pub const MIN_PAGE_SIZE: usize = 64;

#[derive(Derivative, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[derivative(Default)]
pub struct IndexOptions {
    /// Number of buffered documents that triggers a flush
    #[derivative(Default(value = "1000"))]
    pub flush_threshold: usize,

    /// Number of segments that triggers a merge (must be even)
    #[derivative(Default(value = "8"))]
    pub merge_threshold: usize,

    /// Size of the pages of every segment file
    #[derivative(Default(value = "DEFAULT_PAGE_SIZE"))]
    pub page_size: usize,
}

impl IndexOptions {
    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold == 0 {
            return Err(IndexError::precondition(
                "the flush threshold must be at least 1",
            ));
        }
        if self.merge_threshold < 2 || self.merge_threshold % 2 != 0 {
            return Err(IndexError::precondition(format!(
                "the merge threshold must be an even number greater than 1 (got {})",
                self.merge_threshold
            )));
        }
        if self.page_size < MIN_PAGE_SIZE {
            return Err(IndexError::precondition(format!(
                "the page size must be at least {} bytes (got {})",
                MIN_PAGE_SIZE, self.page_size
            )));
        }
        Ok(())
    }
}

/// What an index stores for each (term, document) pair
#[derive(Serialize, Deserialize, Clone)]
pub enum IndexKind {
    /// Term frequencies only
    Plain,
    /// Token positions, encoded with the given codec
    Positional(Box<dyn PostingCodec>),
}

impl IndexKind {
    pub fn is_positional(&self) -> bool {
        matches!(self, IndexKind::Positional(_))
    }

    pub fn codec(&self) -> Option<&dyn PostingCodec> {
        match self {
            IndexKind::Plain => None,
            IndexKind::Positional(codec) => Some(codec.as_ref()),
        }
    }

    /// Two kinds are compatible when they store the same data with the same codec
    pub fn same_as(&self, other: &IndexKind) -> bool {
        match (self, other) {
            (IndexKind::Plain, IndexKind::Plain) => true,
            (IndexKind::Positional(a), IndexKind::Positional(b)) => a.name() == b.name(),
            _ => false,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IndexKind::Plain => write!(f, "plain"),
            IndexKind::Positional(codec) => write!(f, "positional ({})", codec.name()),
        }
    }
}

impl fmt::Debug for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
