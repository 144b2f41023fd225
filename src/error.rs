//! Error types of the index engine
//!
//! Precondition violations, capability mismatches and I/O failures are
//! distinct variants so that callers can tell a bug in their own code
//! (odd merge, unsorted codec input) from a failing disk.

use std::io;

use thiserror::Error;

use crate::base::DocId;

#[derive(Error, Debug)]
pub enum IndexError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A caller broke an operation precondition
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// The codec was given a list that is not in ascending order
    #[error("Unsorted codec input at position {position}: {value} follows {previous}")]
    UnsortedInput {
        position: usize,
        previous: DocId,
        value: DocId,
    },

    /// The operation requires a capability this index was not created with
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// On-disk content could not be decoded
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// Manifest or document store (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    pub fn precondition<S: Into<String>>(msg: S) -> Self {
        IndexError::Precondition(msg.into())
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        IndexError::Unsupported(msg.into())
    }

    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        IndexError::Corrupt(msg.into())
    }
}

impl From<bincode::Error> for IndexError {
    fn from(e: bincode::Error) -> Self {
        IndexError::Serialization(e.to_string())
    }
}

impl From<ciborium::de::Error<io::Error>> for IndexError {
    fn from(e: ciborium::de::Error<io::Error>) -> Self {
        IndexError::Serialization(e.to_string())
    }
}

impl From<ciborium::ser::Error<io::Error>> for IndexError {
    fn from(e: ciborium::ser::Error<io::Error>) -> Self {
        IndexError::Serialization(e.to_string())
    }
}
