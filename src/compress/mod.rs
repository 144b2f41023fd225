//! Methods for compressing the posting lists
//!
//! A codec turns a list of ascending integers (document IDs, token
//! positions, block offsets) into bytes and back. Codecs are boxed and
//! serialized with the index manifest, so that an index is always read
//! back with the codec that wrote it.

use crate::{base::DocId, error::Result};

pub mod naive;
pub mod varint;

pub use naive::FixedWidthCodec;
pub use varint::DeltaVarLenCodec;

#[typetag::serde(tag = "type")]
pub trait PostingCodec: Send + Sync {
    /// Short name, used in logs and to check the codec of a reopened index
    fn name(&self) -> &'static str;

    /// Encodes a list of ascending integers
    fn encode(&self, values: &[DocId]) -> Result<Vec<u8>>;

    /// Decodes `length` bytes starting at `start`, the range being a
    /// self-contained sequence of encoded values
    fn decode_range(&self, bytes: &[u8], start: usize, length: usize) -> Result<Vec<DocId>>;

    /// Decodes a whole buffer
    fn decode(&self, bytes: &[u8]) -> Result<Vec<DocId>> {
        self.decode_range(bytes, 0, bytes.len())
    }

    fn boxed_clone(&self) -> Box<dyn PostingCodec>;
}

impl Clone for Box<dyn PostingCodec> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Checks that `start..start+length` is a valid range of `bytes`
pub(crate) fn check_range(bytes: &[u8], start: usize, length: usize) -> Result<&[u8]> {
    bytes
        .get(start..start.saturating_add(length))
        .ok_or_else(|| {
            crate::error::IndexError::precondition(format!(
                "range {}+{} is out of bounds for a buffer of {} bytes",
                start,
                length,
                bytes.len()
            ))
        })
}
