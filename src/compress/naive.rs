//! Fixed-width (uncompressed) codec
//!
//! Each value takes 4 bytes, big-endian, without delta encoding. Used as a
//! baseline to measure how much the variable-length codec saves.

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use super::{check_range, PostingCodec};
use crate::{
    base::DocId,
    error::{IndexError, Result},
};

const VALUE_SIZE: usize = std::mem::size_of::<DocId>();

#[derive(Serialize, Deserialize, Clone, Copy, Default, Debug)]
pub struct FixedWidthCodec {}

#[typetag::serde]
impl PostingCodec for FixedWidthCodec {
    fn encode(&self, values: &[DocId]) -> Result<Vec<u8>> {
        let mut out = vec![0u8; values.len() * VALUE_SIZE];
        BigEndian::write_u32_into(values, &mut out);
        Ok(out)
    }

    fn decode_range(&self, bytes: &[u8], start: usize, length: usize) -> Result<Vec<DocId>> {
        let bytes = check_range(bytes, start, length)?;
        if bytes.len() % VALUE_SIZE != 0 {
            return Err(IndexError::corrupt(format!(
                "{} bytes cannot hold a whole number of 4-byte values",
                bytes.len()
            )));
        }

        let mut values = vec![0; bytes.len() / VALUE_SIZE];
        BigEndian::read_u32_into(bytes, &mut values);
        Ok(values)
    }

    fn name(&self) -> &'static str {
        "fixed-width"
    }

    fn boxed_clone(&self) -> Box<dyn PostingCodec> {
        Box::new(*self)
    }
}
