//! Delta + variable-length encoding
//!
//! Values are first replaced by their difference with the previous value,
//! then each difference is written as groups of 7 bits, most significant
//! group first. The high bit of a byte is set when more groups follow.

use serde::{Deserialize, Serialize};

use super::{check_range, PostingCodec};
use crate::{
    base::DocId,
    error::{IndexError, Result},
};

const CONTINUATION: u8 = 0x80;
const GROUP_MASK: u8 = 0x7f;

#[derive(Serialize, Deserialize, Clone, Copy, Default, Debug)]
pub struct DeltaVarLenCodec {}

/// Appends the variable-length encoding of `value`
fn write_value(out: &mut Vec<u8>, value: DocId) {
    // 32 bits fit in 5 groups of 7 bits
    let mut groups = [0u8; 5];
    let mut count = 0;
    let mut rest = value;
    loop {
        groups[count] = (rest & GROUP_MASK as u32) as u8;
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }

    for ix in (0..count).rev() {
        let flag = if ix > 0 { CONTINUATION } else { 0 };
        out.push(groups[ix] | flag);
    }
}

#[typetag::serde]
impl PostingCodec for DeltaVarLenCodec {
    fn encode(&self, values: &[DocId]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(values.len());
        let mut previous: DocId = 0;

        for (position, &value) in values.iter().enumerate() {
            let delta = value.checked_sub(previous).ok_or(IndexError::UnsortedInput {
                position,
                previous,
                value,
            })?;
            write_value(&mut out, delta);
            previous = value;
        }

        Ok(out)
    }

    fn decode_range(&self, bytes: &[u8], start: usize, length: usize) -> Result<Vec<DocId>> {
        let bytes = check_range(bytes, start, length)?;
        let mut values = Vec::new();
        let mut offset: u64 = 0;
        let mut current: u64 = 0;
        let mut pending = false;

        for &byte in bytes {
            // A leading zero group has no canonical encoding
            if !pending && byte == CONTINUATION {
                return Err(IndexError::corrupt(
                    "variable-length value starts with a zero group",
                ));
            }
            current = (current << 7) | (byte & GROUP_MASK) as u64;
            if current > DocId::MAX as u64 {
                return Err(IndexError::corrupt("variable-length value overflows 32 bits"));
            }

            if byte & CONTINUATION != 0 {
                pending = true;
                continue;
            }

            offset += current;
            if offset > DocId::MAX as u64 {
                return Err(IndexError::corrupt("delta sum overflows 32 bits"));
            }
            values.push(offset as DocId);
            current = 0;
            pending = false;
        }

        if pending {
            return Err(IndexError::corrupt(
                "byte range ends in the middle of a variable-length value",
            ));
        }

        Ok(values)
    }

    fn name(&self) -> &'static str {
        "delta-varlen"
    }

    fn boxed_clone(&self) -> Box<dyn PostingCodec> {
        Box::new(*self)
    }
}
