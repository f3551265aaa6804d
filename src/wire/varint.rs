//! LEB128 varint encode/decode, adapted from the corpus's hand-tuned
//! implementation but simplified to the safe, portable path throughout:
//! this engine favors one obviously-correct code path over a fast/slow
//! split, since the wire codec here is driven by dynamic descriptors rather
//! than monomorphized per-field codegen.

use bytes::{Buf, BufMut};

use crate::error::WireError;

/// Encodes `value` as a LEB128 varint into `buf`.
pub fn encode_varint(mut value: u64, buf: &mut impl BufMut) {
    loop {
        if value < 0x80 {
            buf.put_u8(value as u8);
            break;
        } else {
            buf.put_u8(((value & 0x7f) | 0x80) as u8);
            value >>= 7;
        }
    }
}

/// Number of bytes `encode_varint` would write for `value`.
pub fn encoded_len_varint(value: u64) -> usize {
    // Safe, portable restatement of the corpus's leading-zeros formula.
    let bits = 64 - value.leading_zeros() as usize;
    if bits == 0 {
        1
    } else {
        (bits + 6) / 7
    }
}

/// Decodes a LEB128 varint from the front of `buf`, advancing it past the
/// consumed bytes. Fails `MalformedVarint` past 10 bytes or on overflow of
/// the 64-bit accumulator.
pub fn decode_varint(buf: &mut impl Buf) -> Result<u64, WireError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for _ in 0..10 {
        if !buf.has_remaining() {
            return Err(WireError::malformed_varint());
        }
        let byte = buf.get_u8();
        if shift == 63 && byte > 1 {
            return Err(WireError::malformed_varint());
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
    Err(WireError::malformed_varint())
}
