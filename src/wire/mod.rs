//! Binary wire-format primitives: varint, zigzag, fixed-width and
//! length-delimited encoding, the tag/wire-type table, and a bounded
//! recursion guard shared by the [`crate::marshal::Marshaller`] and
//! [`crate::unmarshal::Unmarshaller`].

pub mod length_delimiter;
pub mod varint;
pub mod wire_type;
pub mod zigzag;

pub use length_delimiter::{decode_length_delimiter, encode_length_delimiter, length_delimiter_len};
pub use varint::{decode_varint, encode_varint, encoded_len_varint};
pub use wire_type::{decode_key, encode_key, expected_wire_type, WireType};
pub use zigzag::{decode_zigzag32, decode_zigzag64, encode_zigzag32, encode_zigzag64};

use bytes::{Buf, BufMut};

use crate::error::WireError;

/// The default nesting bound for both validation and decoding,
/// matching the corpus's own default recursion limit.
pub const DEFAULT_MAX_DEPTH: u32 = 100;

/// Tracks remaining recursion budget across nested-message decode/validate
/// calls. Cloned (not shared) per branch, since sibling sub-messages at the
/// same depth should each see the same remaining budget.
#[derive(Clone, Copy, Debug)]
pub struct RecursionGuard {
    remaining: u32,
}

impl RecursionGuard {
    pub fn new(max_depth: u32) -> Self {
        RecursionGuard { remaining: max_depth }
    }

    /// Consumes one level of depth budget for entering a nested message.
    /// Returns a guard with the remaining budget, or a `ValidationError` if
    /// the bound is already exhausted.
    pub fn enter(self, field_name: &str) -> Result<RecursionGuard, WireError> {
        if self.remaining == 0 {
            return Err(WireError::validation(field_name, "max depth"));
        }
        Ok(RecursionGuard {
            remaining: self.remaining - 1,
        })
    }
}

pub fn read_fixed32(buf: &mut impl Buf) -> Result<u32, WireError> {
    if buf.remaining() < 4 {
        return Err(WireError::truncated());
    }
    Ok(buf.get_u32_le())
}

pub fn write_fixed32(value: u32, buf: &mut impl BufMut) {
    buf.put_u32_le(value);
}

pub fn read_fixed64(buf: &mut impl Buf) -> Result<u64, WireError> {
    if buf.remaining() < 8 {
        return Err(WireError::truncated());
    }
    Ok(buf.get_u64_le())
}

pub fn write_fixed64(value: u64, buf: &mut impl BufMut) {
    buf.put_u64_le(value);
}

/// Reads a length-delimited payload's raw bytes (length prefix + exactly
/// that many bytes), advancing `buf` past it.
pub fn read_length_delimited(buf: &mut impl Buf) -> Result<bytes::Bytes, WireError> {
    let length = decode_length_delimiter(buf)?;
    if buf.remaining() < length {
        return Err(WireError::truncated());
    }
    Ok(buf.copy_to_bytes(length))
}

/// Skips one field's payload without interpreting it, used for unknown
/// fields when `skip_unknown_fields=true` and for legacy groups. `StartGroup`
/// walks forward tracking nesting to find the matching `EndGroup`.
pub fn skip_field(wire_type: WireType, buf: &mut impl Buf) -> Result<(), WireError> {
    match wire_type {
        WireType::Varint => {
            decode_varint(buf)?;
        }
        WireType::Fixed32 => {
            read_fixed32(buf)?;
        }
        WireType::Fixed64 => {
            read_fixed64(buf)?;
        }
        WireType::LengthDelimited => {
            read_length_delimited(buf)?;
        }
        WireType::StartGroup => {
            let mut depth = 1u32;
            while depth > 0 {
                if !buf.has_remaining() {
                    return Err(WireError::truncated());
                }
                let key = decode_varint(buf)?;
                let (_, inner_type) = decode_key(key)?;
                match inner_type {
                    WireType::StartGroup => depth += 1,
                    WireType::EndGroup => depth -= 1,
                    other if depth > 0 => skip_field(other, buf)?,
                    _ => {}
                }
            }
        }
        WireType::EndGroup => {
            return Err(WireError::unsupported_wire_type());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn recursion_guard_rejects_past_bound() {
        let guard = RecursionGuard::new(1);
        let guard = guard.enter("a").unwrap();
        assert!(guard.enter("b").is_err());
    }

    #[test]
    fn skip_field_varint() {
        let mut buf = BytesMut::new();
        encode_varint(300, &mut buf);
        let mut reader = buf.freeze();
        skip_field(WireType::Varint, &mut reader).unwrap();
        assert!(!reader.has_remaining());
    }

    #[test]
    fn skip_field_length_delimited() {
        let mut buf = BytesMut::new();
        encode_length_delimiter(3, &mut buf);
        buf.extend_from_slice(b"abc");
        let mut reader = buf.freeze();
        skip_field(WireType::LengthDelimited, &mut reader).unwrap();
        assert!(!reader.has_remaining());
    }

    #[test]
    fn skip_field_nested_group() {
        let mut buf = BytesMut::new();
        // Outer start-group already consumed by caller; payload is an
        // inner start/end group pair followed by a varint field, then the
        // matching outer end-group tag.
        encode_varint(encode_key(2, WireType::StartGroup), &mut buf);
        encode_varint(encode_key(2, WireType::EndGroup), &mut buf);
        encode_varint(encode_key(3, WireType::Varint), &mut buf);
        encode_varint(7, &mut buf);
        encode_varint(encode_key(1, WireType::EndGroup), &mut buf);
        let mut reader = buf.freeze();
        skip_field(WireType::StartGroup, &mut reader).unwrap();
        assert!(!reader.has_remaining());
    }
}
