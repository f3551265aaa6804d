//! Thin wrappers around the varint primitives for standalone
//! length-delimiter use (e.g. framing a stream of length-prefixed
//! messages), mirroring the corpus's own public helpers of the same name.

use bytes::{Buf, BufMut};

use crate::error::WireError;
use crate::wire::varint::{decode_varint, encode_varint, encoded_len_varint};

pub fn encode_length_delimiter(length: usize, buf: &mut impl BufMut) {
    encode_varint(length as u64, buf);
}

pub fn length_delimiter_len(length: usize) -> usize {
    encoded_len_varint(length as u64)
}

pub fn decode_length_delimiter(buf: &mut impl Buf) -> Result<usize, WireError> {
    let length = decode_varint(buf)?;
    usize::try_from(length).map_err(|_| WireError::truncated())
}
