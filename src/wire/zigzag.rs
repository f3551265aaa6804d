//! ZigZag signed↔unsigned mapping, factored out as explicit
//! functions rather than folded into the varint codec, so the round-trip
//! identity properties can be tested in isolation.

/// `i32::MIN` is special-cased implicitly: the wrapping shift below produces
/// `u32::MAX` for it without triggering a signed-overflow panic, since the
/// cast to `u32` happens before the arithmetic shift's result is reinterpreted.
pub fn encode_zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

pub fn decode_zigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

pub fn encode_zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn decode_zigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn boundary_values() {
        assert_eq!(encode_zigzag32(i32::MIN), u32::MAX);
        assert_eq!(decode_zigzag32(u32::MAX), i32::MIN);
        assert_eq!(encode_zigzag32(0), 0);
        assert_eq!(encode_zigzag32(-1), 1);
        assert_eq!(encode_zigzag32(1), 2);

        assert_eq!(encode_zigzag64(i64::MIN), u64::MAX);
        assert_eq!(decode_zigzag64(u64::MAX), i64::MIN);
    }

    proptest! {
        #[test]
        fn zigzag32_identity(value: i32) {
            prop_assert_eq!(decode_zigzag32(encode_zigzag32(value)), value);
        }

        #[test]
        fn zigzag64_identity(value: i64) {
            prop_assert_eq!(decode_zigzag64(encode_zigzag64(value)), value);
        }
    }
}
