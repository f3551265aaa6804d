//! The wire-type table: the low 3 bits of every tag.

use crate::error::WireError;

/// How a field's payload is framed on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    pub fn from_u64(value: u64) -> Result<WireType, WireError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            _ => Err(WireError::unsupported_wire_type()),
        }
    }
}

/// Composes `(field_number << 3) | wire_type`. Callers are responsible for
/// checking `field_number` falls in `[1, 2^29-1]` before calling this.
pub fn encode_key(field_number: u32, wire_type: WireType) -> u64 {
    (u64::from(field_number) << 3) | wire_type as u64
}

/// Splits a decoded tag into `(field_number, wire_type)`.
pub fn decode_key(key: u64) -> Result<(u32, WireType), WireError> {
    let wire_type = WireType::from_u64(key & 0x7)?;
    let field_number = u32::try_from(key >> 3).map_err(|_| WireError::invalid_field_key())?;
    if field_number == 0 {
        return Err(WireError::invalid_field_key());
    }
    Ok((field_number, wire_type))
}

/// The wire type a given scalar [`crate::descriptor::FieldType`] expects.
pub fn expected_wire_type(field_type: crate::descriptor::FieldType) -> Option<WireType> {
    use crate::descriptor::FieldType;
    match field_type {
        FieldType::Int32
        | FieldType::Int64
        | FieldType::UInt32
        | FieldType::UInt64
        | FieldType::SInt32
        | FieldType::SInt64
        | FieldType::Bool
        | FieldType::Enum => Some(WireType::Varint),
        FieldType::Fixed64 | FieldType::SFixed64 | FieldType::Double => Some(WireType::Fixed64),
        FieldType::Fixed32 | FieldType::SFixed32 | FieldType::Float => Some(WireType::Fixed32),
        FieldType::String | FieldType::Bytes | FieldType::Message => {
            Some(WireType::LengthDelimited)
        }
        FieldType::Group | FieldType::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldType;

    #[test]
    fn key_round_trip() {
        let key = encode_key(5, WireType::LengthDelimited);
        assert_eq!(decode_key(key).unwrap(), (5, WireType::LengthDelimited));
    }

    #[test]
    fn rejects_unknown_wire_type_code() {
        assert!(WireType::from_u64(6).is_err());
        assert!(WireType::from_u64(7).is_err());
    }

    #[test]
    fn expected_wire_types_match_table() {
        assert_eq!(expected_wire_type(FieldType::Int32), Some(WireType::Varint));
        assert_eq!(expected_wire_type(FieldType::Double), Some(WireType::Fixed64));
        assert_eq!(expected_wire_type(FieldType::Float), Some(WireType::Fixed32));
        assert_eq!(
            expected_wire_type(FieldType::String),
            Some(WireType::LengthDelimited)
        );
        assert_eq!(expected_wire_type(FieldType::Group), None);
    }
}
