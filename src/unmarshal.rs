//! [`Unmarshaller`]: parses bytes into a [`DynamicMessage`].

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::{Buf, Bytes};

use crate::descriptor::{FieldDescriptor, FieldType, MessageDescriptor};
use crate::error::WireError;
use crate::message::DynamicMessage;
use crate::options::SerializeOptions;
use crate::validate::Validator;
use crate::value::Value;
use crate::wire::wire_type::{decode_key, expected_wire_type, WireType};
use crate::wire::zigzag::{decode_zigzag32, decode_zigzag64};
use crate::wire::{
    decode_varint, read_fixed32, read_fixed64, read_length_delimited, skip_field, RecursionGuard,
};

/// Parses the canonical Protobuf binary wire format into a
/// [`DynamicMessage`] against a known [`MessageDescriptor`].
pub struct Unmarshaller {
    options: SerializeOptions,
}

/// Per-field accumulation state while decoding one message.
enum Accumulator {
    Repeated(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Unmarshaller {
    pub fn new(options: SerializeOptions) -> Self {
        Unmarshaller { options }
    }

    /// Parses `bytes` against `descriptor` into a new [`DynamicMessage`].
    pub fn unmarshal(
        &self,
        bytes: &[u8],
        descriptor: Arc<MessageDescriptor>,
    ) -> Result<DynamicMessage, WireError> {
        let mut buf = Bytes::copy_from_slice(bytes);
        let depth = RecursionGuard::new(self.options.max_depth);
        self.unmarshal_at_depth(&mut buf, descriptor, depth)
    }

    fn unmarshal_at_depth(
        &self,
        buf: &mut Bytes,
        descriptor: Arc<MessageDescriptor>,
        depth: RecursionGuard,
    ) -> Result<DynamicMessage, WireError> {
        let mut message = DynamicMessage::new(descriptor.clone());
        let mut accumulators: std::collections::HashMap<u32, Accumulator> =
            std::collections::HashMap::new();

        while buf.has_remaining() {
            let key = decode_varint(buf)?;
            let (field_number, wire_type) = decode_key(key)?;

            let Some(field) = descriptor.field_by_number(field_number) else {
                if self.options.skip_unknown_fields || wire_type == WireType::StartGroup {
                    // Legacy groups are recognized only for skipping: there is no length prefix to echo back
                    // verbatim, so an unknown group field is dropped rather
                    // than partially captured.
                    skip_field(wire_type, buf)?;
                } else {
                    let mut segment = Vec::new();
                    encode_key_bytes(field_number, wire_type, &mut segment);
                    capture_payload(wire_type, buf, &mut segment)?;
                    message.set_unknown_field(field_number, Bytes::from(segment));
                }
                continue;
            };

            if field.is_map() {
                if wire_type != WireType::LengthDelimited {
                    skip_field(wire_type, buf)?;
                    continue;
                }
                let payload = read_length_delimited(buf)?;
                let (key_str, value) = self.decode_map_entry(field, payload, depth)?;
                match accumulators
                    .entry(field_number)
                    .or_insert_with(|| Accumulator::Map(BTreeMap::new()))
                {
                    Accumulator::Map(map) => {
                        map.insert(key_str, value);
                    }
                    Accumulator::Repeated(_) => unreachable!("map field never mixes with repeated accumulator"),
                }
                continue;
            }

            let expected = expected_wire_type(field.field_type());
            // Packed numeric repeated fields arrive length-delimited even
            // though their element type expects VARINT/FIXED32/FIXED64; the
            // decoder accepts both forms regardless of any packing option.
            if field.is_repeated()
                && wire_type == WireType::LengthDelimited
                && field.field_type().is_packable()
                && expected != Some(WireType::LengthDelimited)
            {
                let payload = read_length_delimited(buf)?;
                let mut reader = payload;
                let mut decoded = Vec::new();
                while reader.has_remaining() {
                    decoded.push(self.decode_scalar(field, expected.unwrap(), &mut reader, depth)?);
                }
                match accumulators
                    .entry(field_number)
                    .or_insert_with(|| Accumulator::Repeated(Vec::new()))
                {
                    Accumulator::Repeated(items) => items.extend(decoded),
                    Accumulator::Map(_) => unreachable!(),
                }
                continue;
            }

            if let Some(expected) = expected {
                if expected != wire_type {
                    // Tolerant decode: skip fields
                    // whose wire type doesn't match what the descriptor
                    // expects, rather than surfacing an error.
                    skip_field(wire_type, buf)?;
                    continue;
                }
            }

            let value = self.decode_scalar(field, wire_type, buf, depth)?;

            if field.is_repeated() {
                match accumulators
                    .entry(field_number)
                    .or_insert_with(|| Accumulator::Repeated(Vec::new()))
                {
                    Accumulator::Repeated(items) => items.push(value),
                    Accumulator::Map(_) => unreachable!(),
                }
            } else {
                // Last-wins semantics for a repeated singular occurrence.
                message.set_by_number(field_number, value)?;
            }
        }

        for (number, accumulator) in accumulators {
            let value = match accumulator {
                Accumulator::Repeated(items) => Value::Repeated(items),
                Accumulator::Map(entries) => Value::Map(entries),
            };
            message.set_by_number(number, value)?;
        }

        if self.options.validate_fields {
            let validator = Validator::new(self.options.to_validation_options());
            validator.validate_message(&message)?;
        }

        Ok(message)
    }

    fn decode_map_entry(
        &self,
        field: &FieldDescriptor,
        payload: Bytes,
        depth: RecursionGuard,
    ) -> Result<(String, Value), WireError> {
        let entry_descriptor = Arc::new(
            crate::descriptor::build_map_entry_descriptor(
                field.name(),
                FieldType::String,
                field.field_type(),
                field.message_type().cloned(),
                field.enum_type().cloned(),
            )
            .map_err(|_| WireError::invalid_message_type())?,
        );
        let next_depth = depth.enter(field.name())?;
        let mut reader = payload;
        let entry = self.unmarshal_at_depth(&mut reader, entry_descriptor, next_depth)?;
        let key = entry
            .get_by_number(1)
            .map(Value::as_string)
            .unwrap_or_default();
        let value = entry
            .get_by_number(2)
            .cloned()
            .unwrap_or_else(|| crate::validate::proto3_default(field.field_type()).unwrap_or(Value::String(String::new())));
        Ok((key, value))
    }

    fn decode_scalar(
        &self,
        field: &FieldDescriptor,
        wire_type: WireType,
        buf: &mut Bytes,
        depth: RecursionGuard,
    ) -> Result<Value, WireError> {
        match field.field_type() {
            FieldType::Int32 | FieldType::Int64 => {
                let n = decode_varint(buf)?;
                Ok(Value::Int(n as i64))
            }
            FieldType::UInt32 | FieldType::UInt64 => {
                let n = decode_varint(buf)?;
                Ok(Value::UInt(n))
            }
            FieldType::SInt32 => {
                let n = decode_varint(buf)?;
                Ok(Value::Int(decode_zigzag32(n as u32) as i64))
            }
            FieldType::SInt64 => {
                let n = decode_varint(buf)?;
                Ok(Value::Int(decode_zigzag64(n)))
            }
            FieldType::Bool => {
                let n = decode_varint(buf)?;
                Ok(Value::Bool(n != 0))
            }
            FieldType::Enum => {
                let n = decode_varint(buf)?;
                let number = n as i32;
                match field.enum_type() {
                    Some(descriptor) => {
                        let name = descriptor
                            .value_by_number(number)
                            .map(|v| v.name().to_string())
                            .unwrap_or_default();
                        Ok(Value::Enum {
                            name,
                            number,
                            descriptor: descriptor.clone(),
                        })
                    }
                    None => Err(WireError::invalid_message_type()),
                }
            }
            FieldType::Fixed32 => read_fixed32(buf).map(|n| Value::UInt(n as u64)),
            FieldType::SFixed32 => read_fixed32(buf).map(|n| Value::Int(n as i32 as i64)),
            FieldType::Float => {
                let n = read_fixed32(buf)?;
                Ok(Value::Float(f32::from_bits(n)))
            }
            FieldType::Fixed64 => read_fixed64(buf).map(Value::UInt),
            FieldType::SFixed64 => read_fixed64(buf).map(|n| Value::Int(n as i64)),
            FieldType::Double => {
                let n = read_fixed64(buf)?;
                Ok(Value::Double(f64::from_bits(n)))
            }
            FieldType::String => {
                debug_assert_eq!(wire_type, WireType::LengthDelimited);
                let payload = read_length_delimited(buf)?;
                if self.options.validate_utf8 {
                    let text = std::str::from_utf8(&payload).map_err(|_| WireError::invalid_utf8())?;
                    Ok(Value::String(text.to_string()))
                } else {
                    Ok(Value::String(String::from_utf8_lossy(&payload).into_owned()))
                }
            }
            FieldType::Bytes => {
                debug_assert_eq!(wire_type, WireType::LengthDelimited);
                Ok(Value::Bytes(read_length_delimited(buf)?))
            }
            FieldType::Message => {
                debug_assert_eq!(wire_type, WireType::LengthDelimited);
                let target = field
                    .message_type()
                    .cloned()
                    .ok_or_else(WireError::invalid_message_type)?;
                let payload = read_length_delimited(buf)?;
                let next_depth = depth.enter(field.name())?;
                let mut reader = payload;
                let nested = self.unmarshal_at_depth(&mut reader, target, next_depth)?;
                Ok(Value::Message(nested))
            }
            FieldType::Group | FieldType::Unknown => Err(WireError::unsupported_wire_type()),
        }
    }
}

fn encode_key_bytes(field_number: u32, wire_type: WireType, out: &mut Vec<u8>) {
    let key = crate::wire::wire_type::encode_key(field_number, wire_type);
    crate::wire::encode_varint(key, out);
}

/// Copies one field's raw payload bytes (without re-interpreting them) into
/// `out`, used to capture unknown-field segments verbatim for echo-back.
fn capture_payload(wire_type: WireType, buf: &mut Bytes, out: &mut Vec<u8>) -> Result<(), WireError> {
    match wire_type {
        WireType::Varint => {
            let start = buf.clone();
            let value = decode_varint(buf)?;
            let consumed = start.remaining() - buf.remaining();
            out.extend_from_slice(&start[..consumed]);
            let _ = value;
        }
        WireType::Fixed32 => {
            let n = read_fixed32(buf)?;
            out.extend_from_slice(&n.to_le_bytes());
        }
        WireType::Fixed64 => {
            let n = read_fixed64(buf)?;
            out.extend_from_slice(&n.to_le_bytes());
        }
        WireType::LengthDelimited => {
            let payload = read_length_delimited(buf)?;
            crate::wire::encode_length_delimiter(payload.len(), out);
            out.extend_from_slice(&payload);
        }
        WireType::StartGroup | WireType::EndGroup => {
            return Err(WireError::unsupported_wire_type())
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{build_field_descriptor, build_message_descriptor};

    fn person_descriptor() -> Arc<MessageDescriptor> {
        let name =
            build_field_descriptor("name", 1, FieldType::String, false, false, None, None, None)
                .unwrap();
        let age =
            build_field_descriptor("age", 2, FieldType::Int32, false, false, None, None, None)
                .unwrap();
        Arc::new(build_message_descriptor("pkg.Person", vec![name, age], vec![], vec![]).unwrap())
    }

    #[test]
    fn primitive_round_trip() {
        let bytes = [0x0A, 0x05, 0x41, 0x6C, 0x69, 0x63, 0x65, 0x10, 0x1E];
        let unmarshaller = Unmarshaller::new(SerializeOptions::default());
        let message = unmarshaller.unmarshal(&bytes, person_descriptor()).unwrap();
        assert_eq!(message.get("name"), Some(&Value::String("Alice".to_string())));
        assert_eq!(message.get("age"), Some(&Value::Int(30)));
    }

    #[test]
    fn repeated_preserves_wire_order() {
        let values =
            build_field_descriptor("values", 1, FieldType::Int32, true, false, None, None, None)
                .unwrap();
        let descriptor =
            Arc::new(build_message_descriptor("pkg.Scores", vec![values], vec![], vec![]).unwrap());
        let unmarshaller = Unmarshaller::new(SerializeOptions::default());

        let forward = [0x08, 0x01, 0x08, 0x02, 0x08, 0x03];
        let message = unmarshaller.unmarshal(&forward, descriptor.clone()).unwrap();
        assert_eq!(
            message.get("values"),
            Some(&Value::Repeated(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
        );

        let reversed = [0x08, 0x03, 0x08, 0x02, 0x08, 0x01];
        let message = unmarshaller.unmarshal(&reversed, descriptor).unwrap();
        assert_eq!(
            message.get("values"),
            Some(&Value::Repeated(vec![Value::Int(3), Value::Int(2), Value::Int(1)]))
        );
    }

    #[test]
    fn map_entry_round_trip() {
        let tags =
            build_field_descriptor("tags", 7, FieldType::String, false, true, None, None, None)
                .unwrap();
        let descriptor =
            Arc::new(build_message_descriptor("pkg.Attrs", vec![tags], vec![], vec![]).unwrap());
        let bytes = [0x3A, 0x06, 0x0A, 0x01, 0x6B, 0x12, 0x01, 0x76];
        let unmarshaller = Unmarshaller::new(SerializeOptions::default());
        let message = unmarshaller.unmarshal(&bytes, descriptor).unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("k".to_string(), Value::String("v".to_string()));
        assert_eq!(message.get("tags"), Some(&Value::Map(expected)));
    }

    #[test]
    fn unknown_field_preserved() {
        let a = build_field_descriptor("x", 1, FieldType::Int32, false, false, None, None, None)
            .unwrap();
        let descriptor = Arc::new(build_message_descriptor("pkg.A", vec![a], vec![], vec![]).unwrap());
        let mut bytes = vec![0x08, 0x07];
        bytes.extend_from_slice(&[0x9A, 0x06, 0x02, b'h', b'i']);
        let options = SerializeOptions {
            skip_unknown_fields: false,
            ..SerializeOptions::default()
        };
        let unmarshaller = Unmarshaller::new(options);
        let message = unmarshaller.unmarshal(&bytes, descriptor).unwrap();
        assert!(message.has_unknown_fields());
        let collected: Vec<u32> = message.unknown_fields().map(|(n, _)| n).collect();
        assert_eq!(collected, vec![99]);
    }

    #[test]
    fn utf8_rejection() {
        let name =
            build_field_descriptor("name", 1, FieldType::String, false, false, None, None, None)
                .unwrap();
        let descriptor =
            Arc::new(build_message_descriptor("pkg.S", vec![name], vec![], vec![]).unwrap());
        let bytes = [0x0A, 0x02, 0xFF, 0xFE];

        let strict = Unmarshaller::new(SerializeOptions {
            validate_fields: false,
            ..SerializeOptions::default()
        });
        assert!(strict.unmarshal(&bytes, descriptor.clone()).is_err());

        let lenient = Unmarshaller::new(SerializeOptions {
            validate_utf8: false,
            validate_fields: false,
            ..SerializeOptions::default()
        });
        assert!(lenient.unmarshal(&bytes, descriptor).is_ok());
    }

    #[test]
    fn last_wins_for_repeated_singular_occurrence() {
        let descriptor = person_descriptor();
        // age=1 then age=2.
        let bytes = [0x10, 0x01, 0x10, 0x02];
        let unmarshaller = Unmarshaller::new(SerializeOptions::default());
        let message = unmarshaller.unmarshal(&bytes, descriptor).unwrap();
        assert_eq!(message.get("age"), Some(&Value::Int(2)));
    }

    #[test]
    fn packed_bool_repeated_field_decodes() {
        // A conformant encoder may pack a repeated bool field into one
        // length-delimited payload; this must decode, not be skipped as an
        // unrecognized wire-type mismatch.
        let flags =
            build_field_descriptor("flags", 1, FieldType::Bool, true, false, None, None, None)
                .unwrap();
        let descriptor =
            Arc::new(build_message_descriptor("pkg.Flags", vec![flags], vec![], vec![]).unwrap());
        let bytes = [0x0A, 0x02, 0x01, 0x00];
        let unmarshaller = Unmarshaller::new(SerializeOptions::default());
        let message = unmarshaller.unmarshal(&bytes, descriptor).unwrap();
        assert_eq!(
            message.get("flags"),
            Some(&Value::Repeated(vec![Value::Bool(true), Value::Bool(false)]))
        );
    }

    #[test]
    fn tolerant_decode_skips_wire_type_mismatch() {
        let descriptor = person_descriptor();
        // Field 2 (age, expects VARINT) sent as a length-delimited field
        // instead; it should be skipped, leaving `age` unset.
        let mut bytes = vec![0x12, 0x02, b'h', b'i'];
        bytes.extend_from_slice(&[0x0A, 0x03, b'b', b'o', b'b']);
        let unmarshaller = Unmarshaller::new(SerializeOptions::default());
        let message = unmarshaller.unmarshal(&bytes, descriptor).unwrap();
        assert_eq!(message.get("age"), None);
        assert_eq!(message.get("name"), Some(&Value::String("bob".to_string())));
    }
}
