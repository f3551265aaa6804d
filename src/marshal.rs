//! [`Marshaller`]: serializes a [`DynamicMessage`] to bytes.

use bytes::{BufMut, BytesMut};

use crate::descriptor::{FieldDescriptor, FieldType, MessageDescriptor};
use crate::error::EncodeError;
use crate::message::DynamicMessage;
use crate::options::SerializeOptions;
use crate::pool::BufferPool;
use crate::validate::{is_proto3_default, Validator};
use crate::value::Value;
use crate::wire::wire_type::{encode_key, WireType};
use crate::wire::zigzag::{encode_zigzag32, encode_zigzag64};
use crate::wire::{encode_length_delimiter, encode_varint};

/// Serializes [`DynamicMessage`]s to the canonical Protobuf binary wire
/// format, per the options in a [`SerializeOptions`].
pub struct Marshaller {
    options: SerializeOptions,
    pool: BufferPool,
}

impl Marshaller {
    pub fn new(options: SerializeOptions) -> Self {
        Marshaller {
            options,
            pool: BufferPool::new(),
        }
    }

    /// Serializes `message` into a freshly allocated buffer.
    pub fn marshal(&self, message: &DynamicMessage) -> Result<Vec<u8>, EncodeError> {
        let mut buf = BytesMut::new();
        self.marshal_into(message, &mut buf)?;
        Ok(buf.to_vec())
    }

    /// Serializes `message`, appending to `buf`.
    pub fn marshal_into(
        &self,
        message: &DynamicMessage,
        buf: &mut BytesMut,
    ) -> Result<(), EncodeError> {
        if self.options.validate_fields {
            let validator = Validator::new(self.options.to_validation_options());
            validator
                .validate_strict_message(message)
                .map_err(EncodeError::from_wire)?;
        }

        let descriptor = message.descriptor();
        for (number, value) in message.known_fields() {
            let field = descriptor.field_by_number(number).ok_or_else(|| {
                EncodeError::from_wire(crate::error::WireError::invalid_field_key())
            })?;
            if !self.options.preserve_proto3_defaults && is_proto3_default(field, value) {
                continue;
            }
            self.write_field(field, value, buf)?;
        }

        if !self.options.skip_unknown_fields {
            for (_, segment) in message.unknown_fields() {
                buf.put_slice(segment);
            }
        }

        Ok(())
    }

    fn write_field(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        buf: &mut BytesMut,
    ) -> Result<(), EncodeError> {
        match value {
            Value::Repeated(items) => {
                if self.options.encode_packed_numeric && field.field_type().is_packable() {
                    self.write_packed(field, items, buf)
                } else {
                    for item in items {
                        self.write_singular(field, item, buf)?;
                    }
                    Ok(())
                }
            }
            Value::Map(entries) => {
                for (key, entry_value) in entries {
                    self.write_map_entry(field, key, entry_value, buf)?;
                }
                Ok(())
            }
            other => self.write_singular(field, other, buf),
        }
    }

    fn write_packed(
        &self,
        field: &FieldDescriptor,
        items: &[Value],
        buf: &mut BytesMut,
    ) -> Result<(), EncodeError> {
        let mut payload = BytesMut::new();
        for item in items {
            self.write_scalar_payload(field.field_type(), item, &mut payload)?;
        }
        encode_varint(
            encode_key(field.number(), WireType::LengthDelimited),
            buf,
        );
        encode_length_delimiter(payload.len(), buf);
        buf.put_slice(&payload);
        Ok(())
    }

    /// Marshals the synthetic `{1: key, 2: value}` entry message for one
    /// map element and emits it as a length-delimited sub-message under the
    /// map field's number.
    fn write_map_entry(
        &self,
        field: &FieldDescriptor,
        key: &str,
        value: &Value,
        buf: &mut BytesMut,
    ) -> Result<(), EncodeError> {
        // The descriptor-builder interface has no key-type slot, so
        // map keys are always string-typed on the wire here, matching
        // `Value::Map`'s `String`-keyed representation (DESIGN.md).
        let entry_descriptor = crate::descriptor::build_map_entry_descriptor(
            field.name(),
            FieldType::String,
            field.field_type(),
            field.message_type().cloned(),
            field.enum_type().cloned(),
        )
        .map_err(|_| EncodeError::unsupported_type())?;
        let key_field = entry_descriptor.field_by_number(1).unwrap();
        let value_field = entry_descriptor.field_by_number(2).unwrap();

        let mut scratch = self.take_scratch();
        self.write_singular(key_field, &key_value_for(key), &mut scratch)?;
        self.write_singular(value_field, value, &mut scratch)?;

        encode_varint(encode_key(field.number(), WireType::LengthDelimited), buf);
        encode_length_delimiter(scratch.len(), buf);
        buf.put_slice(&scratch);
        self.give_back_scratch(scratch);
        Ok(())
    }

    /// Borrows a scratch buffer from the pool when `use_buffer_pool` is set,
    /// or allocates fresh otherwise.
    fn take_scratch(&self) -> BytesMut {
        if self.options.use_buffer_pool {
            BytesMut::from(self.pool.take())
        } else {
            BytesMut::new()
        }
    }

    fn give_back_scratch(&self, scratch: BytesMut) {
        if self.options.use_buffer_pool {
            self.pool.give_back(scratch.to_vec());
        }
    }

    fn write_singular(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        buf: &mut BytesMut,
    ) -> Result<(), EncodeError> {
        match field.field_type() {
            FieldType::Group | FieldType::Unknown => return Err(EncodeError::unsupported_type()),
            FieldType::Message => {
                let Value::Message(inner) = value else {
                    return Err(EncodeError::unsupported_type());
                };
                let mut scratch = self.take_scratch();
                self.marshal_into(inner, &mut scratch)?;
                encode_varint(encode_key(field.number(), WireType::LengthDelimited), buf);
                encode_length_delimiter(scratch.len(), buf);
                buf.put_slice(&scratch);
                self.give_back_scratch(scratch);
                return Ok(());
            }
            _ => {}
        }

        let wire_type = crate::wire::wire_type::expected_wire_type(field.field_type())
            .ok_or_else(EncodeError::unsupported_type)?;
        encode_varint(encode_key(field.number(), wire_type), buf);
        self.write_scalar_payload(field.field_type(), value, buf)
    }

    fn write_scalar_payload(
        &self,
        field_type: FieldType,
        value: &Value,
        buf: &mut BytesMut,
    ) -> Result<(), EncodeError> {
        match field_type {
            FieldType::Int32 | FieldType::Int64 => {
                let n = value.as_i64().ok_or_else(EncodeError::unsupported_type)?;
                encode_varint(n as u64, buf);
            }
            FieldType::UInt32 | FieldType::UInt64 => {
                let n = value.as_u64().ok_or_else(EncodeError::unsupported_type)?;
                encode_varint(n, buf);
            }
            FieldType::SInt32 => {
                let n = value.as_i32().ok_or_else(EncodeError::unsupported_type)?;
                encode_varint(u64::from(encode_zigzag32(n)), buf);
            }
            FieldType::SInt64 => {
                let n = value.as_i64().ok_or_else(EncodeError::unsupported_type)?;
                encode_varint(encode_zigzag64(n), buf);
            }
            FieldType::Bool => {
                let b = value.as_bool().ok_or_else(EncodeError::unsupported_type)?;
                encode_varint(b as u64, buf);
            }
            FieldType::Enum => {
                let n = match value {
                    Value::Enum { number, .. } => *number,
                    _ => value.as_i32().ok_or_else(EncodeError::unsupported_type)?,
                };
                // Enum numbers are plain varints (two's complement, no
                // ZigZag), same as int32.
                encode_varint(n as i64 as u64, buf);
            }
            FieldType::Fixed32 => {
                let n = value.as_u32().ok_or_else(EncodeError::unsupported_type)?;
                buf.put_u32_le(n);
            }
            FieldType::SFixed32 => {
                let n = value.as_i32().ok_or_else(EncodeError::unsupported_type)?;
                buf.put_i32_le(n);
            }
            FieldType::Float => {
                let n = value.as_f32().ok_or_else(EncodeError::unsupported_type)?;
                buf.put_f32_le(n);
            }
            FieldType::Fixed64 => {
                let n = value.as_u64().ok_or_else(EncodeError::unsupported_type)?;
                buf.put_u64_le(n);
            }
            FieldType::SFixed64 => {
                let n = value.as_i64().ok_or_else(EncodeError::unsupported_type)?;
                buf.put_i64_le(n);
            }
            FieldType::Double => {
                let n = value.as_f64().ok_or_else(EncodeError::unsupported_type)?;
                buf.put_f64_le(n);
            }
            FieldType::String => {
                let bytes = value.to_bytes().ok_or_else(EncodeError::unsupported_type)?;
                encode_length_delimiter(bytes.len(), buf);
                buf.put_slice(&bytes);
            }
            FieldType::Bytes => {
                let bytes = value.to_bytes().ok_or_else(EncodeError::unsupported_type)?;
                encode_length_delimiter(bytes.len(), buf);
                buf.put_slice(&bytes);
            }
            FieldType::Message | FieldType::Group | FieldType::Unknown => {
                return Err(EncodeError::unsupported_type());
            }
        }
        Ok(())
    }

    pub fn options(&self) -> &SerializeOptions {
        &self.options
    }
}

fn key_value_for(key: &str) -> Value {
    Value::String(key.to_string())
}
