//! [`Validator`] and [`ValidationOptions`]: per-field and
//! whole-message validation with configurable strictness.

use crate::descriptor::{FieldDescriptor, FieldType};
use crate::error::WireError;
use crate::message::DynamicMessage;
use crate::value::Value;
use crate::wire::{RecursionGuard, DEFAULT_MAX_DEPTH};

/// Configuration for [`Validator`].
#[derive(Clone, Copy, Debug)]
pub struct ValidationOptions {
    pub validate_enum_values: bool,
    pub validate_utf8: bool,
    pub max_recursion_depth: u32,
    pub validate_repeated_elements: bool,
    pub validate_map_entries: bool,
    pub detect_circular_references: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            validate_enum_values: true,
            validate_utf8: true,
            max_recursion_depth: DEFAULT_MAX_DEPTH,
            validate_repeated_elements: true,
            validate_map_entries: true,
            detect_circular_references: false,
        }
    }
}

/// Validates `Value`s against field shapes, in either lenient (coercive,
/// used by `set`) or strict (exact-variant, used by the Marshaller) mode.
pub struct Validator {
    options: ValidationOptions,
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Self {
        Validator { options }
    }

    /// Lenient per-field-type acceptance table: accepts coercible
    /// variants (e.g. a numeric string for an int32 field) and returns the
    /// value unchanged (coercion itself is `Value::convert_to`'s job).
    pub fn validate_field(
        &self,
        field: &FieldDescriptor,
        value: &Value,
    ) -> Result<(), WireError> {
        self.validate_field_at_depth(field, value, RecursionGuard::new(self.options.max_recursion_depth))
    }

    fn validate_field_at_depth(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        depth: RecursionGuard,
    ) -> Result<(), WireError> {
        match value {
            Value::Repeated(items) => {
                if !field.is_repeated() {
                    return Err(WireError::type_mismatch(field.name(), "repeated", "non-repeated"));
                }
                if self.options.validate_repeated_elements {
                    for item in items {
                        self.validate_singular(field, item, depth)?;
                    }
                }
                Ok(())
            }
            Value::Map(entries) => {
                if !field.is_map() {
                    return Err(WireError::type_mismatch(field.name(), "map", "non-map"));
                }
                if self.options.validate_map_entries {
                    for value in entries.values() {
                        self.validate_singular(field, value, depth)?;
                    }
                }
                Ok(())
            }
            other => self.validate_singular(field, other, depth),
        }
    }

    fn validate_singular(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        depth: RecursionGuard,
    ) -> Result<(), WireError> {
        match field.field_type() {
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => value
                .as_i32()
                .map(|_| ())
                .ok_or_else(|| mismatch(field, "int32", value)),
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => value
                .as_i64()
                .map(|_| ())
                .ok_or_else(|| mismatch(field, "int64", value)),
            FieldType::UInt32 | FieldType::Fixed32 => value
                .as_u32()
                .map(|_| ())
                .ok_or_else(|| mismatch(field, "uint32", value)),
            FieldType::UInt64 | FieldType::Fixed64 => value
                .as_u64()
                .map(|_| ())
                .ok_or_else(|| mismatch(field, "uint64", value)),
            FieldType::Float => value
                .as_f32()
                .map(|_| ())
                .ok_or_else(|| mismatch(field, "float", value)),
            FieldType::Double => value
                .as_f64()
                .map(|_| ())
                .ok_or_else(|| mismatch(field, "double", value)),
            FieldType::Bool => value
                .as_bool()
                .map(|_| ())
                .ok_or_else(|| mismatch(field, "bool", value)),
            FieldType::String => {
                let text = match value {
                    Value::String(s) => Some(s.clone()),
                    Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::Double(_) | Value::Bool(_) => {
                        Some(value.as_string())
                    }
                    _ => None,
                };
                let text = text.ok_or_else(|| mismatch(field, "string", value))?;
                if self.options.validate_utf8 && std::str::from_utf8(text.as_bytes()).is_err() {
                    return Err(WireError::invalid_utf8());
                }
                Ok(())
            }
            FieldType::Bytes => {
                if value.to_bytes().is_some() {
                    Ok(())
                } else {
                    Err(mismatch(field, "bytes", value))
                }
            }
            FieldType::Message => match value {
                Value::Message(m) => {
                    let target = field
                        .message_type()
                        .ok_or_else(|| WireError::invalid_message_type())?;
                    if m.descriptor().full_name() != target.full_name() {
                        return Err(mismatch(field, target.full_name(), value));
                    }
                    let next_depth = depth.enter(field.name())?;
                    self.validate_message_at_depth(m, next_depth)
                }
                _ => Err(mismatch(field, "message", value)),
            },
            FieldType::Enum => match value {
                Value::Enum { name, number, descriptor } => {
                    if self.options.validate_enum_values
                        && descriptor.value_by_number(*number).is_none()
                        && descriptor.value_by_name(name).is_none()
                    {
                        return Err(WireError::validation(field.name(), "enum value not in descriptor"));
                    }
                    Ok(())
                }
                Value::Int(n) => {
                    if self.options.validate_enum_values {
                        let target = field.enum_type().ok_or_else(WireError::invalid_message_type)?;
                        if target.value_by_number(*n as i32).is_none() {
                            return Err(WireError::validation(field.name(), "enum value not in descriptor"));
                        }
                    }
                    Ok(())
                }
                Value::String(name) => {
                    if self.options.validate_enum_values {
                        let target = field.enum_type().ok_or_else(WireError::invalid_message_type)?;
                        if target.value_by_name(name).is_none() {
                            return Err(WireError::validation(field.name(), "enum name not in descriptor"));
                        }
                    }
                    Ok(())
                }
                _ => Err(mismatch(field, "enum", value)),
            },
            FieldType::Group | FieldType::Unknown => Err(WireError::unsupported_type()),
        }
    }

    /// Strict serialization validation used by the Marshaller: exact
    /// variant match only, no coercion.
    pub fn validate_strict_field(
        &self,
        field: &FieldDescriptor,
        value: &Value,
    ) -> Result<(), WireError> {
        self.validate_strict_field_at_depth(
            field,
            value,
            RecursionGuard::new(self.options.max_recursion_depth),
        )
    }

    fn validate_strict_field_at_depth(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        depth: RecursionGuard,
    ) -> Result<(), WireError> {
        match value {
            Value::Repeated(items) => {
                if !field.is_repeated() {
                    return Err(WireError::type_mismatch(field.name(), "repeated", "non-repeated"));
                }
                for item in items {
                    self.validate_strict_singular(field, item, depth)?;
                }
                Ok(())
            }
            Value::Map(entries) => {
                if !field.is_map() {
                    return Err(WireError::type_mismatch(field.name(), "map", "non-map"));
                }
                for value in entries.values() {
                    self.validate_strict_singular(field, value, depth)?;
                }
                Ok(())
            }
            other => self.validate_strict_singular(field, other, depth),
        }
    }

    fn validate_strict_singular(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        depth: RecursionGuard,
    ) -> Result<(), WireError> {
        let matches = match field.field_type() {
            FieldType::Int32 | FieldType::Int64 | FieldType::SInt32 | FieldType::SInt64
            | FieldType::SFixed32 | FieldType::SFixed64 => matches!(value, Value::Int(_)),
            FieldType::UInt32 | FieldType::UInt64 | FieldType::Fixed32 | FieldType::Fixed64 => {
                matches!(value, Value::UInt(_))
            }
            FieldType::Float => matches!(value, Value::Float(_)),
            FieldType::Double => matches!(value, Value::Double(_)),
            FieldType::Bool => matches!(value, Value::Bool(_)),
            FieldType::String => matches!(value, Value::String(_)),
            FieldType::Bytes => matches!(value, Value::Bytes(_)),
            FieldType::Message => match value {
                Value::Message(m) => field
                    .message_type()
                    .is_some_and(|t| t.full_name() == m.descriptor().full_name()),
                _ => false,
            },
            FieldType::Enum => matches!(value, Value::Enum { .. }),
            FieldType::Group | FieldType::Unknown => false,
        };
        if !matches {
            return Err(mismatch(field, field.field_type().description(), value));
        }
        if let Value::Message(m) = value {
            let next_depth = depth.enter(field.name())?;
            self.validate_strict_message_at_depth(m, next_depth)?;
        }
        Ok(())
    }

    /// Validates every populated field of `message` against its descriptor,
    /// lenient (coercive) mode — the mode `set` uses.
    pub fn validate_message(&self, message: &DynamicMessage) -> Result<(), WireError> {
        self.validate_message_at_depth(message, RecursionGuard::new(self.options.max_recursion_depth))
    }

    /// Validates every populated field of `message` against its descriptor,
    /// strict (exact-variant) mode — the mode serialization uses.
    pub fn validate_strict_message(&self, message: &DynamicMessage) -> Result<(), WireError> {
        self.validate_strict_message_at_depth(
            message,
            RecursionGuard::new(self.options.max_recursion_depth),
        )
    }

    fn validate_strict_message_at_depth(
        &self,
        message: &DynamicMessage,
        depth: RecursionGuard,
    ) -> Result<(), WireError> {
        for (number, value) in message.known_fields() {
            let field = message
                .descriptor()
                .field_by_number(number)
                .ok_or_else(|| WireError::invalid_field_key())?;
            self.validate_strict_field_at_depth(field, value, depth)?;
        }
        Ok(())
    }

    fn validate_message_at_depth(
        &self,
        message: &DynamicMessage,
        depth: RecursionGuard,
    ) -> Result<(), WireError> {
        // `detect_circular_references` has no extra work to do here: a
        // `DynamicMessage` exclusively owns its value tree (no shared
        // mutable sub-message), so an actual reference cycle cannot be
        // constructed in the first place. The depth bound below is what
        // actually guards against runaway recursion on self-referential
        // descriptors (e.g. a linked-list-shaped message type).
        for (number, value) in message.known_fields() {
            let field = message
                .descriptor()
                .field_by_number(number)
                .ok_or_else(|| WireError::invalid_field_key())?;
            self.validate_field_at_depth(field, value, depth)?;
        }
        Ok(())
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }
}

fn mismatch(field: &FieldDescriptor, expected: &str, got: &Value) -> WireError {
    WireError::type_mismatch(field.name(), expected, got.as_string())
}

/// Returns the proto3 zero value for a scalar `field_type`, used to detect
/// default-elision candidates. Message and group
/// types have no zero value here; callers treat presence as always
/// non-default for them.
pub fn proto3_default(field_type: FieldType) -> Option<Value> {
    match field_type {
        FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => Some(Value::Int(0)),
        FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => Some(Value::Int(0)),
        FieldType::UInt32 | FieldType::Fixed32 => Some(Value::UInt(0)),
        FieldType::UInt64 | FieldType::Fixed64 => Some(Value::UInt(0)),
        FieldType::Float => Some(Value::Float(0.0)),
        FieldType::Double => Some(Value::Double(0.0)),
        FieldType::Bool => Some(Value::Bool(false)),
        FieldType::String => Some(Value::String(String::new())),
        FieldType::Bytes => Some(Value::Bytes(bytes::Bytes::new())),
        FieldType::Enum => None,
        FieldType::Message | FieldType::Group | FieldType::Unknown => None,
    }
}

/// Whether `value` equals `field`'s proto3 default, used by the Marshaller
/// to elide default scalars unless `preserve_proto3_defaults` is set.
pub fn is_proto3_default(field: &FieldDescriptor, value: &Value) -> bool {
    if field.is_repeated() {
        return matches!(value, Value::Repeated(items) if items.is_empty());
    }
    if field.is_map() {
        return matches!(value, Value::Map(entries) if entries.is_empty());
    }
    match field.field_type() {
        FieldType::Enum => matches!(value, Value::Enum { number: 0, .. }),
        // A present sub-message is always non-default.
        FieldType::Message => false,
        other => proto3_default(other).as_ref() == Some(value),
    }
}
