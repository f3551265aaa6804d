//! Schema objects: [`FieldType`], [`EnumDescriptor`], [`FieldDescriptor`], and
//! [`MessageDescriptor`].
//!
//! These are pure data, built once by a caller (typically from a compiled
//! `.proto` schema, though loading is out of scope here) and then shared by
//! reference for the lifetime of every message built against them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DescriptorError;

/// The closed set of Protobuf field kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Float,
    Double,
    Bool,
    String,
    Bytes,
    Message,
    Enum,
    /// Legacy proto2 group. Recognized only so the wire codec can skip it.
    Group,
    /// Placeholder for a field whose type could not be resolved; never
    /// produced by the builders in this module, reserved for unknown-field
    /// bookkeeping at the wire layer.
    Unknown,
}

impl FieldType {
    /// True for any integer or floating-point scalar kind.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_floating()
    }

    /// True for every scalar kind proto3 allows in packed-repeated form:
    /// the numeric kinds plus `bool` and `enum`, which are also
    /// VARINT-wire-typed and packable. Excludes `string`/`bytes` (already
    /// length-delimited) and `message`/`group`/`unknown`.
    pub fn is_packable(self) -> bool {
        self.is_numeric() || matches!(self, FieldType::Bool | FieldType::Enum)
    }

    /// True for any of the ten integer scalar kinds.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            FieldType::Int32
                | FieldType::Int64
                | FieldType::UInt32
                | FieldType::UInt64
                | FieldType::SInt32
                | FieldType::SInt64
                | FieldType::Fixed32
                | FieldType::Fixed64
                | FieldType::SFixed32
                | FieldType::SFixed64
        )
    }

    /// True for `float`/`double`.
    pub fn is_floating(self) -> bool {
        matches!(self, FieldType::Float | FieldType::Double)
    }

    /// True for `string`/`bytes`.
    pub fn is_string_or_bytes(self) -> bool {
        matches!(self, FieldType::String | FieldType::Bytes)
    }

    /// Short, stable, human-readable name, e.g. for use in error messages.
    pub fn description(self) -> &'static str {
        match self {
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::UInt32 => "uint32",
            FieldType::UInt64 => "uint64",
            FieldType::SInt32 => "sint32",
            FieldType::SInt64 => "sint64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Fixed64 => "fixed64",
            FieldType::SFixed32 => "sfixed32",
            FieldType::SFixed64 => "sfixed64",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Message => "message",
            FieldType::Enum => "enum",
            FieldType::Group => "group",
            FieldType::Unknown => "unknown",
        }
    }
}

/// One named value in an [`EnumDescriptor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValueDescriptor {
    name: String,
    number: i32,
}

impl EnumValueDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> i32 {
        self.number
    }
}

/// A named set of `{name, number}` pairs, e.g. a `.proto` `enum` block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    values: Vec<EnumValueDescriptor>,
}

impl EnumDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[EnumValueDescriptor] {
        &self.values
    }

    /// First value whose name matches, earliest-declared wins on alias.
    pub fn value_by_name(&self, name: &str) -> Option<&EnumValueDescriptor> {
        self.values.iter().find(|v| v.name == name)
    }

    /// First value whose number matches, earliest-declared wins on alias.
    pub fn value_by_number(&self, number: i32) -> Option<&EnumValueDescriptor> {
        self.values.iter().find(|v| v.number == number)
    }
}

/// Builds an [`EnumDescriptor`], failing if the name is empty, no values are
/// given, or any value name is empty.
pub fn build_enum_descriptor(
    name: impl Into<String>,
    values: Vec<(String, i32)>,
) -> Result<EnumDescriptor, DescriptorError> {
    let name = name.into();
    if name.is_empty() {
        return Err(DescriptorError::new("enum name must not be empty"));
    }
    if values.is_empty() {
        return Err(DescriptorError::new(format!(
            "enum '{name}' must declare at least one value"
        )));
    }
    let mut built = Vec::with_capacity(values.len());
    for (value_name, number) in values {
        if value_name.is_empty() {
            return Err(DescriptorError::new(format!(
                "enum '{name}' has a value with an empty name"
            )));
        }
        built.push(EnumValueDescriptor {
            name: value_name,
            number,
        });
    }
    Ok(EnumDescriptor {
        name,
        values: built,
    })
}

/// Metadata for one field of a [`MessageDescriptor`].
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    name: String,
    number: u32,
    field_type: FieldType,
    is_repeated: bool,
    is_map: bool,
    default_value: Option<crate::value::Value>,
    message_type: Option<Arc<MessageDescriptor>>,
    enum_type: Option<Arc<EnumDescriptor>>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_repeated(&self) -> bool {
        self.is_repeated
    }

    pub fn is_map(&self) -> bool {
        self.is_map
    }

    /// True for a singular (non-repeated, non-map) field.
    pub fn is_singular(&self) -> bool {
        !self.is_repeated && !self.is_map
    }

    pub fn default_value(&self) -> Option<&crate::value::Value> {
        self.default_value.as_ref()
    }

    pub fn message_type(&self) -> Option<&Arc<MessageDescriptor>> {
        self.message_type.as_ref()
    }

    pub fn enum_type(&self) -> Option<&Arc<EnumDescriptor>> {
        self.enum_type.as_ref()
    }
}

/// Builds a [`FieldDescriptor`], enforcing its shape invariants.
#[allow(clippy::too_many_arguments)]
pub fn build_field_descriptor(
    name: impl Into<String>,
    number: u32,
    field_type: FieldType,
    is_repeated: bool,
    is_map: bool,
    default_value: Option<crate::value::Value>,
    message_type: Option<Arc<MessageDescriptor>>,
    enum_type: Option<Arc<EnumDescriptor>>,
) -> Result<FieldDescriptor, DescriptorError> {
    let name = name.into();
    if name.is_empty() {
        return Err(DescriptorError::new("field name must not be empty"));
    }
    if number == 0 {
        return Err(DescriptorError::new(format!(
            "field '{name}' has non-positive field number"
        )));
    }
    if is_repeated && is_map {
        return Err(DescriptorError::new(format!(
            "field '{name}' cannot be both repeated and map"
        )));
    }
    if field_type == FieldType::Message && message_type.is_none() {
        return Err(DescriptorError::new(format!(
            "message-typed field '{name}' has no target descriptor"
        )));
    }
    if field_type == FieldType::Enum && enum_type.is_none() {
        return Err(DescriptorError::new(format!(
            "enum-typed field '{name}' has no target descriptor"
        )));
    }
    Ok(FieldDescriptor {
        name,
        number,
        field_type,
        is_repeated,
        is_map,
        default_value,
        message_type,
        enum_type,
    })
}

/// Ordered field set plus nested message/enum tables, looked up by name or
/// number in amortized O(1) via side-table indexes.
#[derive(Clone, Debug)]
pub struct MessageDescriptor {
    full_name: String,
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
    by_number: HashMap<u32, usize>,
    nested_messages: HashMap<String, Arc<MessageDescriptor>>,
    nested_enums: HashMap<String, Arc<EnumDescriptor>>,
}

impl MessageDescriptor {
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.by_number.get(&number).map(|&i| &self.fields[i])
    }

    pub fn nested_message(&self, name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.nested_messages.get(name)
    }

    pub fn nested_enum(&self, name: &str) -> Option<&Arc<EnumDescriptor>> {
        self.nested_enums.get(name)
    }
}

/// Builds a [`MessageDescriptor`], rejecting an empty `full_name` or any
/// duplicate field name/number within the message.
pub fn build_message_descriptor(
    full_name: impl Into<String>,
    fields: Vec<FieldDescriptor>,
    nested_messages: Vec<Arc<MessageDescriptor>>,
    nested_enums: Vec<Arc<EnumDescriptor>>,
) -> Result<MessageDescriptor, DescriptorError> {
    let full_name = full_name.into();
    if full_name.is_empty() {
        return Err(DescriptorError::new("message full_name must not be empty"));
    }

    let mut by_name = HashMap::with_capacity(fields.len());
    let mut by_number = HashMap::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        if by_name.insert(field.name.clone(), index).is_some() {
            return Err(DescriptorError::new(format!(
                "message '{full_name}' has duplicate field name '{}'",
                field.name
            )));
        }
        if by_number.insert(field.number, index).is_some() {
            return Err(DescriptorError::new(format!(
                "message '{full_name}' has duplicate field number {}",
                field.number
            )));
        }
    }

    let mut nested_message_map = HashMap::with_capacity(nested_messages.len());
    for nested in nested_messages {
        let short_name = nested
            .full_name
            .rsplit('.')
            .next()
            .unwrap_or(&nested.full_name)
            .to_string();
        nested_message_map.insert(short_name, nested);
    }

    let mut nested_enum_map = HashMap::with_capacity(nested_enums.len());
    for nested in nested_enums {
        nested_enum_map.insert(nested.name.clone(), nested);
    }

    Ok(MessageDescriptor {
        full_name,
        fields,
        by_name,
        by_number,
        nested_messages: nested_message_map,
        nested_enums: nested_enum_map,
    })
}

/// Builds the synthetic `{1: key, 2: value}` entry descriptor a map field is
/// internally modeled as.
pub(crate) fn build_map_entry_descriptor(
    field_name: &str,
    key_type: FieldType,
    value_type: FieldType,
    value_message_type: Option<Arc<MessageDescriptor>>,
    value_enum_type: Option<Arc<EnumDescriptor>>,
) -> Result<MessageDescriptor, DescriptorError> {
    let key_field = build_field_descriptor(
        "key",
        1,
        key_type,
        false,
        false,
        None,
        None,
        None,
    )?;
    let value_field = build_field_descriptor(
        "value",
        2,
        value_type,
        false,
        false,
        None,
        value_message_type,
        value_enum_type,
    )?;
    build_message_descriptor(
        format!("{field_name}.Entry"),
        vec![key_field, value_field],
        Vec::new(),
        Vec::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_classification() {
        assert!(FieldType::Int32.is_numeric());
        assert!(FieldType::Int32.is_integer());
        assert!(!FieldType::Int32.is_floating());
        assert!(FieldType::Double.is_numeric());
        assert!(FieldType::Double.is_floating());
        assert!(FieldType::String.is_string_or_bytes());
        assert!(!FieldType::Message.is_numeric());
    }

    #[test]
    fn packable_covers_numeric_plus_bool_and_enum() {
        assert!(FieldType::Int32.is_packable());
        assert!(FieldType::Bool.is_packable());
        assert!(FieldType::Enum.is_packable());
        assert!(!FieldType::String.is_packable());
        assert!(!FieldType::Bytes.is_packable());
        assert!(!FieldType::Message.is_packable());
    }

    #[test]
    fn enum_descriptor_lookup_first_alias_wins() {
        let descriptor = build_enum_descriptor(
            "Status",
            vec![
                ("UNKNOWN".to_string(), 0),
                ("OK".to_string(), 1),
                ("ALSO_OK".to_string(), 1),
            ],
        )
        .unwrap();
        assert_eq!(descriptor.value_by_number(1).unwrap().name(), "OK");
        assert_eq!(descriptor.value_by_name("ALSO_OK").unwrap().number(), 1);
        assert!(descriptor.value_by_number(2).is_none());
    }

    #[test]
    fn enum_descriptor_requires_at_least_one_value() {
        let err = build_enum_descriptor("Empty", vec![]).unwrap_err();
        assert!(err.reason().contains("at least one value"));
    }

    #[test]
    fn field_descriptor_rejects_repeated_and_map() {
        let err = build_field_descriptor(
            "tags",
            1,
            FieldType::String,
            true,
            true,
            None,
            None,
            None,
        )
        .unwrap_err();
        assert!(err.reason().contains("repeated and map"));
    }

    #[test]
    fn field_descriptor_requires_message_type_for_message_field() {
        let err =
            build_field_descriptor("child", 1, FieldType::Message, false, false, None, None, None)
                .unwrap_err();
        assert!(err.reason().contains("no target descriptor"));
    }

    #[test]
    fn message_descriptor_rejects_duplicate_field_number() {
        let a = build_field_descriptor("a", 1, FieldType::Int32, false, false, None, None, None)
            .unwrap();
        let b = build_field_descriptor("b", 1, FieldType::Int32, false, false, None, None, None)
            .unwrap();
        let err = build_message_descriptor("pkg.Msg", vec![a, b], vec![], vec![]).unwrap_err();
        assert!(err.reason().contains("duplicate field number"));
    }

    #[test]
    fn message_descriptor_lookups() {
        let a = build_field_descriptor("name", 1, FieldType::String, false, false, None, None, None)
            .unwrap();
        let b = build_field_descriptor("age", 2, FieldType::Int32, false, false, None, None, None)
            .unwrap();
        let descriptor =
            build_message_descriptor("pkg.Person", vec![a, b], vec![], vec![]).unwrap();
        assert_eq!(descriptor.field_by_name("age").unwrap().number(), 2);
        assert_eq!(descriptor.field_by_number(1).unwrap().name(), "name");
        assert!(descriptor.field_by_number(99).is_none());
    }
}
