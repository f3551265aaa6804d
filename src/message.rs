//! [`DynamicMessage`], the runtime container for one message instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::descriptor::MessageDescriptor;
use crate::error::WireError;
use crate::value::Value;

/// A narrow trait exposed only at the API boundary. `DynamicMessage` itself implements it directly.
pub trait Message {
    fn descriptor(&self) -> &Arc<MessageDescriptor>;
    fn get(&self, field_name: &str) -> Option<&Value>;
    fn set(&mut self, field_name: &str, value: Value) -> Result<(), WireError>;
    fn clear(&mut self, field_name: &str);
    fn has(&self, field_name: &str) -> bool;
}

/// One message instance: a descriptor reference, the populated known
/// fields, and the preserved unknown-field buffer.
///
/// A `DynamicMessage` exclusively owns its values; nested sub-messages are
/// owned by their parent slot. No cyclic ownership is possible: values form
/// a tree even though the descriptor graph may self-reference.
#[derive(Clone, Debug)]
pub struct DynamicMessage {
    descriptor: Arc<MessageDescriptor>,
    fields: BTreeMap<u32, Value>,
    /// Raw wire segments (tag+payload bytes), keyed by field number,
    /// preserved verbatim so re-serialization can echo them back.
    unknown_fields: BTreeMap<u32, Vec<Bytes>>,
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.full_name() == other.descriptor.full_name()
            && self.fields == other.fields
            && self.unknown_fields == other.unknown_fields
    }
}

impl DynamicMessage {
    /// A freshly constructed message instance with no fields populated.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        DynamicMessage {
            descriptor,
            fields: BTreeMap::new(),
            unknown_fields: BTreeMap::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// Returns the set value, or the field's declared default when absent
    /// and a default is materialized, or `None`.
    pub fn get(&self, field_name: &str) -> Option<&Value> {
        let field = self.descriptor.field_by_name(field_name)?;
        self.fields
            .get(&field.number())
            .or(field.default_value())
    }

    /// Returns the set value for a field looked up by number.
    pub fn get_by_number(&self, field_number: u32) -> Option<&Value> {
        let field = self.descriptor.field_by_number(field_number)?;
        self.fields
            .get(&field.number())
            .or(field.default_value())
    }

    /// Mutable access to an already-populated field's value, used by
    /// [`crate::field_path::FieldPath`] to mutate nested sub-messages in
    /// place without cloning the whole tree.
    pub fn get_mut_field(&mut self, field_name: &str) -> Option<&mut Value> {
        let number = self.descriptor.field_by_name(field_name)?.number();
        self.fields.get_mut(&number)
    }

    /// Validates shape (repeated/map/singular) before installing; the
    /// variant/type match itself is the [`crate::validate::Validator`]'s
    /// job, invoked by callers that want lenient `set`-time coercion.
    pub fn set(&mut self, field_name: &str, value: Value) -> Result<(), WireError> {
        let field = self
            .descriptor
            .field_by_name(field_name)
            .ok_or_else(|| WireError::validation(field_name, "unknown field"))?;
        let shape_ok = match &value {
            Value::Repeated(_) => field.is_repeated(),
            Value::Map(_) => field.is_map(),
            _ => field.is_singular(),
        };
        if !shape_ok {
            return Err(WireError::type_mismatch(
                field_name,
                if field.is_repeated() {
                    "repeated"
                } else if field.is_map() {
                    "map"
                } else {
                    field.field_type().description()
                },
                value.as_string(),
            ));
        }
        self.fields.insert(field.number(), value);
        Ok(())
    }

    pub fn set_by_number(&mut self, field_number: u32, value: Value) -> Result<(), WireError> {
        let name = self
            .descriptor
            .field_by_number(field_number)
            .map(|f| f.name().to_string())
            .ok_or_else(|| WireError::validation(field_number.to_string(), "unknown field"))?;
        self.set(&name, value)
    }

    /// Removes the value; subsequent `get` returns the declared default (if
    /// any) or `None`.
    pub fn clear(&mut self, field_name: &str) {
        if let Some(field) = self.descriptor.field_by_name(field_name) {
            self.fields.remove(&field.number());
        }
    }

    /// True iff an explicit value is present, independent of whether it
    /// equals the default.
    pub fn has(&self, field_name: &str) -> bool {
        self.descriptor
            .field_by_name(field_name)
            .is_some_and(|field| self.fields.contains_key(&field.number()))
    }

    /// Known fields in ascending field-number order, as stored.
    pub fn known_fields(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.fields.iter().map(|(&number, value)| (number, value))
    }

    /// Appends a raw wire segment to the per-number unknown-field list.
    pub fn set_unknown_field(&mut self, number: u32, raw_bytes: Bytes) {
        self.unknown_fields.entry(number).or_default().push(raw_bytes);
    }

    /// Unknown fields in ascending field-number order, for echo-back
    /// serialization.
    pub fn unknown_fields(&self) -> impl Iterator<Item = (u32, &Bytes)> {
        self.unknown_fields
            .iter()
            .flat_map(|(&number, segments)| segments.iter().map(move |segment| (number, segment)))
    }

    pub fn has_unknown_fields(&self) -> bool {
        !self.unknown_fields.is_empty()
    }
}

impl Message for DynamicMessage {
    fn descriptor(&self) -> &Arc<MessageDescriptor> {
        DynamicMessage::descriptor(self)
    }

    fn get(&self, field_name: &str) -> Option<&Value> {
        DynamicMessage::get(self, field_name)
    }

    fn set(&mut self, field_name: &str, value: Value) -> Result<(), WireError> {
        DynamicMessage::set(self, field_name, value)
    }

    fn clear(&mut self, field_name: &str) {
        DynamicMessage::clear(self, field_name)
    }

    fn has(&self, field_name: &str) -> bool {
        DynamicMessage::has(self, field_name)
    }
}

// Object-safety check, mirroring the corpus's own `Message` trait.
const _MESSAGE_IS_OBJECT_SAFE: Option<&dyn Message> = None;
