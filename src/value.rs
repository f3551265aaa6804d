//! [`Value`], the tagged union every populated field slot holds.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;

use crate::descriptor::{EnumDescriptor, FieldDescriptor, FieldType};
use crate::message::DynamicMessage;

/// The tagged union of all representable field values.
///
/// Exactly one variant is inhabited per value; container variants
/// (`Repeated`, `Map`) hold further `Value`s rather than raw scalars, so a
/// repeated int32 field is a `Repeated(vec![Value::Int(..), ..])`.
#[derive(Clone, Debug)]
pub enum Value {
    /// Covers the signed integer families (`int32`, `int64`, `sint32`,
    /// `sint64`, `sfixed32`, `sfixed64`).
    Int(i64),
    /// Covers the unsigned and fixed-unsigned families (`uint32`, `uint64`,
    /// `fixed32`, `fixed64`).
    UInt(u64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Bytes(Bytes),
    /// A sub-message; `value.descriptor().full_name()` must match the
    /// field's declared target.
    Message(DynamicMessage),
    /// Valid only for repeated fields; each element must satisfy the
    /// singular form of the field.
    Repeated(Vec<Value>),
    /// Valid only for map fields; keys are the textual rendering of the
    /// declared key scalar.
    Map(BTreeMap<String, Value>),
    /// `number` is authoritative; `name` is advisory and, when validation is
    /// enabled, must be consistent with `descriptor`.
    Enum {
        name: String,
        number: i32,
        descriptor: Arc<EnumDescriptor>,
    },
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Message(a), Value::Message(b)) => a == b,
            (Value::Repeated(a), Value::Repeated(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (
                Value::Enum {
                    number: a_number, ..
                },
                Value::Enum {
                    number: b_number, ..
                },
            ) => a_number == b_number,
            _ => false,
        }
    }
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float_exact(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double_exact(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool_exact(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str_exact(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes_exact(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Best-effort coercion to `i32`: signed numerics narrow with overflow
    /// checking, unsigned numerics narrow only if representable, strings
    /// parse as decimal integers, `bool` maps to `0`/`1` is not accepted
    /// here (int32 is not one of bool's coercion targets).
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(v) => i32::try_from(*v).ok(),
            Value::UInt(v) => i32::try_from(*v).ok(),
            Value::Float(v) if (i32::MIN as f32..=i32::MAX as f32).contains(v) => Some(*v as i32),
            Value::Float(_) => None,
            Value::Double(v) if (i32::MIN as f64..=i32::MAX as f64).contains(v) => Some(*v as i32),
            Value::Double(_) => None,
            Value::String(v) => v.parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Float(v) if (i64::MIN as f32..=i64::MAX as f32).contains(v) => Some(*v as i64),
            Value::Float(_) => None,
            Value::Double(v) if (i64::MIN as f64..=i64::MAX as f64).contains(v) => Some(*v as i64),
            Value::Double(_) => None,
            Value::String(v) => v.parse().ok(),
            _ => None,
        }
    }

    /// Signed-from-negative to unsigned coerces to `None`, as does any
    /// floating value outside `0..=<target>::MAX` — Rust's `as` cast
    /// saturates silently, so the bound must be checked explicitly here.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::UInt(v) => u32::try_from(*v).ok(),
            Value::Int(v) if *v >= 0 => u32::try_from(*v).ok(),
            Value::Int(_) => None,
            Value::Float(v) if (0.0..=u32::MAX as f32).contains(v) => Some(*v as u32),
            Value::Double(v) if (0.0..=u32::MAX as f64).contains(v) => Some(*v as u32),
            Value::String(v) => v.parse().ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::Int(v) if *v >= 0 => Some(*v as u64),
            Value::Int(_) => None,
            Value::Float(v) if (0.0..=u64::MAX as f32).contains(v) => Some(*v as u64),
            Value::Double(v) if (0.0..=u64::MAX as f64).contains(v) => Some(*v as u64),
            Value::String(v) => v.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Double(v) => Some(*v as f32),
            Value::Int(v) => Some(*v as f32),
            Value::UInt(v) => Some(*v as f32),
            Value::String(v) => v.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Float(v) => Some(*v as f64),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            Value::String(v) => v.parse().ok(),
            _ => None,
        }
    }

    /// `true=1, false=0`; any nonzero numeric coerces to `true`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            Value::UInt(v) => Some(*v != 0),
            Value::String(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Total: produces a canonical textual form for every variant.
    pub fn as_string(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::UInt(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Bytes(v) => BASE64.encode(v),
            Value::Message(m) => format!("Message({})", m.descriptor().full_name()),
            Value::Repeated(items) => {
                let rendered: Vec<String> = items.iter().map(Value::as_string).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Map(entries) => {
                let rendered: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.as_string()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::Enum { name, .. } => name.clone(),
        }
    }

    /// `string.to_bytes` = UTF-8 bytes; `bytes.as_string` above is base64.
    pub fn to_bytes(&self) -> Option<Bytes> {
        match self {
            Value::String(v) => Some(Bytes::from(v.clone().into_bytes())),
            Value::Bytes(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Produces a new `Value` compatible with `field`, or `None` if no
    /// coercion applies.
    pub fn convert_to(&self, field: &FieldDescriptor) -> Option<Value> {
        if field.is_repeated() {
            let Value::Repeated(items) = self else {
                return None;
            };
            let mut converted = Vec::with_capacity(items.len());
            for item in items {
                converted.push(item.convert_to_scalar(field)?);
            }
            return Some(Value::Repeated(converted));
        }
        if field.is_map() {
            let Value::Map(entries) = self else {
                return None;
            };
            let mut converted = BTreeMap::new();
            for (key, value) in entries {
                converted.insert(key.clone(), value.convert_to_scalar(field)?);
            }
            return Some(Value::Map(converted));
        }
        self.convert_to_scalar(field)
    }

    fn convert_to_scalar(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.field_type() {
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => {
                self.as_i32().map(|v| Value::Int(v as i64))
            }
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => {
                self.as_i64().map(Value::Int)
            }
            FieldType::UInt32 | FieldType::Fixed32 => {
                self.as_u32().map(|v| Value::UInt(v as u64))
            }
            FieldType::UInt64 | FieldType::Fixed64 => self.as_u64().map(Value::UInt),
            FieldType::Float => self.as_f32().map(Value::Float),
            FieldType::Double => self.as_f64().map(Value::Double),
            FieldType::Bool => self.as_bool().map(Value::Bool),
            FieldType::String => match self {
                Value::String(_) => Some(self.clone()),
                Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::Double(_) | Value::Bool(_) => {
                    Some(Value::String(self.as_string()))
                }
                _ => None,
            },
            FieldType::Bytes => self.to_bytes().map(Value::Bytes),
            FieldType::Message => match self {
                Value::Message(m) if field.message_type().is_some_and(|target| {
                    target.full_name() == m.descriptor().full_name()
                }) =>
                {
                    Some(self.clone())
                }
                _ => None,
            },
            FieldType::Enum => match self {
                Value::Enum { .. } => Some(self.clone()),
                _ => None,
            },
            FieldType::Group | FieldType::Unknown => None,
        }
    }
}
