//! A dynamic Protocol Buffers reflection and wire-format engine: messages
//! represented entirely at runtime from [`descriptor`] objects, with no
//! generated code, round-tripped against the canonical Protobuf binary wire
//! format by [`marshal::Marshaller`] and [`unmarshal::Unmarshaller`].
#![doc = include_str!("../README.md")]

pub mod descriptor;
pub mod error;
pub mod field_path;
pub mod marshal;
pub mod message;
pub mod options;
pub mod pool;
pub mod unmarshal;
pub mod validate;
pub mod value;
pub mod wire;

// Re-export the bytes crate: descriptor/value/message types are built on
// its `Bytes`/`BytesMut`, and callers constructing `Value::Bytes` or
// `DynamicMessage::set_unknown_field` need it without a separate dependency
// declaration, the same convenience the corpus's own `prost` offers.
pub use bytes;

pub use descriptor::{
    build_enum_descriptor, build_field_descriptor, build_message_descriptor, EnumDescriptor,
    EnumValueDescriptor, FieldDescriptor, FieldType, MessageDescriptor,
};
pub use error::{
    DescriptorError, EncodeError, TypeMismatch, ValidationError, WireError, WireErrorKind,
};
pub use field_path::FieldPath;
pub use marshal::Marshaller;
pub use message::{DynamicMessage, Message};
pub use options::SerializeOptions;
pub use pool::BufferPool;
pub use unmarshal::Unmarshaller;
pub use validate::{ValidationOptions, Validator};
pub use value::Value;

/// The default nesting bound shared by [`SerializeOptions::max_depth`] and
/// [`ValidationOptions::max_recursion_depth`], matching the
/// corpus's own default recursion limit.
pub use wire::DEFAULT_MAX_DEPTH;
