//! Error types for descriptor construction, validation, and wire codec use.
//!
//! Mirrors the shape of a typical Protobuf engine's error surface: decoding
//! errors carry a closed `kind` so callers can match on the failure instead
//! of parsing a message string, while encoding is "infallible" in the sense
//! that the only way it fails is attempting to serialize a field kind the
//! wire format doesn't support.

use std::fmt;

/// A failure constructing a descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorError {
    reason: String,
}

impl DescriptorError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        DescriptorError {
            reason: reason.into(),
        }
    }

    /// The human-readable reason the descriptor failed to build.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid descriptor: {}", self.reason)
    }
}

impl std::error::Error for DescriptorError {}

/// A failure validating or converting a [`crate::Value`] against a field's
/// declared shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    field: String,
    reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the field the error occurred on.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Human-readable reason for the failure.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation failed for field '{}': {}",
            self.field, self.reason
        )
    }
}

impl std::error::Error for ValidationError {}

/// A value's variant does not match the shape its field declares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeMismatch {
    field: String,
    expected: String,
    got: String,
}

impl TypeMismatch {
    pub(crate) fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn got(&self) -> &str {
        &self.got
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type mismatch on field '{}': expected {}, got {}",
            self.field, self.expected, self.got
        )
    }
}

impl std::error::Error for TypeMismatch {}

/// The closed taxonomy of ways decoding, setting, or validating a message
/// can fail.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum WireErrorKind {
    /// A value's variant does not match the field it was assigned to.
    TypeMismatch(TypeMismatch),
    /// A LEB128 varint was malformed (ran past 10 bytes, or overflowed).
    MalformedVarint,
    /// The buffer ended before a length-delimited or fixed-width payload
    /// could be fully read.
    TruncatedMessage,
    /// A string field's bytes were not valid UTF-8 and strict validation is
    /// enabled.
    InvalidUtf8,
    /// A field key (tag + wire type) could not be decoded.
    InvalidFieldKey,
    /// The wire type in an input key has no corresponding `WireType` value.
    UnsupportedWireType,
    /// A message-typed field has no target descriptor.
    InvalidMessageType,
    /// A field, enum value, depth bound, or range check failed.
    ValidationError(ValidationError),
    /// The field type is a legacy group or otherwise unsupported for encode.
    UnsupportedType,
}

impl fmt::Display for WireErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireErrorKind::TypeMismatch(inner) => inner.fmt(f),
            WireErrorKind::MalformedVarint => write!(f, "malformed varint"),
            WireErrorKind::TruncatedMessage => write!(f, "truncated message"),
            WireErrorKind::InvalidUtf8 => write!(f, "invalid utf-8 in string field"),
            WireErrorKind::InvalidFieldKey => write!(f, "invalid field key"),
            WireErrorKind::UnsupportedWireType => write!(f, "unsupported wire type"),
            WireErrorKind::InvalidMessageType => {
                write!(f, "message field has no target descriptor")
            }
            WireErrorKind::ValidationError(inner) => inner.fmt(f),
            WireErrorKind::UnsupportedType => {
                write!(f, "field type does not support encoding (group/unknown)")
            }
        }
    }
}

/// A failure decoding, setting, or validating a message.
///
/// `WireError` is the single error type surfaced at the public decode/set/
/// validate boundary; wire-type mismatches and unknown fields are handled
/// tolerantly inside the codec and never reach this type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireError {
    kind: WireErrorKind,
}

impl WireError {
    pub(crate) fn new(kind: WireErrorKind) -> Self {
        WireError { kind }
    }

    pub(crate) fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        WireError::new(WireErrorKind::TypeMismatch(TypeMismatch::new(
            field, expected, got,
        )))
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        WireError::new(WireErrorKind::ValidationError(ValidationError::new(
            field, reason,
        )))
    }

    pub(crate) fn malformed_varint() -> Self {
        WireError::new(WireErrorKind::MalformedVarint)
    }

    pub(crate) fn truncated() -> Self {
        WireError::new(WireErrorKind::TruncatedMessage)
    }

    pub(crate) fn invalid_utf8() -> Self {
        WireError::new(WireErrorKind::InvalidUtf8)
    }

    pub(crate) fn invalid_field_key() -> Self {
        WireError::new(WireErrorKind::InvalidFieldKey)
    }

    pub(crate) fn unsupported_wire_type() -> Self {
        WireError::new(WireErrorKind::UnsupportedWireType)
    }

    pub(crate) fn invalid_message_type() -> Self {
        WireError::new(WireErrorKind::InvalidMessageType)
    }

    pub(crate) fn unsupported_type() -> Self {
        WireError::new(WireErrorKind::UnsupportedType)
    }

    /// The kind of failure that occurred.
    pub fn kind(&self) -> &WireErrorKind {
        &self.kind
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protobuf error: {}", self.kind)
    }
}

impl std::error::Error for WireError {}

impl From<ValidationError> for WireError {
    fn from(err: ValidationError) -> Self {
        WireError::new(WireErrorKind::ValidationError(err))
    }
}

impl From<TypeMismatch> for WireError {
    fn from(err: TypeMismatch) -> Self {
        WireError::new(WireErrorKind::TypeMismatch(err))
    }
}

/// An error encoding a message. Encoding only fails when a field's declared
/// type cannot be written to the wire at all (legacy groups, `unknown`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeError {
    kind: WireErrorKind,
}

impl EncodeError {
    pub(crate) fn unsupported_type() -> Self {
        EncodeError {
            kind: WireErrorKind::UnsupportedType,
        }
    }

    pub(crate) fn from_wire(err: WireError) -> Self {
        EncodeError { kind: err.kind }
    }

    pub fn kind(&self) -> &WireErrorKind {
        &self.kind
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to encode protobuf message: {}", self.kind)
    }
}

impl std::error::Error for EncodeError {}

impl From<WireError> for EncodeError {
    fn from(err: WireError) -> Self {
        EncodeError::from_wire(err)
    }
}

/// A decoding error: the input buffer does not contain a valid Protobuf
/// message for the given descriptor. Matches the error details on a
/// "best effort" basis, same stance as reference Protobuf implementations.
pub type DecodeError = WireError;
