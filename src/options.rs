//! [`SerializeOptions`]: the marshal/unmarshal configuration surface.

use crate::wire::DEFAULT_MAX_DEPTH;

/// Options shared by the [`crate::marshal::Marshaller`] and
/// [`crate::unmarshal::Unmarshaller`]. Small and `Copy`, threaded through
/// recursive calls the way the corpus threads its own decode context.
#[derive(Clone, Copy, Debug)]
pub struct SerializeOptions {
    /// Drop unknown fields on decode; omit preserved unknown fields on
    /// encode. Default `false`.
    pub skip_unknown_fields: bool,
    /// Include scalar zero values on the wire. Default `false`.
    pub preserve_proto3_defaults: bool,
    /// Bound on nesting during marshal and unmarshal. Default `100`.
    pub max_depth: u32,
    /// Strict validation before marshal and after unmarshal. Default `true`.
    pub validate_fields: bool,
    /// UTF-8 check for string fields. Default `true`.
    pub validate_utf8: bool,
    /// Optimization hint: reuse scratch buffers across nested-message
    /// encode calls via [`crate::pool::BufferPool`]. Default `true`.
    pub use_buffer_pool: bool,
    /// Emit numeric repeated fields in packed form. Decoding always accepts
    /// both packed and unpacked input regardless of this option. Default
    /// `false`, matching proto3's non-packed emission for dynamic fields.
    pub encode_packed_numeric: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            skip_unknown_fields: false,
            preserve_proto3_defaults: false,
            max_depth: DEFAULT_MAX_DEPTH,
            validate_fields: true,
            validate_utf8: true,
            use_buffer_pool: true,
            encode_packed_numeric: false,
        }
    }
}

impl SerializeOptions {
    pub(crate) fn to_validation_options(self) -> crate::validate::ValidationOptions {
        crate::validate::ValidationOptions {
            validate_utf8: self.validate_utf8,
            max_recursion_depth: self.max_depth,
            ..crate::validate::ValidationOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = SerializeOptions::default();
        assert!(!options.skip_unknown_fields);
        assert!(!options.preserve_proto3_defaults);
        assert_eq!(options.max_depth, 100);
        assert!(options.validate_fields);
        assert!(options.validate_utf8);
        assert!(options.use_buffer_pool);
        assert!(!options.encode_packed_numeric);
    }
}
