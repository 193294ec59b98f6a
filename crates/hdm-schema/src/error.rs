//! Error types for schema definition.

use thiserror::Error;

/// Errors raised while defining or registering a type.
///
/// Every variant is a schema-definition error: it is detected when the type
/// is registered, never when an instance is created.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A field descriptor object has no `name` key.
    #[error("field descriptor on '{type_tag}' must specify 'name'")]
    MissingName { type_tag: String },

    /// A field descriptor uses a key not allowed for the type's kind.
    #[error("unrecognized key '{key}' in field config '{field}' on {type_tag}")]
    UnknownKey {
        type_tag: String,
        field: String,
        key: String,
    },

    /// A field entry is neither a name nor a well-formed descriptor.
    #[error("invalid field descriptor on '{type_tag}': {reason}")]
    InvalidDescriptor { type_tag: String, reason: String },

    /// The declared ancestor type has not been registered.
    #[error("unknown ancestor type '{ancestor}' for '{type_tag}'")]
    UnknownAncestor { type_tag: String, ancestor: String },

    /// A type and its ancestor are of different kinds.
    #[error("type '{type_tag}' ({kind}) cannot extend '{ancestor}' ({ancestor_kind})")]
    KindMismatch {
        type_tag: String,
        kind: String,
        ancestor: String,
        ancestor_kind: String,
    },

    /// A type with this tag is already registered.
    #[error("type already registered: {0}")]
    DuplicateType(String),

    /// No type with this tag is registered.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A schema document could not be parsed.
    #[error("schema parse error: {0}")]
    Parse(String),
}

/// Convenience alias for schema results.
pub type SchemaResult<T> = Result<T, SchemaError>;
