//! Error types for container tree operations.

use hdm_data::DataError;
use hdm_schema::{SchemaError, SchemaKind};
use hdm_types::TypeError;

use crate::node::NodeId;

/// Errors that can occur while building or navigating a container tree.
///
/// All of these indicate caller misuse; none is transient.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// The object name is invalid (e.g. contains the path separator).
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    /// The type is unknown or its schema is malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A data buffer operation failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// A write-once field was set a second time.
    #[error("can't set attribute '{field}' on '{name}' -- already set")]
    AlreadySet { name: String, field: String },

    /// The source location was reassigned.
    #[error("cannot reassign source location of '{name}'")]
    SourceAlreadySet { name: String },

    /// The assigned object does not carry the name the field requires.
    #[error("{field} field on {type_tag} must be named '{required}'")]
    NamingConstraint {
        field: String,
        type_tag: String,
        required: String,
        actual: Option<String>,
    },

    /// A concretely attached object was offered a different parent.
    #[error("cannot reassign parent of '{name}': parent is already {current}")]
    Reparent { name: String, current: NodeId },

    /// A pending proxy parent cannot be replaced this way.
    #[error("invalid parent assignment for '{name}': {reason}")]
    InvalidReparent { name: String, reason: String },

    /// Attaching would make an object its own ancestor.
    #[error("cannot attach '{name}' under {parent}: it is an ancestor of that node")]
    Cycle { name: String, parent: NodeId },

    /// The type has no field with this name.
    #[error("type {type_tag} has no field '{field}'")]
    UnknownField { type_tag: String, field: String },

    /// The field has no setter.
    #[error("field '{field}' on {type_tag} is read-only")]
    ReadOnlyField { type_tag: String, field: String },

    /// The node handle does not belong to this tree.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// A type of the wrong kind was used to construct a node.
    #[error("type {type_tag} is not a {expected} type")]
    WrongKind { type_tag: String, expected: SchemaKind },

    /// The tree has used up its node handles.
    #[error("node limit reached: a tree holds at most {max} nodes")]
    NodeLimit { max: u64 },

    /// A data operation was applied to a container node.
    #[error("'{name}' does not hold data")]
    NotData { name: String },
}

/// Convenience alias for container results.
pub type ContainerResult<T> = Result<T, ContainerError>;
