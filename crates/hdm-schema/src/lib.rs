//! Field schemas for the hierarchical data model.
//!
//! Every object type declares which of its attributes are externally visible
//! fields. This crate turns those declarations into per-type accessor tables
//! once, at registration time:
//!
//! 1. [`FieldSpec`]s (bare names or descriptor objects) are normalized into
//!    [`FieldDescriptor`]s and validated against the type's [`SchemaKind`].
//! 2. [`merge`] prepends the ancestor's resolved field list.
//! 3. [`AccessorTable`] synthesizes a get/set contract per field.
//!
//! The [`TypeRegistry`] holds the resulting [`TypeSchema`]s. Schemas can be
//! declared in code with [`TypeDef`] or loaded from JSON/TOML with
//! [`SchemaConfig`].
//!
//! All errors here are definition-time errors: a type that fails to register
//! is never usable.

pub mod accessor;
pub mod config;
pub mod error;
pub mod field;
pub mod merge;
pub mod registry;

pub use accessor::{Accessor, AccessorTable, SetterStep};
pub use config::{SchemaConfig, TypeConfig};
pub use error::{SchemaError, SchemaResult};
pub use field::{FieldDescriptor, FieldSpec, SchemaKind};
pub use merge::merge;
pub use registry::{TypeDef, TypeRegistry, TypeSchema};
