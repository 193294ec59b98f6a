//! Container tree for the hierarchical data model.
//!
//! A [`ContainerTree`] is an arena of named, typed nodes that mirrors the
//! layout of a hierarchical file. Every node has exactly one owner once its
//! place is known. Until then its parent may be a [`Proxy`] that resolves to
//! the first matching node it is offered.
//!
//! Field access goes through the accessor tables built by `hdm-schema`:
//! fields are write-once, may require a specific name on the assigned
//! object, and child-designated fields adopt what is assigned to them.
//!
//! ```
//! use std::sync::Arc;
//! use hdm_container::{ContainerTree, NodeOptions};
//! use hdm_schema::{FieldDescriptor, TypeDef, TypeRegistry};
//!
//! let mut registry = TypeRegistry::with_builtins();
//! registry
//!     .register(
//!         TypeDef::container("Session")
//!             .extends("Container")
//!             .field(FieldDescriptor::new("acquisition").child()),
//!     )
//!     .unwrap();
//!
//! let mut tree = ContainerTree::new(Arc::new(registry));
//! let session = tree.create_container("Session", "s1", NodeOptions::new()).unwrap();
//! let raw = tree.create_container("Container", "raw", NodeOptions::new()).unwrap();
//! tree.set_field(session, "acquisition", Some(raw.into())).unwrap();
//!
//! assert_eq!(tree.children(session).unwrap(), &[raw]);
//! assert!(tree.modified(session).unwrap());
//! ```

mod data;
pub mod display;
pub mod error;
mod fields;
pub mod node;
pub mod proxy;
pub mod tree;

pub use display::NodeDisplay;
pub use error::{ContainerError, ContainerResult};
pub use node::{Attachable, FieldValue, NodeId, NodeKind};
pub use proxy::{
    LocationMatcher, ObjectIdMatcher, ParentMatcher, ParentRef, ParentTarget, PredicateMatcher,
    Proxy,
};
pub use tree::{ContainerTree, NodeOptions};
