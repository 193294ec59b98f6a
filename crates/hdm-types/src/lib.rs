//! Foundation types for the hierarchical data model (HDM).
//!
//! This crate provides the identity primitives shared by every HDM crate.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Globally unique string identifier of a tree object
//! - [`IdSource`] -- Where new identifiers come from ([`UuidSource`] by default)
//! - [`validate_name`] -- Object name rules (no path separator)

pub mod error;
pub mod id;
pub mod name;

pub use error::{TypeError, TypeResult};
pub use id::{IdSource, ObjectId, SequentialSource, UuidSource};
pub use name::{validate_name, PATH_SEPARATOR};
