//! Data buffers for the hierarchical data model.
//!
//! A [`DataBuffer`] holds the payload of a leaf object in exactly one
//! [`Backing`] representation:
//!
//! - [`Backing::Fixed`] -- a fixed-shape array; cannot grow
//! - [`Backing::Growable`] -- an in-memory `Vec`
//! - [`Backing::External`] -- a growable [`ExternalStore`] (e.g. a dataset in
//!   an open file)
//! - [`Backing::Wrapped`] -- a [`DataIo`] write-policy transform that has
//!   taken ownership of the previous backing
//!
//! Which mutations are legal depends on the representation; illegal ones
//! fail with [`DataError::UnsupportedMutation`] and leave the buffer as it
//! was.
//!
//! Elements are `serde_json::Value`s, so rows of multi-dimensional data are
//! nested arrays. [`shape_of`] derives the shape from that nesting.

pub mod buffer;
pub mod dataio;
pub mod error;
pub mod selector;
pub mod shape;
pub mod store;

pub use buffer::{Backing, DataBuffer};
pub use dataio::{Compression, DataIo, DataIoOptions};
pub use error::{DataError, DataResult};
pub use selector::{Selection, Selector};
pub use shape::shape_of;
pub use store::{ExternalStore, InMemoryStore};
