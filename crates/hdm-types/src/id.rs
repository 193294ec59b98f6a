use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique identifier of a tree object.
///
/// Unlike content-addressed ids, an `ObjectId` carries no meaning of its own;
/// it only has to be unique across every object that may end up in the same
/// file. Ids read back from persisted records are adopted verbatim.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Wrap an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Producer of fresh object identifiers.
///
/// Implementations must never hand out the same id twice.
pub trait IdSource: Send + Sync {
    /// Produce a new globally unique identifier.
    fn next_id(&self) -> ObjectId;
}

/// Random UUID v4 identifiers. This is the default source.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&self) -> ObjectId {
        ObjectId(Uuid::new_v4().to_string())
    }
}

/// Deterministic `prefix-N` identifiers for tests and reproducible builds.
#[derive(Debug)]
pub struct SequentialSource {
    prefix: String,
    next: AtomicU64,
}

impl SequentialSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl IdSource for SequentialSource {
    fn next_id(&self) -> ObjectId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        ObjectId(format!("{}-{n}", self.prefix))
    }
}
