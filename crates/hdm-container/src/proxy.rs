//! Soft-link placeholders for parents that are not known yet.
//!
//! When a reader meets an object before the object that owns it, it records
//! the parent as a [`Proxy`]: a predicate describing the eventual owner. Each
//! later parent assignment is checked against the predicate. The first
//! concrete node that matches becomes the owner; the others are kept as
//! candidates.

use std::fmt;

use hdm_types::{IdSource, ObjectId, UuidSource};

use crate::node::{Attachable, NodeId};

/// Decides whether a concrete node is the parent a proxy stands for.
pub trait ParentMatcher: fmt::Debug + Send {
    fn matches(&self, candidate: &Attachable) -> bool;
}

/// Matches the node with a given object id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectIdMatcher(pub ObjectId);

impl ParentMatcher for ObjectIdMatcher {
    fn matches(&self, candidate: &Attachable) -> bool {
        candidate.object_id() == Some(&self.0)
    }
}

/// Matches on where a node was read from. Unset criteria match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocationMatcher {
    pub source_location: Option<String>,
    pub name: Option<String>,
    pub type_tag: Option<String>,
}

impl ParentMatcher for LocationMatcher {
    fn matches(&self, candidate: &Attachable) -> bool {
        let source_ok = self
            .source_location
            .as_deref()
            .map_or(true, |s| candidate.source_location() == Some(s));
        let name_ok = self.name.as_deref().map_or(true, |n| candidate.name() == n);
        let type_ok = self
            .type_tag
            .as_deref()
            .map_or(true, |t| candidate.type_tag() == t);
        source_ok && name_ok && type_ok
    }
}

/// Matches with an arbitrary predicate.
pub struct PredicateMatcher(Box<dyn Fn(&Attachable) -> bool + Send>);

impl PredicateMatcher {
    pub fn new(predicate: impl Fn(&Attachable) -> bool + Send + 'static) -> Self {
        Self(Box::new(predicate))
    }
}

impl fmt::Debug for PredicateMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PredicateMatcher(..)")
    }
}

impl ParentMatcher for PredicateMatcher {
    fn matches(&self, candidate: &Attachable) -> bool {
        (self.0)(candidate)
    }
}

/// Provisional parent of a node whose owner is not known yet.
#[derive(Debug)]
pub struct Proxy {
    id: ObjectId,
    matcher: Box<dyn ParentMatcher>,
    candidates: Vec<NodeId>,
}

impl Proxy {
    pub fn new(matcher: impl ParentMatcher + 'static) -> Self {
        Self {
            id: UuidSource.next_id(),
            matcher: Box::new(matcher),
            candidates: Vec::new(),
        }
    }

    /// A proxy with a caller-chosen identity, e.g. the path of a link
    /// target that several objects refer to.
    pub fn with_id(id: ObjectId, matcher: impl ParentMatcher + 'static) -> Self {
        Self {
            id,
            matcher: Box::new(matcher),
            candidates: Vec::new(),
        }
    }

    /// Identity of this placeholder. Re-assigning the same proxy is a no-op.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn matches(&self, candidate: &Attachable) -> bool {
        self.matcher.matches(candidate)
    }

    /// Record a parent that was offered but did not match.
    /// Record a non-matching parent. A node offered twice is kept once.
    pub fn add_candidate(&mut self, candidate: NodeId) {
        if !self.candidates.contains(&candidate) {
            self.candidates.push(candidate);
        }
    }

    /// Offered parents that did not match, in offer order.
    pub fn candidates(&self) -> &[NodeId] {
        &self.candidates
    }
}

/// Parent of a node.
///
/// `Unset -> Concrete` and `Unset -> Pending -> Concrete` are the only
/// transitions; a concrete parent is permanent.
#[derive(Debug, Default)]
pub enum ParentRef {
    #[default]
    Unset,
    /// Owned by this node.
    Concrete(NodeId),
    /// Owner not known yet.
    Pending(Proxy),
}

impl ParentRef {
    pub fn concrete(&self) -> Option<NodeId> {
        match self {
            Self::Concrete(id) => Some(*id),
            _ => None,
        }
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        match self {
            Self::Pending(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Self::Concrete(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// The parent offered in an assignment.
#[derive(Debug)]
pub enum ParentTarget {
    Node(NodeId),
    Proxy(Proxy),
}

impl From<NodeId> for ParentTarget {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<Proxy> for ParentTarget {
    fn from(proxy: Proxy) -> Self {
        Self::Proxy(proxy)
    }
}
