//! Tree nodes and the values their fields hold.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hdm_data::DataBuffer;
use hdm_schema::TypeSchema;
use hdm_types::ObjectId;

use crate::proxy::ParentRef;

/// Handle of a node inside one [`ContainerTree`](crate::ContainerTree).
///
/// Handles are only meaningful for the tree that issued them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// `None` once the arena has outgrown the `u32` handle space.
    pub(crate) fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value stored in a field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Plain data (numbers, strings, arrays, attribute dictionaries).
    Value(Value),
    /// A single object.
    Node(NodeId),
    /// An ordered collection of objects.
    Nodes(Vec<NodeId>),
    /// Objects keyed by name.
    NodeMap(BTreeMap<String, NodeId>),
}

impl FieldValue {
    /// The objects this value refers to: a single object becomes a
    /// one-element list, a map contributes its values, plain data none.
    pub fn nodes(&self) -> Vec<NodeId> {
        match self {
            Self::Value(_) => Vec::new(),
            Self::Node(id) => vec![*id],
            Self::Nodes(ids) => ids.clone(),
            Self::NodeMap(map) => map.values().copied().collect(),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<NodeId> for FieldValue {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<Vec<NodeId>> for FieldValue {
    fn from(ids: Vec<NodeId>) -> Self {
        Self::Nodes(ids)
    }
}

impl From<BTreeMap<String, NodeId>> for FieldValue {
    fn from(map: BTreeMap<String, NodeId>) -> Self {
        Self::NodeMap(map)
    }
}

/// Payload carried by a node besides its fields.
#[derive(Debug)]
pub enum NodeKind {
    /// A group of other objects.
    Container,
    /// A leaf holding a data buffer.
    Data(DataBuffer),
}

/// A tree node: identity, tree membership and field values.
///
/// Nodes are created and mutated only through the owning
/// [`ContainerTree`](crate::ContainerTree); this type exposes the read side
/// the persistence layer consumes.
#[derive(Debug)]
pub struct Attachable {
    pub(crate) name: String,
    pub(crate) schema: Arc<TypeSchema>,
    pub(crate) object_id: Option<ObjectId>,
    pub(crate) source_location: Option<String>,
    pub(crate) modified: bool,
    pub(crate) parent: ParentRef,
    pub(crate) children: Vec<NodeId>,
    pub(crate) fields: BTreeMap<String, FieldValue>,
    pub(crate) kind: NodeKind,
}

impl Attachable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> &str {
        self.schema.type_tag()
    }

    pub fn schema(&self) -> &TypeSchema {
        &self.schema
    }

    /// The object id if it has been assigned. Use
    /// [`ContainerTree::object_id`](crate::ContainerTree::object_id) to
    /// assign one on demand.
    pub fn object_id(&self) -> Option<&ObjectId> {
        self.object_id.as_ref()
    }

    pub fn source_location(&self) -> Option<&str> {
        self.source_location.as_deref()
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn parent(&self) -> &ParentRef {
        &self.parent
    }

    /// The owning node, if ownership is settled.
    pub fn concrete_parent(&self) -> Option<NodeId> {
        self.parent.concrete()
    }

    /// Owned nodes in attachment order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Values set through field setters or at construction.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn data(&self) -> Option<&DataBuffer> {
        match &self.kind {
            NodeKind::Data(buffer) => Some(buffer),
            NodeKind::Container => None,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self.kind, NodeKind::Data(_))
    }
}
