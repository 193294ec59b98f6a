//! The container tree: node arena, parent assignment and dirty tracking.
//!
//! [`ContainerTree`] owns every node created through it and hands out
//! [`NodeId`] handles. Ownership between nodes is expressed through each
//! node's [`ParentRef`] and its parent's `children` list, which are only ever
//! changed together.
//!
//! # Invariants
//!
//! - A node has at most one concrete parent, for its whole lifetime.
//! - A node is listed in `children` of exactly its concrete parent, once.
//! - Concrete parent links never form a cycle.
//! - Setting `modified` marks every concrete ancestor modified as well.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use hdm_data::DataBuffer;
use hdm_schema::{SchemaKind, TypeRegistry};
use hdm_types::{validate_name, IdSource, ObjectId, UuidSource};

use crate::error::{ContainerError, ContainerResult};
use crate::node::{Attachable, FieldValue, NodeId, NodeKind};
use crate::proxy::{ParentRef, ParentTarget, Proxy};

/// Construction-time options for a new node.
#[derive(Debug, Default)]
pub struct NodeOptions {
    /// Adopt this id instead of generating one lazily.
    pub object_id: Option<ObjectId>,
    /// Where the node was read from.
    pub source_location: Option<String>,
    /// Parent assigned right after creation.
    pub parent: Option<ParentTarget>,
    /// Initial field values. Read-only fields may only be filled here.
    pub fields: Vec<(String, FieldValue)>,
}

impl NodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_id(mut self, id: impl Into<ObjectId>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    pub fn source_location(mut self, source: impl Into<String>) -> Self {
        self.source_location = Some(source.into());
        self
    }

    pub fn parent(mut self, parent: impl Into<ParentTarget>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

/// Outcome of a parent assignment that changes state.
enum Step {
    Attach(NodeId),
    Resolve(NodeId),
    Candidate(NodeId),
    Pend(Proxy),
}

/// Arena of tree nodes sharing one type registry and identifier source.
///
/// The tree is single-threaded state: callers that share it across threads
/// must serialize access themselves.
pub struct ContainerTree {
    pub(crate) registry: Arc<TypeRegistry>,
    ids: Box<dyn IdSource>,
    pub(crate) nodes: Vec<Attachable>,
}

impl std::fmt::Debug for ContainerTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerTree")
            .field("types", &self.registry.len())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl ContainerTree {
    /// Create an empty tree generating UUID object ids.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_id_source(registry, UuidSource)
    }

    /// Create an empty tree with a custom identifier source.
    pub fn with_id_source(registry: Arc<TypeRegistry>, ids: impl IdSource + 'static) -> Self {
        Self {
            registry,
            ids: Box::new(ids),
            nodes: Vec::new(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Number of nodes ever created in this tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ---------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------

    /// Create a container node of a registered container type.
    pub fn create_container(
        &mut self,
        type_tag: &str,
        name: &str,
        options: NodeOptions,
    ) -> ContainerResult<NodeId> {
        self.create(type_tag, name, NodeKind::Container, options)
    }

    /// Create a data node of a registered data type holding `buffer`.
    pub fn create_data(
        &mut self,
        type_tag: &str,
        name: &str,
        buffer: DataBuffer,
        options: NodeOptions,
    ) -> ContainerResult<NodeId> {
        self.create(type_tag, name, NodeKind::Data(buffer), options)
    }

    fn create(
        &mut self,
        type_tag: &str,
        name: &str,
        kind: NodeKind,
        options: NodeOptions,
    ) -> ContainerResult<NodeId> {
        validate_name(name)?;
        let schema = self.registry.schema(type_tag)?;
        let expected = match kind {
            NodeKind::Container => SchemaKind::Container,
            NodeKind::Data(_) => SchemaKind::Data,
        };
        if schema.kind() != expected {
            return Err(ContainerError::WrongKind {
                type_tag: type_tag.to_string(),
                expected,
            });
        }
        let planned_parent = match &options.parent {
            Some(ParentTarget::Node(parent)) => {
                self.node(*parent)?;
                Some(*parent)
            }
            _ => None,
        };
        let mut seen = BTreeSet::new();
        for (field, value) in &options.fields {
            if !seen.insert(field.as_str()) {
                return Err(ContainerError::AlreadySet {
                    name: name.to_string(),
                    field: field.clone(),
                });
            }
            self.check_field(&schema, field, value, true)?;
        }

        let id = NodeId::from_index(self.nodes.len()).ok_or(ContainerError::NodeLimit {
            max: u64::from(u32::MAX) + 1,
        })?;
        self.nodes.push(Attachable {
            name: name.to_string(),
            schema,
            object_id: options.object_id,
            source_location: options.source_location,
            modified: true,
            parent: ParentRef::Unset,
            children: Vec::new(),
            fields: Default::default(),
            kind,
        });
        // Nothing outside the new node has changed yet; undo the push if
        // adopting a child field value would close a cycle.
        if let Err(e) = self.check_construction_children(id, planned_parent, &options.fields) {
            self.nodes.pop();
            return Err(e);
        }
        debug!(node = %id, name, type_tag, "created node");

        if let Some(parent) = options.parent {
            self.set_parent(id, Some(parent))?;
        }
        for (field, value) in options.fields {
            self.apply_field(id, &field, Some(value), true)?;
        }
        Ok(id)
    }

    // ---------------------------------------------------------------
    // Identity
    // ---------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> ContainerResult<&Attachable> {
        self.nodes
            .get(id.index())
            .ok_or(ContainerError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> ContainerResult<&mut Attachable> {
        self.nodes
            .get_mut(id.index())
            .ok_or(ContainerError::NodeNotFound(id))
    }

    pub fn get(&self, id: NodeId) -> Option<&Attachable> {
        self.nodes.get(id.index())
    }

    /// All nodes with their handles, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Attachable)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| NodeId::from_index(i).map(|id| (id, node)))
    }

    /// The node's object id, generated on first access if absent.
    pub fn object_id(&mut self, id: NodeId) -> ContainerResult<&ObjectId> {
        let ids = &self.ids;
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(ContainerError::NodeNotFound(id))?;
        Ok(node.object_id.get_or_insert_with(|| ids.next_id()))
    }

    /// Record where the node was read from. Can only be done once.
    pub fn set_source_location(
        &mut self,
        id: NodeId,
        source: impl Into<String>,
    ) -> ContainerResult<()> {
        let node = self.node_mut(id)?;
        if node.source_location.is_some() {
            return Err(ContainerError::SourceAlreadySet {
                name: node.name.clone(),
            });
        }
        node.source_location = Some(source.into());
        Ok(())
    }

    // ---------------------------------------------------------------
    // Dirty tracking
    // ---------------------------------------------------------------

    pub fn modified(&self, id: NodeId) -> ContainerResult<bool> {
        Ok(self.node(id)?.modified)
    }

    /// Set the dirty flag. `true` also marks every concrete ancestor;
    /// `false` only touches this node.
    pub fn set_modified(&mut self, id: NodeId, modified: bool) -> ContainerResult<()> {
        let node = self.node_mut(id)?;
        node.modified = modified;
        if !modified {
            return Ok(());
        }
        let mut current = node.parent.concrete();
        while let Some(ancestor) = current {
            let node = &mut self.nodes[ancestor.index()];
            node.modified = true;
            current = node.parent.concrete();
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Parent assignment
    // ---------------------------------------------------------------

    /// Assign the parent of `id`.
    ///
    /// - Re-assigning the current parent is a no-op.
    /// - A concrete parent can never change.
    /// - A pending proxy is resolved by the first concrete node it matches;
    ///   non-matching nodes are recorded as candidates on the proxy.
    /// - An unset parent takes any target; a concrete one adopts the node.
    pub fn set_parent(&mut self, id: NodeId, target: Option<ParentTarget>) -> ContainerResult<()> {
        if let Some(ParentTarget::Node(parent)) = &target {
            self.node(*parent)?;
        }
        let node = self.node(id)?;
        let step = match (&node.parent, target) {
            (ParentRef::Unset, None) => return Ok(()),
            (ParentRef::Concrete(current), Some(ParentTarget::Node(p))) if *current == p => {
                return Ok(())
            }
            (ParentRef::Pending(current), Some(ParentTarget::Proxy(p))) if current.id() == p.id() => {
                return Ok(())
            }
            (ParentRef::Concrete(current), _) => {
                return Err(ContainerError::Reparent {
                    name: node.name.clone(),
                    current: *current,
                })
            }
            (ParentRef::Pending(_), None) => {
                return Err(ContainerError::InvalidReparent {
                    name: node.name.clone(),
                    reason: "cannot overwrite a pending proxy with no parent".into(),
                })
            }
            (ParentRef::Pending(_), Some(ParentTarget::Proxy(_))) => {
                return Err(ContainerError::InvalidReparent {
                    name: node.name.clone(),
                    reason: "parent is already pending on another proxy".into(),
                })
            }
            (ParentRef::Pending(proxy), Some(ParentTarget::Node(p))) => {
                if proxy.matches(&self.nodes[p.index()]) {
                    Step::Resolve(p)
                } else {
                    Step::Candidate(p)
                }
            }
            (ParentRef::Unset, Some(ParentTarget::Node(p))) => Step::Attach(p),
            (ParentRef::Unset, Some(ParentTarget::Proxy(proxy))) => Step::Pend(proxy),
        };

        match step {
            Step::Attach(parent) => self.attach(id, parent),
            Step::Resolve(parent) => {
                debug!(node = %id, parent = %parent, "proxy parent resolved");
                self.attach(id, parent)
            }
            Step::Candidate(parent) => {
                debug!(node = %id, candidate = %parent, "parent candidate recorded");
                if let ParentRef::Pending(proxy) = &mut self.nodes[id.index()].parent {
                    proxy.add_candidate(parent);
                }
                Ok(())
            }
            Step::Pend(proxy) => {
                debug!(node = %id, proxy = %proxy.id(), "parent pending on proxy");
                self.nodes[id.index()].parent = ParentRef::Pending(proxy);
                Ok(())
            }
        }
    }

    /// Make `parent` the concrete owner of `id`.
    fn attach(&mut self, id: NodeId, parent: NodeId) -> ContainerResult<()> {
        if self.is_ancestor_or_self(id, parent) {
            return Err(ContainerError::Cycle {
                name: self.nodes[id.index()].name.clone(),
                parent,
            });
        }
        self.nodes[id.index()].parent = ParentRef::Concrete(parent);
        self.nodes[parent.index()].children.push(id);
        debug!(node = %id, parent = %parent, "attached child");
        self.set_modified(parent, true)
    }

    /// Fail with [`ContainerError::Cycle`] if adopting any object of
    /// `value` under `owner` would make it its own ancestor.
    ///
    /// `planned_parent` stands in for the parent of an `owner` that is
    /// about to be attached. Objects that would not be attached (already
    /// owned, or pending on a proxy that rejects `owner`) are skipped.
    pub(crate) fn check_adoption(
        &self,
        owner: NodeId,
        planned_parent: Option<NodeId>,
        value: &FieldValue,
    ) -> ContainerResult<()> {
        let owner_node = self.node(owner)?;
        for child in value.nodes() {
            let node = self.node(child)?;
            let attaches = match &node.parent {
                ParentRef::Unset => true,
                ParentRef::Pending(proxy) => proxy.matches(owner_node),
                ParentRef::Concrete(_) => false,
            };
            let closes_cycle = self.is_ancestor_or_self(child, owner)
                || planned_parent.is_some_and(|p| self.is_ancestor_or_self(child, p));
            if attaches && closes_cycle {
                return Err(ContainerError::Cycle {
                    name: node.name.clone(),
                    parent: owner,
                });
            }
        }
        Ok(())
    }

    fn check_construction_children(
        &self,
        id: NodeId,
        planned_parent: Option<NodeId>,
        fields: &[(String, FieldValue)],
    ) -> ContainerResult<()> {
        let schema = &self.node(id)?.schema;
        for (field, value) in fields {
            let is_child = schema
                .accessor(field)
                .is_some_and(|a| a.descriptor().is_child);
            if is_child {
                self.check_adoption(id, planned_parent, value)?;
            }
        }
        Ok(())
    }

    /// Whether `ancestor` is `node` or one of its concrete ancestors.
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.nodes[n.index()].parent.concrete();
        }
        false
    }

    // ---------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> ContainerResult<&ParentRef> {
        Ok(&self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> ContainerResult<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// Nearest concrete ancestor with the given type tag, or the immediate
    /// concrete parent when no tag is given.
    pub fn get_ancestor(&self, id: NodeId, type_tag: Option<&str>) -> ContainerResult<Option<NodeId>> {
        let mut current = self.node(id)?.parent.concrete();
        let Some(tag) = type_tag else {
            return Ok(current);
        };
        while let Some(ancestor) = current {
            let node = &self.nodes[ancestor.index()];
            if node.type_tag() == tag {
                return Ok(Some(ancestor));
            }
            current = node.parent.concrete();
        }
        Ok(None)
    }

    /// Nodes without a concrete parent, in creation order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| !node.parent.is_concrete())
            .map(|(id, _)| id)
            .collect()
    }

    /// Every node below `id`, depth first, children in attachment order.
    pub fn descendants(&self, id: NodeId) -> ContainerResult<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id)?.children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.nodes[next.index()].children.iter().rev().copied());
        }
        Ok(result)
    }
}
