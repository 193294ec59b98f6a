//! Field access through the generated accessor tables.

use std::sync::Arc;

use tracing::{debug, warn};

use hdm_schema::{Accessor, FieldDescriptor, SetterStep, TypeSchema};

use crate::error::{ContainerError, ContainerResult};
use crate::node::{FieldValue, NodeId};
use crate::proxy::ParentTarget;
use crate::tree::ContainerTree;

impl ContainerTree {
    /// Read a field. `Ok(None)` if the field exists but was never set.
    pub fn get_field(&self, id: NodeId, field: &str) -> ContainerResult<Option<&FieldValue>> {
        let node = self.node(id)?;
        accessor_for(&node.schema, field)?;
        Ok(node.fields.get(field))
    }

    /// Set a field through its generated setter.
    ///
    /// `None` is a silent no-op. Fields are write-once; a required name is
    /// checked before storing, and objects assigned to a child field are
    /// adopted by `id` unless they already have a concrete parent.
    pub fn set_field(
        &mut self,
        id: NodeId,
        field: &str,
        value: Option<FieldValue>,
    ) -> ContainerResult<()> {
        self.apply_field(id, field, value, false)
    }

    /// Make `child` a child of `parent` unless it is already owned.
    #[deprecated(note = "set the parent of the child instead")]
    pub fn add_child(&mut self, parent: NodeId, child: Option<NodeId>) -> ContainerResult<()> {
        warn!(parent = %parent, "add_child is deprecated; set the parent instead");
        self.node(parent)?;
        let Some(child) = child else {
            warn!(parent = %parent, "cannot add a missing child");
            return Ok(());
        };
        if self.node(child)?.parent.is_concrete() {
            return Ok(());
        }
        self.set_parent(child, Some(ParentTarget::Node(parent)))
    }

    /// Validate a construction-time or setter value without applying it.
    pub(crate) fn check_field(
        &self,
        schema: &TypeSchema,
        field: &str,
        value: &FieldValue,
        construction: bool,
    ) -> ContainerResult<()> {
        let accessor = accessor_for(schema, field)?;
        if !construction && !accessor.is_settable() {
            return Err(read_only(schema, field));
        }
        for node in value.nodes() {
            self.node(node)?;
        }
        if let Some(required) = &accessor.descriptor().required_name {
            self.check_required_name(schema, field, required, value)?;
        }
        Ok(())
    }

    /// Run the setter pipeline of `field` on node `id`.
    ///
    /// At construction time read-only fields are filled as if they were
    /// settable.
    pub(crate) fn apply_field(
        &mut self,
        id: NodeId,
        field: &str,
        value: Option<FieldValue>,
        construction: bool,
    ) -> ContainerResult<()> {
        let schema = Arc::clone(&self.node(id)?.schema);
        let accessor = accessor_for(&schema, field)?;
        let steps = match accessor.setter() {
            Some(steps) => steps.to_vec(),
            None if construction => construction_steps(accessor.descriptor()),
            None => return Err(read_only(&schema, field)),
        };
        let Some(value) = value else {
            return Ok(());
        };
        for node in value.nodes() {
            self.node(node)?;
        }

        // Every step is checked before any of them writes, so a rejected
        // value leaves the node and its would-be children untouched.
        for step in &steps {
            match step {
                SetterStep::RequireName(required) => {
                    self.check_required_name(&schema, field, required, &value)?;
                }
                SetterStep::WriteOnce => {
                    let node = self.node(id)?;
                    if node.fields.contains_key(field) {
                        return Err(ContainerError::AlreadySet {
                            name: node.name.clone(),
                            field: field.to_string(),
                        });
                    }
                }
                SetterStep::RegisterChildren => self.check_adoption(id, None, &value)?,
            }
        }

        for step in &steps {
            match step {
                SetterStep::RequireName(_) => {}
                SetterStep::WriteOnce => {
                    self.node_mut(id)?
                        .fields
                        .insert(field.to_string(), value.clone());
                }
                SetterStep::RegisterChildren => self.register_children(id, &value)?,
            }
        }
        Ok(())
    }

    fn check_required_name(
        &self,
        schema: &TypeSchema,
        field: &str,
        required: &str,
        value: &FieldValue,
    ) -> ContainerResult<()> {
        let actual = match value {
            FieldValue::Node(node) => Some(self.node(*node)?.name.as_str()),
            _ => None,
        };
        if actual == Some(required) {
            return Ok(());
        }
        Err(ContainerError::NamingConstraint {
            field: field.to_string(),
            type_tag: schema.type_tag().to_string(),
            required: required.to_string(),
            actual: actual.map(str::to_string),
        })
    }

    /// Adopt every referenced object whose parent is not concrete yet.
    ///
    /// Objects owned elsewhere keep their owner; the field then acts as a
    /// link to them.
    fn register_children(&mut self, owner: NodeId, value: &FieldValue) -> ContainerResult<()> {
        for child in value.nodes() {
            match self.node(child)?.parent.concrete() {
                Some(existing) if existing != owner => {
                    debug!(node = %child, owner = %existing, linked_from = %owner, "child owned elsewhere; kept as link");
                }
                Some(_) => {}
                None => self.set_parent(child, Some(ParentTarget::Node(owner)))?,
            }
        }
        Ok(())
    }
}

fn accessor_for<'a>(schema: &'a TypeSchema, field: &str) -> ContainerResult<&'a Accessor> {
    schema
        .accessor(field)
        .ok_or_else(|| ContainerError::UnknownField {
            type_tag: schema.type_tag().to_string(),
            field: field.to_string(),
        })
}

fn read_only(schema: &TypeSchema, field: &str) -> ContainerError {
    ContainerError::ReadOnlyField {
        type_tag: schema.type_tag().to_string(),
        field: field.to_string(),
    }
}

/// Setter pipeline used to fill a read-only field at construction.
fn construction_steps(descriptor: &FieldDescriptor) -> Vec<SetterStep> {
    let settable = FieldDescriptor {
        settable: true,
        ..descriptor.clone()
    };
    Accessor::generate(settable)
        .setter()
        .map(<[SetterStep]>::to_vec)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use hdm_schema::{TypeDef, TypeRegistry};
    use hdm_types::ObjectId;
    use serde_json::json;

    use crate::proxy::{ObjectIdMatcher, Proxy};
    use crate::tree::NodeOptions;

    fn tree() -> ContainerTree {
        let mut reg = TypeRegistry::with_builtins();
        reg.register(
            TypeDef::container("Base")
                .extends("Container")
                .field("description")
                .field(FieldDescriptor::new("source_file").read_only()),
        )
        .unwrap();
        reg.register(
            TypeDef::container("Holder")
                .extends("Base")
                .field(FieldDescriptor::new("item").child())
                .field(FieldDescriptor::new("items").child())
                .field(FieldDescriptor::new("table").required_name("table").child())
                .field(FieldDescriptor::new("link")),
        )
        .unwrap();
        ContainerTree::new(Arc::new(reg))
    }

    fn make(tree: &mut ContainerTree, type_tag: &str, name: &str) -> NodeId {
        tree.create_container(type_tag, name, NodeOptions::new()).unwrap()
    }

    // -----------------------------------------------------------------------
    // Write-once semantics
    // -----------------------------------------------------------------------

    #[test]
    fn field_is_write_once() {
        let mut t = tree();
        let x = make(&mut t, "Base", "x");
        t.set_field(x, "description", Some(json!("first").into())).unwrap();
        let err = t
            .set_field(x, "description", Some(json!("second").into()))
            .unwrap_err();
        assert!(matches!(err, ContainerError::AlreadySet { ref field, .. } if field == "description"));
        assert_eq!(
            t.get_field(x, "description").unwrap(),
            Some(&FieldValue::Value(json!("first")))
        );
    }

    #[test]
    fn none_is_a_noop_before_and_after_set() {
        let mut t = tree();
        let x = make(&mut t, "Base", "x");
        t.set_field(x, "description", None).unwrap();
        assert_eq!(t.get_field(x, "description").unwrap(), None);

        t.set_field(x, "description", Some(json!("v1").into())).unwrap();
        t.set_field(x, "description", None).unwrap();
        assert_eq!(
            t.get_field(x, "description").unwrap(),
            Some(&FieldValue::Value(json!("v1")))
        );
    }

    #[test]
    fn read_only_field_has_no_setter_but_fills_at_construction() {
        let mut t = tree();
        let x = make(&mut t, "Base", "x");
        let err = t
            .set_field(x, "source_file", Some(json!("a.h5").into()))
            .unwrap_err();
        assert!(matches!(err, ContainerError::ReadOnlyField { .. }));
        assert!(matches!(
            t.set_field(x, "source_file", None),
            Err(ContainerError::ReadOnlyField { .. })
        ));

        let y = t
            .create_container(
                "Base",
                "y",
                NodeOptions::new().field("source_file", json!("a.h5")),
            )
            .unwrap();
        assert_eq!(
            t.get_field(y, "source_file").unwrap(),
            Some(&FieldValue::Value(json!("a.h5")))
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut t = tree();
        let x = make(&mut t, "Base", "x");
        assert!(matches!(
            t.get_field(x, "nope"),
            Err(ContainerError::UnknownField { .. })
        ));
        assert!(matches!(
            t.set_field(x, "item", Some(json!(1).into())),
            Err(ContainerError::UnknownField { .. })
        ));
    }

    #[test]
    fn inherited_fields_work_on_subtypes() {
        let mut t = tree();
        let h = make(&mut t, "Holder", "h");
        t.set_field(h, "description", Some(json!("inherited").into()))
            .unwrap();
        assert_eq!(t.node(h).unwrap().schema().fields()[0], "description");
    }

    // -----------------------------------------------------------------------
    // Required names
    // -----------------------------------------------------------------------

    #[test]
    fn required_name_is_enforced() {
        let mut t = tree();
        let h = make(&mut t, "Holder", "h");
        let wrong = make(&mut t, "Base", "chairs");
        let err = t.set_field(h, "table", Some(wrong.into())).unwrap_err();
        match err {
            ContainerError::NamingConstraint {
                required, actual, ..
            } => {
                assert_eq!(required, "table");
                assert_eq!(actual.as_deref(), Some("chairs"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(t.get_field(h, "table").unwrap(), None);
        assert!(t.parent(wrong).unwrap().is_unset());

        let right = make(&mut t, "Base", "table");
        t.set_field(h, "table", Some(right.into())).unwrap();
        assert_eq!(t.node(right).unwrap().concrete_parent(), Some(h));
    }

    #[test]
    fn construction_fields_are_validated_first() {
        let mut t = tree();
        let wrong = make(&mut t, "Base", "chairs");
        let err = t
            .create_container("Holder", "h", NodeOptions::new().field("table", wrong))
            .unwrap_err();
        assert!(matches!(err, ContainerError::NamingConstraint { .. }));
        assert_eq!(t.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Child registration
    // -----------------------------------------------------------------------

    #[test]
    fn child_field_adopts_value() {
        let mut t = tree();
        let a = make(&mut t, "Holder", "a");
        let b = make(&mut t, "Base", "b");
        t.set_modified(a, false).unwrap();

        t.set_field(a, "item", Some(b.into())).unwrap();
        assert_eq!(t.node(b).unwrap().concrete_parent(), Some(a));
        assert!(t.children(a).unwrap().contains(&b));
        assert!(t.modified(a).unwrap());
    }

    #[test]
    fn child_field_adopts_sequences_and_maps() {
        let mut t = tree();
        let a = make(&mut t, "Holder", "a");
        let kids: Vec<NodeId> = (0..3).map(|i| make(&mut t, "Base", &format!("k{i}"))).collect();
        t.set_field(a, "items", Some(kids.clone().into())).unwrap();
        assert_eq!(t.children(a).unwrap(), &kids[..]);

        let c = make(&mut t, "Holder", "c");
        let x = make(&mut t, "Base", "x");
        let y = make(&mut t, "Base", "y");
        let map: BTreeMap<String, NodeId> = [("y".into(), y), ("x".into(), x)].into();
        t.set_field(c, "items", Some(map.into())).unwrap();
        assert_eq!(t.children(c).unwrap(), &[x, y]);
    }

    #[test]
    fn value_owned_elsewhere_is_kept_as_link() {
        let mut t = tree();
        let owner = make(&mut t, "Holder", "owner");
        let other = make(&mut t, "Holder", "other");
        let b = make(&mut t, "Base", "b");
        t.set_field(owner, "item", Some(b.into())).unwrap();

        t.set_field(other, "item", Some(b.into())).unwrap();
        assert_eq!(t.node(b).unwrap().concrete_parent(), Some(owner));
        assert!(t.children(other).unwrap().is_empty());
        assert_eq!(t.get_field(other, "item").unwrap(), Some(&FieldValue::Node(b)));
    }

    #[test]
    fn non_child_field_does_not_adopt() {
        let mut t = tree();
        let a = make(&mut t, "Holder", "a");
        let b = make(&mut t, "Base", "b");
        t.set_field(a, "link", Some(b.into())).unwrap();
        assert!(t.parent(b).unwrap().is_unset());
        assert!(t.children(a).unwrap().is_empty());
    }

    #[test]
    fn child_field_goes_through_pending_proxy() {
        let mut t = tree();
        let wanted = t
            .create_container("Holder", "wanted", NodeOptions::new().object_id("w"))
            .unwrap();
        let other = make(&mut t, "Holder", "other");
        let b = t
            .create_container(
                "Base",
                "b",
                NodeOptions::new().parent(Proxy::new(ObjectIdMatcher(ObjectId::new("w")))),
            )
            .unwrap();

        t.set_field(other, "item", Some(b.into())).unwrap();
        let proxy = t.parent(b).unwrap().proxy().unwrap();
        assert_eq!(proxy.candidates(), &[other]);

        t.set_field(wanted, "item", Some(b.into())).unwrap();
        assert_eq!(t.node(b).unwrap().concrete_parent(), Some(wanted));
        assert_eq!(t.children(wanted).unwrap(), &[b]);
    }

    #[test]
    fn dangling_node_reference_is_rejected() {
        let mut t = tree();
        let a = make(&mut t, "Holder", "a");
        let ghost = NodeId::from_index(99).unwrap();
        assert!(matches!(
            t.set_field(a, "item", Some(ghost.into())),
            Err(ContainerError::NodeNotFound(_))
        ));
        assert_eq!(t.get_field(a, "item").unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Rejected values leave no trace
    // -----------------------------------------------------------------------

    #[test]
    fn self_reference_in_child_field_is_not_stored() {
        let mut t = tree();
        let a = make(&mut t, "Holder", "a");
        let err = t.set_field(a, "item", Some(a.into())).unwrap_err();
        assert!(matches!(err, ContainerError::Cycle { .. }));
        assert_eq!(t.get_field(a, "item").unwrap(), None);
        assert!(t.children(a).unwrap().is_empty());

        let b = make(&mut t, "Base", "b");
        t.set_field(a, "item", Some(b.into())).unwrap();
        assert_eq!(t.children(a).unwrap(), &[b]);
    }

    #[test]
    fn cycle_late_in_sequence_adopts_nothing() {
        let mut t = tree();
        let a = make(&mut t, "Holder", "a");
        let b = make(&mut t, "Base", "b");
        let err = t
            .set_field(a, "items", Some(vec![b, a].into()))
            .unwrap_err();
        assert!(matches!(err, ContainerError::Cycle { .. }));
        assert!(t.parent(b).unwrap().is_unset());
        assert!(t.children(a).unwrap().is_empty());
        assert_eq!(t.get_field(a, "items").unwrap(), None);
    }

    #[test]
    fn ancestor_in_child_field_is_rejected_without_side_effects() {
        let mut t = tree();
        let root = make(&mut t, "Holder", "root");
        let mid = t
            .create_container("Holder", "mid", NodeOptions::new().parent(root))
            .unwrap();
        t.set_modified(root, false).unwrap();
        t.set_modified(mid, false).unwrap();

        // Plain fields may point upwards.
        t.set_field(mid, "link", Some(root.into())).unwrap();
        let err = t.set_field(mid, "item", Some(root.into())).unwrap_err();
        assert!(matches!(err, ContainerError::Cycle { .. }));
        assert_eq!(t.get_field(mid, "item").unwrap(), None);
        assert!(t.parent(root).unwrap().is_unset());
    }

    #[test]
    fn construction_cycle_through_parent_creates_nothing() {
        let mut t = tree();
        let p = make(&mut t, "Holder", "p");
        let before = t.len();
        let err = t
            .create_container("Holder", "h", NodeOptions::new().parent(p).field("item", p))
            .unwrap_err();
        assert!(matches!(err, ContainerError::Cycle { .. }));
        assert_eq!(t.len(), before);
        assert!(t.children(p).unwrap().is_empty());
        assert!(t.parent(p).unwrap().is_unset());

        // The handle is reused by the next successful construction.
        let h = t
            .create_container("Holder", "h", NodeOptions::new().parent(p))
            .unwrap();
        assert_eq!(t.children(p).unwrap(), &[h]);
    }

    #[test]
    fn duplicate_construction_field_creates_nothing() {
        let mut t = tree();
        let p = make(&mut t, "Holder", "p");
        let kid = make(&mut t, "Base", "kid");
        let before = t.len();
        let err = t
            .create_container(
                "Holder",
                "h",
                NodeOptions::new()
                    .parent(p)
                    .field("item", kid)
                    .field("description", json!("one"))
                    .field("description", json!("two")),
            )
            .unwrap_err();
        assert!(
            matches!(err, ContainerError::AlreadySet { ref field, .. } if field == "description")
        );
        assert_eq!(t.len(), before);
        assert!(t.children(p).unwrap().is_empty());
        assert!(t.parent(kid).unwrap().is_unset());
    }

    // -----------------------------------------------------------------------
    // Deprecated add_child
    // -----------------------------------------------------------------------

    #[test]
    #[allow(deprecated)]
    fn add_child_sets_parent_once() {
        let mut t = tree();
        let a = make(&mut t, "Holder", "a");
        let b = make(&mut t, "Holder", "b");
        let c = make(&mut t, "Base", "c");

        t.add_child(a, Some(c)).unwrap();
        t.add_child(b, Some(c)).unwrap();
        t.add_child(a, None).unwrap();
        assert_eq!(t.node(c).unwrap().concrete_parent(), Some(a));
        assert_eq!(t.children(a).unwrap(), &[c]);
        assert!(t.children(b).unwrap().is_empty());
    }
}
