//! Per-field accessor contracts.
//!
//! An [`Accessor`] is generated once per field when a type is registered. The
//! getter is uniform (look the name up in the instance's field values); the
//! setter is an ordered list of [`SetterStep`]s that the instance side runs
//! in sequence. Read-only fields get no setter at all.

use std::collections::HashMap;

use crate::error::{SchemaError, SchemaResult};
use crate::field::FieldDescriptor;

/// One stage of a generated setter, executed in order.
///
/// A missing value short-circuits the whole setter before any step runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetterStep {
    /// The assigned object's own name must equal this name.
    RequireName(String),
    /// Store the value, failing if the field already holds one.
    WriteOnce,
    /// Adopt every assigned object whose parent is not yet concrete.
    RegisterChildren,
}

/// Generated get/set contract for one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accessor {
    descriptor: FieldDescriptor,
    setter: Option<Vec<SetterStep>>,
}

impl Accessor {
    /// Synthesize the accessor for a normalized descriptor.
    pub fn generate(descriptor: FieldDescriptor) -> Self {
        let setter = descriptor.settable.then(|| {
            let mut steps = Vec::with_capacity(3);
            if let Some(required) = &descriptor.required_name {
                steps.push(SetterStep::RequireName(required.clone()));
            }
            steps.push(SetterStep::WriteOnce);
            if descriptor.is_child {
                steps.push(SetterStep::RegisterChildren);
            }
            steps
        });
        Self { descriptor, setter }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.descriptor.doc.as_deref()
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn is_settable(&self) -> bool {
        self.setter.is_some()
    }

    /// The setter pipeline, or `None` for a read-only field.
    pub fn setter(&self) -> Option<&[SetterStep]> {
        self.setter.as_deref()
    }
}

/// Ordered accessor table of a type, ancestors' fields first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessorTable {
    order: Vec<String>,
    by_name: HashMap<String, Accessor>,
}

impl AccessorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table for a type from its merged field list.
    ///
    /// Fields already present in the ancestor's table keep the ancestor's
    /// accessor; the first definition wins. Every other name must have a
    /// descriptor in `own`.
    pub fn generate(
        type_tag: &str,
        ancestor: Option<&AccessorTable>,
        merged: &[String],
        own: &[FieldDescriptor],
    ) -> SchemaResult<Self> {
        let mut table = ancestor.cloned().unwrap_or_default();
        for name in merged {
            if table.contains(name) {
                continue;
            }
            let descriptor = own.iter().find(|d| &d.name == name).ok_or_else(|| {
                SchemaError::InvalidDescriptor {
                    type_tag: type_tag.to_string(),
                    reason: format!("no descriptor for field '{name}'"),
                }
            })?;
            table.insert(Accessor::generate(descriptor.clone()));
        }
        Ok(table)
    }

    fn insert(&mut self, accessor: Accessor) {
        let name = accessor.name().to_string();
        if self.by_name.insert(name.clone(), accessor).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Accessor> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Field names in resolution order, without duplicates.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Accessors in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &Accessor> {
        self.order.iter().filter_map(|name| self.by_name.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // -----------------------------------------------------------------------
    // Setter synthesis
    // -----------------------------------------------------------------------

    #[test]
    fn plain_field_is_write_once() {
        let acc = Accessor::generate(FieldDescriptor::new("rate"));
        assert_eq!(acc.setter(), Some(&[SetterStep::WriteOnce][..]));
    }

    #[test]
    fn read_only_field_has_no_setter() {
        let acc = Accessor::generate(FieldDescriptor::new("id").read_only().child());
        assert!(!acc.is_settable());
        assert!(acc.setter().is_none());
    }

    #[test]
    fn guards_wrap_the_base_setter() {
        let acc = Accessor::generate(FieldDescriptor::new("table").required_name("table").child());
        assert_eq!(
            acc.setter().unwrap(),
            &[
                SetterStep::RequireName("table".into()),
                SetterStep::WriteOnce,
                SetterStep::RegisterChildren,
            ]
        );
    }

    #[test]
    fn getter_metadata_is_kept() {
        let acc = Accessor::generate(FieldDescriptor::new("unit").doc("SI unit"));
        assert_eq!(acc.name(), "unit");
        assert_eq!(acc.doc(), Some("SI unit"));
    }

    // -----------------------------------------------------------------------
    // Table generation
    // -----------------------------------------------------------------------

    #[test]
    fn table_follows_merged_order() {
        let own = vec![FieldDescriptor::new("b"), FieldDescriptor::new("a")];
        let table = AccessorTable::generate("T", None, &names(&["b", "a"]), &own).unwrap();
        assert_eq!(table.names(), &names(&["b", "a"])[..]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn ancestor_accessor_wins_on_redeclaration() {
        let base_own = vec![FieldDescriptor::new("x").doc("from base")];
        let base = AccessorTable::generate("Base", None, &names(&["x"]), &base_own).unwrap();

        let own = vec![FieldDescriptor::new("x").doc("from sub"), FieldDescriptor::new("y")];
        let merged = names(&["x", "x", "y"]);
        let table = AccessorTable::generate("Sub", Some(&base), &merged, &own).unwrap();

        assert_eq!(table.names(), &names(&["x", "y"])[..]);
        assert_eq!(table.get("x").unwrap().doc(), Some("from base"));
    }

    #[test]
    fn missing_descriptor_is_an_error() {
        let err = AccessorTable::generate("T", None, &names(&["ghost"]), &[]).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDescriptor { .. }));
    }
}
