//! Human-readable rendering of a node and its fields.
//!
//! ```text
//! session1 NWBFile at 5f0c...
//! Fields:
//!   acquisition: (
//!     raw TimeSeries,
//!     filtered TimeSeries
//!   )
//!   description: first session
//! ```

use std::fmt;

use serde_json::Value;

use crate::error::ContainerResult;
use crate::node::{Attachable, FieldValue, NodeId};
use crate::tree::ContainerTree;

const INDENT: &str = "  ";

/// Borrowing [`Display`](fmt::Display) adapter for one node.
pub struct NodeDisplay<'a> {
    tree: &'a ContainerTree,
    node: &'a Attachable,
    id: NodeId,
}

impl ContainerTree {
    pub fn display(&self, id: NodeId) -> ContainerResult<NodeDisplay<'_>> {
        Ok(NodeDisplay {
            tree: self,
            node: self.node(id)?,
            id,
        })
    }
}

impl NodeDisplay<'_> {
    fn write_field(&self, f: &mut fmt::Formatter<'_>, value: &FieldValue) -> fmt::Result {
        match value {
            FieldValue::Value(v) => write_value(f, v),
            FieldValue::Node(id) => self.write_ref(f, *id),
            FieldValue::Nodes(ids) => {
                writeln!(f, "(")?;
                for (i, id) in ids.iter().enumerate() {
                    write!(f, "{INDENT}{INDENT}")?;
                    self.write_ref(f, *id)?;
                    if i + 1 < ids.len() {
                        write!(f, ",")?;
                    }
                    writeln!(f)?;
                }
                write!(f, "{INDENT})")
            }
            FieldValue::NodeMap(map) => {
                writeln!(f, "{{")?;
                for (key, id) in map {
                    let kind = self.tree.get(*id).map_or("?", Attachable::type_tag);
                    writeln!(f, "{INDENT}{INDENT}{key}: {kind}")?;
                }
                write!(f, "{INDENT}}}")
            }
        }
    }

    fn write_ref(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        match self.tree.get(id) {
            Some(node) => write!(f, "{} {}", node.name(), node.type_tag()),
            None => write!(f, "{id}"),
        }
    }
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node;
        write!(f, "{} {} at ", node.name(), node.type_tag())?;
        match node.object_id() {
            Some(object_id) => writeln!(f, "{object_id}")?,
            None => writeln!(f, "{}", self.id)?,
        }
        if !node.fields().is_empty() {
            writeln!(f, "Fields:")?;
            for (name, value) in node.fields() {
                if is_empty(value) {
                    continue;
                }
                write!(f, "{INDENT}{name}: ")?;
                self.write_field(f, value)?;
                writeln!(f)?;
            }
        }
        if let Some(buffer) = node.data() {
            writeln!(
                f,
                "Data: {} of length {}",
                buffer.representation(),
                buffer.len()
            )?;
        }
        Ok(())
    }
}

fn is_empty(value: &FieldValue) -> bool {
    match value {
        FieldValue::Value(Value::Array(items)) => items.is_empty(),
        FieldValue::Value(Value::Object(map)) => map.is_empty(),
        FieldValue::Value(Value::String(s)) => s.is_empty(),
        FieldValue::Value(_) | FieldValue::Node(_) => false,
        FieldValue::Nodes(ids) => ids.is_empty(),
        FieldValue::NodeMap(map) => map.is_empty(),
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => f.write_str(s),
        Value::Object(map) => {
            writeln!(f, "{{")?;
            for (key, v) in map {
                writeln!(f, "{INDENT}{INDENT}{key}: {}", value_kind(v))?;
            }
            write!(f, "{INDENT}}}")
        }
        other => write!(f, "{other}"),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
