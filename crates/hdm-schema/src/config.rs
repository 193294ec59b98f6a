//! Schema documents: declaring types as data instead of code.
//!
//! A document lists types under a `types` key. Field entries are either a
//! bare name or a descriptor object:
//!
//! ```json
//! {"types": [
//!   {"type_tag": "TimeSeries", "ancestor": "Container",
//!    "fields": ["rate", {"name": "timestamps", "child": true}]}
//! ]}
//! ```
//!
//! The same structure can be written in TOML.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};
use crate::field::{FieldSpec, SchemaKind};
use crate::registry::{TypeDef, TypeRegistry, TypeSchema};

/// One type entry of a schema document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeConfig {
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestor: Option<String>,
    #[serde(default)]
    pub kind: SchemaKind,
    #[serde(default)]
    pub fields: Vec<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub param_docs: BTreeMap<String, String>,
}

impl TypeConfig {
    /// Convert into a [`TypeDef`], interpreting each field entry.
    pub fn to_type_def(&self) -> SchemaResult<TypeDef> {
        let fields = self
            .fields
            .iter()
            .map(|v| FieldSpec::from_value(v.clone(), &self.type_tag))
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok(TypeDef {
            type_tag: self.type_tag.clone(),
            ancestor: self.ancestor.clone(),
            kind: self.kind,
            fields,
            param_docs: self.param_docs.clone(),
        })
    }
}

/// A parsed schema document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub types: Vec<TypeConfig>,
}

impl SchemaConfig {
    pub fn from_json_str(s: &str) -> SchemaResult<Self> {
        serde_json::from_str(s).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    pub fn from_toml_str(s: &str) -> SchemaResult<Self> {
        toml::from_str(s).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Register every type of the document.
    ///
    /// Types may appear in any order; each is registered once its ancestor
    /// is known. If a pass makes no progress, the first remaining type's
    /// ancestor is reported as unknown.
    pub fn register_into(
        &self,
        registry: &mut TypeRegistry,
    ) -> SchemaResult<Vec<Arc<TypeSchema>>> {
        let mut pending = self
            .types
            .iter()
            .map(TypeConfig::to_type_def)
            .collect::<SchemaResult<Vec<_>>>()?;
        let mut registered = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = pending.into_iter().partition(|def| {
                def.ancestor
                    .as_deref()
                    .map_or(true, |tag| registry.contains(tag))
            });
            if ready.is_empty() {
                let def = &blocked[0];
                return Err(SchemaError::UnknownAncestor {
                    type_tag: def.type_tag.clone(),
                    ancestor: def.ancestor.clone().unwrap_or_default(),
                });
            }
            for def in ready {
                registered.push(registry.register(def)?);
            }
            pending = blocked;
        }
        Ok(registered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_DOC: &str = r#"{
        "types": [
            {"type_tag": "TimeSeries", "ancestor": "NWBContainer",
             "fields": ["rate", {"name": "timestamps", "child": true}],
             "param_docs": {"rate": "sampling rate"}},
            {"type_tag": "NWBContainer", "ancestor": "Container",
             "fields": ["description"]},
            {"type_tag": "VectorData", "ancestor": "Data", "kind": "data",
             "fields": [{"name": "unit", "settable": false}]}
        ]
    }"#;

    #[test]
    fn json_document_registers_out_of_order() {
        let config = SchemaConfig::from_json_str(JSON_DOC).unwrap();
        let mut reg = TypeRegistry::with_builtins();
        let schemas = config.register_into(&mut reg).unwrap();
        assert_eq!(schemas.len(), 3);

        let ts = reg.get("TimeSeries").unwrap();
        assert_eq!(ts.fields(), &["description", "rate", "timestamps"]);
        assert_eq!(ts.accessor("rate").unwrap().doc(), Some("sampling rate"));
        assert!(ts.accessor("timestamps").unwrap().descriptor().is_child);

        let vd = reg.get("VectorData").unwrap();
        assert_eq!(vd.kind(), SchemaKind::Data);
        assert!(!vd.accessor("unit").unwrap().is_settable());
    }

    #[test]
    fn toml_document_is_equivalent() {
        let doc = r#"
            [[types]]
            type_tag = "Group"
            ancestor = "Container"
            fields = ["notes", { name = "members", child = true }]
        "#;
        let config = SchemaConfig::from_toml_str(doc).unwrap();
        let mut reg = TypeRegistry::with_builtins();
        config.register_into(&mut reg).unwrap();
        let group = reg.get("Group").unwrap();
        assert_eq!(group.fields(), &["notes", "members"]);
    }

    #[test]
    fn unresolvable_ancestor_is_reported() {
        let doc = r#"{"types": [{"type_tag": "Orphan", "ancestor": "Nowhere"}]}"#;
        let config = SchemaConfig::from_json_str(doc).unwrap();
        let mut reg = TypeRegistry::with_builtins();
        let err = config.register_into(&mut reg).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownAncestor { ref ancestor, .. } if ancestor == "Nowhere"));
    }

    #[test]
    fn unknown_key_in_document_fails_registration() {
        let doc = r#"{"types": [{"type_tag": "T", "ancestor": "Data", "kind": "data",
                      "fields": [{"name": "x", "child": true}]}]}"#;
        let config = SchemaConfig::from_json_str(doc).unwrap();
        let mut reg = TypeRegistry::with_builtins();
        assert!(matches!(
            config.register_into(&mut reg),
            Err(SchemaError::UnknownKey { .. })
        ));
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        assert!(matches!(
            SchemaConfig::from_json_str("{not json"),
            Err(SchemaError::Parse(_))
        ));
        assert!(matches!(
            SchemaConfig::from_toml_str("types = 3"),
            Err(SchemaError::Parse(_))
        ));
    }
}
