//! Type definitions and the registry of resolved schemas.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::accessor::{Accessor, AccessorTable};
use crate::error::{SchemaError, SchemaResult};
use crate::field::{FieldDescriptor, FieldSpec, SchemaKind};
use crate::merge::merge;

/// Declaration of an object type, before resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDef {
    /// The type tag stored with every instance (e.g. `"TimeSeries"`).
    pub type_tag: String,
    /// Nearest ancestor type, if any.
    pub ancestor: Option<String>,
    pub kind: SchemaKind,
    /// Fields declared by this type itself.
    pub fields: Vec<FieldSpec>,
    /// Constructor parameter docs, used as the default doc of same-named
    /// fields.
    pub param_docs: BTreeMap<String, String>,
}

impl TypeDef {
    pub fn new(type_tag: impl Into<String>, kind: SchemaKind) -> Self {
        Self {
            type_tag: type_tag.into(),
            ancestor: None,
            kind,
            fields: Vec::new(),
            param_docs: BTreeMap::new(),
        }
    }

    /// A container type definition.
    pub fn container(type_tag: impl Into<String>) -> Self {
        Self::new(type_tag, SchemaKind::Container)
    }

    /// A data type definition.
    pub fn data(type_tag: impl Into<String>) -> Self {
        Self::new(type_tag, SchemaKind::Data)
    }

    pub fn extends(mut self, ancestor: impl Into<String>) -> Self {
        self.ancestor = Some(ancestor.into());
        self
    }

    pub fn field(mut self, spec: impl Into<FieldSpec>) -> Self {
        self.fields.push(spec.into());
        self
    }

    pub fn param_doc(mut self, param: impl Into<String>, doc: impl Into<String>) -> Self {
        self.param_docs.insert(param.into(), doc.into());
        self
    }
}

/// A registered type with its resolved field list and accessor table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSchema {
    type_tag: String,
    ancestor: Option<String>,
    kind: SchemaKind,
    merged: Vec<String>,
    accessors: AccessorTable,
}

impl TypeSchema {
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn ancestor(&self) -> Option<&str> {
        self.ancestor.as_deref()
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// Resolved field names: ancestors' first, each name once.
    pub fn fields(&self) -> &[String] {
        self.accessors.names()
    }

    /// The merged list as produced by [`merge`], repeats included.
    pub fn merged_fields(&self) -> &[String] {
        &self.merged
    }

    pub fn accessor(&self, field: &str) -> Option<&Accessor> {
        self.accessors.get(field)
    }

    pub fn accessors(&self) -> &AccessorTable {
        &self.accessors
    }
}

/// Registry of every known type, keyed by type tag.
///
/// Registration runs the merge and accessor generation once per type;
/// instances share the resulting [`TypeSchema`] through an `Arc`.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<TypeSchema>>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the two field-less root types `Container` and
    /// `Data`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (type_tag, kind) in [("Container", SchemaKind::Container), ("Data", SchemaKind::Data)] {
            let schema = TypeSchema {
                type_tag: type_tag.to_string(),
                ancestor: None,
                kind,
                merged: Vec::new(),
                accessors: AccessorTable::new(),
            };
            registry.types.insert(type_tag.to_string(), Arc::new(schema));
        }
        registry
    }

    /// Resolve and register a type. The ancestor must already be registered.
    pub fn register(&mut self, def: TypeDef) -> SchemaResult<Arc<TypeSchema>> {
        if self.types.contains_key(&def.type_tag) {
            return Err(SchemaError::DuplicateType(def.type_tag));
        }
        let ancestor = match &def.ancestor {
            Some(tag) => Some(self.types.get(tag).cloned().ok_or_else(|| {
                SchemaError::UnknownAncestor {
                    type_tag: def.type_tag.clone(),
                    ancestor: tag.clone(),
                }
            })?),
            None => None,
        };
        let schema = Arc::new(resolve(&def, ancestor.as_deref())?);
        debug!(
            type_tag = %schema.type_tag,
            kind = %schema.kind,
            fields = schema.fields().len(),
            "registered type"
        );
        self.types.insert(def.type_tag, Arc::clone(&schema));
        Ok(schema)
    }

    pub fn get(&self, type_tag: &str) -> Option<&Arc<TypeSchema>> {
        self.types.get(type_tag)
    }

    /// Look a type up, failing if it is not registered.
    pub fn schema(&self, type_tag: &str) -> SchemaResult<Arc<TypeSchema>> {
        self.types
            .get(type_tag)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownType(type_tag.to_string()))
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.types.contains_key(type_tag)
    }

    /// The type and its ancestors, nearest first.
    pub fn type_hierarchy(&self, type_tag: &str) -> SchemaResult<Vec<&str>> {
        let mut chain = Vec::new();
        let mut current = Some(type_tag);
        while let Some(tag) = current {
            let schema = self
                .types
                .get(tag)
                .ok_or_else(|| SchemaError::UnknownType(tag.to_string()))?;
            chain.push(schema.type_tag());
            current = schema.ancestor();
        }
        Ok(chain)
    }

    /// Whether `type_tag` is `ancestor` or inherits from it.
    pub fn is_a(&self, type_tag: &str, ancestor: &str) -> bool {
        self.type_hierarchy(type_tag)
            .map(|chain| chain.contains(&ancestor))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Merge + accessor generation for one type.
fn resolve(def: &TypeDef, ancestor: Option<&TypeSchema>) -> SchemaResult<TypeSchema> {
    if let Some(parent) = ancestor {
        if parent.kind != def.kind {
            return Err(SchemaError::KindMismatch {
                type_tag: def.type_tag.clone(),
                kind: def.kind.to_string(),
                ancestor: parent.type_tag.clone(),
                ancestor_kind: parent.kind.to_string(),
            });
        }
    }

    let own = def
        .fields
        .iter()
        .map(|spec| {
            let mut desc = spec.normalize(def.kind, &def.type_tag)?;
            if desc.doc.is_none() {
                desc.doc = def.param_docs.get(&desc.name).cloned();
            }
            Ok(desc)
        })
        .collect::<SchemaResult<Vec<FieldDescriptor>>>()?;

    let ancestor_fields = ancestor.map(TypeSchema::fields).unwrap_or_default();
    let merged = merge(&def.type_tag, &def.fields, ancestor_fields)?;
    let accessors = AccessorTable::generate(
        &def.type_tag,
        ancestor.map(TypeSchema::accessors),
        &merged,
        &own,
    )?;

    Ok(TypeSchema {
        type_tag: def.type_tag.clone(),
        ancestor: def.ancestor.clone(),
        kind: def.kind,
        merged,
        accessors,
    })
}
