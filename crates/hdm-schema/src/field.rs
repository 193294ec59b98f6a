//! Field specifications and their normalized descriptor form.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SchemaError, SchemaResult};

/// Which family of object a type belongs to.
///
/// The kind decides which descriptor keys a type may use: plain data types
/// only know `name`, `doc` and `settable`, containers may additionally
/// declare child fields and required names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Group-like object that owns other objects.
    #[default]
    Container,
    /// Dataset-like leaf object holding a data buffer.
    Data,
}

impl SchemaKind {
    /// Descriptor keys accepted for this kind.
    pub fn allowed_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Container => &["name", "doc", "settable", "child", "required_name"],
            Self::Data => &["name", "doc", "settable"],
        }
    }

    fn allows(&self, key: &str) -> bool {
        self.allowed_keys().contains(&key)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => write!(f, "container"),
            Self::Data => write!(f, "data"),
        }
    }
}

fn default_settable() -> bool {
    true
}

/// Normalized description of one field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, unique within a type's resolved field list.
    pub name: String,
    /// Documentation string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Whether a setter is generated. Read-only fields are only filled at
    /// construction time.
    #[serde(default = "default_settable")]
    pub settable: bool,
    /// The assigned object must carry exactly this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_name: Option<String>,
    /// Assigned objects become children of the owner.
    #[serde(default, rename = "child")]
    pub is_child: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            settable: true,
            required_name: None,
            is_child: false,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.settable = false;
        self
    }

    pub fn required_name(mut self, name: impl Into<String>) -> Self {
        self.required_name = Some(name.into());
        self
    }

    pub fn child(mut self) -> Self {
        self.is_child = true;
        self
    }

    /// Keys that differ from a bare `{name}` descriptor.
    fn used_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.doc.is_some() {
            keys.push("doc");
        }
        if !self.settable {
            keys.push("settable");
        }
        if self.required_name.is_some() {
            keys.push("required_name");
        }
        if self.is_child {
            keys.push("child");
        }
        keys
    }
}

/// One entry of a type's own field declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldSpec {
    /// A bare field name, equivalent to `{name: <name>}`.
    Name(String),
    /// A descriptor built in code.
    Descriptor(FieldDescriptor),
    /// A descriptor object read from a schema document, not yet validated.
    Raw(Map<String, Value>),
}

impl FieldSpec {
    /// Interpret a JSON value as a field entry: a string is a bare name, an
    /// object is a descriptor.
    pub fn from_value(value: Value, type_tag: &str) -> SchemaResult<Self> {
        match value {
            Value::String(name) => Ok(Self::Name(name)),
            Value::Object(map) => Ok(Self::Raw(map)),
            other => Err(SchemaError::InvalidDescriptor {
                type_tag: type_tag.to_string(),
                reason: format!("expected a name or an object, got {other}"),
            }),
        }
    }

    /// The declared field name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name.as_str()),
            Self::Descriptor(desc) => Some(desc.name.as_str()),
            Self::Raw(map) => map.get("name").and_then(Value::as_str),
        }
    }

    /// Normalize into a [`FieldDescriptor`], checking the keys against what
    /// `kind` allows.
    pub fn normalize(&self, kind: SchemaKind, type_tag: &str) -> SchemaResult<FieldDescriptor> {
        match self {
            Self::Name(name) => Ok(FieldDescriptor::new(name.clone())),
            Self::Descriptor(desc) => {
                if let Some(key) = desc.used_keys().into_iter().find(|k| !kind.allows(k)) {
                    return Err(unknown_key(type_tag, &desc.name, key));
                }
                Ok(desc.clone())
            }
            Self::Raw(map) => normalize_raw(map, kind, type_tag),
        }
    }
}

impl From<&str> for FieldSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<FieldDescriptor> for FieldSpec {
    fn from(desc: FieldDescriptor) -> Self {
        Self::Descriptor(desc)
    }
}

fn unknown_key(type_tag: &str, field: &str, key: &str) -> SchemaError {
    SchemaError::UnknownKey {
        type_tag: type_tag.to_string(),
        field: field.to_string(),
        key: key.to_string(),
    }
}

fn normalize_raw(
    map: &Map<String, Value>,
    kind: SchemaKind,
    type_tag: &str,
) -> SchemaResult<FieldDescriptor> {
    let name = match map.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(SchemaError::InvalidDescriptor {
                type_tag: type_tag.to_string(),
                reason: format!("'name' must be a string, got {other}"),
            })
        }
        None => {
            return Err(SchemaError::MissingName {
                type_tag: type_tag.to_string(),
            })
        }
    };

    if let Some(key) = map.keys().find(|k| !kind.allows(k)) {
        return Err(unknown_key(type_tag, &name, key));
    }

    let invalid = |key: &str, expected: &str| SchemaError::InvalidDescriptor {
        type_tag: type_tag.to_string(),
        reason: format!("'{key}' of field '{name}' must be {expected}"),
    };

    let mut desc = FieldDescriptor::new(name.clone());
    match map.get("doc") {
        None | Some(Value::Null) => {}
        Some(Value::String(doc)) => desc.doc = Some(doc.clone()),
        Some(_) => return Err(invalid("doc", "a string")),
    }
    match map.get("settable") {
        None => {}
        Some(Value::Bool(b)) => desc.settable = *b,
        Some(_) => return Err(invalid("settable", "a boolean")),
    }
    match map.get("required_name") {
        None | Some(Value::Null) => {}
        Some(Value::String(req)) => desc.required_name = Some(req.clone()),
        Some(_) => return Err(invalid("required_name", "a string")),
    }
    match map.get("child") {
        None => {}
        Some(Value::Bool(b)) => desc.is_child = *b,
        Some(_) => return Err(invalid("child", "a boolean")),
    }
    Ok(desc)
}
