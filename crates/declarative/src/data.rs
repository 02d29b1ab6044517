//! Declarative state for one resource instance
//!
//! [`ResourceData`] is what the host persists between invocations: an
//! optional identifier plus the attribute tree. An identifier means the
//! object is known to exist remotely; clearing it tells the host to drop
//! the object from its state.

use crate::codec::expand_string_list;
use crate::error::{Error, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an attribute tree that has no remote identity yet
    pub fn from_attributes(attributes: BTreeMap<String, Value>) -> Self {
        Self {
            id: None,
            attributes,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Mark the object as gone
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Optional string attribute
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(mismatch(key, "string", other)),
        }
    }

    /// Required string attribute
    pub fn require_string(&self, key: &str) -> Result<String> {
        self.get_string(key)?
            .ok_or_else(|| Error::MissingField(key.to_string()))
    }

    /// Optional bool attribute
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch(key, "bool", other)),
        }
    }

    /// List-of-strings attribute; absence reads as an empty list
    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => expand_string_list(items).map_err(|e| e.in_field(key)),
            Some(other) => Err(mismatch(key, "list", other)),
        }
    }

    /// List or set of nested blocks; absence reads as an empty list
    ///
    /// Each block comes back as its own `ResourceData` (without an id) so
    /// the same typed accessors work one level down.
    pub fn get_blocks(&self, key: &str) -> Result<Vec<ResourceData>> {
        let items = match self.get(key) {
            None => return Ok(Vec::new()),
            Some(Value::List(items)) => items,
            Some(other) => return Err(mismatch(key, "list", other)),
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Map(map) => Ok(Self::from_attributes(map.clone())),
                other => Err(mismatch(&format!("{key}[{index}]"), "block", other)),
            })
            .collect()
    }
}

fn mismatch(field: &str, expected: &str, found: &Value) -> Error {
    Error::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        found: found.type_name(),
    }
}
