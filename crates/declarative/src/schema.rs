//! Schema declarations for declarative state
//!
//! A [`Schema`] maps field names to [`FieldSchema`]s. The host uses it to
//! fill defaults and to reject malformed state before any handler runs;
//! [`Schema::validate`] checks the declaration itself.

use crate::data::ResourceData;
use crate::error::{Error, Result};
use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Placeholder shown instead of sensitive values
pub const REDACTED: &str = "(sensitive)";

/// Shape of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Bool,
    /// Free-form keyed structure
    Map,
    /// Ordered sequence
    List(Box<FieldType>),
    /// Unordered collection without duplicates
    Set(Box<FieldType>),
    /// Nested block; only valid as a list or set element
    Block(Schema),
}

impl FieldType {
    pub fn list_of(elem: FieldType) -> Self {
        Self::List(Box::new(elem))
    }

    pub fn set_of(elem: FieldType) -> Self {
        Self::Set(Box::new(elem))
    }

    fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_))
    }

    fn name(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::Bool => "bool".into(),
            Self::Map => "map".into(),
            Self::List(elem) => format!("list of {}", elem.name()),
            Self::Set(elem) => format!("set of {}", elem.name()),
            Self::Block(_) => "block".into(),
        }
    }
}

/// Declaration of a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSchema {
    fn new(field_type: FieldType, required: bool) -> Self {
        Self {
            field_type,
            required,
            default: None,
            sensitive: false,
            min_items: None,
            max_items: None,
            description: None,
        }
    }

    pub fn required(field_type: FieldType) -> Self {
        Self::new(field_type, true)
    }

    pub fn optional(field_type: FieldType) -> Self {
        Self::new(field_type, false)
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Field declarations for a resource, a provider or a nested block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, FieldSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field declaration
    pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check the declaration itself for contradictions
    pub fn validate(&self) -> Result<()> {
        self.validate_at("")
    }

    fn validate_at(&self, prefix: &str) -> Result<()> {
        for (name, field) in &self.fields {
            let path = join(prefix, name);
            let invalid = |reason: &str| Error::InvalidSchema {
                field: path.clone(),
                reason: reason.to_string(),
            };

            if field.required && field.default.is_some() {
                return Err(invalid("a required field cannot have a default"));
            }
            if (field.min_items.is_some() || field.max_items.is_some())
                && !field.field_type.is_collection()
            {
                return Err(invalid("item bounds only apply to lists and sets"));
            }
            if let (Some(min), Some(max)) = (field.min_items, field.max_items)
                && min > max
            {
                return Err(invalid("min_items is greater than max_items"));
            }
            if let Some(default) = &field.default {
                conform_value(&path, &field.field_type, default)
                    .map_err(|e| invalid(&format!("default does not conform: {e}")))?;
            }

            match &field.field_type {
                FieldType::Block(_) => {
                    return Err(invalid("a block is only valid as a list or set element"));
                }
                FieldType::List(elem) | FieldType::Set(elem) => {
                    validate_elem(&path, elem)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Fill defaults and drop duplicate set elements, recursively
    pub fn normalize(&self, data: &mut ResourceData) {
        self.normalize_attrs(data.attributes_mut());
    }

    fn normalize_attrs(&self, attrs: &mut BTreeMap<String, Value>) {
        for (name, field) in &self.fields {
            let missing = attrs.get(name).is_none_or(Value::is_null);
            if missing {
                if let Some(default) = &field.default {
                    attrs.insert(name.clone(), default.clone());
                }
                continue;
            }

            if let Some(value) = attrs.get_mut(name) {
                normalize_value(&field.field_type, value);
            }
        }
    }

    /// Check that state matches the declaration
    pub fn conform(&self, data: &ResourceData) -> Result<()> {
        self.conform_attrs("", data.attributes())
    }

    fn conform_attrs(&self, prefix: &str, attrs: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(unknown) = attrs.keys().find(|k| !self.fields.contains_key(*k)) {
            return Err(Error::UnknownField(join(prefix, unknown)));
        }

        for (name, field) in &self.fields {
            let path = join(prefix, name);
            let value = match attrs.get(name) {
                Some(v) if !v.is_null() => v,
                _ if field.required => return Err(Error::MissingField(path)),
                _ => continue,
            };

            conform_value(&path, &field.field_type, value)?;

            if let Some(items) = value.as_list() {
                if let Some(max) = field.max_items
                    && items.len() > max
                {
                    return Err(Error::TooManyItems {
                        field: path,
                        max,
                        found: items.len(),
                    });
                }
                if let Some(min) = field.min_items
                    && items.len() < min
                {
                    return Err(Error::TooFewItems {
                        field: path,
                        min,
                        found: items.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Copy of `data` with sensitive top-level values masked
    pub fn redact(&self, data: &ResourceData) -> ResourceData {
        let mut redacted = data.clone();
        for (name, field) in &self.fields {
            if field.sensitive && redacted.get(name).is_some() {
                redacted.set(name.clone(), REDACTED);
            }
        }
        redacted
    }
}

fn validate_elem(path: &str, elem: &FieldType) -> Result<()> {
    match elem {
        FieldType::Block(schema) => schema.validate_at(path),
        FieldType::List(_) | FieldType::Set(_) => Err(Error::InvalidSchema {
            field: path.to_string(),
            reason: "nested collections are not supported".to_string(),
        }),
        _ => Ok(()),
    }
}

fn normalize_value(field_type: &FieldType, value: &mut Value) {
    let (elem, dedupe) = match field_type {
        FieldType::List(elem) => (elem, false),
        FieldType::Set(elem) => (elem, true),
        _ => return,
    };
    let Value::List(items) = value else {
        return;
    };

    if let FieldType::Block(schema) = elem.as_ref() {
        for item in items.iter_mut() {
            if let Value::Map(attrs) = item {
                schema.normalize_attrs(attrs);
            }
        }
    }

    if dedupe {
        let mut unique: Vec<Value> = Vec::with_capacity(items.len());
        for item in items.drain(..) {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        *items = unique;
    }
}

fn conform_value(path: &str, field_type: &FieldType, value: &Value) -> Result<()> {
    let ok = match (field_type, value) {
        (FieldType::String, Value::String(_))
        | (FieldType::Bool, Value::Bool(_))
        | (FieldType::Map, Value::Map(_)) => true,
        (FieldType::List(elem) | FieldType::Set(elem), Value::List(items)) => {
            for (index, item) in items.iter().enumerate() {
                conform_value(&format!("{path}[{index}]"), elem, item)?;
            }
            true
        }
        (FieldType::Block(schema), Value::Map(attrs)) => {
            schema.conform_attrs(path, attrs)?;
            true
        }
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            field: path.to_string(),
            expected: field_type.name(),
            found: value.type_name(),
        })
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
