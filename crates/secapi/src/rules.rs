//! Role-mapping rule expressions.
//!
//! A rule is a small recursive predicate over user attributes. On the wire
//! every node is a single-key object:
//!
//! ```json
//! {"all": [
//!     {"field": {"username": "alice"}},
//!     {"except": {"field": {"realm.name": "file"}}}
//! ]}
//! ```
//!
//! Encoding and decoding are written out by hand so the shape above is
//! matched exactly and malformed nodes are rejected with a [`RuleError`].

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar a `field` rule compares against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(serde_json::Number),
    /// String.
    String(String),
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Errors from decoding a rule expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// A node is not a JSON object.
    #[error("rule node must be an object")]
    NotAnObject,

    /// A node has zero or several keys.
    #[error("rule node must have exactly one key, found {0}")]
    NodeArity(usize),

    /// A node key is not one of any/all/except/field.
    #[error("unknown rule kind: {0}")]
    UnknownKind(String),

    /// `any` or `all` is not followed by an array.
    #[error("{0} rule must hold an array")]
    ExpectedArray(&'static str),

    /// `field` does not hold exactly one key/value pair.
    #[error("field rule must hold exactly one key, found {0}")]
    FieldArity(usize),

    /// `field` value is an array or object.
    #[error("field rule value for {0} must be a scalar")]
    NotScalar(String),
}

/// Recursive boolean predicate; each node is exactly one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleExpression {
    /// True if any child is true.
    Any(Vec<RuleExpression>),
    /// True if all children are true.
    All(Vec<RuleExpression>),
    /// True if the child is false.
    Except(Box<RuleExpression>),
    /// True if the named attribute equals the value.
    Field {
        /// Attribute name, e.g. `username` or `realm.name`.
        key: String,
        /// Value to compare with.
        value: FieldValue,
    },
}

impl RuleExpression {
    /// Leaf comparing one attribute to one value.
    pub fn field(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Field {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Negate a rule.
    pub fn except(rule: RuleExpression) -> Self {
        Self::Except(Box::new(rule))
    }

    /// Evaluate against a set of user attributes.
    ///
    /// Values are compared exactly; wildcard and regex syntax in rule
    /// values is not interpreted here.
    pub fn matches(&self, attributes: &BTreeMap<String, FieldValue>) -> bool {
        match self {
            Self::Any(rules) => rules.iter().any(|r| r.matches(attributes)),
            Self::All(rules) => rules.iter().all(|r| r.matches(attributes)),
            Self::Except(rule) => !rule.matches(attributes),
            Self::Field { key, value } => attributes.get(key) == Some(value),
        }
    }

    /// Decode from a JSON tree.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, RuleError> {
        let node = json.as_object().ok_or(RuleError::NotAnObject)?;
        if node.len() != 1 {
            return Err(RuleError::NodeArity(node.len()));
        }
        let Some((kind, body)) = node.iter().next() else {
            return Err(RuleError::NodeArity(0));
        };

        match kind.as_str() {
            "any" => Ok(Self::Any(Self::children(body, "any")?)),
            "all" => Ok(Self::All(Self::children(body, "all")?)),
            "except" => Ok(Self::except(Self::from_json(body)?)),
            "field" => {
                let pairs = body.as_object().ok_or(RuleError::NotAnObject)?;
                if pairs.len() != 1 {
                    return Err(RuleError::FieldArity(pairs.len()));
                }
                let Some((key, raw)) = pairs.iter().next() else {
                    return Err(RuleError::FieldArity(0));
                };
                let value = match raw {
                    serde_json::Value::Null => FieldValue::Null,
                    serde_json::Value::Bool(b) => FieldValue::Bool(*b),
                    serde_json::Value::Number(n) => FieldValue::Number(n.clone()),
                    serde_json::Value::String(s) => FieldValue::String(s.clone()),
                    _ => return Err(RuleError::NotScalar(key.clone())),
                };
                Ok(Self::Field {
                    key: key.clone(),
                    value,
                })
            }
            other => Err(RuleError::UnknownKind(other.to_string())),
        }
    }

    fn children(body: &serde_json::Value, kind: &'static str) -> Result<Vec<Self>, RuleError> {
        body.as_array()
            .ok_or(RuleError::ExpectedArray(kind))?
            .iter()
            .map(Self::from_json)
            .collect()
    }
}

/// `{"<key>": <value>}` body of a field rule.
struct FieldBody<'a>(&'a str, &'a FieldValue);

impl Serialize for FieldBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, self.1)?;
        map.end()
    }
}

impl Serialize for RuleExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Any(rules) => map.serialize_entry("any", rules)?,
            Self::All(rules) => map.serialize_entry("all", rules)?,
            Self::Except(rule) => map.serialize_entry("except", rule)?,
            Self::Field { key, value } => map.serialize_entry("field", &FieldBody(key, value))?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&json).map_err(de::Error::custom)
    }
}
