//! Error types for the declarative crate

use thiserror::Error;

/// Errors raised while converting, validating or conforming declarative state
///
/// Every variant is detected locally, before a handler talks to anything
/// remote.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A list element that should be a string is not
    #[error("element {index} is a {found}, expected a string")]
    NotAString { index: usize, found: &'static str },

    /// Wraps another error with the field it occurred in
    #[error("{field}: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<Error>,
    },

    /// A required field is absent or null
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A field holds a value of the wrong shape
    #[error("field {field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    /// State carries a field the schema does not declare
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A collection holds more elements than allowed
    #[error("field {field}: expected at most {max} items, found {found}")]
    TooManyItems {
        field: String,
        max: usize,
        found: usize,
    },

    /// A collection holds fewer elements than required
    #[error("field {field}: expected at least {min} items, found {found}")]
    TooFewItems {
        field: String,
        min: usize,
        found: usize,
    },

    /// A schema declaration is internally inconsistent
    #[error("invalid schema for {field}: {reason}")]
    InvalidSchema { field: String, reason: String },

    /// Resource-specific validation failure
    #[error("{0}")]
    Validation(String),

    /// The resource type has no lifecycle implementation yet
    #[error("{resource_type} is not implemented")]
    NotImplemented { resource_type: String },

    /// Write succeeded but the follow-up read found nothing
    #[error("{resource_type} {id} was written but is absent on read-back")]
    VanishedAfterWrite { resource_type: String, id: String },

    /// Import targeted an object that does not exist remotely
    #[error("cannot import {resource_type} {id}: object does not exist")]
    ImportNotFound { resource_type: String, id: String },
}

impl Error {
    /// Attach a field name to this error
    pub fn in_field(self, field: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error was raised by local validation of state or schema
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Field { source, .. } => source.is_validation(),
            Self::NotImplemented { .. }
            | Self::VanishedAfterWrite { .. }
            | Self::ImportNotFound { .. } => false,
            _ => true,
        }
    }
}

/// Result type for declarative operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_context_in_message() {
        let err = Error::NotAString {
            index: 1,
            found: "bool",
        }
        .in_field("roles");
        assert_eq!(err.to_string(), "roles: element 1 is a bool, expected a string");
        assert!(err.is_validation());
    }

    #[test]
    fn test_lifecycle_errors_are_not_validation() {
        let err = Error::NotImplemented {
            resource_type: "elasticstack_auth_user".into(),
        };
        assert!(!err.is_validation());
        assert!(!err.in_field("username").is_validation());
    }
}
