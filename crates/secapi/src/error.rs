//! Error types for security API operations.
//!
//! Every error is terminal for the call that produced it. Categories exist
//! so a caller can report what went wrong; nothing in this crate retries.

use crate::transport::Method;
use std::fmt;

/// Result type alias for security API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of security API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection failure, timeout, TLS or I/O problem.
    Transport,
    /// The cluster answered with a non-200 status.
    Api,
    /// The cluster answered 200 but the body could not be decoded.
    Decode,
    /// A request body could not be encoded.
    Encode,
    /// The client could not be configured.
    Config,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Could not reach the cluster",
            Self::Api => "The cluster rejected the request",
            Self::Decode => "Unexpected response from the cluster",
            Self::Encode => "Could not build the request",
            Self::Config => "Invalid client configuration",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transport => "Check the cluster URL, network access and timeout",
            Self::Api => "Check the response body for the reason, then fix the input or credentials",
            Self::Decode => "Check that the URL points at an Elasticsearch cluster",
            Self::Encode => "Check the resource definition for unsupported values",
            Self::Config => "Check the provider URL, username and password",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the security API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a response.
    #[error("transport error: {message}")]
    Transport {
        /// Error message from the HTTP layer.
        message: String,
    },

    /// Non-200 response. The raw body is kept verbatim.
    #[error("{method} {path} returned HTTP {status}: {body}")]
    Api {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// 200 response with a body that does not decode.
    #[error("invalid response from {path}: {source}")]
    Decode {
        /// Request path.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Resource name that cannot be used as a URL key.
    #[error("invalid resource name: {0:?}")]
    InvalidName(String),

    /// Client construction failed.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl Error {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::Api { .. } => ErrorCategory::Api,
            Error::Decode { .. } => ErrorCategory::Decode,
            Error::Encode(_) | Error::InvalidName(_) => ErrorCategory::Encode,
            Error::Config(_) => ErrorCategory::Config,
        }
    }

    /// HTTP status of an API error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body of an API error.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Api { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16) -> Error {
        Error::Api {
            method: Method::Delete,
            path: "/_security/role/readers".to_string(),
            status,
            body: r#"{"found":false}"#.to_string(),
        }
    }

    #[test]
    fn test_error_category_description() {
        assert!(!ErrorCategory::Transport.description().is_empty());
        assert!(!ErrorCategory::Api.description().is_empty());
        assert!(!ErrorCategory::Decode.description().is_empty());
    }

    #[test]
    fn test_error_category_advice() {
        assert!(!ErrorCategory::Transport.advice().is_empty());
        assert!(!ErrorCategory::Api.advice().is_empty());
        assert!(!ErrorCategory::Encode.advice().is_empty());
    }

    #[test]
    fn test_api_error_display_carries_raw_body() {
        let display = api_error(404).to_string();
        assert_eq!(
            display,
            r#"DELETE /_security/role/readers returned HTTP 404: {"found":false}"#
        );
    }

    #[test]
    fn test_api_errors_are_not_classified_by_status() {
        assert_eq!(api_error(404).category(), api_error(500).category());
        assert_eq!(api_error(404).status(), Some(404));
        assert_eq!(api_error(500).body(), Some(r#"{"found":false}"#));
    }

    #[test]
    fn test_transport_error() {
        let err = Error::transport("connection refused");
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Encode);
    }
}
