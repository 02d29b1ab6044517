//! # secapi
//!
//! Blocking client for the Elasticsearch security API.
//!
//! This crate provides:
//! - Typed requests for roles and role mappings (put, get, delete)
//! - Wire types, including the recursive role-mapping rule expression
//! - A pluggable [`transport::Transport`], with a `ureq` implementation for
//!   real clusters and an in-memory [`MockTransport`] for tests
//!
//! ## Example
//!
//! ```no_run
//! use secapi::{ClientConfig, Role, SecurityClient};
//!
//! let client = SecurityClient::new(&ClientConfig::new(
//!     "https://localhost:9200",
//!     "elastic",
//!     "changeme",
//! ))
//! .expect("invalid config");
//!
//! let role = Role {
//!     cluster: vec!["monitor".to_string()],
//!     ..Default::default()
//! };
//! client.put_role("readers", &role).unwrap();
//!
//! match client.get_role("readers").unwrap() {
//!     Some(role) => println!("cluster privileges: {:?}", role.cluster),
//!     None => println!("gone"),
//! }
//! ```
//!
//! ## Status handling
//!
//! Only HTTP 200 is success. Any other status becomes [`Error::Api`] with
//! the raw response body; 404 and 500 are treated alike. A GET whose
//! response map lacks the requested name means the object does not exist.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod rules;
pub mod transport;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use rules::{FieldValue, RuleError, RuleExpression};
pub use transport::MockTransport;
pub use transport::http::{ClientConfig, HttpTransport};
pub use types::{IndexPrivilege, Role, RoleMapping, RoleMappingRecord};

use serde::Serialize;
use serde::de::DeserializeOwned;
use transport::{ApiRequest, ApiResponse, Method, ROLE_MAPPING_PREFIX, ROLE_PREFIX, Transport};

/// Client for the security API.
///
/// Holds only the transport; it is safe to share between threads and is
/// never mutated by requests.
pub struct SecurityClient {
    transport: Box<dyn Transport>,
}

impl SecurityClient {
    /// Create a client that talks HTTP to a real cluster.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(Box::new(HttpTransport::new(config)?)))
    }

    /// Create a client with a custom transport (useful for testing).
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    // =========================================================================
    // Roles
    // =========================================================================

    /// Create or overwrite a role.
    pub fn put_role(&self, name: &str, role: &Role) -> Result<()> {
        self.put(&role_path(name)?, role)
    }

    /// Fetch a role; `None` when it does not exist.
    pub fn get_role(&self, name: &str) -> Result<Option<Role>> {
        self.get_named(&role_path(name)?, name)
    }

    /// Delete a role.
    pub fn delete_role(&self, name: &str) -> Result<()> {
        self.execute(ApiRequest::new(Method::Delete, role_path(name)?))
            .map(drop)
    }

    // =========================================================================
    // Role mappings
    // =========================================================================

    /// Create or overwrite a role mapping.
    pub fn put_role_mapping(&self, name: &str, mapping: &RoleMapping) -> Result<()> {
        self.put(&role_mapping_path(name)?, mapping)
    }

    /// Fetch a role mapping; `None` when it does not exist.
    pub fn get_role_mapping(&self, name: &str) -> Result<Option<RoleMappingRecord>> {
        self.get_named(&role_mapping_path(name)?, name)
    }

    /// Delete a role mapping.
    pub fn delete_role_mapping(&self, name: &str) -> Result<()> {
        self.execute(ApiRequest::new(Method::Delete, role_mapping_path(name)?))
            .map(drop)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn put<T: Serialize>(&self, path: &str, body: &T) -> Result<()> {
        let body = serde_json::to_string(body)?;
        self.execute(ApiRequest::new(Method::Put, path).with_body(body))
            .map(drop)
    }

    /// GET a `{"<name>": {...}}` map and pick out `name`.
    fn get_named<T: DeserializeOwned>(&self, path: &str, name: &str) -> Result<Option<T>> {
        let response = self.execute(ApiRequest::new(Method::Get, path))?;

        let decode_error = |source| Error::Decode {
            path: path.to_string(),
            source,
        };
        let mut found: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&response.body).map_err(decode_error)?;

        match found.remove(name) {
            Some(item) => serde_json::from_value(item).map(Some).map_err(decode_error),
            None => Ok(None),
        }
    }

    /// Send a request; anything but 200 is an API error.
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        log::debug!("{} {}", request.method, request.path);
        let response = self.transport.send(&request)?;

        if !response.is_ok() {
            return Err(Error::Api {
                method: request.method,
                path: request.path,
                status: response.status,
                body: response.body,
            });
        }
        Ok(response)
    }
}

impl std::fmt::Debug for SecurityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityClient").finish_non_exhaustive()
    }
}

/// Path for a role, with the name percent-encoded.
pub fn role_path(name: &str) -> Result<String> {
    named_path(ROLE_PREFIX, name)
}

/// Path for a role mapping, with the name percent-encoded.
pub fn role_mapping_path(name: &str) -> Result<String> {
    named_path(ROLE_MAPPING_PREFIX, name)
}

fn named_path(prefix: &str, name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(format!("{}{}", prefix, urlencoding::encode(name)))
}
