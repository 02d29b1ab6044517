//! Transport trait and implementations for reaching the security API.
//!
//! This module provides the [`Transport`] trait and two implementations:
//! [`http::HttpTransport`] for a real cluster and [`MockTransport`] for
//! tests.
//!
//! # Testing
//!
//! Use [`MockTransport`] for testing without network access:
//!
//! ```
//! use secapi::transport::{MockTransport, Method, ApiRequest, Transport};
//!
//! let mock = MockTransport::new();
//! let response = mock
//!     .send(&ApiRequest::new(Method::Put, "/_security/role/readers").with_body(r#"{"cluster":["monitor"]}"#))
//!     .unwrap();
//! assert_eq!(response.status, 200);
//! assert_eq!(mock.request_count(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use serde_json::{Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Path prefix for role endpoints.
pub const ROLE_PREFIX: &str = "/_security/role/";

/// Path prefix for role-mapping endpoints.
pub const ROLE_MAPPING_PREFIX: &str = "/_security/role_mapping/";

/// HTTP methods used by the security API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET.
    Get,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// A request to the security API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Request method.
    pub method: Method,
    /// Path relative to the cluster URL, starting with `/`.
    pub path: String,
    /// JSON body.
    pub body: Option<String>,
}

impl ApiRequest {
    /// Create a request without a body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A response from the security API, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body.
    pub body: String,
}

impl ApiResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only 200 counts as success for the security API.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Transport trait for sending requests.
///
/// Implementations return `Ok` for every response that arrived, whatever
/// its status, and `Err` only when no response was obtained.
pub trait Transport: Send + Sync {
    /// Send one request and wait for its response.
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// In-memory stand-in for the security API.
///
/// Stores role and role-mapping documents, answers the six security
/// endpoints the way a cluster does, and records every request it sees.
/// Responses can also be primed; primed responses are served first, in
/// order, regardless of the request.
///
/// A GET for an unknown name answers 200 with an empty object. That is
/// the contract [`crate::SecurityClient`] treats as "absent"; a live
/// cluster answers 404 instead, which the client reports as an API error.
///
/// Clones share state, so a test can keep one handle and give the other
/// to a client.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    documents: BTreeMap<(Kind, String), Value>,
    requests: Vec<ApiRequest>,
    primed: VecDeque<Primed>,
}

#[derive(Debug)]
enum Primed {
    Response(ApiResponse),
    TransportError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Kind {
    Role,
    RoleMapping,
}

impl Kind {
    fn parse(path: &str) -> Option<(Self, String)> {
        let (kind, raw) = if let Some(rest) = path.strip_prefix(ROLE_MAPPING_PREFIX) {
            (Self::RoleMapping, rest)
        } else if let Some(rest) = path.strip_prefix(ROLE_PREFIX) {
            (Self::Role, rest)
        } else {
            return None;
        };
        let name = urlencoding::decode(raw).ok()?.into_owned();
        (!name.is_empty()).then_some((kind, name))
    }

    fn label(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::RoleMapping => "role_mapping",
        }
    }

    /// Fill in what a cluster adds to a stored document.
    fn normalize(self, doc: &mut Value) {
        let Some(obj) = doc.as_object_mut() else {
            return;
        };
        let defaults = match self {
            Self::Role => json!({
                "cluster": [],
                "indices": [],
                "applications": [],
                "run_as": [],
                "metadata": {},
                "transient_metadata": {"enabled": true}
            }),
            Self::RoleMapping => json!({"metadata": {}}),
        };
        if let Value::Object(defaults) = defaults {
            for (key, value) in defaults {
                obj.entry(key).or_insert(value);
            }
        }
    }
}

impl MockTransport {
    /// Create a new empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this response to the next request.
    pub fn push_response(&self, response: ApiResponse) {
        self.lock().primed.push_back(Primed::Response(response));
    }

    /// Fail the next request as if the connection broke.
    pub fn push_transport_error(&self, message: impl Into<String>) {
        self.lock()
            .primed
            .push_back(Primed::TransportError(message.into()));
    }

    /// Store a role document directly, bypassing requests.
    pub fn insert_role(&self, name: &str, doc: Value) {
        self.insert(Kind::Role, name, doc);
    }

    /// Store a role-mapping document directly, bypassing requests.
    pub fn insert_role_mapping(&self, name: &str, doc: Value) {
        self.insert(Kind::RoleMapping, name, doc);
    }

    /// Stored role document.
    pub fn role(&self, name: &str) -> Option<Value> {
        self.lock().documents.get(&(Kind::Role, name.to_string())).cloned()
    }

    /// Stored role-mapping document.
    pub fn role_mapping(&self, name: &str) -> Option<Value> {
        self.lock()
            .documents
            .get(&(Kind::RoleMapping, name.to_string()))
            .cloned()
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn insert(&self, kind: Kind, name: &str, mut doc: Value) {
        kind.normalize(&mut doc);
        self.lock().documents.insert((kind, name.to_string()), doc);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    fn handle(state: &mut MockState, request: &ApiRequest) -> ApiResponse {
        let Some((kind, name)) = Kind::parse(&request.path) else {
            return ApiResponse::new(
                404,
                json!({"error": format!("no handler found for uri [{}]", request.path), "status": 404})
                    .to_string(),
            );
        };
        let key = (kind, name.clone());

        match request.method {
            Method::Get => {
                let mut found = serde_json::Map::new();
                if let Some(doc) = state.documents.get(&key) {
                    found.insert(name, doc.clone());
                }
                ApiResponse::new(200, Value::Object(found).to_string())
            }
            Method::Put => {
                let parsed = request
                    .body
                    .as_deref()
                    .map(serde_json::from_str::<Value>);
                let mut doc = match parsed {
                    Some(Ok(doc @ Value::Object(_))) => doc,
                    _ => {
                        return ApiResponse::new(
                            400,
                            json!({"error": "request body is required and must be an object", "status": 400})
                                .to_string(),
                        );
                    }
                };
                kind.normalize(&mut doc);
                let created = state.documents.insert(key, doc).is_none();
                let body = match kind {
                    Kind::Role => json!({"role": {"created": created}}),
                    Kind::RoleMapping => json!({"role_mapping": {"created": created}}),
                };
                ApiResponse::new(200, body.to_string())
            }
            Method::Delete => {
                if state.documents.remove(&key).is_some() {
                    ApiResponse::new(200, json!({"found": true}).to_string())
                } else {
                    log::trace!("mock: {} {} not found", kind.label(), name);
                    ApiResponse::new(404, json!({"found": false}).to_string())
                }
            }
        }
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        match state.primed.pop_front() {
            Some(Primed::Response(response)) => Ok(response),
            Some(Primed::TransportError(message)) => Err(Error::transport(message)),
            None => Ok(Self::handle(&mut state, request)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(path: &str, body: &str) -> ApiRequest {
        ApiRequest::new(Method::Put, path).with_body(body)
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Put.to_string(), "PUT");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_mock_put_then_get() {
        let mock = MockTransport::new();
        let created = mock
            .send(&put("/_security/role/readers", r#"{"cluster":["monitor"]}"#))
            .unwrap();
        assert_eq!(created.status, 200);
        assert!(created.body.contains(r#""created":true"#));

        let got = mock
            .send(&ApiRequest::new(Method::Get, "/_security/role/readers"))
            .unwrap();
        let body: Value = serde_json::from_str(&got.body).unwrap();
        assert_eq!(body["readers"]["cluster"], json!(["monitor"]));
        assert_eq!(body["readers"]["run_as"], json!([]));
    }

    #[test]
    fn test_mock_overwrite_reports_not_created() {
        let mock = MockTransport::new();
        mock.send(&put("/_security/role/r", "{}")).unwrap();
        let second = mock.send(&put("/_security/role/r", "{}")).unwrap();
        assert!(second.body.contains(r#""created":false"#));
    }

    #[test]
    fn test_mock_get_missing_is_empty_object() {
        let mock = MockTransport::new();
        let got = mock
            .send(&ApiRequest::new(Method::Get, "/_security/role_mapping/nobody"))
            .unwrap();
        assert_eq!(got, ApiResponse::new(200, "{}"));
    }

    #[test]
    fn test_mock_delete() {
        let mock = MockTransport::new();
        mock.insert_role("readers", json!({"cluster": ["monitor"]}));

        let deleted = mock
            .send(&ApiRequest::new(Method::Delete, "/_security/role/readers"))
            .unwrap();
        assert_eq!(deleted.status, 200);
        assert!(mock.role("readers").is_none());

        let again = mock
            .send(&ApiRequest::new(Method::Delete, "/_security/role/readers"))
            .unwrap();
        assert_eq!(again, ApiResponse::new(404, r#"{"found":false}"#));
    }

    #[test]
    fn test_mock_kinds_are_separate() {
        let mock = MockTransport::new();
        mock.insert_role("same", json!({}));
        assert!(mock.role_mapping("same").is_none());
    }

    #[test]
    fn test_mock_decodes_path_names() {
        let mock = MockTransport::new();
        mock.send(&put("/_security/role/my%20role", "{}")).unwrap();
        assert!(mock.role("my role").is_some());
    }

    #[test]
    fn test_mock_rejects_bad_body() {
        let mock = MockTransport::new();
        let response = mock.send(&put("/_security/role/r", "[]")).unwrap();
        assert_eq!(response.status, 400);
        assert!(mock.role("r").is_none());
    }

    #[test]
    fn test_mock_unknown_path() {
        let mock = MockTransport::new();
        let response = mock
            .send(&ApiRequest::new(Method::Get, "/_security/user/elastic"))
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_mock_primed_responses_come_first() {
        let mock = MockTransport::new();
        mock.push_response(ApiResponse::new(500, "boom"));
        mock.push_transport_error("connection reset");

        let first = mock
            .send(&ApiRequest::new(Method::Get, "/_security/role/r"))
            .unwrap();
        assert_eq!(first, ApiResponse::new(500, "boom"));

        let second = mock.send(&ApiRequest::new(Method::Get, "/_security/role/r"));
        assert!(matches!(second, Err(Error::Transport { .. })));

        let third = mock
            .send(&ApiRequest::new(Method::Get, "/_security/role/r"))
            .unwrap();
        assert_eq!(third.status, 200);
        assert_eq!(mock.request_count(), 3);
    }

    #[test]
    fn test_mock_clones_share_state() {
        let mock = MockTransport::new();
        let handle = mock.clone();
        mock.send(&put("/_security/role/r", "{}")).unwrap();
        assert_eq!(handle.request_count(), 1);
        handle.insert_role("r2", json!({}));
        assert!(mock.role("r2").is_some());
    }
}
