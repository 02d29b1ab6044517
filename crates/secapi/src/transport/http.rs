//! HTTP transport backed by `ureq`.
//!
//! One blocking round-trip per request. The only cancellation mechanism is
//! the global timeout in [`ClientConfig`]; there is no retry.

use super::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::{Error, Result};
use base64::Engine;
use std::fmt;
use std::time::Duration;

const USER_AGENT: &str = concat!("secapi/", env!("CARGO_PKG_VERSION"));

/// Default global timeout for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a cluster.
#[derive(Clone)]
pub struct ClientConfig {
    /// Cluster URL, e.g. `https://localhost:9200`.
    pub url: String,
    /// Username for basic authentication.
    pub username: String,
    /// Password for basic authentication.
    pub password: String,
    /// Global timeout per request.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a config with the default timeout.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"(sensitive)")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Transport talking to a real cluster.
pub struct HttpTransport {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Cluster URL without a trailing slash.
    base_url: String,
    /// Precomputed `Authorization` header value.
    authorization: String,
}

impl HttpTransport {
    /// Build a transport from connection settings.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.url)?;

        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build();

        Ok(Self {
            agent: ureq::Agent::new_with_config(agent_config),
            base_url,
            authorization: basic_auth(&config.username, &config.password),
        })
    }

    /// Get the cluster URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url(&request.path);
        let auth = self.authorization.as_str();

        let result = match request.method {
            Method::Get => self
                .agent
                .get(&url)
                .header("Authorization", auth)
                .header("User-Agent", USER_AGENT)
                .header("Accept", "application/json")
                .call(),
            Method::Delete => self
                .agent
                .delete(&url)
                .header("Authorization", auth)
                .header("User-Agent", USER_AGENT)
                .header("Accept", "application/json")
                .call(),
            Method::Put => self
                .agent
                .put(&url)
                .header("Authorization", auth)
                .header("User-Agent", USER_AGENT)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .send(request.body.as_deref().unwrap_or("{}")),
        };

        let mut response = result?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        log::trace!("{} {} -> {}", request.method, request.path, status);

        Ok(ApiResponse { status, body })
    }
}

fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("cluster URL is empty".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "cluster URL must start with http:// or https://, got {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

fn basic_auth(username: &str, password: &str) -> String {
    let credentials =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {credentials}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(basic_auth("elastic", "changeme"), "Basic ZWxhc3RpYzpjaGFuZ2VtZQ==");
    }

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(
            normalize_base_url(" https://es.local:9200/ ").unwrap(),
            "https://es.local:9200"
        );
        assert!(matches!(normalize_base_url(""), Err(Error::Config(_))));
        assert!(matches!(
            normalize_base_url("es.local:9200"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_url_building() {
        let transport =
            HttpTransport::new(&ClientConfig::new("http://localhost:9200/", "u", "p")).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:9200");
        assert_eq!(
            transport.url("/_security/role/readers"),
            "http://localhost:9200/_security/role/readers"
        );
    }

    #[test]
    fn test_config_debug_hides_password() {
        let config = ClientConfig::new("http://localhost:9200", "elastic", "hunter2")
            .timeout(Duration::from_secs(5));
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("elastic"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_transport_debug_hides_credentials() {
        let transport =
            HttpTransport::new(&ClientConfig::new("http://localhost:9200", "elastic", "hunter2"))
                .unwrap();
        let debug = format!("{transport:?}");
        assert!(!debug.contains("Basic"));
    }
}
