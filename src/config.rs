//! Provider configuration
//!
//! Connection settings come from three sources, highest precedence first:
//! 1. Command-line flags
//! 2. Environment variables
//! 3. `~/.config/elasticstack/provider.toml`
//!
//! An empty value counts as missing and falls through to the next source.

use anyhow::{Context, Result};
use declarative::{REDACTED, ResourceData};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::provider::provider_schema;

pub const ENV_URL: &str = "ELASTICSEARCH_URL";
pub const ENV_USER: &str = "ELASTICSEARCH_USER";
pub const ENV_PASS: &str = "ELASTICSEARCH_PASS";
pub const ENV_PASSWORD: &str = "ELASTICSEARCH_PASSWORD";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A string that never shows up in `Debug` output or logs
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The actual value; only for handing to the HTTP layer
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<Secret>,
    pub timeout_secs: Option<u64>,
}

/// Contents of `provider.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub elasticsearch_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load a config file; a missing file is an empty config
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no provider config at {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))
    }
}

/// Resolved connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub elasticsearch_url: String,
    pub username: String,
    pub password: Secret,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("elasticstack").join("provider.toml"))
    }

    /// Resolve from flags, the process environment and the config file
    pub fn load(overrides: &Overrides, path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        let file = FileConfig::load(&path)?;
        Self::resolve(overrides, |key| std::env::var(key).ok(), file)
    }

    /// Merge the three sources
    ///
    /// `lookup` stands in for the environment so resolution can be tested
    /// without touching process state.
    pub fn resolve(
        overrides: &Overrides,
        lookup: impl Fn(&str) -> Option<String>,
        file: FileConfig,
    ) -> Result<Self> {
        let env = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let url = first_present([
            overrides.url.clone(),
            env(ENV_URL),
            file.elasticsearch_url,
        ]);
        let username = first_present([
            overrides.username.clone(),
            env(ENV_USER),
            file.username,
        ]);
        let password = first_present([
            overrides.password.as_ref().map(|p| p.expose().to_string()),
            env(ENV_PASS),
            env(ENV_PASSWORD),
            file.password,
        ]);

        let mut data = ResourceData::new();
        for (key, value) in [
            ("elasticsearch_url", url),
            ("username", username),
            ("password", password),
        ] {
            if let Some(value) = value {
                data.set(key, value);
            }
        }
        provider_schema().conform(&data).with_context(|| {
            format!(
                "Incomplete provider configuration; set it with flags, \
                 {ENV_URL} / {ENV_USER} / {ENV_PASS}, or the config file"
            )
        })?;

        Ok(Self {
            elasticsearch_url: data.require_string("elasticsearch_url")?,
            username: data.require_string("username")?,
            password: Secret::new(data.require_string("password")?),
            timeout_secs: overrides
                .timeout_secs
                .or(file.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Settings for the HTTP client
    pub fn client_config(&self) -> secapi::ClientConfig {
        secapi::ClientConfig::new(
            &self.elasticsearch_url,
            &self.username,
            self.password.expose(),
        )
        .timeout(Duration::from_secs(self.timeout_secs))
    }
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn full_env() -> impl Fn(&str) -> Option<String> {
        env(&[
            (ENV_URL, "http://env:9200"),
            (ENV_USER, "env-user"),
            (ENV_PASS, "env-pass"),
        ])
    }

    #[test]
    fn test_env_only() {
        let config =
            ProviderConfig::resolve(&Overrides::default(), full_env(), FileConfig::default())
                .unwrap();
        assert_eq!(config.elasticsearch_url, "http://env:9200");
        assert_eq!(config.username, "env-user");
        assert_eq!(config.password.expose(), "env-pass");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_flags_beat_env_beat_file() {
        let overrides = Overrides {
            url: Some("http://flag:9200".to_string()),
            ..Default::default()
        };
        let file = FileConfig {
            elasticsearch_url: Some("http://file:9200".to_string()),
            username: Some("file-user".to_string()),
            password: Some("file-pass".to_string()),
            timeout_secs: Some(5),
        };

        let config = ProviderConfig::resolve(&overrides, full_env(), file).unwrap();

        assert_eq!(config.elasticsearch_url, "http://flag:9200");
        assert_eq!(config.username, "env-user");
        assert_eq!(config.password.expose(), "env-pass");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_password_fallback_variable() {
        let lookup = env(&[
            (ENV_URL, "http://env:9200"),
            (ENV_USER, "u"),
            (ENV_PASSWORD, "fallback"),
        ]);
        let config =
            ProviderConfig::resolve(&Overrides::default(), lookup, FileConfig::default()).unwrap();
        assert_eq!(config.password.expose(), "fallback");
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let lookup = env(&[(ENV_URL, "http://env:9200"), (ENV_USER, ""), (ENV_PASS, "p")]);
        let file = FileConfig {
            username: Some("file-user".to_string()),
            ..Default::default()
        };
        let config = ProviderConfig::resolve(&Overrides::default(), lookup, file).unwrap();
        assert_eq!(config.username, "file-user");
    }

    #[test]
    fn test_missing_password_is_an_error() {
        let lookup = env(&[(ENV_URL, "http://env:9200"), (ENV_USER, "u")]);
        let err = ProviderConfig::resolve(&Overrides::default(), lookup, FileConfig::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("missing required field: password"));
    }

    #[test]
    fn test_debug_hides_password() {
        let config =
            ProviderConfig::resolve(&Overrides::default(), full_env(), FileConfig::default())
                .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("env-pass"));
        assert!(debug.contains(REDACTED));
        assert!(!format!("{:?}", config.client_config()).contains("env-pass"));
    }

    #[test]
    fn test_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("provider.toml");
        std::fs::write(
            &path,
            "elasticsearch_url = \"https://file:9200\"\nusername = \"elastic\"\npassword = \"changeme\"\ntimeout_secs = 10\n",
        )
        .unwrap();

        let file = FileConfig::load(&path).unwrap();
        let config = ProviderConfig::resolve(&Overrides::default(), env(&[]), file).unwrap();

        assert_eq!(config.elasticsearch_url, "https://file:9200");
        assert_eq!(config.client_config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let file = FileConfig::load(&temp_dir.path().join("absent.toml")).unwrap();
        assert!(file.elasticsearch_url.is_none());
    }

    #[test]
    fn test_unknown_file_key_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("provider.toml");
        std::fs::write(&path, "url = \"http://x\"\n").unwrap();
        assert!(FileConfig::load(&path).is_err());
    }
}
