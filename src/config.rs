//! Access layer configuration
//!
//! The whole decorator chain can be described in one YAML document:
//!
//! ```yaml
//! http:
//!   base_url: https://api.github.com
//!   timeout_seconds: 30
//!   max_retries: 3
//!   retry_backoff:
//!     type: exponential
//!     initial_ms: 100
//!     max_ms: 60000
//!   headers:
//!     Accept: application/vnd.github+json
//!   rate_limit:
//!     requests: 5000
//!     per: hour
//!     burst_size: 100
//! credentials:
//!   type: token
//!   scheme: token
//!   token: "{{ env.GITHUB_TOKEN }}"
//! store:
//!   type: file
//!   path: ~/.cache/gitrest/validators.json
//! cache:
//!   enabled: true
//! ```
//!
//! `{{ env.NAME }}` placeholders are replaced before parsing; an unset
//! variable is an error rather than an empty secret.

use crate::auth::Credentials;
use crate::cache::{
    CachingTransport, DuckDbStore, FileStore, MemoryStore, SharedStore, ValidatorHeaders,
};
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig, StatusClasses, Transport};
use crate::types::BackoffType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::debug;

/// `{{ env.NAME }}` placeholder
static ENV_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*env\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete access layer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessConfig {
    /// Raw transport settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Credential bound to the transport
    #[serde(default)]
    pub credentials: Credentials,

    /// Validator store backend
    #[serde(default)]
    pub store: StoreConfig,

    /// Conditional cache settings
    #[serde(default)]
    pub cache: CacheSettings,
}

impl AccessConfig {
    /// Load a config file, interpolating from the process environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content).with_context(|| format!("in '{}'", path.display()))
    }

    /// Parse a YAML document, interpolating from the process environment
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_yaml_with(yaml, |name| std::env::var(name).ok())
    }

    /// Parse a YAML document with a custom variable lookup
    pub fn from_yaml_with<F>(yaml: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rendered = interpolate_env(yaml, lookup)?;
        let config: Self = if rendered.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&rendered)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<()> {
        if let Some(base) = &self.http.base_url {
            url::Url::parse(base).context("http.base_url")?;
        }

        let statuses = &self.http.statuses;
        if statuses.success_min > statuses.success_max {
            return Err(Error::config(format!(
                "http.statuses: empty success range {}..={}",
                statuses.success_min, statuses.success_max
            )));
        }
        if statuses.is_success(statuses.not_modified) {
            return Err(Error::config(format!(
                "http.statuses: not_modified {} overlaps the success range",
                statuses.not_modified
            )));
        }

        let backoff = &self.http.retry_backoff;
        if backoff.initial_ms > backoff.max_ms {
            return Err(Error::config(
                "http.retry_backoff: initial_ms exceeds max_ms",
            ));
        }

        if self.cache.headers.validator.trim().is_empty()
            || self.cache.headers.conditional.trim().is_empty()
        {
            return Err(Error::config("cache.headers: header names cannot be empty"));
        }

        Ok(())
    }

    /// Raw transport configuration
    pub fn http_client_config(&self) -> HttpClientConfig {
        let http = &self.http;
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(http.timeout_seconds))
            .max_retries(http.max_retries)
            .backoff(
                http.retry_backoff.backoff_type,
                Duration::from_millis(http.retry_backoff.initial_ms),
                Duration::from_millis(http.retry_backoff.max_ms),
            )
            .statuses(http.statuses.clone());

        if let Some(base) = &http.base_url {
            builder = builder.base_url(base);
        }
        if let Some(agent) = &http.user_agent {
            builder = builder.user_agent(agent);
        }
        builder = match &http.rate_limit {
            Some(limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };
        for (name, value) in &http.headers {
            builder = builder.header(name, value);
        }

        builder.build()
    }

    /// Open the configured validator store
    pub fn open_store(&self) -> Result<SharedStore> {
        let store: SharedStore = match &self.store {
            StoreConfig::Memory => Arc::new(MemoryStore::new()),
            StoreConfig::File { path } => Arc::new(FileStore::open(expand_home(path))?),
            StoreConfig::Duckdb { path: Some(path) } => {
                Arc::new(DuckDbStore::open(expand_home(path))?)
            }
            StoreConfig::Duckdb { path: None } => Arc::new(DuckDbStore::in_memory()?),
        };
        Ok(store)
    }

    /// Assemble the transport chain: `HttpClient`, then `CachingTransport`
    /// unless the cache is disabled
    pub fn build(&self) -> Result<Arc<dyn Transport>> {
        let client = HttpClient::with_credentials(self.http_client_config(), self.credentials.clone())?;

        if !self.cache.enabled {
            debug!("Conditional cache disabled");
            return Ok(Arc::new(client));
        }

        let store = self.open_store()?;
        debug!("Conditional cache over {store:?}");
        let caching = CachingTransport::new(Arc::new(client), store)
            .with_validator_headers(self.cache.headers.clone());
        Ok(Arc::new(caching))
    }
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// Raw transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Base URL for relative request URIs
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Client-side quota; absent means unlimited
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Status binding
    #[serde(default)]
    pub statuses: StatusClasses,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: BackoffConfig::default(),
            user_agent: None,
            headers: BTreeMap::new(),
            rate_limit: None,
            statuses: StatusClasses::default(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

// ============================================================================
// Store & Cache
// ============================================================================

/// Validator store backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process-local map
    #[default]
    Memory,
    /// JSON document on disk
    File {
        /// Document path
        path: PathBuf,
    },
    /// DuckDB table; in-memory when no path is given
    Duckdb {
        /// Database file
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

/// Conditional cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Wrap the transport in the conditional cache
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Validator header names
    #[serde(default)]
    pub headers: ValidatorHeaders,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            headers: ValidatorHeaders::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Helpers
// ============================================================================

/// Replace every `{{ env.NAME }}` placeholder, collecting all undefined names
pub fn interpolate_env<F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();
    let rendered = ENV_REGEX.replace_all(template, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        lookup(name).unwrap_or_else(|| {
            missing.push(name.to_string());
            String::new()
        })
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        missing.sort();
        missing.dedup();
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::QuotaPeriod;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = AccessConfig::from_yaml_with("", env(&[])).unwrap();
        assert_eq!(config, AccessConfig::default());
        assert_eq!(config.store, StoreConfig::Memory);
        assert!(config.cache.enabled);
        assert_eq!(config.http.statuses, StatusClasses::default());
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
http:
  base_url: https://api.github.com
  timeout_seconds: 10
  max_retries: 5
  retry_backoff:
    type: linear
    initial_ms: 200
    max_ms: 5000
  user_agent: my-tool/1.0
  headers:
    Accept: application/vnd.github+json
  rate_limit:
    requests: 5000
    per: hour
    burst_size: 100
credentials:
  type: token
  scheme: token
  token: "{{ env.GITHUB_TOKEN }}"
store:
  type: duckdb
  path: /tmp/validators.duckdb
cache:
  headers:
    validator: X-Version
    conditional: X-If-Version
"#;
        let config =
            AccessConfig::from_yaml_with(yaml, env(&[("GITHUB_TOKEN", "ghp_secret")])).unwrap();

        assert_eq!(config.http.base_url.as_deref(), Some("https://api.github.com"));
        assert_eq!(config.http.timeout_seconds, 10);
        assert_eq!(config.http.retry_backoff.backoff_type, BackoffType::Linear);
        assert_eq!(
            config.http.rate_limit.as_ref().map(|r| r.per),
            Some(QuotaPeriod::Hour)
        );
        assert_eq!(config.credentials, Credentials::token("ghp_secret"));
        assert_eq!(
            config.store,
            StoreConfig::Duckdb {
                path: Some(PathBuf::from("/tmp/validators.duckdb"))
            }
        );
        assert_eq!(config.cache.headers.validator, "X-Version");

        let http = config.http_client_config();
        assert_eq!(http.timeout, Duration::from_secs(10));
        assert_eq!(http.max_retries, 5);
        assert_eq!(http.initial_backoff, Duration::from_millis(200));
        assert_eq!(http.user_agent, "my-tool/1.0");
        assert_eq!(
            http.default_headers.first("accept"),
            Some("application/vnd.github+json")
        );
        assert!(http.rate_limit.is_some());
    }

    #[test]
    fn test_interpolate_env() {
        let rendered = interpolate_env(
            "a: {{ env.A }}\nb: {{env.B}}\nc: {{ config.x }}",
            env(&[("A", "1"), ("B", "2")]),
        )
        .unwrap();
        assert_eq!(rendered, "a: 1\nb: 2\nc: {{ config.x }}");
    }

    #[test]
    fn test_undefined_variables_are_reported() {
        let err = interpolate_env("{{ env.ONE }} {{ env.TWO }}", env(&[])).unwrap_err();
        match err {
            Error::UndefinedVariable { variable } => assert_eq!(variable, "ONE, TWO"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_repeated_undefined_variable_reported_once() {
        let err = interpolate_env("{{ env.B }} {{ env.A }} {{ env.B }}", env(&[])).unwrap_err();
        match err {
            Error::UndefinedVariable { variable } => assert_eq!(variable, "A, B"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(AccessConfig::from_yaml_with("htpp: {}", env(&[])).is_err());
    }

    #[test]
    fn test_validation() {
        let bad_url = "http:\n  base_url: not a url\n";
        assert!(AccessConfig::from_yaml_with(bad_url, env(&[])).is_err());

        let overlap = "http:\n  statuses:\n    success_min: 200\n    success_max: 399\n";
        assert!(matches!(
            AccessConfig::from_yaml_with(overlap, env(&[])),
            Err(Error::Config { .. })
        ));

        let backoff = "http:\n  retry_backoff:\n    initial_ms: 10000\n    max_ms: 10\n";
        assert!(AccessConfig::from_yaml_with(backoff, env(&[])).is_err());
    }

    #[test]
    fn test_store_variants() {
        let file = AccessConfig::from_yaml_with(
            "store:\n  type: file\n  path: cache.json\n",
            env(&[]),
        )
        .unwrap();
        assert_eq!(
            file.store,
            StoreConfig::File {
                path: PathBuf::from("cache.json")
            }
        );

        let duck = AccessConfig::from_yaml_with("store:\n  type: duckdb\n", env(&[])).unwrap();
        assert_eq!(duck.store, StoreConfig::Duckdb { path: None });
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/abs/x")), PathBuf::from("/abs/x"));
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(
                expand_home(Path::new("~/x.json")),
                PathBuf::from(home).join("x.json")
            );
        }
    }

    #[tokio::test]
    async fn test_open_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("validators.json");
        let config = AccessConfig {
            store: StoreConfig::File { path: path.clone() },
            ..Default::default()
        };

        let store = config.open_store().unwrap();
        store.put("/r", "\"v1\"", "{}").await.unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_build() {
        let config = AccessConfig::from_yaml_with(
            "http:\n  base_url: https://api.github.com\ncache:\n  enabled: false\n",
            env(&[]),
        )
        .unwrap();
        let transport = config.build().unwrap();
        assert_eq!(transport.statuses(), &StatusClasses::default());

        let cached = AccessConfig::default().build().unwrap();
        assert_eq!(cached.statuses().not_modified, 304);
    }
}
