//! Client configuration.
//!
//! Every field except `root_uri` has a default; a TOML file only needs to
//! name what it changes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_CACHE_TTL_MS, DEFAULT_EMBEDDED_KEY, DEFAULT_PAGE_SIZE,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SWEEP_INTERVAL_MS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HalConfig {
    /// Base URI the API's hrefs are rooted at.
    pub root_uri: String,
    /// When set, hrefs under `root_uri` are rewritten to this URI.
    #[serde(default)]
    pub proxy_uri: Option<String>,
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_embedded_key")]
    pub embedded_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (set HALCYON_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn default_cache_ttl_ms() -> u64 {
    DEFAULT_CACHE_TTL_MS
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval_ms() -> u64 {
    DEFAULT_SWEEP_INTERVAL_MS
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_embedded_key() -> String {
    DEFAULT_EMBEDDED_KEY.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl HalConfig {
    pub fn new(root_uri: impl Into<String>) -> Self {
        Self {
            root_uri: root_uri.into(),
            proxy_uri: None,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            cache_enabled: true,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            page_size: DEFAULT_PAGE_SIZE,
            embedded_key: DEFAULT_EMBEDDED_KEY.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            headers: BTreeMap::new(),
        }
    }

    /// Load from the file named by `HALCYON_CONFIG` and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_env().ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: HalConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_uri.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "root_uri",
                reason: "must not be empty".to_string(),
            });
        }
        if let Err(e) = ::url::Url::parse(&self.root_uri) {
            return Err(ConfigError::InvalidValue {
                field: "root_uri",
                reason: format!("must be an absolute URL: {e}"),
            });
        }
        if matches!(&self.proxy_uri, Some(proxy) if proxy.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "proxy_uri",
                reason: "must not be empty when set".to_string(),
            });
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sweep_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.embedded_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "embedded_key",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_proxy_uri(mut self, proxy_uri: impl Into<String>) -> Self {
        self.proxy_uri = Some(proxy_uri.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = duration_ms(ttl);
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = duration_ms(interval);
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_embedded_key(mut self, key: impl Into<String>) -> Self {
        self.embedded_key = key.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = duration_ms(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from)
}
