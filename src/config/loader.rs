//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.revu.toml` in the working directory
//! 4. `~/.config/revu/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::constants::{
    DEFAULT_LISTEN_ADDR, DEFAULT_REQUEST_TIMEOUT_SECS, ENV_API_KEY, ENV_BASE_URL,
    ENV_GITHUB_API_URL, ENV_GITHUB_TOKEN, ENV_LISTEN, ENV_MODEL, ENV_PROVIDER,
    ENV_REQUEST_TIMEOUT, GITHUB_API_URL, MAX_REQUEST_TIMEOUT_SECS,
};
use crate::env::Env;
use crate::intake::UploadLimits;
use crate::models::ProviderName;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub server: ServerConfig,
    pub upload: UploadLimits,
    pub github: GitHubConfig,
}

/// LLM provider configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: ProviderName,
    /// Model id; the provider's default when unset.
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Server-side default credential, used when a request carries none.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ProviderConfig {
    /// The configured model, or the provider's default.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.name.default_model())
    }
}

/// HTTP service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Wall-clock ceiling for one review, provider stream included.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN_ADDR.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// The request deadline, clamped to `1..=MAX_REQUEST_TIMEOUT_SECS`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.clamp(1, MAX_REQUEST_TIMEOUT_SECS))
    }

    /// Replace an out-of-range timeout (zero, or above one day) with a
    /// usable one, warning about the change.
    fn sanitize(&mut self) {
        let secs = self.request_timeout_secs;
        if secs == 0 {
            warn!("request_timeout_secs = 0 is invalid; using {DEFAULT_REQUEST_TIMEOUT_SECS}");
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        } else if secs > MAX_REQUEST_TIMEOUT_SECS {
            warn!(
                "request_timeout_secs = {secs} exceeds the maximum; using {MAX_REQUEST_TIMEOUT_SECS}"
            );
            self.request_timeout_secs = MAX_REQUEST_TIMEOUT_SECS;
        }
    }
}

/// GitHub access configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API_URL.to_string(),
            token: None,
        }
    }
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, the local config in `workdir`, then
    /// applies environment variable overrides.
    pub fn load(workdir: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 3: local config
        if let Some(dir) = workdir {
            let local_path = dir.join(crate::constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        config.server.sanitize();
        Ok(config)
    }

    /// Load a config from a specific file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(crate::constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other wins for non-default values).
    fn merge(&mut self, other: Config) {
        let default_provider = ProviderConfig::default();
        if other.provider.name != default_provider.name {
            self.provider.name = other.provider.name;
        }
        if other.provider.model.is_some() {
            self.provider.model = other.provider.model;
        }
        if other.provider.base_url.is_some() {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }

        let default_server = ServerConfig::default();
        if other.server.listen != default_server.listen {
            self.server.listen = other.server.listen;
        }
        if other.server.request_timeout_secs != default_server.request_timeout_secs {
            self.server.request_timeout_secs = other.server.request_timeout_secs;
        }

        let default_upload = UploadLimits::default();
        if other.upload.max_file_bytes != default_upload.max_file_bytes {
            self.upload.max_file_bytes = other.upload.max_file_bytes;
        }
        if other.upload.max_total_bytes != default_upload.max_total_bytes {
            self.upload.max_total_bytes = other.upload.max_total_bytes;
        }

        if other.github.api_url != GitHubConfig::default().api_url {
            self.github.api_url = other.github.api_url;
        }
        if other.github.token.is_some() {
            self.github.token = other.github.token;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        match env.parse::<ProviderName>(ENV_PROVIDER) {
            Some(Ok(name)) => self.provider.name = name,
            Some(Err(raw)) => warn!("ignoring invalid {ENV_PROVIDER} value: {raw}"),
            None => {}
        }
        if let Some(val) = env.non_empty(ENV_MODEL) {
            self.provider.model = Some(val);
        }
        if let Some(val) = env.non_empty(ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }

        // Provider-specific API key resolution
        let api_key = env
            .non_empty(ENV_API_KEY)
            .or_else(|| env.non_empty(self.provider.name.api_key_env_var()));
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        if let Some(val) = env.non_empty(ENV_LISTEN) {
            self.server.listen = val;
        }
        match env.parse::<u64>(ENV_REQUEST_TIMEOUT) {
            Some(Ok(secs)) if (1..=MAX_REQUEST_TIMEOUT_SECS).contains(&secs) => {
                self.server.request_timeout_secs = secs
            }
            Some(_) => warn!("ignoring invalid {ENV_REQUEST_TIMEOUT} value"),
            None => {}
        }

        if let Some(val) = env.non_empty(ENV_GITHUB_API_URL) {
            self.github.api_url = val;
        }
        if let Some(val) = env.non_empty(ENV_GITHUB_TOKEN) {
            self.github.token = Some(val);
        }
    }
}
