//! Client and CLI configuration
//!
//! [`EvnexConfig`] is what the library needs to talk to the API.
//! [`CliConfig`] is the CLI's persisted view of it, assembled by
//! [`ConfigBuilder`] from defaults, the config file, the environment and
//! command-line arguments.

use crate::retry::RetryPolicy;
use anyhow::{Context, Result};
use evnex_core::EvnexError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://client-api.evnex.io";
pub const DEFAULT_USER_POOL_ID: &str = "ap-southeast-2_zWnqo6ASv";
pub const DEFAULT_CLIENT_ID: &str = "rol3lsv2vg41783550i18r7vi";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const MAX_TIMEOUT_SECS: u64 = 300;

/// Settings of an [`EvnexClient`](crate::client::EvnexClient)
#[derive(Debug, Clone)]
pub struct EvnexConfig {
    pub base_url: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// Replaces the Cognito endpoint derived from the user pool region
    pub identity_endpoint: Option<String>,
    /// Initial default organisation, until `get_user_detail` replaces it
    pub org_id: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for EvnexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_pool_id: DEFAULT_USER_POOL_ID.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            identity_endpoint: None,
            org_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl EvnexConfig {
    pub fn validate(&self) -> evnex_core::Result<()> {
        validate_url(&self.base_url).map_err(EvnexError::Config)?;
        if let Some(endpoint) = &self.identity_endpoint {
            validate_url(endpoint).map_err(EvnexError::Config)?;
        }
        if self.user_pool_id.trim().is_empty() {
            return Err(EvnexError::Config("user pool id cannot be empty".to_string()));
        }
        if self.client_id.trim().is_empty() {
            return Err(EvnexError::Config("client id cannot be empty".to_string()));
        }
        validate_timeout_duration(self.timeout).map_err(EvnexError::Config)?;
        self.retry.validate().map_err(EvnexError::Config)?;
        Ok(())
    }
}

/// CLI configuration
///
/// The password is deliberately absent; it is read from
/// `EVNEX_CLIENT_PASSWORD` or `--password` and never saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    pub base_url: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// Alternative `InitiateAuth` endpoint, for proxies and tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,

    /// Default output format
    pub output_format: String,

    /// Enable verbose logging by default
    pub verbose: bool,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Attempts per request including the first; unlimited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_pool_id: DEFAULT_USER_POOL_ID.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            identity_endpoint: None,
            username: None,
            org_id: None,
            output_format: "table".to_string(),
            verbose: false,
            timeout: DEFAULT_TIMEOUT_SECS,
            max_retries: None,
        }
    }
}

impl CliConfig {
    /// Load configuration from the default path, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match PartialConfig::read(path)? {
            Some(partial) => Ok(partial.apply(Self::default())),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize CLI config")?;

        std::fs::write(path, content).context("Failed to write CLI config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config)
        } else if let Some(dir) = dirs::config_dir() {
            dir
        } else {
            return Err(anyhow::anyhow!("Cannot determine config directory"));
        };

        Ok(config_dir.join("evnex").join("cli.toml"))
    }

    /// Library settings derived from this configuration
    pub fn to_evnex_config(&self) -> EvnexConfig {
        EvnexConfig {
            base_url: self.base_url.clone(),
            user_pool_id: self.user_pool_id.clone(),
            client_id: self.client_id.clone(),
            identity_endpoint: self.identity_endpoint.clone(),
            org_id: self.org_id.clone(),
            timeout: Duration::from_secs(self.timeout),
            retry: RetryPolicy::default().with_max_attempts(self.max_retries),
        }
    }

    /// Create a new builder for constructing configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Config file contents; every key is optional
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    base_url: Option<String>,
    user_pool_id: Option<String>,
    client_id: Option<String>,
    identity_endpoint: Option<String>,
    username: Option<String>,
    org_id: Option<String>,
    output_format: Option<String>,
    verbose: Option<bool>,
    timeout: Option<u64>,
    max_retries: Option<u32>,
}

impl PartialConfig {
    fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CLI config file {}", path.display()))?;
        let partial = toml::from_str(&content)
            .with_context(|| format!("Failed to parse CLI config file {}", path.display()))?;
        Ok(Some(partial))
    }

    fn apply(self, mut config: CliConfig) -> CliConfig {
        if let Some(v) = self.base_url {
            config.base_url = v;
        }
        if let Some(v) = self.user_pool_id {
            config.user_pool_id = v;
        }
        if let Some(v) = self.client_id {
            config.client_id = v;
        }
        config.identity_endpoint = self.identity_endpoint.or(config.identity_endpoint);
        config.username = self.username.or(config.username);
        config.org_id = self.org_id.or(config.org_id);
        if let Some(v) = self.output_format {
            config.output_format = v;
        }
        if let Some(v) = self.verbose {
            config.verbose = v;
        }
        if let Some(v) = self.timeout {
            config.timeout = v;
        }
        config.max_retries = self.max_retries.or(config.max_retries);
        config
    }
}

/// Builder for CLI configuration with validation and priority chain support
///
/// Sources are applied in call order and later ones win, so call the
/// methods lowest priority first:
/// 1. Defaults
/// 2. Config file
/// 3. Environment variables
/// 4. CLI arguments
#[derive(Debug)]
pub struct ConfigBuilder {
    config: CliConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new configuration builder seeded with defaults
    pub fn new() -> Self {
        Self {
            config: CliConfig::default(),
        }
    }

    /// Set base URL (with validation)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        validate_url(&url).map_err(anyhow::Error::msg)?;
        self.config.base_url = url;
        Ok(self)
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    pub fn with_org_id(mut self, org_id: impl Into<String>) -> Self {
        self.config.org_id = Some(org_id.into());
        self
    }

    /// Set output format (with validation)
    pub fn with_output_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        validate_output_format(&format).map_err(anyhow::Error::msg)?;
        self.config.output_format = format;
        Ok(self)
    }

    /// Set verbose flag
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Set timeout (with validation)
    pub fn with_timeout(mut self, timeout: u64) -> Result<Self> {
        validate_timeout(timeout).map_err(anyhow::Error::msg)?;
        self.config.timeout = timeout;
        Ok(self)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Result<Self> {
        if max_retries == 0 {
            return Err(anyhow::anyhow!("max retries must be at least 1"));
        }
        self.config.max_retries = Some(max_retries);
        Ok(self)
    }

    /// Load configuration from the default config file
    pub fn with_config_file(self, load_file: bool) -> Result<Self> {
        if !load_file {
            return Ok(self);
        }
        let path = CliConfig::config_path()?;
        self.with_config_file_at(&path)
    }

    /// Load configuration from `path`; a missing file changes nothing
    pub fn with_config_file_at(mut self, path: &Path) -> Result<Self> {
        if let Some(partial) = PartialConfig::read(path)? {
            self.config = partial.apply(self.config);
        }
        Ok(self)
    }

    /// Apply environment variable overrides
    ///
    /// Values that fail validation are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("EVNEX_BASE_URL") {
            if validate_url(&url).is_ok() {
                self.config.base_url = url;
            }
        }

        if let Ok(pool) = std::env::var("EVNEX_COGNITO_USER_POOL_ID") {
            if !pool.trim().is_empty() {
                self.config.user_pool_id = pool;
            }
        }

        if let Ok(client_id) = std::env::var("EVNEX_COGNITO_CLIENT_ID") {
            if !client_id.trim().is_empty() {
                self.config.client_id = client_id;
            }
        }

        if let Ok(endpoint) = std::env::var("EVNEX_COGNITO_ENDPOINT") {
            if validate_url(&endpoint).is_ok() {
                self.config.identity_endpoint = Some(endpoint);
            }
        }

        if let Ok(org_id) = std::env::var("EVNEX_ORG_ID") {
            if !org_id.trim().is_empty() {
                self.config.org_id = Some(org_id);
            }
        }

        if let Ok(username) = std::env::var("EVNEX_CLIENT_USERNAME") {
            if !username.trim().is_empty() {
                self.config.username = Some(username);
            }
        }

        if let Ok(format) = std::env::var("EVNEX_FORMAT") {
            if validate_output_format(&format).is_ok() {
                self.config.output_format = format;
            }
        }

        if let Ok(verbose) = std::env::var("EVNEX_VERBOSE") {
            self.config.verbose = verbose.to_lowercase() == "true" || verbose == "1";
        }

        if let Ok(timeout) = std::env::var("EVNEX_TIMEOUT") {
            if let Ok(timeout) = timeout.parse() {
                if validate_timeout(timeout).is_ok() {
                    self.config.timeout = timeout;
                }
            }
        }

        if let Ok(retries) = std::env::var("EVNEX_MAX_RETRIES") {
            if let Ok(retries) = retries.parse::<u32>() {
                if retries > 0 {
                    self.config.max_retries = Some(retries);
                }
            }
        }

        self
    }

    /// Build the final configuration with validation
    pub fn build(self) -> Result<CliConfig> {
        let config = self.config;

        validate_url(&config.base_url).map_err(anyhow::Error::msg)?;
        validate_output_format(&config.output_format).map_err(anyhow::Error::msg)?;
        validate_timeout(config.timeout).map_err(anyhow::Error::msg)?;
        config
            .to_evnex_config()
            .validate()
            .context("Invalid client configuration")?;

        Ok(config)
    }
}

/// Validate URL format
fn validate_url(url: &str) -> std::result::Result<(), String> {
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!("URL must start with http:// or https://: {}", url));
    }

    Ok(())
}

/// Validate output format
fn validate_output_format(format: &str) -> std::result::Result<(), String> {
    match format {
        "table" | "json" => Ok(()),
        _ => Err(format!(
            "Invalid output format '{}'. Must be 'table' or 'json'",
            format
        )),
    }
}

/// Validate timeout value
fn validate_timeout(timeout: u64) -> std::result::Result<(), String> {
    if timeout == 0 {
        return Err("Timeout must be greater than 0".to_string());
    }

    if timeout > MAX_TIMEOUT_SECS {
        return Err(format!(
            "Timeout must be less than or equal to {} seconds",
            MAX_TIMEOUT_SECS
        ));
    }

    Ok(())
}

/// Validate a library timeout; sub-second values are allowed
fn validate_timeout_duration(timeout: Duration) -> std::result::Result<(), String> {
    if timeout.is_zero() {
        return Err("Timeout must be greater than 0".to_string());
    }

    if timeout > Duration::from_secs(MAX_TIMEOUT_SECS) {
        return Err(format!(
            "Timeout must be less than or equal to {} seconds",
            MAX_TIMEOUT_SECS
        ));
    }

    Ok(())
}
