//! Configuration management for the Panorama session client

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PanoramaError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variables the web front-end uses for the backend URL, in
/// order of preference
pub const BASE_URL_ENV_VARS: [&str; 2] = ["NEXT_PUBLIC_API_URL", "NEXT_PUBLIC_BACKEND_URL"];
pub const NODE_ENV_VAR: &str = "NODE_ENV";

/// Deployment environment, mirrors `NODE_ENV`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    #[default]
    Development,
    Production,
    Test,
}

impl AppEnvironment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => AppEnvironment::Production,
            "test" => AppEnvironment::Test,
            _ => AppEnvironment::Development,
        }
    }

    /// Credentials are only marked `secure` in production
    pub fn secure_cookies(&self) -> bool {
        matches!(self, AppEnvironment::Production)
    }
}

/// Credential storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenStorageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub storage_path: Option<String>,
}

impl Default for TokenStorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            storage_path: None,
        }
    }
}

impl TokenStorageConfig {
    /// Memory-only storage, nothing touches disk
    pub fn in_memory() -> Self {
        Self {
            enabled: false,
            storage_path: None,
        }
    }

    /// Where the credential jar lives, `None` when persistence is off
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        Some(
            self.storage_path
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(default_credentials_path),
        )
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub environment: AppEnvironment,
    #[serde(default)]
    pub token_storage: TokenStorageConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: default_timeout(),
            environment: AppEnvironment::default(),
            token_storage: TokenStorageConfig::default(),
        }
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout: Option<u64>,
    environment: Option<AppEnvironment>,
    token_storage: Option<TokenStorageConfig>,
    config_file: Option<PathBuf>,
    read_environment: bool,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn token_storage(mut self, token_storage: TokenStorageConfig) -> Self {
        self.token_storage = Some(token_storage);
        self
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Layer `PANORAMA_*`, `NEXT_PUBLIC_*` and `NODE_ENV` on top of the file
    pub fn from_environment(mut self) -> Self {
        self.read_environment = true;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let mut config = if self.config_file.is_some() || self.read_environment {
            ClientConfig::from_file_and_env(self.config_file.as_deref(), self.read_environment)?
        } else {
            ClientConfig::default()
        };

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(environment) = self.environment {
            config.environment = environment;
        }
        if let Some(token_storage) = self.token_storage {
            config.token_storage = token_storage;
        }

        config.validate()?;
        Ok(config)
    }
}

impl ClientConfig {
    /// Load from the default config file and the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::from_file_and_env(Some(path.as_ref()), true)?;
        config.validate()?;
        Ok(config)
    }

    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    pub fn from_file_and_env(config_file: Option<&Path>, read_environment: bool) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("timeout", DEFAULT_TIMEOUT_SECS)?
            .set_default("environment", "development")?
            .set_default("token_storage.enabled", true)?;

        if let Some(config_path) = config_file {
            if config_path.exists() {
                builder = builder.add_source(File::from(config_path));
            }
        }
        if read_environment {
            builder = builder.add_source(
                Environment::with_prefix("PANORAMA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let mut config: ClientConfig = builder.build()?.try_deserialize()?;
        if read_environment {
            config.apply_frontend_env(|key| std::env::var(key).ok());
        }
        Ok(config)
    }

    /// Apply the variables shared with the web front-end
    ///
    /// `NEXT_PUBLIC_API_URL` wins over `NEXT_PUBLIC_BACKEND_URL`; empty
    /// values are ignored.
    pub fn apply_frontend_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = BASE_URL_ENV_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.trim().is_empty());
        if let Some(base_url) = base_url {
            self.base_url = base_url.trim().to_string();
        }

        if let Some(node_env) = lookup(NODE_ENV_VAR) {
            self.environment = AppEnvironment::parse(&node_env);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(PanoramaError::invalid_input("Base URL cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(PanoramaError::invalid_endpoint(format!(
                "Base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeout == 0 {
            return Err(PanoramaError::invalid_input("Timeout must be at least one second"));
        }
        Ok(())
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("panorama")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("panorama")
}

pub fn default_credentials_path() -> PathBuf {
    default_storage_dir().join("credentials.json")
}
