//! Configuration management
//!
//! Reads `~/.briefing/config.json`. Every field has a default, so a missing
//! file or a partial file is valid. A handful of environment variables take
//! precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::common::paths;

pub const ENV_SOCKET: &str = "BRIEFING_SOCKET";
pub const ENV_RATE_LIMIT_MAX: &str = "BRIEFING_RATE_LIMIT_MAX";
pub const ENV_RATE_LIMIT_WINDOW: &str = "BRIEFING_RATE_LIMIT_WINDOW";
pub const ENV_MODEL_DIR: &str = "BRIEFING_MODEL_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefingConfig {
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Unix socket path; `~/.briefing/briefing.sock` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_secs: u64,
    /// 0 disables the stale-key sweeper
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Slots in the model loading / inference pool
    pub workers: usize,
    /// Slots in the general CPU helper pool
    pub helper_workers: usize,
    /// Upper bound on a single model call
    pub timeout_secs: u64,
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,
    /// Stop-word list, relative to `model_dir` unless absolute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopwords_file: Option<PathBuf>,
    /// Wait for the model before accepting connections
    pub preload_blocking: bool,
    pub default_max_length: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            helper_workers: 4,
            timeout_secs: 30,
            model_name: "extractive-frequency".to_string(),
            model_dir: None,
            stopwords_file: None,
            preload_blocking: false,
            default_max_length: 150,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolved stop-word file, if one is configured
    pub fn stopwords_path(&self) -> Option<PathBuf> {
        let file = self.stopwords_file.as_ref()?;
        if file.is_absolute() {
            return Some(file.clone());
        }
        let base = self
            .model_dir
            .clone()
            .or_else(|| paths::models_dir().ok())
            .unwrap_or_default();
        Some(base.join(file))
    }
}

impl BriefingConfig {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = paths::config_path().map_err(ConfigError::Invalid)?;
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(socket) = lookup(ENV_SOCKET) {
            self.server.socket_path = Some(PathBuf::from(socket));
        }
        if let Some(value) = lookup(ENV_RATE_LIMIT_MAX) {
            self.rate_limit.max_requests =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    key: ENV_RATE_LIMIT_MAX,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup(ENV_RATE_LIMIT_WINDOW) {
            self.rate_limit.window_secs =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    key: ENV_RATE_LIMIT_WINDOW,
                    value: value.clone(),
                })?;
        }
        if let Some(dir) = lookup(ENV_MODEL_DIR) {
            self.inference.model_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid("rate_limit.window_secs must be > 0".into()));
        }
        if self.inference.workers == 0 || self.inference.helper_workers == 0 {
            return Err(ConfigError::Invalid("worker pools need at least one slot".into()));
        }
        if self.inference.timeout_secs == 0 {
            warn!("inference.timeout_secs is 0; every model call will time out");
        }
        Ok(())
    }

    /// Resolved socket path
    pub fn socket_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.server.socket_path {
            Some(path) => Ok(path.clone()),
            None => paths::socket_path().map_err(ConfigError::Invalid),
        }
    }
}
