use anyhow::{ensure, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes (1..=1000)
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Idle session timeout in seconds; expired sessions behave as not found.
    /// Must be at least 60.
    #[serde(default = "default_session_timeout_seconds")]
    pub session_timeout_seconds: u64,
}

impl LimitsConfig {
    pub fn max_file_size_bytes(&self) -> usize {
        (self.max_file_size_mb as usize) * 1024 * 1024
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            session_timeout_seconds: default_session_timeout_seconds(),
        }
    }
}

/// Session storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,

    /// Redis connection URL (only used if backend = "redis")
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Prefix for Redis session keys
    #[serde(default = "default_redis_key_prefix")]
    pub redis_key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            redis_url: default_redis_url(),
            redis_key_prefix: default_redis_key_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Decoder pipeline backend ("stub" is the only built-in)
    #[serde(default = "default_pipeline_backend")]
    pub backend: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backend: default_pipeline_backend(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Optional shared secret. When set, all endpoints except `/` and
    /// `/health` require a matching X-API-Key header.
    pub api_key: Option<String>,
}

fn default_max_file_size_mb() -> u64 {
    100
}

fn default_session_timeout_seconds() -> u64 {
    3600
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Memory
}

fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}

fn default_redis_key_prefix() -> String {
    "asr:session:".to_string()
}

fn default_pipeline_backend() -> String {
    "stub".to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("ASR_API").separator("__"))
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.limits.session_timeout_seconds >= 60,
            "limits.session_timeout_seconds must be at least 60, got {}",
            self.limits.session_timeout_seconds
        );
        ensure!(
            (1..=1000).contains(&self.limits.max_file_size_mb),
            "limits.max_file_size_mb must be between 1 and 1000, got {}",
            self.limits.max_file_size_mb
        );
        Ok(())
    }
}
