//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment overrides (`UFS_PORT`, `UFS_TMP_DIR`, ...)
pub const ENV_PREFIX: &str = "UFS";

/// Default request body limit (5 GB), capped to the address space
const DEFAULT_MAX_BODY_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Path prefix owned by the gateway
    pub stores_path: String,
    /// Temp directory for uploads in progress
    pub tmp_dir: PathBuf,
    /// Permission bits applied to the temp directory
    pub tmp_dir_permissions: u32,
    /// Artificial delay before serving each download (testing only)
    pub simulate_read_delay_ms: Option<u64>,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            stores_path: "/ufs".to_string(),
            tmp_dir: std::env::temp_dir().join("ufs"),
            tmp_dir_permissions: 0o700,
            simulate_read_delay_ms: None,
            max_body_size: usize::try_from(DEFAULT_MAX_BODY_SIZE).unwrap_or(usize::MAX),
        }
    }
}

impl GatewayConfig {
    /// Layer defaults, an optional TOML file and `UFS_*` environment variables
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }

        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Gateway path prefix, normalized to a leading slash and no trailing one
    pub fn normalized_stores_path(&self) -> String {
        let trimmed = self.stores_path.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Configured download delay, if any
    pub fn read_delay(&self) -> Option<Duration> {
        self.simulate_read_delay_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}
