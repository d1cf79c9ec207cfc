//! Application state

use crate::config::GatewayConfig;
use crate::temp::TempStorage;
use crate::uploads::UploadTracker;
use crate::GatewayError;
use std::sync::Arc;
use tracing::info;
use ufs_store::{Store, StoreRegistry};

/// Application state shared across requests
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Normalized path prefix owned by the gateway
    pub prefix: String,
    /// Registered stores
    pub stores: StoreRegistry,
    /// Temp files of uploads in progress
    pub temp: TempStorage,
    /// Per-file-id upload locks
    pub uploads: UploadTracker,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: GatewayConfig, stores: StoreRegistry) -> Self {
        let prefix = config.normalized_stores_path();
        let temp = TempStorage::new(&config.tmp_dir, config.tmp_dir_permissions);

        info!(
            prefix = %prefix,
            tmp_dir = %config.tmp_dir.display(),
            stores = ?stores.names(),
            "Gateway state initialized"
        );

        Self {
            config,
            prefix,
            stores,
            temp,
            uploads: UploadTracker::new(),
        }
    }

    /// Resolve a store by name
    pub fn store(&self, name: &str) -> Result<Arc<dyn Store>, GatewayError> {
        self.stores
            .get(name)
            .ok_or_else(|| GatewayError::StoreNotFound(name.to_string()))
    }
}
