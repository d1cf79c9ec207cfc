//! Temp directory holding uploads in progress

use crate::GatewayError;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tracing::{error, info};

/// Resolves and manages per-file temp paths under one root directory
#[derive(Clone, Debug)]
pub struct TempStorage {
    root: PathBuf,
    permissions: u32,
}

impl TempStorage {
    pub fn new(root: impl Into<PathBuf>, permissions: u32) -> Self {
        Self {
            root: root.into(),
            permissions,
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Temp file path for a file id
    pub fn path_for(&self, file_id: &str) -> Result<PathBuf, GatewayError> {
        if file_id.is_empty() || file_id == "." || file_id == ".." || file_id.contains(['/', '\\'])
        {
            return Err(GatewayError::BadPath(file_id.to_string()));
        }
        Ok(self.root.join(file_id))
    }

    /// Open a temp file for appending, creating it if needed
    pub async fn open_append(&self, path: &Path) -> std::io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path).await
    }

    /// Best-effort removal of a temp file. Failures are only logged.
    pub async fn discard(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                error!(path = %path.display(), error = %e, "Cannot delete temp file");
            }
        }
    }

    /// Create the root directory with the configured mode, or apply the mode
    /// to an existing one. Failures are logged, not returned.
    pub async fn prepare(&self) {
        match fs::metadata(&self.root).await {
            Ok(_) => {
                if let Err(e) = self.apply_permissions().await {
                    error!(
                        path = %self.root.display(),
                        mode = %format!("{:o}", self.permissions),
                        error = %e,
                        "Cannot set temp directory permissions"
                    );
                }
            }
            Err(_) => match fs::create_dir_all(&self.root).await {
                Ok(()) => {
                    if let Err(e) = self.apply_permissions().await {
                        error!(path = %self.root.display(), error = %e, "Cannot set temp directory permissions");
                    }
                    info!(path = %self.root.display(), "Temp directory created");
                }
                Err(e) => {
                    error!(path = %self.root.display(), error = %e, "Cannot create temp directory");
                }
            },
        }
    }

    #[cfg(unix)]
    async fn apply_permissions(&self) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&self.root, std::fs::Permissions::from_mode(self.permissions)).await
    }

    #[cfg(not(unix))]
    async fn apply_permissions(&self) -> std::io::Result<()> {
        Ok(())
    }
}
