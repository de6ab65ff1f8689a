//! File-based auth cache
//!
//! Persists the whitelisted auth slice to a local JSON file in the
//! application data directory. Read once at startup before first render.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use st_core::auth::PersistedAuthState;
use st_core::ports::AuthCachePort;

pub const DEFAULT_AUTH_STATE_FILE: &str = ".auth_state";

pub struct FileAuthCache {
    state_file_path: PathBuf,
}

impl FileAuthCache {
    /// Create cache with custom file path
    pub fn new(state_file_path: PathBuf) -> Self {
        Self { state_file_path }
    }

    /// Create cache with base dir and filename
    pub fn with_base_dir(base_dir: PathBuf, filename: impl Into<String>) -> Self {
        Self {
            state_file_path: base_dir.join(filename.into()),
        }
    }

    /// Create cache with defaults
    pub fn with_defaults(base_dir: PathBuf) -> Self {
        Self {
            state_file_path: base_dir.join(DEFAULT_AUTH_STATE_FILE),
        }
    }

    async fn ensure_parent_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.state_file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AuthCachePort for FileAuthCache {
    async fn load(&self) -> anyhow::Result<Option<PersistedAuthState>> {
        if !self.state_file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.state_file_path).await?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let state: PersistedAuthState = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse persisted auth state: {e}"))?;

        Ok(Some(state))
    }

    async fn save(&self, state: &PersistedAuthState) -> anyhow::Result<()> {
        self.ensure_parent_dir().await?;

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| anyhow::anyhow!("Failed to serialize auth state: {e}"))?;

        let mut file = fs::File::create(&self.state_file_path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create auth state file: {e}"))?;

        file.write_all(json.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write auth state file: {e}"))?;

        file.sync_all()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to sync auth state file: {e}"))?;

        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        if self.state_file_path.exists() {
            fs::remove_file(&self.state_file_path).await?;
        }
        Ok(())
    }
}
