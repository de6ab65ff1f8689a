//! Application configuration domain model

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default debounce before the onboarding cursor is written to the store.
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 500;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Identity provider settings
    pub identity: IdentityConfig,

    /// Document store settings
    pub store: StoreConfig,

    /// Override for the local data directory (auth cache). Platform default
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Debounce applied to onboarding autosave writes, in milliseconds
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Project API key, sent as a query parameter
    pub api_key: String,

    /// Base URL of the identity REST surface
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project id owning the user documents
    pub project_id: String,

    /// Base URL of the document REST surface
    #[serde(default = "default_store_base_url")]
    pub base_url: String,
}

fn default_autosave_debounce_ms() -> u64 {
    DEFAULT_AUTOSAVE_DEBOUNCE_MS
}

fn default_identity_base_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_store_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig {
                api_key: String::new(),
                base_url: default_identity_base_url(),
            },
            store: StoreConfig {
                project_id: String::new(),
                base_url: default_store_base_url(),
            },
            data_dir: None,
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
        }
    }
}
