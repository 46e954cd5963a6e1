//! # Persisted Configuration
//!
//! Which backend is active and how to reach it, plus the currency display
//! settings the UI consumes. Loaded once at startup from a JSON file and
//! written back by the setup flow; the dispatcher resolves its adapter from
//! this exactly once.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// The storage engine variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Embedded file-backed SQL database.
    Sqlite,
    /// Remote document store (atomic batched writes).
    DocStore,
    /// Remote relational store (no client-side multi-statement atomicity).
    RemoteDb,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::DocStore => write!(f, "docstore"),
            BackendKind::RemoteDb => write!(f, "remote_db"),
        }
    }
}

/// Connection parameters for the embedded backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file name or path (`:memory:` for tests).
    pub database_path: String,
}

/// Connection parameters for the document-store backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocStoreConfig {
    /// API root, e.g. `https://firestore.googleapis.com/v1`.
    /// Overridable so tests can point at a local mock server.
    pub base_url: String,
    /// Project owning the document database.
    pub project_id: String,
    /// API key appended to every request.
    pub api_key: String,
}

/// Connection parameters for the remote relational backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDbConfig {
    /// Instance root, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Anonymous/service key sent as `apikey` + bearer token.
    pub api_key: String,
}

/// The persisted application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Selected backend; `None` until setup completes.
    pub backend: Option<BackendKind>,

    pub sqlite: Option<SqliteConfig>,
    pub docstore: Option<DocStoreConfig>,
    pub remote_db: Option<RemoteDbConfig>,

    /// Display currency, consumed (never produced) by the core.
    pub currency_symbol: String,
    pub currency_locale: String,

    /// Set once the initial admin user exists and a backend is chosen.
    pub is_setup_complete: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            backend: None,
            sqlite: None,
            docstore: None,
            remote_db: None,
            currency_symbol: "Rp".into(),
            currency_locale: "id-ID".into(),
            is_setup_complete: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a JSON file. A missing file yields the
    /// pre-setup default rather than an error.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using pre-setup defaults");
            return Ok(AppConfig::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Unknown(format!("reading config: {e}")))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Unknown(format!("parsing config: {e}")))?;

        info!(backend = ?config.backend, "configuration loaded");
        Ok(config)
    }

    /// Persists the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Unknown(format!("encoding config: {e}")))?;
        std::fs::write(path.as_ref(), raw)
            .map_err(|e| StoreError::Unknown(format!("writing config: {e}")))?;
        Ok(())
    }
}
