//! Application state management

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::{shared, Settings, SharedSettings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    settings: SharedSettings,
    db: SqlitePool,
    /// Primary location of the .env file rewritten during key rotation.
    env_path: PathBuf,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings, db: SqlitePool, env_path: PathBuf) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                settings: shared(settings),
                db,
                env_path,
            }),
        }
    }

    /// Get the shared settings holder
    pub fn settings(&self) -> &SharedSettings {
        &self.inner.settings
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the .env file path used for key rotation
    pub fn env_path(&self) -> &Path {
        &self.inner.env_path
    }
}
