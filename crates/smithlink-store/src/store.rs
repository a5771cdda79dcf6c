//! SQLite-backed workspace settings storage.

use crate::settings::WorkspaceSettings;
use rusqlite::{params, Connection};
use smithlink_core::{ApiKeyConfig, IntegrationError};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors from settings store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Lock error")]
    Lock,
    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for IntegrationError {
    fn from(err: StoreError) -> Self {
        IntegrationError::Storage(err.to_string())
    }
}

/// SQLite-backed storage for API keys and enabled flags.
pub struct SettingsStore {
    conn: Mutex<Connection>,
}

impl SettingsStore {
    /// Opens (or creates) the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        tracing::info!("Settings database initialized at {}", path.display());
        Ok(store)
    }

    /// Creates an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Lock)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS workspace_settings (
                workspace_id TEXT PRIMARY KEY,
                api_key TEXT NOT NULL DEFAULT '',
                api_url TEXT,
                enabled INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    /// Stores credentials for a workspace, keeping its enabled flag.
    pub fn save_api_keys(&self, workspace_id: &str, config: &ApiKeyConfig) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Lock)?;

        conn.execute(
            r#"INSERT INTO workspace_settings (workspace_id, api_key, api_url, enabled, updated_at)
               VALUES (?1, ?2, ?3, 0, ?4)
               ON CONFLICT(workspace_id) DO UPDATE SET
                   api_key = excluded.api_key,
                   api_url = excluded.api_url,
                   updated_at = excluded.updated_at"#,
            params![workspace_id, config.api_key, config.api_url, now_ms()],
        )?;

        tracing::debug!(workspace_id, "Saved LangSmith API keys");
        Ok(())
    }

    /// Returns the saved credentials for a workspace.
    pub fn get_api_keys(&self, workspace_id: &str) -> Result<Option<ApiKeyConfig>, StoreError> {
        Ok(self
            .get_settings(workspace_id)?
            .and_then(|s| s.api_key_config()))
    }

    /// Sets the enabled flag, creating the row if the workspace has none.
    pub fn set_enabled(&self, workspace_id: &str, enabled: bool) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Lock)?;

        conn.execute(
            r#"INSERT INTO workspace_settings (workspace_id, api_key, api_url, enabled, updated_at)
               VALUES (?1, '', NULL, ?2, ?3)
               ON CONFLICT(workspace_id) DO UPDATE SET
                   enabled = excluded.enabled,
                   updated_at = excluded.updated_at"#,
            params![workspace_id, enabled, now_ms()],
        )?;

        tracing::debug!(workspace_id, enabled, "Set LangSmith enabled flag");
        Ok(())
    }

    /// Returns the enabled flag; workspaces without a row are disabled.
    pub fn is_enabled(&self, workspace_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .get_settings(workspace_id)?
            .map(|s| s.enabled)
            .unwrap_or(false))
    }

    /// Retrieves the full settings row for a workspace.
    pub fn get_settings(&self, workspace_id: &str) -> Result<Option<WorkspaceSettings>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Lock)?;

        let mut stmt = conn.prepare(
            r#"SELECT workspace_id, api_key, api_url, enabled, updated_at
               FROM workspace_settings WHERE workspace_id = ?1"#,
        )?;

        let result = stmt.query_row(params![workspace_id], |row| {
            Ok(WorkspaceSettings {
                workspace_id: row.get(0)?,
                api_key: row.get(1)?,
                api_url: row.get(2)?,
                enabled: row.get(3)?,
                updated_at: row.get(4)?,
            })
        });

        match result {
            Ok(settings) => Ok(Some(settings)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
