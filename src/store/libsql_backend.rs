//! libSQL backend for local flags and stored preferences.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::PreferencesRecord;
use crate::store::migrations;
use crate::store::traits::{FlagStore, PreferenceStore};

/// Flag and preference storage over one shared libSQL connection.
pub struct LibSqlBackend {
    /// Held so the database outlives the connection.
    _db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::prepare(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::prepare(db).await
    }

    /// Connect and bring the schema up to date.
    async fn prepare(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            _db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[async_trait]
impl FlagStore for LibSqlBackend {
    async fn get_flag(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT value FROM flags WHERE key = ?1", params![key])
            .await
            .map_err(|e| DatabaseError::Query(format!("get_flag: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get_flag: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_flag: {e}"))),
        }
    }

    async fn set_flag(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO flags (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, value, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_flag: {e}")))?;
        Ok(())
    }

    async fn remove_flag(&self, key: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute("DELETE FROM flags WHERE key = ?1", params![key])
            .await
            .map_err(|e| DatabaseError::Query(format!("remove_flag: {e}")))?;
        Ok(count > 0)
    }
}

#[async_trait]
impl PreferenceStore for LibSqlBackend {
    async fn upsert_preferences(
        &self,
        user_id: Uuid,
        preferences: &PreferencesRecord,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let json = serde_json::to_string(preferences)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "INSERT INTO user_preferences (user_id, preferences, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id) DO UPDATE SET preferences = ?2, updated_at = ?3",
                params![user_id.to_string(), json, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_preferences: {e}")))?;
        Ok(())
    }

    async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PreferencesRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT preferences FROM user_preferences WHERE user_id = ?1",
                params![user_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_preferences: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let json: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get_preferences: {e}")))?;
                let record = serde_json::from_str(&json)
                    .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_preferences: {e}"))),
        }
    }
}
