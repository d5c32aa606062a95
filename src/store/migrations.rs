//! Schema versions for the local database.
//!
//! Applied versions are recorded in `schema_history`. Each pending step runs
//! in its own transaction together with its history row.

use libsql::Connection;

use crate::error::DatabaseError;

struct SchemaStep {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Append only.
const STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "local_flags",
        sql: r#"
            CREATE TABLE IF NOT EXISTS flags (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
    },
    SchemaStep {
        version: 2,
        name: "user_preferences",
        sql: r#"
            CREATE TABLE IF NOT EXISTS user_preferences (
                user_id TEXT PRIMARY KEY,
                preferences TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL
            );
        "#,
    },
];

fn failed(context: &str, e: libsql::Error) -> DatabaseError {
    DatabaseError::Migration(format!("{context}: {e}"))
}

/// Bring the schema up to the latest version.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_history (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| failed("create schema_history", e))?;

    let applied = schema_version(conn).await?;
    let pending: Vec<&SchemaStep> = STEPS.iter().filter(|s| s.version > applied).collect();
    if pending.is_empty() {
        tracing::debug!(version = applied, "Schema up to date");
        return Ok(());
    }

    for step in pending {
        tracing::info!(version = step.version, name = step.name, "Applying schema step");
        let tx = conn
            .transaction()
            .await
            .map_err(|e| failed("begin transaction", e))?;
        tx.execute_batch(step.sql)
            .await
            .map_err(|e| failed(&format!("V{} {}", step.version, step.name), e))?;
        tx.execute(
            "INSERT INTO schema_history (version, name) VALUES (?1, ?2)",
            libsql::params![step.version, step.name],
        )
        .await
        .map_err(|e| failed(&format!("record V{}", step.version), e))?;
        tx.commit()
            .await
            .map_err(|e| failed(&format!("commit V{}", step.version), e))?;
    }
    Ok(())
}

/// Highest applied version, 0 on a fresh database.
async fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_history", ())
        .await
        .map_err(|e| failed("read schema version", e))?;
    let Some(row) = rows.next().await.map_err(|e| failed("read schema version", e))? else {
        return Ok(0);
    };
    row.get::<i64>(0).map_err(|e| failed("parse schema version", e))
}
