use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use studycards_core::{CoreError, Storage};
use tracing::{debug, info};

/// One row per storage key, the value kept as JSON text.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let url = format!("sqlite://{}", path.as_ref().to_string_lossy());
        let opts = SqliteConnectOptions::from_str(&url)
            .map_err(|_| CoreError::Invalid("sqlite path"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|_| CoreError::Unavailable("sqlite connect"))?;
        let store = Self { pool };
        store.ensure_schema().await?;
        info!(path = %path.as_ref().display(), "sqlite store opened");
        Ok(store)
    }

    pub async fn open_memory() -> Result<Self, CoreError> {
        // Every connection to `:memory:` is its own database; keep just one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|_| CoreError::Unavailable("sqlite connect"))?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS kv (
          key         TEXT PRIMARY KEY,
          value       TEXT NOT NULL,
          updated_at  TEXT NOT NULL
        );
        "#;

        // Execute statements one by one for compatibility.
        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("sqlite schema"))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for SqliteStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key=?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Unavailable("read kv"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let text: String = row.get("value");
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), CoreError> {
        let text = serde_json::to_string(&value)?;
        sqlx::query(
            r#"INSERT INTO kv (key, value, updated_at) VALUES (?,?,?)
               ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at"#,
        )
        .bind(key)
        .bind(text)
        .bind(dt_to_str(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Unavailable("write kv"))?;
        debug!(key, "sqlite store written");
        Ok(())
    }
}

// ===== Helpers =====
fn dt_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
