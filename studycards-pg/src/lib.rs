use chrono::Utc;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use studycards_core::tree::{self, Node, TreeLayout};
use studycards_core::{CoreError, Storage};
use tracing::{debug, info};

/// Tree-shaped storage: each key is a subtree of `nodes` rows addressed by
/// path, e.g. `decks/<id>` or `userProgress/<userId>/<deckId>`.
pub struct PgTreeStore {
    pool: PgPool,
}

impl PgTreeStore {
    pub async fn connect(url: &str) -> Result<Self, CoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|_| CoreError::Unavailable("pg connect"))?;
        let store = Self { pool };
        store.ensure_schema().await?;
        info!("pg tree store connected");
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS nodes (
          path        text PRIMARY KEY,
          root        text NOT NULL,
          position    bigint NOT NULL,
          value       jsonb NOT NULL,
          updated_at  timestamptz NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_nodes_root_position ON nodes (root, position);
        "#;

        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("pg schema"))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for PgTreeStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let layout = TreeLayout::for_key(key);
        let rows = sqlx::query("SELECT path,position,value FROM nodes WHERE root=$1 ORDER BY position ASC")
            .bind(&layout.root)
            .fetch_all(&self.pool)
            .await
            .map_err(|_| CoreError::Unavailable("read subtree"))?;
        let nodes = rows
            .into_iter()
            .map(|row| Node {
                path: row.get::<String, _>("path"),
                position: row.get::<i64, _>("position"),
                value: row.get::<Value, _>("value"),
            })
            .collect();
        tree::assemble(&layout, nodes)
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), CoreError> {
        let layout = TreeLayout::for_key(key);
        let nodes = tree::flatten(&layout, value)?;
        let now = Utc::now();

        // The whole subtree is swapped in one transaction.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Unavailable("tx"))?;

        sqlx::query("DELETE FROM nodes WHERE root=$1")
            .bind(&layout.root)
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Unavailable("del subtree"))?;

        for n in &nodes {
            sqlx::query(
                r#"INSERT INTO nodes (path,root,position,value,updated_at)
                   VALUES ($1,$2,$3,$4,$5)"#,
            )
            .bind(&n.path)
            .bind(&layout.root)
            .bind(n.position)
            .bind(&n.value)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Unavailable("insert node"))?;
        }

        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))?;
        debug!(root = %layout.root, nodes = nodes.len(), "pg subtree written");
        Ok(())
    }
}
