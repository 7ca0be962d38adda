//! PostgreSQL session store
//!
//! Keys live in `session_keys` with an absolute expiry; list entries live in
//! `session_list_items` and are removed with their key. Expired rows stay
//! invisible to reads until [`PostgresSessionStore::purge_expired`] deletes
//! them.

pub mod config;

pub use config::{PoolConfig, PostgresConfig};

use async_trait::async_trait;
use geobridge_core::ports::SessionStore;
use geobridge_core::{BridgeError, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;

/// Durable SessionStore backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    /// Connect with the given configuration, applying migrations when enabled
    pub async fn connect(config: PostgresConfig) -> Result<Self> {
        config.validate()?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .max_lifetime(config.pool.max_lifetime)
            .connect(&config.database_url)
            .await
            .map_err(|e| db_error("connect to database", e))?;

        let store = Self { pool };
        store.health_check().await?;

        if config.run_migrations {
            store.run_migrations().await?;
        }
        Ok(store)
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BridgeError::Database(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    /// Perform a health check on the database connection
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("run health check", e))?;
        Ok(())
    }

    /// Delete every expired key and its list entries
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session_keys WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("purge expired keys", e))?;
        Ok(result.rows_affected())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error("begin transaction", e))?;

        sqlx::query("DELETE FROM session_list_items WHERE key = $1")
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("clear list entries", e))?;

        sqlx::query(
            r#"
            INSERT INTO session_keys (key, kind, value, expires_at)
            VALUES ($1, 'text', $2, now() + make_interval(secs => $3))
            ON CONFLICT (key) DO UPDATE
            SET kind = 'text', value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(&value)
        .bind(ttl.as_secs_f64())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("set key", e))?;

        tx.commit().await.map_err(|e| db_error("commit transaction", e))
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT value FROM session_keys
            WHERE key = $1 AND kind = 'text' AND expires_at > now()
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("get key", e))?;

        Ok(row.and_then(|row| row.get::<Option<String>, _>("value")))
    }

    async fn push_front(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error("begin transaction", e))?;

        // A text key or an expired list starts a fresh list
        sqlx::query(
            r#"
            DELETE FROM session_list_items
            WHERE key = $1 AND EXISTS (
                SELECT 1 FROM session_keys k
                WHERE k.key = $1 AND (k.kind <> 'list' OR k.expires_at <= now())
            )
            "#,
        )
        .bind(key)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("reset stale list", e))?;

        sqlx::query(
            r#"
            INSERT INTO session_keys (key, kind, value, expires_at)
            VALUES ($1, 'list', NULL, now() + make_interval(secs => $2))
            ON CONFLICT (key) DO UPDATE
            SET kind = 'list', value = NULL, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(ttl.as_secs_f64())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("refresh list expiry", e))?;

        sqlx::query("INSERT INTO session_list_items (key, value) VALUES ($1, $2)")
            .bind(key)
            .bind(&value)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("push list entry", e))?;

        tx.commit().await.map_err(|e| db_error("commit transaction", e))
    }

    async fn list(&self, key: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT i.value
            FROM session_list_items i
            JOIN session_keys k ON k.key = i.key
            WHERE i.key = $1 AND k.kind = 'list' AND k.expires_at > now()
            ORDER BY i.id DESC
            "#,
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("read list", e))?;

        Ok(rows.iter().map(|row| row.get::<String, _>("value")).collect())
    }
}

fn db_error(action: &str, error: sqlx::Error) -> BridgeError {
    BridgeError::Database(format!("Failed to {}: {}", action, error))
}
