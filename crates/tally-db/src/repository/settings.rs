//! # Settings Repository
//!
//! Flat key/value store. [`StoreSettings`] is the typed view the rest of
//! the application reads.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Setting, StoreSettings};

/// Repository for key/value settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads one value.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Inserts or replaces one value.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        debug!(key = %key, "Writing setting");

        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes one value.
    pub async fn delete(&self, key: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Setting", key));
        }

        Ok(())
    }

    /// All rows, by key.
    pub async fn all(&self) -> DbResult<Vec<Setting>> {
        let rows = sqlx::query_as::<_, Setting>("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Typed view with defaults for missing keys.
    pub async fn store_settings(&self) -> DbResult<StoreSettings> {
        let rows = self.all().await?;
        Ok(StoreSettings::from_pairs(&rows))
    }

    /// Writes every key of the typed view in one transaction.
    pub async fn save_store_settings(&self, settings: &StoreSettings) -> DbResult<()> {
        self.upsert_many(&settings.to_pairs()).await?;
        debug!("Store settings saved");
        Ok(())
    }

    /// Upserts `rows` in one transaction; either all are written or none.
    pub async fn upsert_many(&self, rows: &[Setting]) -> DbResult<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(&row.key)
            .bind(&row.value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(count = rows.len(), "Settings upserted");
        Ok(rows.len())
    }
}
