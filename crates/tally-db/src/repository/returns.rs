//! # Return Repository
//!
//! Append-only audit rows for post-sale returns. Rows can be deleted
//! individually; deleting one never touches product stock.

use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::ProductReturn;

/// Repository for return audit rows.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Gets a return by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProductReturn>> {
        let row = sqlx::query_as::<_, ProductReturn>(
            r#"
            SELECT id, invoice_id, product_id, quantity, reason, is_damaged, refund_cents, created_at
            FROM returns
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Lists returns, newest first, optionally for one invoice.
    pub async fn list(&self, invoice_id: Option<&str>) -> DbResult<Vec<ProductReturn>> {
        let rows = sqlx::query_as::<_, ProductReturn>(
            r#"
            SELECT id, invoice_id, product_id, quantity, reason, is_damaged, refund_cents, created_at
            FROM returns
            WHERE ?1 IS NULL OR invoice_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Deletes a return row.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting return");

        let result = sqlx::query("DELETE FROM returns WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Return", id));
        }

        Ok(())
    }
}

pub(crate) async fn insert_return<'e, E>(executor: E, row: &ProductReturn) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(
        invoice_id = %row.invoice_id,
        product_id = %row.product_id,
        quantity = row.quantity,
        damaged = row.is_damaged,
        "Inserting return"
    );

    sqlx::query(
        r#"
        INSERT INTO returns (
            id, invoice_id, product_id, quantity, reason, is_damaged, refund_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&row.id)
    .bind(&row.invoice_id)
    .bind(&row.product_id)
    .bind(row.quantity)
    .bind(&row.reason)
    .bind(row.is_damaged)
    .bind(row.refund_cents)
    .bind(row.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Generates a new return ID.
pub fn generate_return_id() -> String {
    Uuid::new_v4().to_string()
}
