//! # Installment Payment Repository
//!
//! Scheduled payments of installment invoices.
//!
//! ## Status Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mark_overdue(today)                                                    │
//! │    UPDATE ... SET status = 'overdue'                                    │
//! │    WHERE status = 'due' AND due_date < today AND paid_at IS NULL        │
//! │    (due dates are YYYY-MM-DD text, so text order = date order)          │
//! │                                                                         │
//! │  mark_paid(id, today, user)                                             │
//! │    UPDATE ... SET status = 'paid', paid_at = today, paid_by = user      │
//! │    WHERE id = ? AND status <> 'paid'                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::{InstallmentPayment, InstallmentStatus};

/// Repository for installment payments.
#[derive(Debug, Clone)]
pub struct InstallmentRepository {
    pool: SqlitePool,
}

impl InstallmentRepository {
    /// Creates a new InstallmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InstallmentRepository { pool }
    }

    /// Gets a payment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InstallmentPayment>> {
        let payment = sqlx::query_as::<_, InstallmentPayment>(
            r#"
            SELECT id, invoice_id, sequence, due_date, amount_cents, paid_at, paid_by, status
            FROM installment_payments
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// All payments of an invoice, earliest due date first.
    pub async fn for_invoice(&self, invoice_id: &str) -> DbResult<Vec<InstallmentPayment>> {
        let payments = sqlx::query_as::<_, InstallmentPayment>(
            r#"
            SELECT id, invoice_id, sequence, due_date, amount_cents, paid_at, paid_by, status
            FROM installment_payments
            WHERE invoice_id = ?1
            ORDER BY due_date, sequence
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Flags every unpaid `due` payment whose due date is before `today`.
    ///
    /// Returns the number of rows changed. Running it again for the same
    /// `today` changes nothing.
    pub async fn mark_overdue(&self, today: NaiveDate) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE installment_payments
            SET status = ?1
            WHERE status = ?2 AND due_date < ?3 AND paid_at IS NULL
            "#,
        )
        .bind(InstallmentStatus::Overdue)
        .bind(InstallmentStatus::Due)
        .bind(today)
        .execute(&self.pool)
        .await?;

        debug!(today = %today, updated = result.rows_affected(), "Marked overdue payments");
        Ok(result.rows_affected())
    }

    /// Settles a payment.
    ///
    /// ## Returns
    /// * `Ok(true)` - Payment settled
    /// * `Ok(false)` - Payment missing or already paid
    pub async fn mark_paid(&self, id: &str, today: NaiveDate, paid_by: &str) -> DbResult<bool> {
        debug!(id = %id, today = %today, "Marking payment paid");

        let result = sqlx::query(
            r#"
            UPDATE installment_payments
            SET status = ?2, paid_at = ?3, paid_by = ?4
            WHERE id = ?1 AND status <> ?2
            "#,
        )
        .bind(id)
        .bind(InstallmentStatus::Paid)
        .bind(today)
        .bind(paid_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub(crate) async fn insert_installment<'e, E>(executor: E, payment: &InstallmentPayment) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(
        invoice_id = %payment.invoice_id,
        sequence = payment.sequence,
        due_date = %payment.due_date,
        "Inserting installment payment"
    );

    sqlx::query(
        r#"
        INSERT INTO installment_payments (
            id, invoice_id, sequence, due_date, amount_cents, paid_at, paid_by, status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.invoice_id)
    .bind(payment.sequence)
    .bind(payment.due_date)
    .bind(payment.amount_cents)
    .bind(payment.paid_at)
    .bind(&payment.paid_by)
    .bind(payment.status)
    .execute(executor)
    .await?;

    Ok(())
}

/// Generates a new installment payment ID.
pub fn generate_installment_id() -> String {
    Uuid::new_v4().to_string()
}
