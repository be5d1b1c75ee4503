//! # Invoice Repository
//!
//! Invoices and their lines. Both are written once, inside the checkout
//! transaction, and never updated afterwards.
//!
//! ## Invoice Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoices                                                               │
//! │  ├── total_cents          = Σ invoice_items.line_total_cents            │
//! │  ├── down_payment_cents   paid at the counter                           │
//! │  └── installment_count    0 = paid in full                              │
//! │        │                                                                │
//! │        ├──► invoice_items        (one per product, frozen price)        │
//! │        └──► installment_payments (installment_count rows)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::{Invoice, InvoiceItem};

/// An invoice joined with its customer's name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[ts(export)]
pub struct InvoiceWithCustomer {
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[ts(flatten)]
    pub invoice: Invoice,
    pub customer_name: Option<String>,
}

/// Repository for invoice reads.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        fetch_invoice(&self.pool, id).await
    }

    /// Gets all lines of an invoice.
    pub async fn get_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, invoice_id, product_id, product_name, quantity,
                   unit_price_cents, discount_bps, tax_bps, line_total_cents
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Most recent invoices first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<InvoiceWithCustomer>> {
        let invoices = sqlx::query_as::<_, InvoiceWithCustomer>(
            r#"
            SELECT i.id, i.customer_id, i.user_id, i.created_at, i.total_cents,
                   i.payment_method, i.down_payment_cents, i.installment_count,
                   c.name AS customer_name
            FROM invoices i
            LEFT JOIN customers c ON c.id = i.customer_id
            ORDER BY i.created_at DESC, i.rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Invoices that carry an installment plan, oldest first.
    pub async fn with_installments(&self) -> DbResult<Vec<InvoiceWithCustomer>> {
        let invoices = sqlx::query_as::<_, InvoiceWithCustomer>(
            r#"
            SELECT i.id, i.customer_id, i.user_id, i.created_at, i.total_cents,
                   i.payment_method, i.down_payment_cents, i.installment_count,
                   c.name AS customer_name
            FROM invoices i
            LEFT JOIN customers c ON c.id = i.customer_id
            WHERE i.installment_count > 0
            ORDER BY i.created_at, i.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }
}

// =============================================================================
// Shared Queries (pool or transaction)
// =============================================================================

pub(crate) async fn fetch_invoice<'e, E>(executor: E, id: &str) -> DbResult<Option<Invoice>>
where
    E: SqliteExecutor<'e>,
{
    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        SELECT id, customer_id, user_id, created_at, total_cents,
               payment_method, down_payment_cents, installment_count
        FROM invoices
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(invoice)
}

pub(crate) async fn fetch_invoice_item<'e, E>(
    executor: E,
    invoice_id: &str,
    product_id: &str,
) -> DbResult<Option<InvoiceItem>>
where
    E: SqliteExecutor<'e>,
{
    let item = sqlx::query_as::<_, InvoiceItem>(
        r#"
        SELECT id, invoice_id, product_id, product_name, quantity,
               unit_price_cents, discount_bps, tax_bps, line_total_cents
        FROM invoice_items
        WHERE invoice_id = ?1 AND product_id = ?2
        "#,
    )
    .bind(invoice_id)
    .bind(product_id)
    .fetch_optional(executor)
    .await?;

    Ok(item)
}

pub(crate) async fn insert_invoice<'e, E>(executor: E, invoice: &Invoice) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %invoice.id, total = invoice.total_cents, "Inserting invoice");

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, customer_id, user_id, created_at, total_cents,
            payment_method, down_payment_cents, installment_count
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.customer_id)
    .bind(&invoice.user_id)
    .bind(invoice.created_at)
    .bind(invoice.total_cents)
    .bind(invoice.payment_method)
    .bind(invoice.down_payment_cents)
    .bind(invoice.installment_count)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn insert_invoice_item<'e, E>(executor: E, item: &InvoiceItem) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(invoice_id = %item.invoice_id, product_id = %item.product_id, "Inserting invoice item");

    sqlx::query(
        r#"
        INSERT INTO invoice_items (
            id, invoice_id, product_id, product_name, quantity,
            unit_price_cents, discount_bps, tax_bps, line_total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.invoice_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.discount_bps)
    .bind(item.tax_bps)
    .bind(item.line_total_cents)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Generates a new invoice ID.
pub fn generate_invoice_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new invoice item ID.
pub fn generate_invoice_item_id() -> String {
    Uuid::new_v4().to_string()
}
