//! # Returns Processor
//!
//! Takes back units of a sold invoice line and refunds them at the price
//! frozen on the invoice.
//!
//! ```text
//! process_return(invoice, product, qty, reason, damaged)
//!   BEGIN
//!     invoice exists?                      NotFound
//!     invoice has a line for product?      NotFound
//!     qty <= line.quantity?                ReturnExceedsSold
//!     INSERT returns (refund = line.unit_price * qty)
//!     if !damaged: stock += qty
//!   COMMIT
//! ```

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{LedgerError, LedgerResult};
use tally_core::returns::validate_return_quantity;
use tally_core::{Money, ProductReturn};
use tally_db::repository::returns::generate_return_id;
use tally_db::Database;

/// Outcome of a processed return.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnReceipt {
    pub return_id: String,
    pub refund: Money,
    /// Units put back on the shelf. Zero for damaged goods.
    pub restocked: i64,
}

/// Returns and their audit trail.
#[derive(Debug, Clone)]
pub struct ReturnsProcessor {
    db: Database,
}

impl ReturnsProcessor {
    /// Creates a new ReturnsProcessor.
    pub fn new(db: Database) -> Self {
        ReturnsProcessor { db }
    }

    /// Records a return in one transaction.
    ///
    /// Each request is capped at the quantity sold on the line. Earlier
    /// returns against the same line are not subtracted. `reason` is free
    /// text stored trimmed; it may be empty.
    pub async fn process_return(
        &self,
        invoice_id: &str,
        product_id: &str,
        quantity: i64,
        reason: &str,
        is_damaged: bool,
    ) -> LedgerResult<ReturnReceipt> {
        debug!(
            invoice_id = %invoice_id,
            product_id = %product_id,
            quantity,
            is_damaged,
            "process_return"
        );

        let mut uow = self.db.begin().await?;

        if uow.invoice(invoice_id).await?.is_none() {
            return Err(LedgerError::not_found("Invoice", invoice_id));
        }

        let item = uow
            .invoice_item(invoice_id, product_id)
            .await?
            .ok_or_else(|| {
                LedgerError::not_found("Invoice line", &format!("{}/{}", invoice_id, product_id))
            })?;

        if let Err(e) = validate_return_quantity(&item, quantity) {
            warn!(invoice_id = %invoice_id, product_id = %product_id, "Return rejected: {}", e);
            return Err(e.into());
        }

        let refund = item.refund_for(quantity);
        let row = ProductReturn {
            id: generate_return_id(),
            invoice_id: invoice_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
            reason: reason.trim().to_string(),
            is_damaged,
            refund_cents: refund.cents(),
            created_at: Utc::now(),
        };

        uow.insert_return(&row).await?;

        let restocked = if is_damaged {
            0
        } else {
            uow.increment_stock(product_id, quantity).await?;
            quantity
        };

        uow.commit().await?;

        info!(
            return_id = %row.id,
            invoice_id = %invoice_id,
            refund = %refund,
            restocked,
            "Return processed"
        );

        Ok(ReturnReceipt {
            return_id: row.id,
            refund,
            restocked,
        })
    }

    /// Deletes the audit row. Stock is left as it is.
    pub async fn delete_return(&self, return_id: &str) -> LedgerResult<()> {
        self.db.returns().delete(return_id).await?;
        info!(return_id = %return_id, "Return deleted");
        Ok(())
    }

    /// Returns, newest first, optionally for one invoice.
    pub async fn list_returns(&self, invoice_id: Option<&str>) -> LedgerResult<Vec<ProductReturn>> {
        Ok(self.db.returns().list(invoice_id).await?)
    }
}
