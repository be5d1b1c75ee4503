//! # Unit of Work
//!
//! One database transaction wrapping every write of a logical operation.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  let mut uow = db.begin().await?;      BEGIN                            │
//! │                                                                         │
//! │  uow.insert_invoice(&invoice)     ─┐                                    │
//! │  uow.insert_invoice_item(&item)    │   all on the same connection       │
//! │  uow.decrement_stock(id, qty)      │   invisible to other connections   │
//! │  uow.insert_installment(&payment) ─┘                                    │
//! │                                                                         │
//! │  uow.commit().await?;                  COMMIT                           │
//! │                                                                         │
//! │  `?` returns early → uow dropped       ROLLBACK (nothing persisted)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{contact, installment, invoice, product, returns};
use tally_core::{Customer, InstallmentPayment, Invoice, InvoiceItem, Product, ProductReturn};

/// A transaction-scoped set of reads and writes.
///
/// Dropping a `UnitOfWork` without calling [`commit`](UnitOfWork::commit)
/// rolls every write back.
#[derive(Debug)]
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Transaction started");
        Ok(UnitOfWork { tx })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Reads a product as this transaction sees it.
    pub async fn product(&mut self, id: &str) -> DbResult<Option<Product>> {
        product::fetch_product(&mut *self.tx, id).await
    }

    /// Reads a customer.
    pub async fn customer(&mut self, id: &str) -> DbResult<Option<Customer>> {
        contact::fetch_customer(&mut *self.tx, id).await
    }

    /// Reads an invoice.
    pub async fn invoice(&mut self, id: &str) -> DbResult<Option<Invoice>> {
        invoice::fetch_invoice(&mut *self.tx, id).await
    }

    /// Reads the line of `invoice_id` that sold `product_id`.
    pub async fn invoice_item(
        &mut self,
        invoice_id: &str,
        product_id: &str,
    ) -> DbResult<Option<InvoiceItem>> {
        invoice::fetch_invoice_item(&mut *self.tx, invoice_id, product_id).await
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts an invoice header.
    pub async fn insert_invoice(&mut self, row: &Invoice) -> DbResult<()> {
        invoice::insert_invoice(&mut *self.tx, row).await
    }

    /// Inserts an invoice line.
    pub async fn insert_invoice_item(&mut self, row: &InvoiceItem) -> DbResult<()> {
        invoice::insert_invoice_item(&mut *self.tx, row).await
    }

    /// Inserts a scheduled installment payment.
    pub async fn insert_installment(&mut self, row: &InstallmentPayment) -> DbResult<()> {
        installment::insert_installment(&mut *self.tx, row).await
    }

    /// Inserts a return audit row.
    pub async fn insert_return(&mut self, row: &ProductReturn) -> DbResult<()> {
        returns::insert_return(&mut *self.tx, row).await
    }

    /// Takes `quantity` units out of stock.
    ///
    /// Returns `false` and changes nothing when fewer units are on hand.
    pub async fn decrement_stock(&mut self, product_id: &str, quantity: i64) -> DbResult<bool> {
        product::decrement_stock(&mut *self.tx, product_id, quantity).await
    }

    /// Puts `quantity` units back into stock.
    pub async fn increment_stock(&mut self, product_id: &str, quantity: i64) -> DbResult<()> {
        product::increment_stock(&mut *self.tx, product_id, quantity).await
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Commits every write.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Transaction committed");
        Ok(())
    }

    /// Discards every write. Same as dropping, but reports errors.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Transaction rolled back");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::installment::generate_installment_id;
    use crate::repository::invoice::{generate_invoice_id, generate_invoice_item_id};
    use crate::repository::product::generate_product_id;
    use crate::repository::user::generate_user_id;
    use chrono::{NaiveDate, Utc};
    use tally_core::{InstallmentStatus, PaymentMethod, User, UserRole};

    struct Fixture {
        db: Database,
        user_id: String,
        product_id: String,
    }

    async fn fixture(stock: i64) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let user = User {
            id: generate_user_id(),
            username: "cashier".to_string(),
            password_hash: "x".to_string(),
            role: UserRole::Cashier,
            created_at: Utc::now(),
        };
        db.users().insert(&user).await.unwrap();

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: "Kettle".to_string(),
            price_cents: 2_500,
            stock,
            category_id: None,
            barcode: None,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();

        Fixture {
            db,
            user_id: user.id,
            product_id: product.id,
        }
    }

    fn invoice(user_id: &str, installment_count: u32) -> Invoice {
        Invoice {
            id: generate_invoice_id(),
            customer_id: None,
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            total_cents: 5_000,
            payment_method: PaymentMethod::Cash,
            down_payment_cents: 0,
            installment_count,
        }
    }

    fn item(invoice_id: &str, product_id: &str, quantity: i64) -> InvoiceItem {
        InvoiceItem {
            id: generate_invoice_item_id(),
            invoice_id: invoice_id.to_string(),
            product_id: product_id.to_string(),
            product_name: "Kettle".to_string(),
            quantity,
            unit_price_cents: 2_500,
            discount_bps: 0,
            tax_bps: 0,
            line_total_cents: 2_500 * quantity,
        }
    }

    fn payment(invoice_id: &str, sequence: u32, due_date: NaiveDate) -> InstallmentPayment {
        InstallmentPayment {
            id: generate_installment_id(),
            invoice_id: invoice_id.to_string(),
            sequence,
            due_date,
            amount_cents: 2_500,
            paid_at: None,
            paid_by: None,
            status: InstallmentStatus::Due,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_commit_persists_everything() {
        let fx = fixture(5).await;
        let inv = invoice(&fx.user_id, 2);

        let mut uow = fx.db.begin().await.unwrap();
        uow.insert_invoice(&inv).await.unwrap();
        uow.insert_invoice_item(&item(&inv.id, &fx.product_id, 2))
            .await
            .unwrap();
        assert!(uow.decrement_stock(&fx.product_id, 2).await.unwrap());
        uow.insert_installment(&payment(&inv.id, 2, date(2024, 3, 1)))
            .await
            .unwrap();
        uow.insert_installment(&payment(&inv.id, 1, date(2024, 2, 1)))
            .await
            .unwrap();
        assert_eq!(uow.product(&fx.product_id).await.unwrap().unwrap().stock, 3);
        uow.commit().await.unwrap();

        let stored = fx.db.invoices().get_by_id(&inv.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 5_000);
        assert_eq!(stored.payment_method, PaymentMethod::Cash);
        assert_eq!(fx.db.invoices().get_items(&inv.id).await.unwrap().len(), 1);

        let schedule = fx.db.installments().for_invoice(&inv.id).await.unwrap();
        let sequences: Vec<u32> = schedule.iter().map(|p| p.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);

        let listed = fx.db.invoices().with_installments().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].customer_name.is_none());
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let fx = fixture(5).await;
        let inv = invoice(&fx.user_id, 0);

        {
            let mut uow = fx.db.begin().await.unwrap();
            uow.insert_invoice(&inv).await.unwrap();
            assert!(uow.decrement_stock(&fx.product_id, 4).await.unwrap());
            // dropped without commit
        }

        assert!(fx.db.invoices().get_by_id(&inv.id).await.unwrap().is_none());
        let product = fx.db.products().get_by_id(&fx.product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
    }

    #[tokio::test]
    async fn test_duplicate_line_rejected() {
        let fx = fixture(5).await;
        let inv = invoice(&fx.user_id, 0);

        let mut uow = fx.db.begin().await.unwrap();
        uow.insert_invoice(&inv).await.unwrap();
        uow.insert_invoice_item(&item(&inv.id, &fx.product_id, 1))
            .await
            .unwrap();
        let err = uow
            .insert_invoice_item(&item(&inv.id, &fx.product_id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        uow.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_mark_overdue_and_paid() {
        let fx = fixture(5).await;
        let inv = invoice(&fx.user_id, 3);
        let past = payment(&inv.id, 1, date(2024, 5, 1));
        let today_due = payment(&inv.id, 2, date(2024, 6, 1));
        let future = payment(&inv.id, 3, date(2024, 7, 1));

        let mut uow = fx.db.begin().await.unwrap();
        uow.insert_invoice(&inv).await.unwrap();
        for p in [&past, &today_due, &future] {
            uow.insert_installment(p).await.unwrap();
        }
        uow.commit().await.unwrap();

        let repo = fx.db.installments();
        let today = date(2024, 6, 1);

        assert_eq!(repo.mark_overdue(today).await.unwrap(), 1);
        assert_eq!(repo.mark_overdue(today).await.unwrap(), 0);

        let stored = repo.get_by_id(&past.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InstallmentStatus::Overdue);

        assert!(repo.mark_paid(&past.id, today, &fx.user_id).await.unwrap());
        assert!(!repo.mark_paid(&past.id, today, &fx.user_id).await.unwrap());

        let stored = repo.get_by_id(&past.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InstallmentStatus::Paid);
        assert_eq!(stored.paid_at, Some(today));
        assert_eq!(stored.paid_by.as_deref(), Some(fx.user_id.as_str()));

        // Paid rows are left alone by later reconciliation
        assert_eq!(repo.mark_overdue(date(2025, 1, 1)).await.unwrap(), 2);
        let stored = repo.get_by_id(&past.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InstallmentStatus::Paid);

        let outstanding = fx.db.reports().outstanding_installments().await.unwrap();
        assert_eq!(outstanding.count, 2);
        assert_eq!(outstanding.overdue_count, 2);
        assert_eq!(outstanding.amount.cents(), 5_000);
    }
}
