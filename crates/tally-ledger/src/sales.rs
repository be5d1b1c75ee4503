//! # Sales Ledger
//!
//! Turns a cart and payment terms into a persisted invoice.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout(cart, customer?, user, method, terms, today)                  │
//! │                                                                         │
//! │  1. Validate (no I/O)                                                   │
//! │     cart non-empty, quantities and line terms in range                  │
//! │                                                                         │
//! │  2. BEGIN ─────────────────────────────────────────────────────────┐    │
//! │     customer exists?                       NotFound                │    │
//! │     for each line:                                                 │    │
//! │        product exists?                     NotFound                │    │
//! │        price from the product row, not the cart                    │    │
//! │     down payment within [0, total], schedule builds                │    │
//! │     INSERT invoices                                                │    │
//! │     for each line:                                                 │    │
//! │        UPDATE stock WHERE stock >= qty     InsufficientStock       │    │
//! │        INSERT invoice_items                                        │    │
//! │     for each scheduled payment:                                    │    │
//! │        INSERT installment_payments (status = due)                  │    │
//! │  3. COMMIT ────────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing persists.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{LedgerError, LedgerResult};
use tally_core::installment::build_schedule;
use tally_core::validation::{validate_percentage_bps, validate_price_cents, validate_quantity};
use tally_core::{
    price_line, ActingUser, Cart, CartLine, CoreError, InstallmentPayment, InstallmentStatus,
    InstallmentTerms, Invoice, InvoiceItem, LinePricing, Money, PaymentMethod, Product, Totals,
};
use tally_db::repository::installment::generate_installment_id;
use tally_db::repository::invoice::{generate_invoice_id, generate_invoice_item_id};
use tally_db::{Database, InvoiceWithCustomer};

/// Everything a receipt needs about a completed checkout.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub totals: Totals,
    /// Empty unless the invoice is paid in installments.
    pub schedule: Vec<InstallmentPayment>,
}

impl CheckoutReceipt {
    /// Balance left after the down payment.
    pub fn financed(&self) -> Money {
        self.schedule.iter().map(InstallmentPayment::amount).sum()
    }
}

/// An invoice with its lines.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

/// Checkout and invoice lookups.
#[derive(Debug, Clone)]
pub struct SalesLedger {
    db: Database,
}

impl SalesLedger {
    /// Creates a new SalesLedger.
    pub fn new(db: Database) -> Self {
        SalesLedger { db }
    }

    /// Persists a sale.
    ///
    /// Each line is priced from the product row read inside the
    /// transaction; the price and name cached on the cart line are display
    /// copies only. Installment due dates are `today` plus 1..=count months.
    /// The cart is not modified; clear it after a successful checkout.
    ///
    /// ## Returns
    /// * `Ok(CheckoutReceipt)` - Invoice, lines and schedule as stored
    /// * `Err(BUSINESS_LOGIC)` - Empty cart
    /// * `Err(NOT_FOUND)` - Unknown customer or product
    /// * `Err(INSUFFICIENT_STOCK)` - A line asks for more than is on hand
    /// * `Err(PAYMENT_ERROR)` - Down payment larger than the total
    pub async fn checkout(
        &self,
        cart: &Cart,
        customer_id: Option<&str>,
        user: &ActingUser,
        payment_method: PaymentMethod,
        terms: InstallmentTerms,
        today: NaiveDate,
    ) -> LedgerResult<CheckoutReceipt> {
        debug!(
            lines = cart.item_count(),
            user = %user.username,
            installments = terms.count,
            "checkout"
        );

        if cart.is_empty() {
            warn!(user = %user.username, "Checkout rejected: empty cart");
            return Err(CoreError::EmptyCart.into());
        }

        for line in &cart.lines {
            validate_quantity(line.quantity).map_err(CoreError::from)?;
            validate_percentage_bps("discount", line.discount_bps).map_err(CoreError::from)?;
            validate_percentage_bps("tax", line.tax_bps).map_err(CoreError::from)?;
        }

        let mut uow = self.db.begin().await?;

        if let Some(id) = customer_id {
            if uow.customer(id).await?.is_none() {
                warn!(customer_id = %id, "Checkout rejected: unknown customer");
                return Err(LedgerError::not_found("Customer", id));
            }
        }

        let mut priced: Vec<(&CartLine, Product, LinePricing)> = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            let product = uow
                .product(&line.product_id)
                .await?
                .ok_or_else(|| LedgerError::not_found("Product", &line.product_id))?;
            validate_price_cents(product.price_cents).map_err(CoreError::from)?;

            if line.unit_price_cents != product.price_cents {
                debug!(
                    product_id = %product.id,
                    cart_price = line.unit_price_cents,
                    price = product.price_cents,
                    "Cart price differs from catalog, using catalog"
                );
            }

            let pricing = price_line(product.price(), line.quantity, line.discount_bps, line.tax_bps);
            priced.push((line, product, pricing));
        }

        let totals = Totals::from_lines(priced.iter().map(|(_, _, pricing)| pricing));
        let down_payment = terms.down_payment.resolve(totals.total)?;
        let planned = build_schedule(totals.total, down_payment, terms.count, today)?;

        let invoice = Invoice {
            id: generate_invoice_id(),
            customer_id: customer_id.map(str::to_string),
            user_id: user.id.clone(),
            created_at: Utc::now(),
            total_cents: totals.total.cents(),
            payment_method,
            down_payment_cents: down_payment.cents(),
            installment_count: terms.count,
        };
        uow.insert_invoice(&invoice).await?;

        let mut items = Vec::with_capacity(priced.len());
        for (line, product, pricing) in priced {
            if !uow.decrement_stock(&product.id, line.quantity).await? {
                warn!(
                    product_id = %product.id,
                    available = product.stock,
                    requested = line.quantity,
                    "Checkout rejected: insufficient stock"
                );
                return Err(CoreError::InsufficientStock {
                    product: product.name,
                    available: product.stock,
                    requested: line.quantity,
                }
                .into());
            }

            let item = InvoiceItem {
                id: generate_invoice_item_id(),
                invoice_id: invoice.id.clone(),
                product_id: product.id,
                product_name: product.name,
                quantity: line.quantity,
                unit_price_cents: product.price_cents,
                discount_bps: line.discount_bps,
                tax_bps: line.tax_bps,
                line_total_cents: pricing.total.cents(),
            };
            uow.insert_invoice_item(&item).await?;
            items.push(item);
        }

        let mut schedule = Vec::with_capacity(planned.len());
        for scheduled in planned {
            let payment = InstallmentPayment {
                id: generate_installment_id(),
                invoice_id: invoice.id.clone(),
                sequence: scheduled.sequence,
                due_date: scheduled.due_date,
                amount_cents: scheduled.amount.cents(),
                paid_at: None,
                paid_by: None,
                status: InstallmentStatus::Due,
            };
            uow.insert_installment(&payment).await?;
            schedule.push(payment);
        }

        uow.commit().await?;

        info!(
            invoice_id = %invoice.id,
            total = %totals.total,
            items = items.len(),
            installments = schedule.len(),
            "Checkout complete"
        );

        Ok(CheckoutReceipt {
            invoice,
            items,
            totals,
            schedule,
        })
    }

    /// Gets an invoice with its lines.
    pub async fn invoice(&self, id: &str) -> LedgerResult<InvoiceDetail> {
        let invoice = self
            .db
            .invoices()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Invoice", id))?;

        let items = self.db.invoices().get_items(id).await?;

        Ok(InvoiceDetail { invoice, items })
    }

    /// Most recent invoices first, with customer names.
    pub async fn recent_invoices(&self, limit: u32) -> LedgerResult<Vec<InvoiceWithCustomer>> {
        Ok(self.db.invoices().recent(limit).await?)
    }
}
