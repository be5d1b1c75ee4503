//! # Installment Tracker
//!
//! Keeps payment status in step with the calendar and records settlements.
//!
//! ## Status Machine
//! ```text
//!            due_date < today, unpaid
//!   ┌─────┐ ─────────────────────────► ┌─────────┐
//!   │ due │                            │ overdue │
//!   └──┬──┘                            └────┬────┘
//!      │ record_payment                     │ record_payment
//!      ▼                                    ▼
//!   ┌──────────────────────────────────────────┐
//!   │                  paid                    │  terminal
//!   └──────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{LedgerError, LedgerResult};
use tally_core::{ActingUser, CoreError, InstallmentPayment, InstallmentStatus, Invoice, Money};
use tally_db::{Database, OutstandingInstallments};

/// An installment invoice with its full schedule.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSchedule {
    pub invoice: Invoice,
    pub customer_name: Option<String>,
    /// Earliest due date first.
    pub payments: Vec<InstallmentPayment>,
}

impl InvoiceSchedule {
    /// Sum of settled payments.
    pub fn paid(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| p.status == InstallmentStatus::Paid)
            .map(InstallmentPayment::amount)
            .sum()
    }

    /// Sum of unsettled payments.
    pub fn outstanding(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| p.status != InstallmentStatus::Paid)
            .map(InstallmentPayment::amount)
            .sum()
    }

    /// Whether any payment is overdue.
    pub fn has_overdue(&self) -> bool {
        self.payments
            .iter()
            .any(|p| p.status == InstallmentStatus::Overdue)
    }
}

/// Installment reconciliation and settlement.
#[derive(Debug, Clone)]
pub struct InstallmentTracker {
    db: Database,
}

impl InstallmentTracker {
    /// Creates a new InstallmentTracker.
    pub fn new(db: Database) -> Self {
        InstallmentTracker { db }
    }

    /// Marks every unpaid payment due before `today` as overdue.
    ///
    /// Returns the number of payments that changed. Paid payments are never
    /// touched and a second run for the same day changes nothing.
    pub async fn reconcile_overdue(&self, today: NaiveDate) -> LedgerResult<u64> {
        let updated = self.db.installments().mark_overdue(today).await?;

        if updated > 0 {
            info!(today = %today, updated, "Installments marked overdue");
        }

        Ok(updated)
    }

    /// Settles one payment in full on `today`.
    ///
    /// ## Returns
    /// * `Ok(InstallmentPayment)` - The payment, now `paid`
    /// * `Err(NOT_FOUND)` - Unknown payment
    /// * `Err(PAYMENT_ERROR)` - Already paid
    pub async fn record_payment(
        &self,
        payment_id: &str,
        today: NaiveDate,
        user: &ActingUser,
    ) -> LedgerResult<InstallmentPayment> {
        debug!(payment_id = %payment_id, user = %user.username, "record_payment");

        let repo = self.db.installments();

        let payment = repo
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Installment payment", payment_id))?;

        if let Err(e) = payment.ensure_payable() {
            warn!(payment_id = %payment_id, "Payment rejected: already paid");
            return Err(e.into());
        }

        // Guarded update; loses to a concurrent settlement of the same row
        if !repo.mark_paid(payment_id, today, &user.id).await? {
            warn!(payment_id = %payment_id, "Payment rejected: settled concurrently");
            return Err(CoreError::AlreadyPaid(payment_id.to_string()).into());
        }

        info!(
            payment_id = %payment_id,
            invoice_id = %payment.invoice_id,
            amount = %payment.amount(),
            "Installment paid"
        );

        Ok(InstallmentPayment {
            status: InstallmentStatus::Paid,
            paid_at: Some(today),
            paid_by: Some(user.id.clone()),
            ..payment
        })
    }

    /// Every invoice with an installment plan, with customer name and schedule.
    pub async fn list_invoices_with_schedule(&self) -> LedgerResult<Vec<InvoiceSchedule>> {
        let invoices = self.db.invoices().with_installments().await?;
        let repo = self.db.installments();

        let mut schedules = Vec::with_capacity(invoices.len());
        for row in invoices {
            let payments = repo.for_invoice(&row.invoice.id).await?;
            schedules.push(InvoiceSchedule {
                invoice: row.invoice,
                customer_name: row.customer_name,
                payments,
            });
        }

        Ok(schedules)
    }

    /// Reconciles against `today`, then lists every schedule.
    pub async fn overview(&self, today: NaiveDate) -> LedgerResult<Vec<InvoiceSchedule>> {
        self.reconcile_overdue(today).await?;
        self.list_invoices_with_schedule().await
    }

    /// Payments of one invoice.
    pub async fn schedule_for(&self, invoice_id: &str) -> LedgerResult<Vec<InstallmentPayment>> {
        if self.db.invoices().get_by_id(invoice_id).await?.is_none() {
            return Err(LedgerError::not_found("Invoice", invoice_id));
        }

        Ok(self.db.installments().for_invoice(invoice_id).await?)
    }

    /// Count and amount still owed across all invoices.
    pub async fn outstanding(&self) -> LedgerResult<OutstandingInstallments> {
        Ok(self.db.reports().outstanding_installments().await?)
    }
}
