//! # Report Repository
//!
//! Read-only aggregates. Rendering and export live outside this crate.
//!
//! ## Sales Summary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  [from, to)                                                             │
//! │                                                                         │
//! │  revenue   = Σ invoices.total_cents      (by invoices.created_at)       │
//! │  refunds   = Σ returns.refund_cents      (by returns.created_at)        │
//! │  expenses  = Σ expenses.amount_cents     (by expenses.created_at)       │
//! │  ─────────────────────────────────────                                  │
//! │  net       = revenue - refunds - expenses                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use ts_rs::TS;

use crate::error::DbResult;
use tally_core::{InstallmentStatus, Money};

/// Sales totals over a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub invoice_count: i64,
    pub revenue: Money,
    pub refunds: Money,
    pub expenses: Money,
    pub net: Money,
}

/// Unpaid installment balance across all invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingInstallments {
    pub count: i64,
    pub overdue_count: i64,
    pub amount: Money,
}

/// Repository for report aggregates.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Revenue, refunds and expenses over `[from, to)`.
    pub async fn sales_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<SalesSummary> {
        let (invoice_count, revenue): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM invoices
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let refunds: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(refund_cents), 0)
            FROM returns
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let expenses: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM expenses
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let revenue = Money::from_cents(revenue);
        let refunds = Money::from_cents(refunds);
        let expenses = Money::from_cents(expenses);

        Ok(SalesSummary {
            invoice_count,
            revenue,
            refunds,
            expenses,
            net: revenue - refunds - expenses,
        })
    }

    /// Count and amount of payments not yet paid (due or overdue).
    pub async fn outstanding_installments(&self) -> DbResult<OutstandingInstallments> {
        let (count, overdue_count, amount): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = ?2 THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(amount_cents), 0)
            FROM installment_payments
            WHERE status <> ?1
            "#,
        )
        .bind(InstallmentStatus::Paid)
        .bind(InstallmentStatus::Overdue)
        .fetch_one(&self.pool)
        .await?;

        Ok(OutstandingInstallments {
            count,
            overdue_count,
            amount: Money::from_cents(amount),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    #[tokio::test]
    async fn test_empty_database_reports_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reports = db.reports();

        let now = Utc::now();
        let summary = reports
            .sales_summary(now - Duration::days(1), now)
            .await
            .unwrap();
        assert_eq!(summary.invoice_count, 0);
        assert!(summary.net.is_zero());

        let outstanding = reports.outstanding_installments().await.unwrap();
        assert_eq!(outstanding.count, 0);
        assert!(outstanding.amount.is_zero());
    }
}
