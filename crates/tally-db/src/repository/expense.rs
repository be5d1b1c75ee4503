//! # Expense Repository

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::Expense;

/// Repository for business expenses.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts a new expense.
    pub async fn insert(&self, expense: &Expense) -> DbResult<Expense> {
        debug!(id = %expense.id, amount = expense.amount_cents, "Inserting expense");

        sqlx::query(
            "INSERT INTO expenses (id, description, amount_cents, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&expense.id)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(expense.clone())
    }

    /// Gets an expense by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(
            "SELECT id, description, amount_cents, created_at FROM expenses WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Expenses in `[from, to)`, newest first.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, description, amount_cents, created_at
            FROM expenses
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Sum of expenses in `[from, to)`, in cents.
    pub async fn total_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
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

        Ok(total)
    }

    /// Deletes an expense.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting expense");

        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }
}

/// Generates a new expense ID.
pub fn generate_expense_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    fn expense(description: &str, amount_cents: i64, created_at: DateTime<Utc>) -> Expense {
        Expense {
            id: generate_expense_id(),
            description: description.to_string(),
            amount_cents,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_range_queries() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.expenses();

        let now = Utc::now();
        repo.insert(&expense("Rent", 50_000, now - Duration::days(40)))
            .await
            .unwrap();
        repo.insert(&expense("Electricity", 7_500, now - Duration::days(2)))
            .await
            .unwrap();
        repo.insert(&expense("Cleaning", 1_200, now)).await.unwrap();

        let from = now - Duration::days(30);
        let to = now + Duration::seconds(1);

        assert_eq!(repo.list_between(from, to).await.unwrap().len(), 2);
        assert_eq!(repo.total_between(from, to).await.unwrap(), 8_700);
        // Half-open: `to` itself is excluded
        assert_eq!(repo.total_between(from, now).await.unwrap(), 7_500);
        assert_eq!(
            repo.total_between(now + Duration::days(1), now + Duration::days(2))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.expenses();

        let paper = repo.insert(&expense("Receipt paper", 900, Utc::now())).await.unwrap();
        assert!(repo.get_by_id(&paper.id).await.unwrap().is_some());

        repo.delete(&paper.id).await.unwrap();
        assert!(repo.delete(&paper.id).await.unwrap_err().is_not_found());
    }
}
