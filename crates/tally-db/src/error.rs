//! # Storage Errors
//!
//! `sqlx::Error` is folded into [`DbError`] at the repository boundary so
//! callers can tell a missing row or a constraint hit apart from a broken
//! connection. `tally-ledger` turns these into coded `LedgerError`s.
//!
//! ```text
//! sqlx::Error::RowNotFound                         → NotFound
//! "UNIQUE constraint failed: products.barcode"     → UniqueViolation { field: "barcode" }
//! "FOREIGN KEY constraint failed"                  → ForeignKeyViolation
//! other database message                           → QueryFailed
//! PoolTimedOut / PoolClosed                        → PoolExhausted / ConnectionFailed
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Lookup missed, or an UPDATE/DELETE matched no row.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Duplicate barcode, username, category name or invoice line.
    ///
    /// Repositories that know the offending value rebuild this with
    /// [`DbError::duplicate`]; otherwise `value` is `"unknown"`.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A row is still referenced (sold product, customer with invoices) or a
    /// reference points nowhere.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN, COMMIT or ROLLBACK failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// Column named by a SQLite UNIQUE failure.
///
/// `"UNIQUE constraint failed: invoice_items.invoice_id, invoice_items.product_id"`
/// yields `"invoice_id, product_id"`.
fn unique_columns(detail: &str) -> String {
    detail
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.rsplit_once('.').map_or(part, |(_, column)| column)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if let Some(detail) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::duplicate(unique_columns(detail), "unknown")
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Invoice", "abc");
        assert_eq!(err.to_string(), "Invoice not found: abc");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unique_columns() {
        assert_eq!(unique_columns("products.barcode"), "barcode");
        assert_eq!(
            unique_columns("invoice_items.invoice_id, invoice_items.product_id"),
            "invoice_id, product_id"
        );
        assert_eq!(unique_columns("name"), "name");
    }

    #[test]
    fn test_sqlx_mapping() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());

        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::PoolExhausted));

        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }
}
