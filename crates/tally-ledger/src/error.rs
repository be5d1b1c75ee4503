//! # Ledger Error Type
//!
//! The one error type every ledger operation returns.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally POS                              │
//! │                                                                         │
//! │  ValidationError ──┐                                                    │
//! │                    ▼                                                    │
//! │  CoreError ───────────────┐                                             │
//! │  (business rules)         │                                             │
//! │                           ▼                                             │
//! │  DbError ────────────► LedgerError { code, message } ──► caller / UI    │
//! │  (constraint, I/O)        ▲                                             │
//! │                           │                                             │
//! │  Internal DB details are logged with error!() and replaced by a        │
//! │  generic message. Business failures keep their own message.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "code": "INSUFFICIENT_STOCK",
//!   "message": "Insufficient stock for Kettle: available 1, requested 3"
//! }
//! ```

use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use tally_db::DbError;
use thiserror::Error;
use ts_rs::TS;

/// Error returned from ledger operations.
#[derive(Debug, Clone, Serialize, TS, Error)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct LedgerError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for ledger responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced entity does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Business rule rejected the operation
    BusinessLogic,

    /// Not enough units on hand
    InsufficientStock,

    /// Down payment or installment settlement rejected
    PaymentError,

    /// Login failed
    Unauthorized,

    /// Anything else
    Internal,
}

impl LedgerError {
    /// Creates a new ledger error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        LedgerError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(entity: &str, id: &str) -> Self {
        LedgerError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        LedgerError::new(ErrorCode::Internal, message)
    }

    /// Whether this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

/// Converts database errors to ledger errors.
impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LedgerError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => LedgerError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                LedgerError::new(
                    ErrorCode::BusinessLogic,
                    "Record is referenced by other records or references a missing one",
                )
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                LedgerError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                LedgerError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                LedgerError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                LedgerError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                LedgerError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                LedgerError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to ledger errors.
impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(id) => return LedgerError::not_found("Product", id),
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::QuantityTooLarge { .. } => ErrorCode::ValidationError,
            CoreError::EmptyCart
            | CoreError::CartTooLarge { .. }
            | CoreError::NotInCart(_)
            | CoreError::ReturnExceedsSold { .. } => ErrorCode::BusinessLogic,
            CoreError::DownPaymentExceedsTotal { .. } | CoreError::AlreadyPaid(_) => {
                ErrorCode::PaymentError
            }
            CoreError::InvalidCredentials => ErrorCode::Unauthorized,
        };

        let message = match err {
            CoreError::Validation(e) => e.to_string(),
            other => other.to_string(),
        };

        LedgerError::new(code, message)
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::validation(err.to_string())
    }
}

/// Convenience type alias for ledger results.
pub type LedgerResult<T> = Result<T, LedgerError>;
