//! # tally-ledger: Operations for Tally POS
//!
//! The operations a POS front end calls: checkout, installment tracking,
//! returns, login and validated catalog maintenance.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI (external)                                                          │
//! │       │  Cart built in memory with tally_core::Cart                     │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tally-ledger (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  SalesLedger        checkout, invoice, recent_invoices          │   │
//! │  │  InstallmentTracker reconcile_overdue, record_payment, overview │   │
//! │  │  ReturnsProcessor   process_return, delete_return, list_returns │   │
//! │  │  Authenticator      login, users                                │   │
//! │  │  Catalog            products, categories, contacts, expenses,   │   │
//! │  │                     settings, reports                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tally-db (repositories, UnitOfWork) ──► SQLite                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//! use tally_ledger::Ledger;
//!
//! let ledger = Ledger::new(Database::new(DbConfig::from_env()).await?);
//! let user = ledger.auth().login("admin", "admin123").await?;
//!
//! let receipt = ledger
//!     .sales()
//!     .checkout(&cart, None, &user, PaymentMethod::Cash, InstallmentTerms::paid_in_full(), today)
//!     .await?;
//! ```

pub mod auth;
pub mod catalog;
pub mod error;
pub mod installments;
pub mod returns;
pub mod sales;

pub use auth::Authenticator;
pub use catalog::{Catalog, NewProduct};
pub use error::{ErrorCode, LedgerError, LedgerResult};
pub use installments::{InstallmentTracker, InvoiceSchedule};
pub use returns::{ReturnReceipt, ReturnsProcessor};
pub use sales::{CheckoutReceipt, InvoiceDetail, SalesLedger};

use tally_db::Database;

/// Entry point bundling every service over one database handle.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Database,
}

impl Ledger {
    /// Creates a new Ledger.
    pub fn new(db: Database) -> Self {
        Ledger { db }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn sales(&self) -> SalesLedger {
        SalesLedger::new(self.db.clone())
    }

    pub fn installments(&self) -> InstallmentTracker {
        InstallmentTracker::new(self.db.clone())
    }

    pub fn returns(&self) -> ReturnsProcessor {
        ReturnsProcessor::new(self.db.clone())
    }

    pub fn auth(&self) -> Authenticator {
        Authenticator::new(self.db.clone())
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.db.clone())
    }
}
