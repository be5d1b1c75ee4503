//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Ledger operation                                                      │
//! │       │                                                                 │
//! │       │  db.products().get_by_barcode("5901234123457")                 │
//! │       ▼                                                                 │
//! │  ProductRepository (holds a pool clone, one statement per call)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Statements that must also run inside a transaction are written once   │
//! │  as crate-private functions generic over `SqliteExecutor`, and called  │
//! │  with `&SqlitePool` by the repository or with the transaction's        │
//! │  connection by `UnitOfWork`.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product CRUD, search, stock
//! - [`CategoryRepository`] - Categories
//! - [`CustomerRepository`] / [`SupplierRepository`] - Contacts
//! - [`InvoiceRepository`] - Invoice and line reads
//! - [`InstallmentRepository`] - Schedules, overdue reconciliation, settlement
//! - [`ReturnRepository`] - Return audit rows
//! - [`ExpenseRepository`] - Expenses
//! - [`SettingsRepository`] - Key/value settings
//! - [`UserRepository`] - Users and password hashes
//! - [`ReportRepository`] - Aggregates

pub mod category;
pub mod contact;
pub mod expense;
pub mod installment;
pub mod invoice;
pub mod product;
pub mod report;
pub mod returns;
pub mod settings;
pub mod user;

pub use category::CategoryRepository;
pub use contact::{CustomerRepository, SupplierRepository};
pub use expense::ExpenseRepository;
pub use installment::InstallmentRepository;
pub use invoice::{InvoiceRepository, InvoiceWithCustomer};
pub use product::ProductRepository;
pub use report::{OutstandingInstallments, ReportRepository, SalesSummary};
pub use returns::ReturnRepository;
pub use settings::SettingsRepository;
pub use user::UserRepository;
