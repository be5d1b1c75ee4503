//! # tally-core: Pure Business Rules for Tally POS
//!
//! Everything the ledger decides without touching the database lives here:
//! money math, line pricing, the cart, installment schedules and status
//! transitions, return caps, validation and the typed settings view.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 UI layer (external, not in this repo)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                      tally-ledger                               │   │
//! │  │   SalesLedger • InstallmentTracker • ReturnsProcessor • Auth    │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────┐  ┌────────▼────────────────────┐  │
//! │  │   ★ tally-core (THIS CRATE) ★   │  │        tally-db             │  │
//! │  │                                 │  │  SQLite pool, migrations,   │  │
//! │  │  money • pricing • cart         │◄─┤  repositories, UnitOfWork   │  │
//! │  │  installment • returns          │  │                             │  │
//! │  │  validation • settings • types  │  └─────────────────────────────┘  │
//! │  │                                 │                                   │
//! │  │  NO I/O • NO DATABASE • NO CLOCK│                                   │
//! │  └─────────────────────────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain rows (Product, Invoice, InstallmentPayment, ...)
//! - [`money`] - Integer-cent Money type
//! - [`pricing`] - Discount then tax per invoice line
//! - [`cart`] - The in-progress sale
//! - [`installment`] - Down payments, schedules, status transitions
//! - [`returns`] - Refund and return-quantity rules
//! - [`settings`] - Typed view over the key/value settings
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **No I/O**: "today" is always a parameter, never read from the clock
//! 3. **Integer Money**: cents (i64) and basis points (u32), never floats
//! 4. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::pricing::price_line;
//!
//! // $100.00 × 2 with 10% discount and 5% tax
//! let line = price_line(Money::from_cents(10_000), 2, 1000, 500);
//! assert_eq!(line.total.to_string(), "189.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod installment;
pub mod money;
pub mod pricing;
pub mod returns;
pub mod settings;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use installment::{DownPayment, InstallmentTerms, ScheduledPayment};
pub use money::Money;
pub use pricing::{price_line, LinePricing, Totals};
pub use settings::StoreSettings;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Catches typos like 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted, in cents.
///
/// A full cart at this price and quantity, with 100% tax, stays well inside
/// `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000_000;

/// Longest installment plan accepted, in months.
pub const MAX_INSTALLMENTS: u32 = 120;
