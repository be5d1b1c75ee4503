//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                 Sales                    After-sale            │
//! │  ───────                 ─────                    ──────────            │
//! │  Category ◄── Product    Invoice ──► InvoiceItem  InstallmentPayment    │
//! │                 ▲          │  │                   ProductReturn         │
//! │                 │          │  └─► Customer                              │
//! │                 └──────────┘     User (acting)    Expense (standalone)  │
//! │                                                                         │
//! │  Enums: PaymentMethod { cash, card, multi }                            │
//! │         InstallmentStatus { due, paid, overdue }                       │
//! │         UserRole { admin, cashier }                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money Columns
//! Every monetary field is an `i64` of cents with a `_cents` suffix, every
//! percentage a `u32` of basis points with a `_bps` suffix. Accessors return
//! [`Money`] / [`TaxRate`] for arithmetic.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 500 bps = 5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Units on hand. Expected to stay ≥ 0.
    pub stock: i64,

    /// Optional category.
    pub category_id: Option<String>,

    /// Barcode (EAN-13, UPC-A, ...). Unique when present.
    pub barcode: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Product grouping.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Contact details shared by customers and suppliers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactInfo {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// A customer an invoice can be billed to.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A supplier of catalog products.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Users
// =============================================================================

/// Role of an application user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Cashier,
}

/// A stored application user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string. Never serialized out.
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// The authenticated user performing an operation.
///
/// Passed explicitly into ledger operations instead of being read from
/// session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActingUser {
    pub id: String,
    pub username: String,
    pub role: UserRole,
}

impl ActingUser {
    /// Whether this user may perform administrative actions.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for ActingUser {
    fn from(user: &User) -> Self {
        ActingUser {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How an invoice was paid at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Split across several tenders.
    Multi,
}

// =============================================================================
// Invoice
// =============================================================================

/// A completed sale. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub customer_id: Option<String>,
    /// The cashier who rang up the sale.
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Amount paid at the counter when an installment plan is used.
    pub down_payment_cents: i64,
    /// Number of scheduled installments (0 = paid in full).
    pub installment_count: u32,
}

/// A line of an invoice.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub discount_bps: u32,
    pub tax_bps: u32,
    /// Discounted and taxed line total.
    pub line_total_cents: i64,
}

impl InvoiceItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Installments
// =============================================================================

/// Lifecycle state of a scheduled installment payment.
///
/// ```text
///        today > due_date
///   due ─────────────────► overdue
///    │                        │
///    │ record_payment         │ record_payment
///    ▼                        ▼
///   paid ◄────────────────────┘   (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Due,
    Paid,
    Overdue,
}

impl Default for InstallmentStatus {
    fn default() -> Self {
        InstallmentStatus::Due
    }
}

/// One scheduled payment of an invoice's installment plan.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InstallmentPayment {
    pub id: String,
    pub invoice_id: String,
    /// 1-based position in the schedule.
    pub sequence: u32,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub amount_cents: i64,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<NaiveDate>,
    /// User who recorded the settlement.
    pub paid_by: Option<String>,
    pub status: InstallmentStatus,
}

impl InstallmentPayment {
    /// Returns the scheduled amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Returns & Expenses
// =============================================================================

/// Audit row for a post-sale return.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductReturn {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub reason: String,
    /// Damaged units are not put back into sellable stock.
    pub is_damaged: bool,
    /// Refund computed from the invoice line's frozen unit price.
    pub refund_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A standalone business expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A raw key/value setting row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
