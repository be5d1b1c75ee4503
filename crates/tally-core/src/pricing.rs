//! # Line Pricing
//!
//! Turns a (unit price, quantity, discount, tax) tuple into the amounts that
//! end up on an invoice line.
//!
//! ```text
//! subtotal   = unit_price × quantity
//! discounted = subtotal − round(subtotal × discount%)
//! tax        = round(discounted × tax%)
//! total      = discounted + tax
//! ```
//!
//! Each percentage step rounds half-up to the cent, so the invoice total is
//! the exact sum of the stored line totals.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::TaxRate;

/// Priced breakdown of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LinePricing {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

/// Prices one line.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::pricing::price_line;
///
/// // $100.00 × 2, 10% discount, 5% tax
/// let line = price_line(Money::from_cents(10_000), 2, 1000, 500);
/// assert_eq!(line.subtotal.cents(), 20_000);
/// assert_eq!(line.discount.cents(), 2_000);
/// assert_eq!(line.tax.cents(), 900);
/// assert_eq!(line.total.cents(), 18_900);
/// ```
pub fn price_line(unit_price: Money, quantity: i64, discount_bps: u32, tax_bps: u32) -> LinePricing {
    let subtotal = unit_price.multiply_quantity(quantity);
    let discounted = subtotal.apply_percentage_discount(discount_bps);
    let tax = discounted.calculate_tax(TaxRate::from_bps(tax_bps));

    LinePricing {
        subtotal,
        discount: subtotal - discounted,
        tax,
        total: discounted + tax,
    }
}

/// Aggregate of several priced lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl Totals {
    /// Sums line breakdowns.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a LinePricing>) -> Self {
        lines.into_iter().fold(Totals::default(), |mut acc, line| {
            acc.subtotal += line.subtotal;
            acc.discount += line.discount;
            acc.tax += line.tax;
            acc.total += line.total;
            acc
        })
    }
}
