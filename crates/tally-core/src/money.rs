//! # Money
//!
//! Amounts are `i64` cents and percentages are `u32` basis points; no
//! floating point touches a price, a line total or an installment.
//!
//! ```text
//! percentage step   (amount * bps + 5000) / 10000      half-up to the cent
//! schedule split    1000 cents / 3 → [334, 333, 333]   remainder to the front
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2;             // $21.98
//! let total = price + Money::from_cents(500); // $15.99
//! assert_eq!(total.cents(), 1599);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Where Money Flows
/// ```text
/// Product.price_cents ──► CartLine.unit_price ──► LinePricing.total
///                                                      │
///                                 Invoice.total ◄──────┘
///                                      │
///             ┌────────────────────────┴───────────────────────┐
///             ▼                                                ▼
///     down payment (now)                     installment schedule (later)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -$5.50.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(189, 0).cents(), 18900);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `bps` basis points of this amount, rounded half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128 so
    /// large invoices cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// // 20% of $1,200.00 = $240.00
    /// let share = Money::from_cents(120_000).percentage_of(2000);
    /// assert_eq!(share.cents(), 24_000);
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        let scaled = (self.0 as i128 * bps as i128 + (BPS_SCALE as i128 / 2)) / BPS_SCALE as i128;
        Money::from_cents(scaled as i64)
    }

    /// Calculates tax on this amount.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::TaxRate;
    ///
    /// // 5% on $180.00 = $9.00
    /// let tax = Money::from_cents(18_000).calculate_tax(TaxRate::from_bps(500));
    /// assert_eq!(tax.cents(), 900);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage_of(rate.bps())
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(20_000); // $200.00
    /// let discounted = subtotal.apply_percentage_discount(1000); // 10% off
    /// assert_eq!(discounted.cents(), 18_000); // $180.00
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        *self - self.percentage_of(discount_bps)
    }

    /// Splits this amount into `parts` payments that sum exactly to it.
    ///
    /// Every part gets `amount / parts`; the remainder cents go one each to
    /// the earliest parts. Returns an empty vector when `parts` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let parts = Money::from_cents(1000).split_evenly(3);
    /// let cents: Vec<i64> = parts.iter().map(|m| m.cents()).collect();
    /// assert_eq!(cents, vec![334, 333, 333]);
    /// ```
    pub fn split_evenly(&self, parts: u32) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }

        let parts_i = parts as i64;
        let base = self.0 / parts_i;
        let remainder = self.0 % parts_i;
        let step = remainder.signum();

        (0..parts_i)
            .map(|idx| {
                if idx < remainder.abs() {
                    Money(base + step)
                } else {
                    Money(base)
                }
            })
            .collect()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. Currency formatting for the UI uses the
/// configured currency from `StoreSettings`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(18900).to_string(), "189.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 8.25% of $10.00 = 82.5 cents → 83
        assert_eq!(Money::from_cents(1000).percentage_of(825).cents(), 83);
        // 100% is identity
        assert_eq!(Money::from_cents(4321).percentage_of(10_000).cents(), 4321);
        assert_eq!(Money::from_cents(4321).percentage_of(0).cents(), 0);
    }

    #[test]
    fn test_discount_then_tax() {
        // $100 × 2, 10% off, 5% tax = $189.00
        let line = Money::from_cents(10_000).multiply_quantity(2);
        let discounted = line.apply_percentage_discount(1000);
        let taxed = discounted + discounted.calculate_tax(TaxRate::from_bps(500));
        assert_eq!(discounted.cents(), 18_000);
        assert_eq!(taxed.cents(), 18_900);
    }

    #[test]
    fn test_split_evenly_exact() {
        let parts = Money::from_cents(100_000).split_evenly(5);
        assert_eq!(parts.len(), 5);
        assert!(parts.iter().all(|p| p.cents() == 20_000));
    }

    #[test]
    fn test_split_evenly_distributes_remainder() {
        let parts = Money::from_cents(1001).split_evenly(4);
        let cents: Vec<i64> = parts.iter().map(|m| m.cents()).collect();
        assert_eq!(cents, vec![251, 250, 250, 250]);
        assert_eq!(parts.iter().sum::<Money>().cents(), 1001);
    }

    #[test]
    fn test_split_evenly_zero_parts() {
        assert!(Money::from_cents(500).split_evenly(0).is_empty());
    }

    #[test]
    fn test_split_evenly_zero_amount() {
        let parts = Money::zero().split_evenly(3);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.is_zero()));
    }
}
