//! # Installment Plans
//!
//! Pure rules for splitting an invoice into a down payment plus a monthly
//! schedule, and for moving scheduled payments through their states.
//!
//! ## Schedule Generation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total 1200.00, down payment 200.00, 5 installments, today 2024-01-15   │
//! │                                                                         │
//! │  remaining = 1200.00 - 200.00 = 1000.00                                 │
//! │                                                                         │
//! │   #1  2024-02-15  200.00                                                │
//! │   #2  2024-03-15  200.00                                                │
//! │   #3  2024-04-15  200.00                                                │
//! │   #4  2024-05-15  200.00                                                │
//! │   #5  2024-06-15  200.00                                                │
//! │                   ──────                                                │
//! │                  1000.00  (always exact; leftover cents go to #1, #2..) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Month offsets are counted from the sale date and clamp to the end of
//! shorter months: a sale on Jan 31 is first due on Feb 28 (or 29).

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{InstallmentPayment, InstallmentStatus};
use crate::validation::{validate_installment_count, validate_percentage_bps};

// =============================================================================
// Down Payment
// =============================================================================

/// How the amount paid at the counter is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DownPayment {
    /// Fixed amount.
    Amount(Money),
    /// Share of the invoice total in basis points.
    Percentage(u32),
}

impl DownPayment {
    /// No down payment.
    pub const NONE: DownPayment = DownPayment::Amount(Money::zero());

    /// Resolves to an amount against `total`.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::installment::DownPayment;
    /// use tally_core::money::Money;
    ///
    /// let total = Money::from_cents(120_000);
    /// assert_eq!(DownPayment::Percentage(2500).resolve(total).unwrap().cents(), 30_000);
    /// assert!(DownPayment::Amount(Money::from_cents(130_000)).resolve(total).is_err());
    /// ```
    pub fn resolve(&self, total: Money) -> CoreResult<Money> {
        let amount = match *self {
            DownPayment::Amount(amount) => amount,
            DownPayment::Percentage(bps) => {
                validate_percentage_bps("down payment", bps)?;
                total.percentage_of(bps)
            }
        };

        if amount.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "down payment".to_string(),
                min: 0,
                max: total.cents(),
            }
            .into());
        }

        if amount > total {
            return Err(CoreError::DownPaymentExceedsTotal {
                down_payment: amount.cents(),
                total: total.cents(),
            });
        }

        Ok(amount)
    }
}

impl Default for DownPayment {
    fn default() -> Self {
        DownPayment::NONE
    }
}

/// Payment terms chosen at checkout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentTerms {
    pub down_payment: DownPayment,
    /// Number of monthly payments. Zero means paid in full.
    pub count: u32,
}

impl InstallmentTerms {
    /// Paid in full at the counter.
    pub fn paid_in_full() -> Self {
        InstallmentTerms::default()
    }

    /// Down payment followed by `count` monthly payments.
    pub fn monthly(down_payment: DownPayment, count: u32) -> Self {
        InstallmentTerms {
            down_payment,
            count,
        }
    }
}

// =============================================================================
// Schedule
// =============================================================================

/// A payment the schedule asks for, before it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPayment {
    pub sequence: u32,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub amount: Money,
}

/// Builds the monthly schedule covering `total - down_payment`.
///
/// Returns an empty schedule when `count` is zero. The amounts always sum to
/// the remaining balance exactly.
pub fn build_schedule(
    total: Money,
    down_payment: Money,
    count: u32,
    start: NaiveDate,
) -> CoreResult<Vec<ScheduledPayment>> {
    validate_installment_count(count)?;

    if down_payment > total {
        return Err(CoreError::DownPaymentExceedsTotal {
            down_payment: down_payment.cents(),
            total: total.cents(),
        });
    }

    let remaining = total - down_payment;

    remaining
        .split_evenly(count)
        .into_iter()
        .zip(1..=count)
        .map(|(amount, sequence)| {
            Ok(ScheduledPayment {
                sequence,
                due_date: due_date_for(start, sequence)?,
                amount,
            })
        })
        .collect()
}

/// Due date of the `sequence`-th monthly payment after `start`.
pub fn due_date_for(start: NaiveDate, sequence: u32) -> CoreResult<NaiveDate> {
    start
        .checked_add_months(Months::new(sequence))
        .ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: "due date".to_string(),
                reason: format!("{} + {} months is out of range", start, sequence),
            }
            .into()
        })
}

// =============================================================================
// Status Transitions
// =============================================================================

impl InstallmentStatus {
    /// Whether this status is terminal.
    pub fn is_settled(self) -> bool {
        self == InstallmentStatus::Paid
    }
}

impl InstallmentPayment {
    /// Checks that this payment can still be settled.
    pub fn ensure_payable(&self) -> CoreResult<()> {
        if self.status.is_settled() {
            return Err(CoreError::AlreadyPaid(self.id.clone()));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_even_schedule() {
        let schedule = build_schedule(
            Money::from_cents(120_000),
            Money::from_cents(20_000),
            5,
            date(2024, 1, 15),
        )
        .unwrap();

        assert_eq!(schedule.len(), 5);
        assert!(schedule.iter().all(|p| p.amount.cents() == 20_000));
        let dues: Vec<NaiveDate> = schedule.iter().map(|p| p.due_date).collect();
        assert_eq!(
            dues,
            vec![
                date(2024, 2, 15),
                date(2024, 3, 15),
                date(2024, 4, 15),
                date(2024, 5, 15),
                date(2024, 6, 15),
            ]
        );
        assert_eq!(schedule[0].sequence, 1);
        assert_eq!(schedule[4].sequence, 5);
    }

    #[test]
    fn test_schedule_remainder_goes_to_earliest() {
        let schedule =
            build_schedule(Money::from_cents(1000), Money::zero(), 3, date(2024, 1, 1)).unwrap();
        let cents: Vec<i64> = schedule.iter().map(|p| p.amount.cents()).collect();
        assert_eq!(cents, vec![334, 333, 333]);
    }

    #[test]
    fn test_schedule_clamps_month_end() {
        let schedule =
            build_schedule(Money::from_cents(300), Money::zero(), 3, date(2024, 1, 31)).unwrap();
        assert_eq!(schedule[0].due_date, date(2024, 2, 29));
        assert_eq!(schedule[1].due_date, date(2024, 3, 31));
        assert_eq!(schedule[2].due_date, date(2024, 4, 30));
    }

    #[test]
    fn test_zero_count_is_empty() {
        let schedule =
            build_schedule(Money::from_cents(500), Money::zero(), 0, date(2024, 1, 1)).unwrap();
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_down_payment_bounds() {
        let total = Money::from_cents(10_000);
        assert_eq!(DownPayment::NONE.resolve(total).unwrap(), Money::zero());
        assert_eq!(
            DownPayment::Amount(total).resolve(total).unwrap(),
            total
        );
        assert!(matches!(
            DownPayment::Amount(Money::from_cents(10_001)).resolve(total),
            Err(CoreError::DownPaymentExceedsTotal { .. })
        ));
        assert!(DownPayment::Amount(Money::from_cents(-1))
            .resolve(total)
            .is_err());
        assert!(DownPayment::Percentage(10_001).resolve(total).is_err());
    }

    #[test]
    fn test_ensure_payable() {
        let mut payment = InstallmentPayment {
            id: "p1".to_string(),
            invoice_id: "i1".to_string(),
            sequence: 1,
            due_date: date(2024, 5, 1),
            amount_cents: 100,
            paid_at: None,
            paid_by: None,
            status: InstallmentStatus::Overdue,
        };
        assert!(payment.ensure_payable().is_ok());

        payment.status = InstallmentStatus::Paid;
        assert!(matches!(
            payment.ensure_payable(),
            Err(CoreError::AlreadyPaid(_))
        ));
    }
}
