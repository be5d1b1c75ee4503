//! Return rules: how much may be taken back and what is refunded.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::InvoiceItem;
use crate::validation::validate_quantity;

/// Refund for returning `quantity` units at the price frozen on the invoice.
#[inline]
pub fn refund_amount(unit_price: Money, quantity: i64) -> Money {
    unit_price.multiply_quantity(quantity)
}

/// Checks a single return request against the sold invoice line.
///
/// The cap is per request. Earlier returns against the same line are not
/// subtracted.
pub fn validate_return_quantity(item: &InvoiceItem, requested: i64) -> CoreResult<()> {
    validate_quantity(requested)?;

    if requested > item.quantity {
        return Err(CoreError::ReturnExceedsSold {
            product: item.product_name.clone(),
            sold: item.quantity,
            requested,
        });
    }

    Ok(())
}

impl InvoiceItem {
    /// Refund owed for returning `quantity` units of this line.
    pub fn refund_for(&self, quantity: i64) -> Money {
        refund_amount(self.unit_price(), quantity)
    }
}
