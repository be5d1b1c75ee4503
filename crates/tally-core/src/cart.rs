//! # Cart
//!
//! The in-progress sale a cashier builds before checkout.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier Action            Cart Method              Effect              │
//! │  ──────────────            ───────────              ──────              │
//! │  Scan product ───────────► add_product() ─────────► push / qty += n     │
//! │  Change quantity ────────► update_quantity() ─────► qty = n (0 removes) │
//! │  Line discount / tax ────► set_line_terms() ──────► discount, tax       │
//! │  Remove line ────────────► remove_product() ──────► retain              │
//! │  Checkout ───────────────► (tally-ledger) ────────► invoice             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product increases quantity)
//! - Quantity is always in `1..=MAX_ITEM_QUANTITY`
//! - At most `MAX_CART_ITEMS` lines
//! - Unit price and name are display copies; checkout reprices every line
//!   from the product row

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{price_line, LinePricing, Totals};
use crate::types::Product;
use crate::validation::{validate_cart_size, validate_percentage_bps, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    /// Product name when the line was added, for display.
    pub name: String,
    /// Unit price in cents when the line was added, for display. Checkout
    /// ignores it and charges the catalog price.
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub discount_bps: u32,
    pub tax_bps: u32,
}

impl CartLine {
    /// Creates a line from a product with no discount and no tax.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            discount_bps: 0,
            tax_bps: 0,
        }
    }

    /// Unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Priced breakdown of this line.
    pub fn pricing(&self) -> LinePricing {
        price_line(self.unit_price(), self.quantity, self.discount_bps, self.tax_bps)
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a product or increases the quantity of its existing line.
    ///
    /// Stock is checked against the merged quantity here for early feedback;
    /// checkout checks it again inside its transaction.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        let existing = self.lines.iter().position(|l| l.product_id == product.id);
        let new_qty = existing.map_or(quantity, |idx| self.lines[idx].quantity + quantity);

        if new_qty > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: new_qty,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if !product.can_sell(new_qty) {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: new_qty,
            });
        }

        match existing {
            Some(idx) => self.lines[idx].quantity = new_qty,
            None => {
                validate_cart_size(self.lines.len())
                    .map_err(|_| CoreError::CartTooLarge { max: MAX_CART_ITEMS })?;
                self.lines.push(CartLine::from_product(product, quantity));
            }
        }

        Ok(())
    }

    /// Sets the quantity of a line. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_product(product_id);
        }

        validate_quantity(quantity)?;

        let line = self.line_mut(product_id)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Sets discount and tax (basis points) on a line.
    pub fn set_line_terms(
        &mut self,
        product_id: &str,
        discount_bps: u32,
        tax_bps: u32,
    ) -> CoreResult<()> {
        validate_percentage_bps("discount", discount_bps)?;
        validate_percentage_bps("tax", tax_bps)?;

        let line = self.line_mut(product_id)?;
        line.discount_bps = discount_bps;
        line.tax_bps = tax_bps;
        Ok(())
    }

    /// Removes a line by product ID.
    pub fn remove_product(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == initial_len {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Totals across all lines.
    pub fn totals(&self) -> Totals {
        let priced: Vec<LinePricing> = self.lines.iter().map(CartLine::pricing).collect();
        Totals::from_lines(&priced)
    }

    /// Grand total.
    pub fn total(&self) -> Money {
        self.totals().total
    }

    fn line_mut(&mut self, product_id: &str) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            price_cents,
            stock,
            category_id: None,
            barcode: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_add_product() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 10);

        cart.add_product(&product, 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total().cents(), 1998);
    }

    #[test]
    fn test_cart_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 10);

        cart.add_product(&product, 2).unwrap();
        cart.add_product(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_cart_rejects_more_than_stock() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 3);

        cart.add_product(&product, 2).unwrap();
        let err = cart.add_product(&product, 2).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_cart_line_terms() {
        let mut cart = Cart::new();
        let product = test_product("1", 10_000, 5);

        cart.add_product(&product, 2).unwrap();
        cart.set_line_terms("1", 1000, 500).unwrap();

        assert_eq!(cart.total().cents(), 18_900);
        assert!(cart.set_line_terms("1", 10_001, 0).is_err());
        assert!(matches!(
            cart.set_line_terms("missing", 0, 0),
            Err(CoreError::NotInCart(_))
        ));
    }

    #[test]
    fn test_cart_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        let product = test_product("1", 500, 5);

        cart.add_product(&product, 2).unwrap();
        cart.update_quantity("1", 0).unwrap();

        assert!(cart.is_empty());
        assert!(cart.remove_product("1").is_err());
    }

    #[test]
    fn test_cart_size_limit() {
        let mut cart = Cart::new();
        for idx in 0..MAX_CART_ITEMS {
            cart.add_product(&test_product(&idx.to_string(), 100, 10), 1)
                .unwrap();
        }

        let err = cart
            .add_product(&test_product("overflow", 100, 10), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }
}
