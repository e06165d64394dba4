//! Carts Data

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{
    carts::records::{CartItemRecord, CartItemUuid},
    catalog::records::ProductUuid,
};

/// New Cart Item Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u64,
    pub variant_options: BTreeMap<String, String>,
}

impl NewCartItem {
    /// A plain line with no variant options.
    #[must_use]
    pub fn of(product_uuid: ProductUuid, quantity: u64) -> Self {
        Self {
            uuid: CartItemUuid::new(),
            product_uuid,
            quantity,
            variant_options: BTreeMap::new(),
        }
    }
}

/// Result of a quantity update: the line survived, or hit zero and was
/// removed.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    Updated(CartItemRecord),
    Removed,
}

/// Cart aggregate for display and for the order totals at checkout.
///
/// This is the data behind the storefront's cart JSON payload; currency
/// formatting is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub total_items: u64,
    /// Sum of line subtotals, in cents.
    pub subtotal: u64,
    /// Best active redeemed discount, as a percentage.
    pub discount_percent: u8,
    /// Discount applied to the subtotal, in cents (truncated).
    pub discount_amount: u64,
    /// Subtotal less discount, in cents.
    pub total: u64,
}

impl CartSummary {
    /// The summary every anonymous caller sees.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            total_items: 0,
            subtotal: 0,
            discount_percent: 0,
            discount_amount: 0,
            total: 0,
        }
    }

    pub(crate) fn from_totals(total_items: u64, subtotal: u64, discount_percent: u8) -> Self {
        let discount_amount = subtotal * u64::from(discount_percent) / 100;

        Self {
            total_items,
            subtotal,
            discount_percent,
            discount_amount,
            total: subtotal - discount_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_amount_truncates_to_whole_cents() {
        let summary = CartSummary::from_totals(1, 999, 10);

        // 99.9 truncates down.
        assert_eq!(summary.discount_amount, 99);
        assert_eq!(summary.total, 900);
    }

    #[test]
    fn zero_percent_leaves_subtotal_untouched() {
        let summary = CartSummary::from_totals(2, 1500, 0);

        assert_eq!(summary.discount_amount, 0);
        assert_eq!(summary.total, 1500);
    }
}
