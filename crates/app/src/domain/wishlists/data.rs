//! Wishlists Data

use std::collections::BTreeMap;

use crate::domain::{
    catalog::records::{ProductRecord, ProductUuid},
    wishlists::records::WishlistItemUuid,
};

/// New Wishlist Item Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewWishlistItem {
    pub uuid: WishlistItemUuid,
    pub product_uuid: ProductUuid,
    pub variant_options: BTreeMap<String, String>,
}

impl NewWishlistItem {
    /// A wish for the product itself, no variant chosen.
    #[must_use]
    pub fn of(product_uuid: ProductUuid) -> Self {
        Self {
            uuid: WishlistItemUuid::new(),
            product_uuid,
            variant_options: BTreeMap::new(),
        }
    }
}

/// What changed among a user's wished-for products.
#[derive(Debug, Clone, Default)]
pub struct WishlistNotifications {
    pub on_sale: Vec<ProductRecord>,
    pub back_in_stock: Vec<ProductRecord>,
}

impl WishlistNotifications {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_sale.is_empty() && self.back_in_stock.is_empty()
    }
}
