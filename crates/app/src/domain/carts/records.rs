//! Cart Records

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    domain::{catalog::records::ProductUuid, users::records::UserUuid},
    uuids::typed_uuid,
};

typed_uuid!(
    /// Cart Item UUID
    CartItemUuid
);

/// Cart Item Record
///
/// One line of a user's cart. `price` is the unit price snapshotted when the
/// line was created or last merged into, not the product's live price.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemRecord {
    pub uuid: CartItemUuid,
    pub user_uuid: UserUuid,
    pub product_uuid: ProductUuid,
    pub product_name: String,
    /// Chosen variant values, keyed by option name (canonical key order).
    pub variant_options: BTreeMap<String, String>,
    pub quantity: u64,
    /// Unit price in cents at add time.
    pub price: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartItemRecord {
    /// Line subtotal in cents.
    #[must_use]
    pub fn subtotal(&self) -> u64 {
        self.price * self.quantity
    }
}
