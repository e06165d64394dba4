//! Wishlist Records

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    domain::{catalog::records::ProductUuid, users::records::UserUuid},
    uuids::typed_uuid,
};

typed_uuid!(
    /// Wishlist Item UUID
    WishlistItemUuid
);

/// Wishlist Item Record
#[derive(Debug, Clone, Serialize)]
pub struct WishlistItemRecord {
    pub uuid: WishlistItemUuid,
    pub user_uuid: UserUuid,
    pub product_uuid: ProductUuid,
    pub product_name: String,
    pub variant_options: BTreeMap<String, String>,
    pub created_at: Timestamp,
}
