//! Shipping Records

use serde::Serialize;

use crate::{domain::users::records::UserUuid, uuids::typed_uuid};

typed_uuid!(
    /// Shipping Method UUID
    ShippingMethodUuid
);

typed_uuid!(
    /// Address UUID
    AddressUuid
);

/// Shipping Method Record
#[derive(Debug, Clone, Serialize)]
pub struct ShippingMethodRecord {
    pub uuid: ShippingMethodUuid,
    pub name: String,
    /// Delivery fee in cents.
    pub price: u64,
}

/// Address Record
///
/// A customer's saved address. Checkout copies the chosen one into the
/// purchase rather than referencing it.
#[derive(Debug, Clone, Serialize)]
pub struct AddressRecord {
    pub uuid: AddressUuid,
    pub user_uuid: UserUuid,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}
