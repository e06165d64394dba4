//! Shipping Data

use crate::domain::shipping::records::{AddressUuid, ShippingMethodUuid};

/// New Shipping Method Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewShippingMethod {
    pub uuid: ShippingMethodUuid,
    pub name: String,
    pub price: u64,
}

/// New Address Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewAddress {
    pub uuid: AddressUuid,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}
