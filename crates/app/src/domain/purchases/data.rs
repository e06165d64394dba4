//! Purchases Data

use crate::domain::{
    catalog::records::ProductUuid,
    purchases::records::{PurchaseItemUuid, PurchaseUuid},
    users::records::UserUuid,
};

/// New Purchase Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    pub uuid: PurchaseUuid,
    pub user_uuid: UserUuid,
    pub subtotal: u64,
    pub discount_amount: u64,
    pub delivery_fee: u64,
    pub total: u64,
    pub tracking_number: String,
    pub shipping_method_name: String,
    pub payment_method: String,
    pub payment_id: String,
}

/// New Purchase Item Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchaseItem {
    pub uuid: PurchaseItemUuid,
    pub product_uuid: ProductUuid,
    pub product_name: String,
    pub quantity: u64,
    pub price: u64,
}

/// A purchase together with its snapshotted shipping address.
#[derive(Debug, Clone)]
pub struct PurchaseDetails {
    pub purchase: crate::domain::purchases::records::PurchaseRecord,
    pub shipping_address: Option<crate::domain::purchases::records::PurchaseAddressRecord>,
}
