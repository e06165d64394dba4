//! Purchase Records

use jiff::Timestamp;
use serde::{Serialize, Serializer};

use crate::{
    domain::{catalog::records::ProductUuid, users::records::UserUuid},
    uuids::typed_uuid,
};

typed_uuid!(
    /// Purchase UUID
    PurchaseUuid
);

typed_uuid!(
    /// Purchase Item UUID
    PurchaseItemUuid
);

typed_uuid!(
    /// Purchase Address UUID
    PurchaseAddressUuid
);

/// Purchase lifecycle state.
///
/// Only `pending` orders can be cancelled; the back office may set other
/// values ("shipped", "delivered", …) which are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseStatus {
    Pending,
    Cancelled,
    Other(String),
}

impl PurchaseStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
            Self::Other(status) => status,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub(crate) fn from_db(status: String) -> Self {
        match status.as_str() {
            "pending" => Self::Pending,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(status),
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PurchaseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Purchase Record
///
/// Immutable after creation apart from `status`; amounts, item prices and the
/// shipping address are snapshots taken at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseRecord {
    pub uuid: PurchaseUuid,
    pub user_uuid: UserUuid,
    pub status: PurchaseStatus,
    /// Sum of item subtotals in cents, before discount.
    pub subtotal: u64,
    pub discount_amount: u64,
    pub delivery_fee: u64,
    /// Subtotal less discount plus delivery fee, in cents.
    pub total: u64,
    pub tracking_number: String,
    pub shipping_method_name: String,
    pub payment_method: String,
    /// Gateway payment id; unique, the idempotency key for confirmation.
    pub payment_id: String,
    pub created_at: Timestamp,
    pub items: Vec<PurchaseItemRecord>,
}

impl PurchaseRecord {
    /// Sum of item line subtotals in cents.
    #[must_use]
    pub fn items_subtotal(&self) -> u64 {
        self.items.iter().map(|item| item.quantity * item.price).sum()
    }
}

/// Purchase Item Record
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseItemRecord {
    pub uuid: PurchaseItemUuid,
    pub purchase_uuid: PurchaseUuid,
    pub product_uuid: ProductUuid,
    /// Product name at purchase time.
    pub product_name: String,
    pub quantity: u64,
    /// Unit price in cents at purchase time.
    pub price: u64,
}

/// Purchase Address Record
///
/// Snapshot of the shipping address; later edits to the customer's saved
/// address never alter it.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseAddressRecord {
    pub uuid: PurchaseAddressUuid,
    pub purchase_uuid: PurchaseUuid,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}
