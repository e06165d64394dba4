//! Discount Records

use jiff::Timestamp;
use serde::Serialize;

use crate::uuids::typed_uuid;

typed_uuid!(
    /// Discount UUID
    DiscountUuid
);

typed_uuid!(
    /// Discount Redemption UUID
    RedemptionUuid
);

/// Discount Record
///
/// A code-gated percentage reduction with a validity window, redeemable once
/// per user.
#[derive(Debug, Clone, Serialize)]
pub struct DiscountRecord {
    pub uuid: DiscountUuid,
    pub code: String,
    pub percentage: u8,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}
