//! Discounts Data

use jiff::Timestamp;

use crate::domain::discounts::records::DiscountUuid;

/// New Discount Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiscount {
    pub uuid: DiscountUuid,
    pub code: String,
    pub percentage: u8,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

/// Outcome of applying a discount code to a cart.
///
/// Unknown and out-of-window codes both fail closed to `Invalid`; a code the
/// user already redeemed is `AlreadyUsed` and leaves prices untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { percentage: u8 },
    Invalid,
    AlreadyUsed,
}
