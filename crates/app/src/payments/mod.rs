//! Payment gateway collaborator.
//!
//! The gateway owns hosted checkout sessions; the application never sees card
//! data and never trusts client-supplied amounts. When no gateway is
//! configured the checkout service takes its bypass path instead.

mod stripe;

use std::collections::BTreeMap;

use async_trait::async_trait;
use mockall::automock;
use serde::Deserialize;
use thiserror::Error;

pub use stripe::{StripeConfig, StripeGateway};

use crate::domain::{
    shipping::records::{AddressUuid, ShippingMethodUuid},
    users::records::UserUuid,
};

/// Customer details pushed to the gateway before opening a session.
#[derive(Debug, Clone)]
pub struct CustomerProfile {
    /// Gateway customer id from a previous checkout, when one exists.
    pub customer_id: Option<String>,
    pub email: String,
    pub name: String,
    pub user_uuid: UserUuid,
}

/// One hosted-checkout line: a cart line or the shipping fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    /// Unit amount in cents.
    pub unit_amount: u64,
    pub quantity: u64,
}

/// Everything needed to open a hosted checkout session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub customer_id: String,
    pub line_items: Vec<SessionLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: SessionMetadata,
}

/// Checkout context carried through the gateway and read back on return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMetadata {
    pub user_uuid: UserUuid,
    pub shipping_address: AddressUuid,
    pub shipping_method: ShippingMethodUuid,
}

impl SessionMetadata {
    fn from_map(map: &BTreeMap<String, String>) -> Option<Self> {
        Some(Self {
            user_uuid: map.get("user_uuid")?.parse().ok()?,
            shipping_address: map.get("shipping_address")?.parse().ok()?,
            shipping_method: map.get("shipping_method")?.parse().ok()?,
        })
    }
}

/// Payment state of a session as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

/// A hosted checkout session, fresh or re-fetched.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub id: String,
    /// Hosted page URL; present on newly created sessions.
    pub url: Option<String>,
    pub payment_status: PaymentStatus,
    /// Gateway payment id once payment is underway.
    pub payment_intent: Option<String>,
    pub metadata: Option<SessionMetadata>,
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a gateway customer for the profile, or refresh the existing one.
    ///
    /// Returns the gateway customer id.
    async fn ensure_customer(&self, profile: &CustomerProfile) -> Result<String, PaymentError>;

    /// Open a hosted checkout session and return it (with its redirect URL).
    async fn create_checkout_session(
        &self,
        request: &SessionRequest,
    ) -> Result<GatewaySession, PaymentError>;

    /// Re-fetch a session by id to learn its payment state.
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<GatewaySession, PaymentError>;
}

/// Errors that can occur when communicating with the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned a non-2xx response or unexpected body.
    #[error("unexpected response from payment gateway: {0}")]
    UnexpectedResponse(String),
}
