//! Stripe implementation of the payment gateway.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{
    CustomerProfile, GatewaySession, PaymentError, PaymentGateway, PaymentStatus, SessionMetadata,
    SessionRequest,
};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const CURRENCY: &str = "usd";

/// Configuration for connecting to Stripe.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_…`).
    pub secret_key: String,

    /// API base URL, overridable for tests.
    pub api_base: String,
}

impl StripeConfig {
    #[must_use]
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// HTTP client for the Stripe API (form-encoded v1 endpoints).
#[derive(Debug, Clone)]
pub struct StripeGateway {
    config: StripeConfig,
    http: Client,
}

impl StripeGateway {
    #[must_use]
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    async fn post_form<T>(&self, url: &str, params: &[(String, String)]) -> Result<T, PaymentError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.secret_key)
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(PaymentError::UnexpectedResponse(format!(
                "request to {url} failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
    payment_status: PaymentStatus,
    payment_intent: Option<String>,
    #[serde(default)]
    metadata: Option<BTreeMap<String, String>>,
}

impl From<SessionResponse> for GatewaySession {
    fn from(response: SessionResponse) -> Self {
        let metadata = response
            .metadata
            .as_ref()
            .and_then(SessionMetadata::from_map);

        Self {
            id: response.id,
            url: response.url,
            payment_status: response.payment_status,
            payment_intent: response.payment_intent,
            metadata,
        }
    }
}

fn customer_params(profile: &CustomerProfile) -> Vec<(String, String)> {
    vec![
        ("email".to_string(), profile.email.clone()),
        ("name".to_string(), profile.name.clone()),
        (
            "metadata[user_uuid]".to_string(),
            profile.user_uuid.to_string(),
        ),
    ]
}

fn session_params(request: &SessionRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("customer".to_string(), request.customer_id.clone()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (
            "metadata[user_uuid]".to_string(),
            request.metadata.user_uuid.to_string(),
        ),
        (
            "metadata[shipping_address]".to_string(),
            request.metadata.shipping_address.to_string(),
        ),
        (
            "metadata[shipping_method]".to_string(),
            request.metadata.shipping_method.to_string(),
        ),
    ];

    for (index, item) in request.line_items.iter().enumerate() {
        params.push((
            format!("line_items[{index}][price_data][currency]"),
            CURRENCY.to_string(),
        ));
        params.push((
            format!("line_items[{index}][price_data][product_data][name]"),
            item.name.clone(),
        ));
        params.push((
            format!("line_items[{index}][price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        params.push((
            format!("line_items[{index}][quantity]"),
            item.quantity.to_string(),
        ));
    }

    params
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn ensure_customer(&self, profile: &CustomerProfile) -> Result<String, PaymentError> {
        let url = match &profile.customer_id {
            // Updating a customer refreshes the email/name Stripe shows on
            // the hosted page.
            Some(id) => format!("{}/v1/customers/{id}", self.config.api_base),
            None => format!("{}/v1/customers", self.config.api_base),
        };

        let customer: CustomerResponse = self.post_form(&url, &customer_params(profile)).await?;

        Ok(customer.id)
    }

    async fn create_checkout_session(
        &self,
        request: &SessionRequest,
    ) -> Result<GatewaySession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base);

        let session: SessionResponse = self.post_form(&url, &session_params(request)).await?;

        Ok(session.into())
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<GatewaySession, PaymentError> {
        let url = format!(
            "{}/v1/checkout/sessions/{session_id}",
            self.config.api_base
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(PaymentError::UnexpectedResponse(format!(
                "session lookup failed with status {status}: {text}"
            )));
        }

        let session: SessionResponse = response.json().await?;

        Ok(session.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{
        shipping::records::{AddressUuid, ShippingMethodUuid},
        users::records::UserUuid,
    };

    use super::{super::SessionLineItem, *};

    fn request() -> SessionRequest {
        SessionRequest {
            customer_id: "cus_123".to_string(),
            line_items: vec![
                SessionLineItem {
                    name: "Desk Lamp".to_string(),
                    unit_amount: 1999,
                    quantity: 2,
                },
                SessionLineItem {
                    name: "Shipping: Standard".to_string(),
                    unit_amount: 500,
                    quantity: 1,
                },
            ],
            success_url: "https://shop.test/payment_success".to_string(),
            cancel_url: "https://shop.test/payment_cancel".to_string(),
            metadata: SessionMetadata {
                user_uuid: UserUuid::new(),
                shipping_address: AddressUuid::new(),
                shipping_method: ShippingMethodUuid::new(),
            },
        }
    }

    #[test]
    fn session_params_encode_every_line_item() {
        let request = request();
        let params = session_params(&request);

        let find = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(find("mode"), Some("payment"));
        assert_eq!(find("customer"), Some("cus_123"));
        assert_eq!(
            find("line_items[0][price_data][product_data][name]"),
            Some("Desk Lamp")
        );
        assert_eq!(find("line_items[0][price_data][unit_amount]"), Some("1999"));
        assert_eq!(find("line_items[0][quantity]"), Some("2"));
        assert_eq!(
            find("line_items[1][price_data][product_data][name]"),
            Some("Shipping: Standard")
        );
        assert_eq!(find("line_items[1][quantity]"), Some("1"));
    }

    #[test]
    fn metadata_round_trips_through_string_map() {
        let request = request();
        let params = session_params(&request);

        let map: BTreeMap<String, String> = params
            .into_iter()
            .filter_map(|(k, v)| {
                k.strip_prefix("metadata[")
                    .and_then(|k| k.strip_suffix(']'))
                    .map(|k| (k.to_string(), v))
            })
            .collect();

        assert_eq!(SessionMetadata::from_map(&map), Some(request.metadata));
    }

    #[test]
    fn metadata_with_missing_keys_is_rejected() {
        let mut map = BTreeMap::new();
        map.insert("user_uuid".to_string(), UserUuid::new().to_string());

        assert_eq!(SessionMetadata::from_map(&map), None);
    }
}
