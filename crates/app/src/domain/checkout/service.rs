//! Checkout service.
//!
//! Drives the cart through payment into a purchase:
//! cart → shipping chosen → session opened → payment confirmed → order
//! placed → cart cleared → confirmation email.
//!
//! Order placement is one transaction: purchase row, address snapshot,
//! items, and cart clearing commit together or not at all. Confirmation is
//! idempotent — the purchase row is keyed by the gateway payment id, so a
//! success URL hit twice processes the order once.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        carts::{PgCartItemsRepository, records::CartItemRecord},
        checkout::{
            data::{Confirmed, Started},
            errors::CheckoutServiceError,
        },
        discounts::PgDiscountsRepository,
        purchases::{
            PgPurchaseAddressesRepository, PgPurchaseItemsRepository, PgPurchasesRepository,
            data::{NewPurchase, NewPurchaseItem},
            records::{PurchaseItemUuid, PurchaseRecord, PurchaseUuid},
        },
        shipping::{
            PgShippingRepository,
            records::{AddressRecord, AddressUuid, ShippingMethodRecord, ShippingMethodUuid},
        },
        users::{PgUsersRepository, records::UserUuid},
    },
    email::Mailer,
    payments::{
        CustomerProfile, PaymentGateway, PaymentStatus, SessionLineItem, SessionMetadata,
        SessionRequest,
    },
};

/// URLs the gateway sends the customer back to.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Clone)]
pub struct PgCheckoutService {
    db: Db,
    carts: PgCartItemsRepository,
    discounts: PgDiscountsRepository,
    shipping: PgShippingRepository,
    purchases: PgPurchasesRepository,
    purchase_items: PgPurchaseItemsRepository,
    purchase_addresses: PgPurchaseAddressesRepository,
    users: PgUsersRepository,
    gateway: Option<Arc<dyn PaymentGateway>>,
    mailer: Arc<dyn Mailer>,
    config: CheckoutConfig,
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(
        db: Db,
        gateway: Option<Arc<dyn PaymentGateway>>,
        mailer: Arc<dyn Mailer>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            db,
            carts: PgCartItemsRepository::new(),
            discounts: PgDiscountsRepository::new(),
            shipping: PgShippingRepository::new(),
            purchases: PgPurchasesRepository::new(),
            purchase_items: PgPurchaseItemsRepository::new(),
            purchase_addresses: PgPurchaseAddressesRepository::new(),
            users: PgUsersRepository::new(),
            gateway,
            mailer,
            config,
        }
    }

    /// Convert the cart into a purchase. Caller owns the transaction; every
    /// write here commits or rolls back with it.
    ///
    /// Stock is not adjusted: the cart already holds it.
    async fn place_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        items: &[CartItemRecord],
        address: &AddressRecord,
        method: &ShippingMethodRecord,
        payment_method: &str,
        payment_id: &str,
    ) -> Result<PurchaseRecord, CheckoutServiceError> {
        let subtotal: u64 = items.iter().map(CartItemRecord::subtotal).sum();

        let discount_percent = self
            .discounts
            .max_active_percentage(tx, user, Timestamp::now())
            .await?;
        let discount_amount = subtotal * u64::from(discount_percent) / 100;
        let delivery_fee = method.price;
        let total = subtotal - discount_amount + delivery_fee;

        let purchase = self
            .purchases
            .create_purchase(
                tx,
                &NewPurchase {
                    uuid: PurchaseUuid::new(),
                    user_uuid: user,
                    subtotal,
                    discount_amount,
                    delivery_fee,
                    total,
                    tracking_number: tracking_number(Timestamp::now()),
                    shipping_method_name: method.name.clone(),
                    payment_method: payment_method.to_string(),
                    payment_id: payment_id.to_string(),
                },
            )
            .await?;

        self.purchase_addresses
            .snapshot_address(tx, purchase.uuid, address)
            .await?;

        let new_items: Vec<NewPurchaseItem> = items
            .iter()
            .map(|item| NewPurchaseItem {
                uuid: PurchaseItemUuid::new(),
                product_uuid: item.product_uuid,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                price: item.price,
            })
            .collect();

        let created_items = self
            .purchase_items
            .create_items(tx, purchase.uuid, &new_items)
            .await?;

        self.carts.clear(tx, user).await?;

        Ok(PurchaseRecord {
            items: created_items,
            ..purchase
        })
    }

    async fn send_confirmation(&self, email: &str) {
        if let Err(error) = self
            .mailer
            .send(
                email,
                "Order Confirmation",
                "Thank you for your order! Your order is being processed.",
            )
            .await
        {
            warn!(%error, "failed to send order confirmation email");
        }
    }

    async fn already_processed(
        &self,
        payment_id: &str,
    ) -> Result<Option<Confirmed>, CheckoutServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(existing) = self.purchases.find_by_payment_id(&mut tx, payment_id).await? else {
            return Ok(None);
        };

        let items = self
            .purchase_items
            .list_for_purchases(&mut tx, &[existing.uuid])
            .await?;

        tx.commit().await?;

        Ok(Some(Confirmed::AlreadyProcessed {
            purchase: PurchaseRecord { items, ..existing },
        }))
    }
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    #[tracing::instrument(
        name = "checkout.service.begin",
        skip(self),
        fields(user_uuid = %user, bypass = self.gateway.is_none()),
        err
    )]
    async fn begin(
        &self,
        user: UserUuid,
        shipping_address: AddressUuid,
        shipping_method: ShippingMethodUuid,
    ) -> Result<Started, CheckoutServiceError> {
        let mut tx = self.db.begin().await?;

        let user_record = self.users.get_user(&mut tx, user).await?;

        let items = self.carts.list_items(&mut tx, user).await?;
        if items.is_empty() {
            return Err(CheckoutServiceError::EmptyCart);
        }

        let address = self
            .shipping
            .get_address(&mut tx, user, shipping_address)
            .await?
            .ok_or(CheckoutServiceError::AddressNotFound)?;

        let method = self
            .shipping
            .get_method(&mut tx, shipping_method)
            .await?
            .ok_or(CheckoutServiceError::ShippingMethodNotFound)?;

        let Some(gateway) = self.gateway.clone() else {
            // Test/dev bypass: no hosted page, the order is placed right
            // here with a synthesized payment id.
            let payment_id = format!("test_{:016x}", rand::random::<u64>());

            let purchase = self
                .place_order(&mut tx, user, &items, &address, &method, "test", &payment_id)
                .await?;

            tx.commit().await?;

            info!(purchase_uuid = %purchase.uuid, "placed order via bypass path");

            self.send_confirmation(&user_record.email).await;

            return Ok(Started::Completed { purchase });
        };

        // Gateway path: only reads so far, release the transaction before
        // going over the network.
        tx.commit().await?;

        let customer_id = gateway
            .ensure_customer(&CustomerProfile {
                customer_id: user_record.gateway_customer_id.clone(),
                email: user_record.email.clone(),
                name: user_record.username.clone(),
                user_uuid: user,
            })
            .await?;

        if user_record.gateway_customer_id.as_deref() != Some(&customer_id) {
            let mut tx = self.db.begin().await?;
            self.users
                .set_gateway_customer(&mut tx, user, &customer_id)
                .await?;
            tx.commit().await?;
        }

        let mut line_items: Vec<SessionLineItem> = items
            .iter()
            .map(|item| SessionLineItem {
                name: item.product_name.clone(),
                unit_amount: item.price,
                quantity: item.quantity,
            })
            .collect();

        line_items.push(SessionLineItem {
            name: format!("Shipping: {}", method.name),
            unit_amount: method.price,
            quantity: 1,
        });

        let session = gateway
            .create_checkout_session(&SessionRequest {
                customer_id,
                line_items,
                success_url: self.config.success_url.clone(),
                cancel_url: self.config.cancel_url.clone(),
                metadata: SessionMetadata {
                    user_uuid: user,
                    shipping_address: address.uuid,
                    shipping_method: method.uuid,
                },
            })
            .await?;

        let url = session.url.ok_or_else(|| {
            CheckoutServiceError::Payment(crate::payments::PaymentError::UnexpectedResponse(
                "session carries no redirect url".to_string(),
            ))
        })?;

        info!(session_id = %session.id, "opened checkout session");

        Ok(Started::Redirect { url })
    }

    #[tracing::instrument(
        name = "checkout.service.confirm",
        skip(self, session_id),
        fields(user_uuid = %user),
        err
    )]
    async fn confirm(
        &self,
        user: UserUuid,
        session_id: &str,
    ) -> Result<Confirmed, CheckoutServiceError> {
        let Some(gateway) = self.gateway.clone() else {
            return Err(CheckoutServiceError::GatewayNotConfigured);
        };

        // Trust boundary: the session is re-fetched from the gateway; the
        // caller only supplies its id.
        let session = gateway.retrieve_checkout_session(session_id).await?;

        if session.payment_status != PaymentStatus::Paid {
            return Err(CheckoutServiceError::NotPaid);
        }

        let metadata = session
            .metadata
            .ok_or(CheckoutServiceError::MissingSessionMetadata)?;

        if metadata.user_uuid != user {
            return Err(CheckoutServiceError::SessionMismatch);
        }

        let payment_id = session.payment_intent.unwrap_or(session.id);

        if let Some(confirmed) = self.already_processed(&payment_id).await? {
            return Ok(confirmed);
        }

        let mut tx = self.db.begin().await?;

        let user_record = self.users.get_user(&mut tx, user).await?;

        let items = self.carts.list_items(&mut tx, user).await?;
        if items.is_empty() {
            return Err(CheckoutServiceError::EmptyCart);
        }

        let address = self
            .shipping
            .get_address(&mut tx, user, metadata.shipping_address)
            .await?
            .ok_or(CheckoutServiceError::AddressNotFound)?;

        let method = self
            .shipping
            .get_method(&mut tx, metadata.shipping_method)
            .await?
            .ok_or(CheckoutServiceError::ShippingMethodNotFound)?;

        let purchase = match self
            .place_order(&mut tx, user, &items, &address, &method, "card", &payment_id)
            .await
        {
            Ok(purchase) => purchase,
            // A concurrent confirmation of the same session won the unique
            // payment-id race; hand back its purchase.
            Err(CheckoutServiceError::AlreadyExists) => {
                drop(tx);

                return self
                    .already_processed(&payment_id)
                    .await?
                    .ok_or(CheckoutServiceError::NotFound);
            }
            Err(error) => return Err(error),
        };

        tx.commit().await?;

        info!(purchase_uuid = %purchase.uuid, "confirmed payment and placed order");

        self.send_confirmation(&user_record.email).await;

        Ok(Confirmed::Completed { purchase })
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Start a checkout for the user's cart with the chosen shipping address
    /// and method. Empty carts and unknown addresses are recoverable errors
    /// and never reach the gateway.
    async fn begin(
        &self,
        user: UserUuid,
        shipping_address: AddressUuid,
        shipping_method: ShippingMethodUuid,
    ) -> Result<Started, CheckoutServiceError>;

    /// Handle the return from the hosted payment page. Requires the session
    /// to be paid; processing the same session twice is a no-op.
    async fn confirm(
        &self,
        user: UserUuid,
        session_id: &str,
    ) -> Result<Confirmed, CheckoutServiceError>;
}

/// Tracking numbers carry the epoch second of placement, as the storefront
/// has always formatted them.
fn tracking_number(now: Timestamp) -> String {
    format!("TRACK{:010}", now.as_second())
}
