//! Purchases service.
//!
//! Read side of completed orders, plus cancellation. Order creation itself
//! belongs to the checkout service, which commits it in one transaction.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        purchases::{
            data::PurchaseDetails,
            errors::PurchasesServiceError,
            records::{PurchaseRecord, PurchaseStatus, PurchaseUuid},
            repositories::{
                PgPurchaseAddressesRepository, PgPurchaseItemsRepository, PgPurchasesRepository,
            },
        },
        users::PgUsersRepository,
        users::records::UserUuid,
    },
    email::Mailer,
};

#[derive(Clone)]
pub struct PgPurchasesService {
    db: Db,
    purchases: PgPurchasesRepository,
    items: PgPurchaseItemsRepository,
    addresses: PgPurchaseAddressesRepository,
    users: PgUsersRepository,
    mailer: Arc<dyn Mailer>,
}

impl PgPurchasesService {
    #[must_use]
    pub fn new(db: Db, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            purchases: PgPurchasesRepository::new(),
            items: PgPurchaseItemsRepository::new(),
            addresses: PgPurchaseAddressesRepository::new(),
            users: PgUsersRepository::new(),
            mailer,
        }
    }

    async fn attach_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        purchases: &mut [PurchaseRecord],
    ) -> Result<(), sqlx::Error> {
        let uuids: Vec<PurchaseUuid> = purchases.iter().map(|p| p.uuid).collect();

        let items = self.items.list_for_purchases(tx, &uuids).await?;

        for item in items {
            if let Some(purchase) = purchases.iter_mut().find(|p| p.uuid == item.purchase_uuid) {
                purchase.items.push(item);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl PurchasesService for PgPurchasesService {
    async fn history(&self, user: UserUuid) -> Result<Vec<PurchaseRecord>, PurchasesServiceError> {
        let mut tx = self.db.begin().await?;

        let mut purchases = self.purchases.list_for_user(&mut tx, user).await?;
        self.attach_items(&mut tx, &mut purchases).await?;

        tx.commit().await?;

        Ok(purchases)
    }

    async fn details(
        &self,
        user: UserUuid,
        purchase: PurchaseUuid,
    ) -> Result<PurchaseDetails, PurchasesServiceError> {
        let mut tx = self.db.begin().await?;

        let mut purchases = vec![self.purchases.get_for_user(&mut tx, user, purchase).await?];
        self.attach_items(&mut tx, &mut purchases).await?;

        let shipping_address = self.addresses.get_for_purchase(&mut tx, purchase).await?;

        tx.commit().await?;

        let Some(purchase) = purchases.pop() else {
            return Err(PurchasesServiceError::NotFound);
        };

        Ok(PurchaseDetails {
            purchase,
            shipping_address,
        })
    }

    #[tracing::instrument(
        name = "purchases.service.cancel",
        skip(self),
        fields(user_uuid = %user, purchase_uuid = %purchase),
        err
    )]
    async fn cancel(
        &self,
        user: UserUuid,
        purchase: PurchaseUuid,
    ) -> Result<PurchaseRecord, PurchasesServiceError> {
        let mut tx = self.db.begin().await?;

        let existing = self
            .purchases
            .get_for_user_for_update(&mut tx, user, purchase)
            .await?;

        if !existing.status.is_pending() {
            return Err(PurchasesServiceError::NotCancellable);
        }

        self.purchases
            .set_status(&mut tx, user, purchase, &PurchaseStatus::Cancelled)
            .await?;

        // Inventory was taken when the items went into the cart, and order
        // placement took none on top of it; cancellation therefore leaves
        // stock at its pre-purchase value.
        let mut cancelled = vec![PurchaseRecord {
            status: PurchaseStatus::Cancelled,
            ..existing
        }];
        self.attach_items(&mut tx, &mut cancelled).await?;

        let email = self.users.get_user(&mut tx, user).await?.email;

        tx.commit().await?;

        info!("cancelled order");

        if let Err(error) = self
            .mailer
            .send(
                &email,
                "Order Cancelled",
                "Your order has been successfully cancelled.",
            )
            .await
        {
            warn!(%error, "failed to send cancellation email");
        }

        cancelled.pop().ok_or(PurchasesServiceError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<PurchaseRecord>, PurchasesServiceError> {
        let mut tx = self.db.begin().await?;

        let mut purchases = self.purchases.list_all(&mut tx).await?;
        self.attach_items(&mut tx, &mut purchases).await?;

        tx.commit().await?;

        Ok(purchases)
    }
}

#[automock]
#[async_trait]
pub trait PurchasesService: Send + Sync {
    /// The user's purchases, newest first, items included.
    async fn history(&self, user: UserUuid) -> Result<Vec<PurchaseRecord>, PurchasesServiceError>;

    /// A single purchase with its shipping-address snapshot.
    /// Scoped to the owning user.
    async fn details(
        &self,
        user: UserUuid,
        purchase: PurchaseUuid,
    ) -> Result<PurchaseDetails, PurchasesServiceError>;

    /// Cancel a pending order and email the user. Orders in any other state
    /// are rejected.
    async fn cancel(
        &self,
        user: UserUuid,
        purchase: PurchaseUuid,
    ) -> Result<PurchaseRecord, PurchasesServiceError>;

    /// Every purchase in the store (back-office reporting).
    async fn list_all(&self) -> Result<Vec<PurchaseRecord>, PurchasesServiceError>;
}
