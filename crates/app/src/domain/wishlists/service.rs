//! Wishlists service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::warn;

use crate::{
    database::Db,
    domain::{
        users::PgUsersRepository,
        users::records::UserUuid,
        wishlists::{
            data::{NewWishlistItem, WishlistNotifications},
            errors::WishlistsServiceError,
            records::{WishlistItemRecord, WishlistItemUuid},
            repository::PgWishlistsRepository,
        },
    },
    email::Mailer,
};

#[derive(Clone)]
pub struct PgWishlistsService {
    db: Db,
    repository: PgWishlistsRepository,
    users: PgUsersRepository,
    mailer: Arc<dyn Mailer>,
}

impl PgWishlistsService {
    #[must_use]
    pub fn new(db: Db, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            repository: PgWishlistsRepository::new(),
            users: PgUsersRepository::new(),
            mailer,
        }
    }

    async fn collect_notifications(
        &self,
        user: UserUuid,
    ) -> Result<WishlistNotifications, WishlistsServiceError> {
        let mut tx = self.db.begin().await?;

        let products = self.repository.list_products(&mut tx, user).await?;

        tx.commit().await?;

        let mut notifications = WishlistNotifications::default();

        for product in products {
            if product.on_sale {
                notifications.on_sale.push(product);
            } else if product.stock > 0 {
                notifications.back_in_stock.push(product);
            }
        }

        Ok(notifications)
    }
}

#[async_trait]
impl WishlistsService for PgWishlistsService {
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewWishlistItem,
    ) -> Result<WishlistItemRecord, WishlistsServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.add_item(&mut tx, user, &item).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn remove_item(
        &self,
        user: UserUuid,
        item: WishlistItemUuid,
    ) -> Result<(), WishlistsServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.remove_item(&mut tx, user, item).await?;

        if rows_affected == 0 {
            return Err(WishlistsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_items(
        &self,
        user: UserUuid,
    ) -> Result<Vec<WishlistItemRecord>, WishlistsServiceError> {
        let mut tx = self.db.begin().await?;

        let items = self.repository.list_items(&mut tx, user).await?;

        tx.commit().await?;

        Ok(items)
    }

    async fn notifications(
        &self,
        user: UserUuid,
    ) -> Result<WishlistNotifications, WishlistsServiceError> {
        self.collect_notifications(user).await
    }

    async fn send_update_email(&self, user: UserUuid) -> Result<bool, WishlistsServiceError> {
        let notifications = self.collect_notifications(user).await?;

        if notifications.is_empty() {
            return Ok(false);
        }

        let mut tx = self.db.begin().await?;
        let email = self.users.get_user(&mut tx, user).await?.email;
        tx.commit().await?;

        let mut lines = Vec::new();

        if !notifications.on_sale.is_empty() {
            lines.push("Now on sale:".to_string());
            lines.extend(
                notifications
                    .on_sale
                    .iter()
                    .map(|product| format!("  - {}", product.name)),
            );
        }

        if !notifications.back_in_stock.is_empty() {
            lines.push("Back in stock:".to_string());
            lines.extend(
                notifications
                    .back_in_stock
                    .iter()
                    .map(|product| format!("  - {}", product.name)),
            );
        }

        if let Err(error) = self
            .mailer
            .send(&email, "Your wishlist has updates", &lines.join("\n"))
            .await
        {
            warn!(%error, "failed to send wishlist update email");
        }

        Ok(true)
    }
}

#[automock]
#[async_trait]
pub trait WishlistsService: Send + Sync {
    /// Wish for a product (optionally a specific variant). Wishing twice for
    /// the same thing is rejected.
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewWishlistItem,
    ) -> Result<WishlistItemRecord, WishlistsServiceError>;

    /// Remove one of the user's wishes.
    async fn remove_item(
        &self,
        user: UserUuid,
        item: WishlistItemUuid,
    ) -> Result<(), WishlistsServiceError>;

    /// The user's wishlist, oldest first.
    async fn list_items(
        &self,
        user: UserUuid,
    ) -> Result<Vec<WishlistItemRecord>, WishlistsServiceError>;

    /// Wished-for products that went on sale or came back in stock.
    async fn notifications(
        &self,
        user: UserUuid,
    ) -> Result<WishlistNotifications, WishlistsServiceError>;

    /// Fire-and-forget wishlist-update message. Returns whether there was
    /// anything to announce.
    async fn send_update_email(&self, user: UserUuid) -> Result<bool, WishlistsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::{TestContext, helpers};

    use super::*;

    #[tokio::test]
    async fn add_and_list_wishlist_items() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 5).await;

        let item = ctx
            .wishlists
            .add_item(user, NewWishlistItem::of(product.uuid))
            .await?;

        assert_eq!(item.product_uuid, product.uuid);
        assert_eq!(item.product_name, "Desk Lamp");

        let items = ctx.wishlists.list_items(user).await?;
        assert_eq!(items.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn wishing_twice_for_the_same_product_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 5).await;

        ctx.wishlists
            .add_item(user, NewWishlistItem::of(product.uuid))
            .await?;

        let result = ctx
            .wishlists
            .add_item(user, NewWishlistItem::of(product.uuid))
            .await;

        assert!(
            matches!(result, Err(WishlistsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_foreign_item_returns_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let ada = ctx.create_user("ada").await;
        let eve = ctx.create_user("eve").await;
        let product = ctx.create_product("Desk Lamp", 1999, 5).await;

        let item = ctx
            .wishlists
            .add_item(ada, NewWishlistItem::of(product.uuid))
            .await?;

        let result = ctx.wishlists.remove_item(eve, item.uuid).await;

        assert!(
            matches!(result, Err(WishlistsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn notifications_partition_sale_and_restock() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;

        let on_sale = ctx.create_product("Discounted Lamp", 2000, 5).await;
        helpers::put_on_sale(&ctx, &on_sale, 1500).await?;

        let in_stock = ctx.create_product("Plain Lamp", 2000, 5).await;
        let sold_out = ctx.create_product("Gone Lamp", 2000, 0).await;

        for product in [&on_sale, &in_stock, &sold_out] {
            ctx.wishlists
                .add_item(user, NewWishlistItem::of(product.uuid))
                .await?;
        }

        let notifications = ctx.wishlists.notifications(user).await?;

        let sale_names: Vec<&str> = notifications
            .on_sale
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        let stock_names: Vec<&str> = notifications
            .back_in_stock
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        assert_eq!(sale_names, vec!["Discounted Lamp"]);
        assert_eq!(stock_names, vec!["Plain Lamp"]);

        Ok(())
    }

    #[tokio::test]
    async fn update_email_reports_whether_anything_changed() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;

        // Nothing wished for: nothing to send.
        assert!(!ctx.wishlists.send_update_email(user).await?);

        let product = ctx.create_product("Desk Lamp", 1999, 5).await;
        ctx.wishlists
            .add_item(user, NewWishlistItem::of(product.uuid))
            .await?;

        assert!(ctx.wishlists.send_update_email(user).await?);

        Ok(())
    }
}
