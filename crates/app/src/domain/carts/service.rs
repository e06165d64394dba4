//! Carts service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        carts::{
            data::{CartSummary, NewCartItem, UpdateOutcome},
            errors::CartsServiceError,
            records::{CartItemRecord, CartItemUuid},
            repositories::{PgCartItemsRepository, PgStockRepository},
        },
        discounts::PgDiscountsRepository,
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    items: PgCartItemsRepository,
    stock: PgStockRepository,
    discounts: PgDiscountsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            items: PgCartItemsRepository::new(),
            stock: PgStockRepository::new(),
            discounts: PgDiscountsRepository::new(),
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, item),
        fields(
            user_uuid = %user,
            product_uuid = %item.product_uuid,
            quantity = item.quantity,
        ),
        err
    )]
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
    ) -> Result<CartItemRecord, CartsServiceError> {
        if item.quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.db.begin().await?;

        // Stock is taken at add time, conditionally, so concurrent adds for
        // the same product cannot both pass the check.
        let Some(current_price) = self
            .stock
            .take_stock(&mut tx, item.product_uuid, item.quantity)
            .await?
        else {
            return if self.stock.product_exists(&mut tx, item.product_uuid).await? {
                Err(CartsServiceError::InsufficientStock)
            } else {
                Err(CartsServiceError::NotFound)
            };
        };

        let record = self
            .items
            .upsert_item(&mut tx, user, &item, current_price)
            .await?;

        tx.commit().await?;

        info!(cart_item_uuid = %record.uuid, "added to cart");

        Ok(record)
    }

    #[tracing::instrument(
        name = "carts.service.update_item",
        skip(self),
        fields(user_uuid = %user, cart_item_uuid = %item),
        err
    )]
    async fn update_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u64,
    ) -> Result<UpdateOutcome, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let existing = self.items.get_item_for_update(&mut tx, user, item).await?;

        // Quantity zero is a removal, stock restore included.
        if quantity == 0 {
            self.items.delete_item(&mut tx, user, item).await?;
            self.stock
                .return_stock(&mut tx, existing.product_uuid, existing.quantity)
                .await?;

            tx.commit().await?;

            return Ok(UpdateOutcome::Removed);
        }

        if quantity > existing.quantity {
            let needed = quantity - existing.quantity;

            if self
                .stock
                .take_stock(&mut tx, existing.product_uuid, needed)
                .await?
                .is_none()
            {
                return Err(CartsServiceError::InsufficientStock);
            }
        } else if quantity < existing.quantity {
            self.stock
                .return_stock(&mut tx, existing.product_uuid, existing.quantity - quantity)
                .await?;
        }

        let updated = self.items.set_quantity(&mut tx, user, item, quantity).await?;

        tx.commit().await?;

        Ok(UpdateOutcome::Updated(updated))
    }

    async fn remove_item(&self, user: UserUuid, item: CartItemUuid) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let Some((product, quantity)) = self.items.delete_item(&mut tx, user, item).await? else {
            return Err(CartsServiceError::NotFound);
        };

        self.stock.return_stock(&mut tx, product, quantity).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn clear(&self, user: UserUuid) -> Result<u64, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let removed = self.items.clear(&mut tx, user).await?;

        tx.commit().await?;

        Ok(removed)
    }

    async fn list_items(&self, user: UserUuid) -> Result<Vec<CartItemRecord>, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let items = self.items.list_items(&mut tx, user).await?;

        tx.commit().await?;

        Ok(items)
    }

    async fn summary(&self, user: Option<UserUuid>) -> Result<CartSummary, CartsServiceError> {
        let Some(user) = user else {
            return Ok(CartSummary::empty());
        };

        let mut tx = self.db.begin().await?;

        let (total_items, subtotal) = self.items.totals(&mut tx, user).await?;
        let discount_percent = self
            .discounts
            .max_active_percentage(&mut tx, user, Timestamp::now())
            .await?;

        tx.commit().await?;

        Ok(CartSummary::from_totals(total_items, subtotal, discount_percent))
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Add a product to the user's cart, merging with an existing line for
    /// the same product and variants. Takes stock immediately.
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
    ) -> Result<CartItemRecord, CartsServiceError>;

    /// Change a line's quantity, moving stock by the difference. A quantity
    /// of zero removes the line.
    async fn update_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u64,
    ) -> Result<UpdateOutcome, CartsServiceError>;

    /// Remove a line and return its quantity to stock.
    async fn remove_item(&self, user: UserUuid, item: CartItemUuid)
    -> Result<(), CartsServiceError>;

    /// Delete all of the user's lines without touching stock (checkout has
    /// already converted them, or an admin is resetting the cart).
    async fn clear(&self, user: UserUuid) -> Result<u64, CartsServiceError>;

    /// The user's cart lines, oldest first.
    async fn list_items(&self, user: UserUuid) -> Result<Vec<CartItemRecord>, CartsServiceError>;

    /// Cart aggregate with the user's best active discount folded in.
    /// Anonymous callers get zeros.
    async fn summary(&self, user: Option<UserUuid>) -> Result<CartSummary, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use testresult::TestResult;

    use crate::test::{TestContext, helpers};

    use super::*;

    #[tokio::test]
    async fn add_item_snapshots_price_and_takes_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 10).await;

        let item = ctx
            .carts
            .add_item(user, NewCartItem::of(product.uuid, 3))
            .await?;

        assert_eq!(item.product_uuid, product.uuid);
        assert_eq!(item.quantity, 3);
        assert_eq!(item.price, 1999);
        assert_eq!(item.product_name, "Desk Lamp");

        assert_eq!(ctx.product_stock(product.uuid).await, 7);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_zero_quantity_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 10).await;

        let result = ctx
            .carts
            .add_item(user, NewCartItem::of(product.uuid, 0))
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_beyond_stock_is_rejected_and_stock_unchanged() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 2).await;

        let result = ctx
            .carts
            .add_item(user, NewCartItem::of(product.uuid, 3))
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::InsufficientStock)),
            "expected InsufficientStock, got {result:?}"
        );
        assert_eq!(ctx.product_stock(product.uuid).await, 2);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_unknown_product_returns_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;

        let result = ctx
            .carts
            .add_item(
                user,
                NewCartItem::of(crate::domain::catalog::records::ProductUuid::new(), 1),
            )
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn adding_same_product_twice_merges_and_refreshes_price() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1000, 10).await;

        let first = ctx
            .carts
            .add_item(user, NewCartItem::of(product.uuid, 2))
            .await?;

        assert_eq!(first.price, 1000);

        // The product goes on sale between the two adds.
        helpers::put_on_sale(&ctx, &product, 800).await?;

        let merged = ctx
            .carts
            .add_item(user, NewCartItem::of(product.uuid, 3))
            .await?;

        assert_eq!(merged.uuid, first.uuid, "expected one merged line");
        assert_eq!(merged.quantity, 5);
        assert_eq!(merged.price, 800, "merge refreshes to the current price");

        let items = ctx.carts.list_items(user).await?;
        assert_eq!(items.len(), 1);

        assert_eq!(
            ctx.product_stock(product.uuid).await,
            5,
            "stock drops by the total quantity added"
        );

        Ok(())
    }

    #[tokio::test]
    async fn different_variant_options_get_their_own_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("T-Shirt", 1500, 10).await;

        let small = NewCartItem {
            variant_options: BTreeMap::from([("size".to_string(), "S".to_string())]),
            ..NewCartItem::of(product.uuid, 1)
        };
        let large = NewCartItem {
            variant_options: BTreeMap::from([("size".to_string(), "L".to_string())]),
            ..NewCartItem::of(product.uuid, 1)
        };

        let item_s = ctx.carts.add_item(user, small).await?;
        let item_l = ctx.carts.add_item(user, large).await?;

        assert_ne!(item_s.uuid, item_l.uuid);
        assert_eq!(ctx.carts.list_items(user).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn update_to_zero_is_equivalent_to_remove_for_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 10).await;

        let item = ctx
            .carts
            .add_item(user, NewCartItem::of(product.uuid, 2))
            .await?;

        assert_eq!(ctx.product_stock(product.uuid).await, 8);

        let outcome = ctx.carts.update_item(user, item.uuid, 0).await?;

        assert!(matches!(outcome, UpdateOutcome::Removed));
        assert!(ctx.carts.list_items(user).await?.is_empty());
        assert_eq!(ctx.product_stock(product.uuid).await, 10);

        Ok(())
    }

    #[tokio::test]
    async fn update_moves_stock_by_the_difference() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 10).await;

        let item = ctx
            .carts
            .add_item(user, NewCartItem::of(product.uuid, 2))
            .await?;

        // 2 -> 5 takes three more units.
        let outcome = ctx.carts.update_item(user, item.uuid, 5).await?;
        assert!(matches!(&outcome, UpdateOutcome::Updated(i) if i.quantity == 5));
        assert_eq!(ctx.product_stock(product.uuid).await, 5);

        // 5 -> 1 puts four back.
        ctx.carts.update_item(user, item.uuid, 1).await?;
        assert_eq!(ctx.product_stock(product.uuid).await, 9);

        Ok(())
    }

    #[tokio::test]
    async fn update_beyond_stock_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 3).await;

        let item = ctx
            .carts
            .add_item(user, NewCartItem::of(product.uuid, 2))
            .await?;

        let result = ctx.carts.update_item(user, item.uuid, 4).await;

        assert!(
            matches!(result, Err(CartsServiceError::InsufficientStock)),
            "expected InsufficientStock, got {result:?}"
        );
        assert_eq!(ctx.product_stock(product.uuid).await, 1);

        Ok(())
    }

    #[tokio::test]
    async fn update_other_users_line_returns_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let ada = ctx.create_user("ada").await;
        let eve = ctx.create_user("eve").await;
        let product = ctx.create_product("Desk Lamp", 1999, 10).await;

        let item = ctx
            .carts
            .add_item(ada, NewCartItem::of(product.uuid, 1))
            .await?;

        let result = ctx.carts.update_item(eve, item.uuid, 2).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_restores_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 10).await;

        let item = ctx
            .carts
            .add_item(user, NewCartItem::of(product.uuid, 4))
            .await?;

        assert_eq!(ctx.product_stock(product.uuid).await, 6);

        ctx.carts.remove_item(user, item.uuid).await?;

        assert_eq!(ctx.product_stock(product.uuid).await, 10);
        assert!(ctx.carts.list_items(user).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn clear_deletes_lines_without_touching_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 10).await;

        ctx.carts
            .add_item(user, NewCartItem::of(product.uuid, 4))
            .await?;

        let removed = ctx.carts.clear(user).await?;

        assert_eq!(removed, 1);
        assert_eq!(ctx.product_stock(product.uuid).await, 6);

        Ok(())
    }

    #[tokio::test]
    async fn summary_for_anonymous_caller_is_all_zeros() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1999, 10).await;

        ctx.carts
            .add_item(user, NewCartItem::of(product.uuid, 4))
            .await?;

        let summary = ctx.carts.summary(None).await?;

        assert_eq!(summary, CartSummary::empty());

        Ok(())
    }

    #[tokio::test]
    async fn summary_totals_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let lamp = ctx.create_product("Desk Lamp", 1000, 10).await;
        let chair = ctx.create_product("Office Chair", 5000, 10).await;

        ctx.carts
            .add_item(user, NewCartItem::of(lamp.uuid, 2))
            .await?;
        ctx.carts
            .add_item(user, NewCartItem::of(chair.uuid, 1))
            .await?;

        let summary = ctx.carts.summary(Some(user)).await?;

        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.subtotal, 7000);
        assert_eq!(summary.discount_percent, 0);
        assert_eq!(summary.total, 7000);

        Ok(())
    }
}
