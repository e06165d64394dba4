//! Discounts service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        discounts::{
            data::{ApplyOutcome, NewDiscount},
            errors::DiscountsServiceError,
            records::DiscountRecord,
            repository::PgDiscountsRepository,
        },
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgDiscountsService {
    db: Db,
    repository: PgDiscountsRepository,
}

impl PgDiscountsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgDiscountsRepository::new(),
        }
    }
}

#[async_trait]
impl DiscountsService for PgDiscountsService {
    #[tracing::instrument(
        name = "discounts.service.apply_code",
        skip(self, code),
        fields(user_uuid = %user),
        err
    )]
    async fn apply_code(
        &self,
        user: UserUuid,
        code: &str,
    ) -> Result<ApplyOutcome, DiscountsServiceError> {
        let mut tx = self.db.begin().await?;

        // Unknown and expired codes are indistinguishable to the caller.
        let Some(discount) = self
            .repository
            .find_active_by_code(&mut tx, code, Timestamp::now())
            .await?
        else {
            return Ok(ApplyOutcome::Invalid);
        };

        match self
            .repository
            .record_redemption(&mut tx, user, discount.uuid)
            .await
            .map_err(DiscountsServiceError::from)
        {
            Ok(()) => {}
            Err(DiscountsServiceError::AlreadyExists) => return Ok(ApplyOutcome::AlreadyUsed),
            Err(error) => return Err(error),
        }

        self.repository
            .discount_cart_prices(&mut tx, user, discount.percentage)
            .await?;

        tx.commit().await?;

        info!(discount_uuid = %discount.uuid, percentage = discount.percentage, "applied discount code");

        Ok(ApplyOutcome::Applied {
            percentage: discount.percentage,
        })
    }

    async fn create_discount(
        &self,
        discount: NewDiscount,
    ) -> Result<DiscountRecord, DiscountsServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_discount(&mut tx, discount).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn list_discounts(&self) -> Result<Vec<DiscountRecord>, DiscountsServiceError> {
        let mut tx = self.db.begin().await?;

        let discounts = self.repository.list_discounts(&mut tx).await?;

        tx.commit().await?;

        Ok(discounts)
    }
}

#[automock]
#[async_trait]
pub trait DiscountsService: Send + Sync {
    /// Redeem a code for the user and rewrite their cart line prices down by
    /// its percentage. Exactly-once per (user, discount); not reversible —
    /// a second, different code stacks on the already-discounted prices.
    async fn apply_code(
        &self,
        user: UserUuid,
        code: &str,
    ) -> Result<ApplyOutcome, DiscountsServiceError>;

    /// Creates a new discount code.
    async fn create_discount(
        &self,
        discount: NewDiscount,
    ) -> Result<DiscountRecord, DiscountsServiceError>;

    /// Retrieves all discount codes.
    async fn list_discounts(&self) -> Result<Vec<DiscountRecord>, DiscountsServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::{Span, Timestamp};
    use testresult::TestResult;

    use crate::{
        domain::carts::{CartsService, data::NewCartItem},
        test::{TestContext, helpers},
    };

    use super::*;

    #[tokio::test]
    async fn apply_code_discounts_line_prices_with_truncation() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1000, 10).await;

        ctx.carts
            .add_item(user, NewCartItem::of(product.uuid, 1))
            .await?;

        helpers::create_discount(&ctx, "TEST10", 10).await?;

        let outcome = ctx.discounts.apply_code(user, "TEST10").await?;

        assert_eq!(outcome, ApplyOutcome::Applied { percentage: 10 });

        let items = ctx.carts.list_items(user).await?;
        assert_eq!(items[0].price, 900);

        Ok(())
    }

    #[tokio::test]
    async fn apply_code_truncates_not_rounds() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Oddly Priced", 999, 10).await;

        ctx.carts
            .add_item(user, NewCartItem::of(product.uuid, 1))
            .await?;

        helpers::create_discount(&ctx, "TEST10", 10).await?;
        ctx.discounts.apply_code(user, "TEST10").await?;

        let items = ctx.carts.list_items(user).await?;

        // 999 * 0.9 = 899.1, truncated down.
        assert_eq!(items[0].price, 899);

        Ok(())
    }

    #[tokio::test]
    async fn apply_code_is_exactly_once_per_user() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1000, 10).await;

        ctx.carts
            .add_item(user, NewCartItem::of(product.uuid, 1))
            .await?;

        helpers::create_discount(&ctx, "TEST10", 10).await?;

        ctx.discounts.apply_code(user, "TEST10").await?;
        let second = ctx.discounts.apply_code(user, "TEST10").await?;

        assert_eq!(second, ApplyOutcome::AlreadyUsed);

        let items = ctx.carts.list_items(user).await?;
        assert_eq!(items[0].price, 900, "second application must not restack");

        Ok(())
    }

    #[tokio::test]
    async fn apply_code_unknown_code_is_invalid() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;

        let outcome = ctx.discounts.apply_code(user, "NO-SUCH-CODE").await?;

        assert_eq!(outcome, ApplyOutcome::Invalid);

        Ok(())
    }

    #[tokio::test]
    async fn apply_code_expired_code_is_invalid() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;

        let now = Timestamp::now();

        ctx.discounts
            .create_discount(NewDiscount {
                uuid: crate::domain::discounts::records::DiscountUuid::new(),
                code: "BYGONE".to_string(),
                percentage: 10,
                starts_at: now - Span::new().hours(48),
                ends_at: now - Span::new().hours(24),
            })
            .await?;

        let outcome = ctx.discounts.apply_code(user, "BYGONE").await?;

        assert_eq!(outcome, ApplyOutcome::Invalid);

        Ok(())
    }

    #[tokio::test]
    async fn different_codes_stack_on_discounted_prices() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1000, 10).await;

        ctx.carts
            .add_item(user, NewCartItem::of(product.uuid, 1))
            .await?;

        helpers::create_discount(&ctx, "FIRST10", 10).await?;
        helpers::create_discount(&ctx, "SECOND50", 50).await?;

        ctx.discounts.apply_code(user, "FIRST10").await?;
        ctx.discounts.apply_code(user, "SECOND50").await?;

        let items = ctx.carts.list_items(user).await?;

        // 1000 -> 900 -> 450.
        assert_eq!(items[0].price, 450);

        Ok(())
    }

    #[tokio::test]
    async fn redeemed_discount_shows_up_in_cart_summary() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ada").await;
        let product = ctx.create_product("Desk Lamp", 1000, 10).await;

        helpers::create_discount(&ctx, "TEST10", 10).await?;
        ctx.discounts.apply_code(user, "TEST10").await?;

        ctx.carts
            .add_item(user, NewCartItem::of(product.uuid, 1))
            .await?;

        let summary = ctx.carts.summary(Some(user)).await?;

        assert_eq!(summary.discount_percent, 10);
        assert_eq!(summary.subtotal, 1000);
        assert_eq!(summary.discount_amount, 100);
        assert_eq!(summary.total, 900);

        Ok(())
    }

    #[tokio::test]
    async fn create_discount_duplicate_code_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;

        helpers::create_discount(&ctx, "TEST10", 10).await?;

        let result = helpers::create_discount(&ctx, "TEST10", 20).await;

        assert!(
            matches!(result, Err(DiscountsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }
}
