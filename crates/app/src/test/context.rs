//! Test context for service-level integration tests.

use std::sync::Arc;

use sqlx::Row;

use crate::{
    database::Db,
    domain::{
        carts::PgCartsService,
        catalog::{
            CatalogService, PgCatalogService,
            records::{ProductRecord, ProductUuid},
        },
        checkout::PgCheckoutService,
        discounts::PgDiscountsService,
        purchases::PgPurchasesService,
        shipping::PgShippingService,
        users::{PgUsersService, UsersService, data::NewUser, records::UserUuid},
        wishlists::PgWishlistsService,
    },
    email::NoopMailer,
};

use super::{db::TestDb, helpers};

/// All services wired against one isolated database.
///
/// The checkout service is built without a gateway (the bypass path) and
/// with a no-op mailer; tests that need a gateway or a mail assertion build
/// their own service around a mock.
pub(crate) struct TestContext {
    pub db: TestDb,
    pub app_db: Db,
    pub users: PgUsersService,
    pub catalog: PgCatalogService,
    pub carts: PgCartsService,
    pub discounts: PgDiscountsService,
    pub shipping: PgShippingService,
    pub checkout: PgCheckoutService,
    pub purchases: PgPurchasesService,
    pub wishlists: PgWishlistsService,
}

impl TestContext {
    pub(crate) async fn new() -> Self {
        let test_db = TestDb::new().await;
        let db = Db::new(test_db.pool().clone());
        let mailer = Arc::new(NoopMailer);

        Self {
            users: PgUsersService::new(db.clone()),
            catalog: PgCatalogService::new(db.clone()),
            carts: PgCartsService::new(db.clone()),
            discounts: PgDiscountsService::new(db.clone()),
            shipping: PgShippingService::new(db.clone()),
            checkout: PgCheckoutService::new(
                db.clone(),
                None,
                mailer.clone(),
                helpers::checkout_config(),
            ),
            purchases: PgPurchasesService::new(db.clone(), mailer.clone()),
            wishlists: PgWishlistsService::new(db.clone(), mailer),
            app_db: db,
            db: test_db,
        }
    }

    /// Register a user with a derived email address.
    pub(crate) async fn create_user(&self, username: &str) -> UserUuid {
        let uuid = UserUuid::new();

        self.users
            .create_user(NewUser {
                uuid,
                username: username.to_string(),
                email: format!("{username}@example.com"),
            })
            .await
            .expect("Failed to create test user");

        uuid
    }

    /// Create an in-catalog product.
    pub(crate) async fn create_product(&self, name: &str, price: u64, stock: u64) -> ProductRecord {
        self.catalog
            .create_product(helpers::new_product(ProductUuid::new(), name, price, stock))
            .await
            .expect("Failed to create test product")
    }

    /// Read a product's stock straight from the database.
    pub(crate) async fn product_stock(&self, product: ProductUuid) -> u64 {
        let row = sqlx::query("SELECT stock FROM products WHERE uuid = $1")
            .bind(product.into_uuid())
            .fetch_one(self.db.pool())
            .await
            .expect("Failed to read product stock");

        let stock: i64 = row.try_get("stock").expect("stock column should decode");

        u64::try_from(stock).expect("stock should be non-negative")
    }
}
