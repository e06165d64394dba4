//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        catalog::{CatalogService, PgCatalogService},
        checkout::{CheckoutConfig, CheckoutService, PgCheckoutService},
        discounts::{DiscountsService, PgDiscountsService},
        purchases::{PgPurchasesService, PurchasesService},
        shipping::{PgShippingService, ShippingService},
        users::{PgUsersService, UsersService},
        wishlists::{PgWishlistsService, WishlistsService},
    },
    email::{HttpMailer, Mailer, MailerConfig, NoopMailer},
    payments::{PaymentGateway, StripeConfig, StripeGateway},
};

/// Everything the application needs from its environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,

    /// Stripe secret key; when absent, checkout takes its test/dev bypass
    /// path instead of opening gateway sessions.
    pub stripe_secret_key: Option<String>,

    /// Transactional mail endpoint; when absent, messages are dropped.
    pub mailer: Option<MailerConfig>,

    pub checkout: CheckoutConfig,
}

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub users: Arc<dyn UsersService>,
    pub catalog: Arc<dyn CatalogService>,
    pub carts: Arc<dyn CartsService>,
    pub discounts: Arc<dyn DiscountsService>,
    pub shipping: Arc<dyn ShippingService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub purchases: Arc<dyn PurchasesService>,
    pub wishlists: Arc<dyn WishlistsService>,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_config(config: AppConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database_url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        let gateway: Option<Arc<dyn PaymentGateway>> = config
            .stripe_secret_key
            .map(|key| Arc::new(StripeGateway::new(StripeConfig::new(key))) as _);

        let mailer: Arc<dyn Mailer> = match config.mailer {
            Some(mailer_config) => Arc::new(HttpMailer::new(mailer_config)),
            None => Arc::new(NoopMailer),
        };

        Ok(Self {
            users: Arc::new(PgUsersService::new(db.clone())),
            catalog: Arc::new(PgCatalogService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            discounts: Arc::new(PgDiscountsService::new(db.clone())),
            shipping: Arc::new(PgShippingService::new(db.clone())),
            checkout: Arc::new(PgCheckoutService::new(
                db.clone(),
                gateway,
                mailer.clone(),
                config.checkout,
            )),
            purchases: Arc::new(PgPurchasesService::new(db.clone(), mailer.clone())),
            wishlists: Arc::new(PgWishlistsService::new(db, mailer)),
        })
    }
}
