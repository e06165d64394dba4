//! Stock Repository
//!
//! Inventory moves through conditional updates so two carts can never both
//! take the last unit: `take_stock` decrements only when enough stock
//! remains, and reports failure through its row count.

use sqlx::{Postgres, Transaction, query, query_scalar};

use crate::{
    database::{encode_amount, try_get_amount},
    domain::catalog::records::ProductUuid,
};

const TAKE_STOCK_SQL: &str = include_str!("../sql/take_stock.sql");
const RETURN_STOCK_SQL: &str = include_str!("../sql/return_stock.sql");
const PRODUCT_EXISTS_SQL: &str = include_str!("../sql/product_exists.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgStockRepository;

impl PgStockRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Atomically take `quantity` units of stock.
    ///
    /// On success returns the product's price at this instant (sale price
    /// while on sale), for snapshotting onto the cart line. Returns `None`
    /// when the product is missing or has less stock than requested; use
    /// [`Self::product_exists`] to tell the two apart.
    pub(crate) async fn take_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<Option<u64>, sqlx::Error> {
        let quantity = encode_amount(quantity, "quantity")?;

        let row = query(TAKE_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(quantity)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(|row| try_get_amount(&row, "current_price")).transpose()
    }

    /// Put `quantity` units back.
    pub(crate) async fn return_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<(), sqlx::Error> {
        let quantity = encode_amount(quantity, "quantity")?;

        query(RETURN_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(quantity)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn product_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar(PRODUCT_EXISTS_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}
