//! Cart Items Repository

use std::collections::BTreeMap;

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{
    FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json,
};

use crate::{
    database::{encode_amount, try_get_amount},
    domain::{
        carts::{
            data::NewCartItem,
            records::{CartItemRecord, CartItemUuid},
        },
        catalog::records::ProductUuid,
        users::records::UserUuid,
    },
};

const UPSERT_CART_ITEM_SQL: &str = include_str!("../sql/upsert_cart_item.sql");
const GET_CART_ITEM_FOR_UPDATE_SQL: &str = include_str!("../sql/get_cart_item_for_update.sql");
const LIST_CART_ITEMS_SQL: &str = include_str!("../sql/list_cart_items.sql");
const SET_CART_ITEM_QUANTITY_SQL: &str = include_str!("../sql/set_cart_item_quantity.sql");
const DELETE_CART_ITEM_SQL: &str = include_str!("../sql/delete_cart_item.sql");
const CLEAR_CART_SQL: &str = include_str!("../sql/clear_cart.sql");
const CART_TOTALS_SQL: &str = include_str!("../sql/cart_totals.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert a line, or merge into the line with the same
    /// (user, product, variants) key: quantities add up, the unit price is
    /// refreshed to `price`.
    pub(crate) async fn upsert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: &NewCartItem,
        price: u64,
    ) -> Result<CartItemRecord, sqlx::Error> {
        let quantity = encode_amount(item.quantity, "quantity")?;
        let price = encode_amount(price, "price")?;

        query_as::<Postgres, CartItemRecord>(UPSERT_CART_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(user.into_uuid())
            .bind(item.product_uuid.into_uuid())
            .bind(Json(&item.variant_options))
            .bind(quantity)
            .bind(price)
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch a line, locked for the rest of the transaction. Scoped to the
    /// owning user.
    pub(crate) async fn get_item_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: CartItemUuid,
    ) -> Result<CartItemRecord, sqlx::Error> {
        query_as::<Postgres, CartItemRecord>(GET_CART_ITEM_FOR_UPDATE_SQL)
            .bind(item.into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<CartItemRecord>, sqlx::Error> {
        query_as::<Postgres, CartItemRecord>(LIST_CART_ITEMS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn set_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u64,
    ) -> Result<CartItemRecord, sqlx::Error> {
        let quantity = encode_amount(quantity, "quantity")?;

        query_as::<Postgres, CartItemRecord>(SET_CART_ITEM_QUANTITY_SQL)
            .bind(item.into_uuid())
            .bind(user.into_uuid())
            .bind(quantity)
            .fetch_one(&mut **tx)
            .await
    }

    /// Delete a line, returning its product and quantity so the caller can
    /// put the stock back.
    pub(crate) async fn delete_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: CartItemUuid,
    ) -> Result<Option<(ProductUuid, u64)>, sqlx::Error> {
        let row = query(DELETE_CART_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        row.map(|row| {
            let product = ProductUuid::from_uuid(row.try_get("product_uuid")?);
            let quantity = try_get_amount(&row, "quantity")?;

            Ok((product, quantity))
        })
        .transpose()
    }

    pub(crate) async fn clear(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_CART_SQL)
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Total item count and subtotal for a user's cart.
    pub(crate) async fn totals(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<(u64, u64), sqlx::Error> {
        let row = query(CART_TOTALS_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok((
            try_get_amount(&row, "total_items")?,
            try_get_amount(&row, "subtotal")?,
        ))
    }
}

impl<'r> FromRow<'r, PgRow> for CartItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let quantity = try_get_amount(row, "quantity")?;
        let price = try_get_amount(row, "price")?;

        let variant_options = row
            .try_get::<Json<BTreeMap<String, String>>, _>("variant_options")?
            .0;

        Ok(Self {
            uuid: CartItemUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            product_name: row.try_get("product_name")?,
            variant_options,
            quantity,
            price,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
