//! Purchase Items Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::{encode_amount, try_get_amount},
    domain::{
        catalog::records::ProductUuid,
        purchases::{
            data::NewPurchaseItem,
            records::{PurchaseItemRecord, PurchaseItemUuid, PurchaseUuid},
        },
    },
};

const CREATE_PURCHASE_ITEM_SQL: &str = include_str!("../sql/create_purchase_item.sql");
const LIST_ITEMS_FOR_PURCHASES_SQL: &str = include_str!("../sql/list_items_for_purchases.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPurchaseItemsRepository;

impl PgPurchaseItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        purchase: PurchaseUuid,
        items: &[NewPurchaseItem],
    ) -> Result<Vec<PurchaseItemRecord>, sqlx::Error> {
        let mut created = Vec::with_capacity(items.len());

        for item in items {
            let quantity = encode_amount(item.quantity, "quantity")?;
            let price = encode_amount(item.price, "price")?;

            let record = query_as::<Postgres, PurchaseItemRecord>(CREATE_PURCHASE_ITEM_SQL)
                .bind(item.uuid.into_uuid())
                .bind(purchase.into_uuid())
                .bind(item.product_uuid.into_uuid())
                .bind(&item.product_name)
                .bind(quantity)
                .bind(price)
                .fetch_one(&mut **tx)
                .await?;

            created.push(record);
        }

        Ok(created)
    }

    /// Items for a batch of purchases, so history pages need one query, not
    /// one per order.
    pub(crate) async fn list_for_purchases(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        purchases: &[PurchaseUuid],
    ) -> Result<Vec<PurchaseItemRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = purchases
            .iter()
            .copied()
            .map(PurchaseUuid::into_uuid)
            .collect();

        query_as::<Postgres, PurchaseItemRecord>(LIST_ITEMS_FOR_PURCHASES_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for PurchaseItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PurchaseItemUuid::from_uuid(row.try_get("uuid")?),
            purchase_uuid: PurchaseUuid::from_uuid(row.try_get("purchase_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            product_name: row.try_get("product_name")?,
            quantity: try_get_amount(row, "quantity")?,
            price: try_get_amount(row, "price")?,
        })
    }
}
