//! Purchases Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::{encode_amount, try_get_amount},
    domain::{
        purchases::{
            data::NewPurchase,
            records::{PurchaseRecord, PurchaseStatus, PurchaseUuid},
        },
        users::records::UserUuid,
    },
};

const CREATE_PURCHASE_SQL: &str = include_str!("../sql/create_purchase.sql");
const GET_PURCHASE_FOR_USER_SQL: &str = include_str!("../sql/get_purchase_for_user.sql");
const GET_PURCHASE_FOR_USER_FOR_UPDATE_SQL: &str =
    include_str!("../sql/get_purchase_for_user_for_update.sql");
const LIST_PURCHASES_FOR_USER_SQL: &str = include_str!("../sql/list_purchases_for_user.sql");
const LIST_PURCHASES_SQL: &str = include_str!("../sql/list_purchases.sql");
const FIND_PURCHASE_BY_PAYMENT_ID_SQL: &str =
    include_str!("../sql/find_purchase_by_payment_id.sql");
const SET_PURCHASE_STATUS_SQL: &str = include_str!("../sql/set_purchase_status.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPurchasesRepository;

impl PgPurchasesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_purchase(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        purchase: &NewPurchase,
    ) -> Result<PurchaseRecord, sqlx::Error> {
        let subtotal = encode_amount(purchase.subtotal, "subtotal")?;
        let discount_amount = encode_amount(purchase.discount_amount, "discount_amount")?;
        let delivery_fee = encode_amount(purchase.delivery_fee, "delivery_fee")?;
        let total = encode_amount(purchase.total, "total")?;

        query_as::<Postgres, PurchaseRecord>(CREATE_PURCHASE_SQL)
            .bind(purchase.uuid.into_uuid())
            .bind(purchase.user_uuid.into_uuid())
            .bind(subtotal)
            .bind(discount_amount)
            .bind(delivery_fee)
            .bind(total)
            .bind(&purchase.tracking_number)
            .bind(&purchase.shipping_method_name)
            .bind(&purchase.payment_method)
            .bind(&purchase.payment_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_for_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        purchase: PurchaseUuid,
    ) -> Result<PurchaseRecord, sqlx::Error> {
        query_as::<Postgres, PurchaseRecord>(GET_PURCHASE_FOR_USER_SQL)
            .bind(purchase.into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Like [`Self::get_for_user`], but locks the row so a status transition
    /// cannot race another.
    pub(crate) async fn get_for_user_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        purchase: PurchaseUuid,
    ) -> Result<PurchaseRecord, sqlx::Error> {
        query_as::<Postgres, PurchaseRecord>(GET_PURCHASE_FOR_USER_FOR_UPDATE_SQL)
            .bind(purchase.into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_for_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<PurchaseRecord>, sqlx::Error> {
        query_as::<Postgres, PurchaseRecord>(LIST_PURCHASES_FOR_USER_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_all(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<PurchaseRecord>, sqlx::Error> {
        query_as::<Postgres, PurchaseRecord>(LIST_PURCHASES_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_payment_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment_id: &str,
    ) -> Result<Option<PurchaseRecord>, sqlx::Error> {
        query_as::<Postgres, PurchaseRecord>(FIND_PURCHASE_BY_PAYMENT_ID_SQL)
            .bind(payment_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        purchase: PurchaseUuid,
        status: &PurchaseStatus,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_PURCHASE_STATUS_SQL)
            .bind(purchase.into_uuid())
            .bind(user.into_uuid())
            .bind(status.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for PurchaseRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PurchaseUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            status: PurchaseStatus::from_db(row.try_get("status")?),
            subtotal: try_get_amount(row, "subtotal")?,
            discount_amount: try_get_amount(row, "discount_amount")?,
            delivery_fee: try_get_amount(row, "delivery_fee")?,
            total: try_get_amount(row, "total")?,
            tracking_number: row.try_get("tracking_number")?,
            shipping_method_name: row.try_get("shipping_method_name")?,
            payment_method: row.try_get("payment_method")?,
            payment_id: row.try_get("payment_id")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            items: Vec::new(),
        })
    }
}
