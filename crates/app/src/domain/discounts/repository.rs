//! Discounts Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::try_get_percentage,
    domain::{
        discounts::{
            data::NewDiscount,
            records::{DiscountRecord, DiscountUuid, RedemptionUuid},
        },
        users::records::UserUuid,
    },
};

const FIND_ACTIVE_DISCOUNT_SQL: &str = include_str!("sql/find_active_discount.sql");
const CREATE_DISCOUNT_SQL: &str = include_str!("sql/create_discount.sql");
const LIST_DISCOUNTS_SQL: &str = include_str!("sql/list_discounts.sql");
const RECORD_REDEMPTION_SQL: &str = include_str!("sql/record_redemption.sql");
const DISCOUNT_CART_PRICES_SQL: &str = include_str!("sql/discount_cart_prices.sql");
const MAX_ACTIVE_PERCENTAGE_SQL: &str = include_str!("sql/max_active_percentage.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDiscountsRepository;

impl PgDiscountsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Look up a code that is valid at `now`.
    pub(crate) async fn find_active_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
        now: Timestamp,
    ) -> Result<Option<DiscountRecord>, sqlx::Error> {
        query_as::<Postgres, DiscountRecord>(FIND_ACTIVE_DISCOUNT_SQL)
            .bind(code)
            .bind(SqlxTimestamp::from(now))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create_discount(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        discount: NewDiscount,
    ) -> Result<DiscountRecord, sqlx::Error> {
        query_as::<Postgres, DiscountRecord>(CREATE_DISCOUNT_SQL)
            .bind(discount.uuid.into_uuid())
            .bind(&discount.code)
            .bind(i16::from(discount.percentage))
            .bind(SqlxTimestamp::from(discount.starts_at))
            .bind(SqlxTimestamp::from(discount.ends_at))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_discounts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<DiscountRecord>, sqlx::Error> {
        query_as::<Postgres, DiscountRecord>(LIST_DISCOUNTS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    /// Record a redemption; the unique constraint on (user, discount) makes
    /// this the exactly-once gate.
    pub(crate) async fn record_redemption(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        discount: DiscountUuid,
    ) -> Result<(), sqlx::Error> {
        query(RECORD_REDEMPTION_SQL)
            .bind(RedemptionUuid::new().into_uuid())
            .bind(user.into_uuid())
            .bind(discount.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Rewrite every cart line's snapshot price down by `percentage`,
    /// truncating to whole cents.
    pub(crate) async fn discount_cart_prices(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        percentage: u8,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DISCOUNT_CART_PRICES_SQL)
            .bind(user.into_uuid())
            .bind(i16::from(percentage))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Best percentage among the user's redeemed discounts still valid at
    /// `now`; zero when there is none.
    pub(crate) async fn max_active_percentage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        now: Timestamp,
    ) -> Result<u8, sqlx::Error> {
        let percentage: i16 = query_scalar(MAX_ACTIVE_PERCENTAGE_SQL)
            .bind(user.into_uuid())
            .bind(SqlxTimestamp::from(now))
            .fetch_one(&mut **tx)
            .await?;

        u8::try_from(percentage).map_err(|e| sqlx::Error::ColumnDecode {
            index: "percentage".to_string(),
            source: Box::new(e),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for DiscountRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: DiscountUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            percentage: try_get_percentage(row, "percentage")?,
            starts_at: row.try_get::<SqlxTimestamp, _>("starts_at")?.to_jiff(),
            ends_at: row.try_get::<SqlxTimestamp, _>("ends_at")?.to_jiff(),
        })
    }
}
