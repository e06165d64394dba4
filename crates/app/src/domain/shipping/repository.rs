//! Shipping Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::{encode_amount, try_get_amount},
    domain::{
        shipping::{
            data::{NewAddress, NewShippingMethod},
            records::{AddressRecord, AddressUuid, ShippingMethodRecord, ShippingMethodUuid},
        },
        users::records::UserUuid,
    },
};

const LIST_METHODS_SQL: &str = include_str!("sql/list_methods.sql");
const GET_METHOD_SQL: &str = include_str!("sql/get_method.sql");
const CREATE_METHOD_SQL: &str = include_str!("sql/create_method.sql");
const LIST_ADDRESSES_SQL: &str = include_str!("sql/list_addresses.sql");
const GET_ADDRESS_SQL: &str = include_str!("sql/get_address.sql");
const CREATE_ADDRESS_SQL: &str = include_str!("sql/create_address.sql");
const DELETE_ADDRESS_SQL: &str = include_str!("sql/delete_address.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgShippingRepository;

impl PgShippingRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_methods(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<ShippingMethodRecord>, sqlx::Error> {
        query_as::<Postgres, ShippingMethodRecord>(LIST_METHODS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_method(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        method: ShippingMethodUuid,
    ) -> Result<Option<ShippingMethodRecord>, sqlx::Error> {
        query_as::<Postgres, ShippingMethodRecord>(GET_METHOD_SQL)
            .bind(method.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create_method(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        method: NewShippingMethod,
    ) -> Result<ShippingMethodRecord, sqlx::Error> {
        let price = encode_amount(method.price, "price")?;

        query_as::<Postgres, ShippingMethodRecord>(CREATE_METHOD_SQL)
            .bind(method.uuid.into_uuid())
            .bind(&method.name)
            .bind(price)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_addresses(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<AddressRecord>, sqlx::Error> {
        query_as::<Postgres, AddressRecord>(LIST_ADDRESSES_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Fetch an address, scoped to the owning user.
    pub(crate) async fn get_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        address: AddressUuid,
    ) -> Result<Option<AddressRecord>, sqlx::Error> {
        query_as::<Postgres, AddressRecord>(GET_ADDRESS_SQL)
            .bind(address.into_uuid())
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        address: NewAddress,
    ) -> Result<AddressRecord, sqlx::Error> {
        query_as::<Postgres, AddressRecord>(CREATE_ADDRESS_SQL)
            .bind(address.uuid.into_uuid())
            .bind(user.into_uuid())
            .bind(&address.line1)
            .bind(address.line2.as_deref())
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.postal_code)
            .bind(&address.country)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        address: AddressUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_ADDRESS_SQL)
            .bind(address.into_uuid())
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for ShippingMethodRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ShippingMethodUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            price: try_get_amount(row, "price")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for AddressRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: AddressUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            line1: row.try_get("line1")?,
            line2: row.try_get("line2")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            postal_code: row.try_get("postal_code")?,
            country: row.try_get("country")?,
        })
    }
}
