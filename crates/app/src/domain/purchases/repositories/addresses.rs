//! Purchase Addresses Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    purchases::records::{PurchaseAddressRecord, PurchaseAddressUuid, PurchaseUuid},
    shipping::records::AddressRecord,
};

const CREATE_PURCHASE_ADDRESS_SQL: &str = include_str!("../sql/create_purchase_address.sql");
const GET_PURCHASE_ADDRESS_SQL: &str = include_str!("../sql/get_purchase_address.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPurchaseAddressesRepository;

impl PgPurchaseAddressesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Copy a customer's address into the purchase.
    pub(crate) async fn snapshot_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        purchase: PurchaseUuid,
        address: &AddressRecord,
    ) -> Result<PurchaseAddressRecord, sqlx::Error> {
        query_as::<Postgres, PurchaseAddressRecord>(CREATE_PURCHASE_ADDRESS_SQL)
            .bind(PurchaseAddressUuid::new().into_uuid())
            .bind(purchase.into_uuid())
            .bind(&address.line1)
            .bind(address.line2.as_deref())
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.postal_code)
            .bind(&address.country)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_for_purchase(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        purchase: PurchaseUuid,
    ) -> Result<Option<PurchaseAddressRecord>, sqlx::Error> {
        query_as::<Postgres, PurchaseAddressRecord>(GET_PURCHASE_ADDRESS_SQL)
            .bind(purchase.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for PurchaseAddressRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PurchaseAddressUuid::from_uuid(row.try_get("uuid")?),
            purchase_uuid: PurchaseUuid::from_uuid(row.try_get("purchase_uuid")?),
            line1: row.try_get("line1")?,
            line2: row.try_get("line2")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            postal_code: row.try_get("postal_code")?,
            country: row.try_get("country")?,
        })
    }
}
