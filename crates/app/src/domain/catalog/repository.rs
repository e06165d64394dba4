//! Catalog Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::{encode_amount, try_get_amount},
    domain::catalog::{
        data::{NewCategory, NewProduct, NewTag, Page, ProductFilter, ProductUpdate},
        records::{CategoryRecord, CategoryUuid, ProductRecord, ProductUuid, TagRecord, TagUuid},
    },
};

const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const COUNT_PRODUCTS_SQL: &str = include_str!("sql/count_products.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");
const LIST_CATEGORIES_SQL: &str = include_str!("sql/list_categories.sql");
const CREATE_CATEGORY_SQL: &str = include_str!("sql/create_category.sql");
const LIST_TAGS_SQL: &str = include_str!("sql/list_tags.sql");
const CREATE_TAG_SQL: &str = include_str!("sql/create_tag.sql");
const TAG_PRODUCT_SQL: &str = include_str!("sql/tag_product.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCatalogRepository;

impl PgCatalogRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        let limit = encode_amount(page.per_page, "limit")?;
        let offset = encode_amount(page.offset(), "offset")?;

        query_as::<Postgres, ProductRecord>(LIST_PRODUCTS_SQL)
            .bind(filter.name.as_deref())
            .bind(filter.category.map(CategoryUuid::into_uuid))
            .bind(filter.tag.as_deref())
            .bind(filter.sort.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn count_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        filter: &ProductFilter,
    ) -> Result<u64, sqlx::Error> {
        let count: i64 = query_scalar(COUNT_PRODUCTS_SQL)
            .bind(filter.name.as_deref())
            .bind(filter.category.map(CategoryUuid::into_uuid))
            .bind(filter.tag.as_deref())
            .fetch_one(&mut **tx)
            .await?;

        u64::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
            index: "count".to_string(),
            source: Box::new(e),
        })
    }

    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: NewProduct,
    ) -> Result<ProductRecord, sqlx::Error> {
        let price = encode_amount(product.price, "price")?;
        let sale_price = product
            .sale_price
            .map(|value| encode_amount(value, "sale_price"))
            .transpose()?;
        let stock = encode_amount(product.stock, "stock")?;

        query_as::<Postgres, ProductRecord>(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(&product.name)
            .bind(product.description.as_deref())
            .bind(price)
            .bind(product.on_sale)
            .bind(sale_price)
            .bind(stock)
            .bind(product.category_uuid.map(CategoryUuid::into_uuid))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, sqlx::Error> {
        let price = encode_amount(update.price, "price")?;
        let sale_price = update
            .sale_price
            .map(|value| encode_amount(value, "sale_price"))
            .transpose()?;
        let stock = encode_amount(update.stock, "stock")?;

        query_as::<Postgres, ProductRecord>(UPDATE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(&update.name)
            .bind(update.description.as_deref())
            .bind(price)
            .bind(update.on_sale)
            .bind(sale_price)
            .bind(stock)
            .bind(update.category_uuid.map(CategoryUuid::into_uuid))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn list_categories(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<CategoryRecord>, sqlx::Error> {
        query_as::<Postgres, CategoryRecord>(LIST_CATEGORIES_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: NewCategory,
    ) -> Result<CategoryRecord, sqlx::Error> {
        query_as::<Postgres, CategoryRecord>(CREATE_CATEGORY_SQL)
            .bind(category.uuid.into_uuid())
            .bind(&category.name)
            .bind(category.parent_uuid.map(CategoryUuid::into_uuid))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_tags(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<TagRecord>, sqlx::Error> {
        query_as::<Postgres, TagRecord>(LIST_TAGS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_tag(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tag: NewTag,
    ) -> Result<TagRecord, sqlx::Error> {
        query_as::<Postgres, TagRecord>(CREATE_TAG_SQL)
            .bind(tag.uuid.into_uuid())
            .bind(&tag.name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn tag_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        tag: TagUuid,
    ) -> Result<(), sqlx::Error> {
        query(TAG_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(tag.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let price = try_get_amount(row, "price")?;
        let stock = try_get_amount(row, "stock")?;

        let sale_price = row
            .try_get::<Option<i64>, _>("sale_price")?
            .map(|value| {
                u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "sale_price".to_string(),
                    source: Box::new(e),
                })
            })
            .transpose()?;

        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price,
            on_sale: row.try_get("on_sale")?,
            sale_price,
            stock,
            category_uuid: row
                .try_get::<Option<uuid::Uuid>, _>("category_uuid")?
                .map(CategoryUuid::from_uuid),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CategoryRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CategoryUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            parent_uuid: row
                .try_get::<Option<uuid::Uuid>, _>("parent_uuid")?
                .map(CategoryUuid::from_uuid),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for TagRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: TagUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
        })
    }
}
