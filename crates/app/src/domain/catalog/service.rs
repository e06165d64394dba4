//! Catalog service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::catalog::{
        data::{NewCategory, NewProduct, NewTag, Page, ProductFilter, ProductPage, ProductUpdate},
        errors::CatalogServiceError,
        records::{CategoryRecord, ProductRecord, ProductUuid, TagRecord, TagUuid},
        repository::PgCatalogRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgCatalogService {
    db: Db,
    repository: PgCatalogRepository,
}

impl PgCatalogService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCatalogRepository::new(),
        }
    }
}

#[async_trait]
impl CatalogService for PgCatalogService {
    async fn list_products(
        &self,
        filter: ProductFilter,
        page: Page,
    ) -> Result<ProductPage, CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        let items = self.repository.list_products(&mut tx, &filter, page).await?;
        let total = self.repository.count_products(&mut tx, &filter).await?;

        tx.commit().await?;

        Ok(ProductPage::new(items, total, page))
    }

    async fn get_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        let product = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(product)
    }

    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        let updated = self
            .repository
            .update_product(&mut tx, product, update)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<(), CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.delete_product(&mut tx, product).await?;

        if rows_affected == 0 {
            return Err(CatalogServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        let categories = self.repository.list_categories(&mut tx).await?;

        tx.commit().await?;

        Ok(categories)
    }

    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<CategoryRecord, CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_category(&mut tx, category).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn list_tags(&self) -> Result<Vec<TagRecord>, CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        let tags = self.repository.list_tags(&mut tx).await?;

        tx.commit().await?;

        Ok(tags)
    }

    async fn create_tag(&self, tag: NewTag) -> Result<TagRecord, CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_tag(&mut tx, tag).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn tag_product(
        &self,
        product: ProductUuid,
        tag: TagUuid,
    ) -> Result<(), CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        self.repository.tag_product(&mut tx, product, tag).await?;

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Filtered, sorted, paginated listing of in-stock products.
    async fn list_products(
        &self,
        filter: ProductFilter,
        page: Page,
    ) -> Result<ProductPage, CatalogServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid)
    -> Result<ProductRecord, CatalogServiceError>;

    /// Creates a new product.
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, CatalogServiceError>;

    /// Replaces a product's details.
    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, CatalogServiceError>;

    /// Soft-deletes a product.
    async fn delete_product(&self, product: ProductUuid) -> Result<(), CatalogServiceError>;

    /// Retrieves all categories (filter options).
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, CatalogServiceError>;

    /// Creates a new category.
    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<CategoryRecord, CatalogServiceError>;

    /// Retrieves all tags (filter options).
    async fn list_tags(&self) -> Result<Vec<TagRecord>, CatalogServiceError>;

    /// Creates a new tag.
    async fn create_tag(&self, tag: NewTag) -> Result<TagRecord, CatalogServiceError>;

    /// Attaches a tag to a product.
    async fn tag_product(
        &self,
        product: ProductUuid,
        tag: TagUuid,
    ) -> Result<(), CatalogServiceError>;
}
