//! Shipping service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        shipping::{
            data::{NewAddress, NewShippingMethod},
            errors::ShippingServiceError,
            records::{AddressRecord, AddressUuid, ShippingMethodRecord},
            repository::PgShippingRepository,
        },
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgShippingService {
    db: Db,
    repository: PgShippingRepository,
}

impl PgShippingService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgShippingRepository::new(),
        }
    }
}

#[async_trait]
impl ShippingService for PgShippingService {
    async fn list_methods(&self) -> Result<Vec<ShippingMethodRecord>, ShippingServiceError> {
        let mut tx = self.db.begin().await?;

        let methods = self.repository.list_methods(&mut tx).await?;

        tx.commit().await?;

        Ok(methods)
    }

    async fn create_method(
        &self,
        method: NewShippingMethod,
    ) -> Result<ShippingMethodRecord, ShippingServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_method(&mut tx, method).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn list_addresses(
        &self,
        user: UserUuid,
    ) -> Result<Vec<AddressRecord>, ShippingServiceError> {
        let mut tx = self.db.begin().await?;

        let addresses = self.repository.list_addresses(&mut tx, user).await?;

        tx.commit().await?;

        Ok(addresses)
    }

    async fn create_address(
        &self,
        user: UserUuid,
        address: NewAddress,
    ) -> Result<AddressRecord, ShippingServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_address(&mut tx, user, address).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn delete_address(
        &self,
        user: UserUuid,
        address: AddressUuid,
    ) -> Result<(), ShippingServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.delete_address(&mut tx, user, address).await?;

        if rows_affected == 0 {
            return Err(ShippingServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait ShippingService: Send + Sync {
    /// Retrieves all shipping methods, cheapest first.
    async fn list_methods(&self) -> Result<Vec<ShippingMethodRecord>, ShippingServiceError>;

    /// Creates a new shipping method.
    async fn create_method(
        &self,
        method: NewShippingMethod,
    ) -> Result<ShippingMethodRecord, ShippingServiceError>;

    /// The user's saved addresses.
    async fn list_addresses(
        &self,
        user: UserUuid,
    ) -> Result<Vec<AddressRecord>, ShippingServiceError>;

    /// Saves an address for the user.
    async fn create_address(
        &self,
        user: UserUuid,
        address: NewAddress,
    ) -> Result<AddressRecord, ShippingServiceError>;

    /// Deletes one of the user's addresses.
    async fn delete_address(
        &self,
        user: UserUuid,
        address: AddressUuid,
    ) -> Result<(), ShippingServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::{TestContext, helpers};

    use super::*;

    #[tokio::test]
    async fn create_method_returns_correct_details() -> TestResult {
        let ctx = TestContext::new().await;

        let method = helpers::create_shipping_method(&ctx, "Standard", 500).await?;

        assert_eq!(method.name, "Standard");
        assert_eq!(method.price, 500);

        Ok(())
    }

    #[tokio::test]
    async fn list_methods_orders_by_price() -> TestResult {
        let ctx = TestContext::new().await;

        helpers::create_shipping_method(&ctx, "Express", 1500).await?;
        helpers::create_shipping_method(&ctx, "Standard", 500).await?;

        let methods = ctx.shipping.list_methods().await?;

        let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();

        assert_eq!(names, vec!["Standard", "Express"]);

        Ok(())
    }

    #[tokio::test]
    async fn addresses_are_scoped_to_their_owner() -> TestResult {
        let ctx = TestContext::new().await;
        let ada = ctx.create_user("ada").await;
        let eve = ctx.create_user("eve").await;

        let address = ctx
            .shipping
            .create_address(ada, helpers::new_address())
            .await?;

        let result = ctx.shipping.delete_address(eve, address.uuid).await;

        assert!(
            matches!(result, Err(ShippingServiceError::NotFound)),
            "expected NotFound for foreign delete, got {result:?}"
        );

        assert_eq!(ctx.shipping.list_addresses(ada).await?.len(), 1);
        assert!(ctx.shipping.list_addresses(eve).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn delete_address_removes_it() -> TestResult {
        let ctx = TestContext::new().await;
        let ada = ctx.create_user("ada").await;

        let address = ctx
            .shipping
            .create_address(ada, helpers::new_address())
            .await?;

        ctx.shipping.delete_address(ada, address.uuid).await?;

        assert!(ctx.shipping.list_addresses(ada).await?.is_empty());

        Ok(())
    }
}
