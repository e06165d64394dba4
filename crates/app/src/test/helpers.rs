//! Test Helpers

use jiff::{Span, Timestamp};

use crate::domain::{
    catalog::{
        CatalogService, CatalogServiceError,
        data::{NewProduct, ProductUpdate},
        records::{ProductRecord, ProductUuid},
    },
    checkout::{CheckoutConfig, CheckoutService, data::Started},
    discounts::{
        DiscountsService, DiscountsServiceError,
        data::NewDiscount,
        records::{DiscountRecord, DiscountUuid},
    },
    purchases::records::PurchaseRecord,
    shipping::{
        ShippingService, ShippingServiceError,
        data::{NewAddress, NewShippingMethod},
        records::{AddressUuid, ShippingMethodRecord, ShippingMethodUuid},
    },
    users::records::UserUuid,
};

use super::TestContext;

pub(crate) fn checkout_config() -> CheckoutConfig {
    CheckoutConfig {
        success_url: "https://shop.test/payment_success".to_string(),
        cancel_url: "https://shop.test/payment_cancel".to_string(),
    }
}

pub(crate) fn new_product(uuid: ProductUuid, name: &str, price: u64, stock: u64) -> NewProduct {
    NewProduct {
        uuid,
        name: name.to_string(),
        description: None,
        price,
        on_sale: false,
        sale_price: None,
        stock,
        category_uuid: None,
    }
}

pub(crate) fn new_address() -> NewAddress {
    NewAddress {
        uuid: AddressUuid::new(),
        line1: "123 Test St".to_string(),
        line2: None,
        city: "Test City".to_string(),
        state: "Test State".to_string(),
        postal_code: "12345".to_string(),
        country: "Test Country".to_string(),
    }
}

/// Flag a product as on sale at the given price.
pub(crate) async fn put_on_sale(
    ctx: &TestContext,
    product: &ProductRecord,
    sale_price: u64,
) -> Result<ProductRecord, CatalogServiceError> {
    ctx.catalog
        .update_product(
            product.uuid,
            ProductUpdate {
                name: product.name.clone(),
                description: product.description.clone(),
                price: product.price,
                on_sale: true,
                sale_price: Some(sale_price),
                stock: product.stock,
                category_uuid: product.category_uuid,
            },
        )
        .await
}

/// A discount valid from yesterday for thirty days.
pub(crate) async fn create_discount(
    ctx: &TestContext,
    code: &str,
    percentage: u8,
) -> Result<DiscountRecord, DiscountsServiceError> {
    let now = Timestamp::now();

    ctx.discounts
        .create_discount(NewDiscount {
            uuid: DiscountUuid::new(),
            code: code.to_string(),
            percentage,
            starts_at: now - Span::new().hours(24),
            ends_at: now + Span::new().hours(30 * 24),
        })
        .await
}

pub(crate) async fn create_shipping_method(
    ctx: &TestContext,
    name: &str,
    price: u64,
) -> Result<ShippingMethodRecord, ShippingServiceError> {
    ctx.shipping
        .create_method(NewShippingMethod {
            uuid: ShippingMethodUuid::new(),
            name: name.to_string(),
            price,
        })
        .await
}

/// A saved address and a 500¢ "Standard" shipping method for the user.
pub(crate) async fn shipping_fixtures(
    ctx: &TestContext,
    user: UserUuid,
) -> (AddressUuid, ShippingMethodUuid) {
    let address = ctx
        .shipping
        .create_address(user, new_address())
        .await
        .expect("Failed to create test address");

    let method = create_shipping_method(ctx, "Standard", 500)
        .await
        .expect("Failed to create test shipping method");

    (address.uuid, method.uuid)
}

/// Run the bypass checkout for whatever is in the user's cart.
pub(crate) async fn begin_bypass_checkout(ctx: &TestContext, user: UserUuid) -> PurchaseRecord {
    let (address, method) = shipping_fixtures(ctx, user).await;

    let started = ctx
        .checkout
        .begin(user, address, method)
        .await
        .expect("bypass checkout should complete");

    match started {
        Started::Completed { purchase } => purchase,
        Started::Redirect { .. } => panic!("bypass path should not redirect"),
    }
}
