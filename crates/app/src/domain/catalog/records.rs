//! Catalog Records

use jiff::Timestamp;
use serde::Serialize;

use crate::uuids::typed_uuid;

typed_uuid!(
    /// Product UUID
    ProductUuid
);

typed_uuid!(
    /// Category UUID
    CategoryUuid
);

typed_uuid!(
    /// Tag UUID
    TagUuid
);

/// Product Record
#[derive(Debug, Clone, Serialize)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub name: String,
    pub description: Option<String>,
    /// List price in cents.
    pub price: u64,
    pub on_sale: bool,
    /// Sale price in cents; only meaningful while `on_sale` is set.
    pub sale_price: Option<u64>,
    pub stock: u64,
    pub category_uuid: Option<CategoryUuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl ProductRecord {
    /// Sale price while the product is on sale, list price otherwise.
    #[must_use]
    pub fn current_price(&self) -> u64 {
        match (self.on_sale, self.sale_price) {
            (true, Some(sale_price)) => sale_price,
            _ => self.price,
        }
    }
}

/// Category Record
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRecord {
    pub uuid: CategoryUuid,
    pub name: String,
    pub parent_uuid: Option<CategoryUuid>,
}

/// Tag Record
#[derive(Debug, Clone, Serialize)]
pub struct TagRecord {
    pub uuid: TagUuid,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;

    fn product(price: u64, on_sale: bool, sale_price: Option<u64>) -> ProductRecord {
        ProductRecord {
            uuid: ProductUuid::new(),
            name: "Desk Lamp".to_string(),
            description: None,
            price,
            on_sale,
            sale_price,
            stock: 5,
            category_uuid: None,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            deleted_at: None,
        }
    }

    #[test]
    fn current_price_prefers_sale_price_while_on_sale() {
        assert_eq!(product(1000, true, Some(750)).current_price(), 750);
    }

    #[test]
    fn current_price_falls_back_to_list_price() {
        assert_eq!(product(1000, false, Some(750)).current_price(), 1000);
        assert_eq!(product(1000, true, None).current_price(), 1000);
    }
}
