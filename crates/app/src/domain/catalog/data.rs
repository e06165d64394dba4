//! Catalog Data

use crate::domain::catalog::records::{CategoryUuid, ProductRecord, ProductUuid, TagUuid};

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub description: Option<String>,
    pub price: u64,
    pub on_sale: bool,
    pub sale_price: Option<u64>,
    pub stock: u64,
    pub category_uuid: Option<CategoryUuid>,
}

/// Product Update Data
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub price: u64,
    pub on_sale: bool,
    pub sale_price: Option<u64>,
    pub stock: u64,
    pub category_uuid: Option<CategoryUuid>,
}

/// New Category Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub uuid: CategoryUuid,
    pub name: String,
    pub parent_uuid: Option<CategoryUuid>,
}

/// New Tag Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewTag {
    pub uuid: TagUuid,
    pub name: String,
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Insertion order, newest first.
    #[default]
    Newest,
    PriceAscending,
    PriceDescending,
}

impl SortBy {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAscending => "price_asc",
            Self::PriceDescending => "price_desc",
        }
    }
}

/// Listing filter criteria. Every field is optional; an empty filter lists
/// all in-stock products.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive name substring.
    pub name: Option<String>,
    /// Category, including its direct subcategories.
    pub category: Option<CategoryUuid>,
    /// Case-insensitive tag-name substring.
    pub tag: Option<String>,
    pub sort: SortBy,
}

/// Pagination request, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub per_page: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            per_page: 12,
        }
    }
}

impl Page {
    pub(crate) fn offset(self) -> u64 {
        self.number.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// One page of a filtered product listing.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<ProductRecord>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl ProductPage {
    pub(crate) fn new(items: Vec<ProductRecord>, total: u64, page: Page) -> Self {
        let total_pages = total.div_ceil(page.per_page.max(1));

        Self {
            items,
            total,
            page: page.number,
            per_page: page.per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_is_zero_based() {
        let page = Page {
            number: 3,
            per_page: 12,
        };

        assert_eq!(page.offset(), 24);
    }

    #[test]
    fn page_one_starts_at_zero() {
        assert_eq!(Page::default().offset(), 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page {
            number: 1,
            per_page: 10,
        };

        assert_eq!(ProductPage::new(Vec::new(), 21, page).total_pages, 3);
        assert_eq!(ProductPage::new(Vec::new(), 20, page).total_pages, 2);
        assert_eq!(ProductPage::new(Vec::new(), 0, page).total_pages, 0);
    }
}
