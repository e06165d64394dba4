//! Purchases

pub mod data;
pub mod errors;
pub mod records;
mod repositories;
pub mod service;

pub use errors::PurchasesServiceError;
pub use service::*;

pub(crate) use repositories::{
    PgPurchaseAddressesRepository, PgPurchaseItemsRepository, PgPurchasesRepository,
};
