//! Carts

pub mod data;
pub mod errors;
pub mod records;
mod repositories;
pub mod service;

pub use errors::CartsServiceError;
pub use service::*;

pub(crate) use repositories::{PgCartItemsRepository, PgStockRepository};
