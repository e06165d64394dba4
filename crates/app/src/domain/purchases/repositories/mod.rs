//! Purchase Repositories

mod addresses;
mod items;
mod purchases;

pub(crate) use addresses::PgPurchaseAddressesRepository;
pub(crate) use items::PgPurchaseItemsRepository;
pub(crate) use purchases::PgPurchasesRepository;
