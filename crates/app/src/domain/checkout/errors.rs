//! Checkout service errors.
//!
//! Everything except `Sql` and `Payment` transport failures is
//! user-recoverable: the web layer turns these into a flash message and a
//! redirect back to the checkout form. Nothing is retried.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::payments::PaymentError;

#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("shipping address not found")]
    AddressNotFound,

    #[error("shipping method not found")]
    ShippingMethodNotFound,

    #[error("no payment gateway configured")]
    GatewayNotConfigured,

    #[error("payment session is not paid")]
    NotPaid,

    #[error("payment session does not carry checkout metadata")]
    MissingSessionMetadata,

    #[error("payment session belongs to a different user")]
    SessionMismatch,

    #[error("record not found")]
    NotFound,

    #[error("purchase already exists")]
    AlreadyExists,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("payment gateway error")]
    Payment(#[from] PaymentError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CheckoutServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::ForeignKeyViolation | ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
