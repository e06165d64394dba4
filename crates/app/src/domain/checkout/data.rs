//! Checkout Data

use crate::domain::purchases::records::PurchaseRecord;

/// Result of starting a checkout.
#[derive(Debug, Clone)]
pub enum Started {
    /// The gateway path: send the customer to the hosted payment page.
    Redirect { url: String },

    /// The bypass path (no gateway configured): the order is already placed.
    Completed { purchase: PurchaseRecord },
}

/// Result of confirming a returned payment session.
#[derive(Debug, Clone)]
pub enum Confirmed {
    Completed { purchase: PurchaseRecord },

    /// This session was confirmed before; nothing was processed again.
    AlreadyProcessed { purchase: PurchaseRecord },
}

impl Confirmed {
    #[must_use]
    pub fn purchase(&self) -> &PurchaseRecord {
        match self {
            Self::Completed { purchase } | Self::AlreadyProcessed { purchase } => purchase,
        }
    }
}
