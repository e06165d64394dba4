//! User Records

use jiff::Timestamp;
use serde::Serialize;

use crate::uuids::typed_uuid;

typed_uuid!(
    /// User UUID
    UserUuid
);

/// User Record
///
/// A minimal identity row. Authentication itself (sessions, OAuth, password
/// reset) lives with the web layer, not here.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub uuid: UserUuid,
    pub username: String,
    pub email: String,
    /// Payment-gateway customer id, filled in on first gateway checkout.
    pub gateway_customer_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
