//! Principal domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated actor making a request.
///
/// Established by the authentication layer before the authorization gate
/// runs; the RBAC core only consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub corporation_id: Uuid,
    pub role_id: Uuid,
}
