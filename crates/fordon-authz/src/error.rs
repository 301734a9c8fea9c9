//! Authorization error types.

use fordon_core::error::FordonError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("System roles cannot be modified")]
    SystemRoleImmutable,

    #[error("System roles cannot be deleted")]
    SystemRoleUndeletable,

    #[error("corporation {corporation_id} is not entitled to resources {resource_ids:?}")]
    NotEntitled {
        corporation_id: Uuid,
        resource_ids: Vec<Uuid>,
    },

    #[error("unknown resource ids {resource_ids:?}")]
    UnknownResources { resource_ids: Vec<Uuid> },

    #[error("resource '{title}' cannot be granted to a corporation")]
    NotGrantable { title: String },
}

impl From<AuthzError> for FordonError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::SystemRoleImmutable
            | AuthzError::SystemRoleUndeletable
            | AuthzError::NotEntitled { .. } => FordonError::Forbidden {
                reason: err.to_string(),
            },
            AuthzError::UnknownResources { .. } | AuthzError::NotGrantable { .. } => {
                FordonError::Validation {
                    message: err.to_string(),
                }
            }
        }
    }
}
