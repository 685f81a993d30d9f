use diesel::result::DatabaseErrorKind;
use thiserror::Error;

use organize_core::category::Category;
use organize_core::error::CoreError;
use organize_core::model::EntityId;
use organize_db::error::{CacheError, DbError, StoreError};

/// Service layer errors
///
/// Everything up to `InvalidQueryParameter` is a deterministic answer to the
/// caller's request. `BackendUnavailable` means the store or cache could not
/// be reached.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unknown category: {0}")]
    CategoryUnknown(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid parent: {0}")]
    InvalidParent(String),

    #[error("Parent {category} {id} not found")]
    ParentNotFound { category: Category, id: EntityId },

    #[error("{category} {id} not found")]
    NotFound { category: Category, id: EntityId },

    #[error("{category} {id} still has {count} children")]
    HasChildren {
        category: Category,
        id: EntityId,
        count: i64,
    },

    #[error("Invalid query parameter '{name}': {reason}")]
    InvalidQueryParameter { name: &'static str, reason: String },

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns `true` for errors caused by the request rather than the system.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::CategoryUnknown(_)
                | Self::ValidationFailed(_)
                | Self::InvalidParent(_)
                | Self::ParentNotFound { .. }
                | Self::NotFound { .. }
                | Self::HasChildren { .. }
                | Self::InvalidQueryParameter { .. }
        )
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::CategoryUnknown(name) => Self::CategoryUnknown(name),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { category, id } => Self::NotFound { category, id },
            StoreError::ParentNotFound { category, id } => Self::ParentNotFound { category, id },
            StoreError::HasChildren {
                category,
                id,
                count,
            } => Self::HasChildren {
                category,
                id,
                count,
            },
            StoreError::Backend(db) => db.into(),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::PoolError(_)
            | DbError::DatabaseError(
                diesel::result::Error::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
                | diesel::result::Error::BrokenTransactionManager,
            ) => {
                tracing::error!(error = %err, "Store unavailable");
                Self::BackendUnavailable(err.to_string())
            }
            DbError::DatabaseError(_) => {
                tracing::error!(error = %err, "Store query failed");
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_service_kinds() {
        assert!(matches!(
            ServiceError::from(CoreError::CategoryUnknown("garage".to_string())),
            ServiceError::CategoryUnknown(name) if name == "garage"
        ));
        assert!(matches!(
            ServiceError::from(CoreError::InvalidHierarchy("loop".to_string())),
            ServiceError::Internal(_)
        ));
    }

    #[test]
    fn test_db_errors_split_unavailable_from_internal() {
        let broken = DbError::DatabaseError(diesel::result::Error::BrokenTransactionManager);
        assert!(matches!(
            ServiceError::from(broken),
            ServiceError::BackendUnavailable(_)
        ));

        let missing = DbError::DatabaseError(diesel::result::Error::NotFound);
        assert!(matches!(ServiceError::from(missing), ServiceError::Internal(_)));
    }

    #[test]
    fn test_store_outcomes_are_client_errors() {
        let err = ServiceError::from(StoreError::HasChildren {
            category: Category::Room,
            id: 1,
            count: 2,
        });
        assert!(err.is_client_error());
        assert!(!ServiceError::BackendUnavailable("down".to_string()).is_client_error());
    }
}
