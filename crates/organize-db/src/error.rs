use thiserror::Error;

use organize_core::category::Category;
use organize_core::model::EntityId;

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

/// Outcome errors of entity store operations.
///
/// The first three variants are answers about the data; `Backend` means the
/// store could not be asked.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{category} {id} not found")]
    NotFound { category: Category, id: EntityId },

    #[error("parent {category} {id} not found")]
    ParentNotFound { category: Category, id: EntityId },

    #[error("{category} {id} still has {count} children")]
    HasChildren {
        category: Category,
        id: EntityId,
        count: i64,
    },

    #[error(transparent)]
    Backend(#[from] DbError),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Backend(DbError::DatabaseError(err))
    }
}

impl From<diesel_async::pooled_connection::bb8::RunError> for StoreError {
    fn from(err: diesel_async::pooled_connection::bb8::RunError) -> Self {
        Self::Backend(DbError::PoolError(err))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Cache backend errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;
