use salvo::http::StatusCode;
use thiserror::Error;

use organize_service::error::ServiceError;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    CoreError(#[from] organize_core::error::CoreError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not authenticated")]
    Unauthenticated,
}

impl AppError {
    /// HTTP status for this error. Client mistakes are 400 except missing
    /// entities (404); an unreachable backend is 503.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ServiceError(ServiceError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::ServiceError(ServiceError::BackendUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::ServiceError(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::ServiceError(_) | Self::CoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use organize_core::category::Category;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ServiceError::NotFound {
                    category: Category::Room,
                    id: 1,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::HasChildren {
                    category: Category::Room,
                    id: 1,
                    count: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::InvalidParent("x".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::CategoryUnknown("garage".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::BackendUnavailable("down".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ServiceError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
        assert_eq!(
            AppError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
