pub mod children;
pub mod entities;
pub mod entity;
pub mod healthcheck;
pub mod parents;
pub mod response;

use std::str::FromStr;

use salvo::Router;

use crate::error::AppResult;
use crate::middleware::auth::AuthMiddleware;
use organize_core::category::Category;
use organize_core::constants::API_VERSION_COMPONENT;
use organize_core::model::EntityId;
use organize_service::error::ServiceError;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_VERSION_COMPONENT)
        .hoop(AuthMiddleware)
        .push(entity::routes())
        .push(entities::routes())
        .push(parents::routes())
        .push(children::routes())
}

/// Parses the `{category}` path segment.
pub(crate) fn category_param(req: &salvo::Request) -> AppResult<Category> {
    let raw = req.param::<String>("category").unwrap_or_default();
    Category::from_str(&raw).map_err(|e| ServiceError::from(e).into())
}

/// Parses the `{id}` path segment.
pub(crate) fn id_param(req: &salvo::Request) -> AppResult<EntityId> {
    let raw = req.param::<String>("id").unwrap_or_default();
    raw.parse::<EntityId>().map_err(|e| {
        ServiceError::ValidationFailed(format!("id '{raw}' is not an integer: {e}")).into()
    })
}
