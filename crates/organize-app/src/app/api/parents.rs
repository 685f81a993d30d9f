use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, Router, handler};

use super::category_param;
use super::response::{render_data, render_error};
use crate::error::AppResult;
use crate::middleware::auth::current_user;
use crate::service_handler::get_service_from_depot;
use organize_core::constants::PARENTS_ROUTE_COMPONENT;
use organize_core::model::ParentCandidate;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(PARENTS_ROUTE_COMPONENT)
        .push(Router::with_path("{category}").get(get_parents))
}

/// Live entities that may hold a new entity of `{category}`.
#[handler]
async fn get_parents(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result: AppResult<Vec<ParentCandidate>> = async {
        let user_id = current_user(depot)?;
        let service = get_service_from_depot(depot)?;
        let category = category_param(req)?;
        Ok(service.get_parents(&user_id, category).await?)
    }
    .await;

    match result {
        Ok(parents) => render_data(res, StatusCode::OK, "Parents found", parents),
        Err(err) => render_error(res, &err),
    }
}
