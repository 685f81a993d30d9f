use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, Router, handler};

use super::response::{render_data, render_error};
use super::{category_param, id_param};
use crate::error::AppResult;
use crate::middleware::auth::current_user;
use crate::service_handler::get_service_from_depot;
use organize_core::constants::CHILDREN_ROUTE_COMPONENT;
use organize_core::model::EntitySummary;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(CHILDREN_ROUTE_COMPONENT)
        .push(Router::with_path("{category}/{id}").get(get_children))
}

#[handler]
async fn get_children(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result: AppResult<Vec<EntitySummary>> = async {
        let user_id = current_user(depot)?;
        let service = get_service_from_depot(depot)?;
        let category = category_param(req)?;
        let id = id_param(req)?;
        Ok(service.get_children(&user_id, category, id).await?)
    }
    .await;

    match result {
        Ok(children) => render_data(res, StatusCode::OK, "Children found", children),
        Err(err) => render_error(res, &err),
    }
}
