use salvo::http::StatusCode;
use salvo::http::header::CONTENT_RANGE;
use salvo::{Depot, Request, Response, Router, handler};

use super::response::{render_data, render_error};
use crate::error::AppResult;
use crate::middleware::auth::current_user;
use crate::service_handler::get_service_from_depot;
use organize_core::constants::{CONTENT_RANGE_UNIT, ENTITIES_ROUTE_COMPONENT};
use organize_core::model::EntityPage;
use organize_service::query::ListParams;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(ENTITIES_ROUTE_COMPONENT).get(list_entities)
}

async fn list(req: &Request, depot: &Depot) -> AppResult<EntityPage> {
    let user_id = current_user(depot)?;
    let service = get_service_from_depot(depot)?;

    let offset = req.query::<String>("offset");
    let limit = req.query::<String>("limit");
    let search = req.query::<String>("search");
    let filters = req.query::<String>("filters");
    let query = service.parse_list_query(&ListParams {
        offset: offset.as_deref(),
        limit: limit.as_deref(),
        search: search.as_deref(),
        filters: filters.as_deref(),
    })?;

    Ok(service.list_entities(&user_id, &query).await?)
}

/// ## Summary
/// One page of the user's entities across every category, deepest first.
/// The window and the matching total are echoed in `Content-Range`.
#[handler]
async fn list_entities(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match list(req, depot).await {
        Ok(page) => {
            let range = format!("{CONTENT_RANGE_UNIT} {}", page.content_range());
            if let Err(e) = res.add_header(CONTENT_RANGE, range, true) {
                tracing::warn!(error = %e, "Failed to set Content-Range header");
            }
            render_data(res, StatusCode::OK, "Entities found", page.entities);
        }
        Err(err) => render_error(res, &err),
    }
}
