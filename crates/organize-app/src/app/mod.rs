pub mod api;

use std::sync::Arc;

use salvo::Router;

use crate::config::{ConfigHandler, Settings};
use crate::service_handler::InventoryServiceHandler;
use organize_service::InventoryService;

/// ## Summary
/// Full application router: depot injection hoops, the liveness probe and
/// the authenticated `/v1` API.
#[must_use]
pub fn router(settings: Settings, service: Arc<InventoryService>) -> Router {
    Router::new()
        .hoop(ConfigHandler::new(settings))
        .hoop(InventoryServiceHandler { service })
        .get(api::healthcheck::alive)
        .push(api::routes())
}
