use std::sync::Arc;

use salvo::async_trait;

use crate::error::AppResult;
use organize_core::error::CoreError;
use organize_service::InventoryService;

pub struct InventoryServiceHandler {
    pub service: Arc<InventoryService>,
}

#[async_trait]
impl salvo::Handler for InventoryServiceHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.service.clone());
    }
}

/// ## Summary
/// Retrieves the inventory service from the depot.
///
/// ## Errors
/// Returns an error if the service is not found in the depot.
pub fn get_service_from_depot(depot: &salvo::Depot) -> AppResult<Arc<InventoryService>> {
    depot
        .obtain::<Arc<InventoryService>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Inventory service not found in depot").into())
}
