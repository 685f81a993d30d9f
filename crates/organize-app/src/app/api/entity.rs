use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, Router, handler};

use super::response::{render_data, render_error};
use super::{category_param, id_param};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::current_user;
use crate::service_handler::get_service_from_depot;
use organize_core::constants::ENTITY_ROUTE_COMPONENT;
use organize_core::model::Entity;
use organize_service::error::ServiceError;
use organize_service::request::{EntityCommand, EntityForm};

#[must_use]
pub fn routes() -> Router {
    Router::with_path(ENTITY_ROUTE_COMPONENT)
        .post(create_entity)
        .put(edit_entity)
        .push(
            Router::with_path("{category}/{id}")
                .get(get_entity)
                .delete(delete_entity),
        )
}

async fn parse_form(req: &mut Request) -> AppResult<EntityCommand> {
    let form = req
        .parse_json::<EntityForm>()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed entity body: {e}")))?;
    Ok(form.into_command()?)
}

async fn create(req: &mut Request, depot: &Depot) -> AppResult<Entity> {
    let user_id = current_user(depot)?;
    let service = get_service_from_depot(depot)?;
    let command = parse_form(req).await?;
    Ok(service
        .create(&user_id, command.category, command.fields)
        .await?)
}

async fn edit(req: &mut Request, depot: &Depot) -> AppResult<Entity> {
    let user_id = current_user(depot)?;
    let service = get_service_from_depot(depot)?;
    let command = parse_form(req).await?;
    let id = command
        .id
        .ok_or_else(|| ServiceError::ValidationFailed("id is required".to_string()))?;
    Ok(service
        .edit(&user_id, command.category, id, command.fields)
        .await?)
}

#[handler]
async fn create_entity(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match create(req, depot).await {
        Ok(entity) => render_data(res, StatusCode::CREATED, "Entity created", entity),
        Err(err) => render_error(res, &err),
    }
}

#[handler]
async fn edit_entity(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match edit(req, depot).await {
        Ok(entity) => render_data(res, StatusCode::OK, "Entity updated", entity),
        Err(err) => render_error(res, &err),
    }
}

#[handler]
async fn get_entity(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result: AppResult<Entity> = async {
        let user_id = current_user(depot)?;
        let service = get_service_from_depot(depot)?;
        let category = category_param(req)?;
        let id = id_param(req)?;
        Ok(service.get(&user_id, category, id).await?)
    }
    .await;

    match result {
        Ok(entity) => render_data(res, StatusCode::OK, "Entity found", entity),
        Err(err) => render_error(res, &err),
    }
}

#[handler]
async fn delete_entity(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result: AppResult<()> = async {
        let user_id = current_user(depot)?;
        let service = get_service_from_depot(depot)?;
        let category = category_param(req)?;
        let id = id_param(req)?;
        Ok(service.delete(&user_id, category, id).await?)
    }
    .await;

    match result {
        Ok(()) => render_data(res, StatusCode::OK, "Entity deleted", ()),
        Err(err) => render_error(res, &err),
    }
}
