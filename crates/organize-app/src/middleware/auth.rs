use salvo::Depot;
use salvo::http::StatusCode;
use tracing::error;

use crate::app::api::response::render_error;
use crate::config::{AuthConfig, AuthMethod, get_config_from_depot};
use crate::error::{AppError, AppResult};
use organize_core::error::CoreError;

pub mod depot_keys {
    /// Depot key holding the authenticated user id as a `String`.
    pub const AUTHENTICATED_USER: &str = "authenticated_user";
}

/// Header read when `[auth.proxy]` is not configured.
pub const DEFAULT_USER_HEADER: &str = "X-Authenticated-User";

pub struct AuthMiddleware;

/// ## Summary
/// Resolves the acting user and stores its id in the depot. Every entity is
/// scoped to that id.
///
/// ## Errors
/// Responds 401 when no identity is present and 500 when the auth settings
/// are incomplete.
#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        let config = match get_config_from_depot(depot) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!(error = ?e, "Failed to get config from depot");
                res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                ctrl.skip_rest();
                return;
            }
        };

        match resolve_user(req, &config.auth) {
            Ok(user_id) => {
                tracing::debug!(user_id, "Request authenticated");
                depot.insert(depot_keys::AUTHENTICATED_USER, user_id);
            }
            Err(err) => {
                tracing::debug!(error = %err, "Authentication failed");
                render_error(res, &err);
                ctrl.skip_rest();
            }
        }
    }
}

fn resolve_user(req: &salvo::Request, auth: &AuthConfig) -> AppResult<String> {
    match auth.method {
        AuthMethod::Proxy => {
            let header = auth
                .proxy
                .as_ref()
                .map_or(DEFAULT_USER_HEADER, |proxy| proxy.header.as_str());
            req.header::<String>(header)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(AppError::Unauthenticated)
        }
        AuthMethod::SingleUser => auth
            .single_user
            .as_ref()
            .map(|single| single.user_id.clone())
            .ok_or_else(|| {
                CoreError::ConfigError("auth.single_user.user_id is not set".to_string()).into()
            }),
    }
}

/// ## Summary
/// Returns the user id stored by [`AuthMiddleware`].
///
/// ## Errors
/// `Unauthenticated` if the middleware did not run or rejected the request.
pub fn current_user(depot: &Depot) -> AppResult<String> {
    depot
        .get::<String>(depot_keys::AUTHENTICATED_USER)
        .cloned()
        .map_err(|_err| AppError::Unauthenticated)
}
