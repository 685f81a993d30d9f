//! JSON envelope shared by every API response.

use salvo::Response;
use salvo::http::StatusCode;
use salvo::writing::Json;
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    pub data: Option<T>,
}

pub fn render_data<T: Serialize + Send>(
    res: &mut Response,
    status: StatusCode,
    message: &str,
    data: T,
) {
    res.status_code(status);
    res.render(Json(ApiResponse {
        message: message.to_string(),
        data: Some(data),
    }));
}

/// ## Summary
/// Renders `err` with its mapped status. Server-side failures are logged and
/// their details kept out of the response body.
pub fn render_error(res: &mut Response, err: &AppError) {
    let status = err.status_code();
    let message = if status.is_server_error() {
        tracing::error!(error = %err, %status, "Request failed");
        status
            .canonical_reason()
            .unwrap_or("Internal Server Error")
            .to_string()
    } else {
        err.to_string()
    };

    res.status_code(status);
    res.render(Json(ApiResponse::<()> {
        message,
        data: None,
    }));
}
