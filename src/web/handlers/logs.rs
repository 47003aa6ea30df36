//! Runtime log control action.

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::logging::is_valid_level;
use crate::web::dto::LogsResponse;
use crate::web::error::ApiError;
use crate::web::handlers::{ActionParams, AppState};

/// `action=logs`: GET reports the current state; POST updates it through
/// the subscriber reload handle. `status` is `on`/`off`, `level` one of
/// the tracing levels.
pub fn handle(
    state: &AppState,
    params: &ActionParams,
    is_post: bool,
) -> std::result::Result<Response, ApiError> {
    if is_post {
        if let Some(level) = params.get("level") {
            if !is_valid_level(level) {
                return Err(ApiError::bad_request(format!("unknown log level: {level}")));
            }
            state.log_control.set_level(level)?;
        }
        if let Some(status) = params.get("status") {
            match status {
                "on" => state.log_control.set_enabled(true)?,
                "off" => state.log_control.set_enabled(false)?,
                other => {
                    return Err(ApiError::bad_request(format!(
                        "status must be on or off, got {other}"
                    )))
                }
            }
        }
    }

    Ok(Json(LogsResponse {
        success: true,
        logging: state.log_control.enabled(),
        log_level: state.log_control.level(),
    })
    .into_response())
}
