//! Router configuration for the dispatch endpoint.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::cors::cors_layer;
use super::handlers::{process, AppState};

/// Create the main router: `/process` for every action, `/health` for
/// liveness checks.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Uploads go through the dispatch endpoint, so the body limit follows
    // the configured upload cap rather than axum's default.
    let body_limit = (state.config.media.max_upload_size_mb * 1024 * 1024) as usize + 64 * 1024;
    let cors = cors_layer(&state.config.web.cors_origins);

    Router::new()
        .route("/process", get(process).post(process))
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::logging::LogControl;
    use tempfile::TempDir;

    #[test]
    fn test_create_router() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.content.root = tmp.path().join("content").display().to_string();
        config.media.root = tmp.path().join("img").display().to_string();
        config.cache.dir = tmp.path().join("cache").display().to_string();
        let log_control = LogControl::disconnected(&config.logging);

        let state = Arc::new(AppState::new(config, log_control).unwrap());
        let _router = create_router(state);
    }
}
