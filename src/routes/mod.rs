//! Route modules for Mic Receiver

pub mod health;
pub mod upload;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(upload::router(state.config().upload.max_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
