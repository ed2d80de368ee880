//! Router assembly.

mod client;
mod common;

pub use client::api_routes;
pub use common::common_routes;

use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Full application: common routes at the root, authenticated API under `/api`.
pub fn app(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state, body_limit_bytes))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
