//! `/api/Client` and `/api/ClientAddress` route groups, all behind the session middleware.

use crate::auth::require_session;
use crate::handlers::{client, client_address};
use crate::state::AppState;
use axum::{middleware, routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(client::list).post(client::create))
        .route(
            "/:id",
            get(client::read).put(client::update).delete(client::delete),
        )
}

fn client_address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(client_address::list).post(client_address::create))
        .route("/client/:id", get(client_address::read_by_client))
        .route(
            "/:id",
            get(client_address::read)
                .put(client_address::update)
                .delete(client_address::delete),
        )
}

/// API routes: `/Client` and `/ClientAddress`. Nest under `/api`.
/// The session check wraps the body limit, so anonymous requests get 401 whatever their size.
pub fn api_routes(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .nest("/Client", client_routes())
        .nest("/ClientAddress", client_address_routes())
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state)
}
