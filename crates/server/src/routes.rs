use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::todo::TodoService;

use crate::auth::{self, ServerAuthConfig};
use crate::metrics;

pub mod todos;

#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<TodoService>,
    pub auth: ServerAuthConfig,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics_handler() -> (StatusCode, String) {
    metrics::encode_metrics()
}

/// Build the full application router: public probes plus bearer-protected todo routes
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler));

    let todo_routes = Router::new()
        .route("/todos", get(todos::list_owned).post(todos::create))
        .route("/todos/by-tag", get(todos::list_by_tag))
        .route("/todos/:id", get(todos::get).put(todos::update).delete(todos::delete))
        .route("/todos/:id/complete", post(todos::complete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    public
        .merge(todo_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
