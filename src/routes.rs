use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{health_handler, metrics_handler, validate_sol_handler, validate_token_handler};
use crate::middleware::rate_limit;
use crate::rate_limit::EndpointCategory;
use crate::state::AppState;

// Each balance route gets its own limiter gate; health and metrics are never limited
pub fn build_router(state: Arc<AppState>) -> Router {
    let token_gate = from_fn_with_state((Arc::clone(&state), EndpointCategory::Token), rate_limit);
    let sol_gate = from_fn_with_state((Arc::clone(&state), EndpointCategory::Sol), rate_limit);

    Router::new()
        .route("/validate-token", post(validate_token_handler).route_layer(token_gate))
        .route("/validate-sol", post(validate_sol_handler).route_layer(sol_gate))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
