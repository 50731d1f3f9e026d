//! API Routes
//!
//! Configures the Axum router with all cache endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    all_handler, delete_handler, get_handler, health_handler, put_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /put` - Store a record
/// - `POST /get` - Retrieve a record by key
/// - `POST /delete` - Delete a record
/// - `POST /all` - Wildcard pattern scan
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/put", put(put_handler))
        .route("/get", post(get_handler))
        .route("/delete", post(delete_handler))
        .route("/all", post(all_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
