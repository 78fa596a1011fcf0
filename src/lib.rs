//! Lector PDF Text Service
//!
//! Accepts a PDF upload, has a Gemini model read it, and returns the text
//! as a single whitespace-normalized line.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

use handlers::{extract_binary_handler, extract_handler, health_handler};
use middleware::logging_middleware;

/// Builds the service router around already-constructed dependencies.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size_bytes();

    Router::new()
        .route("/health", get(health_handler))
        .route("/extract", post(extract_handler))
        .route("/extract/binary", post(extract_binary_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}
