//! HTTP API over extracted Takvimi prayer-time calendars.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;

/// Build the router with all routes and middleware.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index::index))
        .route("/health", get(handlers::index::health))
        .route("/api/takvimi", get(handlers::calendar::list))
        .route("/api/takvimi/{file}", get(handlers::calendar::year))
        .route("/api/takvimi/{year}/{file}", get(handlers::calendar::month))
        .route("/api/takvimi/{year}/page/{file}", get(handlers::page::page_csv))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
