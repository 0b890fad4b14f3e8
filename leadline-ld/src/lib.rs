//! leadline-ld library interface
//!
//! The List Distribution service: an axum boundary over the distribution
//! engine. Exposed as a library so integration tests can drive the router
//! directly.

pub mod api;
pub mod engine;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

/// Upload size ceiling enforced at the boundary (the engine itself streams)
pub const MAX_UPLOAD_BYTES: usize = 10_000_000;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route(
            "/api/lists/upload",
            post(api::lists::upload_list).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/lists", get(api::lists::get_lists))
        .route("/api/lists/summary", get(api::lists::get_summary))
        .route("/api/lists/agent/:agent_id", get(api::lists::get_lists_by_agent))
        .route(
            "/api/agents",
            get(api::agents::get_agents).post(api::agents::create_agent),
        )
        .route(
            "/api/agents/:id",
            get(api::agents::get_agent)
                .put(api::agents::update_agent)
                .delete(api::agents::delete_agent),
        )
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
