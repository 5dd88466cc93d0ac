use axum::{Router, routing::get};

pub mod monitoring;
pub mod suggestions;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/reconciliation-suggestions", suggestions::router())
        .nest("/ml-monitoring", monitoring::router())
}
