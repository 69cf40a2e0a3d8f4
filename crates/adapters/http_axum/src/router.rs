//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use assetcycle_app::ports::{AssetStore, AuditLog, ConfigRepository, RunRepository};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the lifecycle API under `/api/lifecycle`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<AS, AL, CR, RR>(state: AppState<AS, AL, CR, RR>) -> Router
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/lifecycle", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
