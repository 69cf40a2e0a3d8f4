//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod history;
#[allow(clippy::missing_errors_doc)]
pub mod lifecycle;

use axum::Router;
use axum::routing::{get, post};

use assetcycle_app::ports::{AssetStore, AuditLog, ConfigRepository, RunRepository};

use crate::state::AppState;

/// Build the `/api/lifecycle` sub-router.
pub fn routes<AS, AL, CR, RR>() -> Router<AppState<AS, AL, CR, RR>>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/stats", get(lifecycle::stats::<AS, AL, CR, RR>))
        .route(
            "/config",
            get(lifecycle::get_config::<AS, AL, CR, RR>)
                .put(lifecycle::update_config::<AS, AL, CR, RR>),
        )
        // Manual triggers
        .route("/run", post(lifecycle::run_full_cycle::<AS, AL, CR, RR>))
        .route("/dead-stock", post(lifecycle::run_dead_stock::<AS, AL, CR, RR>))
        .route("/disposal", post(lifecycle::run_disposal::<AS, AL, CR, RR>))
        // History
        .route("/runs", get(history::list_runs::<AS, AL, CR, RR>))
        .route("/runs/{id}", get(history::get_run::<AS, AL, CR, RR>))
        .route("/audit", get(history::recent_audit::<AS, AL, CR, RR>))
        .route(
            "/audit/{asset_id}",
            get(history::audit_for_asset::<AS, AL, CR, RR>),
        )
}
