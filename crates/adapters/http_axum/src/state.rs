//! Shared application state for axum handlers.

use std::sync::Arc;

use assetcycle_app::lifecycle::LifecycleScheduler;
use assetcycle_app::ports::{AssetStore, AuditLog, ConfigRepository, RunRepository};
use assetcycle_app::services::config_service::LifecycleConfigService;
use assetcycle_app::services::history_service::LifecycleHistoryService;
use assetcycle_app::services::stats_service::LifecycleStatsService;

/// Application state shared across all axum handlers.
///
/// Generic over the asset store, audit log, config repository and run
/// repository to avoid dynamic dispatch. `Clone` is implemented manually so
/// the underlying types themselves do not need to be `Clone`. Only the
/// `Arc` wrappers are cloned.
pub struct AppState<AS, AL, CR, RR> {
    /// Rule configuration.
    pub config_service: Arc<LifecycleConfigService<CR>>,
    /// Manual triggers; shared with the periodic task.
    pub scheduler: Arc<LifecycleScheduler<AS, AL, CR, RR>>,
    /// Dashboard statistics.
    pub stats_service: Arc<LifecycleStatsService<AS, CR>>,
    /// Run history and audit trail.
    pub history_service: Arc<LifecycleHistoryService<AS, AL, RR>>,
}

impl<AS, AL, CR, RR> Clone for AppState<AS, AL, CR, RR> {
    fn clone(&self) -> Self {
        Self {
            config_service: Arc::clone(&self.config_service),
            scheduler: Arc::clone(&self.scheduler),
            stats_service: Arc::clone(&self.stats_service),
            history_service: Arc::clone(&self.history_service),
        }
    }
}

impl<AS, AL, CR, RR> AppState<AS, AL, CR, RR>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// Services are built by the composition root so they can be shared
    /// with background tasks before constructing the HTTP state.
    pub fn from_arcs(
        config_service: Arc<LifecycleConfigService<CR>>,
        scheduler: Arc<LifecycleScheduler<AS, AL, CR, RR>>,
        stats_service: Arc<LifecycleStatsService<AS, CR>>,
        history_service: Arc<LifecycleHistoryService<AS, AL, RR>>,
    ) -> Self {
        Self {
            config_service,
            scheduler,
            stats_service,
            history_service,
        }
    }
}
