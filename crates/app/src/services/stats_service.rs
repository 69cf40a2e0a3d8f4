//! Stats service — read-only lifecycle reporting.

use std::sync::Arc;

use assetcycle_domain::error::{AssetCycleError, ValidationError};
use assetcycle_domain::lifecycle::{LifecycleStats, MAX_LOOKAHEAD_DAYS};
use assetcycle_domain::time::now;

use crate::ports::{AssetFilter, AssetStore, ConfigRepository};
use crate::services::config_service::LifecycleConfigService;

/// Default look-ahead window for upcoming disposals, in days.
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 30;

/// Aggregates current asset state for dashboards.
///
/// Never writes and never touches the run lock, so it can be called while a
/// lifecycle run is in progress.
pub struct LifecycleStatsService<AS, CR> {
    assets: Arc<AS>,
    config: Arc<LifecycleConfigService<CR>>,
    lookahead_days: u32,
}

impl<AS, CR> LifecycleStatsService<AS, CR>
where
    AS: AssetStore,
    CR: ConfigRepository,
{
    /// Create a new service reading from `assets`.
    pub fn new(assets: Arc<AS>, config: Arc<LifecycleConfigService<CR>>) -> Self {
        Self {
            assets,
            config,
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
        }
    }

    /// Override the default look-ahead window.
    #[must_use]
    pub fn with_lookahead_days(mut self, days: u32) -> Self {
        self.lookahead_days = days;
        self
    }

    /// Current per-status counts, dead-stock dwell time and upcoming disposals.
    ///
    /// `lookahead_days` overrides the configured window for this call.
    ///
    /// # Errors
    ///
    /// Returns [`AssetCycleError::Validation`] naming `lookaheadDays` when the
    /// window exceeds [`MAX_LOOKAHEAD_DAYS`], or a storage error propagated
    /// from the asset store.
    #[tracing::instrument(skip(self))]
    pub async fn get_lifecycle_stats(
        &self,
        lookahead_days: Option<u32>,
    ) -> Result<LifecycleStats, AssetCycleError> {
        let lookahead_days = lookahead_days.unwrap_or(self.lookahead_days);
        if lookahead_days > MAX_LOOKAHEAD_DAYS {
            return Err(ValidationError::OutOfRange {
                field: "lookaheadDays",
                value: i64::from(lookahead_days),
                min: 0,
                max: i64::from(MAX_LOOKAHEAD_DAYS),
            }
            .into());
        }

        let assets = self.assets.query_assets(AssetFilter::all()).await?;
        let config = self.config.get().await;
        Ok(LifecycleStats::compute(
            &assets,
            &config,
            now(),
            lookahead_days,
        ))
    }
}
