//! Eligibility evaluation — which assets qualify for a transition.
//!
//! Both functions are pure: same assets, config and `now` always yield the
//! same candidates in the same order. Assets that are `Disposed`,
//! `UnderReview` or `Missing` are never candidates.

use crate::asset::{Asset, AssetStatus};
use crate::id::AssetId;
use crate::time::{Timestamp, days, epoch};

use super::config::LifecycleConfig;

/// Active assets whose last sign of life is older than the inactivity threshold.
///
/// Ordered oldest activity first, ties broken by id.
#[must_use]
pub fn evaluate_dead_stock_candidates(
    assets: &[Asset],
    config: &LifecycleConfig,
    now: Timestamp,
) -> Vec<AssetId> {
    let threshold = days(config.dead_stock.inactivity_threshold_days);

    let mut candidates: Vec<(Timestamp, AssetId)> = assets
        .iter()
        .filter(|asset| asset.status == AssetStatus::Active)
        .filter(|asset| !config.is_category_excluded(&asset.category))
        .map(|asset| (asset.effective_last_activity(), asset.id))
        .filter(|(last_activity, _)| now - *last_activity >= threshold)
        .collect();

    candidates.sort_unstable();
    candidates.into_iter().map(|(_, id)| id).collect()
}

/// Whether a dead-stock asset may be disposed at `now`.
#[must_use]
pub fn is_disposal_eligible(asset: &Asset, config: &LifecycleConfig, now: Timestamp) -> bool {
    asset.status == AssetStatus::DeadStock
        && now - dead_stock_since(asset) >= days(config.disposal.dead_stock_duration_days)
        && (!config.disposal.require_approval || asset.is_disposal_approved())
}

/// Dead-stock assets that have sat long enough (and are approved, if required).
///
/// Ordered longest in dead stock first, ties broken by id.
#[must_use]
pub fn evaluate_disposal_candidates(
    assets: &[Asset],
    config: &LifecycleConfig,
    now: Timestamp,
) -> Vec<AssetId> {
    let mut candidates: Vec<(Timestamp, AssetId)> = assets
        .iter()
        .filter(|asset| is_disposal_eligible(asset, config, now))
        .map(|asset| (dead_stock_since(asset), asset.id))
        .collect();

    candidates.sort_unstable();
    candidates.into_iter().map(|(_, id)| id).collect()
}

/// When the asset entered dead stock; epoch if the store never recorded it.
pub(crate) fn dead_stock_since(asset: &Asset) -> Timestamp {
    asset.dead_stock_since.unwrap_or_else(epoch)
}
