//! Read-only lifecycle statistics for dashboards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, AssetStatus};
use crate::time::{Timestamp, days_between, saturating_add_days};

use super::config::{LifecycleConfig, MAX_THRESHOLD_DAYS};
use super::eligibility::{dead_stock_since, is_disposal_eligible};

/// Widest accepted "upcoming disposals" window, in days.
pub const MAX_LOOKAHEAD_DAYS: u32 = MAX_THRESHOLD_DAYS;

/// Snapshot of where the inventory stands in its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleStats {
    /// Asset count for every status, including zeroes.
    pub by_status: BTreeMap<AssetStatus, u64>,
    pub total: u64,
    /// Mean time current dead-stock assets have spent there, in days.
    pub average_dead_stock_days: Option<f64>,
    /// Dead-stock assets that become disposal-eligible within the window.
    pub upcoming_disposals: u64,
    pub lookahead_days: u32,
    pub generated_at: Timestamp,
}

impl LifecycleStats {
    /// Aggregate `assets` as of `now`.
    ///
    /// An asset counts towards `upcoming_disposals` when it is not eligible
    /// at `now` but is at `now + lookahead_days`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(
        assets: &[Asset],
        config: &LifecycleConfig,
        now: Timestamp,
        lookahead_days: u32,
    ) -> Self {
        let mut by_status: BTreeMap<AssetStatus, u64> =
            AssetStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        for asset in assets {
            *by_status.entry(asset.status).or_default() += 1;
        }

        let dwell: Vec<f64> = assets
            .iter()
            .filter(|asset| asset.status == AssetStatus::DeadStock)
            .map(|asset| days_between(dead_stock_since(asset), now).max(0.0))
            .collect();
        let average_dead_stock_days =
            (!dwell.is_empty()).then(|| dwell.iter().sum::<f64>() / dwell.len() as f64);

        let horizon = saturating_add_days(now, lookahead_days);
        let upcoming_disposals = assets
            .iter()
            .filter(|asset| {
                !is_disposal_eligible(asset, config, now)
                    && is_disposal_eligible(asset, config, horizon)
            })
            .count() as u64;

        Self {
            by_status,
            total: assets.len() as u64,
            average_dead_stock_days,
            upcoming_disposals,
            lookahead_days,
            generated_at: now,
        }
    }
}
