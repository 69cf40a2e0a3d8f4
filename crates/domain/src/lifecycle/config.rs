//! Lifecycle rule configuration and its validated partial update.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{AssetCycleError, ValidationError};

/// Smallest accepted threshold, in days.
pub const MIN_THRESHOLD_DAYS: u32 = 1;
/// Largest accepted threshold, in days (roughly ten years).
pub const MAX_THRESHOLD_DAYS: u32 = 3650;

/// Thresholds the engine enforces.
///
/// The engine never decides what these values should be; it evaluates
/// whatever is configured. Changes are not retroactive: assets already
/// classified stay where they are until the next run re-evaluates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleConfig {
    pub dead_stock: DeadStockRules,
    pub disposal: DisposalRules,
}

/// When an active asset becomes dead stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadStockRules {
    pub inactivity_threshold_days: u32,
    pub excluded_categories: BTreeSet<String>,
}

/// When a dead-stock asset is disposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalRules {
    pub dead_stock_duration_days: u32,
    pub require_approval: bool,
}

impl Default for DeadStockRules {
    fn default() -> Self {
        Self {
            inactivity_threshold_days: 365,
            excluded_categories: BTreeSet::new(),
        }
    }
}

impl Default for DisposalRules {
    fn default() -> Self {
        Self {
            dead_stock_duration_days: 90,
            require_approval: false,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            dead_stock: DeadStockRules::default(),
            disposal: DisposalRules::default(),
        }
    }
}

impl LifecycleConfig {
    /// Whether `category` is excluded from dead-stock evaluation.
    ///
    /// Matching ignores surrounding whitespace and ASCII case.
    #[must_use]
    pub fn is_category_excluded(&self, category: &str) -> bool {
        let category = category.trim();
        self.dead_stock
            .excluded_categories
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(category))
    }

    /// Validate `patch` and return the merged configuration.
    ///
    /// `self` is left untouched whether or not validation succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AssetCycleError::Validation`] naming the first offending field.
    pub fn merged(&self, patch: &LifecycleConfigPatch) -> Result<Self, AssetCycleError> {
        let mut merged = self.clone();

        if let Some(dead_stock) = &patch.dead_stock {
            if let Some(days) = dead_stock.inactivity_threshold_days {
                merged.dead_stock.inactivity_threshold_days =
                    threshold("deadStock.inactivityThresholdDays", days)?;
            }
            if let Some(categories) = &dead_stock.excluded_categories {
                merged.dead_stock.excluded_categories = normalize_categories(categories)?;
            }
        }

        if let Some(disposal) = &patch.disposal {
            if let Some(days) = disposal.dead_stock_duration_days {
                merged.disposal.dead_stock_duration_days =
                    threshold("disposal.deadStockDurationDays", days)?;
            }
            if let Some(require) = disposal.require_approval {
                merged.disposal.require_approval = require;
            }
        }

        Ok(merged)
    }
}

fn threshold(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    match u32::try_from(value) {
        Ok(days) if (MIN_THRESHOLD_DAYS..=MAX_THRESHOLD_DAYS).contains(&days) => Ok(days),
        _ => Err(ValidationError::OutOfRange {
            field,
            value,
            min: i64::from(MIN_THRESHOLD_DAYS),
            max: i64::from(MAX_THRESHOLD_DAYS),
        }),
    }
}

fn normalize_categories(categories: &[String]) -> Result<BTreeSet<String>, ValidationError> {
    categories
        .iter()
        .map(|category| {
            let trimmed = category.trim();
            if trimmed.is_empty() {
                Err(ValidationError::BlankEntry {
                    field: "deadStock.excludedCategories",
                })
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}

/// Partial update of a [`LifecycleConfig`]; absent fields keep their value.
///
/// Integer fields are signed so that out-of-range input such as `-1` is
/// reported as a validation error naming the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleConfigPatch {
    pub dead_stock: Option<DeadStockPatch>,
    pub disposal: Option<DisposalPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadStockPatch {
    pub inactivity_threshold_days: Option<i64>,
    pub excluded_categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalPatch {
    pub dead_stock_duration_days: Option<i64>,
    pub require_approval: Option<bool>,
}
