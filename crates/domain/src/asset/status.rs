//! Asset status — where an asset sits in its lifecycle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an inventory asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Active,
    DeadStock,
    Disposed,
    UnderReview,
    Missing,
}

impl AssetStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Active,
        Self::DeadStock,
        Self::Disposed,
        Self::UnderReview,
        Self::Missing,
    ];

    /// Stable lowercase representation used in storage and on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::DeadStock => "dead_stock",
            Self::Disposed => "disposed",
            Self::UnderReview => "under_review",
            Self::Missing => "missing",
        }
    }

    /// Whether the automation engine may ever move an asset out of this status.
    #[must_use]
    pub fn is_automatable(self) -> bool {
        matches!(self, Self::Active | Self::DeadStock)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown asset status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AssetStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
