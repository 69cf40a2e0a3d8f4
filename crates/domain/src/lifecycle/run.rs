//! Lifecycle runs — one execution of the evaluate-and-transition cycle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::{AssetId, RunId};
use crate::time::Timestamp;

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Scheduled,
    Manual,
}

/// Which phases a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhases {
    /// Dead-stock phase followed by the disposal phase.
    Full,
    DeadStock,
    Disposal,
}

impl RunPhases {
    #[must_use]
    pub fn includes_dead_stock(self) -> bool {
        matches!(self, Self::Full | Self::DeadStock)
    }

    #[must_use]
    pub fn includes_disposal(self) -> bool {
        matches!(self, Self::Full | Self::Disposal)
    }
}

/// Where a run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    /// The process stopped before the run could be finalized.
    Abandoned,
}

impl RunStatus {
    #[must_use]
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Why a candidate was not transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The asset's status changed between evaluation and the write.
    ConcurrentModification,
}

/// A candidate left in its prior state for re-evaluation next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAsset {
    pub asset_id: AssetId,
    pub reason: SkipReason,
}

/// Number of assets moved per phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCounts {
    pub dead_stock_moved: u64,
    pub disposal_moved: u64,
}

impl RunCounts {
    #[must_use]
    pub fn total(self) -> u64 {
        self.dead_stock_moved + self.disposal_moved
    }
}

/// Why a run ended in [`RunStatus::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum RunFailure {
    /// The asset or audit store failed; the remaining batch was aborted.
    Storage {
        message: String,
        /// Assets moved whose audit entry could not be written.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        unaudited: Vec<AssetId>,
    },
    /// The run overran the timeout ceiling.
    TimeoutExceeded { limit_secs: u64 },
    /// The run task terminated unexpectedly.
    Crashed(String),
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage { message, unaudited } if unaudited.is_empty() => {
                write!(f, "storage failure: {message}")
            }
            Self::Storage { message, unaudited } => write!(
                f,
                "storage failure: {message} ({} moved without audit entry)",
                unaudited.len()
            ),
            Self::TimeoutExceeded { limit_secs } => {
                write!(f, "run exceeded the {limit_secs}s timeout")
            }
            Self::Crashed(detail) => write!(f, "run task crashed: {detail}"),
        }
    }
}

/// Summary of one lifecycle run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleRun {
    #[serde(rename = "runId")]
    pub id: RunId,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub trigger_type: TriggerType,
    pub triggered_by: Option<String>,
    pub phases: RunPhases,
    pub counts: RunCounts,
    pub skipped: Vec<SkippedAsset>,
    pub status: RunStatus,
    pub error: Option<RunFailure>,
}

impl LifecycleRun {
    /// Open a new run in [`RunStatus::Running`].
    #[must_use]
    pub fn start(
        trigger_type: TriggerType,
        triggered_by: Option<String>,
        phases: RunPhases,
        started_at: Timestamp,
    ) -> Self {
        Self {
            id: RunId::new(),
            started_at,
            finished_at: None,
            trigger_type,
            triggered_by,
            phases,
            counts: RunCounts::default(),
            skipped: Vec::new(),
            status: RunStatus::Running,
            error: None,
        }
    }

    /// Mark the run as successfully finished.
    pub fn complete(&mut self, at: Timestamp) {
        self.finish(RunStatus::Completed, at);
    }

    /// Mark the run as failed, keeping the counts accumulated so far.
    pub fn fail(&mut self, failure: RunFailure, at: Timestamp) {
        self.error = Some(failure);
        self.finish(RunStatus::Failed, at);
    }

    /// Mark the run as abandoned by a stopping process.
    pub fn abandon(&mut self, at: Timestamp) {
        self.finish(RunStatus::Abandoned, at);
    }

    fn finish(&mut self, status: RunStatus, at: Timestamp) {
        self.status = status;
        self.finished_at = Some(at);
    }
}

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Returned when parsing an unknown run enum value from storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

string_enum!(TriggerType {
    Scheduled => "scheduled",
    Manual => "manual",
});

string_enum!(RunPhases {
    Full => "full",
    DeadStock => "dead_stock",
    Disposal => "disposal",
});

string_enum!(RunStatus {
    Running => "running",
    Completed => "completed",
    Failed => "failed",
    Abandoned => "abandoned",
});
