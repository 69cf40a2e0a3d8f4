//! Lifecycle — the rules, evaluation and bookkeeping behind the
//! Active → Dead Stock → Disposed progression.
//!
//! Everything here is pure: the application layer supplies assets, the
//! current configuration and a single captured `now`, and decides what to
//! persist.

mod config;
mod eligibility;
mod run;
mod stats;

pub use config::{
    DeadStockPatch, DeadStockRules, DisposalPatch, DisposalRules, LifecycleConfig,
    LifecycleConfigPatch, MAX_THRESHOLD_DAYS, MIN_THRESHOLD_DAYS,
};
pub use eligibility::{
    evaluate_dead_stock_candidates, evaluate_disposal_candidates, is_disposal_eligible,
};
pub use run::{
    LifecycleRun, RunCounts, RunFailure, RunPhases, RunStatus, SkipReason, SkippedAsset,
    TriggerType, UnknownVariant,
};
pub use stats::{LifecycleStats, MAX_LOOKAHEAD_DAYS};
