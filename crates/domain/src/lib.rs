//! # assetcycle-domain
//!
//! Pure domain model for the asset lifecycle automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Assets** and their lifecycle status
//! - Define the **LifecycleConfig** thresholds and their validated updates
//! - Decide **eligibility** for dead-stock and disposal transitions
//! - Describe **runs** and **audit entries** produced by the engine
//! - Aggregate **statistics** for reporting
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod asset;
pub mod audit;
pub mod lifecycle;
