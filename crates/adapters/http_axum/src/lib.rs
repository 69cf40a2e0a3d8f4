//! # assetcycle-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **lifecycle JSON API** under `/api/lifecycle`
//!   (stats, rule configuration, manual triggers, run history, audit trail)
//! - Map HTTP requests into application service calls (driving adapter)
//! - Wrap every result in a uniform `{ success, data, message, error }`
//!   envelope and map engine errors to status codes
//!
//! ## Dependency rule
//! Depends on `assetcycle-app` (for port traits and services) and
//! `assetcycle-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod envelope;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod testing;
