//! JSON REST handlers for run history and the audit trail.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use assetcycle_app::ports::{AssetStore, AuditLog, ConfigRepository, RunRepository};
use assetcycle_domain::audit::AuditLogEntry;
use assetcycle_domain::id::{AssetId, RunId};
use assetcycle_domain::lifecycle::LifecycleRun;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters of the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Possible responses from the run endpoints.
pub enum RunsResponse {
    List(Json<Envelope<Vec<LifecycleRun>>>),
    One(Json<Envelope<LifecycleRun>>),
}

impl IntoResponse for RunsResponse {
    fn into_response(self) -> Response {
        match self {
            Self::List(json) => json.into_response(),
            Self::One(json) => json.into_response(),
        }
    }
}

/// Possible responses from the audit endpoints.
pub enum AuditResponse {
    Ok(Json<Envelope<Vec<AuditLogEntry>>>),
}

impl IntoResponse for AuditResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/lifecycle/runs`
pub async fn list_runs<AS, AL, CR, RR>(
    State(state): State<AppState<AS, AL, CR, RR>>,
    Query(query): Query<LimitQuery>,
) -> Result<RunsResponse, ApiError>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    let runs = state.history_service.list_runs(query.limit).await?;
    Ok(RunsResponse::List(Json(Envelope::ok(runs))))
}

/// `GET /api/lifecycle/runs/:id`
pub async fn get_run<AS, AL, CR, RR>(
    State(state): State<AppState<AS, AL, CR, RR>>,
    Path(id): Path<String>,
) -> Result<RunsResponse, ApiError>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    let run_id = RunId::from_str(&id).map_err(|_| ApiError::invalid_id(&id))?;
    let run = state.history_service.get_run(run_id).await?;
    Ok(RunsResponse::One(Json(Envelope::ok(run))))
}

/// `GET /api/lifecycle/audit`
pub async fn recent_audit<AS, AL, CR, RR>(
    State(state): State<AppState<AS, AL, CR, RR>>,
    Query(query): Query<LimitQuery>,
) -> Result<AuditResponse, ApiError>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    let entries = state.history_service.recent_audit(query.limit).await?;
    Ok(AuditResponse::Ok(Json(Envelope::ok(entries))))
}

/// `GET /api/lifecycle/audit/:asset_id`
pub async fn audit_for_asset<AS, AL, CR, RR>(
    State(state): State<AppState<AS, AL, CR, RR>>,
    Path(asset_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<AuditResponse, ApiError>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    let id = AssetId::from_str(&asset_id).map_err(|_| ApiError::invalid_id(&asset_id))?;
    let entries = state
        .history_service
        .audit_for_asset(id, query.limit)
        .await?;
    Ok(AuditResponse::Ok(Json(Envelope::ok(entries))))
}
