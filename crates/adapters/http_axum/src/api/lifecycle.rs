//! JSON REST handlers for lifecycle stats, rules and manual runs.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use assetcycle_app::ports::{AssetStore, AuditLog, ConfigRepository, RunRepository};
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::lifecycle::{
    LifecycleConfig, LifecycleConfigPatch, LifecycleRun, LifecycleStats, RunStatus,
};

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters of `GET /stats`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub lookahead_days: Option<u32>,
}

/// Query parameters of the manual trigger endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerQuery {
    pub triggered_by: Option<String>,
}

impl TriggerQuery {
    fn actor(self) -> Option<String> {
        self.triggered_by
            .map(|actor| actor.trim().to_string())
            .filter(|actor| !actor.is_empty())
    }
}

/// Possible responses from the stats endpoint.
pub enum StatsResponse {
    Ok(Json<Envelope<LifecycleStats>>),
}

impl IntoResponse for StatsResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the config endpoints.
pub enum ConfigResponse {
    Ok(Json<Envelope<LifecycleConfig>>),
}

impl IntoResponse for ConfigResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the trigger endpoints.
///
/// A run that started but did not complete is still reported with its
/// summary, so the caller sees what was committed before the failure.
pub enum RunResponse {
    Completed(LifecycleRun),
    Failed(LifecycleRun),
}

impl From<LifecycleRun> for RunResponse {
    fn from(run: LifecycleRun) -> Self {
        if run.status == RunStatus::Completed {
            Self::Completed(run)
        } else {
            Self::Failed(run)
        }
    }
}

impl IntoResponse for RunResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Completed(run) => {
                let message = format!(
                    "lifecycle run completed: {} moved to dead stock, {} disposed",
                    run.counts.dead_stock_moved, run.counts.disposal_moved
                );
                Json(Envelope::ok(run).with_message(message)).into_response()
            }
            Self::Failed(run) => {
                let error = run.error.as_ref().map_or_else(
                    || format!("lifecycle run {}", run.status),
                    ToString::to_string,
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(Envelope::failure(error, Some(run))),
                )
                    .into_response()
            }
        }
    }
}

fn run_outcome(result: Result<LifecycleRun, AssetCycleError>) -> Result<RunResponse, ApiError> {
    Ok(RunResponse::from(result?))
}

/// `GET /api/lifecycle/stats`
pub async fn stats<AS, AL, CR, RR>(
    State(state): State<AppState<AS, AL, CR, RR>>,
    Query(query): Query<StatsQuery>,
) -> Result<StatsResponse, ApiError>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    let stats = state
        .stats_service
        .get_lifecycle_stats(query.lookahead_days)
        .await?;
    Ok(StatsResponse::Ok(Json(Envelope::ok(stats))))
}

/// `GET /api/lifecycle/config`
pub async fn get_config<AS, AL, CR, RR>(
    State(state): State<AppState<AS, AL, CR, RR>>,
) -> Result<ConfigResponse, ApiError>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    let config = state.config_service.get().await;
    Ok(ConfigResponse::Ok(Json(Envelope::ok(config))))
}

/// `PUT /api/lifecycle/config`
pub async fn update_config<AS, AL, CR, RR>(
    State(state): State<AppState<AS, AL, CR, RR>>,
    payload: Result<Json<LifecycleConfigPatch>, JsonRejection>,
) -> Result<ConfigResponse, ApiError>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    let Json(patch) = payload.map_err(ApiError::malformed_body)?;
    let updated = state.config_service.update(patch).await?;
    Ok(ConfigResponse::Ok(Json(
        Envelope::ok(updated).with_message("lifecycle configuration updated"),
    )))
}

/// `POST /api/lifecycle/run`
pub async fn run_full_cycle<AS, AL, CR, RR>(
    State(state): State<AppState<AS, AL, CR, RR>>,
    Query(query): Query<TriggerQuery>,
) -> Result<RunResponse, ApiError>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    run_outcome(state.scheduler.run_full_cycle(query.actor()).await)
}

/// `POST /api/lifecycle/dead-stock`
pub async fn run_dead_stock<AS, AL, CR, RR>(
    State(state): State<AppState<AS, AL, CR, RR>>,
    Query(query): Query<TriggerQuery>,
) -> Result<RunResponse, ApiError>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    run_outcome(state.scheduler.run_dead_stock(query.actor()).await)
}

/// `POST /api/lifecycle/disposal`
pub async fn run_disposal<AS, AL, CR, RR>(
    State(state): State<AppState<AS, AL, CR, RR>>,
    Query(query): Query<TriggerQuery>,
) -> Result<RunResponse, ApiError>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    run_outcome(state.scheduler.run_disposal(query.actor()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestApp, asset, dead_stock, json_body, request};
    use assetcycle_domain::asset::AssetStatus;
    use axum::http::Method;
    use std::time::Duration;

    #[tokio::test]
    async fn should_return_stats_with_every_status() {
        let app = TestApp::new(vec![asset(400), dead_stock(80)]).await;

        let response = app.send(request(Method::GET, "/api/lifecycle/stats", None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["total"], 2);
        assert_eq!(json["data"]["byStatus"]["dead_stock"], 1);
        assert_eq!(json["data"]["upcomingDisposals"], 1);
    }

    #[tokio::test]
    async fn should_accept_lookahead_override() {
        let app = TestApp::new(vec![dead_stock(5)]).await;

        let response = app
            .send(request(Method::GET, "/api/lifecycle/stats?lookaheadDays=90", None))
            .await;

        let json = json_body(response).await;
        assert_eq!(json["data"]["lookaheadDays"], 90);
        assert_eq!(json["data"]["upcomingDisposals"], 1);
    }

    #[tokio::test]
    async fn should_return_default_config() {
        let app = TestApp::new(vec![]).await;

        let response = app.send(request(Method::GET, "/api/lifecycle/config", None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["deadStock"]["inactivityThresholdDays"], 365);
        assert_eq!(json["data"]["disposal"]["deadStockDurationDays"], 90);
        assert_eq!(json["data"]["disposal"]["requireApproval"], false);
    }

    #[tokio::test]
    async fn should_merge_partial_config_update() {
        let app = TestApp::new(vec![]).await;
        let body = serde_json::json!({
            "deadStock": { "excludedCategories": ["Server", " Network "] },
            "disposal": { "requireApproval": true }
        });

        let response = app
            .send(request(Method::PUT, "/api/lifecycle/config", Some(body)))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["deadStock"]["inactivityThresholdDays"], 365);
        assert_eq!(
            json["data"]["deadStock"]["excludedCategories"],
            serde_json::json!(["Network", "Server"])
        );
        assert_eq!(json["data"]["disposal"]["requireApproval"], true);
    }

    #[tokio::test]
    async fn should_reject_negative_threshold_and_keep_config() {
        let app = TestApp::new(vec![]).await;
        let body = serde_json::json!({ "deadStock": { "inactivityThresholdDays": -1 } });

        let response = app
            .send(request(Method::PUT, "/api/lifecycle/config", Some(body)))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["data"]["field"], "deadStock.inactivityThresholdDays");

        let current = json_body(
            app.send(request(Method::GET, "/api/lifecycle/config", None))
                .await,
        )
        .await;
        assert_eq!(current["data"]["deadStock"]["inactivityThresholdDays"], 365);
    }

    #[tokio::test]
    async fn should_wrap_malformed_config_body_in_envelope() {
        let app = TestApp::new(vec![]).await;
        let body = serde_json::json!({ "deadStock": { "inactivityThresholdDays": "x" } });

        let response = app
            .send(request(Method::PUT, "/api/lifecycle/config", Some(body)))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        let error = json["error"].as_str().unwrap();
        assert!(error.starts_with("malformed request body"));
        assert!(error.contains("deadStock.inactivityThresholdDays"));

        let current = json_body(
            app.send(request(Method::GET, "/api/lifecycle/config", None))
                .await,
        )
        .await;
        assert_eq!(current["data"]["deadStock"]["inactivityThresholdDays"], 365);
    }

    #[tokio::test]
    async fn should_reject_lookahead_beyond_maximum() {
        let app = TestApp::new(vec![]).await;

        let response = app
            .send(request(
                Method::GET,
                "/api/lifecycle/stats?lookaheadDays=200000000",
                None,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["data"]["field"], "lookaheadDays");
    }

    #[tokio::test]
    async fn should_run_full_cycle_and_report_counts() {
        let stale = asset(400);
        let app = TestApp::new(vec![stale.clone(), dead_stock(100)]).await;

        let response = app
            .send(request(Method::POST, "/api/lifecycle/run?triggeredBy=alice", None))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "completed");
        assert_eq!(json["data"]["triggeredBy"], "alice");
        assert_eq!(json["data"]["counts"]["deadStockMoved"], 1);
        assert_eq!(json["data"]["counts"]["disposalMoved"], 1);
        assert!(json["data"]["runId"].is_string());
        assert_eq!(app.assets.get(stale.id).status, AssetStatus::DeadStock);
    }

    #[tokio::test]
    async fn should_run_single_phase() {
        let stale = asset(400);
        let old = dead_stock(100);
        let app = TestApp::new(vec![stale.clone(), old.clone()]).await;

        let response = app
            .send(request(Method::POST, "/api/lifecycle/disposal", None))
            .await;

        let json = json_body(response).await;
        assert_eq!(json["data"]["phases"], "disposal");
        assert_eq!(app.assets.get(old.id).status, AssetStatus::Disposed);
        assert_eq!(app.assets.get(stale.id).status, AssetStatus::Active);

        let response = app
            .send(request(Method::POST, "/api/lifecycle/dead-stock", None))
            .await;

        let json = json_body(response).await;
        assert_eq!(json["data"]["phases"], "dead_stock");
        assert_eq!(app.assets.get(stale.id).status, AssetStatus::DeadStock);
    }

    #[tokio::test]
    async fn should_return_too_many_requests_during_cooldown() {
        let app = TestApp::with_cooldown(vec![], Duration::from_secs(60)).await;
        let first = app.send(request(Method::POST, "/api/lifecycle/run", None)).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.send(request(Method::POST, "/api/lifecycle/run", None)).await;

        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));
    }

    #[tokio::test]
    async fn should_return_failed_run_summary_on_storage_failure() {
        let app = TestApp::new(vec![asset(400)]).await;
        app.assets.fail_queries();

        let response = app.send(request(Method::POST, "/api/lifecycle/run", None)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["data"]["status"], "failed");
        assert_eq!(json["data"]["error"]["kind"], "storage");
    }

    #[test]
    fn should_ignore_blank_actor() {
        let query = TriggerQuery {
            triggered_by: Some("  ".to_string()),
        };
        assert!(query.actor().is_none());
    }
}
