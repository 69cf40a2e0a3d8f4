//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use assetcycle_domain::error::{AssetCycleError, ValidationError};

use crate::envelope::Envelope;

/// Maps [`AssetCycleError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(AssetCycleError);

impl ApiError {
    /// Rejection for a path segment that is not a valid identifier.
    pub fn invalid_id(raw: &str) -> Self {
        Self(ValidationError::InvalidId(raw.to_string()).into())
    }

    /// Rejection for a JSON body that does not match the expected shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn malformed_body(rejection: JsonRejection) -> Self {
        Self(ValidationError::MalformedBody(rejection.body_text()).into())
    }
}

impl From<AssetCycleError> for ApiError {
    fn from(err: AssetCycleError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, data): (StatusCode, Option<Value>) = match &self.0 {
            AssetCycleError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                err.field().map(|field| json!({ "field": field })),
            ),
            AssetCycleError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            AssetCycleError::AlreadyRunning { run_id } => {
                (StatusCode::CONFLICT, Some(json!({ "runId": run_id })))
            }
            AssetCycleError::CoolingDown { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                Some(json!({ "retryAfterSecs": retry_after_secs })),
            ),
            AssetCycleError::ShuttingDown => (StatusCode::SERVICE_UNAVAILABLE, None),
            AssetCycleError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                let body = Envelope::<Value>::failure("internal server error", None);
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let message = match &self.0 {
            AssetCycleError::Validation(err) => err.to_string(),
            AssetCycleError::NotFound(err) => err.to_string(),
            other => other.to_string(),
        };
        let mut response = (status, Json(Envelope::failure(message, data))).into_response();
        if let AssetCycleError::CoolingDown { retry_after_secs } = self.0 {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
