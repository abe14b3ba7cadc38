use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::TravelAdviserError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: &'static str,
    detail: String,
}

/// Error returned by HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    /// 400, the request itself is unusable
    BadRequest(String),
    /// 502, the store or the language model failed
    Upstream(String),
    /// 503, a dependency is not ready
    ServiceUnavailable(String),
    /// 500
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            Self::BadRequest(detail)
            | Self::Upstream(detail)
            | Self::ServiceUnavailable(detail)
            | Self::Internal(detail) => detail,
        };

        (status, Json(ErrorBody { kind: "error", detail })).into_response()
    }
}

impl From<TravelAdviserError> for ApiError {
    fn from(err: TravelAdviserError) -> Self {
        if err.is_upstream() {
            error!("Request failed: {}", err);
        } else {
            warn!("Request rejected: {}", err);
        }

        match &err {
            TravelAdviserError::Validation { .. } => Self::BadRequest(err.user_message()),
            _ if err.is_upstream() => Self::Upstream(err.user_message()),
            _ => Self::Internal(err.user_message()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self::BadRequest(rejection.body_text())
    }
}
