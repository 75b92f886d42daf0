//! Mapping from engine errors to HTTP responses.

use crate::dto::ErrorRes;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use careguard_core::{CareError, ErrorKind};

/// An engine error on its way out as `{code, message, details?}`.
#[derive(Debug)]
pub struct ApiError(pub CareError);

impl From<CareError> for ApiError {
    fn from(err: CareError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(CareError::invalid_format(format!(
            "invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// `Json` extractor whose rejections use the engine error body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// HTTP status for an engine error.
pub fn status_for(err: &CareError) -> StatusCode {
    if let CareError::NotFound { .. } = err {
        return StatusCode::NOT_FOUND;
    }

    match err.kind() {
        kind if kind.is_validation() => StatusCode::BAD_REQUEST,
        kind if kind.is_system() => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::BusinessJustificationRequired => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::CONFLICT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!("Engine error: {:?}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }

        let body = ErrorRes {
            code: self.0.kind().to_string(),
            message: self.0.to_string(),
            details: self.0.details(),
        };
        (status, Json(body)).into_response()
    }
}
