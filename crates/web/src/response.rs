//! JSON response types for the admin API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use yatube_common::AppError;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    /// Per-field messages for rejected input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(code: impl Into<String>, message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
                fields: None,
            }),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.error.is_some() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::OK
        };
        (status, Json(self)).into_response()
    }
}

/// Empty success response.
#[must_use]
pub fn ok() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// An [`AppError`] rendered as JSON instead of an HTML page.
#[derive(Debug)]
pub struct ApiFailure(pub AppError);

impl From<AppError> for ApiFailure {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = err.status_code();
        if err.is_server_error() {
            tracing::error!(error = %err, code = err.error_code(), "Admin API error");
        }

        let fields = match &err {
            AppError::InvalidForm(errors) => {
                let map: serde_json::Map<String, serde_json::Value> = errors
                    .fields()
                    .map(|field| (field.to_string(), serde_json::json!(errors.get(field))))
                    .collect();
                Some(serde_json::Value::Object(map))
            }
            _ => None,
        };

        let body = ApiResponse::<()> {
            data: None,
            error: Some(ApiError {
                code: err.error_code().to_string(),
                message: err.to_string(),
                fields,
            }),
        };
        (status, Json(body)).into_response()
    }
}

/// Admin API result type.
pub type ApiResult<T> = Result<T, ApiFailure>;
