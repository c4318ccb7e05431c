//! Error handling for the Folio HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_db::StoreError;
use serde_json::{json, Value};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<Value>,
        code: String,
        message: String,
    },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String, code: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String, code: String },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    /// A write failed after its preconditions held. Reported verbatim.
    #[error("operation failed: {message}")]
    Operation { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(details: Vec<Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            code: "rest_invalid_param".to_string(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            code: "rest_unauthorized".to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            code: "rest_forbidden".to_string(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "rest_not_found".to_string(),
        }
    }

    /// No route and method pair matches the request.
    pub fn no_route() -> Self {
        Self::not_found("No route was found matching the URL and request method.")
            .with_code("rest_no_route")
    }

    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
            code: "rest_operation_failed".to_string(),
        }
    }

    /// Replace the machine-readable error code. Internal errors keep theirs.
    pub fn with_code(mut self, new_code: impl Into<String>) -> Self {
        match &mut self {
            AppError::Validation { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Operation { code, .. } => *code = new_code.into(),
            AppError::Internal(_) => {}
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Operation { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &str {
        match self {
            AppError::Validation { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Operation { code, .. } => code,
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => {
                AppError::not_found(err.to_string()).with_code("rest_post_not_found")
            }
            StoreError::Invalid { field, ref reason } => AppError::validation(
                vec![json!({ "field": field, "error": reason })],
                err.to_string(),
            ),
            StoreError::Backend(_) => AppError::operation(err.to_string()),
            StoreError::UnknownType(_) => AppError::Internal(err.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let status = self.status();
        let error_code = self.code().to_string();

        let (message, details) = match self {
            AppError::Validation {
                details, message, ..
            } => (message, details),
            AppError::Unauthorized { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Operation { message, .. } => (message, Vec::new()),
            AppError::Internal(e) => {
                tracing::error!(error_id = %error_id, error = ?e, "internal error");
                // Internal failures are not caller-facing in release builds.
                let message = if cfg!(debug_assertions) {
                    e.to_string()
                } else {
                    "An internal server error occurred".to_string()
                };
                (message, Vec::new())
            }
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                "request failed"
            );
        } else {
            tracing::debug!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                "request rejected"
            );
        }

        let body = json!({
            "code": error_code,
            "message": message,
            "data": {
                "status": status.as_u16(),
                "details": details,
            },
            "trace_id": error_id.to_string(),
            "timestamp": timestamp,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error() {
        let details = vec![json!({"field": "title", "error": "required"})];
        let error = AppError::validation(details.clone(), "Title is required.")
            .with_code("rest_missing_title");

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.code(), "rest_missing_title");
        match error {
            AppError::Validation { details: d, .. } => assert_eq!(d, details),
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn test_error_response_mapping() {
        assert_eq!(
            AppError::not_found("missing").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::forbidden("no").into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::operation("boom").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_mapping() {
        let error = AppError::Internal(anyhow::anyhow!("Database connection failed"));
        assert_eq!(error.code(), "internal_error");
        assert_eq!(
            error.with_code("ignored").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_map_to_http_errors() {
        assert_eq!(
            AppError::from(StoreError::NotFound(3)).code(),
            "rest_post_not_found"
        );
        assert_eq!(
            AppError::from(StoreError::Backend("disk full".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(StoreError::Invalid {
                field: "title",
                reason: "empty".into()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let response = AppError::operation("Failed to delete the book.")
            .with_code("rest_delete_failed")
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "rest_delete_failed");
        assert_eq!(body["message"], "Failed to delete the book.");
        assert_eq!(body["data"]["status"], 500);
        assert!(Uuid::parse_str(body["trace_id"].as_str().unwrap()).is_ok());
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
