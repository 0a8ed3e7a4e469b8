use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::fmt::Display;

/// JSON error body returned by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub http_status: StatusCode,
    /// Numeric status, repeated in the body.
    pub status: u16,
    /// User-level status text.
    pub error: String,
    /// Application-specific code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Application-level message, for debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    fn new(http_status: StatusCode, error: &str, message: Option<String>) -> Self {
        Self {
            http_status,
            status: http_status.as_u16(),
            error: error.to_string(),
            code: None,
            message,
        }
    }

    pub fn invalid_request(err: impl Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid request.", Some(err.to_string()))
    }

    pub fn render(err: impl Display) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Error rendering response.",
            Some(err.to_string()),
        )
    }

    pub fn internal(err: impl Display) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error.",
            Some(err.to_string()),
        )
    }

    pub fn not_authorized(err: impl Display) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Invalid credentials", Some(err.to_string()))
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Resource not found.", None)
    }

    pub fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "Forbidden.",
            Some("You do not have permission to access this resource.".to_string()),
        )
    }

    pub fn duplicate_contact() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "Duplicate contact.",
            Some("A contact with same name already exists.".to_string()),
        )
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.http_status, Json(self)).into_response()
    }
}

pub async fn not_found_handler() -> ApiError {
    ApiError::not_found()
}
