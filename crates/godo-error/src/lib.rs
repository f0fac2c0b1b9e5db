use axum::{http::StatusCode, response::IntoResponse};
use serde_json::{json, Value};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application error type shared by every HTTP handler.
///
/// Client-facing messages are localized (Turkish) strings; server errors never
/// leak their details and are collapsed to a generic message in the response body.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Serialization Errors =====
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Database & Storage Errors =====
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    // ===== Authentication & Authorization Errors =====
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ===== Validation Errors =====
    #[error("Validation error: {0}")]
    Validation(String),

    /// Text rejected by the content filter; `violations` is echoed to the client.
    #[error("Content rejected: {message}")]
    ContentRejected { message: String, violations: Value },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource conflict: {0}")]
    Conflict(String),

    // ===== Unknown/Generic Errors =====
    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::ContentRejected { .. } => StatusCode::BAD_REQUEST,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-facing error message (without sensitive details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::ContentRejected { message, .. } => message.clone(),
            AppError::Json(_) => "Geçersiz istek gövdesi.".to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::ContentRejected { .. } => "CONTENT_REJECTED",
            AppError::Json(_) => "JSON_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            #[cfg(feature = "redis")]
            AppError::Redis(_) => "REDIS_ERROR",
            AppError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                error = %self,
                error_code = %code,
                "Authentication failed"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            );
        }
    }

    /// JSON body sent to the client for this error
    pub fn response_body(&self) -> Value {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            return json!({
                "error": "Internal server error",
                "error_code": error_code,
                "status": status.as_u16(),
            });
        }

        let mut body = json!({
            "error": self.user_message(),
            "error_code": error_code,
            "status": status.as_u16(),
        });
        if let AppError::ContentRejected { violations, .. } = self {
            body["violations"] = violations.clone();
        }
        body
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();
        (self.status_code(), axum::Json(self.response_body())).into_response()
    }
}

// ============================================================================
// Helper functions for creating common errors
// ============================================================================

impl AppError {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        AppError::Auth(msg.into())
    }

    /// Create a permission error (403)
    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn content_rejected(msg: impl Into<String>, violations: Value) -> Self {
        AppError::ContentRejected {
            message: msg.into(),
            violations,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// Create a conflict error (409)
    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_localized_message() {
        let err = AppError::not_found("Sohbet bulunamadı.");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let body = err.response_body();
        assert_eq!(body["error"], "Sohbet bulunamadı.");
        assert_eq!(body["error_code"], "NOT_FOUND");
        assert_eq!(body["status"], 404);
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::from(anyhow::anyhow!("connection refused to 10.0.0.3:5432"));
        let body = err.response_body();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(!body.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn test_content_rejected_carries_violations() {
        let err = AppError::content_rejected(
            "İçeriğiniz uygunsuz ifadeler içeriyor.",
            json!([{ "type": "email", "matches": ["a@b.co"] }]),
        );
        let body = err.response_body();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body["violations"][0]["type"], "email");
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let err = AppError::conflict("Bu aktiviteye zaten başvurdunuz.");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.response_body()["error"], "Bu aktiviteye zaten başvurdunuz.");
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        let err = AppError::forbidden("Bu işlem için yetkiniz yok.");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), "FORBIDDEN");
    }
}
