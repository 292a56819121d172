use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// HTTP-facing application error types
#[derive(Debug)]
pub enum AppError {
    /// Authentication error
    Unauthorized(String),
    /// Unknown tool name
    ToolNotFound(String),
    /// Malformed request body or arguments
    InvalidParams(String),
    /// Internal server error
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::ToolNotFound(name) => write!(f, "Tool not found: {}", name),
            Self::InvalidParams(msg) => write!(f, "Invalid params: {}", msg),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ToolNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidParams(_) => StatusCode::BAD_REQUEST,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type_name(&self),
            }
        }));

        (status, body).into_response()
    }
}

fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::Unauthorized(_) => "unauthorized",
        AppError::ToolNotFound(_) => "tool_not_found",
        AppError::InvalidParams(_) => "invalid_params",
        AppError::InternalError(_) => "internal_error",
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidParams(format!("JSON error: {}", err))
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::ToolNotFound(name) => Self::ToolNotFound(name),
            other => Self::InternalError(other.to_string()),
        }
    }
}

/// Handler-level failure of a single tool call
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },
}

impl ToolError {
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Failure to dispatch a tool call
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool '{tool}' failed: {source}")]
    ToolFailed {
        tool: String,
        #[source]
        source: ToolError,
    },

    #[error("Tool '{0}' panicked")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AppError::ToolNotFound("bogus".to_string());
        assert_eq!(error.to_string(), "Tool not found: bogus");
    }

    #[test]
    fn test_error_type_name() {
        assert_eq!(error_type_name(&AppError::Unauthorized("test".to_string())), "unauthorized");
        assert_eq!(error_type_name(&AppError::ToolNotFound("test".to_string())), "tool_not_found");
    }

    #[test]
    fn test_tool_error_display() {
        let error = ToolError::invalid("limit", "expected an integer");
        assert_eq!(error.to_string(), "Invalid argument 'limit': expected an integer");
    }

    #[tokio::test]
    async fn test_error_response() {
        let error = AppError::Unauthorized("Invalid API key".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dispatch_not_found_maps_to_404() {
        let error: AppError = DispatchError::ToolNotFound("nope".to_string()).into();
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }
}
