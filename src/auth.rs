use crate::{config::Config, error::AppError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Authentication information attached to each authenticated request
#[derive(Debug, Clone)]
pub struct AuthInfo {
    /// Name of the API key used for authentication
    pub api_key_name: String,
}

/// Authentication middleware
///
/// Passes everything through when `auth.enabled` is false. Keys are read
/// from the hot-reloadable config on every request.
pub async fn auth_middleware(
    State(config): State<Arc<arc_swap::ArcSwap<Config>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let config = config.load_full();

    if !config.auth.enabled {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = extract_bearer_token(auth_header)?;

    // No early exit: every enabled key is compared
    let mut matched = None;
    for key in config.auth.api_keys.iter().filter(|k| k.enabled) {
        if bool::from(key.key.as_bytes().ct_eq(token.as_bytes())) {
            matched = Some(key.name.clone());
        }
    }

    let api_key_name =
        matched.ok_or_else(|| AppError::Unauthorized("Invalid or disabled API key".to_string()))?;

    tracing::debug!(api_key = %api_key_name, "Request authenticated");
    req.extensions_mut().insert(AuthInfo { api_key_name });

    Ok(next.run(req).await)
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Result<&str, AppError> {
    const BEARER_PREFIX: &str = "Bearer ";

    let token = auth_header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        AppError::Unauthorized("Authorization header must use Bearer scheme".to_string())
    })?;

    if token.is_empty() {
        return Err(AppError::Unauthorized("Bearer token is empty".to_string()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKeyConfig, AuthConfig};
    use arc_swap::ArcSwap;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_extract_bearer_token_success() {
        let token = extract_bearer_token("Bearer sk-test-key-123").unwrap();
        assert_eq!(token, "sk-test-key-123");
    }

    #[test]
    fn test_extract_bearer_token_missing_prefix() {
        assert!(extract_bearer_token("sk-test-key-123").is_err());
    }

    #[test]
    fn test_extract_bearer_token_empty() {
        assert!(extract_bearer_token("Bearer ").is_err());
    }

    fn create_test_config(enabled: bool) -> Config {
        Config {
            auth: AuthConfig {
                enabled,
                api_keys: vec![
                    ApiKeyConfig {
                        key: "tk-001".to_string(),
                        name: "assistant".to_string(),
                        enabled: true,
                    },
                    ApiKeyConfig {
                        key: "tk-002".to_string(),
                        name: "revoked".to_string(),
                        enabled: false,
                    },
                ],
            },
            ..Default::default()
        }
    }

    fn app(config: Config) -> Router {
        let swap = Arc::new(ArcSwap::from_pointee(config));
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(swap, auth_middleware))
    }

    async fn status_with(config: Config, header: Option<&str>) -> StatusCode {
        let mut request = axum::http::Request::builder().uri("/");
        if let Some(value) = header {
            request = request.header("Authorization", value);
        }

        app(config)
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_valid_key_passes() {
        let status = status_with(create_test_config(true), Some("Bearer tk-001")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_or_wrong_key_rejected() {
        assert_eq!(status_with(create_test_config(true), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_with(create_test_config(true), Some("Bearer nope")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_with(create_test_config(true), Some("Bearer tk-002")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_disabled_auth_passes_everything() {
        assert_eq!(status_with(create_test_config(false), None).await, StatusCode::OK);
    }
}
