use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use axum::{extract::DefaultBodyLimit, middleware, routing::{get, post}, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    auth,
    config::Config,
    handlers::{self, AppState},
    mcp::{Dispatcher, McpService, ServerInfo, TracingTelemetry},
    metrics,
    signals::setup_signal_handlers,
    store::{spawn_retention_task, EntryStore, RetentionConfig, SqliteEntryStore},
    tools,
};

/// Request bodies are argument objects; anything larger is refused
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the dispatcher with every tool registered over `store`
pub fn create_dispatcher(config: &Config, store: Arc<SqliteEntryStore>) -> Arc<Dispatcher> {
    let info = ServerInfo {
        name: config.mcp.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: config.mcp.description.clone(),
    };
    let store: Arc<dyn EntryStore> = store;
    let registry = tools::build_registry(store);

    Arc::new(Dispatcher::new(info, registry, Arc::new(TracingTelemetry)))
}

/// Start the HTTP front door
///
/// This function:
/// 1. Opens the entry database (running migrations)
/// 2. Initializes metrics when enabled
/// 3. Sets up signal handlers for graceful shutdown and config reload
/// 4. Spawns the retention task when enabled
/// 5. Serves requests until a shutdown signal arrives
pub async fn start_server(config: Config, config_path: PathBuf) -> Result<()> {
    let store = Arc::new(
        SqliteEntryStore::connect(&config.database)
            .await
            .with_context(|| format!("Failed to open entry database {}", config.database.url))?,
    );

    let metrics_handle = if config.metrics.enabled {
        info!("Initializing Prometheus metrics...");
        Some((config.metrics.endpoint.clone(), Arc::new(metrics::init_metrics()?)))
    } else {
        None
    };

    // Wrap config in ArcSwap so SIGHUP can swap API keys in place
    let config_swap = Arc::new(ArcSwap::from_pointee(config.clone()));

    let (shutdown_tx, signal_handle) = setup_signal_handlers(config_swap.clone(), config_path)?;
    let mut shutdown_rx = shutdown_tx.subscribe();

    let retention_handle = if config.retention.enabled {
        let retention_store: Arc<dyn EntryStore> = store.clone();
        Some(spawn_retention_task(
            retention_store,
            RetentionConfig::from(&config.retention),
            shutdown_tx.subscribe(),
        ))
    } else {
        None
    };

    let dispatcher = create_dispatcher(&config, store.clone());
    let tool_count = dispatcher.tool_names().len();
    let state = AppState {
        mcp: McpService::new(dispatcher),
        store,
    };

    let app = create_router(config_swap, state, metrics_handle);

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .with_context(|| format!("Invalid server.host: {}", config.server.host))?,
        config.server.port,
    ));

    info!(
        address = %addr,
        tools = tool_count,
        auth = config.auth.enabled,
        retention = config.retention.enabled,
        "Starting {}",
        config.mcp.name
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    if let Some(handle) = retention_handle {
        handle.await?;
    }
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
///
/// Only `/health` is public; everything else passes the bearer-token check
/// (a no-op while `auth.enabled` is false).
pub fn create_router(
    config: Arc<ArcSwap<Config>>,
    state: AppState,
    metrics: Option<(String, Arc<PrometheusHandle>)>,
) -> Router {
    let mut protected = Router::new()
        .route("/ready", get(handlers::health::readiness_check))
        .route("/manifest.json", get(handlers::mcp::manifest))
        .route("/mcp", post(handlers::mcp::rpc))
        .route("/tools/:name", post(handlers::mcp::call_tool))
        .with_state(state);

    if let Some((endpoint, handle)) = metrics {
        protected = protected.merge(
            Router::new()
                .route(&endpoint, get(handlers::metrics_handler::metrics))
                .with_state(handle),
        );
    }

    let protected = protected.layer(middleware::from_fn_with_state(config, auth::auth_middleware));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKeyConfig;
    use crate::handlers::tests::test_state;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn app_with(config: Config) -> Router {
        let state = test_state().await;
        create_router(Arc::new(ArcSwap::from_pointee(config)), state, None)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn auth_config() -> Config {
        let mut config = Config::default();
        config.auth.enabled = true;
        config.auth.api_keys = vec![ApiKeyConfig {
            key: "secret-token".to_string(),
            name: "assistant".to_string(),
            enabled: true,
        }];
        config
    }

    #[tokio::test]
    async fn test_create_dispatcher_registers_all_tools() {
        let state = test_state().await;
        let dispatcher = state.mcp.dispatcher();
        assert_eq!(dispatcher.tool_names().len(), 19);
        assert!(dispatcher.has("requests"));
        assert!(dispatcher.has("prune"));
        assert_eq!(dispatcher.info().name, "telescope-mcp");
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = app_with(Config::default()).await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_manifest_route_lists_tools() {
        let app = app_with(Config::default()).await;
        let response = app
            .oneshot(Request::builder().uri("/manifest.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let manifest = body_json(response).await;
        assert_eq!(manifest["tools"].as_array().unwrap().len(), 19);
        assert!(manifest["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_mcp_route_answers_tools_list() {
        let app = app_with(Config::default()).await;
        let response = app
            .oneshot(post_json("/mcp", r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 19);
    }

    #[tokio::test]
    async fn test_mcp_route_accepts_notifications() {
        let app = app_with(Config::default()).await;
        let response = app
            .oneshot(post_json("/mcp", r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_mcp_route_parse_error() {
        let app = app_with(Config::default()).await;
        let response = app.oneshot(post_json("/mcp", "{not json")).await.unwrap();

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32700);
        assert!(body["id"].is_null());
    }

    #[tokio::test]
    async fn test_tool_route_calls_tool() {
        let app = app_with(Config::default()).await;
        let response = app.oneshot(post_json("/tools/queries", "{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["isError"], false);
        assert!(body["content"][0]["text"].as_str().unwrap().contains("No queries found"));
    }

    #[tokio::test]
    async fn test_tool_route_empty_body() {
        let app = app_with(Config::default()).await;
        let response = app.oneshot(post_json("/tools/logs", "")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tool_route_unknown_tool() {
        let app = app_with(Config::default()).await;
        let response = app.oneshot(post_json("/tools/nope", "{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tool_route_rejects_array_body() {
        let app = app_with(Config::default()).await;
        let response = app.oneshot(post_json("/tools/logs", "[1, 2]")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_auth_required_when_enabled() {
        let app = app_with(auth_config()).await;
        let response = app
            .oneshot(Request::builder().uri("/manifest.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_accepts_configured_key() {
        let app = app_with(auth_config()).await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/manifest.json")
                    .header(header::AUTHORIZATION, "Bearer secret-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_stays_public_with_auth() {
        let app = app_with(auth_config()).await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_route_when_enabled() {
        let state = test_state().await;
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = Arc::new(recorder.handle());
        let app = create_router(
            Arc::new(ArcSwap::from_pointee(Config::default())),
            state,
            Some(("/metrics".to_string(), handle)),
        );

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
