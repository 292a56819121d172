//! HTTP endpoints of the tool protocol

use super::AppState;
use crate::auth::AuthInfo;
use crate::error::{AppError, DispatchError};
use crate::mcp::{Manifest, ToolResponse};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::{Map, Value};

/// `POST /mcp`: one JSON-RPC message per request
///
/// The body is taken raw so malformed JSON gets a JSON-RPC parse error
/// rather than an HTTP rejection.
pub async fn rpc(
    State(state): State<AppState>,
    auth: Option<Extension<AuthInfo>>,
    body: String,
) -> Response {
    if let Some(Extension(info)) = &auth {
        tracing::debug!(api_key = %info.api_key_name, "JSON-RPC message");
    }
    match state.mcp.handle_raw(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// `GET /manifest.json`
pub async fn manifest(State(state): State<AppState>) -> Json<Manifest> {
    Json(state.mcp.dispatcher().manifest().clone())
}

/// `POST /tools/:name` with the argument object as body (empty body = no arguments)
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    auth: Option<Extension<AuthInfo>>,
    body: Bytes,
) -> Result<Json<ToolResponse>, AppError> {
    if let Some(Extension(info)) = &auth {
        tracing::debug!(api_key = %info.api_key_name, tool = %name, "Direct tool call");
    }
    let arguments: Map<String, Value> = if body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match serde_json::from_slice::<Value>(&body)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(AppError::InvalidParams(
                    "Request body must be a JSON object of arguments".to_string(),
                ))
            }
        }
    };

    match state.mcp.dispatcher().invoke(&name, &arguments).await {
        Ok(response) => Ok(Json(response)),
        Err(DispatchError::ToolFailed { source, .. }) => Ok(Json(ToolResponse::error(source.to_string()))),
        Err(e) => Err(e.into()),
    }
}
