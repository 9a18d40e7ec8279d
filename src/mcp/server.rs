use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::gateway::config::AuthConfig;
use crate::mcp::auth::require_bearer;
use crate::mcp::cors::{cors_layer, MCP_SESSION_ID};
use crate::mcp::protocol::*;
use crate::mcp::tools::ToolSet;
use crate::utils::metrics::METRICS;

pub const SERVER_NAME: &str = "yalla";

#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<ToolSet>,
    pub auth: Arc<AuthConfig>,
}

/// `/health` and `/metrics` are open; the MCP endpoint (`/mcp`, and `/` for
/// clients configured with the bare URL) sits behind the bearer gate.
pub fn build_router(state: AppState) -> Router {
    let mcp = Router::new()
        .route("/mcp", post(mcp_endpoint))
        .route("/", post(mcp_endpoint))
        .route_layer(middleware::from_fn_with_state(state.auth.clone(), require_bearer))
        .with_state(state.tools.clone());

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/metrics", get(metrics_handler))
        .merge(mcp)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer()),
        )
}

/// McpServer serves the tool set over streamable HTTP (plain JSON responses).
pub struct McpServer {
    state: AppState,
}

impl McpServer {
    pub fn new(tools: ToolSet, auth: AuthConfig) -> Self {
        Self {
            state: AppState {
                tools: Arc::new(tools),
                auth: Arc::new(auth),
            },
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until `shutdown` flips to true; in-flight requests are drained first.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        info!("Starting MCP server on http://{}/mcp", addr);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await?;
        info!("MCP server stopped");
        Ok(())
    }
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.render(),
    )
}

fn rpc_error(status: StatusCode, id: Option<Value>, code: i32, message: &str) -> Response {
    (status, Json(JsonRpcResponse::error(id, JsonRpcError::new(code, message)))).into_response()
}

async fn mcp_endpoint(
    State(tools): State<Arc<ToolSet>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!("unparseable MCP request: {}", e);
            return rpc_error(StatusCode::BAD_REQUEST, None, PARSE_ERROR, "Parse error");
        }
    };
    if payload.is_array() {
        return rpc_error(StatusCode::OK, None, INVALID_REQUEST, "Batch requests are not supported");
    }

    let id = payload.get("id").cloned();
    let req: JsonRpcRequest = match serde_json::from_value(payload) {
        Ok(r) => r,
        Err(e) => {
            let message = format!("Invalid request: {}", e);
            return rpc_error(StatusCode::OK, id, INVALID_REQUEST, &message);
        }
    };
    if req.jsonrpc != JSONRPC_VERSION {
        let message = "Invalid request: jsonrpc must be \"2.0\"";
        return rpc_error(StatusCode::OK, req.id, INVALID_REQUEST, message);
    }

    if req.is_notification() {
        info!(method = %req.method, "MCP notification received");
        return StatusCode::ACCEPTED.into_response();
    }

    let session_id = headers
        .get(&MCP_SESSION_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    info!(
        method = %req.method,
        session_id = %session_id,
        has_params = req.params.is_some(),
        "MCP method started"
    );

    let started = Instant::now();
    let outcome = dispatch(&tools, &req).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            info!(
                method = %req.method,
                session_id = %session_id,
                duration_ms,
                "MCP method completed"
            );
            let mut resp = Json(JsonRpcResponse::result(req.id, result)).into_response();
            if req.method == "initialize" {
                let new_session = uuid::Uuid::new_v4().to_string();
                if let Ok(v) = HeaderValue::from_str(&new_session) {
                    resp.headers_mut().insert(MCP_SESSION_ID, v);
                }
            }
            resp
        }
        Err(err) => {
            error!(
                method = %req.method,
                session_id = %session_id,
                duration_ms,
                code = err.code,
                message = %err.message,
                "MCP method failed"
            );
            Json(JsonRpcResponse::error(req.id, err)).into_response()
        }
    }
}

async fn dispatch(tools: &ToolSet, req: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
    match req.method.as_str() {
        "initialize" => {
            let params: InitializeParams = params_or_default(req.params.as_ref())?;
            if let Some(client) = &params.client_info {
                info!(client = %client.name, version = %client.version, "MCP client connected");
            }
            let server_info = Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
            };
            to_result(InitializeResult::negotiate(params.protocol_version.as_deref(), server_info))
        }
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tools.definitions() })),
        "tools/call" => {
            let params: CallToolParams = match req.params.as_ref() {
                Some(p) => parse_params(p)?,
                None => return Err(JsonRpcError::new(INVALID_PARAMS, "missing params")),
            };
            info!(
                tool = %params.name,
                args = %params.arguments.as_ref().map(|a| a.to_string()).unwrap_or_default(),
                "Calling tool"
            );
            let result = tools
                .call(&params.name, params.arguments)
                .await
                .map_err(|e| JsonRpcError::new(INVALID_PARAMS, e.to_string()))?;
            to_result(result)
        }
        other => Err(JsonRpcError::new(METHOD_NOT_FOUND, format!("Method not found: {}", other))),
    }
}

fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params.clone())
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("invalid params: {}", e)))
}

fn params_or_default<T: DeserializeOwned + Default>(
    params: Option<&Value>,
) -> Result<T, JsonRpcError> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(p) => parse_params(p),
    }
}

fn to_result<T: Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smarthome::testing::FakeCaller;
    use crate::smarthome::SmartHome;

    fn tools() -> ToolSet {
        ToolSet::new(SmartHome::new(FakeCaller::new()), "")
    }

    fn request(v: Value) -> JsonRpcRequest {
        serde_json::from_value(v).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_ping_and_list() {
        let t = tools();
        let r = dispatch(&t, &request(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))).await;
        assert_eq!(r.unwrap(), json!({}));

        let r = dispatch(&t, &request(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})))
            .await
            .unwrap();
        assert_eq!(r["tools"].as_array().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_dispatch_initialize_without_params() {
        let req = request(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}));
        let r = dispatch(&tools(), &req).await.unwrap();
        assert_eq!(r["protocolVersion"], LATEST_PROTOCOL_VERSION);
        assert_eq!(r["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(r["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_dispatch_errors() {
        let t = tools();
        let req = request(json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}));
        let err = dispatch(&t, &req).await.unwrap_err();
        assert_eq!(err.code, METHOD_NOT_FOUND);

        let err = dispatch(&t, &request(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call"})))
            .await
            .unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);

        let req = request(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "nope"}
        }));
        let err = dispatch(&t, &req).await.unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
        assert_eq!(err.message, "Unknown tool: nope");
    }
}
