//! MCP router end to end: bearer gate, JSON-RPC framing, tools hitting a fake cloud.

mod support;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use support::FakeCloud;
use yalla::gateway::config::{AuthConfig, RemoteConfig};
use yalla::mcp::{McpServer, ToolSet};
use yalla::{DeviceIdentity, SignedRpcClient, SmartHome};

const TOKEN: &str = "test-token";

async fn router(cloud: &FakeCloud, auth: AuthConfig) -> Router {
    let remote = RemoteConfig {
        base_url: cloud.base_url.clone(),
        api_key: "key-1".to_string(),
        timeout_secs: 5,
    };
    let identity = Arc::new(DeviceIdentity::new("mcp0.test-device", "s3cret"));
    let client = SignedRpcClient::new(&remote, identity).unwrap();
    let tools = ToolSet::new(SmartHome::new(Arc::new(client)), "");
    McpServer::new(tools, auth).router()
}

fn rpc(path: &str, token: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(body.into()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn call(app: &Router, message: Value) -> Value {
    let (status, _, body) = send(app, rpc("/mcp", Some(TOKEN), message.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

fn tool_call(id: u64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
}

#[tokio::test]
async fn test_health_is_open() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_missing_or_wrong_token_rejected() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;
    let ping = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string();

    let (status, headers, body) = send(&app, rpc("/mcp", None, ping.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    assert_eq!(body, b"invalid api key");

    let (status, _, _) = send(&app, rpc("/mcp", Some("nope"), ping.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, rpc("/", Some("nope"), ping)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unset_token_rejects_everything() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::default()).await;
    let ping = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string();
    let req = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::AUTHORIZATION, "Bearer ")
        .body(Body::from(ping))
        .unwrap();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_disabled_auth_is_open() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::disabled()).await;
    let ping = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string();
    let (status, _, body) = send(&app, rpc("/mcp", None, ping)).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v, json!({"jsonrpc": "2.0", "result": {}, "id": 1}));
}

#[tokio::test]
async fn test_initialize_opens_session() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;
    let init = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "inspector", "version": "1.0"}
        }
    });
    let (status, headers, body) = send(&app, rpc("/mcp", Some(TOKEN), init.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    let session = headers.get("mcp-session-id").unwrap().to_str().unwrap();
    assert!(!session.is_empty());

    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["id"], 1);
    assert_eq!(v["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(v["result"]["serverInfo"]["name"], "yalla");
    assert!(v["result"]["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn test_tools_list() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;
    let v = call(&app, json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"})).await;
    let names: Vec<&str> = v["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "list_homes",
            "switch_home",
            "list_device_control_buttons",
            "push_device_control_button",
            "query_devices",
            "query_device_status",
            "control_devices",
            "configure_automation",
            "query_device_logs",
        ]
    );
    assert_eq!(v["id"], "a");
}

#[tokio::test]
async fn test_blank_home_name_never_reaches_cloud() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;
    let v = call(&app, tool_call(2, "switch_home", json!({"name": "  "}))).await;
    assert_eq!(v["result"]["isError"], true);
    assert_eq!(v["result"]["content"][0]["text"], "Home name cannot be empty");
    assert!(cloud.requests().is_empty());
}

#[tokio::test]
async fn test_push_button_forwards_signed_call() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;
    let v = call(&app, tool_call(3, "push_device_control_button", json!({"button": 5}))).await;
    assert_eq!(v["result"]["isError"], false);
    assert_eq!(v["result"]["content"][0]["text"], "Scene executed successfully");

    let req = cloud.last();
    assert_eq!(req.path, "/echo/call");
    assert!(!req.header("x-signature").unwrap().is_empty());
    let body = req.json();
    assert_eq!(body["fn"], "RunScenes");
    assert_eq!(body["params"], json!({"scenes": [5]}));
}

#[tokio::test]
async fn test_list_homes_and_remote_error() {
    let cloud = FakeCloud::start().await;
    cloud
        .reply_json(json!({"code": 0, "result": ["My Home", "Cabin"]}))
        .reply_json(json!({"code": 1001, "message": "token expired"}));
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;

    let v = call(&app, tool_call(4, "list_homes", json!({}))).await;
    assert_eq!(
        v["result"]["content"],
        json!([{"type": "text", "text": "My Home"}, {"type": "text", "text": "Cabin"}])
    );

    let v = call(&app, tool_call(5, "query_devices", json!({"positions": ["Kitchen"]}))).await;
    assert_eq!(v["result"]["isError"], true);
    assert_eq!(v["result"]["content"][0]["text"], "token expired");
}

#[tokio::test]
async fn test_success_without_result_is_not_a_failure() {
    let cloud = FakeCloud::start().await;
    cloud
        .reply_json(json!({"code": 0, "message": "ok"}))
        .reply_json(json!({"code": 0, "result": null}));
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;

    let v = call(&app, tool_call(6, "switch_home", json!({"name": "My Home"}))).await;
    assert_eq!(v["result"]["isError"], false);
    assert_eq!(
        v["result"]["content"][0]["text"],
        "Successfully switched to home \"My Home\""
    );

    let v = call(&app, tool_call(7, "list_homes", json!({}))).await;
    assert_eq!(v["result"]["isError"], false);
    assert_eq!(v["result"]["content"][0]["text"], "No homes found.");
}

#[tokio::test]
async fn test_bare_root_path_serves_mcp() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;
    let ping = json!({"jsonrpc": "2.0", "id": 9, "method": "ping"}).to_string();
    let (status, _, _) = send(&app, rpc("/", Some(TOKEN), ping)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_jsonrpc_framing_errors() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;

    let (status, _, body) = send(&app, rpc("/mcp", Some(TOKEN), "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["error"]["code"], -32700);

    let v = call(&app, json!({"jsonrpc": "2.0", "id": 1, "method": "prompts/list"})).await;
    assert_eq!(v["error"]["code"], -32601);

    let v = call(&app, json!([{"jsonrpc": "2.0", "id": 1, "method": "ping"}])).await;
    assert_eq!(v["error"]["code"], -32600);

    let v = call(&app, tool_call(1, "push_device_control_button", json!({}))).await;
    assert_eq!(v["error"]["code"], -32602);
}

#[tokio::test]
async fn test_notification_accepted() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;
    let note = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
    let (status, _, body) = send(&app, rpc("/mcp", Some(TOKEN), note)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_cors_preflight_mirrors_origin() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/mcp")
        .header(header::ORIGIN, "http://localhost:6274")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type,mcp-session-id")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, req).await;
    assert!(status.is_success());
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:6274"
    );
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
}

#[tokio::test]
async fn test_metrics_count_tool_calls() {
    let cloud = FakeCloud::start().await;
    let app = router(&cloud, AuthConfig::with_token(TOKEN)).await;
    call(&app, tool_call(1, "list_device_control_buttons", json!({}))).await;

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("yalla_tool_calls_total"));
    assert!(text.contains("yalla_rpc_calls_total"));
}
