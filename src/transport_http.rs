use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::DispatchError;
use crate::server::Server;
use crate::types::{McpResponse, PROTOCOL_VERSION};

/// Create an Axum router for the MCP server.
pub fn http_router(server: Server) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/healthz", get(handle_healthz))
        .route("/", get(handle_index))
        .with_state(Arc::new(server))
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    server: Server,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, http_router(server))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handle_healthz() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn handle_index(State(server): State<Arc<Server>>) -> impl IntoResponse {
    let tools: Vec<&str> = server.registry().names().collect();
    Json(json!({
        "name": server.name(),
        "version": server.version(),
        "protocolVersion": PROTOCOL_VERSION,
        "endpoints": {"mcp": "POST /mcp", "health": "GET /healthz"},
        "tools": tools,
    }))
}

async fn handle_mcp(State(server): State<Arc<Server>>, body: Bytes) -> Response {
    let payload = body.clone();
    let worker = Arc::clone(&server);
    let resp = match tokio::spawn(async move { worker.handle_bytes(&payload).await }).await {
        Ok(resp) => resp,
        Err(e) => McpResponse::error(peek_id(&body), DispatchError::internal(e)),
    };

    // Notification: return 202 with no body.
    if resp.is_acknowledgement() {
        return (StatusCode::ACCEPTED, Body::empty()).into_response();
    }

    let status = match resp.error_kind() {
        None => StatusCode::OK,
        Some(kind) if kind.is_client_error() => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::debug!(status = status.as_u16(), "mcp request handled");

    (status, Json(&resp)).into_response()
}

// Best-effort id recovery when handling aborted.
fn peek_id(body: &[u8]) -> Option<Value> {
    #[derive(Deserialize)]
    struct IdOnly {
        #[serde(default)]
        id: Option<Value>,
    }
    serde_json::from_slice::<IdOnly>(body).ok().and_then(|p| p.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FnToolHandler, ParamSpec, ParamType, Tool, ToolRegistry, ToolSchema};
    use crate::tools;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let registry = tools::builtin_registry().unwrap();
        let srv = Server::builder()
            .registry(Arc::new(registry))
            .server_info("test", "0.1")
            .build()
            .unwrap();
        http_router(srv)
    }

    fn post_mcp(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    fn json_body(body: Value) -> Body {
        Body::from(serde_json::to_vec(&body).unwrap())
    }

    async fn read_json(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_router();
        let req = Request::builder()
            .method("GET")
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_json(resp).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_index_lists_tools() {
        let app = test_router();
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["name"], "test");
        assert_eq!(body["tools"][0], "add");
    }

    #[tokio::test]
    async fn test_tool_call_success() {
        let app = test_router();
        let body = json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "add", "arguments": {"a": 15, "b": 27}}
        });
        let resp = app.oneshot(post_mcp(json_body(body))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["content"][0]["text"], "Result: 42");
    }

    #[tokio::test]
    async fn test_notification_returns_202_without_body() {
        let app = test_router();
        let body = json!({"method": "notifications/initialized"});
        let resp = app.oneshot(post_mcp(json_body(body))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_notification_with_numeric_version_tag_returns_202() {
        let app = test_router();
        let resp = app
            .oneshot(post_mcp(r#"{"jsonrpc":2.0,"method":"notifications/initialized"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_validation_error_is_client_error() {
        let app = test_router();
        let body = json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "add", "arguments": {"a": "x", "b": 1}}
        });
        let resp = app.oneshot(post_mcp(json_body(body))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = read_json(resp).await;
        assert_eq!(body["id"], 3);
        assert_eq!(body["error"]["code"], -32602);
        assert!(body.get("result").is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let app = test_router();
        let resp = app.oneshot(post_mcp("{bad json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = read_json(resp).await;
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_panicking_tool_is_internal_error() {
        let tool = Tool::new(
            "explode",
            "always panics",
            ToolSchema::new().param(ParamSpec::new("x", ParamType::Number)),
        );
        let registry = ToolRegistry::builder()
            .tool(
                tool,
                FnToolHandler::new(|_args: Value| async move {
                    if true {
                        panic!("secret detail");
                    }
                    Ok(Value::Null)
                }),
            )
            .build()
            .unwrap();
        let srv = Server::builder()
            .registry(Arc::new(registry))
            .build()
            .unwrap();
        let body = json!({
            "jsonrpc": "2.0", "id": 11, "method": "tools/call",
            "params": {"name": "explode", "arguments": {}}
        });
        let resp = http_router(srv)
            .oneshot(post_mcp(json_body(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(resp).await;
        assert_eq!(body["id"], 11);
        assert_eq!(body["error"]["code"], -32603);
        assert_eq!(body["error"]["message"], "Internal error");
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let app = test_router();
        let req = Request::builder()
            .method("GET")
            .uri("/mcp")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_peek_id() {
        assert_eq!(peek_id(br#"{"id":7,"method":"x"}"#), Some(json!(7)));
        assert_eq!(peek_id(b"garbage"), None);
    }
}
