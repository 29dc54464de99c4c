use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{DispatchError, ErrorKind};

/// JSON-RPC version tag every request must carry.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP Protocol version this server implements.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

// ── Request ──

/// Inbound message as delivered by a transport.
///
/// Every field is optional so that the classifier, not the decoder, decides
/// what a message is. `jsonrpc` is kept raw: only requests must carry the
/// `"2.0"` string. `id` distinguishes an explicit `null` (`Some(Value::Null)`)
/// from an absent member (`None`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// A request carrying `id`.
    pub fn request(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        JsonRpcRequest {
            jsonrpc: Some(Value::from(JSONRPC_VERSION)),
            id: Some(id.into()),
            method: Some(method.into()),
            params,
        }
    }

    /// A notification (no `id`).
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        JsonRpcRequest {
            jsonrpc: Some(Value::from(JSONRPC_VERSION)),
            id: None,
            method: Some(method.into()),
            params,
        }
    }
}

// A present member always deserializes to `Some`, even when it is `null`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ── Response ──

/// Outcome of [`Server::handle()`](crate::Server::handle): either a response
/// envelope or a bodiless acknowledgement.
///
/// For cached endpoints (`initialize`, `tools/list`) the result is
/// pre-serialized JSON shared via `Arc`, so answering them copies no data.
///
/// Implements [`Serialize`] so you can pass it directly to your HTTP
/// framework (e.g. `axum::Json(&resp)`). Transports must check
/// [`is_acknowledgement()`](McpResponse::is_acknowledgement) first and send
/// no body in that case.
///
/// For structured inspection (e.g. in tests), call
/// [`into_json_rpc()`](McpResponse::into_json_rpc).
#[derive(Debug)]
pub struct McpResponse {
    id: Option<Value>,
    kind: ResponseKind,
}

#[derive(Debug)]
enum ResponseKind {
    /// Pre-serialized result.
    Cached(Arc<RawValue>),
    /// Dynamically constructed result.
    Result(Value),
    /// Error.
    Error(ErrorKind, RpcError),
    /// Notification processed, no body.
    Acknowledgement,
}

impl McpResponse {
    /// True when the message was a notification (no response body).
    pub fn is_acknowledgement(&self) -> bool {
        matches!(self.kind, ResponseKind::Acknowledgement)
    }

    /// The echoed request id, or `None` for acknowledgements and for errors
    /// raised before an id could be read.
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// The error kind when this is an error envelope.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.kind {
            ResponseKind::Error(kind, _) => Some(kind),
            _ => None,
        }
    }

    /// Convert to a [`JsonRpcResponse`] for structured inspection.
    ///
    /// Returns `None` for acknowledgements, which have no envelope.
    pub fn into_json_rpc(self) -> Option<JsonRpcResponse> {
        let id = self.id.unwrap_or(Value::Null);
        let (result, error) = match self.kind {
            ResponseKind::Cached(raw) => (
                Some(serde_json::from_str(raw.get()).unwrap_or(Value::Null)),
                None,
            ),
            ResponseKind::Result(value) => (Some(value), None),
            ResponseKind::Error(_, err) => (None, Some(err)),
            ResponseKind::Acknowledgement => return None,
        };
        Some(JsonRpcResponse {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result,
            error,
        })
    }

    // ── Internal constructors ──

    pub(crate) fn cached(id: Option<Value>, raw: &Arc<RawValue>) -> Self {
        McpResponse {
            id,
            kind: ResponseKind::Cached(Arc::clone(raw)),
        }
    }

    pub(crate) fn ok(id: Option<Value>, result: Value) -> Self {
        McpResponse {
            id,
            kind: ResponseKind::Result(result),
        }
    }

    pub(crate) fn error(id: Option<Value>, err: DispatchError) -> Self {
        McpResponse {
            id,
            kind: ResponseKind::Error(err.kind, err.into()),
        }
    }

    pub(crate) fn acknowledgement() -> Self {
        McpResponse {
            id: None,
            kind: ResponseKind::Acknowledgement,
        }
    }
}

impl Serialize for McpResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_acknowledgement() {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
            return map.end();
        }

        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
        map.serialize_entry("id", self.id.as_ref().unwrap_or(&Value::Null))?;

        match &self.kind {
            ResponseKind::Cached(raw) => map.serialize_entry("result", raw.as_ref())?,
            ResponseKind::Result(value) => map.serialize_entry("result", value)?,
            ResponseKind::Error(_, err) => map.serialize_entry("error", err)?,
            ResponseKind::Acknowledgement => {}
        }

        map.end()
    }
}

/// Structured JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ── MCP domain types ──

/// Tool call result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
}

/// Single content block in a tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: String,
}

/// Create a single-block text tool result.
pub fn text_result(text: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![ContentBlock {
            block_type: "text".into(),
            text: text.into(),
        }],
    }
}

/// Crate-level error type.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("invalid tool schema: {0}")]
    Schema(String),
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),
    #[error("no implementation registered for tool: {0}")]
    MissingHandler(String),
    #[error("implementation registered for undefined tool: {0}")]
    UnknownHandler(String),
    /// Failure raised by a tool implementation; the message is shown verbatim.
    #[error("{0}")]
    Tool(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    /// Shorthand for a tool runtime failure.
    pub fn tool(message: impl Into<String>) -> Self {
        McpError::Tool(message.into())
    }
}

// Internal params structs for deserialization.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitializeParams {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClientInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CancelledParams {
    #[serde(default)]
    pub request_id: Option<Value>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_null_id_is_present() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert_eq!(req.id, Some(Value::Null));
    }

    #[test]
    fn test_absent_id_is_none() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert_eq!(req.id, None);
        assert_eq!(req.method.as_deref(), Some("notifications/initialized"));
    }

    #[test]
    fn test_error_envelope_serializes_null_id() {
        let resp = McpResponse::error(None, DispatchError::invalid_request("bad"));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32600, "message": "bad"}})
        );
    }

    #[test]
    fn test_result_envelope_has_no_error() {
        let resp = McpResponse::ok(Some(json!(7)), json!({"x": 1}));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["result"]["x"], 1);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_acknowledgement_has_no_envelope() {
        let resp = McpResponse::acknowledgement();
        assert!(resp.is_acknowledgement());
        assert!(resp.error_kind().is_none());
        assert!(resp.into_json_rpc().is_none());
    }

    #[test]
    fn test_cached_result_round_trips() {
        let raw: Arc<RawValue> = RawValue::from_string(r#"{"tools":[]}"#.into())
            .unwrap()
            .into();
        let resp = McpResponse::cached(Some(json!("a")), &raw).into_json_rpc().unwrap();
        assert_eq!(resp.id, json!("a"));
        assert_eq!(resp.result.unwrap(), json!({"tools": []}));
    }

    #[test]
    fn test_tool_error_displays_verbatim() {
        assert_eq!(McpError::tool("Division by zero").to_string(), "Division by zero");
    }
}
