use std::sync::Arc;

use serde_json::value::{to_raw_value, RawValue};
use serde_json::{json, Map, Value};

use crate::classify::{classify, decode_message, Message, Rejected};
use crate::error::DispatchError;
use crate::lifecycle::{LifecycleState, LifecycleTracker};
use crate::registry::ToolRegistry;
use crate::types::*;
use crate::validate::Validation;

/// Request methods the router understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method<'a> {
    Initialize,
    Ping,
    ToolsList,
    ToolsCall,
    Unknown(&'a str),
}

impl<'a> Method<'a> {
    fn parse(name: &'a str) -> Self {
        match name {
            "initialize" => Method::Initialize,
            "ping" => Method::Ping,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            other => Method::Unknown(other),
        }
    }
}

/// Notification methods the router recognizes. Unknown ones are still
/// acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotificationKind<'a> {
    Initialized,
    Cancelled,
    Unknown(&'a str),
}

impl<'a> NotificationKind<'a> {
    fn parse(name: &'a str) -> Self {
        match name {
            "notifications/initialized" => NotificationKind::Initialized,
            "notifications/cancelled" => NotificationKind::Cancelled,
            other => NotificationKind::Unknown(other),
        }
    }
}

/// The MCP method router. Create with [`ServerBuilder`], then call
/// [`handle()`](Server::handle) once per decoded message.
pub struct Server {
    server_name: String,
    server_version: String,
    registry: Arc<ToolRegistry>,
    lifecycle: LifecycleTracker,
    initialize_result: Arc<RawValue>,
    tools_list_result: Arc<RawValue>,
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.server_name
    }

    pub fn version(&self) -> &str {
        &self.server_version
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Decode a raw payload and route it.
    pub async fn handle_bytes(&self, bytes: &[u8]) -> McpResponse {
        match decode_message(bytes) {
            Ok(req) => self.handle(req).await,
            Err(Rejected { id, error }) => reject(id, error),
        }
    }

    /// Route a decoded message. Requests get exactly one envelope carrying
    /// their id; notifications always get an acknowledgement.
    pub async fn handle(&self, req: JsonRpcRequest) -> McpResponse {
        match classify(req) {
            Ok(Message::Request { id, method, params }) => {
                self.handle_request(id, &method, params).await
            }
            Ok(Message::Notification { method, params }) => {
                self.handle_notification(&method, params.as_ref());
                McpResponse::acknowledgement()
            }
            Err(Rejected { id, error }) => reject(id, error),
        }
    }

    async fn handle_request(&self, id: Value, method: &str, params: Option<Value>) -> McpResponse {
        let id = Some(id);
        match Method::parse(method) {
            Method::Initialize => {
                log_initialize(params.as_ref());
                McpResponse::cached(id, &self.initialize_result)
            }
            Method::Ping => McpResponse::ok(id, json!({})),
            Method::ToolsList => McpResponse::cached(id, &self.tools_list_result),
            Method::ToolsCall => match self.handle_tools_call(params).await {
                Ok(result) => McpResponse::ok(id, result),
                Err(e) => reject(id, e),
            },
            Method::Unknown(name) => reject(
                id,
                DispatchError::method_not_found(format!("Method not found: {name}")),
            ),
        }
    }

    fn handle_notification(&self, method: &str, params: Option<&Value>) {
        match NotificationKind::parse(method) {
            NotificationKind::Initialized => {
                if self.lifecycle.mark_initialized() {
                    tracing::info!("client initialized");
                } else {
                    tracing::debug!("repeated initialized notification");
                }
            }
            NotificationKind::Cancelled => {
                let p: CancelledParams = params
                    .and_then(|p| serde_json::from_value(p.clone()).ok())
                    .unwrap_or_default();
                tracing::info!(
                    request_id = ?p.request_id,
                    reason = p.reason.as_deref().unwrap_or(""),
                    "cancellation notice ignored; calls run to completion"
                );
            }
            NotificationKind::Unknown(name) => {
                tracing::warn!(method = name, "unrecognized notification");
            }
        }
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, DispatchError> {
        let (name, args) = tool_call_params(params)?;

        let entry = self
            .registry
            .get(&name)
            .ok_or_else(|| DispatchError::method_not_found(format!("Unknown tool: {name}")))?;

        if !self.lifecycle.is_initialized() {
            tracing::warn!(tool = %name, "tools/call before initialization completed");
        }

        let args = match entry.tool().validate_arguments(&args) {
            Validation::Valid(args) => args,
            Validation::Invalid(msg) => return Err(DispatchError::invalid_params(msg)),
        };

        let value = entry
            .handler()
            .call(Value::Object(args))
            .await
            .map_err(|e| {
                tracing::warn!(tool = %name, error = %e, "tool failed");
                DispatchError::invalid_params(e.to_string())
            })?;

        tracing::debug!(tool = %name, "tool call succeeded");
        let result = text_result(format!("Result: {}", render_value(&value)));
        serde_json::to_value(&result).map_err(DispatchError::internal)
    }
}

fn reject(id: Option<Value>, err: DispatchError) -> McpResponse {
    if err.kind.is_client_error() {
        tracing::debug!(id = ?id, code = err.code(), message = %err.message, "request rejected");
    }
    McpResponse::error(id, err)
}

fn log_initialize(params: Option<&Value>) {
    let Some(p) = params.and_then(|p| serde_json::from_value::<InitializeParams>(p.clone()).ok())
    else {
        tracing::info!("initialize");
        return;
    };
    let client_name = p.client_info.as_ref().map_or("", |c| c.name.as_str());
    let client_version = p.client_info.as_ref().map_or("", |c| c.version.as_str());
    tracing::info!(
        client_name,
        client_version,
        protocol_version = ?p.protocol_version,
        "initialize"
    );
}

/// Pull `name` and `arguments` out of `tools/call` params.
fn tool_call_params(params: Option<Value>) -> Result<(String, Map<String, Value>), DispatchError> {
    let mut params = match params {
        Some(Value::Object(p)) => p,
        Some(_) => return Err(DispatchError::invalid_params("params must be an object")),
        None => {
            return Err(DispatchError::invalid_params(
                "Missing required parameter: name",
            ))
        }
    };

    let name = match params.remove("name") {
        Some(Value::String(name)) => name,
        Some(_) => return Err(DispatchError::invalid_params("name must be a string")),
        None => {
            return Err(DispatchError::invalid_params(
                "Missing required parameter: name",
            ))
        }
    };

    let args = match params.remove("arguments") {
        Some(Value::Object(args)) => args,
        Some(_) => return Err(DispatchError::invalid_params("arguments must be an object")),
        None => {
            return Err(DispatchError::invalid_params(
                "Missing required parameter: arguments",
            ))
        }
    };

    Ok((name, args))
}

/// Text form of a tool's return value: strings bare, integral floats without
/// a fraction, anything else as compact JSON.
fn render_value(value: &Value) -> String {
    const MAX_SAFE_INT: f64 = 9_007_199_254_740_992.0;
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < MAX_SAFE_INT => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Builder for constructing a [`Server`].
#[derive(Default)]
pub struct ServerBuilder {
    registry: Option<Arc<ToolRegistry>>,
    server_name: Option<String>,
    server_version: Option<String>,
}

impl ServerBuilder {
    /// Use this registry. Without one the server exposes no tools.
    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set server name and version.
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self.server_version = Some(version.into());
        self
    }

    /// Build the server, pre-serializing the fixed `initialize` and
    /// `tools/list` payloads.
    pub fn build(self) -> Result<Server, McpError> {
        let registry = match self.registry {
            Some(r) => r,
            None => Arc::new(ToolRegistry::builder().build()?),
        };
        let server_name = self.server_name.unwrap_or_else(|| "toolbridge".into());
        let server_version = self
            .server_version
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").into());

        let initialize_result = to_raw_value(&json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
            },
            "serverInfo": {
                "name": server_name,
                "version": server_version,
            },
        }))?
        .into();

        let tools: Vec<_> = registry.tools().collect();
        let tools_list_result = to_raw_value(&json!({ "tools": tools }))?.into();

        Ok(Server {
            server_name,
            server_version,
            registry,
            lifecycle: LifecycleTracker::new(),
            initialize_result,
            tools_list_result,
        })
    }
}
