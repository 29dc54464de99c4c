//! `toolbridge` — schema-validated tool dispatch over MCP-style JSON-RPC 2.0.
//!
//! A pure protocol core: classify each decoded message, route it to the
//! handshake, discovery, or invocation handler, validate tool arguments
//! against a declared schema, and map every outcome onto a response envelope
//! or a bodiless acknowledgement. `transport_http` wires it into axum.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use toolbridge::{FnToolHandler, JsonRpcRequest, ParamSpec, ParamType, Server, Tool, ToolRegistry, ToolSchema};
//! use serde_json::{json, Value};
//!
//! # async fn example() -> Result<(), toolbridge::McpError> {
//! let echo = Tool::new(
//!     "echo",
//!     "echoes",
//!     ToolSchema::new().param(ParamSpec::new("message", ParamType::String).required()),
//! );
//! let registry = ToolRegistry::builder()
//!     .tool(echo, FnToolHandler::new(|args: Value| async move { Ok(args["message"].clone()) }))
//!     .build()?;
//!
//! let server = Server::builder()
//!     .registry(Arc::new(registry))
//!     .server_info("my-server", "0.1.0")
//!     .build()?;
//!
//! let req = JsonRpcRequest::request(1, "tools/call", Some(json!({"name": "echo", "arguments": {"message": "hi"}})));
//! let resp = server.handle(req).await;
//! assert!(!resp.is_acknowledgement());
//! // resp implements Serialize: {"jsonrpc":"2.0","id":1,"result":{"content":[{"type":"text","text":"Result: hi"}]}}
//! let json = serde_json::to_string(&resp)?;
//! # let _ = json;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod logging;
pub mod registry;
pub mod server;
pub mod tools;
pub mod transport_http;
pub mod types;
pub mod validate;

// Re-export the most commonly used items at the crate root.
pub use classify::{classify, decode_message, Message, Rejected};
pub use error::{DispatchError, ErrorKind};
pub use lifecycle::{LifecycleState, LifecycleTracker};
pub use loader::{load_tools, parse_tools};
pub use registry::{
    FnToolHandler, ParamSpec, ParamType, RegistryBuilder, Tool, ToolHandler, ToolRegistry,
    ToolSchema,
};
pub use server::{Server, ServerBuilder};
pub use transport_http::{http_router, serve};
pub use types::{
    text_result, ContentBlock, JsonRpcRequest, JsonRpcResponse, McpError, McpResponse, RpcError,
    ToolResult, JSONRPC_VERSION, PROTOCOL_VERSION,
};
pub use validate::{validate_arguments, Validation};
