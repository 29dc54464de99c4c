//! Built-in reference tools: arithmetic and simple text transforms.

pub mod math;
pub mod text;

use std::sync::Arc;

use serde_json::Value;

use crate::registry::{FnToolHandler, ToolHandler, ToolRegistry};
use crate::types::McpError;

const TOOLS_JSON: &[u8] = include_bytes!("../../tools.json");

/// Registry holding every built-in tool, in `tools.json` order.
pub fn builtin_registry() -> Result<ToolRegistry, McpError> {
    ToolRegistry::builder()
        .tools_json(TOOLS_JSON)
        .handle_tool("add", sync_handler(math::add))
        .handle_tool("subtract", sync_handler(math::subtract))
        .handle_tool("multiply", sync_handler(math::multiply))
        .handle_tool("divide", sync_handler(math::divide))
        .handle_tool("reverse", sync_handler(text::reverse))
        .handle_tool("uppercase", sync_handler(text::uppercase))
        .handle_tool("word_count", sync_handler(text::word_count))
        .build()
}

fn sync_handler(f: fn(&Value) -> Result<Value, McpError>) -> Arc<dyn ToolHandler> {
    FnToolHandler::new(move |args: Value| async move { f(&args) })
}
