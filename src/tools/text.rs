use serde_json::Value;

use crate::types::McpError;

pub fn reverse(args: &Value) -> Result<Value, McpError> {
    Ok(Value::String(text(args)?.chars().rev().collect()))
}

pub fn uppercase(args: &Value) -> Result<Value, McpError> {
    Ok(Value::String(text(args)?.to_uppercase()))
}

pub fn word_count(args: &Value) -> Result<Value, McpError> {
    Ok(Value::from(text(args)?.split_whitespace().count()))
}

fn text(args: &Value) -> Result<&str, McpError> {
    args.get("text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::tool("Field 'text' must be a string"))
}
