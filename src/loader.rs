use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::registry::{ParamSpec, ParamType, Tool, ToolSchema};
use crate::types::McpError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolDef {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    input_schema: Option<Value>,
}

/// Load tool definitions from a JSON file on disk.
pub fn load_tools(path: impl AsRef<Path>) -> Result<Vec<Tool>, McpError> {
    let data = std::fs::read(path)?;
    parse_tools(&data)
}

/// Parse tool definitions from raw JSON bytes.
///
/// The `inputSchema` of each definition is published unchanged; a parsed
/// copy drives argument validation.
pub fn parse_tools(data: &[u8]) -> Result<Vec<Tool>, McpError> {
    let defs: Vec<ToolDef> = serde_json::from_slice(data)?;
    let mut tools = Vec::with_capacity(defs.len());

    for def in defs {
        if def.name.is_empty() {
            return Err(McpError::Schema("tool name must not be empty".into()));
        }
        let input_schema = def
            .input_schema
            .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}}));
        let schema = parse_schema(&def.name, &input_schema)?;

        tools.push(Tool {
            name: def.name,
            description: def.description,
            input_schema,
            schema,
        });
    }

    Ok(tools)
}

/// Extract validation rules from a JSON Schema object.
fn parse_schema(tool: &str, schema: &Value) -> Result<ToolSchema, McpError> {
    let obj = schema
        .as_object()
        .ok_or_else(|| McpError::Schema(format!("{tool}: inputSchema must be an object")))?;

    if let Some(ty) = obj.get("type") {
        if ty.as_str() != Some("object") {
            return Err(McpError::Schema(format!(
                "{tool}: inputSchema type must be \"object\""
            )));
        }
    }

    let empty = Map::new();
    let properties = match obj.get("properties") {
        Some(Value::Object(props)) => props,
        Some(_) => {
            return Err(McpError::Schema(format!(
                "{tool}: properties must be an object"
            )))
        }
        None => &empty,
    };

    let required = required_fields(tool, obj.get("required"))?;
    for field in &required {
        if !properties.contains_key(field) {
            return Err(McpError::Schema(format!(
                "{tool}: required field \"{field}\" is not declared in properties"
            )));
        }
    }

    let mut params = Vec::with_capacity(properties.len());
    for (name, prop) in properties {
        let ty = prop.get("type").and_then(|v| v.as_str()).unwrap_or_default();
        let param_type = ParamType::parse(ty).ok_or_else(|| {
            McpError::Schema(format!("{tool}: field \"{name}\" has unsupported type \"{ty}\""))
        })?;

        params.push(ParamSpec {
            name: name.clone(),
            param_type,
            description: prop
                .get("description")
                .and_then(|v| v.as_str())
                .map(String::from),
            required: required.contains(name),
            default: prop.get("default").cloned(),
            allowed: prop.get("enum").and_then(|v| v.as_array()).cloned(),
        });
    }

    Ok(ToolSchema::with_required(params, required))
}

fn required_fields(tool: &str, value: Option<&Value>) -> Result<Vec<String>, McpError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let arr = value
        .as_array()
        .ok_or_else(|| McpError::Schema(format!("{tool}: required must be an array")))?;
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(String::from)
                .ok_or_else(|| McpError::Schema(format!("{tool}: required entries must be strings")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_tools() {
        let json = r#"[{"name":"echo","description":"echoes","inputSchema":{"type":"object","properties":{"msg":{"type":"string"}},"required":["msg"]}}]"#;
        let tools = parse_tools(json.as_bytes()).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");
        let names: Vec<_> = tools[0].schema.required().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["msg"]);
    }

    #[test]
    fn test_input_schema_published_unchanged() {
        let schema = json!({
            "type": "object",
            "properties": {"b": {"type": "number", "description": "second"}, "a": {"type": "number"}},
            "required": ["b", "a"]
        });
        let raw = serde_json::to_vec(&json!([{"name": "t", "description": "d", "inputSchema": schema}]))
            .unwrap();
        let tools = parse_tools(&raw).unwrap();
        assert_eq!(tools[0].input_schema, schema);
        assert_eq!(tools[0].schema.params[0].name, "b");
        assert_eq!(tools[0].schema.params[0].description.as_deref(), Some("second"));
    }

    #[test]
    fn test_required_follows_required_array() {
        let json = r#"[{"name":"t","inputSchema":{"type":"object","properties":{"a":{"type":"number"},"b":{"type":"number"}},"required":["b","a"]}}]"#;
        let tools = parse_tools(json.as_bytes()).unwrap();
        let names: Vec<_> = tools[0].schema.required().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(tools[0].schema.params[0].name, "a");
    }

    #[test]
    fn test_enum_and_default_parsed() {
        let json = r#"[{"name":"fmt","description":"","inputSchema":{"type":"object","properties":{"style":{"type":"string","enum":["a","b"],"default":"a"}}}}]"#;
        let tools = parse_tools(json.as_bytes()).unwrap();
        let style = tools[0].schema.get("style").unwrap();
        assert_eq!(style.allowed, Some(vec![json!("a"), json!("b")]));
        assert_eq!(style.default, Some(json!("a")));
        assert!(!style.required);
    }

    #[test]
    fn test_missing_schema_defaults_to_empty_object() {
        let tools = parse_tools(br#"[{"name":"now","description":"time"}]"#).unwrap();
        assert!(tools[0].schema.params.is_empty());
        assert_eq!(tools[0].input_schema["type"], "object");
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let json = r#"[{"name":"t","inputSchema":{"type":"object","properties":{"n":{"type":"integer"}}}}]"#;
        let err = parse_tools(json.as_bytes()).unwrap_err();
        assert!(matches!(err, McpError::Schema(msg) if msg.contains("integer")));
    }

    #[test]
    fn test_undeclared_required_rejected() {
        let json = r#"[{"name":"t","inputSchema":{"type":"object","properties":{},"required":["x"]}}]"#;
        let err = parse_tools(json.as_bytes()).unwrap_err();
        assert!(matches!(err, McpError::Schema(_)));
    }

    #[test]
    fn test_load_tools_missing_file() {
        let result = load_tools("/nonexistent/path.json");
        assert!(matches!(result, Err(McpError::Io(_))));
    }

    #[test]
    fn test_load_tools_malformed() {
        let result = parse_tools(b"{not valid json");
        assert!(matches!(result, Err(McpError::Json(_))));
    }
}
