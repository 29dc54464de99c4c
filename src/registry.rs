use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::loader;
use crate::types::McpError;

// ── Schema ──

/// The closed set of argument kinds a schema can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Number,
    String,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::Number => "number",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "number" => Some(ParamType::Number),
            "string" => Some(ParamType::String),
            "boolean" => Some(ParamType::Boolean),
            "object" => Some(ParamType::Object),
            "array" => Some(ParamType::Array),
            _ => None,
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ParamType::Number, Value::Number(_))
                | (ParamType::String, Value::String(_))
                | (ParamType::Boolean, Value::Bool(_))
                | (ParamType::Object, Value::Object(_))
                | (ParamType::Array, Value::Array(_))
        )
    }

    /// Name of the kind `value` actually has, as reported in type errors.
    pub fn name_of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: Option<String>,
    pub required: bool,
    pub default: Option<Value>,
    pub allowed: Option<Vec<Value>>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        ParamSpec {
            name: name.into(),
            param_type,
            description: None,
            required: false,
            default: None,
            allowed: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.allowed = Some(values);
        self
    }
}

/// Declared arguments of a tool, in declaration order.
///
/// Required fields keep their own order, which is the order presence is
/// checked in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSchema {
    pub params: Vec<ParamSpec>,
    required_order: Vec<String>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_required(params: Vec<ParamSpec>, required_order: Vec<String>) -> Self {
        ToolSchema {
            params,
            required_order,
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        if spec.required && !self.required_order.contains(&spec.name) {
            self.required_order.push(spec.name.clone());
        }
        self.params.push(spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Required parameters, in the order they were listed as required.
    pub fn required(&self) -> impl Iterator<Item = &ParamSpec> {
        self.required_order.iter().filter_map(|name| self.get(name))
    }

    /// Render as a JSON Schema object for discovery.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(p.param_type.as_str()));
            if let Some(desc) = &p.description {
                prop.insert("description".into(), json!(desc));
            }
            if let Some(allowed) = &p.allowed {
                prop.insert("enum".into(), Value::Array(allowed.clone()));
            }
            if let Some(default) = &p.default {
                prop.insert("default".into(), default.clone());
            }
            properties.insert(p.name.clone(), Value::Object(prop));
        }
        let required: Vec<&str> = self.required().map(|p| p.name.as_str()).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool definition as exposed by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    /// Parsed schema used for validation (not serialized to clients).
    #[serde(skip)]
    pub schema: ToolSchema,
}

impl Tool {
    /// Define a tool in code; the published `inputSchema` is generated.
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: ToolSchema) -> Self {
        Tool {
            name: name.into(),
            description: description.into(),
            input_schema: schema.to_json(),
            schema,
        }
    }
}

// ── Implementations ──

/// Implementation behind a tool. Receives validated arguments (a JSON object)
/// and returns the value rendered into the result text.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> Result<Value, McpError>;
}

/// Wraps an async closure into a ToolHandler.
pub struct FnToolHandler<F> {
    f: F,
}

impl<F, Fut> FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Value, McpError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn ToolHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Value, McpError>> + Send + 'static,
{
    async fn call(&self, args: Value) -> Result<Value, McpError> {
        (self.f)(args).await
    }
}

// ── Registry ──

/// A definition paired with its implementation.
pub struct RegisteredTool {
    tool: Tool,
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }
}

/// Immutable name → tool mapping. Built once, then shared read-only.
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Definitions in registration order.
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.entries.iter().map(|e| &e.tool)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.tool.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects definitions and implementations, then checks them in `build()`.
#[derive(Default)]
pub struct RegistryBuilder {
    tools: Vec<Tool>,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    load_error: Option<McpError>,
}

impl RegistryBuilder {
    /// Add a code-defined tool together with its implementation.
    pub fn tool(mut self, tool: Tool, handler: Arc<dyn ToolHandler>) -> Self {
        self.handlers.insert(tool.name.clone(), handler);
        self.tools.push(tool);
        self
    }

    /// Add definitions without implementations.
    pub fn definitions(mut self, tools: Vec<Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Parse definitions from raw JSON bytes.
    pub fn tools_json(mut self, data: &[u8]) -> Self {
        match loader::parse_tools(data) {
            Ok(tools) => self.tools.extend(tools),
            Err(e) => self.record(e),
        }
        self
    }

    /// Load definitions from a JSON file.
    pub fn tools_file(mut self, path: impl AsRef<std::path::Path>) -> Self {
        match loader::load_tools(path) {
            Ok(tools) => self.tools.extend(tools),
            Err(e) => self.record(e),
        }
        self
    }

    /// Register the implementation for a defined tool. A later registration
    /// for the same name replaces the earlier one.
    pub fn handle_tool(mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    fn record(&mut self, err: McpError) {
        tracing::error!(error = %err, "load tool definitions");
        self.load_error.get_or_insert(err);
    }

    /// Check names and pairing, then freeze the registry.
    pub fn build(self) -> Result<ToolRegistry, McpError> {
        if let Some(err) = self.load_error {
            return Err(err);
        }

        let mut handlers = self.handlers;
        let mut entries = Vec::with_capacity(self.tools.len());
        let mut index = HashMap::with_capacity(self.tools.len());

        for tool in self.tools {
            if index.contains_key(&tool.name) {
                return Err(McpError::DuplicateTool(tool.name));
            }
            let handler = handlers
                .remove(&tool.name)
                .ok_or_else(|| McpError::MissingHandler(tool.name.clone()))?;
            index.insert(tool.name.clone(), entries.len());
            entries.push(RegisteredTool { tool, handler });
        }

        if let Some(name) = handlers.into_keys().next() {
            return Err(McpError::UnknownHandler(name));
        }

        tracing::debug!(count = entries.len(), "tool registry built");
        Ok(ToolRegistry { entries, index })
    }
}
