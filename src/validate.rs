use serde_json::{Map, Value};

use crate::registry::{ParamType, Tool, ToolSchema};

/// Result of checking arguments against a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// Arguments with defaults filled in for absent optional fields.
    Valid(Map<String, Value>),
    /// The first violation found.
    Invalid(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn into_result(self) -> Result<Map<String, Value>, String> {
        match self {
            Validation::Valid(args) => Ok(args),
            Validation::Invalid(msg) => Err(msg),
        }
    }
}

/// Check `args` against `schema`, stopping at the first violation.
///
/// Order: required presence in the order fields are listed as required, then
/// declared types and enum membership in declaration order. Undeclared fields
/// pass through.
pub fn validate_arguments(schema: &ToolSchema, args: &Map<String, Value>) -> Validation {
    for spec in schema.required() {
        if !args.contains_key(&spec.name) {
            return Validation::Invalid(format!("Missing required field: {}", spec.name));
        }
    }

    for spec in &schema.params {
        let Some(value) = args.get(&spec.name) else {
            continue;
        };
        if !spec.param_type.matches(value) {
            return Validation::Invalid(format!(
                "Field '{}' must be of type {}, got {}",
                spec.name,
                spec.param_type,
                ParamType::name_of(value)
            ));
        }
        if let Some(allowed) = &spec.allowed {
            if !allowed.contains(value) {
                return Validation::Invalid(format!(
                    "Field '{}' must be one of {}",
                    spec.name,
                    Value::Array(allowed.clone())
                ));
            }
        }
    }

    let mut coerced = args.clone();
    for spec in &schema.params {
        if let Some(default) = &spec.default {
            if !coerced.contains_key(&spec.name) {
                coerced.insert(spec.name.clone(), default.clone());
            }
        }
    }

    Validation::Valid(coerced)
}

impl Tool {
    /// Validate arguments against the tool's input schema.
    pub fn validate_arguments(&self, args: &Map<String, Value>) -> Validation {
        validate_arguments(&self.schema, args)
    }
}
