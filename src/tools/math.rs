use serde_json::{Number, Value};

use crate::types::McpError;

pub fn add(args: &Value) -> Result<Value, McpError> {
    arithmetic(args, i64::checked_add, |x, y| x + y)
}

pub fn subtract(args: &Value) -> Result<Value, McpError> {
    arithmetic(args, i64::checked_sub, |x, y| x - y)
}

pub fn multiply(args: &Value) -> Result<Value, McpError> {
    arithmetic(args, i64::checked_mul, |x, y| x * y)
}

/// Integral quotients stay integers; anything else is floating point.
pub fn divide(args: &Value) -> Result<Value, McpError> {
    let (a, b) = operands(args)?;
    if float(b) == 0.0 {
        return Err(McpError::tool("Division by zero"));
    }
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if x.checked_rem(y) == Some(0) {
            if let Some(q) = x.checked_div(y) {
                return Ok(Value::from(q));
            }
        }
    }
    finite(float(a) / float(b))
}

// Integer operands use `int_op` unless it overflows.
fn arithmetic(
    args: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, McpError> {
    let (a, b) = operands(args)?;
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(r) = int_op(x, y) {
            return Ok(Value::from(r));
        }
    }
    finite(float_op(float(a), float(b)))
}

fn operands(args: &Value) -> Result<(&Number, &Number), McpError> {
    Ok((number(args, "a")?, number(args, "b")?))
}

fn number<'a>(args: &'a Value, field: &str) -> Result<&'a Number, McpError> {
    match args.get(field) {
        Some(Value::Number(n)) => Ok(n),
        _ => Err(McpError::tool(format!("Field '{field}' must be a number"))),
    }
}

fn float(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

fn finite(x: f64) -> Result<Value, McpError> {
    Number::from_f64(x)
        .map(Value::Number)
        .ok_or_else(|| McpError::tool("Result is not a finite number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_arithmetic_stays_integral() {
        assert_eq!(add(&json!({"a": 15, "b": 27})).unwrap(), json!(42));
        assert_eq!(subtract(&json!({"a": 5, "b": 8})).unwrap(), json!(-3));
        assert_eq!(multiply(&json!({"a": 6, "b": 7})).unwrap(), json!(42));
        assert_eq!(divide(&json!({"a": 84, "b": 2})).unwrap(), json!(42));
    }

    #[test]
    fn test_float_arithmetic() {
        assert_eq!(add(&json!({"a": 1.5, "b": 2})).unwrap(), json!(3.5));
        assert_eq!(divide(&json!({"a": 1, "b": 4})).unwrap(), json!(0.25));
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        let out = add(&json!({"a": i64::MAX, "b": 1})).unwrap();
        assert!(out.is_f64());
    }

    #[test]
    fn test_min_divided_by_minus_one() {
        let out = divide(&json!({"a": i64::MIN, "b": -1})).unwrap();
        assert!(out.is_f64());
    }

    #[test]
    fn test_division_by_zero_fails() {
        let err = divide(&json!({"a": 1, "b": 0})).unwrap_err();
        assert_eq!(err.to_string(), "Division by zero");
        assert!(divide(&json!({"a": 1, "b": 0.0})).is_err());
    }

    #[test]
    fn test_non_number_operand_fails() {
        let err = add(&json!({"a": "1", "b": 2})).unwrap_err();
        assert_eq!(err.to_string(), "Field 'a' must be a number");
    }

    #[test]
    fn test_non_finite_result_fails() {
        assert!(multiply(&json!({"a": 1e308, "b": 10.0})).is_err());
    }
}
