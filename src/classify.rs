//! Message classification: request, notification, or malformed.

use serde_json::Value;

use crate::error::DispatchError;
use crate::types::{JsonRpcRequest, JSONRPC_VERSION};

/// A message that passed classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Carries an id and expects exactly one envelope.
    Request {
        id: Value,
        method: String,
        params: Option<Value>,
    },
    /// No id; answered with an acknowledgement only.
    Notification {
        method: String,
        params: Option<Value>,
    },
}

impl Message {
    pub fn method(&self) -> &str {
        match self {
            Message::Request { method, .. } | Message::Notification { method, .. } => method,
        }
    }
}

/// A message rejected before routing, with the id to echo (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub id: Option<Value>,
    pub error: DispatchError,
}

impl Rejected {
    fn new(id: Option<Value>, error: DispatchError) -> Self {
        Rejected { id, error }
    }
}

/// Classify a decoded message.
///
/// A present `id` (including `null`) makes a request, which must carry the
/// `"2.0"` tag and a method. Otherwise a present method makes a notification,
/// whose tag is not checked. Anything else is malformed.
pub fn classify(msg: JsonRpcRequest) -> Result<Message, Rejected> {
    let JsonRpcRequest {
        jsonrpc,
        id,
        method,
        params,
    } = msg;

    match (id, method) {
        (Some(id), method) => {
            if !is_scalar(&id) {
                return Err(Rejected::new(
                    None,
                    DispatchError::invalid_request("id must be a string, number or null"),
                ));
            }
            if jsonrpc.as_ref().and_then(Value::as_str) != Some(JSONRPC_VERSION) {
                return Err(Rejected::new(
                    Some(id),
                    DispatchError::invalid_request("jsonrpc must be '2.0'"),
                ));
            }
            match method {
                Some(method) => Ok(Message::Request { id, method, params }),
                None => Err(Rejected::new(
                    Some(id),
                    DispatchError::invalid_request("method is required"),
                )),
            }
        }
        (None, Some(method)) => Ok(Message::Notification { method, params }),
        (None, None) => Err(Rejected::new(
            None,
            DispatchError::invalid_request("message has neither id nor method"),
        )),
    }
}

/// Decode a raw payload into a [`JsonRpcRequest`].
///
/// Undecodable bytes are a parse error. A decodable payload that is not a
/// single message object, or whose members have the wrong types, is an
/// invalid request; its id is echoed when it can be read.
pub fn decode_message(bytes: &[u8]) -> Result<JsonRpcRequest, Rejected> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| Rejected::new(None, DispatchError::parse_error(format!("Parse error: {e}"))))?;

    let id = match &value {
        Value::Object(obj) => obj.get("id").filter(|id| is_scalar(id)).cloned(),
        Value::Array(_) => {
            return Err(Rejected::new(
                None,
                DispatchError::invalid_request("batch requests are not supported"),
            ))
        }
        _ => {
            return Err(Rejected::new(
                None,
                DispatchError::invalid_request("message must be a JSON object"),
            ))
        }
    };

    serde_json::from_value(value).map_err(|e| {
        Rejected::new(id, DispatchError::invalid_request(format!("Invalid request: {e}")))
    })
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn decode(raw: &str) -> JsonRpcRequest {
        decode_message(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_request_with_id() {
        let msg = classify(decode(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)).unwrap();
        assert_eq!(
            msg,
            Message::Request {
                id: json!(1),
                method: "tools/list".into(),
                params: None
            }
        );
    }

    #[test]
    fn test_null_id_is_request() {
        let msg = classify(decode(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)).unwrap();
        assert!(matches!(msg, Message::Request { id: Value::Null, .. }));
    }

    #[test]
    fn test_notification_without_id() {
        let msg = classify(decode(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#))
            .unwrap();
        assert_eq!(msg.method(), "notifications/initialized");
        assert!(matches!(msg, Message::Notification { .. }));
    }

    #[test]
    fn test_notification_skips_version_check() {
        let msg = classify(decode(r#"{"method":"notifications/whatever"}"#)).unwrap();
        assert!(matches!(msg, Message::Notification { .. }));
    }

    #[test]
    fn test_notification_with_non_string_tag() {
        let msg = classify(decode(r#"{"jsonrpc":2.0,"method":"notifications/initialized"}"#))
            .unwrap();
        assert!(matches!(msg, Message::Notification { .. }));
    }

    #[test]
    fn test_request_with_non_string_tag_echoes_id() {
        let rejected = classify(decode(r#"{"jsonrpc":2.0,"id":3,"method":"ping"}"#)).unwrap_err();
        assert_eq!(rejected.id, Some(json!(3)));
        assert_eq!(rejected.error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_malformed_has_null_id() {
        let rejected = classify(decode(r#"{"jsonrpc":"2.0","params":{}}"#)).unwrap_err();
        assert_eq!(rejected.id, None);
        assert_eq!(rejected.error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_request_wrong_version_echoes_id() {
        let rejected = classify(decode(r#"{"jsonrpc":"1.0","id":"abc","method":"ping"}"#)).unwrap_err();
        assert_eq!(rejected.id, Some(json!("abc")));
        assert_eq!(rejected.error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_request_missing_version() {
        let rejected = classify(decode(r#"{"id":4,"method":"ping"}"#)).unwrap_err();
        assert_eq!(rejected.id, Some(json!(4)));
        assert_eq!(rejected.error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_request_missing_method_echoes_id() {
        let rejected = classify(decode(r#"{"jsonrpc":"2.0","id":9}"#)).unwrap_err();
        assert_eq!(rejected.id, Some(json!(9)));
        assert_eq!(rejected.error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_structured_id_rejected() {
        let rejected =
            classify(decode(r#"{"jsonrpc":"2.0","id":{"a":1},"method":"ping"}"#)).unwrap_err();
        assert_eq!(rejected.id, None);
        assert_eq!(rejected.error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_decode_garbage_is_parse_error() {
        let rejected = decode_message(b"{not json").unwrap_err();
        assert_eq!(rejected.id, None);
        assert_eq!(rejected.error.kind, ErrorKind::ParseError);
    }

    #[test]
    fn test_decode_batch_rejected() {
        let rejected = decode_message(br#"[{"jsonrpc":"2.0","id":1,"method":"ping"}]"#).unwrap_err();
        assert_eq!(rejected.error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_decode_wrong_method_type_echoes_id() {
        let rejected = decode_message(br#"{"jsonrpc":"2.0","id":5,"method":42}"#).unwrap_err();
        assert_eq!(rejected.id, Some(json!(5)));
        assert_eq!(rejected.error.kind, ErrorKind::InvalidRequest);
    }
}
