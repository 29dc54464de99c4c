//! Protocol error taxonomy and the mapping onto JSON-RPC error objects.

use crate::types::RpcError;

/// JSON-RPC 2.0 error codes.
pub const ERR_CODE_PARSE: i32 = -32700;
pub const ERR_CODE_INVALID_REQ: i32 = -32600;
pub const ERR_CODE_NO_METHOD: i32 = -32601;
pub const ERR_CODE_BAD_PARAMS: i32 = -32602;
pub const ERR_CODE_INTERNAL: i32 = -32603;

/// Client-visible message for every [`ErrorKind::InternalError`].
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error";

/// The closed set of failures a message can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Payload could not be decoded.
    ParseError,
    /// Malformed envelope, protocol tag mismatch, or missing method.
    InvalidRequest,
    /// Unknown method, or unknown tool name in `tools/call`.
    MethodNotFound,
    /// Bad tool-call params, schema violation, or tool runtime failure.
    InvalidParams,
    /// Unanticipated fault inside the router.
    InternalError,
}

impl ErrorKind {
    pub const fn code(self) -> i32 {
        match self {
            ErrorKind::ParseError => ERR_CODE_PARSE,
            ErrorKind::InvalidRequest => ERR_CODE_INVALID_REQ,
            ErrorKind::MethodNotFound => ERR_CODE_NO_METHOD,
            ErrorKind::InvalidParams => ERR_CODE_BAD_PARAMS,
            ErrorKind::InternalError => ERR_CODE_INTERNAL,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            ERR_CODE_PARSE => Some(ErrorKind::ParseError),
            ERR_CODE_INVALID_REQ => Some(ErrorKind::InvalidRequest),
            ERR_CODE_NO_METHOD => Some(ErrorKind::MethodNotFound),
            ERR_CODE_BAD_PARAMS => Some(ErrorKind::InvalidParams),
            ERR_CODE_INTERNAL => Some(ErrorKind::InternalError),
            _ => None,
        }
    }

    /// True for failures caused by the caller's message rather than the server.
    pub const fn is_client_error(self) -> bool {
        !matches!(self, ErrorKind::InternalError)
    }
}

/// A dispatch failure: the error half of a response envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({})", .kind.code())]
pub struct DispatchError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DispatchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        DispatchError {
            kind,
            message: message.into(),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotFound, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    /// Internal fault. `detail` is logged and never sent to the caller.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "internal dispatch error");
        Self::new(ErrorKind::InternalError, INTERNAL_ERROR_MESSAGE)
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }
}

impl From<DispatchError> for RpcError {
    fn from(err: DispatchError) -> Self {
        RpcError {
            code: err.kind.code(),
            message: err.message,
            data: None,
        }
    }
}
