//! # RPC Status Contract
//!
//! Errors that cross into a request-handling layer carry a machine-readable
//! status code and a human-readable detail payload. Codes mirror the gRPC
//! status space so that a transport layer can forward them without mapping
//! tables of its own.

use thiserror::Error;

use crate::error::ValidationError;

/// Status codes surfaced to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// The request was malformed or failed validation.
    InvalidArgument,
    /// The requested entity does not exist.
    NotFound,
    /// A server-side invariant was broken.
    Internal,
}

impl StatusCode {
    /// Canonical upper-case name, e.g. `"INVALID_ARGUMENT"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL",
        }
    }

    /// Numeric wire value.
    pub fn value(&self) -> i32 {
        match self {
            Self::InvalidArgument => 3,
            Self::NotFound => 5,
            Self::Internal => 13,
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error that knows how to present itself to an RPC caller.
pub trait RpcStatus {
    /// Status code for the response.
    fn status(&self) -> StatusCode;

    /// Detail payload. Structured details are JSON-encoded.
    fn details(&self) -> String;
}

impl RpcStatus for ValidationError {
    fn status(&self) -> StatusCode {
        StatusCode::InvalidArgument
    }

    fn details(&self) -> String {
        self.detail().to_json().to_string()
    }
}

/// Status-carrying errors raised by request handlers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request could not be accepted.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request payload failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl RpcError {
    /// A not-found error with the default detail.
    pub fn not_found() -> Self {
        Self::NotFound("Not Found".to_string())
    }

    /// A bad-request error with the default detail.
    pub fn bad_request() -> Self {
        Self::BadRequest("Invalid Argument".to_string())
    }
}

impl RpcStatus for RpcError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NotFound,
            Self::BadRequest(_) => StatusCode::InvalidArgument,
            Self::Validation(err) => err.status(),
        }
    }

    fn details(&self) -> String {
        match self {
            Self::NotFound(detail) | Self::BadRequest(detail) => detail.clone(),
            Self::Validation(err) => err.details(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_invalid_argument() {
        let err = ValidationError::message("required", "This field is required.");
        assert_eq!(err.status(), StatusCode::InvalidArgument);
        assert_eq!(err.status().value(), 3);
        assert_eq!(err.details(), r#"["This field is required."]"#);
    }

    #[test]
    fn default_details() {
        assert_eq!(RpcError::not_found().details(), "Not Found");
        assert_eq!(RpcError::not_found().status().as_str(), "NOT_FOUND");
        assert_eq!(RpcError::bad_request().details(), "Invalid Argument");
    }

    #[test]
    fn wrapped_validation_keeps_its_payload() {
        let err: RpcError = ValidationError::message("null", "This field may not be null.").into();
        assert_eq!(err.status(), StatusCode::InvalidArgument);
        assert_eq!(err.details(), r#"["This field may not be null."]"#);
    }
}
