//! Error types for the resource client.
//!
//! # Design
//! `ResourceError` is the closed failure taxonomy delivered to failure
//! callbacks. It carries no detail beyond the status code: transport and
//! decode diagnostics are logged where they happen, and callers decide on
//! retries from the kind alone.
//!
//! `InFlight` is deliberately separate. It is returned synchronously when a
//! request is refused before any exchange starts, so it never reaches a
//! callback.

use thiserror::Error;

/// Failure kinds delivered to a `Resource` failure callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The transport could not complete the exchange (no connectivity,
    /// refused connection, timeout, broken body stream).
    #[error("transport failed to complete the exchange")]
    TransportFailure,

    /// A response arrived with a status outside 200..=299. The code is absent
    /// when the exchange produced no HTTP status at all.
    #[error("unexpected HTTP status {}", describe_status(.0))]
    HttpStatus(Option<u16>),

    /// The body was missing or could not be decoded into the payload type, or
    /// the request could not be built from the configured URL.
    #[error("payload invalid")]
    PayloadInvalid,
}

impl ResourceError {
    /// Whether issuing the same request again might succeed.
    ///
    /// Transport failures and 5xx responses are considered transient. The
    /// client never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            ResourceError::TransportFailure => true,
            ResourceError::HttpStatus(Some(code)) => *code >= 500,
            ResourceError::HttpStatus(None) | ResourceError::PayloadInvalid => false,
        }
    }
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "(none)".to_string(),
    }
}

/// Error reported by a `Transport` when the exchange could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A request was refused because the resource already has an exchange
/// outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("a request to {url} is already in flight")]
pub struct InFlight {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display_includes_code() {
        assert_eq!(
            ResourceError::HttpStatus(Some(404)).to_string(),
            "unexpected HTTP status 404"
        );
        assert_eq!(
            ResourceError::HttpStatus(None).to_string(),
            "unexpected HTTP status (none)"
        );
    }

    #[test]
    fn retryable_kinds() {
        assert!(ResourceError::TransportFailure.is_retryable());
        assert!(ResourceError::HttpStatus(Some(503)).is_retryable());
        assert!(!ResourceError::HttpStatus(Some(404)).is_retryable());
        assert!(!ResourceError::HttpStatus(None).is_retryable());
        assert!(!ResourceError::PayloadInvalid.is_retryable());
    }

    #[test]
    fn in_flight_names_the_url() {
        let err = InFlight {
            url: "https://api.example.com/me".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "a request to https://api.example.com/me is already in flight"
        );
    }
}
