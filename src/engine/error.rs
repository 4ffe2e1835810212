// SPDX-License-Identifier: Apache-2.0

//! Error types for the mongo-odm adapter
//!
//! Driver failures are carried verbatim as the error source. The remaining
//! variants cover what this layer itself can reject: configuration, hook
//! payload shapes and the connection lifecycle.

use mongodb::bson::Bson;
use thiserror::Error;

/// Unified error type for adapter, hook and query operations
#[derive(Debug, Error)]
pub enum OdmError {
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<mongodb::error::Error>,
    },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        message: String,
        #[source]
        source: Option<mongodb::error::Error>,
    },

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid {operation} payload: expected {expected}, found {found}")]
    InvalidPayload {
        operation: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("Adapter is not connected")]
    NotConnected,

    #[error("Adapter has been closed")]
    AdapterClosed,

    #[error("Query execution error: {message}")]
    Execution { message: String },

    #[error("Failed to deserialize result: {message}")]
    Deserialization { message: String },

    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),
}

impl OdmError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: msg.into(),
            source: None,
        }
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: msg.into(),
            source: None,
        }
    }

    /// Wraps a driver error raised while connecting, keeping it as the source.
    /// Authentication failures are told apart by the driver's error kind.
    pub fn connect_error(err: mongodb::error::Error) -> Self {
        let message = err.to_string();
        if matches!(*err.kind, mongodb::error::ErrorKind::Authentication { .. }) {
            Self::AuthenticationFailed {
                message,
                source: Some(err),
            }
        } else {
            Self::ConnectionFailed {
                message,
                source: Some(err),
            }
        }
    }

    /// The driver error behind this one, if any
    pub fn driver_error(&self) -> Option<&mongodb::error::Error> {
        match self {
            Self::Driver(err) => Some(err),
            Self::ConnectionFailed { source, .. } | Self::AuthenticationFailed { source, .. } => {
                source.as_ref()
            }
            _ => None,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration { message: msg.into() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation { message: msg.into() }
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution { message: msg.into() }
    }

    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self::Deserialization { message: msg.into() }
    }

    /// Builds an `InvalidPayload` error describing the BSON value that was found.
    pub fn invalid_payload(operation: &'static str, expected: &'static str, found: &Bson) -> Self {
        Self::InvalidPayload {
            operation,
            expected,
            found: format!("{:?}", found.element_type()),
        }
    }

    /// True for errors raised by the connection lifecycle rather than a query.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::AuthenticationFailed { .. }
                | Self::NotConnected
                | Self::AdapterClosed
        )
    }
}

/// Result type alias for adapter operations
pub type OdmResult<T> = Result<T, OdmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_payload_names_the_element_type() {
        let err = OdmError::invalid_payload("find", "document", &Bson::Int32(4));
        assert_eq!(
            err.to_string(),
            "Invalid find payload: expected document, found Int32"
        );
    }

    #[tokio::test]
    async fn test_connect_error_keeps_driver_source() {
        let driver_err = mongodb::options::ClientOptions::parse("not-a-mongodb-url")
            .await
            .unwrap_err();

        let err = OdmError::connect_error(driver_err);
        assert!(matches!(err, OdmError::ConnectionFailed { source: Some(_), .. }));
        assert!(err.is_connection_error());

        let source = std::error::Error::source(&err).expect("driver error as source");
        assert!(source.downcast_ref::<mongodb::error::Error>().is_some());
        assert!(matches!(
            *err.driver_error().unwrap().kind,
            mongodb::error::ErrorKind::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_connection_error_classification() {
        assert!(OdmError::connection_failed("refused").is_connection_error());
        assert!(OdmError::NotConnected.is_connection_error());
        assert!(!OdmError::validation("bad").is_connection_error());
    }
}
