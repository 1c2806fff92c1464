//! Client error types with transient/permanent classification.

use std::sync::Arc;

use thiserror::Error;

/// Error that can occur during connection management and directory
/// operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to establish a connection.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection attempt timed out.
    #[error("connection timeout after {timeout_secs} seconds")]
    ConnectionTimeout { timeout_secs: u64 },

    /// Invalid credentials.
    #[error("authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// The connection has been closed and cannot be used.
    #[error("connection is closed")]
    ConnectionClosed,

    /// The connection pool is shutting down; pending acquisitions are
    /// failed with this error.
    #[error("connection pool is closing")]
    PoolClosing,

    /// Every factory behind a load balancer is offline.
    #[error("no operational connection factories remaining")]
    NoOperationalFactories {
        #[source]
        last_failure: Option<Arc<ClientError>>,
    },

    /// A directory operation failed.
    #[error("operation failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The requested entry was not returned by the server.
    #[error("entry not found: {dn}")]
    EntryNotFound { dn: String },

    /// Configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl ClientError {
    /// Check if this error is transient and the operation may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionFailed { .. }
                | ClientError::ConnectionTimeout { .. }
                | ClientError::NoOperationalFactories { .. }
        )
    }

    /// Check if this error is permanent and retry will not help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ClientError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ClientError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        ClientError::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation failed error with source.
    pub fn operation_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ClientError::OperationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ClientError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an entry not found error.
    pub fn entry_not_found(dn: impl Into<String>) -> Self {
        ClientError::EntryNotFound { dn: dn.into() }
    }

    /// Create a no-operational-factories error wrapping the most recent
    /// underlying failure.
    pub fn no_operational_factories(last_failure: Option<Arc<ClientError>>) -> Self {
        ClientError::NoOperationalFactories { last_failure }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::connection_failed("down").is_transient());
        assert!(ClientError::ConnectionTimeout { timeout_secs: 5 }.is_transient());
        assert!(ClientError::no_operational_factories(None).is_transient());

        assert!(ClientError::AuthenticationFailed.is_permanent());
        assert!(ClientError::PoolClosing.is_permanent());
        assert!(ClientError::invalid_configuration("bad").is_permanent());
    }

    #[test]
    fn test_no_operational_factories_carries_cause() {
        let cause = Arc::new(ClientError::connection_failed("refused"));
        let err = ClientError::no_operational_factories(Some(cause));
        let source = err.source().expect("cause should be chained");
        assert!(source.to_string().contains("refused"));
    }
}
