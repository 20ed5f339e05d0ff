//! Common error types used throughout ocbridge.
//!
//! This module provides a unified error type that covers the failure cases of
//! talking to the media server and persisting its configuration: missing
//! configuration, rejected credentials, remote failures, and database errors.

/// Common error type for ocbridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The media server rejected the configured credentials.
    #[error("Access denied by {0}")]
    AccessDenied(String),

    /// No valid configuration exists for the named service.
    #[error("Configuration for service '{0}' is missing or invalid")]
    Configuration(String),

    /// A call to the media server failed for a reason other than credentials.
    #[error("Remote error: {0}")]
    Remote(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new AccessDenied error naming the rejecting host.
    pub fn access_denied<S: Into<String>>(host: S) -> Self {
        Self::AccessDenied(host.into())
    }

    /// Create a new Configuration error for a service name.
    pub fn configuration<S: Into<String>>(service: S) -> Self {
        Self::Configuration(service.into())
    }

    /// Create a new Remote error.
    pub fn remote<S: Into<String>>(msg: S) -> Self {
        Self::Remote(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error means the remote side refused our credentials.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("config 1");
        assert_eq!(err.to_string(), "Not found: config 1");

        let err = Error::access_denied("https://oc.example.org");
        assert_eq!(err.to_string(), "Access denied by https://oc.example.org");

        let err = Error::configuration("mediapackage");
        assert_eq!(
            err.to_string(),
            "Configuration for service 'mediapackage' is missing or invalid"
        );

        let err = Error::database("connection failed");
        assert_eq!(err.to_string(), "Database error: connection failed");

        let err = Error::remote("503 Service Unavailable");
        assert_eq!(err.to_string(), "Remote error: 503 Service Unavailable");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_is_access_denied() {
        assert!(Error::access_denied("host").is_access_denied());
        assert!(!Error::remote("timeout").is_access_denied());
        assert!(!Error::configuration("mediapackage").is_access_denied());
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::Internal(_)));
    }
}
