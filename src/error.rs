//! Centralized error types for elogsubmit.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the elogsubmit library.
#[derive(Error, Debug)]
pub enum ElogError {
    /// A field value supplied by the caller is out of bounds or unknown.
    #[error("Invalid value: {0}")]
    Validation(String),

    /// The encoded entry failed schema validation.
    #[error("Schema validation of the entry fails:\n{diagnostics}")]
    SchemaInvalid { diagnostics: String },

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The server answered, but rejected the entry or sent an unexpected reply.
    #[error("Server error: {0}")]
    Server(String),

    /// The entry could not be handed to the server at all.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Required configuration is missing or unreadable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// XML could not be written or read.
    #[error("XML error: {0}")]
    Xml(String),

    /// Direct delivery failed and writing the queue file failed too.
    #[error("Could not queue entry after delivery failed ({transport}): {source}")]
    QueueAfterTransport {
        transport: String,
        source: Box<ElogError>,
    },
}

/// Convenience alias for `Result<T, ElogError>`.
pub type Result<T> = std::result::Result<T, ElogError>;

impl ElogError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this failure should send the entry to the queue instead.
    ///
    /// Only transport failures qualify; everything else means the caller
    /// has to fix something first.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the root cause is a filesystem failure.
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io { .. } => true,
            Self::QueueAfterTransport { source, .. } => source.is_io(),
            _ => false,
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `ElogError::io`).
impl From<std::io::Error> for ElogError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_retriable() {
        assert!(ElogError::Transport("connection refused".into()).is_retriable());
        assert!(!ElogError::Server("bad".into()).is_retriable());
        assert!(!ElogError::SchemaInvalid {
            diagnostics: String::new()
        }
        .is_retriable());
    }

    #[test]
    fn test_queue_after_transport_is_io() {
        let err = ElogError::QueueAfterTransport {
            transport: "timed out".into(),
            source: Box::new(ElogError::io(
                "/queue/x.xml",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            )),
        };
        assert!(err.is_io());
        let text = err.to_string();
        assert!(text.contains("timed out"));
        assert!(text.contains("denied"));
    }
}
