//! Error types for POP3 operations.

use std::io;
use std::time::Duration;

/// Result type alias for POP3 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// POP3 error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on the transport. The connection is unusable afterwards.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Dial did not complete in time.
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    /// Status line was neither `+OK` nor `-ERR`, or framing was violated.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server answered `-ERR`. The connection remains usable.
    #[error("Server error: {0}")]
    Server(String),

    /// A `DELE` in a batch failed; earlier deletions stay staged.
    #[error("Failed to delete message {id}: {source}")]
    Delete {
        /// Message that could not be deleted.
        id: u32,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// Malformed numeric field, date or header in a response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Retrieved message could not be decoded.
    #[error("MIME error: {0}")]
    Mime(#[from] mailledger_mime::Error),

    /// Operation not allowed in the current session state.
    #[error("Invalid state for operation: {0}")]
    InvalidState(String),
}

impl Error {
    /// Creates a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this is a transport-level failure.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Io(_) | Self::Tls(_) | Self::InvalidDnsName(_) | Self::Timeout(_) => true,
            Self::Delete { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// Returns true if the server rejected the command with `-ERR`.
    #[must_use]
    pub fn is_server(&self) -> bool {
        match self {
            Self::Server(_) => true,
            Self::Delete { source, .. } => source.is_server(),
            _ => false,
        }
    }

    /// Returns true if the connection can no longer be used.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Protocol(_) => true,
            Self::Delete { source, .. } => source.is_fatal(),
            other => other.is_transport(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let io = Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(io.is_transport());
        assert!(io.is_fatal());
        assert!(!io.is_server());

        let server = Error::Server("no such message".into());
        assert!(server.is_server());
        assert!(!server.is_fatal());

        assert!(Error::Protocol("garbage".into()).is_fatal());
        assert!(!Error::parse("bad number").is_fatal());
    }

    #[test]
    fn test_delete_error_delegates() {
        let err = Error::Delete {
            id: 5,
            source: Box::new(Error::Server("message 5 already deleted".into())),
        };
        assert!(err.is_server());
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Failed to delete message 5: Server error: message 5 already deleted"
        );
    }
}
