//! Error types for the static server.

use std::net::SocketAddr;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Host and port do not form a socket address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// IO error while serving.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Short recovery hint for terminal output, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Bind { source, .. } if source.kind() == std::io::ErrorKind::AddrInUse => {
                Some("another process is using the port; stop it or pass --port")
            }
            _ => None,
        }
    }
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
