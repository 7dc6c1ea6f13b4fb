//! Typed client errors.
//!
//! Callers branch on [`ClientErrorKind`]; the message is for logs only.

use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientErrorKind {
    /// The node could not be reached.
    Connectivity,
    /// Every pooled connection to the node is in use.
    Busy,
    /// The node rejected the user certificate.
    Authentication,
    /// TLS handshake failed.
    Tls,
    /// The node does not serve the requested chain.
    ChainNotFound,
    Timeout,
    /// A streamed item could not be decoded.
    Stream,
    /// The node refused the request.
    Rejected,
    /// Producing a signature failed.
    Signing,
    Other,
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connectivity => "connectivity",
            Self::Busy => "connections busy",
            Self::Authentication => "authentication",
            Self::Tls => "tls",
            Self::ChainNotFound => "chain not found",
            Self::Timeout => "timeout",
            Self::Stream => "stream",
            Self::Rejected => "rejected",
            Self::Signing => "signing",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Connectivity, message)
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Busy, message)
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Stream, message)
    }

    pub fn is_busy(&self) -> bool {
        self.kind == ClientErrorKind::Busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        let err = ClientError::new(ClientErrorKind::Tls, "bad server name");
        assert_eq!(err.to_string(), "tls error: bad server name");
        assert!(ClientError::busy("pool exhausted").is_busy());
    }
}
