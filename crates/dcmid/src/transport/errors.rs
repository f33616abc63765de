//! Listener failures.

use std::io;

use thiserror::Error;

/// Errors raised while binding or running the daemon listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The TCP host did not resolve to a usable address.
    #[error("cannot resolve listener address {endpoint}: {source}")]
    Address {
        /// Endpoint being bound.
        endpoint: String,
        /// Resolution failure.
        #[source]
        source: io::Error,
    },
    /// Binding the socket failed.
    #[error("cannot bind {endpoint}: {source}")]
    Bind {
        /// Endpoint being bound.
        endpoint: String,
        /// Bind failure.
        #[source]
        source: io::Error,
    },
    /// The bound socket could not be switched to non-blocking accepts.
    #[error("cannot configure listener {endpoint}: {source}")]
    Configure {
        /// Endpoint being configured.
        endpoint: String,
        /// Configuration failure.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are not available on this platform.
    #[error("unix socket endpoints are unsupported here: {endpoint}")]
    Unsupported {
        /// Requested endpoint.
        endpoint: String,
    },
    /// Another process is accepting on the socket path.
    #[error("socket {path} is served by another process")]
    SocketInUse {
        /// Socket path.
        path: String,
    },
    /// The socket path exists but is not a socket.
    #[error("{path} exists and is not a socket")]
    NotASocket {
        /// Offending path.
        path: String,
    },
    /// A leftover socket file could not be inspected or removed.
    #[error("cannot clear stale socket {path}: {source}")]
    StaleSocket {
        /// Socket path.
        path: String,
        /// Filesystem failure.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked.
    #[error("listener thread panicked")]
    Panicked,
}
