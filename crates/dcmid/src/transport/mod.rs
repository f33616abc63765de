//! Socket listener for the daemon endpoint.
//!
//! The listener binds the configured endpoint and accepts connections in a
//! background thread. Every accepted connection gets bounded read and write
//! timeouts and runs on its own thread. At most [`MAX_CONNECTIONS`] run at
//! once; excess clients are closed immediately.

mod errors;
mod handler;
mod listener;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::listener::{ListenerHandle, SocketListener};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Connections served concurrently before new clients are refused.
pub(crate) const MAX_CONNECTIONS: usize = 16;
