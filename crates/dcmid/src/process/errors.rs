use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Reasons the daemon could not start or stop cleanly.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration, telemetry or document loading failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The daemon socket could not be served.
    #[error("listener: {0}")]
    Listener(#[from] ListenerError),
    /// Termination signals could not be awaited.
    #[error("shutdown: {0}")]
    Shutdown(#[from] ShutdownError),
}
