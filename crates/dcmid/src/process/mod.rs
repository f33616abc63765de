//! Daemon process supervision: launch sequencing and shutdown handling.

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub(crate) use launch::run_daemon_with;
pub use launch::run_daemon;
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
