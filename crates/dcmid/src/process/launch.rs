//! Launch sequencing: bootstrap, listen, wait, stop.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{BusProvider, ConfigLoader, SocketBusProvider, SystemConfigLoader, bootstrap_with};
use crate::dispatch::DispatchConnectionHandler;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::transport::SocketListener;

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::PROCESS_TARGET;

/// Runs the daemon in the foreground with the production collaborators.
///
/// Returns once a termination signal has been received and the listener has
/// stopped.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, binding or signal installation
/// fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &SocketBusProvider,
        &SystemShutdownSignal,
    )
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<P, S>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    provider: &P,
    shutdown: &S,
) -> Result<(), LaunchError>
where
    P: BusProvider,
    S: ShutdownSignal + ?Sized,
{
    info!(target: PROCESS_TARGET, "starting daemon runtime");
    let daemon = bootstrap_with(loader, Arc::clone(&reporter), provider)?;
    let listener = SocketListener::bind(daemon.config().daemon_socket())?;
    let endpoint = listener.endpoint().clone();
    let handler = Arc::new(DispatchConnectionHandler::new(daemon.handler()));

    let listener_handle = listener.start(handler)?;
    reporter.listener_ready(&endpoint);
    shutdown.wait()?;
    reporter.shutdown_started();
    listener_handle.shutdown();
    listener_handle.join()?;
    reporter.shutdown_completed();
    info!(target: PROCESS_TARGET, "daemon runtime finished");
    Ok(())
}
