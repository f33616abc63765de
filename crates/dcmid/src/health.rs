//! Lifecycle reporting for operators and tests.

use std::sync::Arc;

use dcmi_config::{Config, SocketEndpoint};
use tracing::{error, info};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// What bootstrap loaded, reported once it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapSummary {
    /// Sensor entity descriptors across all entity types.
    pub sensors: usize,
    /// Whether Get Power Reading is served.
    pub power_management: bool,
}

/// Receives daemon lifecycle events in the order they happen.
pub trait HealthReporter: Send + Sync {
    /// Bootstrap is about to load configuration.
    fn bootstrap_starting(&self);

    /// Bootstrap finished; the handler is ready.
    fn bootstrap_succeeded(&self, config: &Config, summary: BootstrapSummary);

    /// Bootstrap stopped at `error`.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// The listener accepts requests on `endpoint`.
    fn listener_ready(&self, endpoint: &SocketEndpoint);

    /// A termination signal arrived.
    fn shutdown_started(&self);

    /// The listener has stopped and its socket is gone.
    fn shutdown_completed(&self);
}

impl<T: HealthReporter + ?Sized> HealthReporter for Arc<T> {
    fn bootstrap_starting(&self) {
        T::bootstrap_starting(self);
    }

    fn bootstrap_succeeded(&self, config: &Config, summary: BootstrapSummary) {
        T::bootstrap_succeeded(self, config, summary);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        T::bootstrap_failed(self, error);
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        T::listener_ready(self, endpoint);
    }

    fn shutdown_started(&self) {
        T::shutdown_started(self);
    }

    fn shutdown_completed(&self) {
        T::shutdown_completed(self);
    }
}

/// Reporter that emits each event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds the reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        info!(target: HEALTH_TARGET, event = "bootstrap_starting", "loading configuration");
    }

    fn bootstrap_succeeded(&self, config: &Config, summary: BootstrapSummary) {
        info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            bus = %config.bus_socket(),
            sensors_config = %config.sensors_config(),
            sensors = summary.sensors,
            power_management = summary.power_management,
            "DCMI handler ready"
        );
    }

    fn bootstrap_failed(&self, failure: &BootstrapError) {
        error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %failure,
            "bootstrap failed"
        );
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            %endpoint,
            "serving DCMI requests"
        );
    }

    fn shutdown_started(&self) {
        info!(target: HEALTH_TARGET, event = "shutdown_started", "stopping listener");
    }

    fn shutdown_completed(&self) {
        info!(target: HEALTH_TARGET, event = "shutdown_completed", "daemon stopped");
    }
}
