//! Daemon bootstrap orchestration.

use std::sync::Arc;

use dcmi_bus::{Bus, SocketBus};
use dcmi_config::{BusLayout, Config, SocketPreparationError};
use dcmi_handler::{DcmiHandler, LoadError, load_capabilities, load_sensor_config};
use ortho_config::OrthoError;
use thiserror::Error;

use crate::health::{BootstrapSummary, HealthReporter};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Source of the daemon configuration.
pub trait ConfigLoader: Send + Sync {
    /// Resolves every configuration layer.
    ///
    /// # Errors
    ///
    /// Returns the layered loader's error unchanged.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Reads `DCMI_*` variables, the optional TOML file and process arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_env()
    }
}

/// Loader that returns a configuration resolved earlier.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already loaded configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Connects the bus backend the handlers talk to.
pub trait BusProvider {
    /// Backend produced by this provider.
    type Bus: Bus + 'static;

    /// Builds a backend for the configured bridge.
    fn connect(&self, config: &Config, layout: &BusLayout) -> Self::Bus;
}

/// Provider yielding a [`SocketBus`] for the configured bridge endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketBusProvider;

impl BusProvider for SocketBusProvider {
    type Bus = SocketBus;

    fn connect(&self, config: &Config, layout: &BusLayout) -> SocketBus {
        SocketBus::new(config.bus_socket().clone(), layout.mapper.clone())
    }
}

/// The bootstrap stage that failed, with its cause.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
    /// The sensor entity document could not be loaded.
    #[error("failed to load sensor configuration: {source}")]
    Sensors {
        /// Underlying load error.
        #[source]
        source: LoadError,
    },
    /// The capabilities document could not be loaded.
    #[error("failed to load capabilities: {source}")]
    Capabilities {
        /// Underlying load error.
        #[source]
        source: LoadError,
    },
}

/// A bootstrapped daemon, ready to be put behind a listener.
pub struct Daemon<B> {
    config: Config,
    handler: Arc<DcmiHandler<B>>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl<B> Daemon<B> {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Shared command handler.
    #[must_use]
    pub fn handler(&self) -> Arc<DcmiHandler<B>> {
        Arc::clone(&self.handler)
    }

    /// Health reporter supplied at bootstrap.
    #[must_use]
    pub fn reporter(&self) -> Arc<dyn HealthReporter> {
        Arc::clone(&self.reporter)
    }
}

/// Reports a failed stage before handing the error back.
fn checked<T>(
    reporter: &dyn HealthReporter,
    stage: Result<T, BootstrapError>,
) -> Result<T, BootstrapError> {
    stage.inspect_err(|error| reporter.bootstrap_failed(error))
}

/// Brings the daemon up to the point where it can serve requests.
///
/// Stages run in order: configuration, telemetry, socket directory, sensor
/// document, capabilities document, bus connection. The bus is connected
/// last so a bad document never opens a bridge connection.
///
/// # Errors
///
/// Returns the first failing stage as a [`BootstrapError`], after reporting
/// it to `reporter`.
pub fn bootstrap_with<P>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    provider: &P,
) -> Result<Daemon<P::Bus>, BootstrapError>
where
    P: BusProvider,
{
    reporter.bootstrap_starting();
    let report = &*reporter;

    let config = checked(
        report,
        loader
            .load()
            .map_err(|source| BootstrapError::Configuration { source }),
    )?;
    let telemetry = checked(
        report,
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source }),
    )?;
    checked(
        report,
        config
            .daemon_socket()
            .prepare_filesystem()
            .map_err(|source| BootstrapError::Socket { source }),
    )?;
    let sensors = checked(
        report,
        load_sensor_config(config.sensors_config())
            .map_err(|source| BootstrapError::Sensors { source }),
    )?;
    let capabilities = checked(
        report,
        load_capabilities(config.capabilities_config())
            .map_err(|source| BootstrapError::Capabilities { source }),
    )?;

    let summary = BootstrapSummary {
        sensors: sensors.descriptors().len(),
        power_management: capabilities.power_management(),
    };
    let layout = BusLayout::default();
    let bus = provider.connect(&config, &layout);
    let handler = Arc::new(DcmiHandler::new(bus, layout, sensors, capabilities));
    reporter.bootstrap_succeeded(&config, summary);

    Ok(Daemon {
        config,
        handler,
        telemetry,
        reporter,
    })
}
