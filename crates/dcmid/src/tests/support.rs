//! Collaborator doubles shared by the daemon test suites.

use std::ffi::OsString;
use std::fs;
use std::sync::{Arc, Mutex};

use camino::Utf8PathBuf;
use dcmi_bus::MemoryBus;
use dcmi_config::{BusLayout, Config, SocketEndpoint};
use ortho_config::OrthoError;
use tempfile::TempDir;

use crate::bootstrap::{BootstrapError, BusProvider, ConfigLoader};
use crate::health::{BootstrapSummary, HealthReporter};

pub(crate) const SENSORS_DOCUMENT: &str = r#"{
    "inlet": [
        {"dbus": "/xyz/openbmc_project/sensors/temperature/inlet0", "record_id": 1},
        {"dbus": "/xyz/openbmc_project/sensors/temperature/inlet1", "record_id": 2}
    ],
    "cpu": [
        {"dbus": "/xyz/openbmc_project/sensors/temperature/cpu0", "record_id": 10},
        {"dbus": "/xyz/openbmc_project/sensors/temperature/cpu1", "record_id": 11},
        {"dbus": "/xyz/openbmc_project/sensors/temperature/cpu2", "record_id": 12}
    ]
}"#;

/// Loader writing the sensor and capability documents into a temporary
/// directory and listening on a socket inside it.
pub(crate) struct TestConfigLoader {
    directory: Arc<Mutex<TempDir>>,
    write_sensors: bool,
}

impl TestConfigLoader {
    pub(crate) fn new() -> Self {
        let directory = TempDir::new().expect("failed to create temporary directory");
        Self {
            directory: Arc::new(Mutex::new(directory)),
            write_sensors: true,
        }
    }

    /// Loader whose sensor document is never written.
    pub(crate) fn without_sensors() -> Self {
        Self {
            write_sensors: false,
            ..Self::new()
        }
    }

    pub(crate) fn path(&self, name: &str) -> Utf8PathBuf {
        let directory = self
            .directory
            .lock()
            .expect("temporary directory mutex poisoned");
        Utf8PathBuf::from_path_buf(directory.path().join(name))
            .expect("temporary path was not valid UTF-8")
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let sensors = self.path("sensors.json");
        let capabilities = self.path("capabilities.json");
        if self.write_sensors {
            fs::write(&sensors, SENSORS_DOCUMENT).expect("write sensor document");
        }
        fs::write(&capabilities, r#"{"PowerManagement": 1}"#).expect("write capabilities");
        Ok(Config {
            daemon_socket: SocketEndpoint::unix(self.path("dcmid.sock")),
            sensors_config: sensors,
            capabilities_config: capabilities,
            ..Config::default()
        })
    }
}

/// Loader that fails by passing an unparseable socket endpoint.
pub(crate) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_args([
            OsString::from("dcmid"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ])
    }
}

/// Provider handing out an empty in-memory bus and counting connections.
#[derive(Default)]
pub(crate) struct MemoryBusProvider {
    connects: Mutex<usize>,
}

impl MemoryBusProvider {
    pub(crate) fn connects(&self) -> usize {
        *self.connects.lock().expect("provider mutex poisoned")
    }
}

impl BusProvider for MemoryBusProvider {
    type Bus = MemoryBus;

    fn connect(&self, _config: &Config, _layout: &BusLayout) -> MemoryBus {
        *self.connects.lock().expect("provider mutex poisoned") += 1;
        MemoryBus::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded(BootstrapSummary),
    BootstrapFailed(String),
    ListenerReady(String),
    ShutdownStarted,
    ShutdownCompleted,
}

/// Records health events for assertions.
#[derive(Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config, summary: BootstrapSummary) {
        self.record(HealthEvent::BootstrapSucceeded(summary));
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        self.record(HealthEvent::ListenerReady(endpoint.to_string()));
    }

    fn shutdown_started(&self) {
        self.record(HealthEvent::ShutdownStarted);
    }

    fn shutdown_completed(&self) {
        self.record(HealthEvent::ShutdownCompleted);
    }
}
