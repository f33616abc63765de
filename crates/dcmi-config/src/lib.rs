//! Shared configuration for the DCMI daemon and its libraries.
//!
//! [`Config`] carries the values an operator may tune: where the daemon
//! listens, where the bus bridge lives, which JSON files describe the sensor
//! entities and DCMI capabilities, and how logs are rendered. It is layered by
//! `ortho_config` from built-in defaults, a TOML file, `DCMI_*` environment
//! variables and command-line flags, with later layers taking precedence.
//!
//! The fixed bus vocabulary (interface names, search roots, well-known object
//! paths) lives in [`BusLayout`]. It is a plain value handed to each component
//! instead of a set of global constants, so tests can fabricate their own.

mod defaults;
mod layout;
mod logging;
mod socket;

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CAPABILITIES_CONFIG, DEFAULT_LOG_FILTER, DEFAULT_SENSORS_CONFIG, DEFAULT_TCP_PORT,
    default_bus_endpoint, default_capabilities_config, default_log_filter,
    default_log_filter_string, default_log_format, default_sensors_config,
    default_socket_endpoint,
};
pub use layout::{
    AssetTagLayout, BusLayout, DhcpLayout, EthernetLayout, MapperLayout, NetworkLayout,
    PowerLayout, SystemdLayout,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "DCMI")]
pub struct Config {
    /// Endpoint the daemon listens on for DCMI requests.
    #[serde(default = "default_socket_endpoint")]
    #[ortho_config(default = default_socket_endpoint())]
    pub daemon_socket: SocketEndpoint,
    /// Endpoint of the bridge that forwards directory and property calls to
    /// the system bus.
    #[serde(default = "default_bus_endpoint")]
    #[ortho_config(default = default_bus_endpoint())]
    pub bus_socket: SocketEndpoint,
    /// JSON document describing the DCMI sensor entities.
    #[serde(default = "default_sensors_config")]
    #[ortho_config(default = default_sensors_config())]
    pub sensors_config: Utf8PathBuf,
    /// JSON document describing the supported DCMI capabilities.
    #[serde(default = "default_capabilities_config")]
    #[ortho_config(default = default_capabilities_config())]
    pub capabilities_config: Utf8PathBuf,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: default_socket_endpoint(),
            bus_socket: default_bus_endpoint(),
            sensors_config: default_sensors_config(),
            capabilities_config: default_capabilities_config(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads the configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer fails to parse.
    pub fn load_from_env() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_args(std::env::args_os())
    }

    /// Loads the configuration from an explicit argument list.
    ///
    /// The first item is treated as the program name.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer fails to parse.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Endpoint the daemon listens on.
    #[must_use]
    pub fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Endpoint of the bus bridge.
    #[must_use]
    pub fn bus_socket(&self) -> &SocketEndpoint {
        &self.bus_socket
    }

    /// Path of the sensor entity document.
    #[must_use]
    pub fn sensors_config(&self) -> &Utf8PathBuf {
        &self.sensors_config
    }

    /// Path of the capabilities document.
    #[must_use]
    pub fn capabilities_config(&self) -> &Utf8PathBuf {
        &self.capabilities_config
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
