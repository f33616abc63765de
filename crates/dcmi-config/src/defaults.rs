use camino::Utf8PathBuf;

#[cfg(unix)]
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::runtime_dir;

use crate::socket::SocketEndpoint;

/// Default TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 9780;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Sensor entity document shipped with the IPMI providers.
pub const DEFAULT_SENSORS_CONFIG: &str = "/usr/share/ipmi-providers/dcmi_sensors.json";

/// Capabilities document shipped with the IPMI providers.
pub const DEFAULT_CAPABILITIES_CONFIG: &str = "/usr/share/ipmi-providers/dcmi_cap.json";

/// Default log filter expression used by the daemon.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default location of the sensor entity document.
#[must_use]
pub fn default_sensors_config() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_SENSORS_CONFIG)
}

/// Default location of the capabilities document.
#[must_use]
pub fn default_capabilities_config() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_CAPABILITIES_CONFIG)
}

/// Computes the default socket endpoint for the daemon.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    runtime_endpoint("dcmid.sock", DEFAULT_TCP_PORT)
}

/// Computes the default endpoint of the bus bridge.
#[must_use]
pub fn default_bus_endpoint() -> SocketEndpoint {
    runtime_endpoint("bus-bridge.sock", DEFAULT_TCP_PORT + 1)
}

#[cfg(unix)]
fn runtime_endpoint(file_name: &str, _port: u16) -> SocketEndpoint {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("dcmi");
    if apply_namespace {
        base.push(user_namespace());
    }

    SocketEndpoint::unix(base.join(file_name))
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn runtime_endpoint(_file_name: &str, port: u16) -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", port)
}
