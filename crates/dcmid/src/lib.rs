//! Bootstrap logic and request loop for the DCMI daemon.
//!
//! The daemon answers DCMI requests over a socket configured via
//! [`dcmi_config`]. Bootstrap loads the configuration, initialises structured
//! telemetry, prepares the socket filesystem and reads the sensor and
//! capability documents. It then connects a bus backend through a
//! [`BusProvider`]. The resulting [`Daemon`] owns a shared
//! [`dcmi_handler::DcmiHandler`] that the listener hands to every connection.
//!
//! Each connection carries one JSONL request naming a DCMI command and its
//! fields. The reply is a single JSONL line holding the IPMI completion code
//! and either the response data or an error message.
//!
//! Health reporting hooks emit structured telemetry at each bootstrap and
//! listener stage so operators can diagnose failures quickly.

mod bootstrap;
mod dispatch;
mod health;
mod process;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, BusProvider, ConfigLoader, Daemon, SocketBusProvider, StaticConfigLoader,
    SystemConfigLoader, bootstrap_with,
};
pub use health::{BootstrapSummary, HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
