//! Loading of the sensor and capability documents.

use std::fs;
use std::sync::Arc;

use camino::Utf8Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::capabilities::Capabilities;
use crate::entity::{ConfigError, SensorConfig};

const LOADER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::loader");

/// Errors raised while loading a JSON document.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: Arc<std::io::Error>,
    },
    /// The file is not JSON or does not have the expected shape.
    #[error("malformed document: {0}")]
    Parse(#[source] Arc<serde_json::Error>),
    /// The sensor entries violate an ordering or range rule.
    #[error("invalid sensor configuration: {0}")]
    Invalid(#[from] ConfigError),
}

impl LoadError {
    pub(crate) fn parse(source: serde_json::Error) -> Self {
        Self::Parse(Arc::new(source))
    }
}

fn read_json(path: &Utf8Path) -> Result<serde_json::Value, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_string(),
        source: Arc::new(source),
    })?;
    serde_json::from_str(&text).map_err(LoadError::parse)
}

/// Reads and validates the sensor configuration at `path`.
///
/// # Errors
///
/// Returns [`LoadError`] when the file cannot be read, parsed or validated.
pub fn load_sensor_config(path: &Utf8Path) -> Result<SensorConfig, LoadError> {
    let config = SensorConfig::from_value(read_json(path)?)?;
    info!(
        target: LOADER_TARGET,
        path = %path,
        entities = config.descriptors().len(),
        "loaded sensor configuration"
    );
    Ok(config)
}

/// Reads the capability flags at `path`.
///
/// # Errors
///
/// Returns [`LoadError`] when the file cannot be read or parsed.
pub fn load_capabilities(path: &Utf8Path) -> Result<Capabilities, LoadError> {
    let capabilities = Capabilities::from_value(&read_json(path)?);
    debug!(
        target: LOADER_TARGET,
        path = %path,
        power_management = capabilities.power_management(),
        "loaded capabilities"
    );
    Ok(capabilities)
}
