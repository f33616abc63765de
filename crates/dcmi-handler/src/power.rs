//! Power reading aggregation.

use std::time::{SystemTime, UNIX_EPOCH};

use dcmi_bus::{Bus, BusError, ObjectDirectory, PropertyClient, PropertyMap, Value};
use dcmi_config::PowerLayout;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DcmiError;

const POWER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::power");

/// Marker for a power statistic the backend does not expose.
pub const UNAVAILABLE_WATTS: u16 = 0xFFFF;

/// Marker for a sampling window the backend does not expose.
pub const UNAVAILABLE_TIME_FRAME: u32 = 0xFFFF_FFFF;

/// Reading state reported when every statistic is present: "power
/// measurement active".
const STATE_ACTIVE: u8 = 0x40;

/// Largest wattage reported before saturating; `0xFFFF` is the sentinel.
const MAX_WATTS: u16 = 0xFFFE;

/// Longest sampling window reported before saturating, one below the sentinel.
const MAX_TIME_FRAME: u32 = 0xFFFF_FFFE;

/// Get Power Reading request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPowerReadingRequest {
    /// Reading mode; `1` selects system power statistics.
    pub mode: u8,
    /// Mode attributes; reserved for system power statistics.
    #[serde(default)]
    pub mode_attribute: u8,
}

impl GetPowerReadingRequest {
    /// System power statistics mode.
    pub const SYSTEM_POWER_STATISTICS: u8 = 0x01;
}

/// One power reading, produced fresh for each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerReading {
    /// Current power in watts.
    pub current: u16,
    /// Minimum over the sampling window, or [`UNAVAILABLE_WATTS`].
    pub minimum: u16,
    /// Maximum over the sampling window, or [`UNAVAILABLE_WATTS`].
    pub maximum: u16,
    /// Average over the sampling window, or [`UNAVAILABLE_WATTS`].
    pub average: u16,
    /// Seconds since the Unix epoch when the reading was taken.
    pub timestamp: u32,
    /// Sampling window in milliseconds, or [`UNAVAILABLE_TIME_FRAME`].
    pub time_frame: u32,
    /// Reading state flags; check before trusting the statistics.
    pub state: u8,
}

/// Locates the power reading object and assembles a [`PowerReading`].
///
/// No defaults are substituted for the current value: a missing object or
/// property fails the request.
#[derive(Debug)]
pub struct PowerAggregator<'a, B: ?Sized> {
    bus: &'a B,
    layout: &'a PowerLayout,
}

impl<'a, B> PowerAggregator<'a, B>
where
    B: Bus + ?Sized,
{
    /// Creates an aggregator over `bus`.
    #[must_use]
    pub const fn new(bus: &'a B, layout: &'a PowerLayout) -> Self {
        Self { bus, layout }
    }

    /// Reads the power sensor, stamping the reading with the current time.
    ///
    /// # Errors
    ///
    /// Propagates directory and property failures, and returns
    /// [`DcmiError::MissingProperty`] when the current value is absent.
    pub fn read_power(&self) -> Result<PowerReading, DcmiError> {
        self.read_power_at(unix_seconds())
    }

    /// Reads the power sensor, stamping the reading with `timestamp`.
    ///
    /// # Errors
    ///
    /// See [`Self::read_power`].
    pub fn read_power_at(&self, timestamp: u32) -> Result<PowerReading, DcmiError> {
        let layout = self.layout;
        let object = ObjectDirectory::new(self.bus).locate(
            &layout.interface,
            &layout.search_root,
            None,
        )?;
        let properties = PropertyClient::new(self.bus).get_all(
            &object.service,
            &object.path,
            &layout.interface,
        )?;

        let current = match properties.get(&layout.current_property) {
            Some(value) => watts(value, &object.path, &layout.current_property)?,
            None => {
                warn!(
                    target: POWER_TARGET,
                    path = %object.path,
                    property = %layout.current_property,
                    "power reading has no current value"
                );
                return Err(DcmiError::MissingProperty {
                    path: object.path,
                    property: layout.current_property.clone(),
                });
            }
        };

        let minimum = optional_watts(&properties, &object.path, &layout.minimum_property)?;
        let maximum = optional_watts(&properties, &object.path, &layout.maximum_property)?;
        let average = optional_watts(&properties, &object.path, &layout.average_property)?;
        let time_frame = properties
            .get(&layout.time_frame_property)
            .map(|value| {
                number(value, &object.path, &layout.time_frame_property).map(|millis| {
                    u32::try_from(millis)
                        .map_or(MAX_TIME_FRAME, |frame| frame.min(MAX_TIME_FRAME))
                })
            })
            .transpose()?;

        let state = match properties.get(&layout.state_property) {
            Some(value) => {
                let raw = number(value, &object.path, &layout.state_property)?;
                u8::try_from(raw).map_err(|_| {
                    BusError::type_mismatch(
                        object.path.as_str(),
                        layout.state_property.as_str(),
                        "8-bit state",
                        value.type_name(),
                    )
                })?
            }
            None if [minimum, maximum, average].iter().all(Option::is_some)
                && time_frame.is_some() =>
            {
                STATE_ACTIVE
            }
            None => 0,
        };

        let reading = PowerReading {
            current,
            minimum: minimum.unwrap_or(UNAVAILABLE_WATTS),
            maximum: maximum.unwrap_or(UNAVAILABLE_WATTS),
            average: average.unwrap_or(UNAVAILABLE_WATTS),
            timestamp,
            time_frame: time_frame.unwrap_or(UNAVAILABLE_TIME_FRAME),
            state,
        };
        debug!(target: POWER_TARGET, ?reading, "read power");
        Ok(reading)
    }
}

fn number(value: &Value, path: &str, property: &str) -> Result<u64, BusError> {
    value
        .as_u64()
        .ok_or_else(|| BusError::type_mismatch(path, property, "unsigned number", value.type_name()))
}

fn watts(value: &Value, path: &str, property: &str) -> Result<u16, BusError> {
    let raw = number(value, path, property)?;
    Ok(u16::try_from(raw).map_or(MAX_WATTS, |watts| watts.min(MAX_WATTS)))
}

fn optional_watts(
    properties: &PropertyMap,
    path: &str,
    property: &str,
) -> Result<Option<u16>, BusError> {
    properties
        .get(property)
        .map(|value| watts(value, path, property))
        .transpose()
}

fn unix_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX))
}
