//! Get and Set DCMI Configuration Parameters.

use dcmi_bus::{Bus, BusError, MethodCall, ObjectDirectory, PropertyClient, ServiceResolver, Value};
use dcmi_config::BusLayout;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DcmiError;

const CONF_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::conf_params");

const CONFORMANCE_MAJOR: u8 = 0x01;
const CONFORMANCE_MINOR: u8 = 0x05;
const PARAMETER_REVISION: u8 = 0x01;

const ACTIVATE_DHCP_MASK: u8 = 0x01;
const OPTION_12_MASK: u8 = 0x01;

const DHCP_TIMING1: [u8; 1] = [0x04];
const DHCP_TIMING2: [u8; 2] = 0x0078_u16.to_le_bytes();
const DHCP_TIMING3: [u8; 2] = 0x0040_u16.to_le_bytes();

const DHCP_DISABLED_SUFFIX: &str = ".none";

/// Configuration parameter selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigParameter {
    /// Restart DHCP on the management interfaces (set only).
    ActivateDhcp,
    /// DHCP discovery options; bit 0 sends the host name (option 12).
    DiscoveryConfig,
    /// Initial timeout interval, in seconds.
    DhcpTiming1,
    /// Server contact timeout interval, in seconds.
    DhcpTiming2,
    /// Server contact retry interval, in seconds.
    DhcpTiming3,
}

impl ConfigParameter {
    /// Maps a selector byte onto a parameter.
    #[must_use]
    pub const fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            1 => Some(Self::ActivateDhcp),
            2 => Some(Self::DiscoveryConfig),
            3 => Some(Self::DhcpTiming1),
            4 => Some(Self::DhcpTiming2),
            5 => Some(Self::DhcpTiming3),
            _ => None,
        }
    }

    /// Selector byte of the parameter.
    #[must_use]
    pub const fn selector(self) -> u8 {
        match self {
            Self::ActivateDhcp => 1,
            Self::DiscoveryConfig => 2,
            Self::DhcpTiming1 => 3,
            Self::DhcpTiming2 => 4,
            Self::DhcpTiming3 => 5,
        }
    }
}

/// Set DCMI Configuration Parameters request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetConfParamsRequest {
    /// Parameter selector.
    pub parameter: u8,
    /// Set selector; zero for single-set parameters.
    #[serde(default)]
    pub set_selector: u8,
    /// Parameter data.
    #[serde(default)]
    pub data: Vec<u8>,
}

/// Get DCMI Configuration Parameters request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetConfParamsRequest {
    /// Parameter selector.
    pub parameter: u8,
    /// Set selector; zero for single-set parameters.
    #[serde(default)]
    pub set_selector: u8,
}

/// Get DCMI Configuration Parameters response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfParamsResponse {
    /// DCMI conformance, major version.
    pub major: u8,
    /// DCMI conformance, minor version.
    pub minor: u8,
    /// Parameter revision.
    pub revision: u8,
    /// Parameter data.
    pub data: Vec<u8>,
}

impl ConfParamsResponse {
    fn with_data(data: Vec<u8>) -> Self {
        Self {
            major: CONFORMANCE_MAJOR,
            minor: CONFORMANCE_MINOR,
            revision: PARAMETER_REVISION,
            data,
        }
    }
}

fn first_byte(data: &[u8]) -> Result<u8, DcmiError> {
    match data {
        [byte] => Ok(*byte),
        _ => Err(DcmiError::request_length("data", 1, data.len())),
    }
}

fn dhcp_enabled(value: &Value) -> bool {
    match value {
        Value::Bool(enabled) => *enabled,
        Value::String(mode) => !mode.ends_with(DHCP_DISABLED_SUFFIX),
        _ => false,
    }
}

fn any_interface_uses_dhcp<B: Bus + ?Sized>(bus: &B, layout: &BusLayout) -> Result<bool, DcmiError> {
    let ethernet = &layout.ethernet;
    let interfaces = ObjectDirectory::new(bus).subtree(&ethernet.interface, &ethernet.search_root)?;
    let properties = PropertyClient::new(bus);
    for entry in &interfaces {
        let Some(service) = entry.first_service() else {
            continue;
        };
        let value = properties.get(
            service,
            &entry.path,
            &ethernet.interface,
            &ethernet.dhcp_enabled_property,
        )?;
        if dhcp_enabled(&value) {
            debug!(target: CONF_TARGET, path = %entry.path, "interface uses DHCP");
            return Ok(true);
        }
    }
    Ok(false)
}

fn activate_dhcp<B: Bus + ?Sized>(bus: &B, layout: &BusLayout, flags: u8) -> Result<(), DcmiError> {
    if flags & ACTIVATE_DHCP_MASK == 0 || !any_interface_uses_dhcp(bus, layout)? {
        return Ok(());
    }
    let systemd = &layout.systemd;
    bus.call(&MethodCall {
        service: systemd.service.clone(),
        path: systemd.path.clone(),
        interface: systemd.interface.clone(),
        member: "RestartUnit".to_owned(),
        arguments: vec![
            Value::from(systemd.network_unit.as_str()),
            Value::from("replace"),
        ],
    })?;
    info!(
        target: CONF_TARGET,
        unit = %systemd.network_unit,
        "restarted network unit to activate DHCP"
    );
    Ok(())
}

fn dhcp_service<B: Bus + ?Sized>(bus: &B, layout: &BusLayout) -> Result<String, DcmiError> {
    Ok(ServiceResolver::new(bus).resolve_owner(&layout.dhcp.path, &layout.dhcp.interface)?)
}

/// Applies a configuration parameter.
///
/// # Errors
///
/// Returns [`DcmiError::InvalidField`] for unknown or read-only parameters,
/// [`DcmiError::RequestLength`] when the data is not exactly one byte, or the
/// bus failure.
pub(crate) fn set_conf_params<B: Bus + ?Sized>(
    bus: &B,
    layout: &BusLayout,
    request: &SetConfParamsRequest,
) -> Result<(), DcmiError> {
    let parameter = ConfigParameter::from_selector(request.parameter)
        .ok_or_else(|| DcmiError::invalid_field("parameter", request.parameter))?;
    match parameter {
        ConfigParameter::ActivateDhcp => activate_dhcp(bus, layout, first_byte(&request.data)?),
        ConfigParameter::DiscoveryConfig => {
            let flags = first_byte(&request.data)?;
            let service = dhcp_service(bus, layout)?;
            PropertyClient::new(bus).set(
                &service,
                &layout.dhcp.path,
                &layout.dhcp.interface,
                &layout.dhcp.send_hostname_property,
                Value::Bool(flags & OPTION_12_MASK != 0),
            )?;
            Ok(())
        }
        ConfigParameter::DhcpTiming1 | ConfigParameter::DhcpTiming2 | ConfigParameter::DhcpTiming3 => {
            Err(DcmiError::invalid_field("parameter", request.parameter))
        }
    }
}

/// Reads a configuration parameter.
///
/// # Errors
///
/// Returns [`DcmiError::InvalidField`] for unknown or write-only parameters,
/// or the bus failure.
pub(crate) fn get_conf_params<B: Bus + ?Sized>(
    bus: &B,
    layout: &BusLayout,
    request: GetConfParamsRequest,
) -> Result<ConfParamsResponse, DcmiError> {
    let parameter = ConfigParameter::from_selector(request.parameter)
        .ok_or_else(|| DcmiError::invalid_field("parameter", request.parameter))?;
    let data = match parameter {
        ConfigParameter::ActivateDhcp => {
            return Err(DcmiError::invalid_field("parameter", request.parameter));
        }
        ConfigParameter::DiscoveryConfig => {
            let service = dhcp_service(bus, layout)?;
            let value = PropertyClient::new(bus).get(
                &service,
                &layout.dhcp.path,
                &layout.dhcp.interface,
                &layout.dhcp.send_hostname_property,
            )?;
            let send_host_name = value.as_bool().ok_or_else(|| {
                BusError::type_mismatch(
                    layout.dhcp.path.as_str(),
                    layout.dhcp.send_hostname_property.as_str(),
                    "bool",
                    value.type_name(),
                )
            })?;
            vec![if send_host_name { OPTION_12_MASK } else { 0 }]
        }
        ConfigParameter::DhcpTiming1 => DHCP_TIMING1.to_vec(),
        ConfigParameter::DhcpTiming2 => DHCP_TIMING2.to_vec(),
        ConfigParameter::DhcpTiming3 => DHCP_TIMING3.to_vec(),
    };
    Ok(ConfParamsResponse::with_data(data))
}
