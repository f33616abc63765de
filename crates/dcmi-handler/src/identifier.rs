//! Get and Set Management Controller Identifier String.
//!
//! The identifier is the host name held by the network configuration object.

use dcmi_bus::{Bus, BusError, PropertyClient, ServiceResolver, Value};
use dcmi_config::NetworkLayout;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::asset_tag::MAX_TRANSFER;
use crate::error::DcmiError;

const IDENTIFIER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::identifier");

/// Longest identifier string, excluding the terminating NUL.
const MAX_IDENTIFIER: usize = 63;

/// Get Management Controller Identifier String request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCtrlIdRequest {
    /// Offset of the first byte to read.
    pub offset: u8,
    /// Number of bytes to read, at most 16.
    pub bytes: u8,
}

/// Get Management Controller Identifier String response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CtrlIdResponse {
    /// Length of the whole identifier.
    pub total_length: u8,
    /// Requested slice of the identifier.
    pub data: Vec<u8>,
}

/// Set Management Controller Identifier String request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCtrlIdRequest {
    /// Offset at which `data` is written.
    pub offset: u8,
    /// Bytes to write, at most 16; a NUL ends the identifier.
    pub data: Vec<u8>,
}

/// Set Management Controller Identifier String response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SetCtrlIdResponse {
    /// Length of the identifier after the write.
    pub total_length: u8,
}

struct HostName {
    service: String,
    bytes: Vec<u8>,
}

fn read_host_name<B: Bus + ?Sized>(bus: &B, layout: &NetworkLayout) -> Result<HostName, DcmiError> {
    let service =
        ServiceResolver::new(bus).resolve_owner(&layout.config_path, &layout.config_interface)?;
    let value = PropertyClient::new(bus).get(
        &service,
        &layout.config_path,
        &layout.config_interface,
        &layout.hostname_property,
    )?;
    let name = match value {
        Value::String(name) => name,
        other => {
            return Err(BusError::type_mismatch(
                layout.config_path.as_str(),
                layout.hostname_property.as_str(),
                "string",
                other.type_name(),
            )
            .into());
        }
    };
    Ok(HostName {
        service,
        bytes: name.into_bytes(),
    })
}

fn length_byte(length: usize) -> u8 {
    u8::try_from(length).unwrap_or(u8::MAX)
}

/// Returns up to 16 bytes of the identifier starting at `offset`.
///
/// # Errors
///
/// Returns [`DcmiError::InvalidField`] when more than 16 bytes are requested,
/// [`DcmiError::OutOfRange`] when the window passes byte 63 or starts past
/// the end of the identifier, or the lookup failure.
pub(crate) fn get_ctrl_id<B: Bus + ?Sized>(
    bus: &B,
    layout: &NetworkLayout,
    request: GetCtrlIdRequest,
) -> Result<CtrlIdResponse, DcmiError> {
    let offset = usize::from(request.offset);
    let requested = usize::from(request.bytes);
    if requested > MAX_TRANSFER {
        return Err(DcmiError::invalid_field("bytes", request.bytes));
    }
    if offset + requested > MAX_IDENTIFIER {
        return Err(DcmiError::out_of_range(
            "offset",
            offset + requested,
            MAX_IDENTIFIER,
        ));
    }

    let mut name = read_host_name(bus, layout)?.bytes;
    name.truncate(MAX_IDENTIFIER);
    let Some(tail) = name.get(offset..) else {
        return Err(DcmiError::out_of_range("offset", offset, name.len()));
    };

    Ok(CtrlIdResponse {
        total_length: length_byte(name.len()),
        data: tail.iter().take(requested).copied().collect(),
    })
}

/// Writes `request.data` into the identifier at `offset`.
///
/// Bytes past the written window are kept unless the data contains a NUL,
/// which ends the identifier there.
///
/// # Errors
///
/// Returns [`DcmiError::InvalidField`] for more than 16 bytes of data or a
/// result that is not UTF-8, [`DcmiError::OutOfRange`] when the write would
/// pass the terminator slot
/// after byte 63 or start past the end of the identifier, or the lookup or
/// write failure.
pub(crate) fn set_ctrl_id<B: Bus + ?Sized>(
    bus: &B,
    layout: &NetworkLayout,
    request: &SetCtrlIdRequest,
) -> Result<SetCtrlIdResponse, DcmiError> {
    let offset = usize::from(request.offset);
    let length = request.data.len();
    if length > MAX_TRANSFER {
        return Err(DcmiError::invalid_field("bytes", length));
    }
    if offset + length > MAX_IDENTIFIER + 1 {
        return Err(DcmiError::out_of_range(
            "offset",
            offset + length,
            MAX_IDENTIFIER + 1,
        ));
    }

    let HostName { service, mut bytes } = read_host_name(bus, layout)?;
    if offset > bytes.len() {
        return Err(DcmiError::out_of_range("offset", offset, bytes.len()));
    }

    let terminator = request.data.iter().position(|byte| *byte == 0);
    let written = request.data.get(..terminator.unwrap_or(length)).unwrap_or_default();
    let end = offset + written.len();
    if terminator.is_some() || end >= bytes.len() {
        bytes.truncate(offset);
        bytes.extend_from_slice(written);
    } else if let Some(window) = bytes.get_mut(offset..end) {
        window.copy_from_slice(written);
    }
    bytes.truncate(MAX_IDENTIFIER);

    let name = String::from_utf8(bytes)
        .map_err(|error| DcmiError::invalid_field("data", error.utf8_error().valid_up_to()))?;
    let total = name.len();
    PropertyClient::new(bus).set(
        &service,
        &layout.config_path,
        &layout.config_interface,
        &layout.hostname_property,
        Value::String(name),
    )?;
    info!(
        target: IDENTIFIER_TARGET,
        length = total,
        "management controller identifier updated"
    );

    Ok(SetCtrlIdResponse {
        total_length: length_byte(total),
    })
}
