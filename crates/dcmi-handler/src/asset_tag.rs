//! Get and Set Asset Tag.

use dcmi_bus::{Bus, ObjectDirectory, PropertyClient, ResolvedObject, Value};
use dcmi_config::AssetTagLayout;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DcmiError;

const ASSET_TAG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::asset_tag");

/// Most bytes transferred by one request.
pub(crate) const MAX_TRANSFER: usize = 16;

/// Longest asset tag the protocol can address.
const MAX_ASSET_TAG: usize = 63;

/// Get Asset Tag request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAssetTagRequest {
    /// Offset of the first byte to read.
    pub offset: u8,
    /// Number of bytes to read, at most 16.
    pub bytes: u8,
}

/// Get Asset Tag response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetTagResponse {
    /// Length of the whole tag.
    pub total_length: u8,
    /// Requested slice of the tag.
    pub data: Vec<u8>,
}

/// Set Asset Tag request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAssetTagRequest {
    /// Offset at which `data` is written.
    pub offset: u8,
    /// Replacement bytes, at most 16.
    pub data: Vec<u8>,
}

/// Set Asset Tag response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SetAssetTagResponse {
    /// Length of the tag after the write.
    pub total_length: u8,
}

fn length_byte(length: usize) -> u8 {
    u8::try_from(length).unwrap_or(u8::MAX)
}

fn read_tag<B: Bus + ?Sized>(
    bus: &B,
    layout: &AssetTagLayout,
) -> Result<(ResolvedObject, Vec<u8>), DcmiError> {
    let object = ObjectDirectory::new(bus).locate(&layout.interface, &layout.search_root, None)?;
    let tag = PropertyClient::new(bus).get_string(&object, &layout.interface, &layout.property)?;
    let mut bytes = tag.into_bytes();
    bytes.truncate(MAX_ASSET_TAG);
    Ok((object, bytes))
}

/// Returns up to 16 bytes of the asset tag starting at `offset`.
///
/// Tags longer than 63 bytes are reported truncated.
///
/// # Errors
///
/// Returns [`DcmiError::InvalidField`] when more than 16 bytes are requested,
/// [`DcmiError::OutOfRange`] when `offset` lies past the end of the tag, or
/// the lookup failure.
pub(crate) fn get_asset_tag<B: Bus + ?Sized>(
    bus: &B,
    layout: &AssetTagLayout,
    request: GetAssetTagRequest,
) -> Result<AssetTagResponse, DcmiError> {
    let requested = usize::from(request.bytes);
    if requested > MAX_TRANSFER {
        return Err(DcmiError::invalid_field("bytes", request.bytes));
    }

    let (_, tag) = read_tag(bus, layout)?;
    let offset = usize::from(request.offset);
    let Some(tail) = tag.get(offset..) else {
        return Err(DcmiError::out_of_range("offset", offset, tag.len()));
    };

    Ok(AssetTagResponse {
        total_length: length_byte(tag.len()),
        data: tail.iter().take(requested).copied().collect(),
    })
}

/// Replaces the asset tag from `offset` to its end with `request.data`.
///
/// # Errors
///
/// Returns [`DcmiError::InvalidField`] for more than 16 bytes of data or a
/// result that is not UTF-8, [`DcmiError::OutOfRange`] when the write would
/// extend past byte 63 or start past the end of the current tag, or the
/// lookup or write failure.
pub(crate) fn set_asset_tag<B: Bus + ?Sized>(
    bus: &B,
    layout: &AssetTagLayout,
    request: &SetAssetTagRequest,
) -> Result<SetAssetTagResponse, DcmiError> {
    let offset = usize::from(request.offset);
    let length = request.data.len();
    if length > MAX_TRANSFER {
        return Err(DcmiError::invalid_field("bytes", length));
    }
    if offset + length > MAX_ASSET_TAG {
        return Err(DcmiError::out_of_range("offset", offset + length, MAX_ASSET_TAG));
    }

    let (object, mut tag) = read_tag(bus, layout)?;
    if offset > tag.len() {
        return Err(DcmiError::out_of_range("offset", offset, tag.len()));
    }
    tag.truncate(offset);
    tag.extend_from_slice(&request.data);

    let text = String::from_utf8(tag)
        .map_err(|error| DcmiError::invalid_field("data", error.utf8_error().valid_up_to()))?;
    let total = text.len();
    PropertyClient::new(bus).set(
        &object.service,
        &object.path,
        &layout.interface,
        &layout.property,
        Value::String(text),
    )?;
    info!(
        target: ASSET_TAG_TARGET,
        path = %object.path,
        length = total,
        "asset tag updated"
    );

    Ok(SetAssetTagResponse {
        total_length: length_byte(total),
    })
}
