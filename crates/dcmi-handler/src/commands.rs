//! Command table and the request handler.

use dcmi_bus::Bus;
use dcmi_config::BusLayout;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::asset_tag::{self, AssetTagResponse, GetAssetTagRequest, SetAssetTagRequest, SetAssetTagResponse};
use crate::capabilities::Capabilities;
use crate::conf_params::{self, ConfParamsResponse, GetConfParamsRequest, SetConfParamsRequest};
use crate::entity::{EntityKind, SensorConfig};
use crate::error::DcmiError;
use crate::identifier::{self, CtrlIdResponse, GetCtrlIdRequest, SetCtrlIdRequest, SetCtrlIdResponse};
use crate::paginator::{ResponseFrame, paginate};
use crate::power::{GetPowerReadingRequest, PowerAggregator, PowerReading};
use crate::resolver::{resolve_one, resolve_range};

const COMMAND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

/// Group extension id identifying DCMI commands.
pub const GROUP_EXTENSION_ID: u8 = 0xDC;

/// The only sensor type described by the sensor configuration.
const TEMPERATURE_SENSOR_TYPE: u8 = 0x01;

/// DCMI command codes served by the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Get Power Reading.
    GetPowerReading = 0x02,
    /// Get Asset Tag.
    GetAssetTag = 0x06,
    /// Get DCMI Sensor Info.
    GetSensorInfo = 0x07,
    /// Set Asset Tag.
    SetAssetTag = 0x08,
    /// Get Management Controller Identifier String.
    GetMgmtCtrlIdString = 0x09,
    /// Set Management Controller Identifier String.
    SetMgmtCtrlIdString = 0x0A,
    /// Set DCMI Configuration Parameters.
    SetConfParams = 0x12,
    /// Get DCMI Configuration Parameters.
    GetConfParams = 0x13,
}

impl Command {
    /// Numeric command code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Get DCMI Sensor Info request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSensorInfoRequest {
    /// Sensor type; only temperature (`0x01`) is supported.
    pub sensor_type: u8,
    /// DCMI or IPMI entity id.
    pub entity_id: u8,
    /// Instance to report; `0` enumerates from `instance_start`.
    pub entity_instance: u8,
    /// First instance to enumerate when `entity_instance` is `0`.
    #[serde(default)]
    pub instance_start: u8,
}

/// A decoded DCMI request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DcmiRequest {
    /// Get Power Reading.
    GetPowerReading(GetPowerReadingRequest),
    /// Get Asset Tag.
    GetAssetTag(GetAssetTagRequest),
    /// Get DCMI Sensor Info.
    GetSensorInfo(GetSensorInfoRequest),
    /// Set Asset Tag.
    SetAssetTag(SetAssetTagRequest),
    /// Get Management Controller Identifier String.
    GetMgmtCtrlIdString(GetCtrlIdRequest),
    /// Set Management Controller Identifier String.
    SetMgmtCtrlIdString(SetCtrlIdRequest),
    /// Set DCMI Configuration Parameters.
    SetConfParams(SetConfParamsRequest),
    /// Get DCMI Configuration Parameters.
    GetConfParams(GetConfParamsRequest),
}

impl DcmiRequest {
    /// Command the request targets.
    #[must_use]
    pub const fn command(&self) -> Command {
        match self {
            Self::GetPowerReading(_) => Command::GetPowerReading,
            Self::GetAssetTag(_) => Command::GetAssetTag,
            Self::GetSensorInfo(_) => Command::GetSensorInfo,
            Self::SetAssetTag(_) => Command::SetAssetTag,
            Self::GetMgmtCtrlIdString(_) => Command::GetMgmtCtrlIdString,
            Self::SetMgmtCtrlIdString(_) => Command::SetMgmtCtrlIdString,
            Self::SetConfParams(_) => Command::SetConfParams,
            Self::GetConfParams(_) => Command::GetConfParams,
        }
    }
}

/// Get DCMI Sensor Info response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorInfoResponse {
    /// Instances of the entity type in the configuration.
    pub num_instances: usize,
    /// Record ids in this response.
    pub num_records: usize,
    /// SDR record ids.
    pub record_ids: Vec<u16>,
}

impl From<ResponseFrame> for SensorInfoResponse {
    fn from(frame: ResponseFrame) -> Self {
        Self {
            num_instances: frame.num_instances,
            num_records: frame.num_records(),
            record_ids: frame.record_ids,
        }
    }
}

/// Response payload of a successful request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DcmiResponse {
    /// Get Power Reading.
    PowerReading(PowerReading),
    /// Get Asset Tag.
    AssetTag(AssetTagResponse),
    /// Get DCMI Sensor Info.
    SensorInfo(SensorInfoResponse),
    /// Set Asset Tag.
    AssetTagWritten(SetAssetTagResponse),
    /// Get Management Controller Identifier String.
    CtrlId(CtrlIdResponse),
    /// Set Management Controller Identifier String.
    CtrlIdWritten(SetCtrlIdResponse),
    /// Get DCMI Configuration Parameters.
    ConfParams(ConfParamsResponse),
    /// Commands without response data.
    Empty {},
}

/// Serves DCMI requests against one bus and one configuration.
#[derive(Debug)]
pub struct DcmiHandler<B> {
    bus: B,
    layout: BusLayout,
    sensors: SensorConfig,
    capabilities: Capabilities,
}

impl<B: Bus> DcmiHandler<B> {
    /// Bundles the collaborators of every command.
    #[must_use]
    pub const fn new(
        bus: B,
        layout: BusLayout,
        sensors: SensorConfig,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            bus,
            layout,
            sensors,
            capabilities,
        }
    }

    /// Bus backend.
    #[must_use]
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Loaded sensor configuration.
    #[must_use]
    pub const fn sensors(&self) -> &SensorConfig {
        &self.sensors
    }

    /// Dispatches `request` to its command.
    ///
    /// # Errors
    ///
    /// Returns the command's [`DcmiError`].
    pub fn execute(&self, request: &DcmiRequest) -> Result<DcmiResponse, DcmiError> {
        debug!(
            target: COMMAND_TARGET,
            command = request.command().code(),
            "executing DCMI command"
        );
        match request {
            DcmiRequest::GetPowerReading(inner) => {
                self.get_power_reading(*inner).map(DcmiResponse::PowerReading)
            }
            DcmiRequest::GetAssetTag(inner) => {
                self.get_asset_tag(*inner).map(DcmiResponse::AssetTag)
            }
            DcmiRequest::GetSensorInfo(inner) => self
                .get_sensor_info(*inner)
                .map(|frame| DcmiResponse::SensorInfo(frame.into())),
            DcmiRequest::SetAssetTag(inner) => {
                self.set_asset_tag(inner).map(DcmiResponse::AssetTagWritten)
            }
            DcmiRequest::GetMgmtCtrlIdString(inner) => {
                self.get_ctrl_id(*inner).map(DcmiResponse::CtrlId)
            }
            DcmiRequest::SetMgmtCtrlIdString(inner) => {
                self.set_ctrl_id(inner).map(DcmiResponse::CtrlIdWritten)
            }
            DcmiRequest::SetConfParams(inner) => self
                .set_conf_params(inner)
                .map(|()| DcmiResponse::Empty {}),
            DcmiRequest::GetConfParams(inner) => {
                self.get_conf_params(*inner).map(DcmiResponse::ConfParams)
            }
        }
    }

    /// Get DCMI Sensor Info.
    ///
    /// A non-zero `entity_instance` reports that single instance; zero
    /// enumerates from `instance_start`, at most eight records per frame.
    ///
    /// # Errors
    ///
    /// Returns [`DcmiError::UnsupportedSensorType`] or
    /// [`DcmiError::UnknownEntityId`] for unsupported requests, and
    /// [`DcmiError::InstanceNotFound`] when the instance is not configured.
    pub fn get_sensor_info(&self, request: GetSensorInfoRequest) -> Result<ResponseFrame, DcmiError> {
        if request.sensor_type != TEMPERATURE_SENSOR_TYPE {
            return Err(DcmiError::UnsupportedSensorType(request.sensor_type));
        }
        let kind = EntityKind::from_entity_id(request.entity_id)
            .ok_or(DcmiError::UnknownEntityId(request.entity_id))?;

        if request.entity_instance != 0 {
            let (record, total) = resolve_one(kind, request.entity_instance, &self.sensors)?;
            return Ok(paginate(std::slice::from_ref(&record), total));
        }

        let (records, total) = resolve_range(kind, request.instance_start, &self.sensors);
        Ok(paginate(&records, total))
    }

    /// Get Power Reading.
    ///
    /// # Errors
    ///
    /// Returns [`DcmiError::PowerManagementUnsupported`] when the platform
    /// does not declare power management, [`DcmiError::InvalidField`] for
    /// modes other than system power statistics, or the aggregator failure.
    pub fn get_power_reading(
        &self,
        request: GetPowerReadingRequest,
    ) -> Result<PowerReading, DcmiError> {
        if !self.capabilities.power_management() {
            return Err(DcmiError::PowerManagementUnsupported);
        }
        if request.mode != GetPowerReadingRequest::SYSTEM_POWER_STATISTICS {
            return Err(DcmiError::invalid_field("mode", request.mode));
        }
        PowerAggregator::new(&self.bus, &self.layout.power).read_power()
    }

    /// Get Asset Tag.
    ///
    /// # Errors
    ///
    /// Returns [`DcmiError::InvalidField`] for reads over 16 bytes,
    /// [`DcmiError::OutOfRange`] for offsets past the end of the tag, or the
    /// lookup failure.
    pub fn get_asset_tag(&self, request: GetAssetTagRequest) -> Result<AssetTagResponse, DcmiError> {
        asset_tag::get_asset_tag(&self.bus, &self.layout.asset_tag, request)
    }

    /// Set Asset Tag.
    ///
    /// # Errors
    ///
    /// Returns [`DcmiError::InvalidField`] for writes over 16 bytes,
    /// [`DcmiError::OutOfRange`] when the tag would pass 63 bytes, or the
    /// lookup or write failure.
    pub fn set_asset_tag(
        &self,
        request: &SetAssetTagRequest,
    ) -> Result<SetAssetTagResponse, DcmiError> {
        asset_tag::set_asset_tag(&self.bus, &self.layout.asset_tag, request)
    }

    /// Get Management Controller Identifier String.
    ///
    /// # Errors
    ///
    /// Returns validation or lookup failures.
    pub fn get_ctrl_id(&self, request: GetCtrlIdRequest) -> Result<CtrlIdResponse, DcmiError> {
        identifier::get_ctrl_id(&self.bus, &self.layout.network, request)
    }

    /// Set Management Controller Identifier String.
    ///
    /// # Errors
    ///
    /// Returns validation, lookup or write failures.
    pub fn set_ctrl_id(&self, request: &SetCtrlIdRequest) -> Result<SetCtrlIdResponse, DcmiError> {
        identifier::set_ctrl_id(&self.bus, &self.layout.network, request)
    }

    /// Set DCMI Configuration Parameters.
    ///
    /// # Errors
    ///
    /// Returns validation or bus failures.
    pub fn set_conf_params(&self, request: &SetConfParamsRequest) -> Result<(), DcmiError> {
        conf_params::set_conf_params(&self.bus, &self.layout, request)
    }

    /// Get DCMI Configuration Parameters.
    ///
    /// # Errors
    ///
    /// Returns validation or bus failures.
    pub fn get_conf_params(
        &self,
        request: GetConfParamsRequest,
    ) -> Result<ConfParamsResponse, DcmiError> {
        conf_params::get_conf_params(&self.bus, &self.layout, request)
    }
}
