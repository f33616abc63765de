//! DCMI command semantics on top of the bus clients.
//!
//! The crate turns typed DCMI requests into responses. Sensor requests are
//! answered from a declarative [`SensorConfig`]: the entity resolution
//! functions map an entity type and instance number onto configured records,
//! and [`paginate`] packs the result into a bounded [`ResponseFrame`]. Every
//! other command locates its backing object through the directory client on
//! each call and reads or writes it through the property client.
//!
//! [`DcmiHandler`] bundles a bus backend, the bus layout, the sensor
//! configuration and the capability flags, and exposes one method per
//! command. It holds no mutable state and can be shared between threads.

mod asset_tag;
mod capabilities;
mod commands;
mod conf_params;
mod entity;
mod error;
mod identifier;
mod loader;
mod paginator;
mod power;
mod resolver;

pub use asset_tag::{AssetTagResponse, GetAssetTagRequest, SetAssetTagRequest, SetAssetTagResponse};
pub use capabilities::Capabilities;
pub use commands::{
    Command, DcmiHandler, DcmiRequest, DcmiResponse, GROUP_EXTENSION_ID, GetSensorInfoRequest,
    SensorInfoResponse,
};
pub use conf_params::{
    ConfParamsResponse, ConfigParameter, GetConfParamsRequest, SetConfParamsRequest,
};
pub use entity::{ConfigError, EntityDescriptor, EntityKind, SensorConfig};
pub use error::{CompletionCode, DcmiError};
pub use identifier::{
    CtrlIdResponse, GetCtrlIdRequest, SetCtrlIdRequest, SetCtrlIdResponse,
};
pub use loader::{LoadError, load_capabilities, load_sensor_config};
pub use paginator::{MAX_RECORDS, ResponseFrame, paginate};
pub use power::{
    GetPowerReadingRequest, PowerAggregator, PowerReading, UNAVAILABLE_TIME_FRAME,
    UNAVAILABLE_WATTS,
};
pub use resolver::{EntityRecord, count_of, resolve_one, resolve_range};

#[cfg(test)]
mod tests;
