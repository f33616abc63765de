//! Request-level errors and their completion codes.

use dcmi_bus::{BusError, ErrorKind};
use thiserror::Error;

use crate::entity::EntityKind;

/// IPMI completion codes produced by the DCMI handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompletionCode {
    /// Command completed normally.
    Success = 0x00,
    /// The command is not supported by this controller.
    InvalidCommand = 0xC1,
    /// The request carried too little or too much data.
    ReqDataLenInvalid = 0xC7,
    /// A parameter lies outside its permitted range.
    ParmOutOfRange = 0xC9,
    /// The requested sensor, record or object is not present.
    SensorInvalid = 0xCB,
    /// A request field holds an invalid value.
    InvalidFieldRequest = 0xCC,
    /// The backend failed in a way the protocol has no code for.
    Unspecified = 0xFF,
}

impl CompletionCode {
    /// Numeric wire value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Failure of a single DCMI request.
#[derive(Debug, Clone, Error)]
pub enum DcmiError {
    /// Directory or property access failed.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// No configured entity of the type carries the instance number.
    #[error("no {kind} entity with instance {instance} ({available} configured)")]
    InstanceNotFound {
        /// Requested entity type.
        kind: EntityKind,
        /// Requested instance number.
        instance: u8,
        /// Number of configured entities of that type.
        available: usize,
    },

    /// Only temperature sensors are described by the sensor configuration.
    #[error("sensor type {0:#04x} is not supported")]
    UnsupportedSensorType(u8),

    /// The entity id does not name a known entity type.
    #[error("entity id {0:#04x} is not supported")]
    UnknownEntityId(u8),

    /// A request field holds a value the command does not accept.
    #[error("invalid value {value} for {field}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: usize,
    },

    /// A request parameter is outside its permitted range.
    #[error("{field} {value} exceeds the limit of {limit}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: usize,
        /// Largest accepted value.
        limit: usize,
    },

    /// The request payload has the wrong length.
    #[error("request data for {field} must be {expected} bytes, got {actual}")]
    RequestLength {
        /// Payload the length applies to.
        field: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Power management is disabled in the capabilities document.
    #[error("power management is not supported")]
    PowerManagementUnsupported,

    /// A property the command depends on is absent from the object.
    #[error("property '{property}' missing from '{path}'")]
    MissingProperty {
        /// Object path.
        path: String,
        /// Property name.
        property: String,
    },
}

impl DcmiError {
    /// Classifies resolution and backend failures.
    ///
    /// Request validation errors carry no kind and yield `None`.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Bus(error) => Some(error.kind()),
            Self::InstanceNotFound { .. } => Some(ErrorKind::Configuration),
            Self::MissingProperty { .. } => Some(ErrorKind::Rpc),
            Self::UnsupportedSensorType(_)
            | Self::UnknownEntityId(_)
            | Self::InvalidField { .. }
            | Self::OutOfRange { .. }
            | Self::RequestLength { .. }
            | Self::PowerManagementUnsupported => None,
        }
    }

    /// Completion code reported to the requester.
    #[must_use]
    pub const fn completion_code(&self) -> CompletionCode {
        match self {
            Self::UnsupportedSensorType(_)
            | Self::UnknownEntityId(_)
            | Self::InvalidField { .. } => CompletionCode::InvalidFieldRequest,
            Self::OutOfRange { .. } => CompletionCode::ParmOutOfRange,
            Self::RequestLength { .. } => CompletionCode::ReqDataLenInvalid,
            Self::PowerManagementUnsupported => CompletionCode::InvalidCommand,
            Self::Bus(_) | Self::InstanceNotFound { .. } | Self::MissingProperty { .. } => {
                match self.kind() {
                    Some(kind) if kind.is_not_found() => CompletionCode::SensorInvalid,
                    _ => CompletionCode::Unspecified,
                }
            }
        }
    }

    pub(crate) fn invalid_field(field: &'static str, value: impl Into<usize>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }

    pub(crate) fn out_of_range(field: &'static str, value: usize, limit: usize) -> Self {
        Self::OutOfRange {
            field,
            value,
            limit,
        }
    }

    pub(crate) const fn request_length(field: &'static str, expected: usize, actual: usize) -> Self {
        Self::RequestLength {
            field,
            expected,
            actual,
        }
    }
}
