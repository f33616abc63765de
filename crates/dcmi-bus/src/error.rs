//! Error types for directory and property access.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Coarse classification shared by every error surfaced to command handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No backend object, service or configured instance matches the request.
    NotFound,
    /// The backend call failed or returned an error indication.
    Rpc,
    /// The loaded configuration cannot satisfy the request.
    Configuration,
}

impl ErrorKind {
    /// Returns `true` for [`Self::NotFound`] and for [`Self::Configuration`],
    /// which is a more specific flavour of "not found".
    #[must_use]
    pub const fn is_not_found(self) -> bool {
        matches!(self, Self::NotFound | Self::Configuration)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::Rpc => "rpc error",
            Self::Configuration => "configuration error",
        };
        formatter.write_str(label)
    }
}

/// Bus operation that was being executed when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusMethod {
    /// Directory subtree query.
    GetSubTree,
    /// Directory owner query.
    GetObject,
    /// Single property read.
    Get,
    /// Read of every property on an interface.
    GetAll,
    /// Single property write.
    Set,
    /// Arbitrary method invocation.
    Call,
}

impl fmt::Display for BusMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::GetSubTree => "GetSubTree",
            Self::GetObject => "GetObject",
            Self::Get => "Get",
            Self::GetAll => "GetAll",
            Self::Set => "Set",
            Self::Call => "Call",
        };
        formatter.write_str(label)
    }
}

/// Errors returned by the directory, service and property clients.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The directory returned no object implementing the interface.
    #[error("no object implements '{interface}' under '{root}'")]
    NoImplementation {
        /// Interface that was searched for.
        interface: String,
        /// Search root.
        root: String,
    },

    /// Objects implement the interface but none has the requested path hint.
    #[error("no object implementing '{interface}' under '{root}' matches '{pattern}'")]
    NoMatch {
        /// Interface that was searched for.
        interface: String,
        /// Search root.
        root: String,
        /// Substring the object path had to contain.
        pattern: String,
    },

    /// No service registers the interface at the path.
    #[error("no service provides '{interface}' at '{path}'")]
    NoService {
        /// Object path that was queried.
        path: String,
        /// Interface that was queried.
        interface: String,
    },

    /// The backend call failed or reported an error.
    #[error("{method} on '{path}' ({interface}) failed: {message}")]
    Rpc {
        /// Operation that failed.
        method: BusMethod,
        /// Object path targeted by the call.
        path: String,
        /// Interface targeted by the call.
        interface: String,
        /// Backend supplied description.
        message: String,
    },

    /// A property value could not be decoded into the expected type.
    #[error("property '{property}' on '{path}' is not {expected}: found {found}")]
    TypeMismatch {
        /// Object path holding the property.
        path: String,
        /// Property name.
        property: String,
        /// Expected value type.
        expected: &'static str,
        /// Type actually returned.
        found: &'static str,
    },

    /// The bridge could not be reached or the exchange was interrupted.
    #[error("bus bridge at {endpoint} unreachable: {source}")]
    Transport {
        /// Bridge endpoint.
        endpoint: String,
        /// Underlying IO error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The bridge answered with something that is not a valid reply.
    #[error("malformed reply to {method}: {message}")]
    Protocol {
        /// Operation whose reply was malformed.
        method: BusMethod,
        /// Decoding failure description.
        message: String,
    },
}

impl BusError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoImplementation { .. } | Self::NoMatch { .. } | Self::NoService { .. } => {
                ErrorKind::NotFound
            }
            Self::Rpc { .. }
            | Self::TypeMismatch { .. }
            | Self::Transport { .. }
            | Self::Protocol { .. } => ErrorKind::Rpc,
        }
    }

    /// Creates a [`Self::NoImplementation`] error.
    #[must_use]
    pub fn no_implementation(interface: impl Into<String>, root: impl Into<String>) -> Self {
        Self::NoImplementation {
            interface: interface.into(),
            root: root.into(),
        }
    }

    /// Creates a [`Self::NoMatch`] error.
    #[must_use]
    pub fn no_match(
        interface: impl Into<String>,
        root: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self::NoMatch {
            interface: interface.into(),
            root: root.into(),
            pattern: pattern.into(),
        }
    }

    /// Creates a [`Self::NoService`] error.
    #[must_use]
    pub fn no_service(path: impl Into<String>, interface: impl Into<String>) -> Self {
        Self::NoService {
            path: path.into(),
            interface: interface.into(),
        }
    }

    /// Creates a [`Self::Rpc`] error.
    #[must_use]
    pub fn rpc(
        method: BusMethod,
        path: impl Into<String>,
        interface: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Rpc {
            method,
            path: path.into(),
            interface: interface.into(),
            message: message.into(),
        }
    }

    /// Creates a [`Self::TypeMismatch`] error.
    #[must_use]
    pub fn type_mismatch(
        path: impl Into<String>,
        property: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            property: property.into(),
            expected,
            found,
        }
    }

    /// Creates a [`Self::Transport`] error.
    #[must_use]
    pub fn transport(endpoint: impl Into<String>, source: std::io::Error) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a [`Self::Protocol`] error.
    #[must_use]
    pub fn protocol(method: BusMethod, message: impl Into<String>) -> Self {
        Self::Protocol {
            method,
            message: message.into(),
        }
    }
}
