//! Backend seams.
//!
//! Each trait mirrors one family of bus calls. Production code reaches the bus
//! through [`crate::SocketBus`]; tests substitute an in-memory model or
//! `mockall` doubles.

use serde::{Deserialize, Serialize};

use crate::error::BusError;
use crate::tree::{ObjectTree, ServiceMap};
use crate::value::{PropertyMap, Value};

/// Object directory (mapper) queries.
pub trait DirectoryService: Send + Sync {
    /// Returns every object under `root` implementing any of `interfaces`.
    ///
    /// A `depth` of `0` leaves traversal depth to the directory service.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the query fails.
    fn get_sub_tree(
        &self,
        root: &str,
        depth: i32,
        interfaces: &[String],
    ) -> Result<ObjectTree, BusError>;

    /// Returns the services registering any of `interfaces` at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the query fails.
    fn get_object(&self, path: &str, interfaces: &[String]) -> Result<ServiceMap, BusError>;
}

/// Standard property interface calls against a resolved object.
pub trait PropertyBackend: Send + Sync {
    /// Reads one property.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the call fails.
    fn get(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
    ) -> Result<Value, BusError>;

    /// Reads every property of `interface`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the call fails.
    fn get_all(&self, service: &str, path: &str, interface: &str)
    -> Result<PropertyMap, BusError>;

    /// Writes one property.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the backend rejects the write.
    fn set(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        value: Value,
    ) -> Result<(), BusError>;
}

/// A method invocation whose reply body is not needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Destination service.
    pub service: String,
    /// Object path.
    pub path: String,
    /// Interface declaring the member.
    pub interface: String,
    /// Method name.
    pub member: String,
    /// Positional arguments.
    pub arguments: Vec<Value>,
}

/// Arbitrary method calls.
pub trait MethodInvoker: Send + Sync {
    /// Invokes `call` and waits for it to complete.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the call fails.
    fn call(&self, call: &MethodCall) -> Result<(), BusError>;
}

/// Everything the DCMI handlers need from the bus.
pub trait Bus: DirectoryService + PropertyBackend + MethodInvoker {}

impl<T> Bus for T where T: DirectoryService + PropertyBackend + MethodInvoker + ?Sized {}
