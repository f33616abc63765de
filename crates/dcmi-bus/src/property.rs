//! Property access against resolved objects.

use tracing::{error, trace};

use crate::backend::PropertyBackend;
use crate::directory::ResolvedObject;
use crate::error::BusError;
use crate::value::{PropertyMap, Value};

const PROPERTY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::property");

/// Reads and writes properties through the standard property interface.
///
/// Every call is a fresh round trip; failures are logged and returned as-is.
#[derive(Debug, Clone, Copy)]
pub struct PropertyClient<'a, P: ?Sized> {
    backend: &'a P,
}

impl<'a, P> PropertyClient<'a, P>
where
    P: PropertyBackend + ?Sized,
{
    /// Wraps a property backend.
    #[must_use]
    pub const fn new(backend: &'a P) -> Self {
        Self { backend }
    }

    /// Reads one property.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn get(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
    ) -> Result<Value, BusError> {
        let value = self
            .backend
            .get(service, path, interface, property)
            .inspect_err(|failure| {
                error!(
                    target: PROPERTY_TARGET,
                    service,
                    path,
                    interface,
                    property,
                    error = %failure,
                    "failed to get property"
                );
            })?;
        trace!(target: PROPERTY_TARGET, path, property, ?value, "read property");
        Ok(value)
    }

    /// Reads every property of `interface`.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn get_all(
        &self,
        service: &str,
        path: &str,
        interface: &str,
    ) -> Result<PropertyMap, BusError> {
        self.backend
            .get_all(service, path, interface)
            .inspect_err(|failure| {
                error!(
                    target: PROPERTY_TARGET,
                    service,
                    path,
                    interface,
                    error = %failure,
                    "failed to get all properties"
                );
            })
    }

    /// Writes one property.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn set(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        value: Value,
    ) -> Result<(), BusError> {
        self.backend
            .set(service, path, interface, property, value)
            .inspect_err(|failure| {
                error!(
                    target: PROPERTY_TARGET,
                    service,
                    path,
                    interface,
                    property,
                    error = %failure,
                    "failed to set property"
                );
            })
    }

    /// Reads a string property from a resolved object.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::TypeMismatch`] when the property is not a string,
    /// or the backend failure.
    pub fn get_string(
        &self,
        object: &ResolvedObject,
        interface: &str,
        property: &str,
    ) -> Result<String, BusError> {
        match self.get(&object.service, &object.path, interface, property)? {
            Value::String(text) => Ok(text),
            other => Err(BusError::type_mismatch(
                object.path.as_str(),
                property,
                "string",
                other.type_name(),
            )),
        }
    }
}
