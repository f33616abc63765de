//! Service ownership lookups.

use tracing::warn;

use crate::backend::DirectoryService;
use crate::error::BusError;

const SERVICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::service");

/// Finds the service currently serving an interface at a known path.
#[derive(Debug, Clone, Copy)]
pub struct ServiceResolver<'a, D: ?Sized> {
    directory: &'a D,
}

impl<'a, D> ServiceResolver<'a, D>
where
    D: DirectoryService + ?Sized,
{
    /// Wraps a directory backend.
    #[must_use]
    pub const fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Returns the first service the directory reports for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NoService`] when nothing serves the path, or the
    /// directory failure itself.
    pub fn resolve_owner(&self, path: &str, interface: &str) -> Result<String, BusError> {
        let interfaces = [interface.to_owned()];
        let services = self
            .directory
            .get_object(path, &interfaces)
            .inspect_err(|error| {
                warn!(
                    target: SERVICE_TARGET,
                    path,
                    interface,
                    %error,
                    "owner query failed"
                );
            })?;

        services
            .into_iter()
            .next()
            .map(|entry| entry.service)
            .ok_or_else(|| {
                warn!(target: SERVICE_TARGET, path, interface, "no service owns path");
                BusError::no_service(path, interface)
            })
    }
}
