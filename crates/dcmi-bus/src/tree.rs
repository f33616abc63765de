//! Ordered directory results.
//!
//! Directory replies are kept as vectors rather than maps so the order chosen
//! by the backend survives intact.

use serde::{Deserialize, Serialize};

/// One service and the interfaces it registers at a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Bus name of the owning service.
    pub service: String,
    /// Interfaces the service implements at the path.
    pub interfaces: Vec<String>,
}

impl ServiceEntry {
    /// Builds an entry from borrowed parts.
    #[must_use]
    pub fn new(service: impl Into<String>, interfaces: &[&str]) -> Self {
        Self {
            service: service.into(),
            interfaces: interfaces.iter().map(|name| (*name).to_owned()).collect(),
        }
    }

    /// Returns `true` when the service registers `interface`.
    #[must_use]
    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|candidate| candidate == interface)
    }
}

/// Services registered at one path, in backend order.
pub type ServiceMap = Vec<ServiceEntry>;

/// One object path and the services registered at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Object path.
    pub path: String,
    /// Owning services, in backend order.
    pub services: ServiceMap,
}

impl ObjectEntry {
    /// Builds an entry with a single owning service.
    #[must_use]
    pub fn single(path: impl Into<String>, service: impl Into<String>, interfaces: &[&str]) -> Self {
        Self {
            path: path.into(),
            services: vec![ServiceEntry::new(service, interfaces)],
        }
    }

    /// First service offered for this path.
    #[must_use]
    pub fn first_service(&self) -> Option<&str> {
        self.services.first().map(|entry| entry.service.as_str())
    }
}

/// Result of a subtree query, in backend order.
pub type ObjectTree = Vec<ObjectEntry>;
