//! Directory and property access over the platform object bus.
//!
//! The DCMI handlers never hold bus object paths or owning services of their
//! own. Each logical resource (the power reading, the asset tag, the network
//! configuration) is found through the object directory every time it is
//! needed, then read or written through the standard property interface.
//!
//! # Components
//!
//! - [`ObjectDirectory`] finds the object implementing an interface beneath a
//!   search root, optionally narrowed by a substring of the object path.
//! - [`ServiceResolver`] finds the service currently owning a known path.
//! - [`PropertyClient`] reads one property, reads all properties of an
//!   interface, or writes one property.
//!
//! All three are thin, stateless views over the backend seams
//! [`DirectoryService`], [`PropertyBackend`] and [`MethodInvoker`]. Nothing is
//! cached: every lookup is a fresh round trip, so results cannot go stale.
//!
//! # Ordering
//!
//! Directory results are consumed in the order the backend returns them. No
//! sorting is applied anywhere in this crate; "first" always means "first
//! returned by the backend".
//!
//! # Backends
//!
//! [`SocketBus`] forwards every call as a JSONL request to an external bus
//! bridge. `MemoryBus` (feature `test-support`) keeps an ordered in-memory
//! object model for tests.

mod backend;
mod directory;
mod error;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod property;
mod service;
mod socket;
mod tree;
mod value;

pub use backend::{Bus, DirectoryService, MethodCall, MethodInvoker, PropertyBackend};
pub use directory::{ObjectDirectory, ResolvedObject};
pub use error::{BusError, BusMethod, ErrorKind};
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryBus;
pub use property::PropertyClient;
pub use service::ServiceResolver;
pub use socket::{BridgeReply, BridgeRequest, BridgeTarget, SocketBus};
pub use tree::{ObjectEntry, ObjectTree, ServiceEntry, ServiceMap};
pub use value::{PropertyMap, Value};

#[cfg(test)]
mod tests;
