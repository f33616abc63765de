//! In-memory bus used by tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::backend::{DirectoryService, MethodCall, MethodInvoker, PropertyBackend};
use crate::error::{BusError, BusMethod};
use crate::tree::{ObjectEntry, ObjectTree, ServiceEntry, ServiceMap};
use crate::value::{PropertyMap, Value};

type PropertyKey = (String, String, String);

#[derive(Debug, Default)]
struct State {
    objects: ObjectTree,
    properties: BTreeMap<PropertyKey, PropertyMap>,
    calls: Vec<MethodCall>,
    failing: HashSet<BusMethod>,
}

/// Ordered object model with a read-your-write property store.
///
/// Objects are returned in insertion order and never sorted, so tests can
/// arrange deliberately shuffled directories. Any method can be made to fail
/// with [`MemoryBus::fail_on`].
#[derive(Debug, Default)]
pub struct MemoryBus {
    state: RwLock<State>,
}

impl MemoryBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service` as implementing `interfaces` at `path`.
    ///
    /// Registering a second service at an existing path appends it after the
    /// services already present.
    #[must_use]
    pub fn with_object(self, path: &str, service: &str, interfaces: &[&str]) -> Self {
        self.add_object(path, service, interfaces);
        self
    }

    /// Seeds a property value.
    #[must_use]
    pub fn with_property(
        self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.write()
            .properties
            .entry(key(service, path, interface))
            .or_default()
            .insert(property.to_owned(), value.into());
        self
    }

    /// Registers an object on an existing bus.
    pub fn add_object(&self, path: &str, service: &str, interfaces: &[&str]) {
        let mut state = self.write();
        let entry = ServiceEntry::new(service, interfaces);
        if let Some(existing) = state.objects.iter_mut().find(|object| object.path == path) {
            existing.services.push(entry);
        } else {
            state.objects.push(ObjectEntry {
                path: path.to_owned(),
                services: vec![entry],
            });
        }
    }

    /// Makes every subsequent `method` call fail with an RPC error.
    pub fn fail_on(&self, method: BusMethod) {
        self.write().failing.insert(method);
    }

    /// Method calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MethodCall> {
        self.read().calls.clone()
    }

    /// Current value of a property, bypassing failure injection.
    #[must_use]
    pub fn property(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
    ) -> Option<Value> {
        self.read()
            .properties
            .get(&key(service, path, interface))
            .and_then(|map| map.get(property).cloned())
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, method: BusMethod, path: &str, interface: &str) -> Result<(), BusError> {
        if self.read().failing.contains(&method) {
            return Err(BusError::rpc(method, path, interface, "injected failure"));
        }
        Ok(())
    }
}

fn key(service: &str, path: &str, interface: &str) -> PropertyKey {
    (service.to_owned(), path.to_owned(), interface.to_owned())
}

fn under_root(path: &str, root: &str) -> bool {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return true;
    }
    path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn filter_services(services: &[ServiceEntry], interfaces: &[String]) -> ServiceMap {
    services
        .iter()
        .filter(|entry| {
            interfaces.is_empty() || interfaces.iter().any(|interface| entry.implements(interface))
        })
        .cloned()
        .collect()
}

impl DirectoryService for MemoryBus {
    fn get_sub_tree(
        &self,
        root: &str,
        _depth: i32,
        interfaces: &[String],
    ) -> Result<ObjectTree, BusError> {
        let interface = interfaces.join(",");
        self.check(BusMethod::GetSubTree, root, &interface)?;
        let state = self.read();
        Ok(state
            .objects
            .iter()
            .filter(|object| under_root(&object.path, root))
            .filter_map(|object| {
                let services = filter_services(&object.services, interfaces);
                (!services.is_empty()).then(|| ObjectEntry {
                    path: object.path.clone(),
                    services,
                })
            })
            .collect())
    }

    fn get_object(&self, path: &str, interfaces: &[String]) -> Result<ServiceMap, BusError> {
        let interface = interfaces.join(",");
        self.check(BusMethod::GetObject, path, &interface)?;
        let state = self.read();
        Ok(state
            .objects
            .iter()
            .find(|object| object.path == path)
            .map(|object| filter_services(&object.services, interfaces))
            .unwrap_or_default())
    }
}

impl PropertyBackend for MemoryBus {
    fn get(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
    ) -> Result<Value, BusError> {
        self.check(BusMethod::Get, path, interface)?;
        self.property(service, path, interface, property)
            .ok_or_else(|| {
                BusError::rpc(
                    BusMethod::Get,
                    path,
                    interface,
                    format!("unknown property '{property}' on '{service}'"),
                )
            })
    }

    fn get_all(
        &self,
        service: &str,
        path: &str,
        interface: &str,
    ) -> Result<PropertyMap, BusError> {
        self.check(BusMethod::GetAll, path, interface)?;
        self.read()
            .properties
            .get(&key(service, path, interface))
            .cloned()
            .ok_or_else(|| {
                BusError::rpc(
                    BusMethod::GetAll,
                    path,
                    interface,
                    format!("unknown interface on '{service}'"),
                )
            })
    }

    fn set(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        value: Value,
    ) -> Result<(), BusError> {
        self.check(BusMethod::Set, path, interface)?;
        self.write()
            .properties
            .entry(key(service, path, interface))
            .or_default()
            .insert(property.to_owned(), value);
        Ok(())
    }
}

impl MethodInvoker for MemoryBus {
    fn call(&self, call: &MethodCall) -> Result<(), BusError> {
        self.check(BusMethod::Call, &call.path, &call.interface)?;
        self.write().calls.push(call.clone());
        Ok(())
    }
}
