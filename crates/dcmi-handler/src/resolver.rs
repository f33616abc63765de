//! Entity resolution.
//!
//! Maps `(kind, instance)` requests onto configured descriptors. The
//! configuration is always passed in; nothing here holds state.
//!
//! A descriptor's effective instance is its explicit `instance` when the
//! configuration declares one and its 1-based position among descriptors of
//! the same kind otherwise. The returned total is always the number of
//! descriptors of the kind in the whole configuration.

use serde::Serialize;

use crate::entity::{EntityDescriptor, EntityKind, SensorConfig};
use crate::error::DcmiError;

/// A descriptor resolved for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    /// Entity type.
    pub kind: EntityKind,
    /// DCMI entity id.
    pub entity_id: u8,
    /// Effective instance number.
    pub instance: u8,
    /// SDR record id.
    pub record_id: u16,
    /// Bus object path of the sensor.
    pub object_path: String,
}

impl EntityRecord {
    fn new(instance: u8, descriptor: &EntityDescriptor) -> Self {
        Self {
            kind: descriptor.kind,
            entity_id: descriptor.entity_id(),
            instance,
            record_id: descriptor.record_id,
            object_path: descriptor.object_path.clone(),
        }
    }
}

/// Number of descriptors of `kind`.
#[must_use]
pub fn count_of(kind: EntityKind, config: &SensorConfig) -> usize {
    config
        .descriptors()
        .iter()
        .filter(|descriptor| descriptor.kind == kind)
        .count()
}

/// Resolves one instance of `kind`.
///
/// # Errors
///
/// Returns [`DcmiError::InstanceNotFound`] for instance `0`, which means "all
/// instances" and is only valid for [`resolve_range`], and for instances no
/// descriptor carries.
pub fn resolve_one(
    kind: EntityKind,
    instance: u8,
    config: &SensorConfig,
) -> Result<(EntityRecord, usize), DcmiError> {
    let total = count_of(kind, config);
    if instance == 0 {
        return Err(DcmiError::InstanceNotFound {
            kind,
            instance,
            available: total,
        });
    }
    config
        .instances_of(kind)
        .find(|(effective, _)| *effective == instance)
        .map(|(effective, descriptor)| (EntityRecord::new(effective, descriptor), total))
        .ok_or(DcmiError::InstanceNotFound {
            kind,
            instance,
            available: total,
        })
}

/// Resolves every instance of `kind` from `instance_start` onwards.
///
/// A start of `0` is treated as `1`. The result is not truncated; framing is
/// left to [`crate::paginate`].
#[must_use]
pub fn resolve_range(
    kind: EntityKind,
    instance_start: u8,
    config: &SensorConfig,
) -> (Vec<EntityRecord>, usize) {
    let start = instance_start.max(1);
    let records = config
        .instances_of(kind)
        .filter(|(effective, _)| *effective >= start)
        .map(|(effective, descriptor)| EntityRecord::new(effective, descriptor))
        .collect();
    (records, count_of(kind, config))
}
