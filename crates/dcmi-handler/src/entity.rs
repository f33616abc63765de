//! Sensor entity descriptors and their validated configuration.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::loader::LoadError;

/// Largest instance number an entity can carry.
const MAX_INSTANCES: usize = 255;

/// Semantic entity types described by the sensor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Air inlet temperature.
    Inlet,
    /// Processor temperature.
    Cpu,
    /// Baseboard temperature.
    Baseboard,
}

impl EntityKind {
    /// Every kind, in configuration key order.
    pub const ALL: [Self; 3] = [Self::Inlet, Self::Cpu, Self::Baseboard];

    /// DCMI entity id reported for this kind.
    #[must_use]
    pub const fn entity_id(self) -> u8 {
        match self {
            Self::Inlet => 0x40,
            Self::Cpu => 0x41,
            Self::Baseboard => 0x42,
        }
    }

    /// Maps a DCMI or legacy IPMI entity id onto a kind.
    ///
    /// Both the DCMI ids (`0x40..=0x42`) and the IPMI ids they alias
    /// (`0x37`, `0x03`, `0x07`) are accepted.
    #[must_use]
    pub const fn from_entity_id(entity_id: u8) -> Option<Self> {
        match entity_id {
            0x40 | 0x37 => Some(Self::Inlet),
            0x41 | 0x03 => Some(Self::Cpu),
            0x42 | 0x07 => Some(Self::Baseboard),
            _ => None,
        }
    }

    /// Key naming this kind in the configuration document.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Inlet => "inlet",
            Self::Cpu => "cpu",
            Self::Baseboard => "baseboard",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.key())
    }
}

impl Serialize for EntityKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// One configured sensor entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Entity type.
    pub kind: EntityKind,
    /// Instance number; `None` means "position among entities of this kind".
    pub instance: Option<u8>,
    /// Bus object path of the sensor.
    pub object_path: String,
    /// SDR record id reported to the requester.
    pub record_id: u16,
}

impl EntityDescriptor {
    /// DCMI entity id of the descriptor's kind.
    #[must_use]
    pub const fn entity_id(&self) -> u8 {
        self.kind.entity_id()
    }
}

/// Reasons a sensor configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Instance zero is reserved for "all instances".
    #[error("{kind} entry {position} declares reserved instance 0")]
    ZeroInstance {
        /// Entity type.
        kind: EntityKind,
        /// 1-based position among entries of that type.
        position: usize,
    },
    /// Instance numbers must strictly increase within a type.
    #[error("{kind} entry {position} has instance {instance} after instance {previous}")]
    OutOfOrder {
        /// Entity type.
        kind: EntityKind,
        /// 1-based position among entries of that type.
        position: usize,
        /// Instance of the preceding entry.
        previous: u8,
        /// Offending instance.
        instance: u8,
    },
    /// More entries than instance numbers exist.
    #[error("{kind} declares {count} entries; at most {MAX_INSTANCES} are supported")]
    TooManyInstances {
        /// Entity type.
        kind: EntityKind,
        /// Number of entries declared.
        count: usize,
    },
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    instance: Option<u8>,
    dbus: String,
    record_id: u16,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    inlet: Vec<RawDescriptor>,
    #[serde(default)]
    cpu: Vec<RawDescriptor>,
    #[serde(default)]
    baseboard: Vec<RawDescriptor>,
}

impl RawConfig {
    fn take(&mut self, kind: EntityKind) -> Vec<RawDescriptor> {
        std::mem::take(match kind {
            EntityKind::Inlet => &mut self.inlet,
            EntityKind::Cpu => &mut self.cpu,
            EntityKind::Baseboard => &mut self.baseboard,
        })
    }
}

/// Validated sensor entities, in configuration order.
///
/// Within each kind, descriptors appear in the order they were declared and
/// their effective instance numbers strictly increase. The value is immutable;
/// a new configuration is produced by loading again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorConfig {
    descriptors: Vec<EntityDescriptor>,
}

impl SensorConfig {
    /// Validates `descriptors` and wraps them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an entry declares instance zero, when
    /// instance numbers do not strictly increase within a kind, or when a
    /// kind has more than 255 entries.
    pub fn new(descriptors: Vec<EntityDescriptor>) -> Result<Self, ConfigError> {
        let config = Self { descriptors };
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration from an already parsed JSON document.
    ///
    /// The document is an object keyed by `inlet`, `cpu` and `baseboard`,
    /// each holding an ordered array of entries. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] when the document has the wrong shape and
    /// [`LoadError::Invalid`] when validation fails.
    pub fn from_value(value: serde_json::Value) -> Result<Self, LoadError> {
        let mut raw: RawConfig = serde_json::from_value(value).map_err(LoadError::parse)?;
        let descriptors = EntityKind::ALL
            .into_iter()
            .flat_map(|kind| {
                raw.take(kind)
                    .into_iter()
                    .map(move |entry| EntityDescriptor {
                        kind,
                        instance: entry.instance,
                        object_path: entry.dbus,
                        record_id: entry.record_id,
                    })
            })
            .collect();
        Ok(Self::new(descriptors)?)
    }

    /// All descriptors, in configuration order.
    #[must_use]
    pub fn descriptors(&self) -> &[EntityDescriptor] {
        &self.descriptors
    }

    /// Descriptors of one kind paired with their effective instance numbers.
    pub(crate) fn instances_of(
        &self,
        kind: EntityKind,
    ) -> impl Iterator<Item = (u8, &EntityDescriptor)> + '_ {
        self.descriptors
            .iter()
            .filter(move |descriptor| descriptor.kind == kind)
            .enumerate()
            .map(|(index, descriptor)| {
                let position = u8::try_from(index + 1).unwrap_or(u8::MAX);
                (descriptor.instance.unwrap_or(position), descriptor)
            })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for kind in EntityKind::ALL {
            let count = self
                .descriptors
                .iter()
                .filter(|descriptor| descriptor.kind == kind)
                .count();
            if count > MAX_INSTANCES {
                return Err(ConfigError::TooManyInstances { kind, count });
            }

            let mut previous: Option<u8> = None;
            for (index, (instance, descriptor)) in self.instances_of(kind).enumerate() {
                let position = index + 1;
                if descriptor.instance == Some(0) {
                    return Err(ConfigError::ZeroInstance { kind, position });
                }
                if let Some(previous) = previous.filter(|previous| instance <= *previous) {
                    return Err(ConfigError::OutOfOrder {
                        kind,
                        position,
                        previous,
                        instance,
                    });
                }
                previous = Some(instance);
            }
        }
        Ok(())
    }
}
