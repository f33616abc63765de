//! Shared fixtures for handler tests.

use dcmi_bus::MemoryBus;
use dcmi_config::BusLayout;
use rstest::fixture;
use serde_json::json;

use crate::{Capabilities, DcmiHandler, EntityDescriptor, EntityKind, SensorConfig};

pub(crate) const POWER_SERVICE: &str = "xyz.openbmc_project.VirtualSensor";
pub(crate) const POWER_PATH: &str = "/xyz/openbmc_project/sensors/power/total_power";
pub(crate) const INVENTORY_SERVICE: &str = "xyz.openbmc_project.Inventory.Manager";
pub(crate) const BOARD_PATH: &str = "/xyz/openbmc_project/inventory/system/board";
pub(crate) const NETWORK_SERVICE: &str = "xyz.openbmc_project.Network";

/// Builds `count` implicit descriptors of `kind` with record ids from `first`.
pub(crate) fn descriptors(kind: EntityKind, count: u16, first: u16) -> Vec<EntityDescriptor> {
    (0..count)
        .map(|offset| EntityDescriptor {
            kind,
            instance: None,
            object_path: format!("/xyz/openbmc_project/sensors/temperature/{kind}{offset}"),
            record_id: first + offset,
        })
        .collect()
}

/// Ten cpu entries, two inlet entries and no baseboard entries.
#[fixture]
pub(crate) fn sensors() -> SensorConfig {
    SensorConfig::from_value(json!({
        "inlet": [
            {"dbus": "/xyz/openbmc_project/sensors/temperature/inlet0", "record_id": 1},
            {"dbus": "/xyz/openbmc_project/sensors/temperature/inlet1", "record_id": 2}
        ],
        "cpu": (0..10_u16)
            .map(|index| json!({
                "dbus": format!("/xyz/openbmc_project/sensors/temperature/cpu{index}"),
                "record_id": 100 + index
            }))
            .collect::<Vec<_>>()
    }))
    .expect("fixture configuration is valid")
}

/// Bus exposing a power sensor, an asset tag, the network configuration and
/// two ethernet interfaces.
#[fixture]
pub(crate) fn platform_bus() -> MemoryBus {
    let layout = BusLayout::default();
    MemoryBus::new()
        .with_object(POWER_PATH, POWER_SERVICE, &[layout.power.interface.as_str()])
        .with_property(POWER_SERVICE, POWER_PATH, &layout.power.interface, "Value", 120.0)
        .with_property(POWER_SERVICE, POWER_PATH, &layout.power.interface, "MinimumValue", 80.0)
        .with_property(POWER_SERVICE, POWER_PATH, &layout.power.interface, "MaximumValue", 200.0)
        .with_property(POWER_SERVICE, POWER_PATH, &layout.power.interface, "AverageValue", 110.0)
        .with_property(POWER_SERVICE, POWER_PATH, &layout.power.interface, "TimeFrame", 1000_u64)
        .with_property(POWER_SERVICE, POWER_PATH, &layout.power.interface, "ReadingState", 1_u64)
        .with_object(BOARD_PATH, INVENTORY_SERVICE, &[layout.asset_tag.interface.as_str()])
        .with_property(
            INVENTORY_SERVICE,
            BOARD_PATH,
            &layout.asset_tag.interface,
            &layout.asset_tag.property,
            "RACK-0042",
        )
        .with_object(
            &layout.network.config_path,
            NETWORK_SERVICE,
            &[layout.network.config_interface.as_str()],
        )
        .with_property(
            NETWORK_SERVICE,
            &layout.network.config_path,
            &layout.network.config_interface,
            &layout.network.hostname_property,
            "bmc-rack7",
        )
        .with_object(&layout.dhcp.path, NETWORK_SERVICE, &[layout.dhcp.interface.as_str()])
        .with_property(
            NETWORK_SERVICE,
            &layout.dhcp.path,
            &layout.dhcp.interface,
            &layout.dhcp.send_hostname_property,
            false,
        )
        .with_object(
            "/xyz/openbmc_project/network/eth0",
            NETWORK_SERVICE,
            &[layout.ethernet.interface.as_str()],
        )
        .with_property(
            NETWORK_SERVICE,
            "/xyz/openbmc_project/network/eth0",
            &layout.ethernet.interface,
            &layout.ethernet.dhcp_enabled_property,
            "xyz.openbmc_project.Network.EthernetInterface.DHCPConf.none",
        )
        .with_object(
            "/xyz/openbmc_project/network/eth1",
            NETWORK_SERVICE,
            &[layout.ethernet.interface.as_str()],
        )
        .with_property(
            NETWORK_SERVICE,
            "/xyz/openbmc_project/network/eth1",
            &layout.ethernet.interface,
            &layout.ethernet.dhcp_enabled_property,
            "xyz.openbmc_project.Network.EthernetInterface.DHCPConf.both",
        )
}

/// Handler over [`platform_bus`] with power management enabled.
#[fixture]
pub(crate) fn handler(platform_bus: MemoryBus, sensors: SensorConfig) -> DcmiHandler<MemoryBus> {
    DcmiHandler::new(
        platform_bus,
        BusLayout::default(),
        sensors,
        Capabilities::new(true),
    )
}
