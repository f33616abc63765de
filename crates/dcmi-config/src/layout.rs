//! Bus vocabulary used by the DCMI handlers.
//!
//! Every interface name, search root and well-known object path the handlers
//! touch is collected here. The defaults follow the OpenBMC object model; a
//! deployment or a test can substitute any of them by building its own
//! [`BusLayout`].

/// Location of the object mapper (directory service).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperLayout {
    /// Bus name owning the mapper.
    pub service: String,
    /// Object path of the mapper.
    pub path: String,
    /// Interface exposing `GetSubTree` and `GetObject`.
    pub interface: String,
}

/// Where the asset tag lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTagLayout {
    /// Interface implemented by the object carrying the tag.
    pub interface: String,
    /// Subtree searched for that interface.
    pub search_root: String,
    /// Property holding the tag text.
    pub property: String,
}

/// Network configuration object holding the host name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkLayout {
    /// Object path of the system network configuration.
    pub config_path: String,
    /// Interface carrying the host name.
    pub config_interface: String,
    /// Host name property.
    pub hostname_property: String,
}

/// DHCP client configuration object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpLayout {
    /// Object path of the DHCP configuration.
    pub path: String,
    /// DHCP configuration interface.
    pub interface: String,
    /// Property toggling DHCP option 12 (host name).
    pub send_hostname_property: String,
}

/// Ethernet interfaces enumerated when activating DHCP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetLayout {
    /// Subtree holding the network objects.
    pub search_root: String,
    /// Interface implemented by every ethernet interface object.
    pub interface: String,
    /// Property describing whether DHCP is enabled.
    pub dhcp_enabled_property: String,
}

/// systemd manager used to restart the network daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemdLayout {
    /// Bus name of the systemd manager.
    pub service: String,
    /// Object path of the manager.
    pub path: String,
    /// Manager interface.
    pub interface: String,
    /// Unit restarted when DHCP is re-activated.
    pub network_unit: String,
}

/// Power reading resource and the properties read from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerLayout {
    /// Interface implemented by the power reading object.
    pub interface: String,
    /// Subtree searched for the power reading object.
    pub search_root: String,
    /// Current reading, in watts.
    pub current_property: String,
    /// Minimum over the sampling window.
    pub minimum_property: String,
    /// Maximum over the sampling window.
    pub maximum_property: String,
    /// Average over the sampling window.
    pub average_property: String,
    /// Sampling window in milliseconds.
    pub time_frame_property: String,
    /// Reading state flags.
    pub state_property: String,
}

/// Complete bus vocabulary threaded through the handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusLayout {
    /// Directory service location.
    pub mapper: MapperLayout,
    /// Asset tag lookup.
    pub asset_tag: AssetTagLayout,
    /// Host name lookup.
    pub network: NetworkLayout,
    /// DHCP discovery settings.
    pub dhcp: DhcpLayout,
    /// Ethernet interface enumeration.
    pub ethernet: EthernetLayout,
    /// Network daemon restarts.
    pub systemd: SystemdLayout,
    /// Power reading lookup.
    pub power: PowerLayout,
}

impl Default for BusLayout {
    fn default() -> Self {
        Self {
            mapper: MapperLayout {
                service: "xyz.openbmc_project.ObjectMapper".to_owned(),
                path: "/xyz/openbmc_project/object_mapper".to_owned(),
                interface: "xyz.openbmc_project.ObjectMapper".to_owned(),
            },
            asset_tag: AssetTagLayout {
                interface: "xyz.openbmc_project.Inventory.Decorator.AssetTag".to_owned(),
                search_root: "/xyz/openbmc_project/inventory".to_owned(),
                property: "AssetTag".to_owned(),
            },
            network: NetworkLayout {
                config_path: "/xyz/openbmc_project/network/config".to_owned(),
                config_interface: "xyz.openbmc_project.Network.SystemConfiguration".to_owned(),
                hostname_property: "HostName".to_owned(),
            },
            dhcp: DhcpLayout {
                path: "/xyz/openbmc_project/network/dhcp".to_owned(),
                interface: "xyz.openbmc_project.Network.DHCPConfiguration".to_owned(),
                send_hostname_property: "SendHostNameEnabled".to_owned(),
            },
            ethernet: EthernetLayout {
                search_root: "/xyz/openbmc_project/network".to_owned(),
                interface: "xyz.openbmc_project.Network.EthernetInterface".to_owned(),
                dhcp_enabled_property: "DHCPEnabled".to_owned(),
            },
            systemd: SystemdLayout {
                service: "org.freedesktop.systemd1".to_owned(),
                path: "/org/freedesktop/systemd1".to_owned(),
                interface: "org.freedesktop.systemd1.Manager".to_owned(),
                network_unit: "systemd-networkd.service".to_owned(),
            },
            power: PowerLayout {
                interface: "xyz.openbmc_project.Sensor.Value".to_owned(),
                search_root: "/xyz/openbmc_project/sensors/power".to_owned(),
                current_property: "Value".to_owned(),
                minimum_property: "MinimumValue".to_owned(),
                maximum_property: "MaximumValue".to_owned(),
                average_property: "AverageValue".to_owned(),
                time_frame_property: "TimeFrame".to_owned(),
                state_property: "ReadingState".to_owned(),
            },
        }
    }
}
