//! DCMI capability flags.

const POWER_MANAGEMENT_KEY: &str = "PowerManagement";
const POWER_MANAGEMENT_SUPPORTED: u64 = 1;

/// Optional DCMI features enabled on this platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    power_management: bool,
}

impl Capabilities {
    /// Creates flags with power management on or off.
    #[must_use]
    pub const fn new(power_management: bool) -> Self {
        Self { power_management }
    }

    /// Reads the flags from the capabilities document.
    ///
    /// Power management is enabled only when `PowerManagement` is `1`; an
    /// absent key or any other value leaves it disabled.
    #[must_use]
    pub fn from_value(document: &serde_json::Value) -> Self {
        let power_management = document
            .get(POWER_MANAGEMENT_KEY)
            .and_then(serde_json::Value::as_u64)
            == Some(POWER_MANAGEMENT_SUPPORTED);
        Self { power_management }
    }

    /// Whether Get Power Reading is served.
    #[must_use]
    pub const fn power_management(self) -> bool {
        self.power_management
    }
}
