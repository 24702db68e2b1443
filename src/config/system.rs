//! Root configuration structure.

use serde::Deserialize;

use super::driver::DriverSettings;
use super::motor::MotorSettings;
use crate::table::PowerFactors;

/// Complete configuration for one motor.
///
/// Both tables are optional in TOML; missing values take the geometry and
/// power settings of a 28BYJ-48 on a ULN2003 board. `reverse` defaults to
/// off, since it depends on how the coils are wired.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MotorConfig {
    /// Motor geometry.
    #[serde(default)]
    pub motor: MotorSettings,

    /// Output stage.
    #[serde(default)]
    pub driver: DriverSettings,
}

impl MotorConfig {
    /// Power factors configured for the driver.
    pub fn power_factors(&self) -> PowerFactors {
        PowerFactors {
            hold: self.driver.hold_power,
            slow: self.driver.slow_power,
            fast: self.driver.fast_power,
            slow_limit_rpm: self.driver.slow_limit_rpm,
        }
    }
}
