//! Motor geometry settings from TOML.

use serde::Deserialize;

/// Motor and gearbox settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotorSettings {
    /// Full steps per output revolution (may be fractional behind a gearbox).
    pub steps_per_revolution: f64,

    /// Speed limit offered to command producers, in rpm.
    pub max_rpm: f64,

    /// Microsteps per full step used to convert rpm into a step interval.
    pub microsteps: f64,

    /// Position counter value at start, in quarter-step units.
    pub initial_position: i64,
}

impl Default for MotorSettings {
    /// 28BYJ-48 with its gearbox and a 12:1 speed-up to a clock second hand.
    fn default() -> Self {
        Self {
            steps_per_revolution: 2048.0 / 12.0,
            max_rpm: 100.0,
            microsteps: 2.0,
            initial_position: 0,
        }
    }
}
