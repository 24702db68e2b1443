//! PWM driver settings from TOML.

use heapless::{String, Vec};
use serde::Deserialize;

use crate::table::DEFAULT_PATTERN;

/// Pins driving the four coils, in phase order.
pub const DEFAULT_PINS: [u8; 4] = [17, 23, 22, 27];

/// Output stage settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// GPIO numbers of the four coil outputs, in phase order.
    pub pins: Vec<u8, 8>,

    /// PWM frequency to request from the hardware.
    pub pwm_frequency_hz: u32,

    /// Invert the direction of travel for positive speeds. Off by default;
    /// set it when a positive speed turns the wrong way on a given wiring.
    pub reverse: bool,

    /// Power factor while the motor is stationary.
    pub hold_power: f32,

    /// Power factor below `slow_limit_rpm`.
    pub slow_power: f32,

    /// Speed below which `slow_power` applies.
    pub slow_limit_rpm: f64,

    /// Power factor at or above `slow_limit_rpm`.
    pub fast_power: f32,

    /// Step pattern selected at start.
    pub resolution: String<16>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        let mut pins = Vec::new();
        let _ = pins.extend_from_slice(&DEFAULT_PINS);
        let mut resolution = String::new();
        let _ = resolution.push_str(DEFAULT_PATTERN);
        Self {
            pins,
            pwm_frequency_hz: 10_000,
            reverse: false,
            hold_power: 0.1,
            slow_power: 0.6,
            slow_limit_rpm: 20.0,
            fast_power: 1.0,
            resolution,
        }
    }
}
