//! Configuration validation.

use core::fmt::Write;

use crate::error::{ConfigError, Error, Result};
use crate::table::registry;

use super::MotorConfig;

/// Highest usable GPIO number.
pub const MAX_GPIO: u8 = 31;

/// Validate a motor configuration.
///
/// Checks:
/// - Exactly four pins, each within 1..=MAX_GPIO
/// - Power factors within [0, 1]
/// - Step geometry, max rpm and PWM frequency strictly positive
/// - Slow speed threshold not negative
/// - The initial resolution names a known step pattern
pub fn validate_config(config: &MotorConfig) -> Result<()> {
    validate_pins(&config.driver.pins)?;

    let motor = &config.motor;
    if !(motor.steps_per_revolution > 0.0) {
        return Err(ConfigError::InvalidStepGeometry(motor.steps_per_revolution).into());
    }
    if !(motor.microsteps > 0.0) {
        return Err(ConfigError::InvalidStepGeometry(motor.microsteps).into());
    }
    if !(motor.max_rpm > 0.0) {
        return Err(ConfigError::InvalidMaxRpm(motor.max_rpm).into());
    }

    let driver = &config.driver;
    for (which, value) in [
        ("hold", driver.hold_power),
        ("slow", driver.slow_power),
        ("fast", driver.fast_power),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidPowerFactor { which, value }.into());
        }
    }
    if !(driver.slow_limit_rpm >= 0.0) {
        return Err(ConfigError::InvalidSlowLimit(driver.slow_limit_rpm).into());
    }
    if driver.pwm_frequency_hz == 0 {
        return Err(ConfigError::InvalidPwmFrequency(driver.pwm_frequency_hz).into());
    }

    registry::lookup(driver.resolution.as_str())?;

    Ok(())
}

/// Check a pin list and return it as the four coil pins.
///
/// # Errors
///
/// Returns `ConfigError::InvalidPinConfiguration` if there are not exactly
/// four pins or a pin is outside 1..=MAX_GPIO.
pub fn validate_pins(pins: &[u8]) -> Result<[u8; 4]> {
    let mut msg: heapless::String<64> = heapless::String::new();

    let pins: [u8; 4] = match pins.try_into() {
        Ok(p) => p,
        Err(_) => {
            let _ = write!(msg, "expected 4 pins, got {}", pins.len());
            return Err(Error::Config(ConfigError::InvalidPinConfiguration(msg)));
        }
    };

    if let Some(pin) = pins.iter().find(|&&p| p == 0 || p > MAX_GPIO) {
        let _ = write!(msg, "pin {} outside 1..={}", pin, MAX_GPIO);
        return Err(Error::Config(ConfigError::InvalidPinConfiguration(msg)));
    }

    Ok(pins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatternError;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&MotorConfig::default()).is_ok());
    }

    #[test]
    fn test_pin_count() {
        assert!(matches!(
            validate_pins(&[17, 23, 22]),
            Err(Error::Config(ConfigError::InvalidPinConfiguration(_)))
        ));
        assert!(validate_pins(&[17, 23, 22, 27, 5]).is_err());
        assert_eq!(validate_pins(&[17, 23, 22, 27]).unwrap(), [17, 23, 22, 27]);
    }

    #[test]
    fn test_pin_range() {
        assert!(validate_pins(&[0, 23, 22, 27]).is_err());
        assert!(validate_pins(&[17, 32, 22, 27]).is_err());
        assert!(validate_pins(&[1, 31, 2, 30]).is_ok());
    }

    #[test]
    fn test_invalid_power_factor() {
        let mut config = MotorConfig::default();
        config.driver.slow_power = 1.2;
        let result = validate_config(&config);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidPowerFactor { which: "slow", .. }))
        ));
    }

    #[test]
    fn test_unknown_resolution() {
        let mut config = MotorConfig::default();
        config.driver.resolution = heapless::String::try_from("eight").unwrap();
        assert!(matches!(
            validate_config(&config),
            Err(Error::Pattern(PatternError::UnknownPattern(_)))
        ));
    }

    #[test]
    fn test_invalid_geometry() {
        let mut config = MotorConfig::default();
        config.motor.steps_per_revolution = 0.0;
        assert!(validate_config(&config).is_err());

        let mut config = MotorConfig::default();
        config.motor.max_rpm = -1.0;
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidMaxRpm(_)))
        ));
    }
}
