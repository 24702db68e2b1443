//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::MotorConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
///
/// # Example
///
/// ```rust,ignore
/// use unipolar_stepper::load_config;
///
/// let config = load_config("clock.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MotorConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = truncated(&e.to_string());
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<MotorConfig> {
    let config: MotorConfig = toml::from_str(content).map_err(|e| {
        Error::Config(ConfigError::ParseError(truncated(e.message())))
    })?;

    super::validation::validate_config(&config)?;

    Ok(config)
}

fn truncated(text: &str) -> heapless::String<128> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config, MotorConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[motor]
steps_per_revolution = 200.0
max_rpm = 60.0
microsteps = 4.0
initial_position = 32

[driver]
pins = [5, 6, 13, 19]
pwm_frequency_hz = 8000
reverse = true
hold_power = 0.0
slow_power = 0.5
slow_limit_rpm = 10.0
fast_power = 0.9
resolution = "four"
"#;

        let config = parse_config(toml).unwrap();
        assert_eq!(config.motor.steps_per_revolution, 200.0);
        assert_eq!(config.motor.initial_position, 32);
        assert_eq!(config.driver.pins.as_slice(), &[5, 6, 13, 19]);
        assert!(config.driver.reverse);
        assert_eq!(config.driver.resolution.as_str(), "four");
    }

    #[test]
    fn test_parse_rejects_bad_pins() {
        let toml = r#"
[driver]
pins = [5, 6, 13]
"#;
        assert!(matches!(
            parse_config(toml),
            Err(Error::Config(ConfigError::InvalidPinConfiguration(_)))
        ));
    }

    #[test]
    fn test_parse_syntax_error() {
        assert!(matches!(
            parse_config("[motor"),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/unipolar.toml"),
            Err(Error::Config(ConfigError::IoError(_)))
        ));
    }
}
