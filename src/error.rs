//! Error types for unipolar-stepper.
//!
//! Construction-time failures (configuration, pins, hardware) are returned to
//! the caller. Runtime command problems inside the control loop are never
//! raised; the loop logs and ignores them.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all unipolar-stepper operations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration parsing, validation or register access error
    Config(ConfigError),
    /// PWM hardware could not be acquired or validated
    Hardware(HardwareError),
    /// Step pattern lookup error
    Pattern(PatternError),
    /// Command channel error
    Channel(ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Wrong number of pins, or a pin outside the valid GPIO range
    InvalidPinConfiguration(heapless::String<64>),
    /// Power factor outside [0, 1]
    InvalidPowerFactor {
        /// Which factor ("hold", "slow" or "fast")
        which: &'static str,
        /// Offending value
        value: f32,
    },
    /// Steps per revolution or microsteps not strictly positive
    InvalidStepGeometry(f64),
    /// Maximum speed not strictly positive
    InvalidMaxRpm(f64),
    /// Slow speed threshold negative
    InvalidSlowLimit(f64),
    /// Requested PWM frequency of zero
    InvalidPwmFrequency(u32),
    /// Register path not known to the store
    UnknownRegister(heapless::String<32>),
    /// Register is derived or owned by the control loop
    ReadOnlyRegister(&'static str),
    /// Value type does not match the register
    TypeMismatch(&'static str),
    /// Builder is missing a required part
    MissingField(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Hardware errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareError {
    /// No connection to the PWM hardware is available
    Unavailable,
    /// The control thread could not be spawned
    SpawnFailed,
}

/// Step pattern errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternError {
    /// No step pattern with this name
    UnknownPattern(heapless::String<32>),
}

/// Command channel errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// The motor has been closed and accepts no more commands
    Closed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Hardware(e) => write!(f, "Hardware error: {}", e),
            Error::Pattern(e) => write!(f, "Step pattern error: {}", e),
            Error::Channel(e) => write!(f, "Command channel error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidPinConfiguration(msg) => {
                write!(f, "Invalid pin configuration: {}", msg)
            }
            ConfigError::InvalidPowerFactor { which, value } => {
                write!(f, "Invalid {} power factor: {}. Must be within 0.0-1.0", which, value)
            }
            ConfigError::InvalidStepGeometry(v) => {
                write!(f, "Invalid step geometry: {}. Must be > 0", v)
            }
            ConfigError::InvalidMaxRpm(v) => write!(f, "Invalid max rpm: {}. Must be > 0", v),
            ConfigError::InvalidSlowLimit(v) => {
                write!(f, "Invalid slow speed limit: {}. Must be >= 0", v)
            }
            ConfigError::InvalidPwmFrequency(v) => {
                write!(f, "Invalid PWM frequency: {} Hz. Must be > 0", v)
            }
            ConfigError::UnknownRegister(path) => write!(f, "Unknown register '{}'", path),
            ConfigError::ReadOnlyRegister(path) => write!(f, "Register '{}' is read-only", path),
            ConfigError::TypeMismatch(path) => {
                write!(f, "Value type does not match register '{}'", path)
            }
            ConfigError::MissingField(field) => write!(f, "{} is required", field),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::Unavailable => write!(f, "no PWM hardware connection available"),
            HardwareError::SpawnFailed => write!(f, "control thread could not be spawned"),
        }
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::UnknownPattern(name) => write!(f, "Unknown step pattern '{}'", name),
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Closed => write!(f, "motor is closed"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Error::Hardware(e)
    }
}

impl From<PatternError> for Error {
    fn from(e: PatternError) -> Self {
        Error::Pattern(e)
    }
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Error::Channel(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for HardwareError {}

#[cfg(feature = "std")]
impl std::error::Error for PatternError {}

#[cfg(feature = "std")]
impl std::error::Error for ChannelError {}
