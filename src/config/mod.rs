//! Configuration module for unipolar-stepper.
//!
//! Provides the motor and driver settings, loadable from TOML files (with the
//! `std` feature) or built in code, and their validation.

mod driver;
#[cfg(feature = "std")]
mod loader;
mod motor;
mod system;
mod validation;

pub use driver::{DriverSettings, DEFAULT_PINS};
pub use motor::MotorSettings;
pub use system::MotorConfig;
pub use validation::{validate_config, validate_pins, MAX_GPIO};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};
