//! # unipolar-stepper
//!
//! Real-time phase driver for unipolar stepper motors (28BYJ-48 on a ULN2003
//! board and the like) through four PWM outputs.
//!
//! ## Features
//!
//! - **Microstep tables**: full step, double-coil full step, half and quarter
//!   step patterns, switchable while running
//! - **Power scaling**: separate duty factors for holding, slow and fast running
//! - **Dedicated control thread**: commands arrive through a lock-free queue,
//!   the loop never blocks on producers
//! - **Position tracking**: lock-free position reads from any thread
//! - **Configuration-driven**: motor and driver settings from TOML files
//! - **embedded-hal 1.0**: drives `SetDutyCycle` channels, sleeps through `DelayNs`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use unipolar_stepper::{MotorBuilder, MotorConfig};
//!
//! let motor = MotorBuilder::new()
//!     .config(MotorConfig::default())
//!     .owned_hardware(pwm)
//!     .system_time()
//!     .build()?
//!     .spawn()?;
//!
//! motor.handle().set_speed(1.0)?;
//! println!("position: {}", motor.handle().read_position());
//! let pwm = motor.close().expect("motor thread panicked");
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables the control loop, register store and TOML loading
//! - `defmt`: Enables defmt formatting for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod config;
pub mod error;
pub mod motor;
#[cfg(feature = "std")]
pub mod registers;
pub mod table;

// Re-exports for ergonomic API
pub use config::{validate_config, DriverSettings, MotorConfig, MotorSettings};
pub use error::{Error, Result};
pub use motor::{Direction, Mode, MotorState, PositionRegister};
pub use table::{build_working_table, lookup, PowerFactors, PowerRegime, StepPattern, WorkingTable};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Control loop (std only)
#[cfg(feature = "std")]
pub use motor::{
    start_motor, Command, CommandChannel, Controller, DutyCycleBank, Hardware, MotorBuilder,
    MotorHandle, PwmDriver, RunningMotor,
};
#[cfg(feature = "std")]
pub use registers::{RegisterPath, Registers, Scalar};
