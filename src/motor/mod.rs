//! Motor module for unipolar-stepper.
//!
//! Provides the position register, and with `std` the control loop, its
//! command channel, hardware and time abstractions.

mod position;
pub mod state;

#[cfg(feature = "std")]
mod builder;
#[cfg(feature = "std")]
pub mod clock;
#[cfg(feature = "std")]
pub mod command;
#[cfg(feature = "std")]
mod controller;
#[cfg(feature = "std")]
mod handle;
#[cfg(feature = "std")]
pub mod hardware;

pub use position::{Direction, PositionRegister};
pub use state::{Configured, LoopState, Mode, MotorState, StateName, Started};

#[cfg(feature = "std")]
pub use builder::{start_motor, MotorBuilder};
#[cfg(feature = "std")]
pub use clock::{Clock, MonotonicClock, SimClock, StdDelay};
#[cfg(feature = "std")]
pub use command::{Command, CommandChannel, PatternId};
#[cfg(feature = "std")]
pub use controller::{
    rescale_index, Controller, COARSE_WAIT_NS, KEEPALIVE_NS, MIN_SLEEP_NS, POWER_DOWN_GRACE_NS,
};
#[cfg(feature = "std")]
pub use handle::{MotorHandle, RunningMotor};
#[cfg(feature = "std")]
pub use hardware::{DutyCycleBank, Hardware, PwmDriver, MAX_DUTY};
