//! Step table module for unipolar-stepper.
//!
//! Provides the built-in microstep patterns and the power-scaled working
//! tables the control loop walks through.

pub mod power;
pub mod registry;

pub use power::{build_working_table, wrap_index, PowerFactors, PowerRegime, WorkingTable};
pub use registry::{lookup, DutyVector, StepPattern, DEFAULT_PATTERN};
