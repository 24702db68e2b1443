//! Controller type-state markers and the motor state snapshot.
//!
//! Uses Rust's type system to keep `tick`/`run` unavailable until the
//! hardware has been acquired.

/// Controller is built but the hardware is not acquired yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Configured;

/// Hardware is acquired and the PWM frequency configured.
#[derive(Debug, Clone, Copy)]
pub struct Started;

/// Trait for controller states.
pub trait LoopState: private::Sealed {}

impl LoopState for Configured {}
impl LoopState for Started {}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Configured {}
    impl Sealed for super::Started {}
}

/// State name for display/debugging.
pub trait StateName {
    /// Get the state name as a static string.
    fn name() -> &'static str;
}

impl StateName for Configured {
    fn name() -> &'static str {
        "Configured"
    }
}

impl StateName for Started {
    fn name() -> &'static str {
        "Started"
    }
}

/// Whether the motor is turning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// No step interval; table index frozen.
    Stationary,
    /// Advancing the table index every step interval.
    Stepping,
}

/// Snapshot of the control loop's motor state.
#[derive(Debug, Clone, PartialEq)]
pub struct MotorState {
    /// Index into the working table.
    pub step_index: usize,
    /// Signed target speed in rpm.
    pub target_speed: f64,
    /// Seconds between table entries; `None` while stationary.
    pub step_interval: Option<f64>,
    /// Name of the active step pattern.
    pub pattern: &'static str,
    /// Table traversal is inverted.
    pub reverse: bool,
    /// When the outputs will be powered down (clock nanoseconds).
    pub stop_deadline: Option<u64>,
}

impl MotorState {
    /// Current mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        if self.step_interval.is_some() {
            Mode::Stepping
        } else {
            Mode::Stationary
        }
    }
}
