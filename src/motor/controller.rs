//! The real-time control loop.
//!
//! One thread owns the controller and with it the motor state, the working
//! table and the PWM hardware. Producers talk to it only through the command
//! channel in [`MotorHandle`].
//!
//! Each iteration:
//! 1. powers the outputs down once the post-stop grace deadline passes,
//! 2. waits for the next step deadline (in slices of at most 250 ms) and,
//!    once it is reached, performs one step transition,
//! 3. applies at most one queued command.

use core::marker::PhantomData;
use std::sync::Arc;
use std::thread;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::error::{HardwareError, Result};
use crate::registers::{RegisterPath, Registers, Scalar};
use crate::table::power::STOP_EPSILON_RPM;
use crate::table::{build_working_table, registry, DutyVector, StepPattern, WorkingTable};

use super::clock::Clock;
use super::command::{Command, PatternId};
use super::handle::{MotorHandle, RunningMotor, Shared};
use super::hardware::{Hardware, PwmDriver};
use super::position::Direction;
use super::state::{Configured, LoopState, Mode, MotorState, StateName, Started};

/// Longest single sleep of the loop.
pub const COARSE_WAIT_NS: u64 = 250_000_000;

/// Remaining waits below this are not slept.
pub const MIN_SLEEP_NS: u64 = 100_000;

/// Deadline spacing while stationary.
pub const KEEPALIVE_NS: u64 = 1_000_000_000;

/// Time after a stop before the outputs are powered down.
pub const POWER_DOWN_GRACE_NS: u64 = 3_000_000_000;

const NS_PER_SEC: f64 = 1e9;

/// Control loop for one unipolar stepper.
///
/// Generic over:
/// - `P`: PWM output device
/// - `C`: Time source
/// - `D`: Delay provider used for sleeping
/// - `STATE`: Type-state marker (defaults to `Configured`)
pub struct Controller<P, C, D, STATE = Configured>
where
    P: PwmDriver,
    C: Clock,
    D: DelayNs,
    STATE: LoopState,
{
    hardware: Hardware<P>,
    pins: [u8; 4],
    clock: C,
    delay: D,
    shared: Arc<Shared>,
    registers: Registers,

    /// Active step pattern.
    pattern: &'static StepPattern,
    /// Pattern scaled for the current power regime, possibly reversed.
    table: WorkingTable,
    step_index: usize,
    target_speed: f64,
    /// Seconds between table entries; `None` while stationary.
    step_interval: Option<f64>,
    reverse: bool,
    stop_deadline: Option<u64>,
    next_step_at: u64,
    /// Duty last written to each pin.
    applied: DutyVector,

    _state: PhantomData<STATE>,
}

impl<P, C, D, STATE> Controller<P, C, D, STATE>
where
    P: PwmDriver,
    C: Clock,
    D: DelayNs,
    STATE: LoopState + StateName,
{
    /// Handle for commands and position reads.
    pub fn handle(&self) -> MotorHandle {
        MotorHandle::new(Arc::clone(&self.shared), self.registers.clone())
    }

    /// Coil pins in phase order.
    #[inline]
    pub fn pins(&self) -> [u8; 4] {
        self.pins
    }

    /// The register store.
    #[inline]
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// The PWM driver.
    #[inline]
    pub fn driver(&self) -> &P {
        self.hardware.driver()
    }

    /// Active step pattern.
    #[inline]
    pub fn pattern(&self) -> &'static StepPattern {
        self.pattern
    }

    /// Current working table.
    #[inline]
    pub fn working_table(&self) -> &WorkingTable {
        &self.table
    }

    /// Duty last written to each pin.
    #[inline]
    pub fn applied_duty(&self) -> DutyVector {
        self.applied
    }

    /// Snapshot of the motor state.
    pub fn state(&self) -> MotorState {
        MotorState {
            step_index: self.step_index,
            target_speed: self.target_speed,
            step_interval: self.step_interval,
            pattern: self.pattern.name,
            reverse: self.reverse,
            stop_deadline: self.stop_deadline,
        }
    }

    /// Stationary or stepping.
    #[inline]
    pub fn mode(&self) -> Mode {
        if self.step_interval.is_some() {
            Mode::Stepping
        } else {
            Mode::Stationary
        }
    }

    /// Get the current type-state name.
    #[inline]
    pub fn state_name(&self) -> &'static str {
        STATE::name()
    }

    fn rebuild_table(&mut self) {
        let factor = self
            .registers
            .power_factors()
            .factor_for(self.step_interval.is_some(), self.target_speed);
        self.table = build_working_table(self.pattern, factor, self.reverse);
    }

    fn into_state<S: LoopState>(self) -> Controller<P, C, D, S> {
        Controller {
            hardware: self.hardware,
            pins: self.pins,
            clock: self.clock,
            delay: self.delay,
            shared: self.shared,
            registers: self.registers,
            pattern: self.pattern,
            table: self.table,
            step_index: self.step_index,
            target_speed: self.target_speed,
            step_interval: self.step_interval,
            reverse: self.reverse,
            stop_deadline: self.stop_deadline,
            next_step_at: self.next_step_at,
            applied: self.applied,
            _state: PhantomData,
        }
    }
}

impl<P, C, D> Controller<P, C, D, Configured>
where
    P: PwmDriver,
    C: Clock,
    D: DelayNs,
{
    /// Create a controller in the Configured state.
    pub(crate) fn new(
        hardware: Hardware<P>,
        pins: [u8; 4],
        clock: C,
        delay: D,
        registers: Registers,
        pattern: &'static StepPattern,
    ) -> Self {
        let reverse = registers.flag(RegisterPath::Reverse);
        let mut controller = Self {
            hardware,
            pins,
            clock,
            delay,
            shared: Arc::new(Shared::new()),
            registers,
            pattern,
            table: build_working_table(pattern, 0.0, false),
            step_index: 0,
            target_speed: 0.0,
            step_interval: None,
            reverse,
            stop_deadline: None,
            next_step_at: 0,
            applied: [0; 4],
            _state: PhantomData,
        };
        controller.rebuild_table();
        controller
    }

    /// Acquire the hardware and configure the PWM frequency on all pins.
    ///
    /// No output is driven. The frequency the hardware reports for the first
    /// pin is recorded in `driveregs/actual frequency`.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Unavailable` if owned hardware cannot connect
    /// or supplied hardware is not connected.
    pub fn start(mut self) -> Result<Controller<P, C, D, Started>> {
        self.hardware.acquire()?;

        let requested = libm::round(self.registers.float_or(RegisterPath::PwmFrequency, 0.0)) as u32;
        let pins = self.pins;
        let driver = self.hardware.driver_mut();
        for pin in pins {
            driver.set_frequency(pin, requested);
        }
        let actual = driver.frequency(pins[0]);
        info!(
            "setup pwm on pins {:?}, requested frequency {} Hz, actual frequency is {} Hz",
            pins, requested, actual
        );
        self.registers
            .store(RegisterPath::ActualFrequency, Scalar::Float(actual as f64))?;

        self.next_step_at = self.clock.now_ns().saturating_add(KEEPALIVE_NS);
        Ok(self.into_state())
    }

    /// Start the controller and run it on a dedicated thread.
    ///
    /// Startup errors are returned before the thread is created.
    ///
    /// # Errors
    ///
    /// As [`Controller::start`], plus `HardwareError::SpawnFailed`.
    pub fn spawn(self) -> Result<RunningMotor<P>>
    where
        P: Send + 'static,
        C: Send + 'static,
        D: Send + 'static,
    {
        let started = self.start()?;
        let handle = started.handle();
        let thread = thread::Builder::new()
            .name("unipolar-stepper".into())
            .spawn(move || started.run())
            .map_err(|_| HardwareError::SpawnFailed)?;
        Ok(RunningMotor::new(handle, thread))
    }
}

impl<P, C, D> Controller<P, C, D, Started>
where
    P: PwmDriver,
    C: Clock,
    D: DelayNs,
{
    /// Clock time of the next step transition.
    #[inline]
    pub fn next_step_at(&self) -> u64 {
        self.next_step_at
    }

    /// Run until the handle is closed, then shut down.
    ///
    /// Returns the PWM driver.
    pub fn run(mut self) -> P {
        info!("motor loop running on pins {:?}", self.pins);
        while self.shared.is_running() {
            self.tick();
        }
        self.shutdown()
    }

    /// One loop iteration.
    pub fn tick(&mut self) {
        let now = self.clock.now_ns();
        if let Some(deadline) = self.stop_deadline {
            if now >= deadline {
                self.power_down();
                self.stop_deadline = None;
            }
        }

        let delay = self.next_step_at.saturating_sub(now);
        if delay > COARSE_WAIT_NS {
            self.delay.delay_ns(COARSE_WAIT_NS as u32);
        } else {
            if delay > MIN_SLEEP_NS {
                self.delay.delay_ns(delay as u32);
            }
            self.step();
        }

        if let Some(command) = self.shared.commands.try_receive() {
            self.apply(command);
        }
    }

    fn step(&mut self) {
        let Some(interval) = self.step_interval else {
            self.next_step_at = self.next_step_at.saturating_add(KEEPALIVE_NS);
            return;
        };
        self.next_step_at = self.next_step_at.saturating_add(interval_ns(interval));

        let direction = Direction::from_speed(self.target_speed);
        self.step_index = self.table.wrap_index(self.step_index, direction.sign());
        self.registers
            .position()
            .apply_delta(direction, self.pattern.step_factor);
        self.write_current_entry();
    }

    /// Write the channels of the current entry that differ from the outputs.
    fn write_current_entry(&mut self) {
        let Some(&entry) = self.table.get(self.step_index) else {
            return;
        };
        let driver = self.hardware.driver_mut();
        for ((&pin, &duty), applied) in self.pins.iter().zip(entry.iter()).zip(self.applied.iter_mut()) {
            if duty != *applied {
                driver.set_duty_cycle(pin, duty);
                *applied = duty;
            }
        }
    }

    fn power_down(&mut self) {
        debug!("grace period over, powering down outputs");
        let driver = self.hardware.driver_mut();
        for pin in self.pins {
            driver.set_duty_cycle(pin, 0);
        }
        self.applied = [0; 4];
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SetSpeed(rpm) => self.set_speed(rpm),
            Command::SetMicrostepResolution(id) => self.set_resolution(&id),
            Command::SetReverse(reverse) => self.set_reverse(reverse),
        }
    }

    fn set_speed(&mut self, rpm: f64) {
        if libm::fabs(rpm) < STOP_EPSILON_RPM {
            self.target_speed = rpm;
            self.step_interval = None;
            self.rebuild_table();
            self.write_current_entry();
            self.stop_deadline = Some(self.clock.now_ns().saturating_add(POWER_DOWN_GRACE_NS));
            info!("stopped, outputs power down in {} s", POWER_DOWN_GRACE_NS / 1_000_000_000);
            return;
        }

        let per_rev = self.registers.micro_steps_per_rev();
        let interval = 60.0 / (libm::fabs(rpm) * per_rev);
        if !(interval.is_finite() && interval > 0.0) {
            warn!("ignoring speed {} rpm with {} microsteps per revolution", rpm, per_rev);
            return;
        }

        self.target_speed = rpm;
        self.step_interval = Some(interval);
        self.rebuild_table();
        self.stop_deadline = None;

        // Never wait past one new interval from now.
        let soonest = self.clock.now_ns().saturating_add(interval_ns(interval));
        if soonest < self.next_step_at {
            self.next_step_at = soonest;
        }
        info!("step interval now set to {:.5} s", interval);
    }

    fn set_resolution(&mut self, id: &PatternId) {
        let Some(next) = registry::find(id.as_str()) else {
            warn!("ignoring unknown step pattern '{}'", id.as_str());
            return;
        };
        if next.name == self.pattern.name {
            return;
        }

        self.step_index = rescale_index(self.step_index, self.pattern, next);
        debug!(
            "step pattern {} -> {}, index now {}",
            self.pattern.name, next.name, self.step_index
        );
        self.pattern = next;
        self.rebuild_table();
    }

    fn set_reverse(&mut self, reverse: bool) {
        if reverse == self.reverse {
            return;
        }
        info!("change direction, reverse = {}", reverse);
        self.reverse = reverse;
        // The flag register only rejects non-bool values.
        let _ = self.registers.store(RegisterPath::Reverse, Scalar::Bool(reverse));
        self.rebuild_table();
    }

    fn shutdown(mut self) -> P {
        info!("motor thread shutting down");
        let driver = self.hardware.driver_mut();
        for pin in self.pins {
            driver.set_duty_cycle(pin, 0);
        }
        self.applied = [0; 4];
        self.hardware.release();
        self.shared.mark_terminated();
        self.hardware.into_inner()
    }
}

/// Interval in nanoseconds, saturating at `u64::MAX`.
#[inline]
fn interval_ns(interval_secs: f64) -> u64 {
    libm::round(interval_secs * NS_PER_SEC) as u64
}

/// Map a table index to the index at the same shaft position in another
/// pattern, rounding half to even and wrapping into the new table.
pub fn rescale_index(index: usize, from: &StepPattern, to: &StepPattern) -> usize {
    let old = from.step_factor as f64;
    let new = to.step_factor as f64;
    let scaled = if new > old {
        libm::rint(index as f64 / (new / old))
    } else if new < old {
        libm::rint(index as f64 * (old / new))
    } else {
        index as f64
    };
    (scaled as i64).rem_euclid(to.len() as i64) as usize
}
