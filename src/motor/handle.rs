//! Thread-safe control surface for command producers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::debug;

use crate::error::Result;
use crate::registers::{RegisterPath, Registers};

use super::command::{Command, CommandChannel, PatternId};

/// State shared between the control loop and its handles.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) commands: CommandChannel,
    running: AtomicBool,
    terminated: AtomicBool,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            commands: CommandChannel::new(),
            running: AtomicBool::new(true),
            terminated: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn cancel(&self) {
        self.running.store(false, Ordering::Release);
        self.commands.close();
    }

    pub(crate) fn mark_terminated(&self) {
        self.commands.close();
        self.terminated.store(true, Ordering::Release);
    }
}

/// Handle for issuing commands to a motor and reading its position.
///
/// Clones share the same motor; any number of threads may hold one.
/// Sending never blocks.
#[derive(Debug, Clone)]
pub struct MotorHandle {
    shared: Arc<Shared>,
    registers: Registers,
}

impl MotorHandle {
    pub(crate) fn new(shared: Arc<Shared>, registers: Registers) -> Self {
        Self { shared, registers }
    }

    /// Request a signed speed in rpm. Zero stops the motor.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Closed` once the motor is closed.
    pub fn set_speed(&self, rpm: f64) -> Result<()> {
        self.shared.commands.send(Command::SetSpeed(rpm))
    }

    /// Invert (or restore) the direction of travel.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Closed` once the motor is closed.
    pub fn set_reverse(&self, reverse: bool) -> Result<()> {
        self.shared.commands.send(Command::SetReverse(reverse))
    }

    /// Switch to the named step pattern.
    ///
    /// Unknown names are ignored by the control loop, not reported here.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Closed` once the motor is closed.
    pub fn set_microstep_resolution(&self, name: &str) -> Result<()> {
        match PatternId::try_from(name) {
            Ok(id) => self.shared.commands.send(Command::SetMicrostepResolution(id)),
            Err(_) => {
                // Longer than any pattern name, so it cannot match one.
                debug!("dropping resolution request for unknown pattern '{}'", name);
                if self.shared.commands.is_closed() {
                    return Err(crate::error::ChannelError::Closed.into());
                }
                Ok(())
            }
        }
    }

    /// Stop the control loop. Idempotent.
    ///
    /// The loop zeroes all outputs and exits within one coarse wait.
    pub fn close(&self) {
        self.shared.cancel();
    }

    /// Position in quarter-step units.
    #[inline]
    pub fn read_position(&self) -> i64 {
        self.registers.position().read()
    }

    /// Position in output revolutions.
    pub fn position_revolutions(&self) -> f64 {
        self.registers.get(RegisterPath::Position).as_f64().unwrap_or(0.0)
    }

    /// Configured speed limit in rpm, for producers to clamp against.
    pub fn max_rpm(&self) -> f64 {
        self.registers.float_or(RegisterPath::MaxRpm, 0.0)
    }

    /// True until `close` is called.
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// True once the loop has finished its shutdown sequence.
    pub fn is_terminated(&self) -> bool {
        self.shared.terminated.load(Ordering::Acquire)
    }

    /// The motor's register store.
    pub fn registers(&self) -> &Registers {
        &self.registers
    }
}

/// A control loop running on its own thread.
#[derive(Debug)]
pub struct RunningMotor<P> {
    handle: MotorHandle,
    thread: JoinHandle<P>,
}

impl<P> RunningMotor<P> {
    pub(crate) fn new(handle: MotorHandle, thread: JoinHandle<P>) -> Self {
        Self { handle, thread }
    }

    /// Handle for commands and position reads.
    pub fn handle(&self) -> &MotorHandle {
        &self.handle
    }

    /// Close the motor and wait for the loop to finish.
    ///
    /// Returns the PWM driver, or the panic payload if the loop panicked.
    pub fn close(self) -> std::thread::Result<P> {
        self.handle.close();
        self.thread.join()
    }
}
