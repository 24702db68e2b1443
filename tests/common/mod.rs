//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use unipolar_stepper::error::HardwareError;
use unipolar_stepper::motor::clock::{Clock, SimClock};
use unipolar_stepper::motor::state::{Configured, Started};
use unipolar_stepper::{Controller, MotorBuilder, MotorConfig, PwmDriver, Result};

/// Everything a [`RecordingPwm`] observed.
#[derive(Debug, Default)]
pub struct PwmLog {
    pub writes: Vec<(u8, u8)>,
    pub frequency_requests: Vec<(u8, u32)>,
    pub connects: usize,
    pub disconnects: usize,
}

/// PWM driver that records every call into a shared log.
#[derive(Debug, Clone)]
pub struct RecordingPwm {
    log: Arc<Mutex<PwmLog>>,
    connected: bool,
    refuse_connect: bool,
    quantum_hz: u32,
    frequencies: HashMap<u8, u32>,
}

impl RecordingPwm {
    /// Disconnected driver that connects on request.
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(PwmLog::default())),
            connected: false,
            refuse_connect: false,
            quantum_hz: 1,
            frequencies: HashMap::new(),
        }
    }

    /// Driver that is already connected.
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::new()
        }
    }

    /// Driver whose connection always fails.
    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Self::new()
        }
    }

    /// Round requested frequencies down to a multiple of `quantum_hz`.
    pub fn with_quantum(mut self, quantum_hz: u32) -> Self {
        self.quantum_hz = quantum_hz.max(1);
        self
    }

    pub fn log(&self) -> Arc<Mutex<PwmLog>> {
        Arc::clone(&self.log)
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.log.lock().unwrap().writes.clone()
    }
}

impl PwmDriver for RecordingPwm {
    fn connect(&mut self) -> Result<()> {
        if self.refuse_connect {
            return Err(HardwareError::Unavailable.into());
        }
        self.connected = true;
        self.log.lock().unwrap().connects += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.log.lock().unwrap().disconnects += 1;
    }

    fn set_frequency(&mut self, pin: u8, hz: u32) -> u32 {
        self.log.lock().unwrap().frequency_requests.push((pin, hz));
        let actual = hz - hz % self.quantum_hz;
        self.frequencies.insert(pin, actual);
        actual
    }

    fn frequency(&self, pin: u8) -> u32 {
        self.frequencies.get(&pin).copied().unwrap_or(0)
    }

    fn set_duty_cycle(&mut self, pin: u8, duty: u8) {
        self.log.lock().unwrap().writes.push((pin, duty));
    }
}

pub type SimController<S> = Controller<RecordingPwm, SimClock, SimClock, S>;

/// Build an owned-hardware controller on a simulated clock.
pub fn build(config: MotorConfig, pwm: RecordingPwm, clock: &SimClock) -> SimController<Configured> {
    MotorBuilder::new()
        .config(config)
        .owned_hardware(pwm)
        .clock(clock.clone())
        .delay(clock.clone())
        .build()
        .expect("valid configuration")
}

/// Start a default motor; returns the controller, its clock and the write log.
pub fn started() -> (SimController<Started>, SimClock, Arc<Mutex<PwmLog>>) {
    let clock = SimClock::new();
    let pwm = RecordingPwm::new();
    let log = pwm.log();
    let controller = build(MotorConfig::default(), pwm, &clock)
        .start()
        .expect("hardware available");
    (controller, clock, log)
}

/// Tick until the next step transition has happened.
///
/// Commands queued beforehand are applied by the ticks leading up to it.
pub fn tick_until_step(controller: &mut SimController<Started>) {
    let deadline = controller.next_step_at();
    while controller.next_step_at() == deadline {
        controller.tick();
    }
}

/// Tick until the simulated clock reaches `ns`.
pub fn tick_until(controller: &mut SimController<Started>, clock: &SimClock, ns: u64) {
    while clock.now_ns() < ns {
        controller.tick();
    }
}

/// Writes recorded since the log was last drained.
pub fn drain_writes(log: &Arc<Mutex<PwmLog>>) -> Vec<(u8, u8)> {
    std::mem::take(&mut log.lock().unwrap().writes)
}
