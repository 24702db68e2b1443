//! Builder pattern for Controller.

use embedded_hal::delay::DelayNs;

use crate::config::{validate_config, validate_pins, MotorConfig};
use crate::error::{ConfigError, Error, Result};
use crate::registers::Registers;
use crate::table::registry;

use super::clock::{Clock, MonotonicClock, StdDelay};
use super::controller::Controller;
use super::handle::RunningMotor;
use super::hardware::{Hardware, PwmDriver};
use super::state::Configured;

/// Builder for creating Controller instances.
pub struct MotorBuilder<P, C, D>
where
    P: PwmDriver,
    C: Clock,
    D: DelayNs,
{
    hardware: Option<Hardware<P>>,
    clock: Option<C>,
    delay: Option<D>,
    config: MotorConfig,
    pins: Option<Result<[u8; 4]>>,
    registers: Option<Registers>,
}

impl<P, C, D> Default for MotorBuilder<P, C, D>
where
    P: PwmDriver,
    C: Clock,
    D: DelayNs,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, C, D> MotorBuilder<P, C, D>
where
    P: PwmDriver,
    C: Clock,
    D: DelayNs,
{
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            hardware: None,
            clock: None,
            delay: None,
            config: MotorConfig::default(),
            pins: None,
            registers: None,
        }
    }

    /// Use a motor configuration.
    pub fn config(mut self, config: MotorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the four coil pins, overriding the configuration.
    ///
    /// An invalid pin list is reported by `build`.
    pub fn pins(mut self, pins: &[u8]) -> Self {
        self.pins = Some(validate_pins(pins));
        self
    }

    /// Use an existing register store instead of one built from the
    /// configuration.
    pub fn registers(mut self, registers: Registers) -> Self {
        self.registers = Some(registers);
        self
    }

    /// Hardware the controller connects at start and releases at shutdown.
    pub fn owned_hardware(mut self, driver: P) -> Self {
        self.hardware = Some(Hardware::Owned(driver));
        self
    }

    /// Already connected hardware that stays connected after shutdown.
    pub fn supplied_hardware(mut self, driver: P) -> Self {
        self.hardware = Some(Hardware::Supplied(driver));
        self
    }

    /// Set the time source.
    pub fn clock(mut self, clock: C) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the delay provider.
    pub fn delay(mut self, delay: D) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Build the Controller.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration (pins included) is invalid or
    /// hardware, clock or delay are missing.
    pub fn build(self) -> Result<Controller<P, C, D, Configured>> {
        let mut config = self.config;
        if let Some(pins) = self.pins {
            let pins = pins?;
            config.driver.pins.clear();
            let _ = config.driver.pins.extend_from_slice(&pins);
        }
        validate_config(&config)?;
        let pins = validate_pins(&config.driver.pins)?;

        let hardware = self
            .hardware
            .ok_or(Error::Config(ConfigError::MissingField("hardware")))?;
        let clock = self
            .clock
            .ok_or(Error::Config(ConfigError::MissingField("clock")))?;
        let delay = self
            .delay
            .ok_or(Error::Config(ConfigError::MissingField("delay")))?;

        let pattern = registry::lookup(config.driver.resolution.as_str())?;
        let registers = self
            .registers
            .unwrap_or_else(|| Registers::from_config(&config));

        Ok(Controller::new(hardware, pins, clock, delay, registers, pattern))
    }
}

impl<P> MotorBuilder<P, MonotonicClock, StdDelay>
where
    P: PwmDriver,
{
    /// Use wall-clock time and thread sleeps.
    pub fn system_time(self) -> Self {
        self.clock(MonotonicClock::new()).delay(StdDelay)
    }
}

/// Build a motor from a configuration and run it on its own thread.
///
/// # Errors
///
/// Returns configuration errors, or `HardwareError::Unavailable` if the
/// hardware cannot be acquired. Nothing is driven in either case.
///
/// # Example
///
/// ```rust,ignore
/// use unipolar_stepper::{load_config, start_motor, Hardware};
///
/// let config = load_config("clock.toml")?;
/// let motor = start_motor(config, Hardware::Owned(pwm))?;
/// motor.handle().set_speed(1.0)?;
/// ```
pub fn start_motor<P>(config: MotorConfig, hardware: Hardware<P>) -> Result<RunningMotor<P>>
where
    P: PwmDriver + Send + 'static,
{
    let builder = MotorBuilder::<P, MonotonicClock, StdDelay>::new()
        .config(config)
        .system_time();
    let builder = match hardware {
        Hardware::Owned(driver) => builder.owned_hardware(driver),
        Hardware::Supplied(driver) => builder.supplied_hardware(driver),
    };
    builder.build()?.spawn()
}
