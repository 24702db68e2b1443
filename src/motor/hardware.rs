//! PWM hardware abstraction.
//!
//! The control loop drives the coils through [`PwmDriver`]. Hardware handed
//! over as [`Hardware::Owned`] is connected at start and released at
//! shutdown; [`Hardware::Supplied`] hardware belongs to the caller and is
//! only checked for a live connection.

use embedded_hal::pwm::SetDutyCycle;

use crate::error::{HardwareError, Result};

/// Duty cycle resolution of the coil outputs (0 = off, 255 = fully on).
pub const MAX_DUTY: u8 = 255;

/// Four-pin PWM output device.
pub trait PwmDriver {
    /// Open the connection to the device.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Unavailable` if there is no connection.
    fn connect(&mut self) -> Result<()>;

    /// True if the device is connected.
    fn is_connected(&self) -> bool;

    /// Close the connection.
    fn disconnect(&mut self);

    /// Request a PWM frequency for a pin; returns the frequency the
    /// device actually applies.
    fn set_frequency(&mut self, pin: u8, hz: u32) -> u32;

    /// Current PWM frequency of a pin.
    fn frequency(&self, pin: u8) -> u32;

    /// Set the duty cycle of a pin.
    fn set_duty_cycle(&mut self, pin: u8, duty: u8);
}

/// PWM hardware together with who is responsible for releasing it.
#[derive(Debug)]
pub enum Hardware<P> {
    /// Connected and released by the control loop.
    Owned(P),
    /// Connected and released by the caller.
    Supplied(P),
}

impl<P: PwmDriver> Hardware<P> {
    /// Connect owned hardware, or check that supplied hardware is connected.
    pub(crate) fn acquire(&mut self) -> Result<()> {
        match self {
            Hardware::Owned(p) => {
                p.connect()?;
                if !p.is_connected() {
                    return Err(HardwareError::Unavailable.into());
                }
                Ok(())
            }
            Hardware::Supplied(p) => {
                if p.is_connected() {
                    Ok(())
                } else {
                    Err(HardwareError::Unavailable.into())
                }
            }
        }
    }

    /// Disconnect if the loop owns the hardware.
    pub(crate) fn release(&mut self) {
        if let Hardware::Owned(p) = self {
            p.disconnect();
        }
    }

    /// The driver, regardless of ownership.
    #[inline]
    pub fn driver(&self) -> &P {
        match self {
            Hardware::Owned(p) | Hardware::Supplied(p) => p,
        }
    }

    #[inline]
    pub(crate) fn driver_mut(&mut self) -> &mut P {
        match self {
            Hardware::Owned(p) | Hardware::Supplied(p) => p,
        }
    }

    /// Give back the driver.
    pub fn into_inner(self) -> P {
        match self {
            Hardware::Owned(p) | Hardware::Supplied(p) => p,
        }
    }
}

/// [`PwmDriver`] over four embedded-hal PWM channels.
///
/// embedded-hal has no frequency control, so the bank reports the frequency
/// its channels were configured with and ignores frequency requests.
pub struct DutyCycleBank<CH: SetDutyCycle> {
    channels: [CH; 4],
    pins: [u8; 4],
    frequency_hz: u32,
    connected: bool,
}

impl<CH: SetDutyCycle> DutyCycleBank<CH> {
    /// Create a bank. `pins[i]` is the GPIO number driven by `channels[i]`.
    pub fn new(channels: [CH; 4], pins: [u8; 4], frequency_hz: u32) -> Self {
        Self {
            channels,
            pins,
            frequency_hz,
            connected: false,
        }
    }

    /// Give back the channels.
    pub fn release(self) -> [CH; 4] {
        self.channels
    }

    fn channel(&mut self, pin: u8) -> Option<&mut CH> {
        let index = self.pins.iter().position(|&p| p == pin)?;
        self.channels.get_mut(index)
    }
}

impl<CH: SetDutyCycle> PwmDriver for DutyCycleBank<CH> {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn set_frequency(&mut self, _pin: u8, _hz: u32) -> u32 {
        self.frequency_hz
    }

    fn frequency(&self, _pin: u8) -> u32 {
        self.frequency_hz
    }

    fn set_duty_cycle(&mut self, pin: u8, duty: u8) {
        if let Some(channel) = self.channel(pin) {
            // Channel errors do not reach the control loop.
            let _ = channel.set_duty_cycle_fraction(duty as u16, MAX_DUTY as u16);
        }
    }
}
