//! Named register store.
//!
//! A flat map from the fixed set of motor register paths to scalar values.
//! Derived registers are recomputed whenever one of their inputs is set.
//! The microstep position is not stored here; it is read through from the
//! [`PositionRegister`] the control loop owns.

use core::fmt;
use core::str::FromStr;
use std::sync::{Arc, RwLock};

use heapless::FnvIndexMap;

use crate::config::MotorConfig;
use crate::error::{ConfigError, Result};
use crate::motor::PositionRegister;
use crate::table::PowerFactors;

/// Position units per full motor step (one unit per quarter step).
pub const UNITS_PER_FULL_STEP: f64 = 4.0;

/// Register paths known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterPath {
    /// Full steps per output revolution.
    StepsPerRev,
    /// Speed limit offered to producers (rpm).
    MaxRpm,
    /// Microsteps per full step used for speed conversion.
    MicroSteps,
    /// Derived: `StepsPerRev * MicroSteps`.
    MicroStepsPerRev,
    /// Position counter in quarter-step units (read-only).
    MicroStepPosition,
    /// Derived: position in output revolutions (read-only).
    Position,
    /// Invert the traversal direction of the step tables.
    Reverse,
    /// Requested PWM frequency (Hz).
    PwmFrequency,
    /// PWM frequency reported by the hardware at startup (Hz).
    ActualFrequency,
    /// Power factor while stationary.
    HoldPower,
    /// Power factor below the slow limit.
    SlowPower,
    /// Speed below which the slow power factor applies (rpm).
    SlowLimit,
    /// Power factor at or above the slow limit.
    FastPower,
}

impl RegisterPath {
    /// Every register path, in display order.
    pub const ALL: [RegisterPath; 13] = [
        RegisterPath::StepsPerRev,
        RegisterPath::MaxRpm,
        RegisterPath::MicroSteps,
        RegisterPath::MicroStepsPerRev,
        RegisterPath::MicroStepPosition,
        RegisterPath::Position,
        RegisterPath::Reverse,
        RegisterPath::PwmFrequency,
        RegisterPath::ActualFrequency,
        RegisterPath::HoldPower,
        RegisterPath::SlowPower,
        RegisterPath::SlowLimit,
        RegisterPath::FastPower,
    ];

    /// Slash separated path of the register.
    pub fn as_str(self) -> &'static str {
        match self {
            RegisterPath::StepsPerRev => "settings/stepsPerRev",
            RegisterPath::MaxRpm => "settings/maxrpm",
            RegisterPath::MicroSteps => "settings/uSteps",
            RegisterPath::MicroStepsPerRev => "settings/uStepsPerRev",
            RegisterPath::Position => "settings/posn",
            RegisterPath::MicroStepPosition => "driveregs/uStepPos",
            RegisterPath::Reverse => "driveregs/reverse",
            RegisterPath::PwmFrequency => "driveregs/PWM frequency",
            RegisterPath::ActualFrequency => "driveregs/actual frequency",
            RegisterPath::HoldPower => "driveregs/hold power",
            RegisterPath::SlowPower => "driveregs/slow power",
            RegisterPath::SlowLimit => "driveregs/slow limit",
            RegisterPath::FastPower => "driveregs/fast power",
        }
    }

    /// True if the register cannot be set from outside the store.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            RegisterPath::MicroStepsPerRev | RegisterPath::MicroStepPosition | RegisterPath::Position
        )
    }
}

impl fmt::Display for RegisterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegisterPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        RegisterPath::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                let mut name: heapless::String<32> = heapless::String::new();
                for c in s.chars() {
                    if name.push(c).is_err() {
                        break;
                    }
                }
                ConfigError::UnknownRegister(name)
            })
    }
}

/// A register value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Scalar {
    /// Numeric value.
    Float(f64),
    /// Flag value.
    Bool(bool),
    /// No value recorded yet.
    #[default]
    Unset,
}

impl Scalar {
    /// Numeric value, if any.
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Scalar::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Flag value, if any.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Scalar::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

type Values = FnvIndexMap<RegisterPath, Scalar, 16>;

/// Derived register: target, inputs, and recompute function.
struct Derivation {
    target: RegisterPath,
    inputs: &'static [RegisterPath],
    compute: fn(&Values) -> Scalar,
}

static DERIVATIONS: [Derivation; 1] = [Derivation {
    target: RegisterPath::MicroStepsPerRev,
    inputs: &[RegisterPath::StepsPerRev, RegisterPath::MicroSteps],
    compute: micro_steps_per_rev,
}];

fn float(values: &Values, path: RegisterPath) -> Option<f64> {
    values.get(&path).and_then(|v| v.as_f64())
}

fn micro_steps_per_rev(values: &Values) -> Scalar {
    match (
        float(values, RegisterPath::StepsPerRev),
        float(values, RegisterPath::MicroSteps),
    ) {
        (Some(steps), Some(micro)) => Scalar::Float(steps * micro),
        _ => Scalar::Unset,
    }
}

/// Shared register store.
///
/// Cloning is cheap and every clone sees the same values.
#[derive(Clone)]
pub struct Registers {
    values: Arc<RwLock<Values>>,
    position: Arc<PositionRegister>,
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for path in RegisterPath::ALL {
            map.entry(&path.as_str(), &self.get(path));
        }
        map.finish()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::from_config(&MotorConfig::default())
    }
}

impl Registers {
    /// Build a store populated from a motor configuration.
    pub fn from_config(config: &MotorConfig) -> Self {
        let power = config.power_factors();
        let mut values = Values::new();
        let initial = [
            (RegisterPath::StepsPerRev, Scalar::Float(config.motor.steps_per_revolution)),
            (RegisterPath::MaxRpm, Scalar::Float(config.motor.max_rpm)),
            (RegisterPath::MicroSteps, Scalar::Float(config.motor.microsteps)),
            (RegisterPath::Reverse, Scalar::Bool(config.driver.reverse)),
            (RegisterPath::PwmFrequency, Scalar::Float(config.driver.pwm_frequency_hz as f64)),
            (RegisterPath::ActualFrequency, Scalar::Unset),
            (RegisterPath::HoldPower, Scalar::Float(power.hold as f64)),
            (RegisterPath::SlowPower, Scalar::Float(power.slow as f64)),
            (RegisterPath::SlowLimit, Scalar::Float(power.slow_limit_rpm)),
            (RegisterPath::FastPower, Scalar::Float(power.fast as f64)),
        ];
        for (path, value) in initial {
            // Capacity exceeds the number of paths.
            let _ = values.insert(path, value);
        }
        for derivation in DERIVATIONS.iter() {
            let _ = values.insert(derivation.target, (derivation.compute)(&values));
        }
        Self {
            values: Arc::new(RwLock::new(values)),
            position: Arc::new(PositionRegister::at(config.motor.initial_position)),
        }
    }

    /// Read a register.
    pub fn get(&self, path: RegisterPath) -> Scalar {
        match path {
            RegisterPath::MicroStepPosition => Scalar::Float(self.position.read() as f64),
            RegisterPath::Position => match self.get(RegisterPath::StepsPerRev).as_f64() {
                Some(steps) => {
                    Scalar::Float(self.position.revolutions(steps * UNITS_PER_FULL_STEP))
                }
                None => Scalar::Unset,
            },
            _ => self
                .read_values()
                .get(&path)
                .copied()
                .unwrap_or_default(),
        }
    }

    /// Read a register by its path string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownRegister` for unknown paths.
    pub fn get_path(&self, path: &str) -> Result<Scalar> {
        Ok(self.get(path.parse()?))
    }

    /// Write a register and recompute derived registers that depend on it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadOnlyRegister` for derived or position
    /// registers, and `ConfigError::TypeMismatch` when a flag register gets a
    /// number or the other way round.
    pub fn set(&self, path: RegisterPath, value: impl Into<Scalar>) -> Result<()> {
        if path.is_read_only() {
            return Err(ConfigError::ReadOnlyRegister(path.as_str()).into());
        }
        self.store(path, value.into())
    }

    /// Write a register by its path string.
    ///
    /// # Errors
    ///
    /// As [`Registers::set`], plus `ConfigError::UnknownRegister`.
    pub fn set_path(&self, path: &str, value: impl Into<Scalar>) -> Result<()> {
        self.set(path.parse()?, value)
    }

    pub(crate) fn store(&self, path: RegisterPath, value: Scalar) -> Result<()> {
        let type_ok = match path {
            RegisterPath::Reverse => !matches!(value, Scalar::Float(_)),
            _ => !matches!(value, Scalar::Bool(_)),
        };
        if !type_ok {
            return Err(ConfigError::TypeMismatch(path.as_str()).into());
        }

        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        let _ = values.insert(path, value);
        for derivation in DERIVATIONS.iter().filter(|d| d.inputs.contains(&path)) {
            let derived = (derivation.compute)(&values);
            let _ = values.insert(derivation.target, derived);
        }
        Ok(())
    }

    fn read_values(&self) -> std::sync::RwLockReadGuard<'_, Values> {
        self.values.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Numeric register or `default` if unset.
    pub fn float_or(&self, path: RegisterPath, default: f64) -> f64 {
        self.get(path).as_f64().unwrap_or(default)
    }

    /// Flag register or `false` if unset.
    pub fn flag(&self, path: RegisterPath) -> bool {
        self.get(path).as_bool().unwrap_or(false)
    }

    /// Microsteps per output revolution.
    pub fn micro_steps_per_rev(&self) -> f64 {
        self.float_or(RegisterPath::MicroStepsPerRev, 0.0)
    }

    /// Current power factors and slow speed threshold.
    pub fn power_factors(&self) -> PowerFactors {
        let defaults = PowerFactors::default();
        PowerFactors {
            hold: self.float_or(RegisterPath::HoldPower, defaults.hold as f64) as f32,
            slow: self.float_or(RegisterPath::SlowPower, defaults.slow as f64) as f32,
            fast: self.float_or(RegisterPath::FastPower, defaults.fast as f64) as f32,
            slow_limit_rpm: self.float_or(RegisterPath::SlowLimit, defaults.slow_limit_rpm),
        }
    }

    /// The position counter behind `driveregs/uStepPos`.
    pub fn position(&self) -> &Arc<PositionRegister> {
        &self.position
    }
}
