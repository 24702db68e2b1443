//! Position tracking for the control loop.
//!
//! The control loop is the only writer. Any thread may read; the count is a
//! single atomic word so readers never see a torn value. Targets without
//! 64-bit atomics (thumbv6m, thumbv7m) keep a 32-bit count.

use core::sync::atomic::Ordering;

#[cfg(target_has_atomic = "64")]
use core::sync::atomic::AtomicI64 as AtomicCount;
#[cfg(target_has_atomic = "64")]
type Count = i64;

#[cfg(not(target_has_atomic = "64"))]
use core::sync::atomic::AtomicI32 as AtomicCount;
#[cfg(not(target_has_atomic = "64"))]
type Count = i32;

/// Direction of motor rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Positive speed, table index increases.
    Forward,
    /// Negative speed, table index decreases.
    Backward,
}

impl Direction {
    /// Get direction from a signed speed.
    ///
    /// Zero counts as backward, matching the stepping rule `speed > 0`.
    #[inline]
    pub fn from_speed(speed_rpm: f64) -> Self {
        if speed_rpm > 0.0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Microstep position counter.
///
/// One unit is the smallest step of the finest pattern; a table entry moves
/// the count by the active pattern's step factor.
#[derive(Debug, Default)]
pub struct PositionRegister {
    microsteps: AtomicCount,
}

impl PositionRegister {
    /// Create a register at zero.
    #[inline]
    pub const fn new() -> Self {
        Self::at(0)
    }

    /// Create a register at a specific position.
    ///
    /// With a 32-bit count the value is truncated to the low 32 bits.
    #[inline]
    pub const fn at(microsteps: i64) -> Self {
        Self {
            microsteps: AtomicCount::new(microsteps as Count),
        }
    }

    /// Current position in microsteps.
    #[inline]
    pub fn read(&self) -> i64 {
        self.microsteps.load(Ordering::Acquire) as i64
    }

    /// Record one step transition.
    ///
    /// Only the control loop calls this, once per transition.
    #[inline]
    pub(crate) fn apply_delta(&self, direction: Direction, step_factor: u8) {
        let delta = direction.sign() as Count * step_factor as Count;
        // Single writer: a load/store pair cannot lose updates.
        let current = self.microsteps.load(Ordering::Relaxed);
        self.microsteps
            .store(current.wrapping_add(delta), Ordering::Release);
    }

    /// Position in revolutions for a given microsteps-per-revolution ratio.
    #[inline]
    pub fn revolutions(&self, microsteps_per_rev: f64) -> f64 {
        self.read() as f64 / microsteps_per_rev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_speed() {
        assert_eq!(Direction::from_speed(60.0), Direction::Forward);
        assert_eq!(Direction::from_speed(-0.5), Direction::Backward);
        assert_eq!(Direction::Forward.sign(), 1);
        assert_eq!(Direction::Backward.sign(), -1);
    }

    #[test]
    fn test_position_tracking() {
        let pos = PositionRegister::new();
        assert_eq!(pos.read(), 0);

        pos.apply_delta(Direction::Forward, 2);
        pos.apply_delta(Direction::Forward, 2);
        assert_eq!(pos.read(), 4);

        pos.apply_delta(Direction::Backward, 4);
        pos.apply_delta(Direction::Backward, 1);
        assert_eq!(pos.read(), -1);
    }

    #[test]
    fn test_count_width_matches_target() {
        let pos = PositionRegister::at(-3);
        pos.apply_delta(Direction::Backward, 4);
        assert_eq!(pos.read(), -7);

        let near_max = Count::MAX as i64 - 1;
        let pos = PositionRegister::at(near_max);
        assert_eq!(pos.read(), near_max);
        pos.apply_delta(Direction::Forward, 4);
        // Overflow wraps instead of panicking the control loop.
        assert_eq!(pos.read(), Count::MIN as i64 + 2);
    }

    #[test]
    fn test_revolutions() {
        let pos = PositionRegister::at(683);
        // 2048 / 12 * 2 = 341.33 microsteps per revolution
        assert!((pos.revolutions(2048.0 / 12.0 * 2.0) - 2.001).abs() < 0.001);
    }
}
