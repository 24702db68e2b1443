//! Working table generation.
//!
//! A working table is a step pattern scaled by the power factor of the current
//! speed regime and optionally reversed.

use heapless::Vec;

use super::registry::{DutyVector, StepPattern, MAX_TABLE_LEN};

/// Speed below which a requested speed counts as a stop request (rpm).
pub const STOP_EPSILON_RPM: f64 = 1e-5;

/// Discrete power regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerRegime {
    /// Motor is stationary.
    Hold,
    /// Motor turns below the slow speed threshold.
    Slow,
    /// Motor turns at or above the slow speed threshold.
    Fast,
}

impl PowerRegime {
    /// Select the regime for a motor.
    ///
    /// `stepping` is false when the motor has no step interval.
    pub fn select(stepping: bool, speed_rpm: f64, slow_limit_rpm: f64) -> Self {
        if !stepping {
            PowerRegime::Hold
        } else if libm::fabs(speed_rpm) < slow_limit_rpm {
            PowerRegime::Slow
        } else {
            PowerRegime::Fast
        }
    }
}

/// Power reduction factors for each regime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerFactors {
    /// Factor while stationary.
    pub hold: f32,
    /// Factor below the slow speed threshold.
    pub slow: f32,
    /// Factor at or above the slow speed threshold.
    pub fast: f32,
    /// Slow speed threshold in rpm.
    pub slow_limit_rpm: f64,
}

impl Default for PowerFactors {
    fn default() -> Self {
        Self {
            hold: 0.1,
            slow: 0.6,
            fast: 1.0,
            slow_limit_rpm: 20.0,
        }
    }
}

impl PowerFactors {
    /// Factor for a regime.
    #[inline]
    pub fn factor(&self, regime: PowerRegime) -> f32 {
        match regime {
            PowerRegime::Hold => self.hold,
            PowerRegime::Slow => self.slow,
            PowerRegime::Fast => self.fast,
        }
    }

    /// Factor for a motor state.
    #[inline]
    pub fn factor_for(&self, stepping: bool, speed_rpm: f64) -> f32 {
        self.factor(PowerRegime::select(stepping, speed_rpm, self.slow_limit_rpm))
    }
}

/// Scaled, optionally reversed copy of a step pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingTable {
    entries: Vec<DutyVector, MAX_TABLE_LEN>,
}

impl WorkingTable {
    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, if in range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&DutyVector> {
        self.entries.get(index)
    }

    /// All entries in traversal order.
    #[inline]
    pub fn entries(&self) -> &[DutyVector] {
        &self.entries
    }

    /// Advance `index` by `delta` with wraparound over the table.
    #[inline]
    pub fn wrap_index(&self, index: usize, delta: i64) -> usize {
        wrap_index(index, delta, self.len())
    }
}

/// Advance `index` by `delta` with wraparound over `[0, len)`.
///
/// `len` must be at least 1.
#[inline]
pub fn wrap_index(index: usize, delta: i64, len: usize) -> usize {
    (index as i64 + delta).rem_euclid(len as i64) as usize
}

/// Scale a single duty value by a power factor, truncating toward zero.
#[inline]
pub fn scale_duty(duty: u8, power_factor: f32) -> u8 {
    let factor = power_factor.clamp(0.0, 1.0);
    libm::floorf(duty as f32 * factor) as u8
}

/// Build the working table for a pattern.
///
/// Every channel is scaled by `power_factor` (clamped to [0, 1]) and the
/// entry order is reversed when `reverse` is set.
pub fn build_working_table(pattern: &StepPattern, power_factor: f32, reverse: bool) -> WorkingTable {
    let mut entries: Vec<DutyVector, MAX_TABLE_LEN> = Vec::new();
    for vector in pattern.table.iter().take(MAX_TABLE_LEN) {
        let scaled = vector.map(|duty| scale_duty(duty, power_factor));
        // Capacity is MAX_TABLE_LEN and the iterator is bounded by it.
        let _ = entries.push(scaled);
    }
    if reverse {
        entries.reverse();
    }
    WorkingTable { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::registry::{HALF, QUARTER, SINGLE};

    #[test]
    fn test_regime_selection() {
        assert_eq!(PowerRegime::select(false, 50.0, 20.0), PowerRegime::Hold);
        assert_eq!(PowerRegime::select(true, 10.0, 20.0), PowerRegime::Slow);
        assert_eq!(PowerRegime::select(true, -10.0, 20.0), PowerRegime::Slow);
        assert_eq!(PowerRegime::select(true, 20.0, 20.0), PowerRegime::Fast);
        assert_eq!(PowerRegime::select(true, -60.0, 20.0), PowerRegime::Fast);
    }

    #[test]
    fn test_scaling_truncates() {
        let table = build_working_table(&HALF, 0.6, false);
        // 255 * 0.6 = 153.0, 128 * 0.6 = 76.8
        assert_eq!(table.get(0), Some(&[153, 0, 0, 0]));
        assert_eq!(table.get(1), Some(&[76, 76, 0, 0]));
    }

    #[test]
    fn test_hold_power() {
        let table = build_working_table(&SINGLE, 0.1, false);
        assert_eq!(table.entries(), &[[25, 0, 0, 0], [0, 25, 0, 0], [0, 0, 25, 0], [0, 0, 0, 25]]);
    }

    #[test]
    fn test_reverse_order() {
        let forward = build_working_table(&QUARTER, 1.0, false);
        let reversed = build_working_table(&QUARTER, 1.0, true);
        assert_eq!(forward.len(), reversed.len());
        for i in 0..forward.len() {
            assert_eq!(forward.get(i), reversed.get(forward.len() - 1 - i));
        }
    }

    #[test]
    fn test_factor_clamped() {
        let table = build_working_table(&SINGLE, 1.5, false);
        assert_eq!(table.get(0), Some(&[255, 0, 0, 0]));
        let table = build_working_table(&SINGLE, -0.5, false);
        assert_eq!(table.get(0), Some(&[0, 0, 0, 0]));
    }

    #[test]
    fn test_wrap_index() {
        assert_eq!(wrap_index(7, 1, 8), 0);
        assert_eq!(wrap_index(0, -1, 8), 7);
        assert_eq!(wrap_index(0, -1, 1), 0);
        assert_eq!(wrap_index(3, 1, 8), 4);
    }
}
