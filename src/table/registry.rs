//! Built-in step pattern catalogue.
//!
//! Each pattern is a cyclic sequence of four-channel duty vectors. Walking the
//! sequence once advances the rotor by four full steps, so a pattern with N
//! entries moves `16 / N` position units per entry (its step factor).

use crate::error::{PatternError, Result};

/// Duty values for the four coils, in drive order.
pub type DutyVector = [u8; 4];

/// Largest number of entries in any built-in pattern.
pub const MAX_TABLE_LEN: usize = 16;

/// Position units covered by one full pass over any pattern.
pub const UNITS_PER_CYCLE: i64 = 16;

/// A named microstepping pattern.
#[derive(Debug, PartialEq, Eq)]
pub struct StepPattern {
    /// Pattern identifier.
    pub name: &'static str,
    /// Position units moved per table entry.
    pub step_factor: u8,
    /// Cyclic duty sequence.
    pub table: &'static [DutyVector],
}

impl StepPattern {
    /// Number of entries in the cycle.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Patterns are never empty; provided for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// One coil energised at a time.
pub static SINGLE: StepPattern = StepPattern {
    name: "single",
    step_factor: 4,
    table: &[[255, 0, 0, 0], [0, 255, 0, 0], [0, 0, 255, 0], [0, 0, 0, 255]],
};

/// Two adjacent coils energised at a time (more torque).
pub static SINGLE_DOUBLE: StepPattern = StepPattern {
    name: "singled",
    step_factor: 4,
    table: &[
        [255, 255, 0, 0],
        [0, 255, 255, 0],
        [0, 0, 255, 255],
        [255, 0, 0, 255],
    ],
};

/// Half stepping.
pub static HALF: StepPattern = StepPattern {
    name: "two",
    step_factor: 2,
    table: &[
        [255, 0, 0, 0],
        [128, 128, 0, 0],
        [0, 255, 0, 0],
        [0, 128, 128, 0],
        [0, 0, 255, 0],
        [0, 0, 128, 128],
        [0, 0, 0, 255],
        [128, 0, 0, 128],
    ],
};

/// Quarter stepping.
pub static QUARTER: StepPattern = StepPattern {
    name: "four",
    step_factor: 1,
    table: &[
        [255, 0, 0, 0],
        [192, 64, 0, 0],
        [128, 128, 0, 0],
        [64, 192, 0, 0],
        [0, 255, 0, 0],
        [0, 192, 64, 0],
        [0, 128, 128, 0],
        [0, 64, 192, 0],
        [0, 0, 255, 0],
        [0, 0, 192, 64],
        [0, 0, 128, 128],
        [0, 0, 64, 192],
        [0, 0, 0, 255],
        [64, 0, 0, 192],
        [128, 0, 0, 128],
        [192, 0, 0, 64],
    ],
};

static PATTERNS: [&StepPattern; 4] = [&SINGLE, &SINGLE_DOUBLE, &HALF, &QUARTER];

/// Pattern used when none is configured.
pub const DEFAULT_PATTERN: &str = "two";

/// Look up a pattern by name.
///
/// # Errors
///
/// Returns `PatternError::UnknownPattern` if no pattern has this name.
pub fn lookup(name: &str) -> Result<&'static StepPattern> {
    find(name).ok_or_else(|| {
        let mut msg: heapless::String<32> = heapless::String::new();
        for c in name.chars() {
            if msg.push(c).is_err() {
                break;
            }
        }
        PatternError::UnknownPattern(msg).into()
    })
}

/// Look up a pattern by name, returning `None` if absent.
pub fn find(name: &str) -> Option<&'static StepPattern> {
    PATTERNS.iter().copied().find(|p| p.name == name)
}

/// Iterate over all built-in patterns.
pub fn patterns() -> impl Iterator<Item = &'static StepPattern> {
    PATTERNS.iter().copied()
}
