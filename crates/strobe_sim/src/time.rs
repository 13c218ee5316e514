//! Clock and time engine.
//!
//! [`ClockDomain`] advances simulated time in half-period ticks. Each tick
//! toggles the clock level and yields the [`Edge`] it produced; components
//! act on the edge kind they are sensitive to.

use serde::{Deserialize, Serialize};
use std::fmt;

use strobe_common::Frequency;

use crate::error::ConfigError;

/// Femtoseconds per picosecond.
pub const FS_PER_PS: u64 = 1_000;
/// Femtoseconds per nanosecond.
pub const FS_PER_NS: u64 = 1_000_000;
/// Femtoseconds per microsecond.
pub const FS_PER_US: u64 = 1_000_000_000;
/// Femtoseconds per millisecond.
pub const FS_PER_MS: u64 = 1_000_000_000_000;

/// A simulation time point with femtosecond resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTime {
    /// Simulated time in femtoseconds.
    pub fs: u64,
}

impl SimTime {
    /// Time zero.
    pub fn zero() -> Self {
        Self { fs: 0 }
    }

    /// Creates a time from a femtosecond value.
    pub fn from_fs(fs: u64) -> Self {
        Self { fs }
    }

    /// Creates a time from a nanosecond value.
    pub fn from_ns(ns: u64) -> Self {
        Self { fs: ns * FS_PER_NS }
    }

    /// Converts to nanoseconds (truncated).
    pub fn to_ns(&self) -> u64 {
        self.fs / FS_PER_NS
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fs = self.fs;
        if fs == 0 {
            write!(f, "0 fs")
        } else if fs >= FS_PER_MS && fs.is_multiple_of(FS_PER_MS) {
            write!(f, "{} ms", fs / FS_PER_MS)
        } else if fs >= FS_PER_US && fs.is_multiple_of(FS_PER_US) {
            write!(f, "{} us", fs / FS_PER_US)
        } else if fs >= FS_PER_NS && fs.is_multiple_of(FS_PER_NS) {
            write!(f, "{} ns", fs / FS_PER_NS)
        } else if fs >= FS_PER_PS && fs.is_multiple_of(FS_PER_PS) {
            write!(f, "{} ps", fs / FS_PER_PS)
        } else {
            write!(f, "{fs} fs")
        }
    }
}

/// A clock transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
}

impl Edge {
    /// Returns `true` for [`Edge::Rising`].
    pub fn is_rising(self) -> bool {
        self == Edge::Rising
    }
}

/// A single clock domain: tick counter, clock level, and frequency.
///
/// The clock starts low, so the first tick is a rising edge. Every full
/// period contains exactly one rising and one falling edge.
#[derive(Clone, Debug)]
pub struct ClockDomain {
    frequency: Frequency,
    half_period_fs: u64,
    tick: u64,
    level: bool,
}

impl ClockDomain {
    /// Creates a clock domain at tick zero with the clock low.
    pub fn new(frequency: Frequency) -> Result<Self, ConfigError> {
        if !frequency.is_valid_clock() {
            return Err(ConfigError::InvalidFrequency {
                hz: frequency.hz(),
            });
        }
        Ok(Self {
            frequency,
            half_period_fs: frequency.half_period_fs(),
            tick: 0,
            level: false,
        })
    }

    /// Advances one half period and returns the edge produced.
    pub fn advance(&mut self) -> Edge {
        self.tick += 1;
        self.level = !self.level;
        if self.level {
            Edge::Rising
        } else {
            Edge::Falling
        }
    }

    /// Number of half-period ticks elapsed.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of rising edges seen so far.
    pub fn cycle(&self) -> u64 {
        self.tick.div_ceil(2)
    }

    /// Current clock level.
    pub fn level(&self) -> bool {
        self.level
    }

    /// The clock frequency.
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Simulated time elapsed since tick zero.
    pub fn now(&self) -> SimTime {
        SimTime::from_fs(self.tick.saturating_mul(self.half_period_fs))
    }
}
