//! Clock frequency values with unit parsing, display, and cycle arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Femtoseconds in one second.
const FS_PER_SECOND: f64 = 1e15;

/// A frequency value stored in Hertz.
///
/// Supports parsing from strings like "50MHz", "100KHz", "1GHz", "48000Hz",
/// and bare numeric values (interpreted as Hz). Displays using the most
/// appropriate unit for readability.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frequency(f64);

impl Frequency {
    /// Creates a new frequency from a value in Hertz.
    pub fn new(hz: f64) -> Self {
        Self(hz)
    }

    /// Returns the frequency in Hertz.
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Returns `true` if the value can drive a clock (finite and above zero).
    pub fn is_valid_clock(&self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }

    /// Number of clock cycles in one period of `rate` (e.g. a baud rate),
    /// rounded to the nearest whole cycle.
    pub fn cycles_per(&self, rate: f64) -> u64 {
        (self.0 / rate).round() as u64
    }

    /// Number of clock cycles in `ms` milliseconds, or `None` if the count
    /// does not fit in a `u64`.
    ///
    /// Computed as whole cycles per millisecond times `ms`, the way a
    /// synthesized counter constant is derived.
    pub fn cycles_in_ms(&self, ms: u64) -> Option<u64> {
        (self.0 as u64 / 1_000).checked_mul(ms)
    }

    /// Half of one clock period in femtoseconds.
    pub fn half_period_fs(&self) -> u64 {
        (FS_PER_SECOND / self.0 / 2.0).round() as u64
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({self})")
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.0;
        if hz >= 1_000_000_000.0 {
            write!(f, "{}GHz", hz / 1_000_000_000.0)
        } else if hz >= 1_000_000.0 {
            write!(f, "{}MHz", hz / 1_000_000.0)
        } else if hz >= 1_000.0 {
            write!(f, "{}KHz", hz / 1_000.0)
        } else {
            write!(f, "{hz}Hz")
        }
    }
}

/// Error type for parsing frequency strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid frequency: '{input}'")]
pub struct ParseFrequencyError {
    /// The input string that failed to parse.
    pub input: String,
}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseFrequencyError {
            input: s.to_string(),
        };

        let lower = s.to_ascii_lowercase();
        let (num, scale) = if let Some(num) = lower.strip_suffix("ghz") {
            (num, 1_000_000_000.0)
        } else if let Some(num) = lower.strip_suffix("mhz") {
            (num, 1_000_000.0)
        } else if let Some(num) = lower.strip_suffix("khz") {
            (num, 1_000.0)
        } else if let Some(num) = lower.strip_suffix("hz") {
            (num, 1.0)
        } else {
            (lower.as_str(), 1.0)
        };

        let val: f64 = num.trim().replace('_', "").parse().map_err(|_| err())?;
        Ok(Frequency(val * scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mhz() {
        let f: Frequency = "50MHz".parse().unwrap();
        assert_eq!(f.hz(), 50_000_000.0);
    }

    #[test]
    fn parse_khz() {
        let f: Frequency = "100KHz".parse().unwrap();
        assert_eq!(f.hz(), 100_000.0);
    }

    #[test]
    fn parse_bare_number_with_separators() {
        let f: Frequency = "50_000_000".parse().unwrap();
        assert_eq!(f.hz(), 50_000_000.0);
    }

    #[test]
    fn parse_case_insensitive() {
        let f: Frequency = "12mhz".parse().unwrap();
        assert_eq!(f.hz(), 12_000_000.0);
    }

    #[test]
    fn parse_invalid() {
        let err = "fast".parse::<Frequency>().unwrap_err();
        assert_eq!(err.to_string(), "invalid frequency: 'fast'");
    }

    #[test]
    fn cycles_per_baud_rounds() {
        let f = Frequency::new(50_000_000.0);
        assert_eq!(f.cycles_per(115_200.0), 434);
        assert_eq!(f.cycles_per(9_600.0), 5208);
    }

    #[test]
    fn cycles_in_ms() {
        let f = Frequency::new(50_000_000.0);
        assert_eq!(f.cycles_in_ms(10), Some(500_000));
        assert_eq!(Frequency::new(10_000.0).cycles_in_ms(1), Some(10));
        assert_eq!(f.cycles_in_ms(1_000_000_000_000_000), None);
    }

    #[test]
    fn half_period() {
        assert_eq!(Frequency::new(50_000_000.0).half_period_fs(), 10_000_000);
        assert_eq!(Frequency::new(1_000_000.0).half_period_fs(), 500_000_000);
    }

    #[test]
    fn valid_clock() {
        assert!(Frequency::new(1.0).is_valid_clock());
        assert!(!Frequency::new(0.0).is_valid_clock());
        assert!(!Frequency::new(f64::NAN).is_valid_clock());
    }

    #[test]
    fn display_selects_best_unit() {
        assert_eq!(format!("{}", Frequency::new(50_000_000.0)), "50MHz");
        assert_eq!(format!("{}", Frequency::new(44_100.0)), "44.1KHz");
        assert_eq!(format!("{}", Frequency::new(500.0)), "500Hz");
        assert_eq!(
            format!("{:?}", Frequency::new(2_000_000_000.0)),
            "Frequency(2GHz)"
        );
    }
}
