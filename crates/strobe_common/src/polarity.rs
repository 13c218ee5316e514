//! Active-level polarity of reset and enable signals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which logic level means "asserted" for a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// A high level (`true`) asserts the signal.
    ActiveHigh,
    /// A low level (`false`) asserts the signal.
    ActiveLow,
}

impl Polarity {
    /// The level that asserts the signal.
    pub fn asserted(self) -> bool {
        matches!(self, Polarity::ActiveHigh)
    }

    /// The level that deasserts the signal.
    pub fn deasserted(self) -> bool {
        !self.asserted()
    }

    /// Returns `true` if `level` asserts the signal under this polarity.
    pub fn is_asserted(self, level: bool) -> bool {
        level == self.asserted()
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::ActiveHigh => write!(f, "ACTIVE_HIGH"),
            Polarity::ActiveLow => write!(f, "ACTIVE_LOW"),
        }
    }
}

/// Error type for parsing polarity tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized polarity '{input}' (expected ACTIVE_HIGH or ACTIVE_LOW)")]
pub struct ParsePolarityError {
    /// The token that failed to parse.
    pub input: String,
}

impl FromStr for Polarity {
    type Err = ParsePolarityError;

    /// Accepts `ACTIVE_HIGH`/`ACTIVE_LOW` in any case, with `-` in place of
    /// `_`, and the short forms `high`/`low`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase().replace('-', "_");
        match token.as_str() {
            "active_high" | "high" => Ok(Polarity::ActiveHigh),
            "active_low" | "low" => Ok(Polarity::ActiveLow),
            _ => Err(ParsePolarityError {
                input: s.to_string(),
            }),
        }
    }
}
