//! Configuration types deserialized from `strobe.toml`.

use serde::{Deserialize, Serialize};

/// The top-level configuration parsed from `strobe.toml`.
///
/// Only `[clock]` is required; every other section falls back to the board
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StrobeConfig {
    /// System clock settings.
    #[serde(default)]
    pub clock: Option<ClockConfig>,
    /// Reset synchronizer settings.
    #[serde(default)]
    pub reset: ResetConfig,
    /// Button debounce settings.
    #[serde(default)]
    pub debounce: DebounceConfig,
    /// Serial port settings.
    #[serde(default)]
    pub uart: UartConfig,
    /// LED counter settings.
    #[serde(default)]
    pub counter: CounterConfig,
    /// Harness settings.
    #[serde(default)]
    pub harness: HarnessConfig,
}

/// The system clock.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ClockConfig {
    /// Clock frequency as a string (e.g., "50MHz"), parsed to [`Frequency`](strobe_common::Frequency).
    #[serde(default)]
    pub frequency: String,
}

/// Reset synchronizer shape, shared by every reset domain.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResetConfig {
    /// Polarity token, `active_low` or `active_high`.
    #[serde(default = "default_polarity")]
    pub polarity: String,
    /// Flip-flop stages; at least 2.
    #[serde(default = "default_stages")]
    pub stages: usize,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            polarity: default_polarity(),
            stages: default_stages(),
        }
    }
}

fn default_polarity() -> String {
    "active_low".to_string()
}

fn default_stages() -> usize {
    2
}

/// Push-button debounce window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DebounceConfig {
    /// Stable time in milliseconds before a level change is accepted.
    #[serde(default = "default_debounce_ms")]
    pub time_ms: u64,
    /// Output level while in reset.
    #[serde(default)]
    pub idle_level: bool,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            time_ms: default_debounce_ms(),
            idle_level: false,
        }
    }
}

fn default_debounce_ms() -> u64 {
    10
}

/// 8-N-1 serial port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UartConfig {
    /// Baud rate.
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// Data bits per frame (1 to 8).
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    /// Route the transmit line back into the receiver.
    #[serde(default = "default_loopback")]
    pub loopback: bool,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud: default_baud(),
            data_bits: default_data_bits(),
            loopback: default_loopback(),
        }
    }
}

fn default_baud() -> u32 {
    115_200
}

fn default_data_bits() -> u8 {
    8
}

fn default_loopback() -> bool {
    true
}

/// LED counter shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CounterConfig {
    /// Number of LEDs.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Clock divider as a power of two.
    #[serde(default = "default_prescale_bits")]
    pub prescale_bits: u32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            prescale_bits: default_prescale_bits(),
        }
    }
}

fn default_width() -> u32 {
    8
}

fn default_prescale_bits() -> u32 {
    22
}

/// Simulation harness settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HarnessConfig {
    /// Cycle budget before a scenario is abandoned.
    #[serde(default = "default_watchdog_cycles")]
    pub watchdog_cycles: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            watchdog_cycles: default_watchdog_cycles(),
        }
    }
}

fn default_watchdog_cycles() -> u64 {
    5_000_000
}
