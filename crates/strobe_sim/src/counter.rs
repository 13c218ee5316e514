//! Free-running LED counter.
//!
//! A binary counter whose top `width` bits drive the LEDs. The low
//! `prescale_bits` bits divide the clock so the LEDs change at a visible rate.

use log::trace;

use crate::error::ConfigError;
use crate::time::Edge;

/// Parameters of a [`LedCounter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterParams {
    /// Number of LEDs.
    pub width: u32,
    /// Clock divider, as a power of two.
    pub prescale_bits: u32,
}

impl CounterParams {
    /// Checks that the whole register fits in 64 bits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fits = self
            .width
            .checked_add(self.prescale_bits)
            .is_some_and(|total| total <= 64);
        if self.width == 0 || !fits {
            return Err(ConfigError::InvalidCounterWidth {
                width: self.width,
                prescale_bits: self.prescale_bits,
            });
        }
        Ok(())
    }

    /// Cycles between two LED value changes.
    pub fn cycles_per_increment(&self) -> u64 {
        1u64 << self.prescale_bits
    }
}

impl Default for CounterParams {
    fn default() -> Self {
        Self {
            width: 8,
            prescale_bits: 22,
        }
    }
}

/// A wrapping counter cleared by reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedCounter {
    params: CounterParams,
    count: u64,
}

impl LedCounter {
    /// Creates a counter at zero.
    pub fn new(params: CounterParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params, count: 0 })
    }

    /// Clears the counter.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Evaluates one tick and returns the LED value.
    pub fn step(&mut self, edge: Edge) -> u64 {
        if edge.is_rising() {
            let total_bits = self.params.width + self.params.prescale_bits;
            let mask = if total_bits == 64 {
                u64::MAX
            } else {
                (1u64 << total_bits) - 1
            };
            let before = self.leds();
            self.count = self.count.wrapping_add(1) & mask;
            if self.leds() != before {
                trace!("leds {:0width$b}", self.leds(), width = self.params.width as usize);
            }
        }
        self.leds()
    }

    /// Current LED value.
    pub fn leds(&self) -> u64 {
        self.count >> self.params.prescale_bits
    }
}
