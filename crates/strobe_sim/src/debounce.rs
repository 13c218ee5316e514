//! Push-button debounce filter.
//!
//! The raw input passes through a two-flop synchronizer, then a counter
//! measures how long the synchronized value has been stable. The output
//! follows only once the value has held for the full debounce window.

use log::{debug, trace};
use strobe_common::Frequency;

use crate::error::ConfigError;
use crate::time::Edge;

/// Cycles already spent in the two synchronizer flops.
const SYNC_LATENCY: u64 = 2;

/// Parameters of a [`DebounceFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceParams {
    /// Stable-time window in clock cycles.
    pub threshold: u64,
    /// Output level forced by reset.
    pub idle_level: bool,
}

impl DebounceParams {
    /// Derives the cycle threshold from a clock and a window in milliseconds.
    pub fn from_time(
        clock: Frequency,
        debounce_ms: u64,
        idle_level: bool,
    ) -> Result<Self, ConfigError> {
        let threshold = clock
            .cycles_in_ms(debounce_ms)
            .ok_or(ConfigError::DebounceWindowTooLong { debounce_ms })?;
        Self::from_cycles(threshold, idle_level)
    }

    /// Uses an explicit threshold in cycles.
    pub fn from_cycles(threshold: u64, idle_level: bool) -> Result<Self, ConfigError> {
        let params = Self {
            threshold,
            idle_level,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks that the window covers the synchronizer latency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold < SYNC_LATENCY {
            return Err(ConfigError::ThresholdTooSmall {
                threshold: self.threshold,
            });
        }
        Ok(())
    }
}

/// A two-stage-synchronized, counter-based debounce filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebounceFilter {
    params: DebounceParams,
    stage0: bool,
    stage1: bool,
    counter: u64,
    output: bool,
}

impl DebounceFilter {
    /// Creates a filter in its reset state.
    pub fn new(params: DebounceParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            stage0: false,
            stage1: false,
            counter: 0,
            output: params.idle_level,
        })
    }

    /// Forces the reset state: synchronizer and counter cleared, output at
    /// the idle level whatever the raw input is doing.
    pub fn reset(&mut self) {
        self.stage0 = false;
        self.stage1 = false;
        self.counter = 0;
        self.output = self.params.idle_level;
    }

    /// Evaluates one tick and returns the debounced level.
    pub fn step(&mut self, raw_input: bool, edge: Edge) -> bool {
        if !edge.is_rising() {
            return self.output;
        }

        // Register semantics: decisions use the stage values from before this edge.
        let (s0, s1) = (self.stage0, self.stage1);
        self.stage0 = raw_input;
        self.stage1 = s0;

        if s1 != s0 {
            if self.counter != 0 {
                trace!("debounce: input moving, counter cleared at {}", self.counter);
            }
            self.counter = 0;
        } else if self.counter >= self.target() {
            if self.output != s1 {
                debug!("debounce: output settled at {s1}");
            }
            self.output = s1;
        } else {
            self.counter += 1;
        }
        self.output
    }

    /// The debounced level.
    pub fn output(&self) -> bool {
        self.output
    }

    /// Current stability counter.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// The configured window in cycles.
    pub fn threshold(&self) -> u64 {
        self.params.threshold
    }

    fn target(&self) -> u64 {
        self.params.threshold - SYNC_LATENCY
    }
}
