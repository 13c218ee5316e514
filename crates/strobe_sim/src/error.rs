//! Error types for component construction and harness runs.
//!
//! Transition functions never fail: every `step` is total. Errors only come
//! from building a component with a bad parameter set ([`ConfigError`]) or
//! from a harness run that does not reach its goal ([`SimError`]).

use strobe_common::ParsePolarityError;

/// An invalid parameter combination, reported when a component is built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A synchronizer needs at least two flip-flop stages.
    #[error("synchronizer needs at least 2 stages, got {stages}")]
    TooFewStages {
        /// The requested stage count.
        stages: usize,
    },

    /// The polarity token is not `ACTIVE_HIGH` or `ACTIVE_LOW`.
    #[error(transparent)]
    UnknownPolarity(#[from] ParsePolarityError),

    /// The debounce window is shorter than the synchronizer latency it must absorb.
    #[error("debounce threshold must be at least 2 cycles, got {threshold}")]
    ThresholdTooSmall {
        /// The computed threshold in clock cycles.
        threshold: u64,
    },

    /// The debounce window holds more clock cycles than a 64-bit counter.
    #[error("debounce window of {debounce_ms} ms overflows the cycle counter")]
    DebounceWindowTooLong {
        /// The requested window in milliseconds.
        debounce_ms: u64,
    },

    /// The clock frequency is zero, negative, or not a number.
    #[error("invalid clock frequency: {hz} Hz")]
    InvalidFrequency {
        /// The offending frequency in Hertz.
        hz: f64,
    },

    /// The baud rate is zero or faster than the clock.
    #[error("invalid baud rate {baud} for a {clock_hz} Hz clock")]
    InvalidBaud {
        /// The requested baud rate.
        baud: u32,
        /// The clock frequency in Hertz.
        clock_hz: f64,
    },

    /// One serial bit is too short for a stable mid-bit sample point.
    #[error("bit time must be at least 8 clock cycles, got {bit_time}")]
    BitTimeTooSmall {
        /// The computed bit time in clock cycles.
        bit_time: u64,
    },

    /// The half bit time was not derived from the bit time.
    #[error("half bit time {half_bit_time} does not match bit time {bit_time}")]
    InconsistentBitTiming {
        /// Clock cycles per serial bit.
        bit_time: u64,
        /// The half bit time that was supplied.
        half_bit_time: u64,
    },

    /// Data bits must fit the byte-wide shift buffer.
    #[error("data bits must be between 1 and 8, got {data_bits}")]
    InvalidDataBits {
        /// The requested data-bit count.
        data_bits: u8,
    },

    /// The LED counter width or prescaler does not fit a 64-bit register.
    #[error("counter width {width} with prescaler {prescale_bits} exceeds 64 bits")]
    InvalidCounterWidth {
        /// Visible counter width in bits.
        width: u32,
        /// Prescaler width in bits.
        prescale_bits: u32,
    },
}

/// Errors returned by a harness run.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A component could not be built.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The awaited condition was not observed within the tick budget.
    #[error("watchdog expired after {budget_cycles} cycles waiting for {waiting_for} (stopped at cycle {cycle})")]
    Watchdog {
        /// Description of the condition the run was waiting for.
        waiting_for: String,
        /// The cycle budget that was exhausted.
        budget_cycles: u64,
        /// The clock cycle at which the run stopped.
        cycle: u64,
    },

    /// A scenario finished but observed something other than what it expected.
    #[error("expectation failed at cycle {cycle}: {message}")]
    Expectation {
        /// The clock cycle of the failed check.
        cycle: u64,
        /// What was expected and what was seen.
        message: String,
    },
}
