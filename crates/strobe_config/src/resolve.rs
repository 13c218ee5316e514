//! Resolution of a parsed configuration into simulator parameters.

use crate::error::ConfigError;
use crate::types::StrobeConfig;
use strobe_common::Frequency;
use strobe_sim::{CounterParams, DebounceParams, ResetSyncParams, SystemParams, UartParams};

/// Builds the simulator parameters a [`StrobeConfig`] describes.
///
/// Every derived value (bit time, debounce threshold) is computed here and
/// checked by the simulator's own constructors, so a resolved configuration
/// always builds a [`strobe_sim::System`].
pub fn resolve(config: &StrobeConfig) -> Result<SystemParams, ConfigError> {
    let clock = config
        .clock
        .as_ref()
        .ok_or_else(|| ConfigError::MissingField("clock.frequency".to_string()))?;
    let clock: Frequency = clock
        .frequency
        .parse()
        .map_err(|e| ConfigError::ValidationError(format!("clock.frequency: {e}")))?;

    let params = SystemParams {
        clock,
        reset: ResetSyncParams::from_token(&config.reset.polarity, config.reset.stages)?,
        debounce: DebounceParams::from_time(
            clock,
            config.debounce.time_ms,
            config.debounce.idle_level,
        )?,
        uart: UartParams::new(clock, config.uart.baud, config.uart.data_bits)?,
        counter: CounterParams {
            width: config.counter.width,
            prescale_bits: config.counter.prescale_bits,
        },
        uart_loopback: config.uart.loopback,
        watchdog_cycles: config.harness.watchdog_cycles,
    };
    params.validate()?;
    Ok(params)
}
