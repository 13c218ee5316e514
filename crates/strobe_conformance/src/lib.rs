//! Conformance test helpers for the strobe simulator.
//!
//! Provides parameter sets and clocking helpers that drive components one
//! full clock period at a time, so integration tests can state timing
//! properties in cycles.

#![warn(missing_docs)]

use strobe_common::{Frequency, Polarity};
use strobe_sim::{
    CounterParams, DebounceFilter, DebounceParams, Edge, ResetSyncParams, Stimulus, System,
    SystemOutputs, SystemParams, UartParams, UartReceiver, UartTransmitter,
};

/// A small, fast system: 1 MHz clock, 16-cycle bits, 16-cycle debounce,
/// LED counter without a prescaler.
pub fn fast_params(polarity: Polarity, stages: usize) -> SystemParams {
    SystemParams {
        clock: Frequency::new(1_000_000.0),
        reset: ResetSyncParams { polarity, stages },
        debounce: DebounceParams::from_cycles(16, false).unwrap(),
        uart: UartParams::from_bit_time(16, 8).unwrap(),
        counter: CounterParams {
            width: 8,
            prescale_bits: 0,
        },
        uart_loopback: false,
        watchdog_cycles: 100_000,
    }
}

/// The reference board: 50 MHz clock, 115200 baud, active-low reset.
pub fn board_params() -> SystemParams {
    let clock: Frequency = "50MHz".parse().unwrap();
    SystemParams::new(clock, 115_200).unwrap()
}

/// Parses and resolves a `strobe.toml` document.
pub fn resolve_str(toml: &str) -> Result<SystemParams, strobe_config::ConfigError> {
    strobe_config::resolve(&strobe_config::load_config_from_str(toml)?)
}

/// Steps `system` through one full clock period and returns the outputs of
/// the rising-edge tick.
pub fn system_cycle(system: &mut System, stimulus: &Stimulus) -> SystemOutputs {
    let rising = *system.step(stimulus);
    system.step(stimulus);
    rising
}

/// Holds the raw reset asserted for `cycles` full periods.
pub fn hold_reset(system: &mut System, cycles: u64) {
    let held = Stimulus {
        reset: system.params().reset.polarity.asserted(),
        ..system.idle_stimulus()
    };
    system.run_cycles(cycles, &held);
}

/// Clocks a debounce filter over per-cycle raw levels and returns the
/// output after each cycle.
pub fn debounce_levels(filter: &mut DebounceFilter, levels: &[bool]) -> Vec<bool> {
    levels
        .iter()
        .map(|&level| {
            filter.step(level, Edge::Rising);
            filter.step(level, Edge::Falling)
        })
        .collect()
}

/// Line level per cycle for a standalone transmitter sending `byte`, from
/// the accepting cycle until `cycles` have elapsed. `disturb` is offered as
/// a start command on every cycle after the first.
pub fn transmit(params: UartParams, byte: u8, disturb: Option<u8>, cycles: u64) -> Vec<bool> {
    let mut tx = UartTransmitter::new(params);
    let mut line = Vec::with_capacity(cycles as usize);
    for cycle in 0..cycles {
        let send = if cycle == 0 { Some(byte) } else { disturb };
        line.push(tx.step(send, Edge::Rising).line);
        tx.step(send, Edge::Falling);
    }
    line
}

/// Feeds per-cycle line levels to a standalone receiver and returns each
/// `(cycle, byte)` it reports ready.
pub fn receive(params: UartParams, line: impl IntoIterator<Item = bool>) -> Vec<(u64, u8)> {
    let mut rx = UartReceiver::new(params);
    let mut ready = Vec::new();
    for (cycle, level) in line.into_iter().enumerate() {
        let out = rx.step(level, Edge::Rising);
        rx.step(level, Edge::Falling);
        if out.ready {
            ready.push((cycle as u64, out.data));
        }
    }
    ready
}
