//! `strobe check`: configuration validation command.
//!
//! Loads `strobe.toml`, resolves it into simulator parameters, and prints the
//! timing values derived from the clock.

use strobe_sim::{SimTime, SystemParams};

use crate::pipeline;
use crate::GlobalArgs;

/// Runs the `strobe check` command.
///
/// Returns exit code 0 when the configuration resolves; load and parameter
/// errors propagate to `main`.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (path, params) = pipeline::load_params(global)?;

    if !global.quiet {
        eprintln!("    Checking {}", path.display());
    }
    for line in summary(&params) {
        println!("{line}");
    }
    if !global.quiet {
        eprintln!("          OK configuration is valid");
    }
    Ok(0)
}

/// Derived parameters, one `name: value` line each.
fn summary(params: &SystemParams) -> Vec<String> {
    let half_period = params.clock.half_period_fs();
    let period = |cycles: u64| {
        cycles
            .checked_mul(2)
            .and_then(|ticks| ticks.checked_mul(half_period))
            .map_or_else(|| "beyond u64 femtoseconds".to_string(), |fs| {
                SimTime::from_fs(fs).to_string()
            })
    };
    vec![
        format!("clock:              {}", params.clock),
        format!(
            "reset:              {}, {} stages",
            params.reset.polarity, params.reset.stages
        ),
        format!(
            "debounce threshold: {} cycles ({})",
            params.debounce.threshold,
            period(params.debounce.threshold)
        ),
        format!(
            "uart bit time:      {} cycles ({})",
            params.uart.bit_time,
            period(params.uart.bit_time)
        ),
        format!("uart half bit time: {} cycles", params.uart.half_bit_time),
        format!(
            "uart frame:         {} data bits, {} cycles",
            params.uart.data_bits,
            params.uart.frame_cycles()
        ),
        format!(
            "uart loopback:      {}",
            if params.uart_loopback { "on" } else { "off" }
        ),
        format!(
            "counter period:     {} cycles per increment ({}), {} leds",
            params.counter.cycles_per_increment(),
            period(params.counter.cycles_per_increment()),
            params.counter.width
        ),
        format!("watchdog budget:    {} cycles", params.watchdog_cycles),
    ]
}
