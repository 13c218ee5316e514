//! Reusable testbench flows over a [`System`].
//!
//! Every scenario builds a fresh system, holds reset for a few cycles,
//! releases it, and then drives one flow to completion under the watchdog
//! budget in [`SystemParams::watchdog_cycles`]. A flow that finishes but
//! observes the wrong thing returns [`SimError::Expectation`].

use std::fmt;

use log::{debug, info};
use serde::Serialize;
use strobe_common::Polarity;

use crate::error::SimError;
use crate::monitor::{Frame, LineMonitor};
use crate::stimulus::BounceGenerator;
use crate::system::{RunReport, Stimulus, System, SystemOutputs, SystemParams};
use crate::time::{Edge, SimTime};
use crate::uart::CommandStatus;

/// Cycles the raw reset is held asserted before a scenario starts.
pub const RESET_HOLD_CYCLES: u64 = 4;

/// A testbench flow and its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// Measure reset release latency.
    ResetRelease,
    /// Press a bouncing button and wait for the debounced level.
    Debounce {
        /// Seed for the bounce pattern.
        seed: u64,
        /// Cycles of contact chatter after the press.
        bounce_cycles: u64,
    },
    /// Send bytes through the transmitter and back into the receiver.
    UartLoopback {
        /// Bytes to send, in order.
        bytes: Vec<u8>,
    },
    /// Send bytes back to back and decode the line with a [`LineMonitor`].
    UartStream {
        /// Bytes to send, in order.
        bytes: Vec<u8>,
    },
    /// Wait for the LED counter to change `increments` times.
    Blinky {
        /// LED value changes to wait for.
        increments: u64,
    },
}

impl Scenario {
    /// Short kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::ResetRelease => "reset-release",
            Scenario::Debounce { .. } => "debounce",
            Scenario::UartLoopback { .. } => "uart-loopback",
            Scenario::UartStream { .. } => "uart-stream",
            Scenario::Blinky { .. } => "blinky",
        }
    }

    /// Runs the flow on a fresh system built from `params`.
    pub fn run(&self, params: &SystemParams) -> Result<ScenarioReport, SimError> {
        info!("running scenario {}", self.name());
        let report = match self {
            Scenario::ResetRelease => ScenarioReport::ResetRelease(reset_release(params)?),
            Scenario::Debounce {
                seed,
                bounce_cycles,
            } => ScenarioReport::Debounce(debounce(params, *seed, *bounce_cycles)?),
            Scenario::UartLoopback { bytes } => {
                ScenarioReport::UartLoopback(uart_loopback(params, bytes)?)
            }
            Scenario::UartStream { bytes } => {
                ScenarioReport::UartStream(uart_stream(params, bytes)?)
            }
            Scenario::Blinky { increments } => {
                ScenarioReport::Blinky(blinky(params, *increments)?)
            }
        };
        Ok(report)
    }
}

/// Result of any scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "scenario", rename_all = "kebab-case")]
pub enum ScenarioReport {
    /// See [`reset_release`].
    ResetRelease(ResetReport),
    /// See [`debounce`].
    Debounce(DebounceReport),
    /// See [`uart_loopback`].
    UartLoopback(LoopbackReport),
    /// See [`uart_stream`].
    UartStream(StreamReport),
    /// See [`blinky`].
    Blinky(BlinkyReport),
}

impl ScenarioReport {
    /// Simulated time at the end of the scenario.
    pub fn elapsed(&self) -> SimTime {
        match self {
            ScenarioReport::ResetRelease(r) => r.elapsed,
            ScenarioReport::Debounce(r) => r.elapsed,
            ScenarioReport::UartLoopback(r) => r.elapsed,
            ScenarioReport::UartStream(r) => r.elapsed,
            ScenarioReport::Blinky(r) => r.elapsed,
        }
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioReport::ResetRelease(r) => write!(
                f,
                "reset ({}, {} stages) released after {} rising edges",
                r.polarity, r.stages, r.release_edges
            ),
            ScenarioReport::Debounce(r) => write!(
                f,
                "button settled {} cycles after press (threshold {}, bounce {})",
                r.settle_cycles, r.threshold, r.bounce_cycles
            ),
            ScenarioReport::UartLoopback(r) => write!(
                f,
                "looped back {} byte(s) [{}], {} ready pulse(s)",
                r.received.len(),
                hex_list(&r.received),
                r.ready_pulses
            ),
            ScenarioReport::UartStream(r) => write!(
                f,
                "monitor decoded {} frame(s) [{}], {} framing error(s)",
                r.frames.len(),
                hex_list(&r.decoded),
                r.framing_errors
            ),
            ScenarioReport::Blinky(r) => write!(
                f,
                "leds changed {} time(s), every {} cycles, now {:#b}",
                r.increments, r.cycles_per_increment, r.leds
            ),
        }
    }
}

fn hex_list(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Reset release latency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    /// Configured polarity.
    pub polarity: Polarity,
    /// Synchronizer depth.
    pub stages: usize,
    /// Rising edges from release until every domain's synchronizer deasserted.
    pub release_edges: u64,
    /// Simulated time at the end.
    pub elapsed: SimTime,
}

/// Button debounce timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DebounceReport {
    /// Debounce window in cycles.
    pub threshold: u64,
    /// Chatter cycles after the press.
    pub bounce_cycles: u64,
    /// Cycles from the press until the debounced output changed.
    pub settle_cycles: u64,
    /// Simulated time at the end.
    pub elapsed: SimTime,
}

/// UART loopback results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoopbackReport {
    /// Bytes accepted by the transmitter.
    pub sent: Vec<u8>,
    /// Bytes reported by the receiver.
    pub received: Vec<u8>,
    /// Rising edges with `rx_ready` high.
    pub ready_pulses: u64,
    /// Start commands refused because the transmitter was not idle.
    pub rejected_commands: u64,
    /// Simulated time at the end.
    pub elapsed: SimTime,
}

/// UART transmit stream as seen by an external monitor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StreamReport {
    /// Bytes accepted by the transmitter.
    pub sent: Vec<u8>,
    /// Bytes decoded by the monitor.
    pub decoded: Vec<u8>,
    /// Every decoded frame.
    pub frames: Vec<Frame>,
    /// Frames whose stop bit was low.
    pub framing_errors: usize,
    /// Simulated time at the end.
    pub elapsed: SimTime,
}

/// LED counter progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlinkyReport {
    /// LED value changes observed.
    pub increments: u64,
    /// Cycles between consecutive changes.
    pub cycles_per_increment: u64,
    /// LED value at the end.
    pub leds: u64,
    /// Simulated time at the end.
    pub elapsed: SimTime,
}

/// Holds reset, releases it, and waits until every consumer is out of reset.
fn bring_up(params: &SystemParams) -> Result<(System, RunReport), SimError> {
    let mut sys = System::new(*params)?;
    let idle = sys.idle_stimulus();
    let held = Stimulus {
        reset: params.reset.polarity.asserted(),
        ..idle
    };
    sys.run_cycles(RESET_HOLD_CYCLES, &held);
    let report = sys.run_until(
        params.watchdog_cycles,
        "reset release",
        |_| idle,
        |out| !out.signals.reset.any(),
    )?;
    // Consumers read the synchronizer one edge late.
    sys.run_cycles(1, &idle);
    debug!("system out of reset at cycle {}", sys.clock().cycle());
    Ok((sys, report))
}

fn expect(sys: &System, ok: bool, message: impl FnOnce() -> String) -> Result<(), SimError> {
    if ok {
        Ok(())
    } else {
        Err(SimError::Expectation {
            cycle: sys.clock().cycle(),
            message: message(),
        })
    }
}

/// Releases reset and checks that it takes exactly `stages` rising edges.
pub fn reset_release(params: &SystemParams) -> Result<ResetReport, SimError> {
    let (sys, release) = bring_up(params)?;
    let stages = params.reset.stages;
    expect(&sys, release.cycles() == stages as u64, || {
        format!(
            "reset released after {} edges, expected {stages}",
            release.cycles()
        )
    })?;
    Ok(ResetReport {
        polarity: params.reset.polarity,
        stages,
        release_edges: release.cycles(),
        elapsed: sys.clock().now(),
    })
}

/// Presses a bouncing button and checks the debounced output changes once,
/// no sooner than one debounce window after the press, and then stays put.
pub fn debounce(
    params: &SystemParams,
    seed: u64,
    bounce_cycles: u64,
) -> Result<DebounceReport, SimError> {
    let (mut sys, _) = bring_up(params)?;
    let idle = sys.idle_stimulus();
    let pressed = !params.debounce.idle_level;
    let threshold = params.debounce.threshold;

    let mut button = BounceGenerator::new(seed, params.debounce.idle_level);
    button.press(pressed, bounce_cycles);
    let mut level = params.debounce.idle_level;
    let settle = sys.run_until(
        params.watchdog_cycles,
        "debounced button press",
        |out| {
            // One raw level per cycle, held across both ticks.
            if out.tick % 2 == 0 {
                level = button.next_level();
            }
            Stimulus {
                button: level,
                ..idle
            }
        },
        |out| out.signals.button == pressed,
    )?;
    expect(&sys, settle.cycles() >= threshold, || {
        format!(
            "button settled after {} cycles, before the {threshold}-cycle window",
            settle.cycles()
        )
    })?;

    let held = Stimulus {
        button: pressed,
        ..idle
    };
    for _ in 0..threshold.saturating_mul(2) {
        let out = sys.step(&held);
        if out.signals.button != pressed {
            let cycle = out.cycle;
            return Err(SimError::Expectation {
                cycle,
                message: "debounced output changed back while the button was held".into(),
            });
        }
    }

    Ok(DebounceReport {
        threshold,
        bounce_cycles,
        settle_cycles: settle.cycles(),
        elapsed: sys.clock().now(),
    })
}

/// Sends each byte through the transmitter with the line looped back into
/// the receiver and checks every byte comes back with one ready pulse.
pub fn uart_loopback(params: &SystemParams, bytes: &[u8]) -> Result<LoopbackReport, SimError> {
    let params = SystemParams {
        uart_loopback: true,
        ..*params
    };
    let (mut sys, _) = bring_up(&params)?;
    let idle = sys.idle_stimulus();
    let budget = params.watchdog_cycles;

    let mut sent = Vec::with_capacity(bytes.len());
    let mut received = Vec::with_capacity(bytes.len());
    let mut ready_pulses = 0;
    let mut rejected_commands = 0;

    let mut count_ready = |out: &SystemOutputs| {
        if out.edge == Some(Edge::Rising) && out.signals.uart.rx_ready {
            ready_pulses += 1;
        }
    };

    for &byte in bytes {
        sys.run_until(
            budget,
            &format!("transmitter to accept 0x{byte:02X}"),
            |out| Stimulus {
                send: (!out.signals.uart.tx_busy).then_some(byte),
                ..idle
            },
            |out| {
                count_ready(out);
                match out.signals.uart.tx_command {
                    CommandStatus::Accepted => true,
                    CommandStatus::Rejected => {
                        rejected_commands += 1;
                        false
                    }
                    CommandStatus::None => false,
                }
            },
        )?;
        sent.push(byte);

        sys.run_until(
            budget,
            &format!("receiver to report 0x{byte:02X}"),
            |_| idle,
            |out| {
                count_ready(out);
                out.edge == Some(Edge::Rising) && out.signals.uart.rx_ready
            },
        )?;
        let got = sys.outputs().signals.uart.rx_data;
        expect(&sys, got == byte, || {
            format!("expected 0x{byte:02X}, received 0x{got:02X}")
        })?;
        received.push(got);
    }

    // A quiet line must not produce further ready pulses.
    let quiet = params.uart.frame_cycles().saturating_mul(2);
    for _ in 0..quiet.saturating_mul(2) {
        let out = *sys.step(&idle);
        count_ready(&out);
    }
    let expected = bytes.len() as u64;
    expect(&sys, ready_pulses == expected, || {
        format!("expected {expected} ready pulse(s), saw {ready_pulses}")
    })?;

    Ok(LoopbackReport {
        sent,
        received,
        ready_pulses,
        rejected_commands,
        elapsed: sys.clock().now(),
    })
}

/// Sends bytes back to back and decodes the transmit line with an external
/// monitor, checking every frame and stop bit.
pub fn uart_stream(params: &SystemParams, bytes: &[u8]) -> Result<StreamReport, SimError> {
    let (mut sys, _) = bring_up(params)?;
    let idle = sys.idle_stimulus();
    let budget = params.watchdog_cycles;
    let mut monitor = LineMonitor::new(params.uart);

    let mut sent = Vec::with_capacity(bytes.len());
    for &byte in bytes {
        sys.run_until(
            budget,
            &format!("transmitter to accept 0x{byte:02X}"),
            |out| Stimulus {
                send: (!out.signals.uart.tx_busy).then_some(byte),
                ..idle
            },
            |out| {
                observe_tx(&mut monitor, out);
                out.signals.uart.tx_command == CommandStatus::Accepted
            },
        )?;
        sent.push(byte);
    }

    let mut frames_seen = 0;
    sys.run_until(
        budget,
        "line monitor to decode every frame",
        |_| idle,
        |out| {
            observe_tx(&mut monitor, out);
            frames_seen = monitor.frames().len();
            frames_seen == bytes.len()
        },
    )?;
    debug!("line monitor decoded {frames_seen} frame(s)");

    let decoded = monitor.bytes();
    expect(&sys, decoded == bytes, || {
        format!(
            "monitor decoded [{}], expected [{}]",
            hex_list(&decoded),
            hex_list(bytes)
        )
    })?;
    let framing_errors = monitor.framing_errors();
    expect(&sys, framing_errors == 0, || {
        format!("{framing_errors} frame(s) with a low stop bit")
    })?;

    Ok(StreamReport {
        sent,
        decoded,
        frames: monitor.frames().to_vec(),
        framing_errors,
        elapsed: sys.clock().now(),
    })
}

fn observe_tx(monitor: &mut LineMonitor, out: &SystemOutputs) {
    if out.edge == Some(Edge::Rising) {
        monitor.sample(out.signals.uart.tx_line);
    }
}

/// Waits for the LED counter to change `increments` times and checks the
/// changes are evenly spaced by the prescaler period.
pub fn blinky(params: &SystemParams, increments: u64) -> Result<BlinkyReport, SimError> {
    let (mut sys, _) = bring_up(params)?;
    let idle = sys.idle_stimulus();
    let period = params.counter.cycles_per_increment();

    let mut last = sys.outputs().signals.leds;
    let mut seen = 0;
    let mut change_cycles = Vec::new();
    sys.run_until(
        params.watchdog_cycles,
        &format!("led counter to increment {increments} time(s)"),
        |_| idle,
        |out| {
            if out.signals.leds != last {
                last = out.signals.leds;
                seen += 1;
                change_cycles.push(out.cycle);
            }
            seen >= increments
        },
    )?;

    for pair in change_cycles.windows(2) {
        let gap = pair[1] - pair[0];
        expect(&sys, gap == period, || {
            format!("leds changed after {gap} cycles, expected {period}")
        })?;
    }

    Ok(BlinkyReport {
        increments: seen,
        cycles_per_increment: period,
        leds: sys.outputs().signals.leds,
        elapsed: sys.clock().now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::CounterParams;
    use crate::debounce::DebounceParams;
    use crate::reset_sync::ResetSyncParams;
    use crate::uart::UartParams;
    use strobe_common::Frequency;

    fn params() -> SystemParams {
        SystemParams {
            clock: Frequency::new(1_000_000.0),
            reset: ResetSyncParams {
                polarity: Polarity::ActiveHigh,
                stages: 2,
            },
            debounce: DebounceParams::from_cycles(32, false).unwrap(),
            uart: UartParams::from_bit_time(16, 8).unwrap(),
            counter: CounterParams {
                width: 4,
                prescale_bits: 3,
            },
            uart_loopback: false,
            watchdog_cycles: 20_000,
        }
    }

    #[test]
    fn reset_release_matches_stage_count() {
        for stages in 2..=5 {
            let mut p = params();
            p.reset.stages = stages;
            let r = reset_release(&p).unwrap();
            assert_eq!(r.release_edges, stages as u64);
        }
    }

    #[test]
    fn debounce_settles_after_window() {
        let r = debounce(&params(), 42, 64).unwrap();
        assert!(r.settle_cycles >= 32);
        assert!(r.settle_cycles <= 64 + 32 + 8);
    }

    #[test]
    fn loopback_bytes_come_back() {
        let r = uart_loopback(&params(), &[0xA5, 0x00, 0xFF]).unwrap();
        assert_eq!(r.received, vec![0xA5, 0x00, 0xFF]);
        assert_eq!(r.ready_pulses, 3);
    }

    #[test]
    fn stream_decodes_back_to_back() {
        let r = uart_stream(&params(), &[0x00, 0xFF]).unwrap();
        assert_eq!(r.decoded, vec![0x00, 0xFF]);
        assert_eq!(r.framing_errors, 0);
        assert!(r.frames.iter().all(|f| f.stop_bit));
    }

    #[test]
    fn blinky_evenly_spaced() {
        let r = blinky(&params(), 5).unwrap();
        assert_eq!(r.increments, 5);
        assert_eq!(r.leds, 5);
        assert_eq!(r.cycles_per_increment, 8);
    }

    #[test]
    fn blinky_watchdog() {
        let mut p = params();
        p.watchdog_cycles = 20;
        let err = blinky(&p, 5).unwrap_err();
        assert!(matches!(err, SimError::Watchdog { .. }));
    }

    #[test]
    fn report_serializes_with_tag() {
        let report = Scenario::ResetRelease.run(&params()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scenario"], "reset-release");
        assert_eq!(json["release_edges"], 2);
        assert!(report.to_string().contains("2 rising edges"));
    }

    #[test]
    fn scenario_names() {
        assert_eq!(Scenario::Blinky { increments: 1 }.name(), "blinky");
        assert_eq!(
            Scenario::UartStream { bytes: vec![] }.name(),
            "uart-stream"
        );
    }
}
