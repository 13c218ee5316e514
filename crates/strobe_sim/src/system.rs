//! System harness: every component on one clock, stepped in lock-step.
//!
//! Each tick the harness advances the clock, evaluates every component from
//! the outputs committed on the previous tick, and then commits all new
//! outputs together. The only same-tick path is a reset synchronizer's
//! asynchronous assert, which reaches its consumers immediately.
//!
//! Every consuming module owns its own [`ResetSynchronizer`], all fed from
//! the same raw reset.

use log::debug;
use serde::Serialize;
use strobe_common::Frequency;

use crate::counter::{CounterParams, LedCounter};
use crate::debounce::{DebounceFilter, DebounceParams};
use crate::error::{ConfigError, SimError};
use crate::reset_sync::{ResetSyncParams, ResetSynchronizer};
use crate::time::{ClockDomain, Edge, SimTime};
use crate::uart::{UartEngine, UartInputs, UartOutputs, UartParams};

/// Default watchdog budget in clock cycles.
pub const DEFAULT_WATCHDOG_CYCLES: u64 = 10_000_000;

/// Everything needed to build a [`System`]. Immutable once the system exists.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SystemParams {
    /// System clock.
    pub clock: Frequency,
    /// Reset synchronizer shape, shared by every reset domain.
    pub reset: ResetSyncParams,
    /// Button debounce window.
    pub debounce: DebounceParams,
    /// Serial timing.
    pub uart: UartParams,
    /// LED counter shape.
    pub counter: CounterParams,
    /// Feed the transmitter's line back into the receiver.
    pub uart_loopback: bool,
    /// Cycle budget for scenario runs.
    pub watchdog_cycles: u64,
}

impl SystemParams {
    /// Parameters for `clock` and `baud` with the board defaults: active-low
    /// reset through 2 stages, 10 ms debounce idling low, 8 data bits.
    pub fn new(clock: Frequency, baud: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            clock,
            reset: ResetSyncParams::default(),
            debounce: DebounceParams::from_time(clock, 10, false)?,
            uart: UartParams::new(clock, baud, 8)?,
            counter: CounterParams::default(),
            uart_loopback: false,
            watchdog_cycles: DEFAULT_WATCHDOG_CYCLES,
        })
    }

    /// Re-checks every component's parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.clock.is_valid_clock() {
            return Err(ConfigError::InvalidFrequency {
                hz: self.clock.hz(),
            });
        }
        self.reset.validate()?;
        self.debounce.validate()?;
        self.uart.validate()?;
        self.counter.validate()
    }
}

/// Raw inputs for one tick, as a testbench would drive them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stimulus {
    /// Raw reset level, in the configured polarity.
    pub reset: bool,
    /// Raw push-button level.
    pub button: bool,
    /// Serial line into the receiver (ignored in loopback).
    pub rx_line: bool,
    /// Start command for the transmitter.
    pub send: Option<u8>,
}

/// Logical reset state of each domain (`true` = in reset).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ResetStatus {
    /// Debounce filter domain.
    pub debounce: bool,
    /// UART domain.
    pub uart: bool,
    /// LED counter domain.
    pub counter: bool,
}

impl ResetStatus {
    /// Returns `true` if any domain is still in reset.
    pub fn any(&self) -> bool {
        self.debounce || self.uart || self.counter
    }
}

/// Observable signal values committed at the end of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Signals {
    /// Synchronized reset per domain.
    pub reset: ResetStatus,
    /// Debounced button level.
    pub button: bool,
    /// UART outputs.
    pub uart: UartOutputs,
    /// LED counter value.
    pub leds: u64,
}

/// Outputs of the most recent tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SystemOutputs {
    /// Half-period ticks elapsed.
    pub tick: u64,
    /// Rising edges elapsed.
    pub cycle: u64,
    /// Edge evaluated on this tick; `None` before the first tick.
    pub edge: Option<Edge>,
    /// Committed signal values.
    pub signals: Signals,
}

/// Summary of a completed [`System::run_until`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Cycle the run started from.
    pub start_cycle: u64,
    /// Cycle on which the condition was met.
    pub end_cycle: u64,
    /// Simulated time at the end of the run.
    pub elapsed: SimTime,
}

impl RunReport {
    /// Cycles the run took.
    pub fn cycles(&self) -> u64 {
        self.end_cycle - self.start_cycle
    }
}

/// The clocked system: clock engine, reset domains, debounce filter, UART,
/// and LED counter.
#[derive(Clone, Debug)]
pub struct System {
    params: SystemParams,
    clock: ClockDomain,
    debounce_reset: ResetSynchronizer,
    uart_reset: ResetSynchronizer,
    counter_reset: ResetSynchronizer,
    debounce: DebounceFilter,
    uart: UartEngine,
    counter: LedCounter,
    outputs: SystemOutputs,
}

impl System {
    /// Builds the system at tick zero with every reset domain asserted.
    pub fn new(params: SystemParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let clock = ClockDomain::new(params.clock)?;
        let debounce = DebounceFilter::new(params.debounce)?;
        let uart = UartEngine::new(params.uart);
        let counter = LedCounter::new(params.counter)?;
        let outputs = SystemOutputs {
            tick: 0,
            cycle: 0,
            edge: None,
            signals: Signals {
                reset: ResetStatus {
                    debounce: true,
                    uart: true,
                    counter: true,
                },
                button: debounce.output(),
                uart: uart.outputs(),
                leds: counter.leds(),
            },
        };
        Ok(Self {
            params,
            clock,
            debounce_reset: ResetSynchronizer::new(params.reset)?,
            uart_reset: ResetSynchronizer::new(params.reset)?,
            counter_reset: ResetSynchronizer::new(params.reset)?,
            debounce,
            uart,
            counter,
            outputs,
        })
    }

    /// A stimulus with reset released, button at rest, and the line idle.
    pub fn idle_stimulus(&self) -> Stimulus {
        Stimulus {
            reset: self.params.reset.polarity.deasserted(),
            button: self.params.debounce.idle_level,
            rx_line: true,
            send: None,
        }
    }

    /// Advances one tick (half a clock period) and returns the committed outputs.
    pub fn step(&mut self, stimulus: &Stimulus) -> &SystemOutputs {
        let edge = self.clock.advance();
        let prev = self.outputs.signals;
        let polarity = self.params.reset.polarity;
        let raw_asserted = polarity.is_asserted(stimulus.reset);

        // Reset domains: asynchronous assert first, then the synchronous shift.
        self.debounce_reset.step(stimulus.reset, edge);
        self.uart_reset.step(stimulus.reset, edge);
        self.counter_reset.step(stimulus.reset, edge);

        // Consumers see last tick's synchronized reset, except an async assert.
        let debounce_in_reset = prev.reset.debounce || raw_asserted;
        let uart_in_reset = prev.reset.uart || raw_asserted;
        let counter_in_reset = prev.reset.counter || raw_asserted;

        let button = if debounce_in_reset {
            self.debounce.reset();
            self.debounce.output()
        } else {
            self.debounce.step(stimulus.button, edge)
        };

        let rx_line = if self.params.uart_loopback {
            prev.uart.tx_line
        } else {
            stimulus.rx_line
        };
        let uart = if uart_in_reset {
            self.uart.reset();
            self.uart.outputs()
        } else {
            self.uart.step(
                UartInputs {
                    rx_line,
                    send: stimulus.send,
                },
                edge,
            )
        };

        let leds = if counter_in_reset {
            self.counter.reset();
            self.counter.leds()
        } else {
            self.counter.step(edge)
        };

        let reset = ResetStatus {
            debounce: self.debounce_reset.is_asserted(),
            uart: self.uart_reset.is_asserted(),
            counter: self.counter_reset.is_asserted(),
        };
        if prev.reset.any() && !reset.any() {
            debug!("all reset domains released at cycle {}", self.clock.cycle());
        }

        self.outputs = SystemOutputs {
            tick: self.clock.tick(),
            cycle: self.clock.cycle(),
            edge: Some(edge),
            signals: Signals {
                reset,
                button,
                uart,
                leds,
            },
        };
        &self.outputs
    }

    /// Steps whole clock cycles with a constant stimulus.
    pub fn run_cycles(&mut self, cycles: u64, stimulus: &Stimulus) -> &SystemOutputs {
        for _ in 0..cycles {
            self.step(stimulus);
            self.step(stimulus);
        }
        &self.outputs
    }

    /// Steps until `done` holds for the committed outputs, or the watchdog
    /// budget of `budget_cycles` runs out.
    ///
    /// `stimulus` is called before every tick with the previous outputs so a
    /// testbench can react to the design.
    pub fn run_until<S, P>(
        &mut self,
        budget_cycles: u64,
        waiting_for: &str,
        mut stimulus: S,
        mut done: P,
    ) -> Result<RunReport, SimError>
    where
        S: FnMut(&SystemOutputs) -> Stimulus,
        P: FnMut(&SystemOutputs) -> bool,
    {
        let start_cycle = self.clock.cycle();
        for _ in 0..budget_cycles {
            for _ in 0..2 {
                let stim = stimulus(&self.outputs);
                self.step(&stim);
                if done(&self.outputs) {
                    return Ok(RunReport {
                        start_cycle,
                        end_cycle: self.clock.cycle(),
                        elapsed: self.clock.now(),
                    });
                }
            }
        }
        Err(SimError::Watchdog {
            waiting_for: waiting_for.to_string(),
            budget_cycles,
            cycle: self.clock.cycle(),
        })
    }

    /// Outputs committed by the last tick.
    pub fn outputs(&self) -> &SystemOutputs {
        &self.outputs
    }

    /// Parameters the system was built with.
    pub fn params(&self) -> &SystemParams {
        &self.params
    }

    /// The clock engine.
    pub fn clock(&self) -> &ClockDomain {
        &self.clock
    }

    /// Reset synchronizers in domain order: debounce, UART, counter.
    pub fn reset_synchronizers(&self) -> [&ResetSynchronizer; 3] {
        [&self.debounce_reset, &self.uart_reset, &self.counter_reset]
    }

    /// The debounce filter.
    pub fn debounce(&self) -> &DebounceFilter {
        &self.debounce
    }

    /// The UART engine.
    pub fn uart(&self) -> &UartEngine {
        &self.uart
    }

    /// The LED counter.
    pub fn counter(&self) -> &LedCounter {
        &self.counter
    }
}
