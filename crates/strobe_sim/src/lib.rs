//! Cycle-accurate behavioral simulator for small FPGA support logic.
//!
//! This crate models a reset synchronizer, a push-button debounce filter, an
//! 8-N-1 UART, and an LED counter as pure state machines stepped by a shared
//! clock. Time advances in half-period ticks; every component acts on rising
//! edges except the reset synchronizer's asynchronous assert.
//!
//! # Architecture
//!
//! Each component exposes a total `step(inputs, edge)` transition. The
//! [`System`] harness owns one instance of each, evaluates them all from the
//! outputs committed on the previous tick, and commits the new outputs
//! together, so evaluation order never matters. Runs are bounded by a
//! watchdog measured in clock cycles.
//!
//! # Usage
//!
//! ```ignore
//! use strobe_common::Frequency;
//! use strobe_sim::{Scenario, SystemParams};
//!
//! let clock: Frequency = "50MHz".parse()?;
//! let params = SystemParams::new(clock, 115_200)?;
//! let report = Scenario::UartLoopback { bytes: vec![0xA5] }.run(&params)?;
//! println!("{report}");
//! ```
//!
//! # Modules
//!
//! - `time`: Clock domain, edges, femtosecond simulated time
//! - `reset_sync`: Asynchronous-assert, synchronous-deassert reset
//! - `debounce`: Synchronized, counter-based debounce filter
//! - `uart`: Receiver and transmitter state machines
//! - `counter`: Prescaled LED counter
//! - `stimulus`: Serial line and bouncing button drivers
//! - `monitor`: External serial line decoder
//! - `system`: Double-buffered harness with watchdog
//! - `scenario`: Reusable testbench flows

#![warn(missing_docs)]

pub mod counter;
pub mod debounce;
pub mod error;
pub mod monitor;
pub mod reset_sync;
pub mod scenario;
pub mod stimulus;
pub mod system;
pub mod time;
pub mod uart;

pub use counter::{CounterParams, LedCounter};
pub use debounce::{DebounceFilter, DebounceParams};
pub use error::{ConfigError, SimError};
pub use monitor::{Frame, LineMonitor};
pub use reset_sync::{ResetSyncParams, ResetSynchronizer};
pub use scenario::{Scenario, ScenarioReport};
pub use stimulus::{BounceGenerator, SerialDriver};
pub use system::{
    ResetStatus, RunReport, Signals, Stimulus, System, SystemOutputs, SystemParams,
    DEFAULT_WATCHDOG_CYCLES,
};
pub use time::{ClockDomain, Edge, SimTime};
pub use uart::{
    CommandStatus, UartEngine, UartInputs, UartOutputs, UartParams, UartReceiver,
    UartTransmitter, MIN_BIT_TIME,
};
