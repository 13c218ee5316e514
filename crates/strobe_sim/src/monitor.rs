//! External serial line monitor.
//!
//! Decodes 8-N-1 frames from per-cycle line samples and checks the stop bit.
//! The UART receiver accepts any stop level; this monitor is where strict
//! framing checks live.

use log::{debug, warn};
use serde::Serialize;

use crate::uart::UartParams;

/// One decoded frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// Cycle of the stop-bit sample.
    pub cycle: u64,
    /// Decoded data bits.
    pub byte: u8,
    /// Level sampled in the middle of the stop bit.
    pub stop_bit: bool,
}

impl Frame {
    /// Returns `true` if the stop bit was low.
    pub fn is_framing_error(&self) -> bool {
        !self.stop_bit
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Start,
    Data,
    Stop,
}

/// Mid-bit sampling decoder for a serial line.
#[derive(Clone, Debug)]
pub struct LineMonitor {
    params: UartParams,
    phase: Phase,
    counter: u64,
    index: u8,
    shift: u8,
    cycle: u64,
    frames: Vec<Frame>,
    false_starts: u64,
}

impl LineMonitor {
    /// Creates a monitor expecting an idle line.
    pub fn new(params: UartParams) -> Self {
        Self {
            params,
            phase: Phase::Idle,
            counter: 0,
            index: 0,
            shift: 0,
            cycle: 0,
            frames: Vec::new(),
            false_starts: 0,
        }
    }

    /// Feeds the line level for one cycle.
    pub fn sample(&mut self, line: bool) {
        self.cycle += 1;
        match self.phase {
            Phase::Idle => {
                if !line {
                    self.phase = Phase::Start;
                    self.counter = 0;
                }
            }
            Phase::Start => {
                self.counter += 1;
                if self.counter == self.params.half_bit_time {
                    if line {
                        self.false_starts += 1;
                        self.phase = Phase::Idle;
                    } else {
                        self.phase = Phase::Data;
                        self.counter = 0;
                        self.index = 0;
                        self.shift = 0;
                    }
                }
            }
            Phase::Data => {
                self.counter += 1;
                if self.counter == self.params.bit_time {
                    self.counter = 0;
                    if line {
                        self.shift |= 1 << self.index;
                    }
                    self.index += 1;
                    if self.index == self.params.data_bits {
                        self.phase = Phase::Stop;
                    }
                }
            }
            Phase::Stop => {
                self.counter += 1;
                if self.counter == self.params.bit_time {
                    let frame = Frame {
                        cycle: self.cycle,
                        byte: self.shift,
                        stop_bit: line,
                    };
                    if frame.is_framing_error() {
                        warn!("line monitor: framing error on 0x{:02X}", frame.byte);
                    } else {
                        debug!("line monitor: decoded 0x{:02X}", frame.byte);
                    }
                    self.frames.push(frame);
                    self.phase = Phase::Idle;
                }
            }
        }
    }

    /// Every frame decoded so far.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Decoded bytes, framing errors included.
    pub fn bytes(&self) -> Vec<u8> {
        self.frames.iter().map(|f| f.byte).collect()
    }

    /// Number of frames whose stop bit was low.
    pub fn framing_errors(&self) -> usize {
        self.frames.iter().filter(|f| f.is_framing_error()).count()
    }

    /// Number of low glitches that did not last to the middle of a start bit.
    pub fn false_starts(&self) -> u64 {
        self.false_starts
    }

    /// Returns `true` when no frame is being decoded.
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }
}
