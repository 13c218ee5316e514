//! UART transmitter state machine.

use log::{debug, trace};
use serde::Serialize;

use super::UartParams;
use crate::time::Edge;

/// Transmitter states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TxState {
    /// Line high, waiting for a start command.
    Idle,
    /// Driving the low start bit.
    StartBit,
    /// Driving data bits, LSB first.
    WriteBit,
    /// Driving the high stop bit.
    StopBit,
    /// One-step pass-through back to idle.
    Done,
}

/// What the transmitter did with a start command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum CommandStatus {
    /// No command was sampled this step.
    #[default]
    None,
    /// The byte was latched and a frame started.
    Accepted,
    /// The transmitter was busy; the command had no effect.
    Rejected,
}

/// Transmitter outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TxOutput {
    /// Serial line level.
    pub line: bool,
    /// High from the accepted command until the stop bit has been sent.
    pub busy: bool,
    /// Outcome of this step's start command.
    pub command: CommandStatus,
}

/// Bit-serial transmitter. Holds at most one byte; callers wait on `busy`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UartTransmitter {
    params: UartParams,
    state: TxState,
    bit_index: u8,
    counter: u64,
    buffer: u8,
    line: bool,
    busy: bool,
}

impl UartTransmitter {
    /// Creates an idle transmitter with the line high.
    pub fn new(params: UartParams) -> Self {
        Self {
            params,
            state: TxState::Idle,
            bit_index: 0,
            counter: 0,
            buffer: 0,
            line: true,
            busy: false,
        }
    }

    /// Returns to idle, abandoning any frame in flight.
    pub fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    /// Evaluates one tick. `send` is a start command carrying the byte;
    /// commands are only sampled on rising edges.
    pub fn step(&mut self, send: Option<u8>, edge: Edge) -> TxOutput {
        if !edge.is_rising() {
            return self.output();
        }

        let (next, command) = self.next_state(send);
        if next != self.state {
            trace!("uart tx: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        TxOutput {
            command,
            ..self.output()
        }
    }

    fn next_state(&mut self, send: Option<u8>) -> (TxState, CommandStatus) {
        let UartParams {
            bit_time,
            data_bits,
            ..
        } = self.params;

        match (self.state, send) {
            (TxState::Idle, Some(byte)) => {
                self.line = true;
                self.counter = 0;
                self.bit_index = 0;
                self.buffer = byte;
                self.busy = true;
                debug!("uart tx: sending 0x{byte:02X}");
                (TxState::StartBit, CommandStatus::Accepted)
            }
            (_, Some(byte)) => {
                debug!(
                    "uart tx: start command for 0x{byte:02X} rejected in {:?}",
                    self.state
                );
                (self.advance(bit_time, data_bits), CommandStatus::Rejected)
            }
            (_, None) => (self.advance(bit_time, data_bits), CommandStatus::None),
        }
    }

    /// One step of the frame sequencer, ignoring commands.
    fn advance(&mut self, bit_time: u64, data_bits: u8) -> TxState {
        match self.state {
            TxState::Idle => {
                self.line = true;
                self.busy = false;
                self.counter = 0;
                self.bit_index = 0;
                TxState::Idle
            }
            TxState::StartBit => {
                self.line = false;
                if self.counter == bit_time - 1 {
                    self.counter = 0;
                    TxState::WriteBit
                } else {
                    self.counter += 1;
                    TxState::StartBit
                }
            }
            TxState::WriteBit => {
                self.line = (self.buffer >> self.bit_index) & 1 == 1;
                if self.counter < bit_time - 1 {
                    self.counter += 1;
                    return TxState::WriteBit;
                }
                self.counter = 0;
                if self.bit_index == data_bits - 1 {
                    self.bit_index = 0;
                    TxState::StopBit
                } else {
                    self.bit_index += 1;
                    TxState::WriteBit
                }
            }
            TxState::StopBit => {
                self.line = true;
                if self.counter == bit_time - 1 {
                    self.counter = 0;
                    self.busy = false;
                    TxState::Done
                } else {
                    self.counter += 1;
                    TxState::StopBit
                }
            }
            TxState::Done => {
                self.line = true;
                TxState::Idle
            }
        }
    }

    /// Current outputs; `command` is always [`CommandStatus::None`].
    pub fn output(&self) -> TxOutput {
        TxOutput {
            line: self.line,
            busy: self.busy,
            command: CommandStatus::None,
        }
    }

    /// Current state.
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Byte latched for the frame in flight.
    pub fn buffer(&self) -> u8 {
        self.buffer
    }
}
