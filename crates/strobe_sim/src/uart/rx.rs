//! UART receiver state machine.

use log::{debug, trace};
use serde::Serialize;

use super::UartParams;
use crate::time::Edge;

/// Receiver states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RxState {
    /// Line idle, waiting for a low start bit.
    Idle,
    /// Counting to the middle of the start bit.
    StartBit,
    /// Counting one bit time to the next sample point.
    Wait,
    /// Capturing one data bit.
    ReadBit,
    /// Counting through the stop bit.
    StopBit,
}

/// Receiver outputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RxOutput {
    /// Last complete byte.
    pub data: u8,
    /// High for exactly one step after a byte completes.
    pub ready: bool,
}

/// Bit-serial receiver.
///
/// Framing is not checked: whatever level the stop bit carries, the byte is
/// published. Strict framing belongs in an external line monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UartReceiver {
    params: UartParams,
    state: RxState,
    bit_index: u8,
    counter: u64,
    buffer: u8,
    data: u8,
    ready: bool,
}

impl UartReceiver {
    /// Creates an idle receiver.
    pub fn new(params: UartParams) -> Self {
        Self {
            params,
            state: RxState::Idle,
            bit_index: 0,
            counter: 0,
            buffer: 0,
            data: 0,
            ready: false,
        }
    }

    /// Returns to idle, dropping any partial frame.
    pub fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    /// Evaluates one tick with the current line level.
    pub fn step(&mut self, line: bool, edge: Edge) -> RxOutput {
        if edge.is_rising() {
            let next = self.next_state(line);
            if next != self.state {
                trace!("uart rx: {:?} -> {:?}", self.state, next);
            }
            self.state = next;
        }
        self.output()
    }

    fn next_state(&mut self, line: bool) -> RxState {
        let UartParams {
            bit_time,
            half_bit_time,
            data_bits,
        } = self.params;

        match self.state {
            RxState::Idle => {
                self.ready = false;
                self.counter = 0;
                self.bit_index = 0;
                if line {
                    RxState::Idle
                } else {
                    RxState::StartBit
                }
            }
            RxState::StartBit => {
                if self.counter == half_bit_time - 1 {
                    self.counter = 0;
                    RxState::Wait
                } else {
                    self.counter += 1;
                    RxState::StartBit
                }
            }
            RxState::Wait => {
                if self.counter == bit_time - 1 {
                    self.counter = 0;
                    RxState::ReadBit
                } else {
                    self.counter += 1;
                    RxState::Wait
                }
            }
            RxState::ReadBit => {
                // This cycle is the first of the next bit period.
                self.counter += 1;
                let mask = 1u8 << self.bit_index;
                if line {
                    self.buffer |= mask;
                } else {
                    self.buffer &= !mask;
                }
                if self.bit_index == data_bits - 1 {
                    self.bit_index = 0;
                    RxState::StopBit
                } else {
                    self.bit_index += 1;
                    RxState::Wait
                }
            }
            RxState::StopBit => {
                if self.counter == bit_time - 1 {
                    self.counter = 0;
                    self.data = self.buffer;
                    self.ready = true;
                    debug!("uart rx: received 0x{:02X}", self.data);
                    RxState::Idle
                } else {
                    self.counter += 1;
                    RxState::StopBit
                }
            }
        }
    }

    /// Current outputs.
    pub fn output(&self) -> RxOutput {
        RxOutput {
            data: self.data,
            ready: self.ready,
        }
    }

    /// Current state.
    pub fn state(&self) -> RxState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIT: u64 = 16;

    fn receiver() -> UartReceiver {
        UartReceiver::new(UartParams::from_bit_time(BIT, 8).unwrap())
    }

    /// Line levels, one per cycle, for an 8-N-1 frame with the given stop level.
    fn frame(byte: u8, stop: bool) -> Vec<bool> {
        let mut bits = vec![false];
        bits.extend((0..8).map(|i| (byte >> i) & 1 == 1));
        bits.push(stop);
        bits.into_iter()
            .flat_map(|b| std::iter::repeat(b).take(BIT as usize))
            .collect()
    }

    /// Clocks the receiver over `line`, returning every (cycle, byte) it reports ready.
    fn feed(rx: &mut UartReceiver, line: &[bool]) -> Vec<(usize, u8)> {
        let mut ready = Vec::new();
        for (cycle, &level) in line.iter().enumerate() {
            let out = rx.step(level, Edge::Rising);
            rx.step(level, Edge::Falling);
            if out.ready {
                ready.push((cycle, out.data));
            }
        }
        ready
    }

    #[test]
    fn receives_byte_lsb_first() {
        let mut rx = receiver();
        let mut line = vec![true; 5];
        line.extend(frame(0xA5, true));
        line.extend(vec![true; 20]);
        let got = feed(&mut rx, &line);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].1, 0xA5);
        assert_eq!(rx.state(), RxState::Idle);
    }

    #[test]
    fn ready_pulses_for_one_step() {
        let mut rx = receiver();
        let mut line = vec![true; 3];
        line.extend(frame(0x01, true));
        line.extend(vec![true; 40]);
        let mut high = 0;
        for &level in &line {
            if rx.step(level, Edge::Rising).ready {
                high += 1;
            }
            rx.step(level, Edge::Falling);
        }
        assert_eq!(high, 1);
    }

    #[test]
    fn bad_stop_bit_is_accepted() {
        let mut rx = receiver();
        let mut line = vec![true; 2];
        line.extend(frame(0x5A, false));
        line.extend(vec![true; 20]);
        let got = feed(&mut rx, &line);
        assert_eq!(got.iter().map(|&(_, b)| b).collect::<Vec<_>>(), vec![0x5A]);
    }

    #[test]
    fn back_to_back_frames() {
        let mut rx = receiver();
        let mut line = vec![true; 4];
        for byte in [0x00, 0xFF, 0x81] {
            line.extend(frame(byte, true));
        }
        line.extend(vec![true; 20]);
        let got: Vec<u8> = feed(&mut rx, &line).into_iter().map(|(_, b)| b).collect();
        assert_eq!(got, vec![0x00, 0xFF, 0x81]);
    }

    #[test]
    fn falling_edges_do_nothing() {
        let mut rx = receiver();
        for _ in 0..100 {
            rx.step(false, Edge::Falling);
        }
        assert_eq!(rx.state(), RxState::Idle);
    }

    #[test]
    fn reset_drops_partial_frame() {
        let mut rx = receiver();
        let line = frame(0xFF, true);
        feed(&mut rx, &line[..(BIT as usize * 4)]);
        assert_ne!(rx.state(), RxState::Idle);
        rx.reset();
        assert_eq!(rx.state(), RxState::Idle);
        assert_eq!(rx.output(), RxOutput::default());
    }

    #[test]
    fn fewer_data_bits() {
        let mut rx = UartReceiver::new(UartParams::from_bit_time(BIT, 5).unwrap());
        let mut line = vec![true; 2];
        let mut bits = vec![false];
        bits.extend((0..5).map(|i| (0b10110u8 >> i) & 1 == 1));
        bits.push(true);
        line.extend(bits.into_iter().flat_map(|b| std::iter::repeat(b).take(BIT as usize)));
        line.extend(vec![true; 20]);
        let got = feed(&mut rx, &line);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].1, 0b10110);
    }
}
