//! 8-N-1 UART engine: independent receiver and transmitter state machines.
//!
//! Both machines time serial bits with a cycle counter derived from the
//! clock frequency and baud rate, act only on rising edges, and may be
//! mid-frame at the same time (full duplex).

pub mod rx;
pub mod tx;

use serde::Serialize;
use strobe_common::Frequency;

use crate::error::ConfigError;
use crate::time::Edge;

pub use rx::{RxOutput, RxState, UartReceiver};
pub use tx::{CommandStatus, TxOutput, TxState, UartTransmitter};

/// Shortest supported bit time in clock cycles.
///
/// The receiver samples each bit half a bit time plus two cycles of
/// detection and read latency after the start edge. Below this the sample
/// point leaves the bit it is meant to capture.
pub const MIN_BIT_TIME: u64 = 8;

/// Validated serial timing shared by the receiver and transmitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UartParams {
    /// Clock cycles per serial bit, `round(clock / baud)`.
    pub bit_time: u64,
    /// Half of [`bit_time`](Self::bit_time), used to find the middle of the start bit.
    pub half_bit_time: u64,
    /// Data bits per frame, sent LSB first.
    pub data_bits: u8,
}

impl UartParams {
    /// Derives the bit timing for `baud` on a `clock` domain.
    pub fn new(clock: Frequency, baud: u32, data_bits: u8) -> Result<Self, ConfigError> {
        if !clock.is_valid_clock() {
            return Err(ConfigError::InvalidFrequency { hz: clock.hz() });
        }
        if baud == 0 || f64::from(baud) > clock.hz() {
            return Err(ConfigError::InvalidBaud {
                baud,
                clock_hz: clock.hz(),
            });
        }
        Self::from_bit_time(clock.cycles_per(f64::from(baud)), data_bits)
    }

    /// Uses an explicit bit time in cycles.
    pub fn from_bit_time(bit_time: u64, data_bits: u8) -> Result<Self, ConfigError> {
        if bit_time < MIN_BIT_TIME {
            return Err(ConfigError::BitTimeTooSmall { bit_time });
        }
        if !(1..=8).contains(&data_bits) {
            return Err(ConfigError::InvalidDataBits { data_bits });
        }
        Ok(Self {
            bit_time,
            half_bit_time: bit_time / 2,
            data_bits,
        })
    }

    /// Checks a parameter set that may have been built field by field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let derived = Self::from_bit_time(self.bit_time, self.data_bits)?;
        if derived.half_bit_time != self.half_bit_time {
            return Err(ConfigError::InconsistentBitTiming {
                bit_time: self.bit_time,
                half_bit_time: self.half_bit_time,
            });
        }
        Ok(())
    }

    /// Clock cycles one complete frame occupies on the line (start, data, stop).
    pub fn frame_cycles(&self) -> u64 {
        self.bit_time.saturating_mul(u64::from(self.data_bits) + 2)
    }
}

/// Inputs to the UART engine for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UartInputs {
    /// Level of the serial line the receiver listens to.
    pub rx_line: bool,
    /// Start command for the transmitter, carrying the byte to send.
    pub send: Option<u8>,
}

/// Outputs of the UART engine after one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UartOutputs {
    /// Transmit line level.
    pub tx_line: bool,
    /// Transmitter busy flag.
    pub tx_busy: bool,
    /// What the transmitter did with this tick's start command.
    pub tx_command: CommandStatus,
    /// Last byte received.
    pub rx_data: u8,
    /// Pulses for one step when `rx_data` is fresh.
    pub rx_ready: bool,
}

impl Default for UartOutputs {
    fn default() -> Self {
        Self {
            tx_line: true,
            tx_busy: false,
            tx_command: CommandStatus::None,
            rx_data: 0,
            rx_ready: false,
        }
    }
}

/// A full-duplex UART: one receiver and one transmitter sharing timing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UartEngine {
    rx: UartReceiver,
    tx: UartTransmitter,
}

impl UartEngine {
    /// Creates an engine with both machines idle.
    pub fn new(params: UartParams) -> Self {
        Self {
            rx: UartReceiver::new(params),
            tx: UartTransmitter::new(params),
        }
    }

    /// Returns both machines to idle.
    pub fn reset(&mut self) {
        self.rx.reset();
        self.tx.reset();
    }

    /// Evaluates one tick of both machines.
    pub fn step(&mut self, inputs: UartInputs, edge: Edge) -> UartOutputs {
        let rx = self.rx.step(inputs.rx_line, edge);
        let tx = self.tx.step(inputs.send, edge);
        UartOutputs {
            tx_line: tx.line,
            tx_busy: tx.busy,
            tx_command: tx.command,
            rx_data: rx.data,
            rx_ready: rx.ready,
        }
    }

    /// Current outputs without advancing.
    pub fn outputs(&self) -> UartOutputs {
        let rx = self.rx.output();
        let tx = self.tx.output();
        UartOutputs {
            tx_line: tx.line,
            tx_busy: tx.busy,
            tx_command: CommandStatus::None,
            rx_data: rx.data,
            rx_ready: rx.ready,
        }
    }

    /// The receiver.
    pub fn rx(&self) -> &UartReceiver {
        &self.rx
    }

    /// The transmitter.
    pub fn tx(&self) -> &UartTransmitter {
        &self.tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_time_at_50mhz_115200() {
        let p = UartParams::new(Frequency::new(50_000_000.0), 115_200, 8).unwrap();
        assert_eq!(p.bit_time, 434);
        assert_eq!(p.half_bit_time, 217);
        assert_eq!(p.frame_cycles(), 4340);
    }

    #[test]
    fn rejects_bad_baud() {
        let clk = Frequency::new(1_000_000.0);
        assert!(matches!(
            UartParams::new(clk, 0, 8),
            Err(ConfigError::InvalidBaud { baud: 0, .. })
        ));
        assert!(matches!(
            UartParams::new(clk, 2_000_000, 8),
            Err(ConfigError::InvalidBaud { .. })
        ));
    }

    #[test]
    fn rejects_short_bit_time() {
        let err = UartParams::new(Frequency::new(1_000_000.0), 250_000, 8).unwrap_err();
        assert_eq!(err, ConfigError::BitTimeTooSmall { bit_time: 4 });
    }

    #[test]
    fn rejects_data_bits_out_of_range() {
        for bits in [0, 9] {
            let err = UartParams::from_bit_time(16, bits).unwrap_err();
            assert_eq!(err, ConfigError::InvalidDataBits { data_bits: bits });
        }
    }

    #[test]
    fn validate_catches_hand_built_timing() {
        let good = UartParams::from_bit_time(16, 8).unwrap();
        assert_eq!(good.validate(), Ok(()));

        let zero_half = UartParams {
            half_bit_time: 0,
            ..good
        };
        assert_eq!(
            zero_half.validate(),
            Err(ConfigError::InconsistentBitTiming {
                bit_time: 16,
                half_bit_time: 0
            })
        );

        let short = UartParams {
            bit_time: 2,
            half_bit_time: 1,
            data_bits: 8,
        };
        assert_eq!(
            short.validate(),
            Err(ConfigError::BitTimeTooSmall { bit_time: 2 })
        );
    }

    #[test]
    fn engine_full_duplex_loopback() {
        let params = UartParams::from_bit_time(16, 8).unwrap();
        let mut engine = UartEngine::new(params);
        let mut line = true;
        let mut received = Vec::new();
        let mut sent = false;
        for _ in 0..2 * 16 * 12 {
            let send = if sent { None } else { Some(0x3C) };
            for edge in [Edge::Rising, Edge::Falling] {
                let out = engine.step(UartInputs { rx_line: line, send }, edge);
                if out.tx_command == CommandStatus::Accepted {
                    sent = true;
                }
                if edge.is_rising() && out.rx_ready {
                    received.push(out.rx_data);
                }
                line = out.tx_line;
            }
        }
        assert_eq!(received, vec![0x3C]);
    }
}
