//! Stimulus generators modelling testbench drive logic.
//!
//! Each generator produces one raw level per clock cycle. They sit outside
//! the simulated design: the harness feeds their levels in as inputs.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::uart::UartParams;

/// Drives an 8-N-1 waveform for a queue of bytes, one level per cycle.
///
/// Independent of the transmitter state machine, so it can check the
/// receiver against a reference waveform.
#[derive(Clone, Debug)]
pub struct SerialDriver {
    params: UartParams,
    gap_cycles: u64,
    pending: VecDeque<bool>,
}

impl SerialDriver {
    /// Creates a driver with the line idle and `gap_cycles` of idle line
    /// between frames.
    pub fn new(params: UartParams, gap_cycles: u64) -> Self {
        Self {
            params,
            gap_cycles,
            pending: VecDeque::new(),
        }
    }

    /// Queues a frame for `byte`.
    pub fn push(&mut self, byte: u8) {
        let bit = self.params.bit_time as usize;
        let mut levels = Vec::with_capacity(usize::from(self.params.data_bits) + 2);
        levels.push(false);
        levels.extend((0..self.params.data_bits).map(|i| (byte >> i) & 1 == 1));
        levels.push(true);
        for level in levels {
            self.pending.extend(std::iter::repeat_n(level, bit));
        }
        self.pending
            .extend(std::iter::repeat_n(true, self.gap_cycles as usize));
    }

    /// Line level for the next cycle. The line idles high.
    pub fn next_level(&mut self) -> bool {
        self.pending.pop_front().unwrap_or(true)
    }

    /// Returns `true` once every queued frame has been driven.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

/// A push button with contact bounce.
///
/// After each transition the level chatters pseudo-randomly for the bounce
/// window, then settles. The same seed always produces the same waveform.
#[derive(Clone, Debug)]
pub struct BounceGenerator {
    rng: StdRng,
    level: bool,
    settled: bool,
    bounce_left: u64,
}

impl BounceGenerator {
    /// Creates a settled button at `level`.
    pub fn new(seed: u64, level: bool) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            level,
            settled: level,
            bounce_left: 0,
        }
    }

    /// Moves the button to `level`, chattering for `bounce_cycles` first.
    pub fn press(&mut self, level: bool, bounce_cycles: u64) {
        self.settled = level;
        self.bounce_left = bounce_cycles;
    }

    /// Raw contact level for the next cycle.
    pub fn next_level(&mut self) -> bool {
        if self.bounce_left > 0 {
            self.bounce_left -= 1;
            self.level = self.rng.gen_bool(0.5);
        } else {
            self.level = self.settled;
        }
        self.level
    }

    /// The level the button will settle at.
    pub fn settled_level(&self) -> bool {
        self.settled
    }

    /// Returns `true` while the contacts are still chattering.
    pub fn is_bouncing(&self) -> bool {
        self.bounce_left > 0
    }
}
