//! Asynchronous-assert, synchronous-deassert reset synchronizer.
//!
//! A shift register of `N` flip-flops whose asynchronous set/clear is tied
//! to the raw reset. Assertion reaches the output in the same evaluation;
//! release has to ripple through every stage, one rising edge per stage.

use log::{debug, trace};
use strobe_common::Polarity;

use crate::error::ConfigError;
use crate::time::Edge;

/// Parameters of a [`ResetSynchronizer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetSyncParams {
    /// Which raw level asserts reset. The synchronized output uses the same convention.
    pub polarity: Polarity,
    /// Number of flip-flop stages (at least 2).
    pub stages: usize,
}

impl ResetSyncParams {
    /// Builds parameters from a polarity token such as `"ACTIVE_LOW"`.
    ///
    /// Unknown tokens are rejected instead of degrading to a pass-through.
    pub fn from_token(polarity: &str, stages: usize) -> Result<Self, ConfigError> {
        let params = Self {
            polarity: polarity.parse()?,
            stages,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks the stage count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stages < 2 {
            return Err(ConfigError::TooFewStages {
                stages: self.stages,
            });
        }
        Ok(())
    }
}

impl Default for ResetSyncParams {
    fn default() -> Self {
        Self {
            polarity: Polarity::ActiveLow,
            stages: 2,
        }
    }
}

/// A multi-stage reset synchronizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResetSynchronizer {
    polarity: Polarity,
    /// Stage levels; index 0 samples first, the last stage drives the output.
    stages: Vec<bool>,
}

impl ResetSynchronizer {
    /// Creates a synchronizer that powers up asserted.
    pub fn new(params: ResetSyncParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            polarity: params.polarity,
            stages: vec![params.polarity.asserted(); params.stages],
        })
    }

    /// Evaluates one tick and returns the synchronized reset level.
    ///
    /// `raw` is the unsynchronized reset level; both `raw` and the returned
    /// level follow the configured polarity.
    pub fn step(&mut self, raw: bool, edge: Edge) -> bool {
        let asserted = self.polarity.asserted();

        // Asynchronous path: independent of the clock edge.
        if self.polarity.is_asserted(raw) {
            if !self.is_asserted() {
                debug!("reset asserted asynchronously");
            }
            self.stages.fill(asserted);
            return self.output();
        }

        if edge.is_rising() {
            let was_asserted = self.is_asserted();
            self.stages.rotate_right(1);
            self.stages[0] = !asserted;
            trace!("reset synchronizer stages {:?}", self.stages);
            if was_asserted && !self.is_asserted() {
                debug!("reset released after {} stages", self.stages.len());
            }
        }
        self.output()
    }

    /// The synchronized reset level (the last stage).
    pub fn output(&self) -> bool {
        self.stages[self.stages.len() - 1]
    }

    /// Returns `true` while the synchronized reset is asserted.
    pub fn is_asserted(&self) -> bool {
        self.polarity.is_asserted(self.output())
    }

    /// The configured polarity.
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Current stage levels, first stage first.
    pub fn stages(&self) -> &[bool] {
        &self.stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync(polarity: Polarity, stages: usize) -> ResetSynchronizer {
        ResetSynchronizer::new(ResetSyncParams { polarity, stages }).unwrap()
    }

    /// Drives one full clock period (rising then falling) with a constant raw level.
    fn period(s: &mut ResetSynchronizer, raw: bool) -> bool {
        s.step(raw, Edge::Rising);
        s.step(raw, Edge::Falling)
    }

    #[test]
    fn rejects_single_stage() {
        let err = ResetSynchronizer::new(ResetSyncParams {
            polarity: Polarity::ActiveHigh,
            stages: 1,
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::TooFewStages { stages: 1 });
    }

    #[test]
    fn rejects_unknown_polarity_token() {
        let err = ResetSyncParams::from_token("ACTIVE_SIDEWAYS", 2).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPolarity(_)));
    }

    #[test]
    fn token_constructor() {
        let p = ResetSyncParams::from_token("ACTIVE_HIGH", 3).unwrap();
        assert_eq!(p.polarity, Polarity::ActiveHigh);
        assert_eq!(p.stages, 3);
    }

    #[test]
    fn powers_up_asserted() {
        let s = sync(Polarity::ActiveLow, 2);
        assert!(s.is_asserted());
        assert!(!s.output());
    }

    #[test]
    fn release_takes_n_rising_edges() {
        for n in 2..=5 {
            let mut s = sync(Polarity::ActiveHigh, n);
            for edge in 1..n {
                assert!(period(&mut s, false), "released early at edge {edge} of {n}");
            }
            assert!(!s.step(false, Edge::Rising), "not released at edge {n}");
        }
    }

    #[test]
    fn falling_edge_does_not_shift() {
        let mut s = sync(Polarity::ActiveHigh, 2);
        for _ in 0..10 {
            s.step(false, Edge::Falling);
        }
        assert!(s.is_asserted());
        assert_eq!(s.stages(), &[true, true]);
    }

    #[test]
    fn assert_is_immediate_on_any_edge() {
        for polarity in [Polarity::ActiveHigh, Polarity::ActiveLow] {
            for edge in [Edge::Rising, Edge::Falling] {
                let mut s = sync(polarity, 3);
                for _ in 0..3 {
                    period(&mut s, polarity.deasserted());
                }
                assert!(!s.is_asserted());
                let out = s.step(polarity.asserted(), edge);
                assert_eq!(out, polarity.asserted());
                assert!(s.stages().iter().all(|&v| v == polarity.asserted()));
            }
        }
    }

    #[test]
    fn reassert_mid_release_restarts_count() {
        let mut s = sync(Polarity::ActiveLow, 3);
        period(&mut s, true);
        period(&mut s, true);
        s.step(false, Edge::Falling);
        assert!(s.is_asserted());
        for _ in 0..2 {
            period(&mut s, true);
        }
        assert!(s.is_asserted());
        period(&mut s, true);
        assert!(!s.is_asserted());
    }

    #[test]
    fn held_reset_is_fixed_point() {
        let mut s = sync(Polarity::ActiveLow, 4);
        let before = s.clone();
        for _ in 0..20 {
            period(&mut s, false);
        }
        assert_eq!(s, before);
    }
}
