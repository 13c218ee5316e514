//! Shared foundational types used across the strobe simulator.
//!
//! This crate provides clock frequency values with unit parsing and the
//! reset polarity tokens shared by the simulation core and the
//! configuration loader.

#![warn(missing_docs)]

pub mod frequency;
pub mod polarity;

pub use frequency::{Frequency, ParseFrequencyError};
pub use polarity::{ParsePolarityError, Polarity};
