//! Parsing and validation of `strobe.toml` project configuration files.
//!
//! This crate reads the project configuration file, produces a strongly-typed
//! [`StrobeConfig`], and resolves it into the [`strobe_sim::SystemParams`]
//! the simulator is built from.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::resolve;
pub use types::*;
