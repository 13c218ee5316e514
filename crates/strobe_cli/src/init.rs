//! `strobe init`: project scaffolding command.
//!
//! Writes a `strobe.toml` with every section spelled out at its default so
//! the board settings are easy to find and edit.

use std::fs;
use std::path::{Path, PathBuf};

use strobe_common::Frequency;
use strobe_config::CONFIG_FILE;

use crate::GlobalArgs;

/// Runs the `strobe init` command.
///
/// If `name` is `Some`, creates a new subdirectory with that name.
/// Otherwise initializes in the current working directory.
/// Returns exit code 0 on success.
pub fn run(
    name: Option<String>,
    clock: &str,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let frequency: Frequency = clock.parse()?;
    if !frequency.is_valid_clock() {
        return Err(format!("clock frequency must be positive, got '{clock}'").into());
    }

    let project_dir = match &name {
        Some(n) => {
            let dir = PathBuf::from(n);
            if dir.exists() {
                return Err(format!("directory '{n}' already exists").into());
            }
            fs::create_dir_all(&dir)?;
            dir
        }
        None => std::env::current_dir()?,
    };

    let config_path = project_dir.join(CONFIG_FILE);
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()).into());
    }

    let project_name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("strobe_project");

    if !global.quiet {
        eprintln!("  Creating new strobe project `{project_name}`");
    }

    write_strobe_toml(&project_dir, frequency)?;

    if !global.quiet {
        eprintln!("     Created {}", config_path.display());
    }

    Ok(0)
}

/// Writes the default configuration for a board clocked at `frequency`.
fn write_strobe_toml(root: &Path, frequency: Frequency) -> std::io::Result<()> {
    fs::write(root.join(CONFIG_FILE), default_config(frequency))
}

/// Renders the default `strobe.toml` contents.
fn default_config(frequency: Frequency) -> String {
    format!(
        r#"[clock]
frequency = "{frequency}"

[reset]
polarity = "active_low"
stages = 2

[debounce]
time_ms = 10
idle_level = false

[uart]
baud = 115200
data_bits = 8
loopback = true

[counter]
width = 8
prescale_bits = 22

[harness]
watchdog_cycles = 5000000
"#
    )
}
