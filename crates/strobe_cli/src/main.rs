//! Strobe CLI: the command-line interface for the strobe simulator.
//!
//! Provides `strobe init` for project scaffolding, `strobe check` for
//! validating `strobe.toml` and printing the derived timing, and
//! `strobe run` for driving a testbench scenario to completion.

#![warn(missing_docs)]

mod check;
mod init;
mod pipeline;
mod run;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Strobe: a cycle-accurate simulator for FPGA support logic.
#[derive(Parser, Debug)]
#[command(name = "strobe", version, about = "Strobe RTL behavior simulator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `strobe.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new strobe project.
    Init {
        /// Project name (creates a subdirectory). If omitted, initializes in
        /// the current directory.
        name: Option<String>,

        /// System clock frequency for the generated configuration.
        #[arg(long, default_value = "50MHz")]
        clock: String,
    },
    /// Validate the configuration and print derived parameters.
    Check,
    /// Run a testbench scenario.
    Run(RunArgs),
}

/// Arguments for the `strobe run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenario to run.
    #[arg(value_enum)]
    pub scenario: ScenarioKind,

    /// Comma-separated hex bytes for the UART scenarios (e.g., `A5,00`).
    #[arg(long, value_delimiter = ',', value_parser = run::parse_hex_byte)]
    pub bytes: Vec<u8>,

    /// Watchdog budget in clock cycles, overriding `harness.watchdog_cycles`.
    #[arg(long)]
    pub budget: Option<u64>,

    /// LED counter increments to wait for in `blinky`.
    #[arg(long, default_value_t = 2)]
    pub increments: u64,

    /// Seed for the button bounce pattern in `debounce`.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Button chatter in milliseconds for `debounce`.
    #[arg(long, default_value_t = 2)]
    pub bounce_ms: u64,

    /// Output format for the run report.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Testbench scenarios selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScenarioKind {
    /// Reset release latency through the synchronizers.
    ResetRelease,
    /// Bouncing button press through the debounce filter.
    Debounce,
    /// Bytes sent through the transmitter and looped back into the receiver.
    UartLoopback,
    /// Back-to-back bytes decoded by an external line monitor.
    UartStream,
    /// LED counter increments.
    Blinky,
}

/// Run report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Init { name, clock } => init::run(name, &clock, &global),
        Command::Check => check::run(&global),
        Command::Run(ref args) => run::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the logger. `RUST_LOG` wins over the verbosity flags.
fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_init_default() {
        let cli = Cli::parse_from(["strobe", "init"]);
        match cli.command {
            Command::Init { name, clock } => {
                assert!(name.is_none());
                assert_eq!(clock, "50MHz");
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn parse_init_with_args() {
        let cli = Cli::parse_from(["strobe", "init", "blinky", "--clock", "12MHz"]);
        match cli.command {
            Command::Init { name, clock } => {
                assert_eq!(name.as_deref(), Some("blinky"));
                assert_eq!(clock, "12MHz");
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn parse_check() {
        let cli = Cli::parse_from(["strobe", "check"]);
        assert!(matches!(cli.command, Command::Check));
    }

    #[test]
    fn parse_run_default() {
        let cli = Cli::parse_from(["strobe", "run", "reset-release"]);
        match cli.command {
            Command::Run(ref args) => {
                assert_eq!(args.scenario, ScenarioKind::ResetRelease);
                assert!(args.bytes.is_empty());
                assert!(args.budget.is_none());
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn parse_run_with_args() {
        let cli = Cli::parse_from([
            "strobe",
            "run",
            "uart-loopback",
            "--bytes",
            "A5,00,ff",
            "--budget",
            "100000",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Run(ref args) => {
                assert_eq!(args.scenario, ScenarioKind::UartLoopback);
                assert_eq!(args.bytes, vec![0xA5, 0x00, 0xFF]);
                assert_eq!(args.budget, Some(100_000));
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn parse_run_rejects_bad_byte() {
        let result = Cli::try_parse_from(["strobe", "run", "uart-stream", "--bytes", "1FF"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_run_rejects_unknown_scenario() {
        assert!(Cli::try_parse_from(["strobe", "run", "warp-drive"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["strobe", "--quiet", "check"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_verbose_flag() {
        let cli = Cli::parse_from(["strobe", "--verbose", "init"]);
        assert!(cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn parse_config_flag() {
        let cli = Cli::parse_from(["strobe", "--config", "/tmp/board.toml", "check"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/board.toml"));
    }

    #[test]
    fn parse_global_flag_after_subcommand() {
        let cli = Cli::parse_from(["strobe", "run", "blinky", "--verbose"]);
        assert!(cli.verbose);
    }
}
