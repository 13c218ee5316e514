//! `strobe run`: scenario execution command.
//!
//! Loads the project configuration, builds the selected scenario, runs it
//! under the watchdog, and prints the report as text or JSON.

use log::info;
use strobe_sim::{Scenario, ScenarioReport, SimError, SystemParams};

use crate::pipeline;
use crate::{GlobalArgs, ReportFormat, RunArgs, ScenarioKind};

/// Bytes sent by `uart-loopback` when `--bytes` is not given.
const DEFAULT_LOOPBACK_BYTES: &[u8] = &[0xA5];

/// Bytes sent by `uart-stream` when `--bytes` is not given.
const DEFAULT_STREAM_BYTES: &[u8] = &[0x00, 0xFF];

/// Runs the `strobe run` command.
///
/// Returns exit code 0 when the scenario passes and 1 when it fails an
/// expectation or the watchdog expires.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (path, mut params) = pipeline::load_params(global)?;
    if let Some(budget) = args.budget {
        if budget == 0 {
            return Err("--budget must be positive".into());
        }
        info!("watchdog budget overridden to {budget} cycles");
        params.watchdog_cycles = budget;
    }

    let scenario = build_scenario(args, &params)?;
    let name = scenario.name();

    if !global.quiet {
        eprintln!("     Running {name} ({})", path.display());
    }
    if global.verbose {
        eprintln!(
            "    Watchdog {} cycles at {}",
            params.watchdog_cycles, params.clock
        );
    }

    match scenario.run(&params) {
        Ok(report) => {
            print_report(&report, args.format)?;
            if !global.quiet {
                eprintln!("   PASS  {name} ({})", report.elapsed());
            }
            Ok(0)
        }
        Err(SimError::Config(e)) => Err(e.into()),
        Err(e) => {
            if args.format == ReportFormat::Json {
                let failure = serde_json::json!({
                    "scenario": name,
                    "passed": false,
                    "error": e.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&failure)?);
            }
            eprintln!("   FAIL  {name}: {e}");
            Ok(1)
        }
    }
}

/// Parses one byte of a `--bytes` list, with or without a `0x` prefix.
pub fn parse_hex_byte(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() || digits.len() > 2 {
        return Err(format!("'{s}' is not a hex byte"));
    }
    u8::from_str_radix(digits, 16).map_err(|_| format!("'{s}' is not a hex byte"))
}

/// Maps command-line arguments onto a scenario.
fn build_scenario(
    args: &RunArgs,
    params: &SystemParams,
) -> Result<Scenario, Box<dyn std::error::Error>> {
    let bytes_or = |default: &[u8]| {
        if args.bytes.is_empty() {
            default.to_vec()
        } else {
            args.bytes.clone()
        }
    };
    let scenario = match args.scenario {
        ScenarioKind::ResetRelease => Scenario::ResetRelease,
        ScenarioKind::Debounce => Scenario::Debounce {
            seed: args.seed,
            bounce_cycles: params
                .clock
                .cycles_in_ms(args.bounce_ms)
                .ok_or_else(|| format!("--bounce-ms {} is too long", args.bounce_ms))?,
        },
        ScenarioKind::UartLoopback => Scenario::UartLoopback {
            bytes: bytes_or(DEFAULT_LOOPBACK_BYTES),
        },
        ScenarioKind::UartStream => Scenario::UartStream {
            bytes: bytes_or(DEFAULT_STREAM_BYTES),
        },
        ScenarioKind::Blinky => Scenario::Blinky {
            increments: args.increments,
        },
    };
    Ok(scenario)
}

fn print_report(
    report: &ScenarioReport,
    format: ReportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        ReportFormat::Text => println!("{report}"),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use strobe_config::CONFIG_FILE;
    use tempfile::TempDir;

    use crate::{Cli, Command};

    fn run_args(argv: &[&str]) -> RunArgs {
        match Cli::parse_from(argv).command {
            Command::Run(args) => args,
            _ => panic!("expected Run command"),
        }
    }

    fn project(toml: &str) -> (TempDir, GlobalArgs) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), toml).unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(tmp.path().to_str().unwrap().to_string()),
        };
        (tmp, global)
    }

    const FAST_BOARD: &str = r#"
[clock]
frequency = "1MHz"

[debounce]
time_ms = 1

[uart]
baud = 62500

[counter]
width = 4
prescale_bits = 4

[harness]
watchdog_cycles = 100000
"#;

    #[test]
    fn parse_hex_bytes() {
        assert_eq!(parse_hex_byte("A5"), Ok(0xA5));
        assert_eq!(parse_hex_byte("0xff"), Ok(0xFF));
        assert_eq!(parse_hex_byte("0"), Ok(0x00));
        assert!(parse_hex_byte("").is_err());
        assert!(parse_hex_byte("100").is_err());
        assert!(parse_hex_byte("zz").is_err());
    }

    #[test]
    fn default_bytes_per_scenario() {
        let params = SystemParams::new("50MHz".parse().unwrap(), 115_200).unwrap();
        let loopback =
            build_scenario(&run_args(&["strobe", "run", "uart-loopback"]), &params).unwrap();
        assert_eq!(
            loopback,
            Scenario::UartLoopback { bytes: vec![0xA5] }
        );
        let stream =
            build_scenario(&run_args(&["strobe", "run", "uart-stream"]), &params).unwrap();
        assert_eq!(
            stream,
            Scenario::UartStream {
                bytes: vec![0x00, 0xFF]
            }
        );
    }

    #[test]
    fn debounce_bounce_in_cycles() {
        let params = SystemParams::new("50MHz".parse().unwrap(), 115_200).unwrap();
        let args = run_args(&["strobe", "run", "debounce", "--bounce-ms", "3", "--seed", "9"]);
        assert_eq!(
            build_scenario(&args, &params).unwrap(),
            Scenario::Debounce {
                seed: 9,
                bounce_cycles: 150_000
            }
        );
    }

    #[test]
    fn oversized_bounce_is_an_error() {
        let params = SystemParams::new("50MHz".parse().unwrap(), 115_200).unwrap();
        let args = run_args(&[
            "strobe",
            "run",
            "debounce",
            "--bounce-ms",
            "18446744073709551615",
        ]);
        let err = build_scenario(&args, &params).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn maximum_budget_runs_to_completion() {
        let (_tmp, global) = project(FAST_BOARD);
        let args = run_args(&[
            "strobe",
            "run",
            "reset-release",
            "--budget",
            "18446744073709551615",
        ]);
        assert_eq!(run(&args, &global).unwrap(), 0);
    }

    #[test]
    fn passing_scenarios_exit_zero() {
        let (_tmp, global) = project(FAST_BOARD);
        for argv in [
            &["strobe", "run", "reset-release"][..],
            &["strobe", "run", "uart-loopback", "--bytes", "A5,3C"][..],
            &["strobe", "run", "uart-stream", "--format", "json"][..],
            &["strobe", "run", "blinky", "--increments", "3"][..],
        ] {
            assert_eq!(run(&run_args(argv), &global).unwrap(), 0, "{argv:?}");
        }
    }

    #[test]
    fn watchdog_expiry_exits_one() {
        let (_tmp, global) = project(FAST_BOARD);
        let args = run_args(&["strobe", "run", "blinky", "--increments", "50", "--budget", "100"]);
        assert_eq!(run(&args, &global).unwrap(), 1);
    }

    #[test]
    fn zero_budget_is_an_error() {
        let (_tmp, global) = project(FAST_BOARD);
        let args = run_args(&["strobe", "run", "reset-release", "--budget", "0"]);
        assert!(run(&args, &global).is_err());
    }
}
