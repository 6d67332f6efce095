//! Command-line surface (§6.4).
//!
//! The flags are deliberately terse single letters with a numeric level
//! rather than `clap` subcommands — this front-end has one job (lex, parse,
//! optionally run, and report what happened along the way) and every flag
//! just dials how much of that pipeline gets shown.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{DrvError, Result};

#[derive(Parser, Debug)]
#[command(name = "rill")]
#[command(version, about = "Lex, parse, and run rill scripts", long_about = None)]
struct Cli {
    /// Timing display: 0 off, 1 seconds, 2 milliseconds.
    #[arg(short = 'd', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    timing: u8,

    /// Show the lexer's token list.
    #[arg(short = 'l', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    show_tokens: u8,

    /// Show parser output: 1 instructions, 2 + expression queue.
    #[arg(short = 'p', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    show_parsed: u8,

    /// Run mode: 0 run, 1 lex-and-parse only, 2 lex only.
    #[arg(short = 'r', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    run_mode: u8,

    /// VM trace: 0 off, 1 on.
    #[arg(short = 't', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    vm_trace: u8,

    /// Warnings: 0 ignore, 1 info, 2 all, 3 as errors.
    #[arg(short = 'w', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    warnings: u8,

    /// Script to lex/parse/run.
    input: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    Run,
    LexAndParseOnly,
    LexOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimingDisplay {
    Off,
    Seconds,
    Millis,
}

/// A resolved, validated set of front-end options.
#[derive(Clone, Debug)]
pub struct Config {
    pub input: PathBuf,
    pub timing: TimingDisplay,
    pub show_tokens: bool,
    pub show_parsed_queue: bool,
    pub show_parsed: bool,
    pub run_mode: RunMode,
    pub vm_trace: bool,
    pub warnings_as_errors: bool,
    pub warnings_shown: bool,
}

impl Config {
    /// Parse `argv`, validating the input path is present. `argv[0]` is the
    /// program name, matching `std::env::args()`.
    pub fn from_args<I, T>(argv: I) -> Result<Config>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(argv).map_err(|e| DrvError::BadArguments(e.to_string()))?;
        let input = cli.input.ok_or(DrvError::NoInput)?;

        Ok(Config {
            input,
            timing: match cli.timing {
                0 => TimingDisplay::Off,
                1 => TimingDisplay::Seconds,
                _ => TimingDisplay::Millis,
            },
            show_tokens: cli.show_tokens == 1,
            show_parsed: cli.show_parsed >= 1,
            show_parsed_queue: cli.show_parsed >= 2,
            run_mode: match cli.run_mode {
                0 => RunMode::Run,
                1 => RunMode::LexAndParseOnly,
                _ => RunMode::LexOnly,
            },
            vm_trace: cli.vm_trace == 1,
            warnings_as_errors: cli.warnings == 3,
            warnings_shown: cli.warnings >= 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_run_mode_with_everything_off() {
        let config = Config::from_args(["rill", "script.rl"]).unwrap();
        assert_eq!(config.run_mode, RunMode::Run);
        assert!(!config.show_tokens);
        assert!(!config.vm_trace);
        assert_eq!(config.timing, TimingDisplay::Off);
    }

    #[test]
    fn missing_input_is_a_no_input_error() {
        let err = Config::from_args(["rill"]).unwrap_err();
        assert!(matches!(err, DrvError::NoInput));
    }

    #[test]
    fn parses_every_flag() {
        let config = Config::from_args([
            "rill", "-d2", "-l1", "-p2", "-r1", "-t1", "-w3", "script.rl",
        ])
        .unwrap();
        assert_eq!(config.timing, TimingDisplay::Millis);
        assert!(config.show_tokens);
        assert!(config.show_parsed_queue);
        assert_eq!(config.run_mode, RunMode::LexAndParseOnly);
        assert!(config.vm_trace);
        assert!(config.warnings_as_errors);
    }

    #[test]
    fn rejects_an_out_of_range_level() {
        assert!(Config::from_args(["rill", "-d9", "script.rl"]).is_err());
    }
}
