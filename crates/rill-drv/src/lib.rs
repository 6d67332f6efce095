//! rill-drv - the command-line front end: lex, parse, and run `.rl` scripts
//! (§6.4).
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! [`run`] is the crate's one entry point: parse `argv` into a [`Config`],
//! hand it to a [`Session`], and turn whatever comes back into a process
//! [`ExitCode`]. Everything else — tokenizing, emitting bytecode, driving the
//! VM — is delegated straight to `rill-lex`, `rill-par`, and `rill-vm`; this
//! crate's own job is strictly the flags, the phase-by-phase printing they
//! ask for, and mapping failures onto exit status.

mod config;
mod error;
mod session;

pub use config::{Config, RunMode, TimingDisplay};
pub use error::{DrvError, ExitCode, Result};
pub use session::Session;

/// Parse `std::env::args()`, run the session it describes, and return the
/// exit code `main` should hand to the process.
pub fn run() -> ExitCode {
    init_logging();

    let outcome = Config::from_args(std::env::args()).and_then(|config| Session::new(config).run());

    match outcome {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            eprintln!("rill: {err}");
            ExitCode::from(&err)
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_input_maps_to_the_no_inputs_exit_code() {
        let err = Config::from_args(["rill"]).unwrap_err();
        assert_eq!(ExitCode::from(&err), ExitCode::NoInputs);
    }

    #[test]
    fn bad_flag_maps_to_the_bad_arguments_exit_code() {
        let err = Config::from_args(["rill", "-d9", "script.rl"]).unwrap_err();
        assert_eq!(ExitCode::from(&err), ExitCode::BadArguments);
    }
}
