//! Driver-level errors and the exit codes they map to (§6.4).

use thiserror::Error;

/// Everything that can stop a run before the VM reaches `END`.
#[derive(Error, Debug)]
pub enum DrvError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{} lexical error(s)", .0.len())]
    Lex(Vec<rill_lex::LexError>),

    #[error("{} parse error(s)", .0.len())]
    Parse(Vec<rill_par::ParseError>),

    #[error("runtime error: {0}")]
    Vm(#[from] rill_vm::VmError),

    #[error("no input file given")]
    NoInput,

    #[error("{0}")]
    BadArguments(String),
}

pub type Result<T> = std::result::Result<T, DrvError>;

/// Process exit codes (§6.4): `0` success, `-1` bad arguments, `-2` no
/// inputs, `-3` compile or run error. Rust has no signed exit status, so
/// these are cast down to the platform's `u8` the same way any negative
/// `std::process::exit` argument would be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    BadArguments = -1,
    NoInputs = -2,
    CompileOrRunError = -3,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<&DrvError> for ExitCode {
    fn from(err: &DrvError) -> Self {
        match err {
            DrvError::NoInput => ExitCode::NoInputs,
            DrvError::BadArguments(_) => ExitCode::BadArguments,
            DrvError::Io(_) => ExitCode::CompileOrRunError,
            DrvError::Lex(_) | DrvError::Parse(_) | DrvError::Vm(_) => ExitCode::CompileOrRunError,
        }
    }
}
