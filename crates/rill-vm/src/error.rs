//! Runtime failure modes (§7, the "Run" row).
//!
//! Every variant here is fatal: the VM has no try/catch, so any of these
//! either unwind straight out of [`crate::Vm::run`] or, if an error hook is
//! installed (§4.6), get handed to it first.

use rill_value::ValueError;

#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error("value error: {0}")]
    Value(#[from] ValueError),
    #[error("stack underflow")]
    StackUnderflow,
    #[error("read from undeclared global slot {0}")]
    UndefinedGlobal(usize),
    #[error("read from undeclared local slot {0}")]
    UndefinedLocal(usize),
    #[error("no active call frame")]
    NoActiveFrame,
    #[error("element access `{0}` does not exist on a non-collection value")]
    NotACollection(String),
    #[error("unknown built-in function id {0}")]
    UnknownBuiltin(usize),
    #[error("program counter {0} is out of bounds")]
    ProgramCounterOutOfBounds(usize),
    #[error("call stack exceeded the maximum depth of {0}")]
    CallStackOverflow(usize),
    #[error("`return` used outside of a function call")]
    ReturnOutsideCall,
    #[error("{0}")]
    Builtin(String),
}

pub type VmResult<T> = Result<T, VmError>;
