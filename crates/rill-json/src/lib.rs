//! rill-json - the built-in JSON reader/writer (§4.5).
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! Parses JSON text into a `Value` and serializes a `Value` back to JSON,
//! hand-rolled as a small recursive-descent parser over a UTF-8 byte buffer
//! rather than built on a general-purpose serialization crate — the only
//! target type is this toolchain's own `Value`, and the language only needs
//! this one format, so there is no schema/derive machinery to gain from
//! pulling in a larger dependency.
//!
//! Objects and arrays both land as `Collection`: an array's entries get
//! synthetic `"0"`, `"1"`, ... keys, since the runtime has no separate array
//! type. A malformed document's one-line diagnostic is meant to be folded
//! into the `json_parse` built-in's error return value by the VM, not
//! surfaced as a Rust panic or silent default.

mod error;
mod parse;
mod serialize;

pub use error::{JsonError, JsonErrorKind};
pub use parse::parse;
pub use serialize::serialize;

use rill_value::Value;

/// Parse `input`, or produce the error `Value` the built-in returns when the
/// document is malformed (§4.5): a string holding the one-line diagnostic.
pub fn parse_or_error_value(input: &str) -> Value {
    match parse(input) {
        Ok(value) => value,
        Err(err) => Value::String(err.diagnostic()),
    }
}
