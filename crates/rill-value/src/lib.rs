//! rill-value - the runtime value model
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! Every value the language's lexer, parser and VM pass around is a `Value`:
//! a small tagged union of scalars plus one recursive container, `Collection`,
//! an ordered string-keyed map. There is no separate "array" type — arrays
//! are collections whose keys happen to be `"0"`, `"1"`, `"2"`, ...
//!
//! This crate is deliberately inert: it has no notion of variables, scope,
//! or bytecode. It answers exactly two questions - "what tag does this carry"
//! and "what happens when I apply this operator to these two values" - and
//! leaves everything else (symbol tables, address cells, instructions) to
//! the crates built on top of it.
//!
//! # Layout
//!
//! - [`tag`]: the `Tag` enum identifying a `Value`'s payload kind.
//! - [`collection`]: the ordered `Collection` map and its default-fill rules.
//! - [`value`]: the `Value` enum itself.
//! - [`coerce`]: `convert(value, target_tag)`, the single coercion funnel.
//! - [`ops`]: binary and unary operator evaluation, including the
//!   collection broadcast rules.

pub mod coerce;
pub mod collection;
pub mod ops;
pub mod tag;
pub mod value;

pub use coerce::convert;
pub use collection::Collection;
pub use ops::{BinOp, UnOp, ValueError};
pub use tag::Tag;
pub use value::Value;
