//! rill-util - shared foundation types for the rill toolchain
//!
//! This crate holds the pieces that the lexer, parser, bytecode crate, VM,
//! JSON codec and driver all need but that have nothing to do with any one
//! of them: interned strings (`Symbol`), source locations (`Span`,
//! `SourceMap`), and a diagnostic `Handler` for collecting errors/warnings
//! without aborting a pass early.
//!
//! None of these types know anything about the scripting language itself —
//! they are the zero-cost scaffolding a compiler reaches for first.

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use error::{DiagnosticError, IndexVecError, SourceMapError, SymbolError, SymbolResult};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;

pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
