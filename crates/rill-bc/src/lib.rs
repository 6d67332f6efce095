//! rill-bc - the bytecode shared between the parser, the VM, and the
//! on-disk program/symbol file formats.
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! A rill program is a single flat `Vec<Instruction>`: no basic blocks, no
//! control-flow graph, just instructions addressed by index with jump targets
//! baked in as instruction indices. This crate owns that shape — the opcode
//! set, the instruction record, address cells, and the serialized forms —
//! so that `rill-par` (which produces programs) and `rill-vm` (which runs
//! them) share one definition instead of each growing its own.
//!
//! # Layout
//!
//! - [`opcode`]: the stable, numbered `Opcode` enum (§6.1).
//! - [`address`]: `Address`, the resolved-location cell pushed by `PVA`/`PCV`
//!   and consumed by the assignment opcodes.
//! - [`instruction`]: the `Instruction` record and `CaseArm` for jump tables.
//! - [`program_format`]: the §6.2 binary program encoding.
//! - [`symbol_file`]: the §6.3 companion symbol-name file.
//! - [`error`]: `BcError`, covering the decode-side failure modes.

pub mod address;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program_format;
pub mod symbol_file;

pub use address::{Address, ElementKey};
pub use error::{BcError, BcResult};
pub use instruction::{CaseArm, Instruction};
pub use opcode::Opcode;
pub use program_format::{decode_program, encode_program};
pub use symbol_file::{parse_symbol_file, synthesize_name, write_symbol_file, SymbolEntry};
