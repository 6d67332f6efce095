//! A single linear bytecode instruction.

use rill_util::Symbol;
use rill_value::Value;

use crate::address::Address;
use crate::opcode::Opcode;

/// One case arm of a `JTB` (jump-table/switch) instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseArm {
    pub value: Value,
    pub target: usize,
}

/// One bytecode instruction.
///
/// Most opcodes only use a handful of these fields; the struct stays flat
/// rather than an enum-per-opcode because the VM's dispatch loop indexes
/// `program[pc]` and switches on `opcode` — a flat struct keeps that a
/// single array access instead of an enum match plus a downcast.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Immediate literal payload, e.g. for `PSI`.
    pub value: Option<Value>,
    /// A generic operand index: variable slot, builtin dispatch id,
    /// parameter count, depending on `opcode`.
    pub operand: usize,
    /// Jump target / function entry address. The first instruction of a
    /// program stores the index of its `END` here.
    pub location: usize,
    /// Name used for disassembly and the optional symbol file.
    pub variable_name: Option<Symbol>,
    /// Resolved address cell, present on `PVA`/`PCV` once the parser knows
    /// enough to fill it in directly (a literal, non-dynamic chain).
    pub address: Option<Address>,
    /// `JTB` only: case literal/target pairs in source order.
    pub cases: Vec<CaseArm>,
    /// `JTB` only: fallback target when no case matches.
    pub default: Option<usize>,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Instruction {
            opcode,
            value: None,
            operand: 0,
            location: 0,
            variable_name: None,
            address: None,
            cases: Vec::new(),
            default: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_operand(mut self, operand: usize) -> Self {
        self.operand = operand;
        self
    }

    pub fn with_location(mut self, location: usize) -> Self {
        self.location = location;
        self
    }

    pub fn with_variable_name(mut self, name: Symbol) -> Self {
        self.variable_name = Some(name);
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_cases(mut self, cases: Vec<CaseArm>, default: Option<usize>) -> Self {
        self.cases = cases;
        self.default = default;
        self
    }

    /// Whether this is a still-unpatched forward jump/call, per the parser's
    /// final fix-up pass rules (§4.3): a `JSR` with `location == 0` needs its
    /// target from the functions table, and a `JMP` with `location == 0` is
    /// rewritten to the program's last index.
    pub fn needs_fixup(&self) -> bool {
        self.opcode.is_jump() && self.location == 0
    }
}
