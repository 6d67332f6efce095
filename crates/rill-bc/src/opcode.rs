//! The opcode set. Numeric identifiers are part of the serialized program
//! format (§6.2) and must never be reordered or renumbered — appending a new
//! opcode is fine, renumbering an existing one breaks every `.rbc` file ever
//! written.

use std::fmt;

/// One bytecode operation.
///
/// The discriminants below are the stable wire identifiers; `Opcode::from_u8`
/// and `Opcode as u8` both go through them directly, so this list's order
/// *is* the serialized format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Nop = 1,
    Def = 2,
    Sav = 3,
    Exp = 4,
    Mul = 5,
    Div = 6,
    Add = 7,
    Sub = 8,
    Mod = 9,
    Xor = 10,
    Bnd = 11,
    Bor = 12,
    Inc = 13,
    Dec = 14,
    Not = 15,
    Neg = 16,
    Svl = 17,
    Svr = 18,
    Cti = 19,
    Ctd = 20,
    Ctc = 21,
    Cts = 22,
    Ctb = 23,
    Jmp = 24,
    Jif = 25,
    Jit = 26,
    Jbf = 27,
    Jsr = 28,
    Ret = 29,
    Psi = 30,
    Psv = 31,
    End = 32,
    Teq = 33,
    Tne = 34,
    Tgr = 35,
    Tge = 36,
    Tls = 37,
    Tle = 38,
    And = 39,
    Lor = 40,
    Jtb = 41,
    Dfl = 42,
    Psl = 43,
    Slv = 44,
    Psp = 45,
    Inl = 46,
    Del = 47,
    Pcv = 48,
    Pva = 49,
    Ada = 50,
    Sua = 51,
    Mua = 52,
    Dia = 53,
    Moa = 54,
    Dcs = 55,
    Efi = 56,
    Rfe = 57,
    Cid = 58,
}

/// The full opcode list in wire order; kept in one place so serialization
/// round-trip tests can walk every variant.
pub const ALL: [Opcode; 58] = [
    Opcode::Nop,
    Opcode::Def,
    Opcode::Sav,
    Opcode::Exp,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mod,
    Opcode::Xor,
    Opcode::Bnd,
    Opcode::Bor,
    Opcode::Inc,
    Opcode::Dec,
    Opcode::Not,
    Opcode::Neg,
    Opcode::Svl,
    Opcode::Svr,
    Opcode::Cti,
    Opcode::Ctd,
    Opcode::Ctc,
    Opcode::Cts,
    Opcode::Ctb,
    Opcode::Jmp,
    Opcode::Jif,
    Opcode::Jit,
    Opcode::Jbf,
    Opcode::Jsr,
    Opcode::Ret,
    Opcode::Psi,
    Opcode::Psv,
    Opcode::End,
    Opcode::Teq,
    Opcode::Tne,
    Opcode::Tgr,
    Opcode::Tge,
    Opcode::Tls,
    Opcode::Tle,
    Opcode::And,
    Opcode::Lor,
    Opcode::Jtb,
    Opcode::Dfl,
    Opcode::Psl,
    Opcode::Slv,
    Opcode::Psp,
    Opcode::Inl,
    Opcode::Del,
    Opcode::Pcv,
    Opcode::Pva,
    Opcode::Ada,
    Opcode::Sua,
    Opcode::Mua,
    Opcode::Dia,
    Opcode::Moa,
    Opcode::Dcs,
    Opcode::Efi,
    Opcode::Rfe,
    Opcode::Cid,
];

impl Opcode {
    /// Recover an `Opcode` from its wire byte, or `None` if `byte` does not
    /// name one of the 58 defined opcodes.
    pub fn from_u8(byte: u8) -> Option<Opcode> {
        ALL.iter().copied().find(|op| *op as u8 == byte)
    }

    /// Whether a jump to this instruction's `location` field is meaningful,
    /// i.e. it participates in the final-fixup backpatching pass.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Opcode::Jmp | Opcode::Jif | Opcode::Jit | Opcode::Jsr | Opcode::Jtb
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Nop => "NOP",
            Opcode::Def => "DEF",
            Opcode::Sav => "SAV",
            Opcode::Exp => "EXP",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mod => "MOD",
            Opcode::Xor => "XOR",
            Opcode::Bnd => "BND",
            Opcode::Bor => "BOR",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::Not => "NOT",
            Opcode::Neg => "NEG",
            Opcode::Svl => "SVL",
            Opcode::Svr => "SVR",
            Opcode::Cti => "CTI",
            Opcode::Ctd => "CTD",
            Opcode::Ctc => "CTC",
            Opcode::Cts => "CTS",
            Opcode::Ctb => "CTB",
            Opcode::Jmp => "JMP",
            Opcode::Jif => "JIF",
            Opcode::Jit => "JIT",
            Opcode::Jbf => "JBF",
            Opcode::Jsr => "JSR",
            Opcode::Ret => "RET",
            Opcode::Psi => "PSI",
            Opcode::Psv => "PSV",
            Opcode::End => "END",
            Opcode::Teq => "TEQ",
            Opcode::Tne => "TNE",
            Opcode::Tgr => "TGR",
            Opcode::Tge => "TGE",
            Opcode::Tls => "TLS",
            Opcode::Tle => "TLE",
            Opcode::And => "AND",
            Opcode::Lor => "LOR",
            Opcode::Jtb => "JTB",
            Opcode::Dfl => "DFL",
            Opcode::Psl => "PSL",
            Opcode::Slv => "SLV",
            Opcode::Psp => "PSP",
            Opcode::Inl => "INL",
            Opcode::Del => "DEL",
            Opcode::Pcv => "PCV",
            Opcode::Pva => "PVA",
            Opcode::Ada => "ADA",
            Opcode::Sua => "SUA",
            Opcode::Mua => "MUA",
            Opcode::Dia => "DIA",
            Opcode::Moa => "MOA",
            Opcode::Dcs => "DCS",
            Opcode::Efi => "EFI",
            Opcode::Rfe => "RFE",
            Opcode::Cid => "CID",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_bytes_are_stable_and_start_at_one() {
        assert_eq!(Opcode::Nop as u8, 1);
        assert_eq!(Opcode::Cid as u8, 58);
    }

    #[test]
    fn from_u8_round_trips_every_opcode() {
        for op in ALL {
            assert_eq!(Opcode::from_u8(op as u8), Some(op));
        }
        assert_eq!(Opcode::from_u8(0), None);
        assert_eq!(Opcode::from_u8(59), None);
    }

    #[test]
    fn only_control_flow_opcodes_carry_jump_targets() {
        assert!(Opcode::Jmp.is_jump());
        assert!(Opcode::Jtb.is_jump());
        assert!(!Opcode::Add.is_jump());
    }
}
