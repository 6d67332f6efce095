//! §6.2 serialized program format: opcode byte, a small flags byte, then
//! whichever of {immediate value, operand, jump target, name, case table}
//! the flags say are present.
//!
//! Integers use a variable-length encoding: one byte if the (zigzag-encoded,
//! for signed values) magnitude is under 128; otherwise the high bit is set
//! on a length byte, followed by that many big-endian magnitude bytes (up to
//! 8). `Value`s are tagged with a one-byte type code — `1` collection, `2`
//! int, `3` double, `4` char, `5` string, `6` bool — and strings are always
//! length-prefixed UTF-8.

use rill_util::Symbol;
use rill_value::{Collection, Value};

use crate::error::{BcError, BcResult};
use crate::instruction::{CaseArm, Instruction};
use crate::opcode::Opcode;

const TAG_COLLECTION: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_DOUBLE: u8 = 3;
const TAG_CHAR: u8 = 4;
const TAG_STRING: u8 = 5;
const TAG_BOOL: u8 = 6;

const FLAG_VALUE: u8 = 0x01;
const FLAG_OPERAND: u8 = 0x02;
const FLAG_LOCATION: u8 = 0x04;
const FLAG_NAME: u8 = 0x08;
const FLAG_CASES: u8 = 0x10;

fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

fn write_varint(n: u64, out: &mut Vec<u8>) {
    if n < 128 {
        out.push(n as u8);
        return;
    }
    let bytes = n.to_be_bytes();
    let first_significant = bytes.iter().position(|b| *b != 0).unwrap_or(7);
    let len = 8 - first_significant;
    out.push(0x80 | len as u8);
    out.extend_from_slice(&bytes[first_significant..]);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn read_u8(&mut self) -> BcResult<u8> {
        let b = *self.bytes.get(self.pos).ok_or(BcError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, n: usize) -> BcResult<&'a [u8]> {
        let end = self.pos + n;
        let slice = self.bytes.get(self.pos..end).ok_or(BcError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_varint(&mut self) -> BcResult<u64> {
        let first = self.read_u8()?;
        if first & 0x80 == 0 {
            return Ok(first as u64);
        }
        let len = (first & 0x7f) as usize;
        if len > 8 {
            return Err(BcError::VarintTooWide(len as u8));
        }
        let bytes = self.read_bytes(len)?;
        let mut buf = [0u8; 8];
        buf[8 - len..].copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    fn read_string(&mut self) -> BcResult<String> {
        let len = self.read_varint()? as usize;
        let bytes = self.read_bytes(len)?.to_vec();
        String::from_utf8(bytes).map_err(BcError::InvalidUtf8)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    write_varint(s.len() as u64, out);
    out.extend_from_slice(s.as_bytes());
}

fn write_value(v: &Value, out: &mut Vec<u8>) {
    match v {
        Value::Integer(i) => {
            out.push(TAG_INT);
            write_varint(zigzag_encode(*i), out);
        }
        Value::Double(d) => {
            out.push(TAG_DOUBLE);
            out.extend_from_slice(&d.to_be_bytes());
        }
        Value::Char(c) => {
            out.push(TAG_CHAR);
            write_varint(*c as u64, out);
        }
        Value::Bool(b) => {
            out.push(TAG_BOOL);
            out.push(if *b { 1 } else { 0 });
        }
        Value::String(s) => {
            out.push(TAG_STRING);
            write_string(s, out);
        }
        Value::Collection(c) => {
            out.push(TAG_COLLECTION);
            write_varint(c.len() as u64, out);
            for (k, v) in c.iter() {
                write_string(k, out);
                write_value(v, out);
            }
        }
    }
}

fn read_value(r: &mut Reader) -> BcResult<Value> {
    let tag = r.read_u8()?;
    match tag {
        TAG_INT => Ok(Value::Integer(zigzag_decode(r.read_varint()?))),
        TAG_DOUBLE => {
            let bytes = r.read_bytes(8)?;
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            Ok(Value::Double(f64::from_be_bytes(buf)))
        }
        TAG_CHAR => {
            let cp = r.read_varint()? as u32;
            Ok(Value::Char(char::from_u32(cp).unwrap_or('\u{FFFD}')))
        }
        TAG_BOOL => Ok(Value::Bool(r.read_u8()? != 0)),
        TAG_STRING => Ok(Value::String(r.read_string()?)),
        TAG_COLLECTION => {
            let count = r.read_varint()?;
            let mut c = Collection::new();
            for _ in 0..count {
                let key = r.read_string()?;
                let value = read_value(r)?;
                c.insert(key, value);
            }
            Ok(Value::Collection(c))
        }
        other => Err(BcError::InvalidValueTag(other)),
    }
}

fn write_instruction(ins: &Instruction, out: &mut Vec<u8>) {
    out.push(ins.opcode as u8);
    let mut flags = 0u8;
    if ins.value.is_some() {
        flags |= FLAG_VALUE;
    }
    if ins.operand != 0 {
        flags |= FLAG_OPERAND;
    }
    if ins.location != 0 {
        flags |= FLAG_LOCATION;
    }
    if ins.variable_name.is_some() {
        flags |= FLAG_NAME;
    }
    if !ins.cases.is_empty() || ins.default.is_some() {
        flags |= FLAG_CASES;
    }
    out.push(flags);
    if let Some(v) = &ins.value {
        write_value(v, out);
    }
    if flags & FLAG_OPERAND != 0 {
        write_varint(ins.operand as u64, out);
    }
    if flags & FLAG_LOCATION != 0 {
        write_varint(ins.location as u64, out);
    }
    if let Some(name) = ins.variable_name {
        write_string(name.as_str(), out);
    }
    if flags & FLAG_CASES != 0 {
        write_varint(ins.cases.len() as u64, out);
        for arm in &ins.cases {
            write_value(&arm.value, out);
            write_varint(arm.target as u64, out);
        }
        match ins.default {
            Some(d) => {
                out.push(1);
                write_varint(d as u64, out);
            }
            None => out.push(0),
        }
    }
}

fn read_instruction(r: &mut Reader) -> BcResult<Instruction> {
    let opcode_byte = r.read_u8()?;
    let opcode = Opcode::from_u8(opcode_byte).ok_or(BcError::InvalidOpcode(opcode_byte))?;
    let flags = r.read_u8()?;
    let mut ins = Instruction::new(opcode);
    if flags & FLAG_VALUE != 0 {
        ins = ins.with_value(read_value(r)?);
    }
    if flags & FLAG_OPERAND != 0 {
        ins = ins.with_operand(r.read_varint()? as usize);
    }
    if flags & FLAG_LOCATION != 0 {
        ins = ins.with_location(r.read_varint()? as usize);
    }
    if flags & FLAG_NAME != 0 {
        ins = ins.with_variable_name(Symbol::intern(&r.read_string()?));
    }
    if flags & FLAG_CASES != 0 {
        let count = r.read_varint()?;
        let mut cases = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let value = read_value(r)?;
            let target = r.read_varint()? as usize;
            cases.push(CaseArm { value, target });
        }
        let default = if r.read_u8()? != 0 {
            Some(r.read_varint()? as usize)
        } else {
            None
        };
        ins = ins.with_cases(cases, default);
    }
    Ok(ins)
}

/// Serialize a whole program to its on-disk byte form.
pub fn encode_program(program: &[Instruction]) -> Vec<u8> {
    let mut out = Vec::new();
    for ins in program {
        write_instruction(ins, &mut out);
    }
    out
}

/// Parse a program previously produced by [`encode_program`].
pub fn decode_program(bytes: &[u8]) -> BcResult<Vec<Instruction>> {
    let mut r = Reader::new(bytes);
    let mut program = Vec::new();
    while !r.at_eof() {
        program.push(read_instruction(&mut r)?);
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;

    #[test]
    fn varint_round_trips_small_and_large_values() {
        for n in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
            let mut buf = Vec::new();
            write_varint(n, &mut buf);
            let mut r = Reader::new(&buf);
            assert_eq!(r.read_varint().unwrap(), n);
        }
    }

    #[test]
    fn zigzag_round_trips_negative_and_positive() {
        for n in [-1i64, 0, 1, i64::MIN, i64::MAX] {
            assert_eq!(zigzag_decode(zigzag_encode(n)), n);
        }
    }

    #[test]
    fn instruction_round_trip_preserves_all_fields() {
        let program = vec![
            Instruction::new(Opcode::Psi).with_value(Value::Integer(42)),
            Instruction::new(Opcode::Jsr).with_location(7),
            Instruction::new(Opcode::Def)
                .with_operand(3)
                .with_variable_name(Symbol::intern("counter")),
            Instruction::new(Opcode::End),
        ];
        let bytes = encode_program(&program);
        let decoded = decode_program(&bytes).unwrap();
        assert_eq!(decoded, program);
    }

    #[test]
    fn jump_table_cases_round_trip() {
        let ins = Instruction::new(Opcode::Jtb).with_cases(
            vec![
                CaseArm { value: Value::Integer(1), target: 10 },
                CaseArm { value: Value::Integer(2), target: 20 },
            ],
            Some(30),
        );
        let bytes = encode_program(&[ins.clone()]);
        let decoded = decode_program(&bytes).unwrap();
        assert_eq!(decoded, vec![ins]);
    }

    #[test]
    fn collection_value_round_trips_with_key_order() {
        let mut c = Collection::new();
        c.insert("z", Value::Integer(1));
        c.insert("a", Value::String("hi".to_string()));
        let ins = Instruction::new(Opcode::Psi).with_value(Value::Collection(c));
        let bytes = encode_program(&[ins.clone()]);
        let decoded = decode_program(&bytes).unwrap();
        assert_eq!(decoded, vec![ins]);
    }

    #[test]
    fn invalid_opcode_byte_is_rejected() {
        let bytes = vec![0xffu8, 0x00];
        assert!(matches!(decode_program(&bytes), Err(BcError::InvalidOpcode(0xff))));
    }
}
