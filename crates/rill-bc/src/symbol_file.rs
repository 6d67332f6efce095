//! §6.3 symbol file: an optional companion to a serialized program that
//! names the instructions the program itself doesn't bother naming.
//!
//! Kept as a simple line-oriented text format (`index<TAB>fq_name<TAB>visible_name`)
//! rather than binary — it is read by humans debugging a `.rbc` dump at least
//! as often as it's read by the VM.

use crate::error::{BcError, BcResult};

/// One named instruction: its program index, fully-qualified symbol-table
/// name, and the script-visible short name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolEntry {
    pub index: usize,
    pub fully_qualified_name: String,
    pub visible_name: String,
}

/// Render a symbol table to its on-disk text form.
pub fn write_symbol_file(entries: &[SymbolEntry]) -> String {
    let mut out = String::new();
    for e in entries {
        out.push_str(&e.index.to_string());
        out.push('\t');
        out.push_str(&e.fully_qualified_name);
        out.push('\t');
        out.push_str(&e.visible_name);
        out.push('\n');
    }
    out
}

/// Parse a symbol file produced by [`write_symbol_file`].
pub fn parse_symbol_file(text: &str) -> BcResult<Vec<SymbolEntry>> {
    let mut entries = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        let index = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(BcError::MalformedSymbolFile { line: line_no + 1 })?;
        let fully_qualified_name = fields
            .next()
            .ok_or(BcError::MalformedSymbolFile { line: line_no + 1 })?
            .to_string();
        let visible_name = fields
            .next()
            .ok_or(BcError::MalformedSymbolFile { line: line_no + 1 })?
            .to_string();
        entries.push(SymbolEntry {
            index,
            fully_qualified_name,
            visible_name,
        });
    }
    Ok(entries)
}

/// Name synthesized for an instruction index absent from the symbol file,
/// per §6.3: "the VM synthesizes names from hex-formatted operand indices".
pub fn synthesize_name(operand: usize) -> String {
    format!("{operand:#x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_entries() {
        let entries = vec![
            SymbolEntry {
                index: 0,
                fully_qualified_name: "Script.main.counter".to_string(),
                visible_name: "counter".to_string(),
            },
            SymbolEntry {
                index: 12,
                fully_qualified_name: "Global.config".to_string(),
                visible_name: "config".to_string(),
            },
        ];
        let text = write_symbol_file(&entries);
        let parsed = parse_symbol_file(&text).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "0\tScript.main.a\ta\n\n1\tScript.main.b\tb\n";
        assert_eq!(parse_symbol_file(text).unwrap().len(), 2);
    }

    #[test]
    fn synthesized_name_is_hex() {
        assert_eq!(synthesize_name(255), "0xff");
    }
}
