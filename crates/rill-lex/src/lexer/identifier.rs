//! Identifier scanning (§4.2.1): `[A-Za-z_+][A-Za-z0-9_+]*`,
//! plus internal `.` for dotted global references.

use crate::cursor::Cursor;

fn is_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic() || (c as u32) >= 0x80
}

fn is_continue(c: char) -> bool {
    is_start(c) || c.is_ascii_digit()
}

/// Scan an identifier, including embedded `.` segments (`foo.bar.baz`) so
/// that dotted global paths come back as one token. The caller is
/// responsible for rejecting dots where the grammar forbids them (local and
/// script names).
pub fn scan_identifier(cursor: &mut Cursor) -> String {
    let start = cursor.position();
    debug_assert!(is_start(cursor.current_char()));
    cursor.advance();
    loop {
        if is_continue(cursor.current_char()) {
            cursor.advance();
        } else if cursor.current_char() == '.' && is_start(cursor.peek_char(1)) {
            cursor.advance();
            cursor.advance();
        } else {
            break;
        }
    }
    cursor.slice_from(start).to_string()
}

pub fn can_start_identifier(c: char) -> bool {
    is_start(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_plain_identifier() {
        let mut c = Cursor::new("myVariable ");
        assert_eq!(scan_identifier(&mut c), "myVariable");
    }

    #[test]
    fn scans_dotted_global_path() {
        let mut c = Cursor::new("main.counter;");
        assert_eq!(scan_identifier(&mut c), "main.counter");
    }

    #[test]
    fn underscore_and_high_codepoints_start_identifiers() {
        assert!(can_start_identifier('_'));
        assert!(can_start_identifier('\u{a1}'));
        assert!(!can_start_identifier('1'));
    }
}
