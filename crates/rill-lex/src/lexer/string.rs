//! String and char literal scanning (§4.2.1).
//!
//! Two string forms: the escaped `"…"` form, and the raw `$"…"$` form that
//! copies bytes verbatim (no escape processing at all) until the next `"$`.

use crate::cursor::Cursor;
use crate::error::LexErrorKind;

fn decode_escape(cursor: &mut Cursor) -> Result<char, LexErrorKind> {
    let c = cursor.current_char();
    match c {
        '\\' | '\'' | '"' => {
            cursor.advance();
            Ok(c)
        }
        'n' => {
            cursor.advance();
            Ok('\n')
        }
        'r' => {
            cursor.advance();
            Ok('\r')
        }
        't' => {
            cursor.advance();
            Ok('\t')
        }
        'b' => {
            cursor.advance();
            Ok('\u{8}')
        }
        'f' => {
            cursor.advance();
            Ok('\u{c}')
        }
        '{' => {
            cursor.advance();
            Ok('{')
        }
        '}' => {
            cursor.advance();
            Ok('}')
        }
        'x' | 'X' => {
            cursor.advance();
            let start = cursor.position();
            let mut len = 0;
            while len < 2 && cursor.current_char().is_ascii_hexdigit() {
                cursor.advance();
                len += 1;
            }
            if len == 0 {
                return Err(LexErrorKind::BadEscape);
            }
            let digits = cursor.slice_from(start);
            let code = u32::from_str_radix(digits, 16).map_err(|_| LexErrorKind::BadEscape)?;
            char::from_u32(code).ok_or(LexErrorKind::BadEscape)
        }
        d if d.is_ascii_digit() => {
            let start = cursor.position();
            let mut len = 0;
            while len < 3 && cursor.current_char().is_ascii_digit() {
                cursor.advance();
                len += 1;
            }
            let digits = cursor.slice_from(start);
            let code: u32 = digits.parse().map_err(|_| LexErrorKind::BadEscape)?;
            char::from_u32(code).ok_or(LexErrorKind::BadEscape)
        }
        _ => Err(LexErrorKind::BadEscape),
    }
}

/// Scan a string literal starting at the opening `"` (or the `$"` of a raw
/// literal). Consumes through the closing delimiter.
pub fn scan_string(cursor: &mut Cursor) -> Result<String, LexErrorKind> {
    if cursor.current_char() == '$' && cursor.peek_char(1) == '"' {
        cursor.advance(); // '$'
        cursor.advance(); // '"'
        let start = cursor.position();
        loop {
            if cursor.is_at_end() {
                return Err(LexErrorKind::UnterminatedString);
            }
            if cursor.current_char() == '"' && cursor.peek_char(1) == '$' {
                let raw = cursor.slice_from(start).to_string();
                cursor.advance(); // '"'
                cursor.advance(); // '$'
                return Ok(raw);
            }
            cursor.advance();
        }
    }

    cursor.advance(); // opening '"'
    let mut out = String::new();
    loop {
        if cursor.is_at_end() {
            return Err(LexErrorKind::UnterminatedString);
        }
        match cursor.current_char() {
            '"' => {
                cursor.advance();
                return Ok(out);
            }
            '\\' => {
                cursor.advance();
                out.push(decode_escape(cursor)?);
            }
            '\n' => return Err(LexErrorKind::UnterminatedString),
            c => {
                out.push(c);
                cursor.advance();
            }
        }
    }
}

/// Scan a char literal starting at the opening `'`.
pub fn scan_char(cursor: &mut Cursor) -> Result<char, LexErrorKind> {
    cursor.advance(); // opening quote
    if cursor.is_at_end() {
        return Err(LexErrorKind::UnterminatedString);
    }
    let value = if cursor.current_char() == '\\' {
        cursor.advance();
        decode_escape(cursor)?
    } else {
        let c = cursor.current_char();
        cursor.advance();
        c
    };
    if cursor.current_char() != '\'' {
        return Err(LexErrorKind::BadEscape);
    }
    cursor.advance();
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_plain_string() {
        let mut c = Cursor::new("\"hello\"");
        assert_eq!(scan_string(&mut c).unwrap(), "hello");
    }

    #[test]
    fn scans_escapes() {
        let mut c = Cursor::new("\"a\\nb\\tc\"");
        assert_eq!(scan_string(&mut c).unwrap(), "a\nb\tc");
    }

    #[test]
    fn scans_hex_escape() {
        let mut c = Cursor::new("\"\\x41\"");
        assert_eq!(scan_string(&mut c).unwrap(), "A");
    }

    #[test]
    fn scans_decimal_escape() {
        let mut c = Cursor::new("\"\\065\"");
        assert_eq!(scan_string(&mut c).unwrap(), "A");
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let mut c = Cursor::new("\"abc");
        assert!(matches!(
            scan_string(&mut c),
            Err(LexErrorKind::UnterminatedString)
        ));
    }

    #[test]
    fn raw_string_skips_escape_processing() {
        let mut c = Cursor::new("$\"a\\nb\"$");
        assert_eq!(scan_string(&mut c).unwrap(), "a\\nb");
    }

    #[test]
    fn scans_char_literal_with_escape() {
        let mut c = Cursor::new("'\\n'");
        assert_eq!(scan_char(&mut c).unwrap(), '\n');
    }

    #[test]
    fn scans_plain_char_literal() {
        let mut c = Cursor::new("'x'");
        assert_eq!(scan_char(&mut c).unwrap(), 'x');
    }
}
