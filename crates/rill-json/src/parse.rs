//! Recursive-descent JSON parsing into a `Value` (§4.5).
//!
//! There is no intermediate AST: an object becomes a `Collection` keyed by
//! its string keys, an array becomes a `Collection` keyed `"0"`, `"1"`, ...,
//! and every scalar maps onto the matching `Value` variant directly.

use rill_util::{FileId, Span};
use rill_value::{Collection, Value};

use crate::error::{JsonError, JsonErrorKind};

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Cursor {
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn span(&self) -> Span {
        Span::point_with_file(FileId::DUMMY, self.line, self.column)
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.advance();
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), JsonError> {
        match self.advance() {
            Some(b) if b == byte => Ok(()),
            _ => Err(JsonError::new(JsonErrorKind::Expected(byte as char), self.span())),
        }
    }

    fn expect_literal(&mut self, literal: &str) -> Result<(), JsonError> {
        for expected in literal.bytes() {
            match self.advance() {
                Some(b) if b == expected => {}
                Some(b) => {
                    return Err(JsonError::new(
                        JsonErrorKind::UnexpectedChar(b as char),
                        self.span(),
                    ))
                }
                None => return Err(JsonError::new(JsonErrorKind::UnexpectedEof, self.span())),
            }
        }
        Ok(())
    }
}

/// Parse a complete JSON document into a single `Value`.
pub fn parse(input: &str) -> Result<Value, JsonError> {
    let mut cursor = Cursor::new(input);
    cursor.skip_whitespace();
    let value = parse_value(&mut cursor)?;
    cursor.skip_whitespace();
    if cursor.peek().is_some() {
        return Err(JsonError::new(JsonErrorKind::TrailingData, cursor.span()));
    }
    Ok(value)
}

fn parse_value(c: &mut Cursor) -> Result<Value, JsonError> {
    match c.peek() {
        Some(b'{') => parse_object(c),
        Some(b'[') => parse_array(c),
        Some(b'"') => parse_string(c).map(Value::String),
        Some(b't') => {
            c.expect_literal("true")?;
            Ok(Value::Bool(true))
        }
        Some(b'f') => {
            c.expect_literal("false")?;
            Ok(Value::Bool(false))
        }
        Some(b'n') => {
            c.expect_literal("null")?;
            Ok(Value::default_unit())
        }
        Some(b) if b == b'-' || b.is_ascii_digit() => parse_number(c),
        Some(b) => Err(JsonError::new(JsonErrorKind::UnexpectedChar(b as char), c.span())),
        None => Err(JsonError::new(JsonErrorKind::UnexpectedEof, c.span())),
    }
}

fn parse_object(c: &mut Cursor) -> Result<Value, JsonError> {
    c.expect(b'{')?;
    let mut out = Collection::new();
    c.skip_whitespace();
    if c.peek() == Some(b'}') {
        c.advance();
        return Ok(Value::Collection(out));
    }
    loop {
        c.skip_whitespace();
        if c.peek() != Some(b'"') {
            return Err(JsonError::new(JsonErrorKind::KeyMustBeString, c.span()));
        }
        let key = parse_string(c)?;
        c.skip_whitespace();
        c.expect(b':')?;
        c.skip_whitespace();
        let value = parse_value(c)?;
        out.insert(key, value);
        c.skip_whitespace();
        match c.advance() {
            Some(b',') => continue,
            Some(b'}') => break,
            Some(b) => return Err(JsonError::new(JsonErrorKind::UnexpectedChar(b as char), c.span())),
            None => return Err(JsonError::new(JsonErrorKind::UnexpectedEof, c.span())),
        }
    }
    Ok(Value::Collection(out))
}

fn parse_array(c: &mut Cursor) -> Result<Value, JsonError> {
    c.expect(b'[')?;
    let mut entries = Vec::new();
    c.skip_whitespace();
    if c.peek() == Some(b']') {
        c.advance();
        return Ok(Value::Collection(Collection::from_positional(entries)));
    }
    loop {
        c.skip_whitespace();
        entries.push(parse_value(c)?);
        c.skip_whitespace();
        match c.advance() {
            Some(b',') => continue,
            Some(b']') => break,
            Some(b) => return Err(JsonError::new(JsonErrorKind::UnexpectedChar(b as char), c.span())),
            None => return Err(JsonError::new(JsonErrorKind::UnexpectedEof, c.span())),
        }
    }
    Ok(Value::Collection(Collection::from_positional(entries)))
}

fn parse_string(c: &mut Cursor) -> Result<String, JsonError> {
    c.expect(b'"')?;
    let mut out = String::new();
    loop {
        match c.advance() {
            Some(b'"') => return Ok(out),
            Some(b'\\') => out.push(parse_escape(c)?),
            Some(b) if b < 0x80 => out.push(b as char),
            Some(lead) => out.push(decode_utf8_char(c, lead)?),
            None => return Err(JsonError::new(JsonErrorKind::UnterminatedString, c.span())),
        }
    }
}

fn decode_utf8_char(c: &mut Cursor, lead: u8) -> Result<char, JsonError> {
    let extra = if lead >= 0xF0 {
        3
    } else if lead >= 0xE0 {
        2
    } else {
        1
    };
    let mut buf = vec![lead];
    for _ in 0..extra {
        match c.advance() {
            Some(b) => buf.push(b),
            None => return Err(JsonError::new(JsonErrorKind::UnterminatedString, c.span())),
        }
    }
    std::str::from_utf8(&buf)
        .ok()
        .and_then(|s| s.chars().next())
        .ok_or_else(|| JsonError::new(JsonErrorKind::BadEscape('?'), c.span()))
}

fn parse_escape(c: &mut Cursor) -> Result<char, JsonError> {
    match c.advance() {
        Some(b'"') => Ok('"'),
        Some(b'\\') => Ok('\\'),
        Some(b'/') => Ok('/'),
        Some(b'b') => Ok('\u{8}'),
        Some(b'f') => Ok('\u{c}'),
        Some(b'n') => Ok('\n'),
        Some(b'r') => Ok('\r'),
        Some(b't') => Ok('\t'),
        Some(b'u') => parse_unicode_escape(c),
        Some(b) => Err(JsonError::new(JsonErrorKind::BadEscape(b as char), c.span())),
        None => Err(JsonError::new(JsonErrorKind::UnexpectedEof, c.span())),
    }
}

fn parse_unicode_escape(c: &mut Cursor) -> Result<char, JsonError> {
    let mut code: u32 = 0;
    for _ in 0..4 {
        let digit = c
            .advance()
            .and_then(|b| (b as char).to_digit(16))
            .ok_or_else(|| JsonError::new(JsonErrorKind::BadUnicodeEscape, c.span()))?;
        code = code * 16 + digit;
    }
    char::from_u32(code).ok_or_else(|| JsonError::new(JsonErrorKind::BadUnicodeEscape, c.span()))
}

fn parse_number(c: &mut Cursor) -> Result<Value, JsonError> {
    let start = c.pos;
    let mut is_float = false;
    if c.peek() == Some(b'-') {
        c.advance();
    }
    while matches!(c.peek(), Some(b) if b.is_ascii_digit()) {
        c.advance();
    }
    if c.peek() == Some(b'.') {
        is_float = true;
        c.advance();
        while matches!(c.peek(), Some(b) if b.is_ascii_digit()) {
            c.advance();
        }
    }
    if matches!(c.peek(), Some(b'e' | b'E')) {
        is_float = true;
        c.advance();
        if matches!(c.peek(), Some(b'-' | b'+')) {
            c.advance();
        }
        while matches!(c.peek(), Some(b) if b.is_ascii_digit()) {
            c.advance();
        }
    }
    let text = std::str::from_utf8(&c.bytes[start..c.pos]).expect("source was valid UTF-8");
    if text.is_empty() || text == "-" {
        return Err(JsonError::new(JsonErrorKind::MalformedNumber, c.span()));
    }
    if is_float {
        text.parse::<f64>()
            .map(Value::Double)
            .map_err(|_| JsonError::new(JsonErrorKind::MalformedNumber, c.span()))
    } else {
        text.parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| JsonError::new(JsonErrorKind::MalformedNumber, c.span()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars() {
        assert_eq!(parse("true").unwrap(), Value::Bool(true));
        assert_eq!(parse("false").unwrap(), Value::Bool(false));
        assert_eq!(parse("null").unwrap(), Value::default_unit());
        assert_eq!(parse("42").unwrap(), Value::Integer(42));
        assert_eq!(parse("-3.5").unwrap(), Value::Double(-3.5));
        assert_eq!(parse("1e3").unwrap(), Value::Double(1000.0));
        assert_eq!(parse("\"hi\"").unwrap(), Value::String("hi".to_string()));
    }

    #[test]
    fn parses_object_preserving_key_order() {
        let v = parse(r#"{"b": 1, "a": 2}"#).unwrap();
        let Value::Collection(c) = v else { panic!("expected collection") };
        assert_eq!(c.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(c.get("a"), Some(&Value::Integer(2)));
    }

    #[test]
    fn parses_array_with_synthetic_positional_keys() {
        let v = parse("[10, 20, 30]").unwrap();
        let Value::Collection(c) = v else { panic!("expected collection") };
        assert_eq!(c.get("0"), Some(&Value::Integer(10)));
        assert_eq!(c.get("2"), Some(&Value::Integer(30)));
    }

    #[test]
    fn parses_nested_structures() {
        let v = parse(r#"{"items": [1, {"x": true}], "n": null}"#).unwrap();
        let Value::Collection(c) = v else { panic!("expected collection") };
        let Some(Value::Collection(items)) = c.get("items") else {
            panic!("expected nested collection")
        };
        assert_eq!(items.get("0"), Some(&Value::Integer(1)));
    }

    #[test]
    fn rejects_trailing_data() {
        assert!(matches!(
            parse("1 2").unwrap_err().kind,
            JsonErrorKind::TrailingData
        ));
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(matches!(
            parse("\"abc").unwrap_err().kind,
            JsonErrorKind::UnterminatedString
        ));
    }

    #[test]
    fn decodes_unicode_escapes() {
        let v = parse(r#""é""#).unwrap();
        assert_eq!(v, Value::String("é".to_string()));
    }
}
