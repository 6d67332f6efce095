//! Serializing a `Value` back to JSON text (§4.5).
//!
//! A `Collection` is always written as a `{ "key": value, ... }` object —
//! the runtime has no separate array representation to recover, so a
//! collection built positionally round-trips as an object whose keys happen
//! to read `"0"`, `"1"`, `"2"`, ...

use rill_value::Value;

/// Serialize `value` to a single-line JSON document.
pub fn serialize(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Integer(i) => out.push_str(&i.to_string()),
        Value::Double(d) => out.push_str(&format_double(*d)),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Char(c) => write_string(&c.to_string(), out),
        Value::String(s) => write_string(s, out),
        Value::Collection(c) => {
            out.push('{');
            for (i, (key, v)) in c.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push(' ');
                write_string(key, out);
                out.push_str(": ");
                write_value(v, out);
            }
            if c.len() > 0 {
                out.push(' ');
            }
            out.push('}');
        }
    }
}

fn format_double(d: f64) -> String {
    if d.is_finite() && d.fract() == 0.0 && d.abs() < 1e15 {
        format!("{d:.1}")
    } else {
        d.to_string()
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '/' => out.push_str("\\/"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || (c as u32) > 0x7E => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use rill_value::Collection;

    #[test]
    fn serializes_scalars() {
        assert_eq!(serialize(&Value::Integer(5)), "5");
        assert_eq!(serialize(&Value::Bool(true)), "true");
        assert_eq!(serialize(&Value::String("hi".to_string())), "\"hi\"");
    }

    #[test]
    fn escapes_control_characters_and_non_ascii() {
        let s = serialize(&Value::String("a\nb\tc\"d\\e".to_string()));
        assert_eq!(s, "\"a\\nb\\tc\\\"d\\\\e\"");
        let escaped = serialize(&Value::String("é".to_string()));
        assert_eq!(escaped, "\"\\u00e9\"");
    }

    #[test]
    fn escapes_forward_slash_symmetrically_with_the_parser() {
        let s = serialize(&Value::String("a/b".to_string()));
        assert_eq!(s, "\"a\\/b\"");
        assert_eq!(parse(&s).unwrap(), Value::String("a/b".to_string()));
    }

    #[test]
    fn serializes_collection_preserving_insertion_order() {
        let mut c = Collection::new();
        c.insert("b", Value::Integer(1));
        c.insert("a", Value::Integer(2));
        assert_eq!(serialize(&Value::Collection(c)), r#"{ "b": 1, "a": 2 }"#);
    }

    #[test]
    fn round_trips_through_parse() {
        let original = r#"{ "items": [1, 2, 3], "name": "ok" }"#;
        let parsed = parse(original).unwrap();
        let reparsed = parse(&serialize(&parsed)).unwrap();
        assert_eq!(parsed, reparsed);
    }
}
