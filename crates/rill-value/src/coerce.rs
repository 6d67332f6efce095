//! `convert(value, target_tag)` — the single coercion funnel every binary
//! operator and every `(int)`/`(double)`/`(char)`/`(string)`/(bool)` cast
//! goes through.
//!
//! Every rule here is lossy-but-total: there is no tag pair for which
//! `convert` fails. Parse failures on string-to-number coercions settle on
//! `0`/`0.0` rather than propagating an error, matching the rest of the
//! value model's "coercions always produce *something*" stance.

use crate::collection::Collection;
use crate::tag::Tag;
use crate::value::Value;

/// Parse the longest valid leading integer literal off `s`, or `0`.
fn parse_leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }
    s[..end].parse().unwrap_or(0)
}

/// Parse the longest valid leading floating-point literal off `s`, or `0.0`.
fn parse_leading_double(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start {
        return 0.0;
    }
    s[..end].parse().unwrap_or(0.0)
}

fn int_to_char(i: i64) -> char {
    char::from_u32(i as u32).unwrap_or('\u{FFFD}')
}

fn scalar_convert(v: &Value, target: Tag) -> Value {
    match target {
        Tag::Integer => Value::Integer(match v {
            Value::Integer(i) => *i,
            Value::Double(d) => *d as i64,
            Value::Char(c) => *c as i64,
            Value::Bool(b) => *b as i64,
            Value::String(s) => parse_leading_int(s),
            Value::Collection(_) => 0,
        }),
        Tag::Double => Value::Double(match v {
            Value::Integer(i) => *i as f64,
            Value::Double(d) => *d,
            Value::Char(c) => (*c as u32) as f64,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::String(s) => parse_leading_double(s),
            Value::Collection(_) => 0.0,
        }),
        Tag::Char => Value::Char(match v {
            Value::Integer(i) => int_to_char(*i),
            Value::Double(d) => int_to_char(*d as i64),
            Value::Char(c) => *c,
            Value::Bool(b) => {
                if *b {
                    'T'
                } else {
                    'F'
                }
            }
            Value::String(s) => s.chars().next().unwrap_or('\0'),
            Value::Collection(_) => '\0',
        }),
        Tag::String => Value::String(match v {
            Value::Integer(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Char(c) => c.to_string(),
            Value::Bool(b) => {
                if *b {
                    "T".to_string()
                } else {
                    "F".to_string()
                }
            }
            Value::String(s) => s.clone(),
            Value::Collection(_) => String::new(),
        }),
        Tag::Bool => Value::Bool(match v {
            Value::Integer(i) => *i != 0,
            Value::Double(d) => *d != 0.0,
            // Intentionally asymmetric with the other scalar conversions:
            // only 'T' is true, every other char (including 'F') is false.
            Value::Char(c) => *c == 'T',
            Value::Bool(b) => *b,
            Value::String(s) => s == "true",
            Value::Collection(_) => false,
        }),
        Tag::Collection => Value::Collection(Collection::from_positional([v.clone()])),
    }
}

/// Convert `v` to `target`. On a `Collection`, the conversion is applied to
/// every element and the result is a collection with the same keys.
pub fn convert(v: &Value, target: Tag) -> Value {
    match v {
        Value::Collection(c) if target != Tag::Collection => {
            let converted: Collection = c
                .iter()
                .map(|(k, e)| (k.to_string(), scalar_convert(e, target)))
                .collect();
            Value::Collection(converted)
        }
        _ => scalar_convert(v, target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_to_bool_is_asymmetric() {
        assert_eq!(convert(&Value::Char('T'), Tag::Bool), Value::Bool(true));
        assert_eq!(convert(&Value::Char('F'), Tag::Bool), Value::Bool(false));
        assert_eq!(convert(&Value::Char('x'), Tag::Bool), Value::Bool(false));
    }

    #[test]
    fn string_to_int_parses_leading_digits() {
        assert_eq!(convert(&Value::String("42abc".into()), Tag::Integer), Value::Integer(42));
        assert_eq!(convert(&Value::String("abc".into()), Tag::Integer), Value::Integer(0));
        assert_eq!(convert(&Value::String("-7".into()), Tag::Integer), Value::Integer(-7));
    }

    #[test]
    fn string_to_bool_only_true_literal_is_true() {
        assert_eq!(convert(&Value::String("true".into()), Tag::Bool), Value::Bool(true));
        assert_eq!(convert(&Value::String("True".into()), Tag::Bool), Value::Bool(false));
    }

    #[test]
    fn round_trip_int_double_truncates() {
        let v = Value::Integer(7);
        let d = convert(&v, Tag::Double);
        let back = convert(&d, Tag::Integer);
        assert_eq!(back, v);
    }

    #[test]
    fn collection_conversion_is_elementwise() {
        let mut c = Collection::new();
        c.insert("a", Value::Integer(1));
        c.insert("b", Value::Integer(2));
        let converted = convert(&Value::Collection(c), Tag::String);
        let Value::Collection(out) = converted else {
            panic!("expected collection");
        };
        assert_eq!(out.get("a"), Some(&Value::String("1".to_string())));
        assert_eq!(out.get("b"), Some(&Value::String("2".to_string())));
    }
}
