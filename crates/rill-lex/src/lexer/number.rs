//! Integer and double literal scanning (§4.2.1).
//!
//! Digits with at most one `.`; a second `.` is not part of the number —
//! the caller gets a `second_dot` flag back so it can emit the level-1
//! warning `§7` calls for without this module owning diagnostics.

use rill_value::Value;

use crate::cursor::Cursor;
use crate::error::LexErrorKind;

pub struct NumberLiteral {
    pub value: Value,
    /// Set if a second `.` followed the number and was left unconsumed.
    pub trailing_second_dot: bool,
}

pub fn scan_number(cursor: &mut Cursor) -> Result<NumberLiteral, LexErrorKind> {
    let start = cursor.position();
    let mut saw_dot = false;
    let mut trailing_second_dot = false;

    while cursor.current_char().is_ascii_digit() {
        cursor.advance();
    }
    if cursor.current_char() == '.' && cursor.peek_char(1).is_ascii_digit() {
        saw_dot = true;
        cursor.advance();
        while cursor.current_char().is_ascii_digit() {
            cursor.advance();
        }
    }
    if cursor.current_char() == '.' {
        trailing_second_dot = true;
    }

    let text = cursor.slice_from(start);
    let value = if saw_dot {
        text.parse::<f64>()
            .map(Value::Double)
            .map_err(|_| LexErrorKind::MalformedNumber)?
    } else {
        text.parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| LexErrorKind::MalformedNumber)?
    };

    Ok(NumberLiteral {
        value,
        trailing_second_dot,
    })
}
