//! Operator, punctuation, and cast scanning (§4.2.1): a two-character
//! lookahead decides between e.g. `+`, `++`, `+=`, and `(int)`-style casts
//! are recognised atomically before falling back to plain `(`.

use crate::cursor::Cursor;
use crate::keyword::CASTS;
use crate::token::TokenType;

/// Try to match one of the five atomic cast tokens starting at `(`.
/// Returns the matched token type and how many bytes it consumed.
fn try_cast(cursor: &Cursor) -> Option<(TokenType, usize)> {
    let remaining = cursor.remaining();
    for (text, kind) in CASTS {
        if remaining.starts_with(text) {
            return Some((*kind, text.len()));
        }
    }
    None
}

/// Scan one operator or punctuation token (including casts). Assumes the
/// current character is not whitespace, a digit, an identifier-start
/// character, or a quote.
pub fn scan_operator(cursor: &mut Cursor) -> TokenType {
    if cursor.current_char() == '(' {
        if let Some((kind, len)) = try_cast(cursor) {
            cursor.advance_bytes(len);
            return kind;
        }
    }

    let c0 = cursor.current_char();
    let c1 = cursor.peek_char(1);
    macro_rules! two {
        ($kind:expr) => {{
            cursor.advance();
            cursor.advance();
            return $kind;
        }};
    }
    macro_rules! one {
        ($kind:expr) => {{
            cursor.advance();
            return $kind;
        }};
    }

    match (c0, c1) {
        ('+', '+') => two!(TokenType::PlusPlus),
        ('+', '=') => two!(TokenType::PlusEq),
        ('-', '-') => two!(TokenType::MinusMinus),
        ('-', '=') => two!(TokenType::MinusEq),
        ('*', '*') => two!(TokenType::StarStar),
        ('*', '=') => two!(TokenType::StarEq),
        ('/', '=') => two!(TokenType::SlashEq),
        ('%', '=') => two!(TokenType::PercentEq),
        ('&', '&') => two!(TokenType::AmpAmp),
        ('&', '=') => two!(TokenType::AmpEq),
        ('|', '|') => two!(TokenType::PipePipe),
        ('|', '=') => two!(TokenType::PipeEq),
        ('^', '=') => two!(TokenType::CaretEq),
        ('<', '<') => two!(TokenType::Shl),
        ('<', '=') => two!(TokenType::LtEq),
        ('>', '>') => two!(TokenType::Shr),
        ('>', '=') => two!(TokenType::GtEq),
        ('=', '=') => two!(TokenType::EqEq),
        ('!', '=') => two!(TokenType::BangEq),
        _ => match c0 {
            '+' => one!(TokenType::Plus),
            '-' => one!(TokenType::Minus),
            '*' => one!(TokenType::Star),
            '/' => one!(TokenType::Slash),
            '%' => one!(TokenType::Percent),
            '&' => one!(TokenType::Amp),
            '|' => one!(TokenType::Pipe),
            '^' => one!(TokenType::Caret),
            '<' => one!(TokenType::Lt),
            '>' => one!(TokenType::Gt),
            '=' => one!(TokenType::Assign),
            '!' => one!(TokenType::Bang),
            ',' => one!(TokenType::Comma),
            ';' => one!(TokenType::Semicolon),
            ':' => one!(TokenType::Colon),
            '.' => one!(TokenType::Dot),
            '(' => one!(TokenType::LParen),
            ')' => one!(TokenType::RParen),
            '{' => one!(TokenType::LBrace),
            '}' => one!(TokenType::RBrace),
            '[' => one!(TokenType::LBracket),
            ']' => one!(TokenType::RBracket),
            _ => one!(TokenType::Eof),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_char_lookahead_prefers_longer_match() {
        let mut c = Cursor::new("++x");
        assert_eq!(scan_operator(&mut c), TokenType::PlusPlus);
        let mut c = Cursor::new("+=x");
        assert_eq!(scan_operator(&mut c), TokenType::PlusEq);
        let mut c = Cursor::new("+x");
        assert_eq!(scan_operator(&mut c), TokenType::Plus);
    }

    #[test]
    fn recognizes_casts_atomically() {
        let mut c = Cursor::new("(int)x");
        assert_eq!(scan_operator(&mut c), TokenType::KwCastInt);
        assert_eq!(c.current_char(), 'x');
    }

    #[test]
    fn plain_paren_falls_through_when_not_a_cast() {
        let mut c = Cursor::new("(x)");
        assert_eq!(scan_operator(&mut c), TokenType::LParen);
    }
}
