//! The raw token scanner: dispatches on the next significant character to
//! the right submodule and produces a flat [`Token`] stream with no
//! control-structure framing yet (that is [`crate::lexer::framing`]'s job).

use rill_util::{Span, Symbol};
use rill_value::Value;

use crate::cursor::Cursor;
use crate::error::{LexError, LexErrorKind};
use crate::keyword;
use crate::lexer::{comment, identifier, number, operator, string};
use crate::token::{Location, Token, TokenType};

/// Scans a whole source string into a flat token stream, recording errors
/// instead of aborting on the first one so later statements still lex.
pub struct RawLexer<'a> {
    cursor: Cursor<'a>,
    paren_depth: u32,
    brace_depth: u32,
    pub errors: Vec<LexError>,
}

impl<'a> RawLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        RawLexer {
            cursor: Cursor::new(source),
            paren_depth: 0,
            brace_depth: 0,
            errors: Vec::new(),
        }
    }

    fn here(&self) -> Location {
        Location {
            span: Span::new(
                self.cursor.position(),
                self.cursor.position(),
                self.cursor.line(),
                self.cursor.column(),
            ),
            paren_depth: self.paren_depth,
            brace_depth: self.brace_depth,
        }
    }

    fn push_error(&mut self, kind: LexErrorKind, loc: Location) {
        self.errors.push(LexError::new(kind, loc.span));
    }

    pub fn tokenize(mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        loop {
            if let Err(kind) = comment::skip_trivia(&mut self.cursor) {
                let loc = self.here();
                self.push_error(kind, loc);
                break;
            }
            if self.cursor.is_at_end() {
                break;
            }
            let loc = self.here();
            let c = self.cursor.current_char();

            if c.is_ascii_digit() {
                match number::scan_number(&mut self.cursor) {
                    Ok(lit) => {
                        if lit.trailing_second_dot {
                            self.push_error(LexErrorKind::MalformedNumber, loc);
                        }
                        let kind = match lit.value {
                            Value::Double(_) => TokenType::DoubleLiteral,
                            _ => TokenType::IntLiteral,
                        };
                        tokens.push(Token::new(kind, loc).with_value(lit.value));
                    }
                    Err(kind) => self.push_error(kind, loc),
                }
                continue;
            }

            if c == '"' || (c == '$' && self.cursor.peek_char(1) == '"') {
                match string::scan_string(&mut self.cursor) {
                    Ok(text) => {
                        tokens.push(
                            Token::new(TokenType::StringLiteral, loc).with_value(Value::String(text)),
                        );
                    }
                    Err(kind) => self.push_error(kind, loc),
                }
                continue;
            }

            if c == '\'' {
                match string::scan_char(&mut self.cursor) {
                    Ok(ch) => {
                        tokens.push(Token::new(TokenType::CharLiteral, loc).with_value(Value::Char(ch)));
                    }
                    Err(kind) => self.push_error(kind, loc),
                }
                continue;
            }

            if identifier::can_start_identifier(c) {
                let word = identifier::scan_identifier(&mut self.cursor);
                if let Some(kind) = keyword::lookup(&word) {
                    let tok = match kind {
                        TokenType::KwTrue => {
                            Token::new(TokenType::BoolLiteral, loc).with_value(Value::Bool(true))
                        }
                        TokenType::KwFalse => {
                            Token::new(TokenType::BoolLiteral, loc).with_value(Value::Bool(false))
                        }
                        other => Token::new(other, loc),
                    };
                    tokens.push(tok);
                } else {
                    tokens.push(
                        Token::new(TokenType::Identifier, loc).with_identifier(Symbol::intern(&word)),
                    );
                }
                continue;
            }

            let before = self.cursor.position();
            let kind = operator::scan_operator(&mut self.cursor);
            if self.cursor.position() == before {
                // Scanner made no progress on an unrecognized byte; skip it
                // so the error recovery loop can't spin forever.
                self.cursor.advance();
                self.push_error(LexErrorKind::BadUtf8, loc);
                continue;
            }
            match kind {
                TokenType::LParen => {
                    tokens.push(Token::new(kind, loc));
                    self.paren_depth += 1;
                }
                TokenType::RParen => {
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                    tokens.push(Token::new(kind, self.here()));
                }
                TokenType::LBrace => {
                    tokens.push(Token::new(kind, loc));
                    self.brace_depth += 1;
                }
                TokenType::RBrace => {
                    self.brace_depth = self.brace_depth.saturating_sub(1);
                    tokens.push(Token::new(kind, self.here()));
                }
                _ => tokens.push(Token::new(kind, loc)),
            }
        }

        if self.paren_depth != 0 || self.brace_depth != 0 {
            let loc = self.here();
            self.push_error(LexErrorKind::UnbalancedDelimiters, loc);
        }

        tokens.push(Token::new(TokenType::Eof, self.here()));
        (tokens, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenType> {
        let (tokens, errors) = RawLexer::new(src).tokenize();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_arithmetic_expression() {
        assert_eq!(
            kinds("20 + (32 - 5) + 10/2"),
            vec![
                TokenType::IntLiteral,
                TokenType::Plus,
                TokenType::LParen,
                TokenType::IntLiteral,
                TokenType::Minus,
                TokenType::IntLiteral,
                TokenType::RParen,
                TokenType::Plus,
                TokenType::IntLiteral,
                TokenType::Slash,
                TokenType::IntLiteral,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers_are_distinguished() {
        assert_eq!(
            kinds("var myVariable"),
            vec![TokenType::KwVar, TokenType::Identifier, TokenType::Eof]
        );
    }

    #[test]
    fn true_false_become_bool_literals() {
        let (tokens, _) = RawLexer::new("true false").tokenize();
        assert_eq!(tokens[0].kind, TokenType::BoolLiteral);
        assert_eq!(tokens[0].value, Some(Value::Bool(true)));
        assert_eq!(tokens[1].value, Some(Value::Bool(false)));
    }

    #[test]
    fn unbalanced_parens_are_reported() {
        let (_, errors) = RawLexer::new("(1 + 2").tokenize();
        assert!(!errors.is_empty());
    }
}
