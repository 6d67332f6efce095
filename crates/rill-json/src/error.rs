//! JSON parse failures (§7, "Runtime: ... JSON parse failure").
//!
//! A single malformed document can fail in more than one place only in the
//! sense that there is always exactly one first failure — parsing stops at
//! the first bad byte rather than trying to recover and report several, the
//! way lexing a whole rill source file does.

use rill_util::Span;

#[derive(Debug, thiserror::Error)]
pub enum JsonErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("invalid escape sequence `\\{0}`")]
    BadEscape(char),
    #[error("invalid \\u escape")]
    BadUnicodeEscape,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("malformed number literal")]
    MalformedNumber,
    #[error("trailing data after the top-level value")]
    TrailingData,
    #[error("object key must be a string")]
    KeyMustBeString,
    #[error("expected `{0}`")]
    Expected(char),
}

#[derive(Debug, thiserror::Error)]
#[error("{kind} at {span:?}")]
pub struct JsonError {
    pub kind: JsonErrorKind,
    pub span: Span,
}

impl JsonError {
    pub fn new(kind: JsonErrorKind, span: Span) -> Self {
        JsonError { kind, span }
    }

    /// One-line diagnostic, the shape the codec's caller concatenates into
    /// the built-in's error `Value` (§4.5).
    pub fn diagnostic(&self) -> String {
        format!("{}:{}: {}", self.span.line, self.span.column, self.kind)
    }
}
