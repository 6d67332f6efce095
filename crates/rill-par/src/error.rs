//! Parser-time errors (§7, the "Parse" row): anything that can only be
//! caught once the framed token stream is walked against the bytecode
//! emission rules, as opposed to the purely lexical/scope errors
//! `rill-lex` already reports.

use rill_util::Span;

#[derive(Debug, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("reference to undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("call to undefined function `{0}`")]
    UndefinedFunction(String),
    #[error("`{0}` redefined in the same scope")]
    Redefinition(String),
    #[error("`break`/`brk` outside of a loop or switch")]
    BreakOutsideLoop,
    #[error("`continue` outside of a loop")]
    ContinueOutsideLoop,
    #[error("call to `{function}` supplies {found} argument(s), needs at least {expected}")]
    TooFewArguments {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("cannot assign to read-only variable `{0}`")]
    AssignToReadOnly(String),
}

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        ParseError { kind, span }
    }
}
