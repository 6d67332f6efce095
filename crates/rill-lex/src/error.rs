//! Lexical and scope-resolution errors (§7, the "Lexical" and
//! "Scope/definition" and "Static-evaluation" rows).
//!
//! These are accumulated rather than returned on the first hit: lexing
//! recovers by skipping to the next statement boundary so a single source
//! file can report more than one mistake per run (§7 Propagation).

use rill_util::Span;

#[derive(Debug, thiserror::Error)]
pub enum LexErrorKind {
    #[error("invalid escape sequence")]
    BadEscape,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid UTF-8 byte sequence")]
    BadUtf8,
    #[error("malformed numeric literal")]
    MalformedNumber,
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),
    #[error("expression is not a valid static initializer")]
    InvalidStaticExpression,
    #[error("duplicate key `{0}` in collection literal")]
    DuplicateKey(String),
    #[error("unbalanced delimiters")]
    UnbalancedDelimiters,
    #[error("`{0}` declared with the wrong scope modifier for this context")]
    WrongScopeDeclaration(String),
    #[error("`{0}` name may not contain `.` in this scope")]
    ForbiddenDottedName(String),
    #[error("`{0}` is already defined")]
    Redefinition(String),
    #[error("cannot assign to read-only variable `{0}`")]
    AssignToReadOnly(String),
    #[error("divide by zero in static initializer")]
    StaticDivideByZero,
    #[error("modulo by zero in static initializer")]
    StaticModuloByZero,
    #[error("scope modifier used at a use site, not a definition")]
    ScopeModifierAtUseSite,
}

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        LexError { kind, span }
    }
}
