//! The `Token` record and its companion types (§3.2).

use rill_util::{Span, Symbol};
use rill_value::Value;

/// The scope a declaration (or a fully-qualified name derived from one) is
/// attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Local,
    Script,
    Global,
}

/// Location metadata attached to every token: line/column/offset plus the
/// running paren/brace nesting depth at that point, which the parser's
/// balance checks (§8 invariant 6) and the lexer's own unbalanced-delimiter
/// detection both need.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Location {
    pub span: Span,
    pub paren_depth: u32,
    pub brace_depth: u32,
}

/// Bookkeeping carried only by switch-related tokens.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwitchMeta {
    pub switch_start: usize,
    pub switch_end: usize,
    pub jump_table_index: usize,
    pub case_index: usize,
    pub pending_breaks: Vec<usize>,
}

/// The kind of a token: keywords, operators, literals, and the synthetic
/// framing markers the lexer emits around every control structure (§4.2.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenType {
    // --- literals ---
    IntLiteral,
    DoubleLiteral,
    CharLiteral,
    StringLiteral,
    BoolLiteral,
    Identifier,

    // --- keywords (§4.2.2, longest-match-first) ---
    KwContinue,
    KwCastDouble,
    KwCastString,
    KwDefault,
    KwGlobal,
    KwScript,
    KwReturn,
    KwSwitch,
    KwCastBool,
    KwCastChar,
    KwCastInt,
    KwWhile,
    KwConst,
    KwBreak,
    KwLocal,
    KwBlock,
    KwFalse,
    KwTrue,
    KwElse,
    KwCase,
    KwStop,
    KwVar,
    KwFor,
    KwBrk,
    KwEnd,
    KwIf,

    // --- punctuation ---
    Comma,
    Semicolon,
    Colon,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // --- operators ---
    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Star,
    StarStar,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    CaretEq,
    Shl,
    Shr,
    Assign,
    EqEq,
    Bang,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // --- lex-time-evaluated static initializer marker ---
    VariableDef,

    // --- control-structure framing markers (§4.2.6) ---
    BlockBegin,
    BlockEnd,
    IfCondBegin,
    IfCondEnd,
    IfBlockBegin,
    IfBlockEnd,
    ElseBlockBegin,
    ElseBlockEnd,
    WhileCondBegin,
    WhileCondEnd,
    WhileBlockBegin,
    WhileBlockEnd,
    ForInitBegin,
    ForInitEnd,
    ForCondBegin,
    ForCondEnd,
    ForUpdateBegin,
    ForUpdateEnd,
    ForBlockBegin,
    ForBlockEnd,
    SwitchCondBegin,
    SwitchCondEnd,
    SwitchBlockBegin,
    SwitchBlockEnd,
    CaseCondBegin,
    CaseCondEnd,
    CaseBlockBegin,
    CaseBlockEnd,
    DefaultBlockBegin,
    DefaultBlockEnd,
    FunctionDefBegin,
    FunctionDefEnd,
    FunctionCallBegin,
    ParamBegin,
    ParamEnd,
    FunctionCallEnd,

    Eof,
}

impl TokenType {
    /// Whether this token carries operator metadata (§3.3): binding power,
    /// associativity, arity.
    pub fn is_operator(self) -> bool {
        crate::operator_meta::metadata(self).is_some()
    }
}

/// A single lexed token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenType,
    pub identifier: Option<Symbol>,
    pub value: Option<Value>,
    pub scope: Option<Scope>,
    pub read_only: bool,
    pub location: Location,
    pub switch: Option<SwitchMeta>,
}

impl Token {
    pub fn new(kind: TokenType, location: Location) -> Self {
        Token {
            kind,
            identifier: None,
            value: None,
            scope: None,
            read_only: false,
            location,
            switch: None,
        }
    }

    pub fn with_identifier(mut self, name: Symbol) -> Self {
        self.identifier = Some(name);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}
