//! The fixed keyword list (§4.2.2).
//!
//! Recognition is longest-match-first, which only matters here because
//! `(int)`, `(double)`, `(char)`, `(string)`, `(bool)` are themselves
//! keyword-like atomic tokens handled by [`crate::lexer::operator`] rather
//! than this table — this table covers the bareword keywords only.

use crate::token::TokenType;

/// `(word, token kind)` pairs, in the exact precedence order given by the
/// spec. Plain longest-match-first lookup by string works without needing
/// the order for correctness here (no keyword is a prefix of another), but
/// the order is kept identical to the source list for easy auditing.
const KEYWORDS: &[(&str, TokenType)] = &[
    ("continue", TokenType::KwContinue),
    ("default", TokenType::KwDefault),
    ("global", TokenType::KwGlobal),
    ("script", TokenType::KwScript),
    ("return", TokenType::KwReturn),
    ("switch", TokenType::KwSwitch),
    ("while", TokenType::KwWhile),
    ("const", TokenType::KwConst),
    ("break", TokenType::KwBreak),
    ("local", TokenType::KwLocal),
    ("block", TokenType::KwBlock),
    ("false", TokenType::KwFalse),
    ("true", TokenType::KwTrue),
    ("else", TokenType::KwElse),
    ("case", TokenType::KwCase),
    ("stop", TokenType::KwStop),
    ("var", TokenType::KwVar),
    ("for", TokenType::KwFor),
    ("brk", TokenType::KwBrk),
    ("end", TokenType::KwEnd),
    ("if", TokenType::KwIf),
];

/// Look up a bareword identifier against the keyword table. Returns `None`
/// for anything that should lex as a plain `Identifier`.
pub fn lookup(word: &str) -> Option<TokenType> {
    KEYWORDS
        .iter()
        .find(|(kw, _)| *kw == word)
        .map(|(_, kind)| *kind)
}

/// The four-character parenthesized-keyword casts recognised atomically by
/// the operator scanner (`(int)`, `(double)`, `(char)`, `(string)`, `(bool)`).
pub const CASTS: &[(&str, TokenType)] = &[
    ("(int)", TokenType::KwCastInt),
    ("(double)", TokenType::KwCastDouble),
    ("(char)", TokenType::KwCastChar),
    ("(string)", TokenType::KwCastString),
    ("(bool)", TokenType::KwCastBool),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_every_listed_keyword() {
        for (kw, kind) in KEYWORDS {
            assert_eq!(lookup(kw), Some(*kind));
        }
    }

    #[test]
    fn non_keyword_identifier_is_unrecognized() {
        assert_eq!(lookup("myVariable"), None);
    }
}
