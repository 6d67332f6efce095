//! Lexical analysis: turns a module's source text into the fully framed
//! token stream the parser consumes.
//!
//! Lexing runs in two stages:
//! 1. [`lexer::RawLexer`] scans the source into a flat token stream with no
//!    structural framing.
//! 2. [`lexer::frame_block`] walks the flat stream and re-emits it with
//!    control-structure markers, resolved scope-qualified declarations, and
//!    lex-time-evaluated static initializers. Call sites are framed purely
//!    syntactically (any `identifier(` opens a call); forward references to
//!    functions defined later in the module are left for `rill-par`'s own
//!    `pending_calls` pass to resolve once every definition's address is
//!    known.

mod cursor;
mod error;
mod keyword;
mod lexer;
mod operator_meta;
mod scope;
mod static_eval;
mod token;

use std::collections::HashMap;

pub use error::{LexError, LexErrorKind};
pub use lexer::FramingContext;
pub use operator_meta::{metadata, unary_minus, Arity, Associativity, OpClass, OperatorMetadata};
pub use scope::ScopeTracker;
pub use token::{Location, Scope, SwitchMeta, Token, TokenType};

/// Lex one module's source text into a framed token stream.
///
/// Errors accumulated by either pass are returned alongside whatever tokens
/// could still be produced, so a caller driving multiple modules can report
/// every mistake in one run instead of stopping at the first.
pub fn lex(source: &str, module: &str) -> (Vec<Token>, Vec<LexError>) {
    let (raw_tokens, mut errors) = lexer::RawLexer::new(source).tokenize();

    let mut tracker = ScopeTracker::new(module);
    let mut statics: HashMap<String, rill_value::Value> = HashMap::new();
    let mut framing_errors = Vec::new();
    let framed = {
        let mut ctx = FramingContext {
            tracker: &mut tracker,
            statics: &mut statics,
            errors: &mut framing_errors,
        };
        lexer::frame_block(&raw_tokens, &mut ctx)
    };
    errors.extend(framing_errors);

    (framed, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_a_static_integer_initializer() {
        let (tokens, errors) = lex("var x = 2 + 3;", "main");
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(tokens[0].kind, TokenType::VariableDef);
        assert_eq!(tokens[0].value, Some(rill_value::Value::Integer(5)));
    }

    #[test]
    fn frames_an_if_statement() {
        let (tokens, errors) = lex("if (1 == 1) { var x = 1; }", "main");
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenType::IfCondBegin));
        assert!(kinds.contains(&TokenType::IfCondEnd));
        assert!(kinds.contains(&TokenType::IfBlockBegin));
        assert!(kinds.contains(&TokenType::IfBlockEnd));
    }

    #[test]
    fn frames_a_function_call() {
        let (tokens, errors) = lex("print(1, 2);", "main");
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenType::FunctionCallBegin));
        assert!(kinds.contains(&TokenType::ParamBegin));
        assert!(kinds.contains(&TokenType::ParamEnd));
        assert!(kinds.contains(&TokenType::FunctionCallEnd));
    }

    #[test]
    fn frames_a_for_loop_with_reordered_sections() {
        let (tokens, errors) = lex("for (var i = 0; i < 10; i++) { x = i; }", "main");
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.kind).collect();
        let init = kinds.iter().position(|k| *k == TokenType::ForInitBegin).unwrap();
        let cond = kinds.iter().position(|k| *k == TokenType::ForCondBegin).unwrap();
        let block = kinds.iter().position(|k| *k == TokenType::ForBlockBegin).unwrap();
        let update = kinds.iter().position(|k| *k == TokenType::ForUpdateBegin).unwrap();
        assert!(init < cond && cond < block && block < update);
    }

    #[test]
    fn local_declaration_outside_function_is_an_error() {
        let (_, errors) = lex("local var x = 1;", "main");
        assert!(!errors.is_empty());
    }
}
