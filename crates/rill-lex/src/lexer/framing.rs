//! Control-structure framing (§4.2.6) and declaration handling (§4.2.3,
//! §4.2.5, §4.2.7): the second lexer pass, which walks the flat raw token
//! stream and re-emits it with explicit region markers around every `if`,
//! `while`, `for`, `switch`, `block`, and function definition/call, plus
//! resolved `VariableDef` tokens for declarations.
//!
//! Everything here operates purely on token *shape* (matching parens and
//! braces, splitting on top-level commas/semicolons) — it never evaluates
//! an expression except through [`crate::static_eval`] for initializers.

use std::collections::HashMap;

use rill_util::Symbol;
use rill_value::Value;

use crate::error::{LexError, LexErrorKind};
use crate::scope::ScopeTracker;
use crate::static_eval;
use crate::token::{Scope, Token, TokenType};

pub struct FramingContext<'a> {
    pub tracker: &'a mut ScopeTracker,
    pub statics: &'a mut HashMap<String, Value>,
    pub errors: &'a mut Vec<LexError>,
}

fn find_matching(tokens: &[Token], open_idx: usize, open: TokenType, close: TokenType) -> Option<usize> {
    let mut depth = 0i32;
    for (offset, tok) in tokens[open_idx..].iter().enumerate() {
        if tok.kind == open {
            depth += 1;
        } else if tok.kind == close {
            depth -= 1;
            if depth == 0 {
                return Some(open_idx + offset);
            }
        }
    }
    None
}

fn matching_paren(tokens: &[Token], open_idx: usize) -> Option<usize> {
    find_matching(tokens, open_idx, TokenType::LParen, TokenType::RParen)
}

fn matching_brace(tokens: &[Token], open_idx: usize) -> Option<usize> {
    find_matching(tokens, open_idx, TokenType::LBrace, TokenType::RBrace)
}

/// Index (relative to `start`) of the first top-level `;` at or after
/// `start`, scanning within `tokens` and respecting nested delimiters.
fn find_statement_end(tokens: &[Token], start: usize) -> usize {
    let mut depth = 0i32;
    let mut i = start;
    while i < tokens.len() {
        match tokens[i].kind {
            TokenType::LParen | TokenType::LBrace | TokenType::LBracket => depth += 1,
            TokenType::RParen | TokenType::RBrace | TokenType::RBracket => depth -= 1,
            TokenType::Semicolon if depth == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    tokens.len().saturating_sub(1)
}

/// Split `tokens[start..end)` on top-level commas into argument ranges.
fn split_top_level_commas(tokens: &[Token], start: usize, end: usize) -> Vec<(usize, usize)> {
    if start >= end {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut seg_start = start;
    let mut i = start;
    while i < end {
        match tokens[i].kind {
            TokenType::LParen | TokenType::LBrace | TokenType::LBracket => depth += 1,
            TokenType::RParen | TokenType::RBrace | TokenType::RBracket => depth -= 1,
            TokenType::Comma if depth == 0 => {
                parts.push((seg_start, i));
                seg_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push((seg_start, end));
    parts
}

/// Recursively frame a flat expression token slice: wrap every call site
/// in `FUNCTION_CALL_BEGIN/PARAM_BEGIN/PARAM_END/FUNCTION_CALL_END` and
/// recurse into argument lists and parenthesized groups.
fn frame_expr(tokens: &[Token]) -> Vec<Token> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let tok = &tokens[i];
        if tok.kind == TokenType::Identifier
            && i + 1 < tokens.len()
            && tokens[i + 1].kind == TokenType::LParen
        {
            let open = i + 1;
            let Some(close) = matching_paren(tokens, open) else {
                out.push(tok.clone());
                i += 1;
                continue;
            };
            out.push(Token::new(TokenType::FunctionCallBegin, tok.location));
            out.push(tok.clone());
            for (a_start, a_end) in split_top_level_commas(tokens, open + 1, close) {
                let loc = tokens.get(a_start).map(|t| t.location).unwrap_or(tok.location);
                out.push(Token::new(TokenType::ParamBegin, loc));
                out.extend(frame_expr(&tokens[a_start..a_end]));
                out.push(Token::new(TokenType::ParamEnd, loc));
            }
            out.push(Token::new(TokenType::FunctionCallEnd, tokens[close].location));
            i = close + 1;
            continue;
        }
        if tok.kind == TokenType::LParen {
            if let Some(close) = matching_paren(tokens, i) {
                out.push(tok.clone());
                out.extend(frame_expr(&tokens[i + 1..close]));
                out.push(tokens[close].clone());
                i = close + 1;
                continue;
            }
        }
        out.push(tok.clone());
        i += 1;
    }
    out
}

fn name_of(tok: &Token) -> String {
    tok.identifier.map(|s| s.as_str().to_string()).unwrap_or_default()
}

/// Frame a single declaration statement (`var`/`local`/`script`/`global`,
/// optionally `const`, a name, then either `(params) { body }`, `= expr;`,
/// or a bare `;`). Returns the emitted tokens and the index just past the
/// statement's terminator.
fn frame_declaration(tokens: &[Token], start: usize, ctx: &mut FramingContext) -> (Vec<Token>, usize) {
    let mut i = start;
    let mut scope = Scope::Script;
    match tokens[i].kind {
        TokenType::KwLocal => {
            scope = Scope::Local;
            i += 1;
        }
        TokenType::KwScript => {
            scope = Scope::Script;
            i += 1;
        }
        TokenType::KwGlobal => {
            scope = Scope::Global;
            i += 1;
        }
        _ => {}
    }
    // The `var` keyword itself.
    debug_assert_eq!(tokens[i].kind, TokenType::KwVar);
    i += 1;

    let mut read_only = false;
    if tokens[i].kind == TokenType::KwConst {
        read_only = true;
        i += 1;
    }

    let name_tok = tokens[i].clone();
    let name = name_of(&name_tok);
    i += 1;

    let fq_name = match ctx.tracker.qualify(scope, &name) {
        Ok(fq) => fq,
        Err(kind) => {
            ctx.errors.push(LexError::new(kind, name_tok.location.span));
            name.clone()
        }
    };

    // Function definition: `var name(params) { body }`.
    if tokens[i].kind == TokenType::LParen {
        let open = i;
        let close = matching_paren(tokens, open).unwrap_or(tokens.len() - 1);
        let params: Vec<Token> = tokens[open + 1..close]
            .iter()
            .filter(|t| t.kind == TokenType::Identifier)
            .cloned()
            .collect();
        let body_open = close + 1;
        let body_close = matching_brace(tokens, body_open).unwrap_or(tokens.len() - 1);

        let mut out = vec![Token::new(TokenType::FunctionDefBegin, name_tok.location), name_tok];
        for p in params {
            out.push(Token::new(TokenType::ParamBegin, p.location));
            out.push(p.clone());
            out.push(Token::new(TokenType::ParamEnd, p.location));
        }
        ctx.tracker.enter_function(name.clone());
        out.extend(frame_block(&tokens[body_open + 1..body_close], ctx));
        ctx.tracker.exit_function();
        out.push(Token::new(TokenType::FunctionDefEnd, tokens[body_close].location));
        return (out, body_close + 1);
    }

    let mut def_tok = Token::new(TokenType::VariableDef, name_tok.location)
        .with_identifier(Symbol::intern(&name))
        .with_scope(scope);
    if read_only {
        def_tok = def_tok.read_only();
    }

    if tokens[i].kind == TokenType::Semicolon {
        return (vec![def_tok], i + 1);
    }

    debug_assert_eq!(tokens[i].kind, TokenType::Assign);
    let expr_start = i + 1;
    let stmt_end = find_statement_end(tokens, expr_start);
    let initializer = &tokens[expr_start..stmt_end];

    let lookup = |ident: &str| ctx.statics.get(ident).cloned();
    match static_eval::evaluate(initializer, lookup) {
        Ok(value) => {
            if read_only || matches!(scope, Scope::Script | Scope::Global) {
                ctx.statics.insert(name.clone(), value.clone());
            }
            def_tok = def_tok.with_value(value);
            let _ = fq_name;
            (vec![def_tok], stmt_end + 1)
        }
        Err(_) => {
            let mut out = vec![def_tok, Token::new(TokenType::Assign, tokens[i].location)];
            out.extend(frame_expr(initializer));
            out.push(tokens[stmt_end].clone());
            (out, stmt_end + 1)
        }
    }
}

/// Frame an `if`/`while` condition plus the statement body that follows it.
fn frame_cond_and_block(
    tokens: &[Token],
    start: usize,
    cond_begin: TokenType,
    cond_end: TokenType,
    block_begin: TokenType,
    block_end: TokenType,
    ctx: &mut FramingContext,
) -> (Vec<Token>, usize) {
    let open = start;
    let close = matching_paren(tokens, open).unwrap_or(tokens.len() - 1);
    let mut out = vec![Token::new(cond_begin, tokens[open].location)];
    out.extend(frame_expr(&tokens[open + 1..close]));
    out.push(Token::new(cond_end, tokens[close].location));

    let body_start = close + 1;
    let (body_out, next) = frame_braced_or_single(tokens, body_start, block_begin, block_end, ctx);
    out.extend(body_out);
    (out, next)
}

/// A statement body may be a `{ ... }` block or a single statement; both
/// get wrapped in the same pair of markers.
fn frame_braced_or_single(
    tokens: &[Token],
    start: usize,
    begin_kind: TokenType,
    end_kind: TokenType,
    ctx: &mut FramingContext,
) -> (Vec<Token>, usize) {
    if tokens[start].kind == TokenType::LBrace {
        let close = matching_brace(tokens, start).unwrap_or(tokens.len() - 1);
        let mut out = vec![Token::new(begin_kind, tokens[start].location)];
        out.extend(frame_block(&tokens[start + 1..close], ctx));
        out.push(Token::new(end_kind, tokens[close].location));
        (out, close + 1)
    } else {
        let (stmt_out, next) = frame_statement(tokens, start, ctx);
        let mut out = vec![Token::new(begin_kind, tokens[start].location)];
        out.extend(stmt_out);
        out.push(Token::new(end_kind, tokens[next.saturating_sub(1).max(start)].location));
        (out, next)
    }
}

fn frame_if(tokens: &[Token], start: usize, ctx: &mut FramingContext) -> (Vec<Token>, usize) {
    let paren = start + 1; // past `if`
    let (mut out, mut next) = frame_cond_and_block(
        tokens,
        paren,
        TokenType::IfCondBegin,
        TokenType::IfCondEnd,
        TokenType::IfBlockBegin,
        TokenType::IfBlockEnd,
        ctx,
    );
    if next < tokens.len() && tokens[next].kind == TokenType::KwElse {
        let else_body_start = next + 1;
        let (else_out, else_next) =
            frame_braced_or_single(tokens, else_body_start, TokenType::ElseBlockBegin, TokenType::ElseBlockEnd, ctx);
        out.extend(else_out);
        next = else_next;
    }
    (out, next)
}

fn frame_while(tokens: &[Token], start: usize, ctx: &mut FramingContext) -> (Vec<Token>, usize) {
    let paren = start + 1;
    frame_cond_and_block(
        tokens,
        paren,
        TokenType::WhileCondBegin,
        TokenType::WhileCondEnd,
        TokenType::WhileBlockBegin,
        TokenType::WhileBlockEnd,
        ctx,
    )
}

/// `for (init; cond; update) { block }`, re-ordered to init, cond, block,
/// update so the parser's straight-line walk needs only one back-jump
/// (§4.2.6).
fn frame_for(tokens: &[Token], start: usize, ctx: &mut FramingContext) -> (Vec<Token>, usize) {
    let open = start + 1;
    let close = matching_paren(tokens, open).unwrap_or(tokens.len() - 1);
    let inside = &tokens[open + 1..close];

    let first_semi = inside.iter().position(|t| t.kind == TokenType::Semicolon).unwrap_or(0);
    let rest = &inside[first_semi + 1..];
    let second_semi = rest.iter().position(|t| t.kind == TokenType::Semicolon).unwrap_or(0);

    let init_tokens = &inside[..first_semi];
    let cond_tokens = &rest[..second_semi];
    let update_tokens = &rest[second_semi + 1..];

    let mut out = vec![Token::new(TokenType::ForInitBegin, tokens[open].location)];
    out.extend(frame_expr(init_tokens));
    out.push(Token::new(TokenType::ForInitEnd, tokens[open].location));

    out.push(Token::new(TokenType::ForCondBegin, tokens[open].location));
    out.extend(frame_expr(cond_tokens));
    out.push(Token::new(TokenType::ForCondEnd, tokens[close].location));

    let body_start = close + 1;
    let (body_out, next) =
        frame_braced_or_single(tokens, body_start, TokenType::ForBlockBegin, TokenType::ForBlockEnd, ctx);
    out.extend(body_out);

    out.push(Token::new(TokenType::ForUpdateBegin, tokens[close].location));
    out.extend(frame_expr(update_tokens));
    out.push(Token::new(TokenType::ForUpdateEnd, tokens[close].location));

    (out, next)
}

/// `switch (cond) { case V: { block } ... default: { block } }`.
fn frame_switch(tokens: &[Token], start: usize, ctx: &mut FramingContext) -> (Vec<Token>, usize) {
    let open = start + 1;
    let close = matching_paren(tokens, open).unwrap_or(tokens.len() - 1);

    let mut out = vec![Token::new(TokenType::SwitchCondBegin, tokens[open].location)];
    out.extend(frame_expr(&tokens[open + 1..close]));
    out.push(Token::new(TokenType::SwitchCondEnd, tokens[close].location));

    let body_open = close + 1;
    let body_close = matching_brace(tokens, body_open).unwrap_or(tokens.len() - 1);
    out.push(Token::new(TokenType::SwitchBlockBegin, tokens[body_open].location));

    let mut i = body_open + 1;
    while i < body_close {
        match tokens[i].kind {
            TokenType::KwCase => {
                let colon = (i..body_close)
                    .find(|&j| tokens[j].kind == TokenType::Colon)
                    .unwrap_or(i);
                out.push(Token::new(TokenType::CaseCondBegin, tokens[i].location));
                out.extend(frame_expr(&tokens[i + 1..colon]));
                out.push(Token::new(TokenType::CaseCondEnd, tokens[colon].location));
                let case_body_open = colon + 1;
                let (body_out, next) = frame_braced_or_single(
                    tokens,
                    case_body_open,
                    TokenType::CaseBlockBegin,
                    TokenType::CaseBlockEnd,
                    ctx,
                );
                out.extend(body_out);
                i = next;
            }
            TokenType::KwDefault => {
                let colon = (i..body_close)
                    .find(|&j| tokens[j].kind == TokenType::Colon)
                    .unwrap_or(i);
                let case_body_open = colon + 1;
                let (body_out, next) = frame_braced_or_single(
                    tokens,
                    case_body_open,
                    TokenType::DefaultBlockBegin,
                    TokenType::DefaultBlockEnd,
                    ctx,
                );
                out.extend(body_out);
                i = next;
            }
            _ => i += 1,
        }
    }

    out.push(Token::new(TokenType::SwitchBlockEnd, tokens[body_close].location));
    (out, body_close + 1)
}

/// Frame one statement starting at `start`. Returns emitted tokens and the
/// index one past the statement.
fn frame_statement(tokens: &[Token], start: usize, ctx: &mut FramingContext) -> (Vec<Token>, usize) {
    match tokens[start].kind {
        TokenType::KwLocal | TokenType::KwScript | TokenType::KwGlobal | TokenType::KwVar => {
            frame_declaration(tokens, start, ctx)
        }
        TokenType::KwIf => frame_if(tokens, start, ctx),
        TokenType::KwWhile => frame_while(tokens, start, ctx),
        TokenType::KwFor => frame_for(tokens, start, ctx),
        TokenType::KwSwitch => frame_switch(tokens, start, ctx),
        TokenType::KwBlock => {
            let open = start + 1;
            let close = matching_brace(tokens, open).unwrap_or(tokens.len() - 1);
            let mut out = vec![Token::new(TokenType::BlockBegin, tokens[open].location)];
            out.extend(frame_block(&tokens[open + 1..close], ctx));
            out.push(Token::new(TokenType::BlockEnd, tokens[close].location));
            (out, close + 1)
        }
        TokenType::LBrace => {
            let close = matching_brace(tokens, start).unwrap_or(tokens.len() - 1);
            let mut out = vec![Token::new(TokenType::BlockBegin, tokens[start].location)];
            out.extend(frame_block(&tokens[start + 1..close], ctx));
            out.push(Token::new(TokenType::BlockEnd, tokens[close].location));
            (out, close + 1)
        }
        TokenType::Semicolon => (Vec::new(), start + 1),
        _ => {
            let end = find_statement_end(tokens, start);
            let mut out = frame_expr(&tokens[start..end]);
            if end < tokens.len() {
                out.push(tokens[end].clone());
            }
            (out, end + 1)
        }
    }
}

/// Frame a sequence of statements occupying the whole slice.
pub fn frame_block(tokens: &[Token], ctx: &mut FramingContext) -> Vec<Token> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].kind == TokenType::Eof {
            break;
        }
        let (emitted, next) = frame_statement(tokens, i, ctx);
        out.extend(emitted);
        i = next.max(i + 1);
    }
    out
}

