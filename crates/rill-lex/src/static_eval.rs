//! Lex-time static initializer evaluation (§4.2.5): an in-line
//! shunting-yard over already-lexed tokens, restricted to literals,
//! operators, and references to variables whose value is already known.
//!
//! This runs *during* lexing, before the parser ever sees the token stream,
//! so `var x = 2 + 3;` stores the literal `Value::Integer(5)` directly on
//! the `VariableDef` token rather than the three tokens `2`, `+`, `3`.

use rill_value::{ops, BinOp, Collection, UnOp, Value};

use crate::error::LexErrorKind;
use crate::operator_meta::{self, Arity, Associativity, OpClass};
use crate::token::{Token, TokenType};

fn literal_value(tok: &Token) -> Option<Value> {
    match tok.kind {
        TokenType::IntLiteral
        | TokenType::DoubleLiteral
        | TokenType::CharLiteral
        | TokenType::StringLiteral
        | TokenType::BoolLiteral => tok.value.clone(),
        _ => None,
    }
}

fn to_binop(kind: TokenType) -> Option<BinOp> {
    use TokenType::*;
    Some(match kind {
        Plus => BinOp::Add,
        Minus => BinOp::Sub,
        Star => BinOp::Mul,
        Slash => BinOp::Div,
        Percent => BinOp::Mod,
        StarStar => BinOp::Exp,
        Caret => BinOp::BitXor,
        Amp => BinOp::BitAnd,
        Pipe => BinOp::BitOr,
        Shl => BinOp::ShiftLeft,
        Shr => BinOp::ShiftRight,
        EqEq => BinOp::Eq,
        BangEq => BinOp::Ne,
        Gt => BinOp::Gt,
        GtEq => BinOp::Ge,
        Lt => BinOp::Lt,
        LtEq => BinOp::Le,
        AmpAmp => BinOp::And,
        PipePipe => BinOp::Or,
        _ => return None,
    })
}

fn to_unop(kind: TokenType) -> Option<UnOp> {
    match kind {
        TokenType::Bang => Some(UnOp::Not),
        TokenType::Minus => Some(UnOp::Neg),
        TokenType::PlusPlus => Some(UnOp::Inc),
        TokenType::MinusMinus => Some(UnOp::Dec),
        _ => None,
    }
}

enum StackOp {
    Binary(TokenType),
    UnaryMinus,
    LParen,
}

fn apply(op: &StackOp, values: &mut Vec<Value>) -> Result<(), LexErrorKind> {
    match op {
        StackOp::LParen => Ok(()),
        StackOp::UnaryMinus => {
            let v = values.pop().ok_or(LexErrorKind::InvalidStaticExpression)?;
            let result =
                ops::unary(UnOp::Neg, &v).map_err(|_| LexErrorKind::InvalidStaticExpression)?;
            values.push(result);
            Ok(())
        }
        StackOp::Binary(kind) => {
            if let Some(unop) = to_unop(*kind) {
                if to_binop(*kind).is_none() {
                    let v = values.pop().ok_or(LexErrorKind::InvalidStaticExpression)?;
                    let result = ops::unary(unop, &v)
                        .map_err(|_| LexErrorKind::InvalidStaticExpression)?;
                    values.push(result);
                    return Ok(());
                }
            }
            let binop = to_binop(*kind).ok_or(LexErrorKind::InvalidStaticExpression)?;
            let rhs = values.pop().ok_or(LexErrorKind::InvalidStaticExpression)?;
            let lhs = values.pop().ok_or(LexErrorKind::InvalidStaticExpression)?;
            let result = ops::binary(binop, &lhs, &rhs).map_err(|e| match e {
                rill_value::ValueError::DivideByZero => LexErrorKind::StaticDivideByZero,
                rill_value::ValueError::ModuloByZero => LexErrorKind::StaticModuloByZero,
                _ => LexErrorKind::InvalidStaticExpression,
            })?;
            values.push(result);
            Ok(())
        }
    }
}

fn find_matching_brace(tokens: &[Token], open: usize) -> Result<usize, LexErrorKind> {
    let mut depth = 0i32;
    for (offset, tok) in tokens[open..].iter().enumerate() {
        match tok.kind {
            TokenType::LBrace => depth += 1,
            TokenType::RBrace => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + offset);
                }
            }
            _ => {}
        }
    }
    Err(LexErrorKind::UnbalancedDelimiters)
}

/// Split a collection literal's body into its top-level comma-separated
/// entries, respecting nested parens/braces/brackets.
fn split_entries(tokens: &[Token]) -> Vec<&[Token]> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut entries = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenType::LBrace | TokenType::LParen | TokenType::LBracket => depth += 1,
            TokenType::RBrace | TokenType::RParen | TokenType::RBracket => depth -= 1,
            TokenType::Comma if depth == 0 => {
                entries.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        entries.push(&tokens[start..]);
    }
    entries
}

/// Evaluate a `{ key: value, … }` literal's body (§4.2.5): an entry is
/// either `key: expr` (key a bareword or string literal) or a bare `expr`,
/// which takes the next sequential integer key the way a JSON array's
/// elements do.
fn evaluate_collection(
    tokens: &[Token],
    lookup: &impl Fn(&str) -> Option<Value>,
) -> Result<Value, LexErrorKind> {
    let mut collection = Collection::new();
    let mut next_index = 0usize;
    for entry in split_entries(tokens) {
        if entry.is_empty() {
            continue;
        }
        let (key, value_tokens): (String, &[Token]) = match (entry[0].kind, entry.get(1).map(|t| t.kind)) {
            (TokenType::Identifier, Some(TokenType::Colon)) => {
                let key = entry[0]
                    .identifier
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default();
                (key, &entry[2..])
            }
            (TokenType::StringLiteral, Some(TokenType::Colon)) => {
                let key = match &entry[0].value {
                    Some(Value::String(s)) => s.clone(),
                    _ => String::new(),
                };
                (key, &entry[2..])
            }
            _ => {
                let key = next_index.to_string();
                next_index += 1;
                (key, entry)
            }
        };
        let value = evaluate(value_tokens, lookup)?;
        if collection.contains_key(&key) {
            return Err(LexErrorKind::DuplicateKey(key));
        }
        collection.insert(key, value);
    }
    Ok(Value::Collection(collection))
}

/// Evaluate a fully self-contained token slice (no parens/statement
/// terminators outside the expression itself) as a static initializer.
/// `lookup` resolves a bareword identifier to an already-known `Value`
/// (e.g. an earlier `const`); any identifier `lookup` can't resolve makes
/// the whole expression non-static.
pub fn evaluate(
    tokens: &[Token],
    lookup: impl Fn(&str) -> Option<Value>,
) -> Result<Value, LexErrorKind> {
    if tokens.first().map(|t| t.kind) == Some(TokenType::LBrace) {
        let close = find_matching_brace(tokens, 0)?;
        if close != tokens.len() - 1 {
            return Err(LexErrorKind::InvalidStaticExpression);
        }
        return evaluate_collection(&tokens[1..close], &lookup);
    }

    let mut values: Vec<Value> = Vec::new();
    let mut ops_stack: Vec<StackOp> = Vec::new();
    let mut expect_operand = true;

    for tok in tokens {
        if let Some(v) = literal_value(tok) {
            if !expect_operand {
                return Err(LexErrorKind::InvalidStaticExpression);
            }
            values.push(v);
            expect_operand = false;
            continue;
        }
        match tok.kind {
            TokenType::Identifier => {
                if !expect_operand {
                    return Err(LexErrorKind::InvalidStaticExpression);
                }
                let name = tok
                    .identifier
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default();
                let v = lookup(&name)
                    .ok_or_else(|| LexErrorKind::UnknownIdentifier(name.clone()))?;
                values.push(v);
                expect_operand = false;
            }
            TokenType::LParen => {
                ops_stack.push(StackOp::LParen);
                expect_operand = true;
            }
            TokenType::RParen => {
                loop {
                    match ops_stack.pop() {
                        Some(StackOp::LParen) => break,
                        Some(other) => apply(&other, &mut values)?,
                        None => return Err(LexErrorKind::UnbalancedDelimiters),
                    }
                }
                expect_operand = false;
            }
            TokenType::Minus if expect_operand => {
                ops_stack.push(StackOp::UnaryMinus);
                expect_operand = true;
            }
            kind => {
                let meta = operator_meta::metadata(kind)
                    .ok_or(LexErrorKind::InvalidStaticExpression)?;
                if meta.class != OpClass::Operator {
                    return Err(LexErrorKind::InvalidStaticExpression);
                }
                while let Some(top) = ops_stack.last() {
                    let top_bp = match top {
                        StackOp::LParen => break,
                        StackOp::UnaryMinus => operator_meta::unary_minus().binding_power,
                        StackOp::Binary(k) => {
                            operator_meta::metadata(*k).map(|m| m.binding_power).unwrap_or(0)
                        }
                    };
                    let should_pop = if meta.associativity == Associativity::Left {
                        top_bp >= meta.binding_power
                    } else {
                        top_bp > meta.binding_power
                    };
                    if !should_pop {
                        break;
                    }
                    let popped = ops_stack.pop().unwrap();
                    apply(&popped, &mut values)?;
                }
                ops_stack.push(StackOp::Binary(kind));
                expect_operand = meta.arity == Arity::Binary || meta.arity == Arity::Unary;
            }
        }
    }

    while let Some(op) = ops_stack.pop() {
        if matches!(op, StackOp::LParen) {
            return Err(LexErrorKind::UnbalancedDelimiters);
        }
        apply(&op, &mut values)?;
    }

    if values.len() != 1 {
        return Err(LexErrorKind::InvalidStaticExpression);
    }
    Ok(values.pop().unwrap())
}
