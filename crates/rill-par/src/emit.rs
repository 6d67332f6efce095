//! Bytecode emission (§4.3): walks the framed token stream produced by
//! [`rill_lex::lex`] and emits a flat `Vec<rill_bc::Instruction>`.
//!
//! The lexer has already done the structural work: every `if`/`while`/
//! `for`/`switch`/function body is delimited by a matched pair of framing
//! markers, and every declaration is a single `VariableDef` token with its
//! scope resolved and, where static evaluation succeeded, its initializer
//! already folded into a literal `Value`. The emitter's job is turning that
//! structure into addresses, jump targets, and a postfix instruction
//! sequence a stack machine can run directly — it never builds an AST.

use rill_bc::{Address, ElementKey, Instruction, Opcode};
use rill_lex::{metadata, unary_minus, Associativity, Scope, Token, TokenType};
use rill_util::{Span, Symbol};
use rill_value::Value;

use crate::error::{ParseError, ParseErrorKind};
use crate::symtab::{self, SymbolTable};

enum StackOp {
    Op(TokenType),
    UnaryMinus,
    LParen,
}

struct LoopCtx {
    continue_target: usize,
    break_jumps: Vec<usize>,
}

pub struct Emitter {
    program: Vec<Instruction>,
    symtab: SymbolTable,
    errors: Vec<ParseError>,
    loops: Vec<LoopCtx>,
}

/// Emit a whole module's bytecode from its framed token stream.
pub fn emit_program(tokens: &[Token]) -> (Vec<Instruction>, Vec<ParseError>) {
    let mut emitter = Emitter::new();
    emitter.emit_block(tokens);
    emitter.finish()
}

fn region_end(tokens: &[Token], open: usize, begin: TokenType, end: TokenType) -> usize {
    let mut depth = 0i32;
    for i in open..tokens.len() {
        if tokens[i].kind == begin {
            depth += 1;
        } else if tokens[i].kind == end {
            depth -= 1;
            if depth == 0 {
                return i;
            }
        }
    }
    tokens.len().saturating_sub(1)
}

fn opcode_for_binary(kind: TokenType) -> Option<Opcode> {
    use TokenType::*;
    Some(match kind {
        Plus => Opcode::Add,
        Minus => Opcode::Sub,
        Star => Opcode::Mul,
        Slash => Opcode::Div,
        Percent => Opcode::Mod,
        StarStar => Opcode::Exp,
        Caret => Opcode::Xor,
        Amp => Opcode::Bnd,
        Pipe => Opcode::Bor,
        Shl => Opcode::Svl,
        Shr => Opcode::Svr,
        EqEq => Opcode::Teq,
        BangEq => Opcode::Tne,
        Gt => Opcode::Tgr,
        GtEq => Opcode::Tge,
        Lt => Opcode::Tls,
        LtEq => Opcode::Tle,
        AmpAmp => Opcode::And,
        PipePipe => Opcode::Lor,
        _ => return None,
    })
}

fn opcode_for_unary(kind: TokenType) -> Option<Opcode> {
    match kind {
        TokenType::Bang => Some(Opcode::Not),
        TokenType::KwCastInt => Some(Opcode::Cti),
        TokenType::KwCastDouble => Some(Opcode::Ctd),
        TokenType::KwCastChar => Some(Opcode::Ctc),
        TokenType::KwCastString => Some(Opcode::Cts),
        TokenType::KwCastBool => Some(Opcode::Ctb),
        _ => None,
    }
}

impl Emitter {
    fn new() -> Self {
        Emitter {
            program: Vec::new(),
            symtab: SymbolTable::new(),
            errors: Vec::new(),
            loops: Vec::new(),
        }
    }

    fn finish(mut self) -> (Vec<Instruction>, Vec<ParseError>) {
        self.resolve_calls();
        self.program.push(Instruction::new(Opcode::End));
        (self.program, self.errors)
    }

    /// Forward references to user-defined functions only — builtins are
    /// resolved immediately in `emit_call` since `BUILTINS` is a fixed table
    /// with nothing to forward-declare.
    fn resolve_calls(&mut self) {
        let pending = std::mem::take(&mut self.symtab.pending_calls);
        for (idx, name) in pending {
            if let Some(entry) = self.symtab.functions.get(&name).copied() {
                self.program[idx].location = entry;
            } else {
                self.errors.push(ParseError::new(
                    ParseErrorKind::UndefinedFunction(name),
                    Span::default(),
                ));
            }
        }
    }

    fn emit(&mut self, ins: Instruction) -> usize {
        self.program.push(ins);
        self.program.len() - 1
    }

    fn push_error(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError::new(kind, span));
    }

    fn resolve_address(&mut self, tok: &Token) -> Option<Address> {
        let name = tok.identifier.map(|s| s.as_str().to_string()).unwrap_or_default();
        let addr = self.symtab.resolve(&name);
        if addr.is_none() {
            self.push_error(ParseErrorKind::UndefinedVariable(name), tok.location.span);
        }
        addr
    }

    /// `a`, `a[0]`, `a.field`, `a[0].field[1]` — an identifier optionally
    /// followed by a run of `[index]`/`.name` element-access steps (§4.4.3).
    /// Indices must be literal (an int or a string literal) since the
    /// resulting `Address` is resolved once at emit time, not re-walked on
    /// every access. Returns the fully-chained address and the index just
    /// past the consumed tokens.
    fn parse_element_chain(&mut self, tokens: &[Token], start: usize) -> (Option<Address>, usize) {
        let mut addr = self.resolve_address(&tokens[start]);
        let mut i = start + 1;
        while i < tokens.len() {
            match tokens[i].kind {
                TokenType::LBracket => {
                    let close = region_end(tokens, i, TokenType::LBracket, TokenType::RBracket);
                    let key = match tokens.get(i + 1) {
                        Some(t) if t.kind == TokenType::IntLiteral && close == i + 2 => {
                            match &t.value {
                                Some(Value::Integer(n)) if *n >= 0 => Some(ElementKey::Index(*n as usize)),
                                _ => None,
                            }
                        }
                        Some(t) if t.kind == TokenType::StringLiteral && close == i + 2 => {
                            match &t.value {
                                Some(Value::String(s)) => Some(ElementKey::Name(Symbol::intern(s))),
                                _ => None,
                            }
                        }
                        _ => None,
                    };
                    match key {
                        Some(k) => addr = addr.map(|a| a.index_by(k)),
                        None => {
                            self.push_error(ParseErrorKind::UnexpectedToken, tokens[i].location.span);
                            addr = None;
                        }
                    }
                    i = close + 1;
                }
                TokenType::Dot if i + 1 < tokens.len() && tokens[i + 1].kind == TokenType::Identifier => {
                    if let Some(id) = tokens[i + 1].identifier {
                        addr = addr.map(|a| a.index_by(ElementKey::Name(id)));
                    }
                    i += 2;
                }
                _ => break,
            }
        }
        (addr, i)
    }

    /// Whether `tokens[start]` begins an element-access chain (`a[..]` or
    /// `a.name`) rather than a bare identifier.
    fn starts_element_chain(tokens: &[Token], start: usize) -> bool {
        tokens.get(start).map(|t| t.kind) == Some(TokenType::Identifier)
            && matches!(
                tokens.get(start + 1).map(|t| t.kind),
                Some(TokenType::LBracket) | Some(TokenType::Dot)
            )
    }

    /// Pure syntactic counterpart of [`Self::parse_element_chain`]: the
    /// index just past the chain, without resolving addresses or reporting
    /// errors. Used to check whether an assignment's left-hand side is
    /// exactly an element chain before committing to resolving it.
    fn element_chain_end(tokens: &[Token], start: usize) -> usize {
        let mut i = start + 1;
        while i < tokens.len() {
            match tokens[i].kind {
                TokenType::LBracket => {
                    i = region_end(tokens, i, TokenType::LBracket, TokenType::RBracket) + 1;
                }
                TokenType::Dot if i + 1 < tokens.len() && tokens[i + 1].kind == TokenType::Identifier => {
                    i += 2;
                }
                _ => break,
            }
        }
        i
    }

    // --- statements ----------------------------------------------------

    fn emit_block(&mut self, tokens: &[Token]) {
        let mut i = 0;
        while i < tokens.len() {
            i = self.emit_statement(tokens, i);
        }
    }

    fn emit_statement(&mut self, tokens: &[Token], i: usize) -> usize {
        match tokens[i].kind {
            TokenType::Eof | TokenType::Semicolon => i + 1,
            TokenType::VariableDef => self.emit_var_def(tokens, i),
            TokenType::FunctionDefBegin => self.emit_function_def(tokens, i),
            TokenType::IfCondBegin => self.emit_if(tokens, i),
            TokenType::WhileCondBegin => self.emit_while(tokens, i),
            TokenType::ForInitBegin => self.emit_for(tokens, i),
            TokenType::SwitchCondBegin => self.emit_switch(tokens, i),
            TokenType::BlockBegin => {
                let end = region_end(tokens, i, TokenType::BlockBegin, TokenType::BlockEnd);
                self.emit_block(&tokens[i + 1..end]);
                end + 1
            }
            TokenType::KwReturn => self.emit_return(tokens, i),
            TokenType::KwBreak | TokenType::KwBrk => self.emit_break(tokens, i),
            TokenType::KwContinue => self.emit_continue(tokens, i),
            TokenType::KwStop => {
                self.emit(Instruction::new(Opcode::End));
                find_semicolon(tokens, i) + 1
            }
            _ => self.emit_expr_statement(tokens, i),
        }
    }

    fn emit_var_def(&mut self, tokens: &[Token], i: usize) -> usize {
        let tok = tokens[i].clone();
        let name = tok.identifier.map(|s| s.as_str().to_string()).unwrap_or_default();
        let scope = tok.scope.unwrap_or(Scope::Script);
        let baked = tok.value.clone();
        let placeholder = baked.clone().unwrap_or_else(Value::default_unit);

        let addr = match scope {
            Scope::Local => {
                let offset = self.symtab.declare_local(&name);
                let mut ins = Instruction::new(Opcode::Slv)
                    .with_operand(offset)
                    .with_value(placeholder)
                    .with_address(Address::frame(offset));
                if let Some(id) = tok.identifier {
                    ins = ins.with_variable_name(id);
                }
                self.emit(ins);
                Address::frame(offset)
            }
            Scope::Script | Scope::Global => {
                let slot = self.symtab.declare_global(&name);
                let mut ins = Instruction::new(Opcode::Def)
                    .with_operand(slot)
                    .with_value(placeholder)
                    .with_address(Address::global(slot));
                if let Some(id) = tok.identifier {
                    ins = ins.with_variable_name(id);
                }
                self.emit(ins);
                Address::global(slot)
            }
        };

        // A lex-time-unfoldable initializer (`var x = someCall();`) survives
        // framing as this same `VariableDef` immediately followed by a bare
        // `Assign` + the initializer expression — the declaration above
        // registers the slot with a placeholder, and this stores the real
        // value once it's computed.
        let mut next = i + 1;
        if baked.is_none() && next < tokens.len() && tokens[next].kind == TokenType::Assign {
            let semi = find_semicolon(tokens, next + 1);
            self.emit_expr(&tokens[next + 1..semi]);
            let mut store = Instruction::new(Opcode::Sav).with_address(addr);
            if let Some(id) = tok.identifier {
                store = store.with_variable_name(id);
            }
            self.emit(store);
            next = semi + 1;
        }
        next
    }

    fn emit_function_def(&mut self, tokens: &[Token], i: usize) -> usize {
        let end = region_end(tokens, i, TokenType::FunctionDefBegin, TokenType::FunctionDefEnd);
        let name_tok = &tokens[i + 1];
        let name = name_tok.identifier.map(|s| s.as_str().to_string()).unwrap_or_default();

        // A forward JMP over the body, patched once the body's length is known.
        let skip_jmp = self.emit(Instruction::new(Opcode::Jmp));
        let entry = self.program.len();
        let handler_kind = match name.as_str() {
            "onError" => Some(None),
            "onTick" => Some(Some(Value::Integer(1))),
            _ => None,
        };
        self.symtab.functions.insert(name, entry);

        self.symtab.enter_function();
        let mut j = i + 2;
        let mut param_count = 0;
        while j < end && tokens[j].kind == TokenType::ParamBegin {
            let ident = &tokens[j + 1];
            let pname = ident.identifier.map(|s| s.as_str().to_string()).unwrap_or_default();
            self.symtab.declare_local(&pname);
            param_count += 1;
            j += 3; // ParamBegin, Identifier, ParamEnd
        }
        self.emit(Instruction::new(Opcode::Psp).with_operand(param_count));
        self.emit_block(&tokens[j..end]);
        self.emit(Instruction::new(Opcode::Ret));
        self.symtab.exit_function();

        self.program[skip_jmp].location = self.program.len();

        // `onError`/`onTick` are reserved names: defining one registers it as
        // the module's event handler (§4.4.4/§4.6) via EFI, emitted here so
        // registration runs during ordinary top-level flow, after the skip
        // jump rather than inside the body it guards.
        if let Some(value) = handler_kind {
            let mut efi = Instruction::new(Opcode::Efi).with_location(entry);
            if let Some(value) = value {
                efi = efi.with_value(value);
            }
            self.emit(efi);
        }

        end + 1
    }

    fn emit_return(&mut self, tokens: &[Token], i: usize) -> usize {
        let semi = find_semicolon(tokens, i + 1);
        if semi > i + 1 {
            self.emit_expr(&tokens[i + 1..semi]);
        } else {
            self.emit(Instruction::new(Opcode::Psi).with_value(Value::default_unit()));
        }
        self.emit(Instruction::new(Opcode::Ret));
        semi + 1
    }

    fn emit_break(&mut self, tokens: &[Token], i: usize) -> usize {
        let jmp = self.emit(Instruction::new(Opcode::Jmp));
        match self.loops.last_mut() {
            Some(ctx) => ctx.break_jumps.push(jmp),
            None => self.push_error(ParseErrorKind::BreakOutsideLoop, tokens[i].location.span),
        }
        find_semicolon(tokens, i) + 1
    }

    fn emit_continue(&mut self, tokens: &[Token], i: usize) -> usize {
        match self.loops.last() {
            Some(ctx) => {
                let target = ctx.continue_target;
                self.emit(Instruction::new(Opcode::Jmp).with_location(target));
            }
            None => self.push_error(ParseErrorKind::ContinueOutsideLoop, tokens[i].location.span),
        }
        find_semicolon(tokens, i) + 1
    }

    fn emit_expr_statement(&mut self, tokens: &[Token], i: usize) -> usize {
        let semi = find_semicolon(tokens, i);
        let stmt = &tokens[i..semi.min(tokens.len())];
        self.emit_possible_assignment(stmt);
        semi + 1
    }

    /// `<lvalue> = <expr>` / `<lvalue> += <expr>` (etc.) / a bare expression.
    fn emit_possible_assignment(&mut self, tokens: &[Token]) {
        let assign_pos = tokens.iter().position(|t| {
            matches!(
                t.kind,
                TokenType::Assign
                    | TokenType::PlusEq
                    | TokenType::MinusEq
                    | TokenType::StarEq
                    | TokenType::SlashEq
                    | TokenType::PercentEq
            )
        });
        let Some(pos) = assign_pos else {
            self.emit_expr(tokens);
            return;
        };
        if tokens[0].kind != TokenType::Identifier {
            self.emit_expr(tokens);
            return;
        }
        let target = tokens[0].clone();
        let is_chain = Self::starts_element_chain(tokens, 0);
        let lvalue_end = if is_chain { Self::element_chain_end(tokens, 0) } else { 1 };
        if lvalue_end != pos {
            // Not a simple `<lvalue> <op>= expr`; evaluate as a plain
            // expression (covers e.g. a bare call whose arguments happen to
            // contain `=` nested inside already-framed parens, which never
            // reaches here).
            self.emit_expr(tokens);
            return;
        }
        let addr = if is_chain {
            self.parse_element_chain(tokens, 0).0
        } else {
            self.resolve_address(&target)
        };
        let rhs = &tokens[pos + 1..];
        match tokens[pos].kind {
            TokenType::Assign => {
                self.emit_expr(rhs);
                let mut ins = Instruction::new(Opcode::Sav);
                if let Some(a) = addr {
                    ins = ins.with_address(a);
                }
                if let Some(id) = target.identifier {
                    ins = ins.with_variable_name(id);
                }
                self.emit(ins);
            }
            compound => {
                self.emit_expr(rhs);
                let opcode = match compound {
                    TokenType::PlusEq => Opcode::Ada,
                    TokenType::MinusEq => Opcode::Sua,
                    TokenType::StarEq => Opcode::Mua,
                    TokenType::SlashEq => Opcode::Dia,
                    TokenType::PercentEq => Opcode::Moa,
                    _ => unreachable!(),
                };
                let mut ins = Instruction::new(opcode);
                if let Some(a) = addr {
                    ins = ins.with_address(a);
                }
                if let Some(id) = target.identifier {
                    ins = ins.with_variable_name(id);
                }
                self.emit(ins);
            }
        }
    }

    fn emit_if(&mut self, tokens: &[Token], i: usize) -> usize {
        let cond_end = region_end(tokens, i, TokenType::IfCondBegin, TokenType::IfCondEnd);
        self.emit_expr(&tokens[i + 1..cond_end]);
        let jif = self.emit(Instruction::new(Opcode::Jif));

        let block_start = cond_end + 1;
        let block_end = region_end(tokens, block_start, TokenType::IfBlockBegin, TokenType::IfBlockEnd);
        self.emit_block(&tokens[block_start + 1..block_end]);

        let mut after = block_end + 1;
        if after < tokens.len() && tokens[after].kind == TokenType::ElseBlockBegin {
            let jmp_past_else = self.emit(Instruction::new(Opcode::Jmp));
            self.program[jif].location = self.program.len();
            let else_end = region_end(tokens, after, TokenType::ElseBlockBegin, TokenType::ElseBlockEnd);
            self.emit_block(&tokens[after + 1..else_end]);
            self.program[jmp_past_else].location = self.program.len();
            after = else_end + 1;
        } else {
            self.program[jif].location = self.program.len();
        }
        after
    }

    fn emit_while(&mut self, tokens: &[Token], i: usize) -> usize {
        let cond_start = i;
        let loop_top = self.program.len();
        let cond_end = region_end(tokens, cond_start, TokenType::WhileCondBegin, TokenType::WhileCondEnd);
        self.emit_expr(&tokens[cond_start + 1..cond_end]);
        let jif = self.emit(Instruction::new(Opcode::Jif));

        self.loops.push(LoopCtx { continue_target: loop_top, break_jumps: Vec::new() });
        let block_start = cond_end + 1;
        let block_end = region_end(tokens, block_start, TokenType::WhileBlockBegin, TokenType::WhileBlockEnd);
        self.emit_block(&tokens[block_start + 1..block_end]);
        self.emit(Instruction::new(Opcode::Jmp).with_location(loop_top));

        let after_loop = self.program.len();
        self.program[jif].location = after_loop;
        let ctx = self.loops.pop().unwrap();
        for b in ctx.break_jumps {
            self.program[b].location = after_loop;
        }
        block_end + 1
    }

    fn emit_for(&mut self, tokens: &[Token], i: usize) -> usize {
        let init_end = region_end(tokens, i, TokenType::ForInitBegin, TokenType::ForInitEnd);
        self.emit_possible_assignment_or_decl(&tokens[i + 1..init_end]);

        let cond_start = init_end + 1;
        let loop_top = self.program.len();
        let cond_end = region_end(tokens, cond_start, TokenType::ForCondBegin, TokenType::ForCondEnd);
        self.emit_expr(&tokens[cond_start + 1..cond_end]);
        let jif = self.emit(Instruction::new(Opcode::Jif));

        let block_start = cond_end + 1;
        let block_end = region_end(tokens, block_start, TokenType::ForBlockBegin, TokenType::ForBlockEnd);

        let update_start = block_end + 1;
        let update_end = region_end(tokens, update_start, TokenType::ForUpdateBegin, TokenType::ForUpdateEnd);

        self.loops.push(LoopCtx { continue_target: 0, break_jumps: Vec::new() });
        self.emit_block(&tokens[block_start + 1..block_end]);
        let update_target = self.program.len();
        if let Some(ctx) = self.loops.last_mut() {
            ctx.continue_target = update_target;
        }
        self.emit_possible_assignment(&tokens[update_start + 1..update_end]);
        self.emit(Instruction::new(Opcode::Jmp).with_location(loop_top));

        let after_loop = self.program.len();
        self.program[jif].location = after_loop;
        let ctx = self.loops.pop().unwrap();
        for b in ctx.break_jumps {
            self.program[b].location = after_loop;
        }
        update_end + 1
    }

    fn emit_possible_assignment_or_decl(&mut self, tokens: &[Token]) {
        if tokens.is_empty() {
            return;
        }
        if tokens[0].kind == TokenType::VariableDef {
            self.emit_var_def(tokens, 0);
        } else {
            self.emit_possible_assignment(tokens);
        }
    }

    fn emit_switch(&mut self, tokens: &[Token], i: usize) -> usize {
        let cond_end = region_end(tokens, i, TokenType::SwitchCondBegin, TokenType::SwitchCondEnd);
        self.emit_expr(&tokens[i + 1..cond_end]);
        // The subject value sits on the stack once; stash it in a hidden
        // global so each case arm can re-read it without recomputing an
        // expression that may have side effects.
        let subject_slot = self.symtab.declare_global(&format!("$switch{}", i));
        self.emit(Instruction::new(Opcode::Sav).with_address(Address::global(subject_slot)));

        let body_start = cond_end + 1;
        let body_end = region_end(tokens, body_start, TokenType::SwitchBlockBegin, TokenType::SwitchBlockEnd);

        self.loops.push(LoopCtx { continue_target: usize::MAX, break_jumps: Vec::new() });

        let mut end_jumps = Vec::new();
        let mut j = body_start + 1;
        let mut default_block: Option<(usize, usize)> = None;
        while j < body_end {
            match tokens[j].kind {
                TokenType::CaseCondBegin => {
                    let case_cond_end = region_end(tokens, j, TokenType::CaseCondBegin, TokenType::CaseCondEnd);
                    self.emit(
                        Instruction::new(Opcode::Psv).with_address(Address::global(subject_slot)),
                    );
                    self.emit_expr(&tokens[j + 1..case_cond_end]);
                    self.emit(Instruction::new(Opcode::Teq));
                    let jif = self.emit(Instruction::new(Opcode::Jif));

                    let cb_start = case_cond_end + 1;
                    let cb_end = region_end(tokens, cb_start, TokenType::CaseBlockBegin, TokenType::CaseBlockEnd);
                    self.emit_block(&tokens[cb_start + 1..cb_end]);
                    end_jumps.push(self.emit(Instruction::new(Opcode::Jmp)));
                    self.program[jif].location = self.program.len();
                    j = cb_end + 1;
                }
                TokenType::DefaultBlockBegin => {
                    let db_end = region_end(tokens, j, TokenType::DefaultBlockBegin, TokenType::DefaultBlockEnd);
                    default_block = Some((j + 1, db_end));
                    j = db_end + 1;
                }
                _ => j += 1,
            }
        }
        if let Some((start, end)) = default_block {
            self.emit_block(&tokens[start..end]);
        }
        let after_switch = self.program.len();
        for jmp in end_jumps {
            self.program[jmp].location = after_switch;
        }
        let ctx = self.loops.pop().unwrap();
        for b in ctx.break_jumps {
            self.program[b].location = after_switch;
        }
        body_end + 1
    }

    // --- expressions -----------------------------------------------------

    fn emit_expr(&mut self, tokens: &[Token]) {
        let mut ops: Vec<StackOp> = Vec::new();
        let mut expect_operand = true;
        let mut i = 0;
        while i < tokens.len() {
            let tok = &tokens[i];
            match tok.kind {
                TokenType::IntLiteral
                | TokenType::DoubleLiteral
                | TokenType::CharLiteral
                | TokenType::StringLiteral
                | TokenType::BoolLiteral => {
                    self.emit(Instruction::new(Opcode::Psi).with_value(tok.value.clone().unwrap()));
                    expect_operand = false;
                    i += 1;
                }
                TokenType::Identifier if Self::starts_element_chain(tokens, i) => {
                    let (addr, next) = self.parse_element_chain(tokens, i);
                    let mut ins = Instruction::new(Opcode::Pcv);
                    if let Some(a) = addr {
                        ins = ins.with_address(a);
                    }
                    self.emit(ins);
                    i = next;
                    expect_operand = false;
                }
                TokenType::Identifier => {
                    if i + 1 < tokens.len()
                        && matches!(tokens[i + 1].kind, TokenType::PlusPlus | TokenType::MinusMinus)
                    {
                        let is_inc = tokens[i + 1].kind == TokenType::PlusPlus;
                        self.emit_increment(tok, is_inc, false);
                        i += 2;
                    } else {
                        self.emit_identifier_read(tok);
                        i += 1;
                    }
                    expect_operand = false;
                }
                TokenType::FunctionCallBegin => {
                    let end = region_end(tokens, i, TokenType::FunctionCallBegin, TokenType::FunctionCallEnd);
                    self.emit_call(tokens, i, end);
                    i = end + 1;
                    expect_operand = false;
                }
                TokenType::LParen => {
                    ops.push(StackOp::LParen);
                    expect_operand = true;
                    i += 1;
                }
                TokenType::RParen => {
                    while let Some(top) = ops.pop() {
                        if matches!(top, StackOp::LParen) {
                            break;
                        }
                        self.apply_stack_op(&top);
                    }
                    expect_operand = false;
                    i += 1;
                }
                TokenType::Minus if expect_operand => {
                    ops.push(StackOp::UnaryMinus);
                    expect_operand = true;
                    i += 1;
                }
                TokenType::PlusPlus | TokenType::MinusMinus
                    if i + 1 < tokens.len() && tokens[i + 1].kind == TokenType::Identifier =>
                {
                    let is_inc = tok.kind == TokenType::PlusPlus;
                    let ident = tokens[i + 1].clone();
                    self.emit_increment(&ident, is_inc, true);
                    i += 2;
                    expect_operand = false;
                }
                kind if metadata(kind).is_some() => {
                    self.push_operator(&mut ops, kind);
                    expect_operand = true;
                    i += 1;
                }
                _ => {
                    i += 1;
                }
            }
        }
        while let Some(op) = ops.pop() {
            self.apply_stack_op(&op);
        }
    }

    fn emit_identifier_read(&mut self, tok: &Token) {
        let addr = self.resolve_address(tok);
        let mut ins = Instruction::new(Opcode::Psv);
        if let Some(a) = addr {
            ins = ins.with_address(a);
        }
        if let Some(id) = tok.identifier {
            ins = ins.with_variable_name(id);
        }
        self.emit(ins);
    }

    /// `operand == 1` marks "push the post-mutation value" (prefix
    /// `++x`/`--x`); `operand == 0` marks "push the pre-mutation value"
    /// (postfix `x++`/`x--`) — both read, mutate, and store in one opcode.
    fn emit_increment(&mut self, ident: &Token, is_inc: bool, prefix: bool) {
        let addr = self.resolve_address(ident);
        let opcode = if is_inc { Opcode::Inl } else { Opcode::Del };
        let mut ins = Instruction::new(opcode).with_operand(if prefix { 1 } else { 0 });
        if let Some(a) = addr {
            ins = ins.with_address(a);
        }
        if let Some(id) = ident.identifier {
            ins = ins.with_variable_name(id);
        }
        self.emit(ins);
    }

    fn push_operator(&mut self, ops: &mut Vec<StackOp>, kind: TokenType) {
        let meta = metadata(kind).expect("caller only calls this when metadata exists");
        while let Some(top) = ops.last() {
            let top_bp = match top {
                StackOp::LParen => break,
                StackOp::UnaryMinus => unary_minus().binding_power,
                StackOp::Op(k) => metadata(*k).map(|m| m.binding_power).unwrap_or(0),
            };
            let should_pop = if meta.associativity == Associativity::Left {
                top_bp >= meta.binding_power
            } else {
                top_bp > meta.binding_power
            };
            if !should_pop {
                break;
            }
            let popped = ops.pop().unwrap();
            self.apply_stack_op(&popped);
        }
        ops.push(StackOp::Op(kind));
    }

    fn apply_stack_op(&mut self, op: &StackOp) {
        match op {
            StackOp::LParen => {}
            StackOp::UnaryMinus => {
                self.emit(Instruction::new(Opcode::Neg));
            }
            StackOp::Op(kind) => {
                if let Some(opcode) = opcode_for_binary(*kind) {
                    self.emit(Instruction::new(opcode));
                } else if let Some(opcode) = opcode_for_unary(*kind) {
                    self.emit(Instruction::new(opcode));
                }
            }
        }
    }

    fn emit_call(&mut self, tokens: &[Token], start: usize, end: usize) -> usize {
        let name_tok = &tokens[start + 1];
        let name = name_tok.identifier.map(|s| s.as_str().to_string()).unwrap_or_default();

        let mut argc = 0;
        let mut j = start + 2;
        while j < end {
            if tokens[j].kind == TokenType::ParamBegin {
                let pend = region_end(tokens, j, TokenType::ParamBegin, TokenType::ParamEnd);
                self.emit_expr(&tokens[j + 1..pend]);
                argc += 1;
                j = pend + 1;
            } else {
                j += 1;
            }
        }

        if let Some(b) = symtab::lookup_builtin(&name) {
            if argc < b.min_params {
                self.push_error(
                    ParseErrorKind::TooFewArguments {
                        function: name.clone(),
                        expected: b.min_params,
                        found: argc,
                    },
                    name_tok.location.span,
                );
            }

            // Builtins are a fixed table known at emission time, so they
            // dispatch through their own opcode instead of the forward-
            // referencing `Jsr`/`pending_calls` machinery user functions need.
            let mut ins = Instruction::new(Opcode::Jbf)
                .with_operand(argc)
                .with_value(Value::Integer(b.id as i64));
            if let Some(id) = name_tok.identifier {
                ins = ins.with_variable_name(id);
            }
            self.emit(ins);
            return end + 1;
        }

        let mut ins = Instruction::new(Opcode::Jsr).with_operand(argc);
        if let Some(id) = name_tok.identifier {
            ins = ins.with_variable_name(id);
        }
        let idx = self.emit(ins);
        self.symtab.pending_calls.push((idx, name));
        end + 1
    }
}

fn find_semicolon(tokens: &[Token], start: usize) -> usize {
    let mut depth = 0i32;
    let mut i = start;
    while i < tokens.len() {
        match tokens[i].kind {
            TokenType::LParen | TokenType::LBrace | TokenType::LBracket => depth += 1,
            TokenType::RParen | TokenType::RBrace | TokenType::RBracket => depth -= 1,
            TokenType::Semicolon if depth <= 0 => return i,
            _ => {}
        }
        i += 1;
    }
    tokens.len().saturating_sub(1)
}
