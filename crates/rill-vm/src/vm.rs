//! The stack machine itself: one flat instruction array, one operand stack,
//! and a call-frame stack for locals — no heap-allocated AST, no separate
//! "evaluate" step, just `pc` walking `program` (§4.4, §5).

use rill_bc::{Address, ElementKey, Instruction, Opcode};
use rill_value::{ops, BinOp, Collection, Tag, UnOp, Value};
use tracing::trace;

use crate::builtins;
use crate::error::{VmError, VmResult};
use crate::hooks::{EventHook, HookDecision, NullHooks};

/// One function-call activation: its local/parameter slots and where to
/// resume the caller.
struct Frame {
    locals: Vec<Value>,
    return_pc: usize,
}

/// The running state of one module's program.
///
/// Concurrency (§5): a `Vm` is single-threaded by construction — the
/// operand stack and frame stack are owned `Vec`s with no interior
/// mutability — so running several scripts in parallel means one `Vm` per
/// worker thread, never a shared one.
pub struct Vm<'a> {
    program: &'a [Instruction],
    globals: Vec<Value>,
    stack: Vec<Value>,
    frames: Vec<Frame>,
    /// Entry points pushed by `EFI`, popped by `RFE` (§4.6): where execution
    /// resumes if a fatal error reaches this point in the call chain instead
    /// of unwinding all the way out.
    error_frames: Vec<usize>,
    /// Updated (informationally) by `CID`; not consulted by a single-module
    /// program, but present so a multi-module host can tell which module's
    /// instructions are currently executing.
    last_module_id: usize,
    /// Instruction count at which the on-tick handler should next run — the
    /// embeddable VM's deterministic substitute for §4.6's wall-clock
    /// cadence (§4.7a).
    next_tick: u64,
    /// Entry address of the current module's on-tick handler, registered by
    /// an `EFI` instruction with a tick-kind payload. `None` if the module
    /// never defined one.
    on_tick_entry: Option<usize>,
    pc: usize,
    instructions_run: u64,
}

const MAX_CALL_DEPTH: usize = 4096;

/// How many instructions between on-tick dispatches — the VM's proxy for
/// §4.6's "current time + 1/10 s" when no host `EventHook` overrides `on_tick`.
const TICK_INTERVAL: u64 = 1000;

impl<'a> Vm<'a> {
    pub fn new(program: &'a [Instruction]) -> Self {
        Vm {
            program,
            globals: Vec::new(),
            stack: Vec::new(),
            frames: Vec::new(),
            error_frames: Vec::new(),
            last_module_id: 0,
            next_tick: TICK_INTERVAL,
            on_tick_entry: None,
            pc: 0,
            instructions_run: 0,
        }
    }

    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    /// Run to completion (`END`) using the no-op hook.
    pub fn run(&mut self) -> VmResult<()> {
        self.run_with_hooks(&mut NullHooks)
    }

    /// Run to completion, consulting `hooks` before every instruction and on
    /// every raised error (§4.6).
    ///
    /// Two dispatch paths run independently: the script's own `on_error`/
    /// `on_tick` handlers (registered by `EFI`, invoked unconditionally per
    /// §4.4.4/§4.6 whenever one is present) and the embedding `hooks`
    /// (§4.7a), which observes every tick and error regardless of whether
    /// the script itself handles them.
    pub fn run_with_hooks(&mut self, hooks: &mut dyn EventHook) -> VmResult<()> {
        loop {
            if self.pc >= self.program.len() {
                return Err(VmError::ProgramCounterOutOfBounds(self.pc));
            }
            match hooks.on_tick(self.instructions_run) {
                HookDecision::Continue => {}
                HookDecision::Halt => return Ok(()),
            }
            if let Some(entry) = self.on_tick_entry {
                if self.instructions_run >= self.next_tick {
                    self.next_tick = self.instructions_run + TICK_INTERVAL;
                    self.dispatch_handler(entry)?;
                }
            }
            self.instructions_run += 1;

            let ins = &self.program[self.pc];
            trace!(pc = self.pc, opcode = %ins.opcode, "dispatch");
            if ins.opcode == Opcode::End {
                return Ok(());
            }
            match self.step(ins) {
                Ok(()) => {}
                Err(err) => {
                    let _ = hooks.on_error(&err);
                    if let Some(resume) = self.error_frames.last().copied() {
                        self.pc = resume;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Run a registered handler to completion without disturbing the
    /// mainloop's `pc` — used for the on-tick dispatch that interleaves with
    /// normal execution rather than replacing it. Saves `pc` in a synthetic
    /// frame the handler's own `RET` pops, same as an ordinary call.
    fn dispatch_handler(&mut self, entry: usize) -> VmResult<()> {
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(VmError::CallStackOverflow(MAX_CALL_DEPTH));
        }
        self.frames.push(Frame {
            locals: Vec::new(),
            return_pc: self.pc,
        });
        let target_depth = self.frames.len() - 1;
        self.pc = entry;
        loop {
            if self.pc >= self.program.len() {
                return Err(VmError::ProgramCounterOutOfBounds(self.pc));
            }
            let ins = &self.program[self.pc];
            self.step(ins)?;
            if self.frames.len() <= target_depth {
                break;
            }
        }
        Ok(())
    }

    fn pop(&mut self) -> VmResult<Value> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    fn push(&mut self, v: Value) {
        self.stack.push(v);
    }

    fn read_address(&self, addr: &Address) -> VmResult<Value> {
        match addr {
            Address::Global(slot) => self
                .globals
                .get(*slot)
                .cloned()
                .ok_or(VmError::UndefinedGlobal(*slot)),
            Address::Frame(offset) => {
                let frame = self.frames.last().ok_or(VmError::NoActiveFrame)?;
                frame
                    .locals
                    .get(*offset)
                    .cloned()
                    .ok_or(VmError::UndefinedLocal(*offset))
            }
            Address::Element { root, path } => {
                let mut value = self.read_address(root)?;
                for key in path {
                    value = index_into(&value, key)?;
                }
                Ok(value)
            }
        }
    }

    fn write_address(&mut self, addr: &Address, value: Value) -> VmResult<()> {
        match addr {
            Address::Global(slot) => {
                if *slot >= self.globals.len() {
                    self.globals.resize(*slot + 1, Value::default_unit());
                }
                self.globals[*slot] = value;
                Ok(())
            }
            Address::Frame(offset) => {
                let frame = self.frames.last_mut().ok_or(VmError::NoActiveFrame)?;
                if *offset >= frame.locals.len() {
                    frame.locals.resize(*offset + 1, Value::default_unit());
                }
                frame.locals[*offset] = value;
                Ok(())
            }
            Address::Element { root, path } => {
                let mut root_value = self.read_address(root)?;
                set_path(&mut root_value, path, value)?;
                self.write_address(root, root_value)
            }
        }
    }

    fn compound(&mut self, addr: &Address, op: BinOp) -> VmResult<()> {
        let rhs = self.pop()?;
        let lhs = self.read_address(addr)?;
        let result = ops::binary(op, &lhs, &rhs)?;
        self.write_address(addr, result)
    }

    fn increment(&mut self, addr: &Address, op: UnOp, push_new: bool) -> VmResult<()> {
        let current = self.read_address(addr)?;
        let updated = ops::unary(op, &current)?;
        self.write_address(addr, updated.clone())?;
        self.push(if push_new { updated } else { current });
        Ok(())
    }

    fn call(&mut self, ins: &Instruction) -> VmResult<()> {
        let argc = ins.operand;
        if argc > self.stack.len() {
            return Err(VmError::StackUnderflow);
        }
        let split = self.stack.len() - argc;
        let args: Vec<Value> = self.stack.split_off(split);

        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(VmError::CallStackOverflow(MAX_CALL_DEPTH));
        }
        self.frames.push(Frame {
            locals: args,
            return_pc: self.pc + 1,
        });
        self.pc = ins.location;
        Ok(())
    }

    /// Dispatch a builtin call in place — unlike `call`, this never touches
    /// `pc` or `frames`, since builtins run to completion on the spot.
    fn call_builtin(&mut self, ins: &Instruction) -> VmResult<()> {
        let argc = ins.operand;
        if argc > self.stack.len() {
            return Err(VmError::StackUnderflow);
        }
        let split = self.stack.len() - argc;
        let args: Vec<Value> = self.stack.split_off(split);

        let id = match ins.value {
            Some(Value::Integer(id)) => id as usize,
            _ => return Err(VmError::UnknownBuiltin(usize::MAX)),
        };
        let result = builtins::dispatch(id, args)?;
        self.push(result);
        Ok(())
    }

    fn ret(&mut self) -> VmResult<()> {
        let frame = self.frames.pop().ok_or(VmError::ReturnOutsideCall)?;
        self.pc = frame.return_pc;
        Ok(())
    }

    /// Execute one instruction, advancing `pc` (to `pc + 1` unless the
    /// opcode itself redirects it).
    fn step(&mut self, ins: &Instruction) -> VmResult<()> {
        let mut advance = true;
        match ins.opcode {
            Opcode::Nop => {}
            Opcode::Def => {
                let slot = ins.operand;
                if slot >= self.globals.len() {
                    self.globals.resize(slot + 1, Value::default_unit());
                }
                self.globals[slot] = ins.value.clone().unwrap_or_else(Value::default_unit);
            }
            Opcode::Slv => {
                let offset = ins.operand;
                let frame = self.frames.last_mut();
                let locals = match frame {
                    Some(f) => &mut f.locals,
                    None => return Err(VmError::NoActiveFrame),
                };
                if offset >= locals.len() {
                    locals.resize(offset + 1, Value::default_unit());
                }
                locals[offset] = ins.value.clone().unwrap_or_else(Value::default_unit);
            }
            Opcode::Sav => {
                let value = self.pop()?;
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                self.write_address(addr, value)?;
            }
            Opcode::Psi => {
                self.push(ins.value.clone().unwrap_or_else(Value::default_unit));
            }
            Opcode::Psv => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                self.push(self.read_address(addr)?);
            }
            Opcode::Psl => {
                // Push the current call depth's locals count — a debugging
                // aid mirrored from PSV for introspection, not used by this
                // emitter's own codegen.
                let n = self.frames.last().map(|f| f.locals.len()).unwrap_or(0);
                self.push(Value::Integer(n as i64));
            }
            Opcode::Psp => {
                // Marks a function entry's declared parameter count; no
                // stack effect of its own, the call already placed the args.
            }
            Opcode::Pva | Opcode::Pcv => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                self.push(self.read_address(addr)?);
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod | Opcode::Exp
            | Opcode::Xor | Opcode::Bnd | Opcode::Bor | Opcode::Svl | Opcode::Svr
            | Opcode::Teq | Opcode::Tne | Opcode::Tgr | Opcode::Tge | Opcode::Tls | Opcode::Tle
            | Opcode::And | Opcode::Lor => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                let op = bin_op_for(ins.opcode).expect("exhaustively listed above");
                self.push(ops::binary(op, &lhs, &rhs)?);
            }
            Opcode::Not => {
                let v = self.pop()?;
                self.push(ops::unary(UnOp::Not, &v)?);
            }
            Opcode::Neg => {
                let v = self.pop()?;
                self.push(ops::unary(UnOp::Neg, &v)?);
            }
            Opcode::Cti => {
                let v = self.pop()?;
                self.push(rill_value::convert(&v, Tag::Integer));
            }
            Opcode::Ctd => {
                let v = self.pop()?;
                self.push(rill_value::convert(&v, Tag::Double));
            }
            Opcode::Ctc => {
                let v = self.pop()?;
                self.push(rill_value::convert(&v, Tag::Char));
            }
            Opcode::Cts => {
                let v = self.pop()?;
                self.push(rill_value::convert(&v, Tag::String));
            }
            Opcode::Ctb => {
                let v = self.pop()?;
                self.push(rill_value::convert(&v, Tag::Bool));
            }
            Opcode::Inl => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                self.increment(addr, UnOp::Inc, ins.operand == 1)?;
            }
            Opcode::Del => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                self.increment(addr, UnOp::Dec, ins.operand == 1)?;
            }
            Opcode::Inc => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                let current = self.read_address(addr)?;
                self.write_address(addr, ops::unary(UnOp::Inc, &current)?)?;
            }
            Opcode::Dec => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                let current = self.read_address(addr)?;
                self.write_address(addr, ops::unary(UnOp::Dec, &current)?)?;
            }
            Opcode::Ada => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                self.compound(addr, BinOp::Add)?;
            }
            Opcode::Sua => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                self.compound(addr, BinOp::Sub)?;
            }
            Opcode::Mua => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                self.compound(addr, BinOp::Mul)?;
            }
            Opcode::Dia => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                self.compound(addr, BinOp::Div)?;
            }
            Opcode::Moa => {
                let addr = ins.address.as_ref().ok_or(VmError::NoActiveFrame)?;
                self.compound(addr, BinOp::Mod)?;
            }
            Opcode::Jmp => {
                self.pc = ins.location;
                advance = false;
            }
            Opcode::Jif => {
                let cond = self.pop()?;
                if !truthy(&cond) {
                    self.pc = ins.location;
                    advance = false;
                }
            }
            Opcode::Jit => {
                let cond = self.pop()?;
                if truthy(&cond) {
                    self.pc = ins.location;
                    advance = false;
                }
            }
            Opcode::Jbf => {
                self.call_builtin(ins)?;
            }
            Opcode::Jtb => {
                let subject = self.pop()?;
                let target = ins
                    .cases
                    .iter()
                    .find(|arm| arm.value == subject)
                    .map(|arm| arm.target)
                    .or(ins.default);
                if let Some(target) = target {
                    self.pc = target;
                    advance = false;
                }
            }
            Opcode::Jsr => {
                self.call(ins)?;
                advance = false;
            }
            Opcode::Ret => {
                self.ret()?;
                advance = false;
            }
            Opcode::Dfl => {
                // Declare-with-default: used by collection-element access
                // paths that need a slot to exist before indexing into it.
                // Nothing on the stack changes.
            }
            Opcode::Dcs => {
                // Dissolve/clear the current frame's locals without
                // returning — not reachable from this emitter's codegen,
                // kept for wire-format completeness.
                if let Some(frame) = self.frames.last_mut() {
                    frame.locals.clear();
                }
            }
            Opcode::Efi => {
                // `value == 1` registers the module's on-tick handler;
                // anything else (including no payload, the common case)
                // registers an on-error resume point (§4.4.4).
                match ins.value {
                    Some(Value::Integer(1)) => self.on_tick_entry = Some(ins.location),
                    _ => self.error_frames.push(ins.location),
                }
            }
            Opcode::Rfe => {
                self.error_frames.pop();
            }
            Opcode::Cid => {
                // Cross-module id: only informational for the VM. Updates
                // `last_module_id`; no stack effect.
                self.last_module_id = ins.operand;
            }
            Opcode::End => unreachable!("handled by the caller before step() is invoked"),
        }
        if advance {
            self.pc += 1;
        }
        Ok(())
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Double(d) => *d != 0.0,
        Value::Char(c) => *c == 'T',
        Value::String(s) => !s.is_empty(),
        Value::Collection(c) => !c.is_empty(),
    }
}

fn bin_op_for(opcode: Opcode) -> Option<BinOp> {
    Some(match opcode {
        Opcode::Add => BinOp::Add,
        Opcode::Sub => BinOp::Sub,
        Opcode::Mul => BinOp::Mul,
        Opcode::Div => BinOp::Div,
        Opcode::Mod => BinOp::Mod,
        Opcode::Exp => BinOp::Exp,
        Opcode::Xor => BinOp::BitXor,
        Opcode::Bnd => BinOp::BitAnd,
        Opcode::Bor => BinOp::BitOr,
        Opcode::Svl => BinOp::ShiftLeft,
        Opcode::Svr => BinOp::ShiftRight,
        Opcode::Teq => BinOp::Eq,
        Opcode::Tne => BinOp::Ne,
        Opcode::Tgr => BinOp::Gt,
        Opcode::Tge => BinOp::Ge,
        Opcode::Tls => BinOp::Lt,
        Opcode::Tle => BinOp::Le,
        Opcode::And => BinOp::And,
        Opcode::Lor => BinOp::Or,
        _ => return None,
    })
}

fn index_into(v: &Value, key: &ElementKey) -> VmResult<Value> {
    let c = v.as_collection().ok_or_else(|| VmError::NotACollection(v.to_string()))?;
    let k = key_string(key);
    Ok(c.get(&k).cloned().unwrap_or_else(Value::default_unit))
}

fn key_string(key: &ElementKey) -> String {
    match key {
        ElementKey::Index(i) => i.to_string(),
        ElementKey::Name(s) => s.as_str().to_string(),
    }
}

fn set_path(v: &mut Value, path: &[ElementKey], value: Value) -> VmResult<()> {
    if path.is_empty() {
        *v = value;
        return Ok(());
    }
    if v.as_collection().is_none() {
        *v = Value::Collection(Collection::new());
    }
    let c = v.as_collection_mut().expect("just ensured a collection");
    let key = &path[0];
    match key {
        ElementKey::Index(i) => {
            c.extend_to(*i);
        }
        ElementKey::Name(s) => {
            c.ensure_string_key(s.as_str());
        }
    }
    let k = key_string(key);
    if path.len() == 1 {
        c.insert(k, value);
        Ok(())
    } else {
        let entry = c.get_mut(&k).expect("just ensured this key exists");
        set_path(entry, &path[1..], value)
    }
}
