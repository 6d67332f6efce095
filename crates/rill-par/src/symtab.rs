//! Slot allocation: where the parser decides *which* `Address` a
//! fully-qualified name resolves to, and the built-in function table used
//! by the minimum-parameter-count check (§4.2.7).

use std::collections::HashMap;

use rill_bc::Address;

/// A built-in function the VM provides directly rather than by running a
/// user-defined body: the emitter turns a call to one of these into a `JBF`
/// instruction whose `value` field carries this table's `id` (its `operand`
/// still holds the call site's real argument count) so the VM's dispatch
/// table knows which intrinsic to run and how many stack slots to pop.
pub struct Builtin {
    pub name: &'static str,
    pub id: usize,
    pub min_params: usize,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin { name: "print", id: 0, min_params: 1 },
    Builtin { name: "len", id: 1, min_params: 1 },
    Builtin { name: "typeOf", id: 2, min_params: 1 },
    Builtin { name: "toString", id: 3, min_params: 1 },
    Builtin { name: "keys", id: 4, min_params: 1 },
    Builtin { name: "append", id: 5, min_params: 2 },
    Builtin { name: "remove", id: 6, min_params: 2 },
    Builtin { name: "parseJson", id: 7, min_params: 1 },
    Builtin { name: "toJson", id: 8, min_params: 1 },
];

pub fn lookup_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Tracks where every fully-qualified variable name lives: a global slot for
/// `Script`/`Global`-scoped names, or a frame offset for `Local` names while
/// inside the function body that declared them.
#[derive(Default)]
pub struct SymbolTable {
    globals: HashMap<String, usize>,
    next_global: usize,
    locals: Vec<HashMap<String, usize>>,
    pub functions: HashMap<String, usize>,
    pub pending_calls: Vec<(usize, String)>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn declare_global(&mut self, name: &str) -> usize {
        if let Some(slot) = self.globals.get(name) {
            return *slot;
        }
        let slot = self.next_global;
        self.next_global += 1;
        self.globals.insert(name.to_string(), slot);
        slot
    }

    pub fn enter_function(&mut self) {
        self.locals.push(HashMap::new());
    }

    pub fn exit_function(&mut self) {
        self.locals.pop();
    }

    pub fn declare_local(&mut self, name: &str) -> usize {
        let frame = self.locals.last_mut().expect("declare_local outside a function");
        let offset = frame.len();
        frame.entry(name.to_string()).or_insert(offset);
        frame[name]
    }

    /// Resolve a bare identifier to its address: innermost local frame
    /// first, then the module's flat global table. Declarations key this
    /// table by bare name, not the lexer's fully-qualified `Scope.module...`
    /// string — that fully-qualified form is carried separately on each
    /// `Instruction` for the symbol file, but slot resolution stays a
    /// single-module, bare-name lookup since cross-module addressing goes
    /// through `CID` rather than through the name string.
    pub fn resolve(&self, bare_name: &str) -> Option<Address> {
        if let Some(frame) = self.locals.last() {
            if let Some(offset) = frame.get(bare_name) {
                return Some(Address::frame(*offset));
            }
        }
        self.globals.get(bare_name).map(|slot| Address::global(*slot))
    }
}
