//! Address cells: what `PVA`/`PCV` push, and what `SAV`/`SLV`/the compound
//! assignment opcodes consume.
//!
//! The obvious host-language shape for "a place a value lives" is a pointer
//! or a `&mut Value`, but the VM's parameter stack is a flat `Vec<Value>`
//! that reallocates, and a collection slot lives behind however many index
//! hops the script wrote — a raw reference would need unsafe aliasing or a
//! borrow that outlives the stack mutation that follows it. An `Address` is
//! a resolved *description* of a location instead: re-look-up is one `match`
//! plus, for collection chains, a handful of map lookups.

use rill_util::Symbol;

/// A single step through a collection's element chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementKey {
    Index(usize),
    Name(Symbol),
}

/// Where an assignable value lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    /// A script/global-scope variable, addressed by its slot in the
    /// program-global variable table.
    Global(usize),
    /// A local or parameter slot, addressed relative to the current frame's
    /// base pointer: `params[bp + offset]`.
    Frame(usize),
    /// A path into a collection reached through another address — e.g.
    /// `a.b[2]` is `Element { root: Global(a), path: [Name(b), Index(2)] }`.
    Element {
        root: Box<Address>,
        path: Vec<ElementKey>,
    },
}

impl Address {
    pub fn global(slot: usize) -> Self {
        Address::Global(slot)
    }

    pub fn frame(offset: usize) -> Self {
        Address::Frame(offset)
    }

    /// Extend `self` with one more element-access step.
    pub fn index_by(self, key: ElementKey) -> Self {
        match self {
            Address::Element { root, mut path } => {
                path.push(key);
                Address::Element { root, path }
            }
            other => Address::Element {
                root: Box::new(other),
                path: vec![key],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_by_chains_onto_a_scalar_root() {
        let addr = Address::global(3).index_by(ElementKey::Index(0));
        assert_eq!(
            addr,
            Address::Element {
                root: Box::new(Address::Global(3)),
                path: vec![ElementKey::Index(0)],
            }
        );
    }

    #[test]
    fn index_by_extends_an_existing_chain() {
        let addr = Address::global(3)
            .index_by(ElementKey::Name(Symbol::intern("name")))
            .index_by(ElementKey::Index(1));
        let Address::Element { path, .. } = addr else {
            panic!("expected element address");
        };
        assert_eq!(path.len(), 2);
    }
}
