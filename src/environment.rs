//! Lexical environments
//!
//! An environment maps symbols to cells and chains to a parent. Lookups and
//! assignments walk the chain; definitions land in the frame they are made
//! in. Environments are cheap to clone (a handle copy) and mutation is
//! visible through every handle immediately.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::interner::Symbol;

struct Frame {
    table: FxHashMap<Symbol, Cell>,
    parent: Option<Env>,
}

/// Handle to a shared environment frame.
#[derive(Clone)]
pub struct Env {
    frame: Rc<RefCell<Frame>>,
}

impl Env {
    /// Create a new top environment.
    pub fn new() -> Self {
        Env {
            frame: Rc::new(RefCell::new(Frame {
                table: FxHashMap::default(),
                parent: None,
            })),
        }
    }

    /// Create a new empty child environment chained to this one.
    pub fn child(&self) -> Env {
        Env {
            frame: Rc::new(RefCell::new(Frame {
                table: FxHashMap::default(),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Insert a new binding or reassign an existing one in this frame only.
    pub fn add(&self, sym: Symbol, val: Cell) {
        self.frame.borrow_mut().table.insert(sym, val);
    }

    /// Drop a binding from this frame, if present.
    pub fn remove(&self, sym: Symbol) {
        self.frame.borrow_mut().table.remove(&sym);
    }

    /// Reassign the first binding of `sym` found in this frame or any
    /// reachable parent.
    pub fn set(&self, sym: Symbol, val: Cell) -> Result<()> {
        let mut slot = Some(val);
        let mut cur = self.clone();
        loop {
            {
                let mut frame = cur.frame.borrow_mut();
                if frame.table.contains_key(&sym) {
                    if let Some(v) = slot.take() {
                        frame.table.insert(sym, v);
                    }
                    return Ok(());
                }
            }
            let parent = cur.frame.borrow().parent.clone();
            match parent {
                Some(p) => cur = p,
                None => return Err(Error::UnknownSymbol(sym.resolve())),
            }
        }
    }

    /// Look up `sym` in this frame or any reachable parent.
    pub fn get(&self, sym: Symbol) -> Result<Cell> {
        let mut cur = self.clone();
        loop {
            let parent = {
                let frame = cur.frame.borrow();
                if let Some(v) = frame.table.get(&sym) {
                    return Ok(v.clone());
                }
                frame.parent.clone()
            };
            match parent {
                Some(p) => cur = p,
                None => return Err(Error::UnknownSymbol(sym.resolve())),
            }
        }
    }

    pub fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.frame, &other.frame)
    }

    /// Stable address of the underlying frame, for printing and hashing.
    pub fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.frame) as *const ()
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<environment {:p}>", self.as_ptr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let env = Env::new();
        let x = Symbol::new("x");
        env.add(x, Cell::number(1));
        assert_eq!(env.get(x).unwrap(), Cell::number(1));
    }

    #[test]
    fn lookup_walks_the_parent_chain() {
        let top = Env::new();
        let x = Symbol::new("x");
        top.add(x, Cell::number(1));
        let child = top.child();
        assert_eq!(child.get(x).unwrap(), Cell::number(1));

        // shadowing in the child leaves the parent untouched
        child.add(x, Cell::number(2));
        assert_eq!(child.get(x).unwrap(), Cell::number(2));
        assert_eq!(top.get(x).unwrap(), Cell::number(1));
    }

    #[test]
    fn set_mutates_through_the_chain() {
        let top = Env::new();
        let x = Symbol::new("x");
        top.add(x, Cell::number(1));
        let child = top.child();
        child.set(x, Cell::number(5)).unwrap();
        assert_eq!(top.get(x).unwrap(), Cell::number(5));
    }

    #[test]
    fn unknown_symbols_are_errors() {
        let env = Env::new();
        let missing = Symbol::new("missing");
        assert!(env.get(missing).is_err());
        assert!(env.set(missing, Cell::Nil).is_err());
    }

    #[test]
    fn remove_drops_a_binding() {
        let env = Env::new();
        let x = Symbol::new("x");
        env.add(x, Cell::number(1));
        env.remove(x);
        assert!(env.get(x).is_err());
    }
}
