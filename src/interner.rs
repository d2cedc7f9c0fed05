//! Interned symbols
//!
//! Symbols are unique handles into a process-wide symbol table: two symbols
//! with identical text compare identical by handle. The table is append-only
//! for the lifetime of the process.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use once_cell::sync::Lazy;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

static INTERNER: Lazy<RwLock<StringInterner<DefaultBackend>>> =
    Lazy::new(|| RwLock::new(StringInterner::default()));

static FRESH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A symbol that has been interned in the global symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(DefaultSymbol);

impl Symbol {
    /// Intern a string and return its Symbol
    pub fn new(s: &str) -> Self {
        let mut interner = INTERNER.write().unwrap();
        Symbol(interner.get_or_intern(s))
    }

    /// Mint a reserved symbol guaranteed not to collide with any readable
    /// name. The generated name contains a space, which the reader never
    /// accepts inside a symbol.
    pub fn fresh() -> Self {
        let n = FRESH_COUNTER.fetch_add(1, Ordering::SeqCst);
        Symbol::new(&format!("symbol {n}"))
    }

    /// Resolve the symbol back to its string representation
    pub fn resolve(&self) -> String {
        let interner = INTERNER.read().unwrap();
        interner
            .resolve(self.0)
            .expect("symbol should always be valid")
            .to_string()
    }

    /// Resolve the symbol and run a function with the string slice.
    /// This avoids the allocation `resolve()` performs.
    pub fn with_str<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let interner = INTERNER.read().unwrap();
        let s = interner
            .resolve(self.0)
            .expect("symbol should always be valid");
        f(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Names containing a space (reserved symbols) print between bars
        // so the output stays unambiguous.
        self.with_str(|s| {
            if s.contains(' ') {
                write!(f, "|{s}|")
            } else {
                write!(f, "{s}")
            }
        })
    }
}
