//! Cell: the universal tagged value
//!
//! Every scheme datum is a Cell. Atom variants are stored inline; compound
//! variants are reachable through a shared handle, so cells are cheap to
//! copy and lists may share structure. Pairs are mutable records carrying a
//! mark flag for a host tracing collector.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::clock::Clock;
use crate::environment::Env;
use crate::error::{Error, Result};
use crate::interner::Symbol;
use crate::numeric::Number;
use crate::port::Port;
use crate::primop::PrimOp;

/// Sentinel character representing end-of-file. U+FFFF is a Unicode
/// noncharacter, so it is distinguishable from every printable character.
pub const EOF_CHAR: char = '\u{ffff}';

/// A mutable cons record. The mark flag is transient state for a host
/// tracing collector; the core itself never sets it.
#[derive(Debug)]
pub struct Pair {
    pub car: Cell,
    pub cdr: Cell,
    pub mark: bool,
}

pub type PairRef = Rc<RefCell<Pair>>;
pub type VectorRef = Rc<RefCell<Vec<Cell>>>;
pub type DictRef = Rc<RefCell<FxHashMap<Cell, Cell>>>;
pub type PortRef = Rc<RefCell<Port>>;
pub type ClockRef = Rc<RefCell<Clock>>;

/// Closure record for a lambda or macro. Application and expansion belong
/// to the evaluator; the core stores, compares and prints these.
#[derive(Debug)]
pub struct Procedure {
    pub env: Env,
    pub args: Cell,
    pub code: Cell,
    pub is_macro: bool,
    pub name: Option<Symbol>,
}

impl Procedure {
    pub fn new(env: Env, args: Cell, code: Cell, is_macro: bool) -> Self {
        Procedure {
            env,
            args,
            code,
            is_macro,
            name: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Cell {
    /// No value; the result of side-effecting primitives
    None,
    /// The empty list
    Nil,
    Bool(bool),
    Char(char),
    Number(Number),
    Str(Rc<String>),
    Regex(Rc<Regex>),
    Symbol(Symbol),
    Pair(PairRef),
    Vector(VectorRef),
    Dict(DictRef),
    Env(Env),
    Proc(Rc<Procedure>),
    Port(PortRef),
    Clock(ClockRef),
    /// Inline primitive-operation tag
    Op(PrimOp),
}

// ============================================================================
// Constructors and pair accessors
// ============================================================================

pub fn cons(car: Cell, cdr: Cell) -> Cell {
    Cell::Pair(Rc::new(RefCell::new(Pair {
        car,
        cdr,
        mark: false,
    })))
}

pub fn car(cell: &Cell) -> Result<Cell> {
    match cell {
        Cell::Pair(p) => Ok(p.borrow().car.clone()),
        _ => Err(Error::mismatch("pair", cell)),
    }
}

pub fn cdr(cell: &Cell) -> Result<Cell> {
    match cell {
        Cell::Pair(p) => Ok(p.borrow().cdr.clone()),
        _ => Err(Error::mismatch("pair", cell)),
    }
}

pub fn cadr(cell: &Cell) -> Result<Cell> {
    car(&cdr(cell)?)
}

pub fn set_car(cell: &Cell, val: Cell) -> Result<()> {
    match cell {
        Cell::Pair(p) => {
            p.borrow_mut().car = val;
            Ok(())
        }
        _ => Err(Error::mismatch("pair", cell)),
    }
}

pub fn set_cdr(cell: &Cell, val: Cell) -> Result<()> {
    match cell {
        Cell::Pair(p) => {
            p.borrow_mut().cdr = val;
            Ok(())
        }
        _ => Err(Error::mismatch("pair", cell)),
    }
}

/// Build a proper list of the items in order.
pub fn list(items: Vec<Cell>) -> Cell {
    items
        .into_iter()
        .rev()
        .fold(Cell::Nil, |acc, val| cons(val, acc))
}

// ============================================================================
// Predicates and accessors
// ============================================================================

impl Cell {
    pub fn number(n: impl Into<Number>) -> Cell {
        Cell::Number(n.into())
    }

    pub fn string(s: impl Into<String>) -> Cell {
        Cell::Str(Rc::new(s.into()))
    }

    pub fn symbol(name: &str) -> Cell {
        Cell::Symbol(Symbol::new(name))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Cell::None)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Cell::Nil)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Cell::Bool(_))
    }

    pub fn is_char(&self) -> bool {
        matches!(self, Cell::Char(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Cell::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Cell::Str(_))
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Cell::Regex(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Cell::Symbol(_))
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Cell::Pair(_))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Cell::Vector(_))
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, Cell::Dict(_))
    }

    pub fn is_env(&self) -> bool {
        matches!(self, Cell::Env(_))
    }

    pub fn is_proc(&self) -> bool {
        matches!(self, Cell::Proc(_))
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Cell::Proc(p) if p.is_macro)
    }

    pub fn is_port(&self) -> bool {
        matches!(self, Cell::Port(_))
    }

    pub fn is_clock(&self) -> bool {
        matches!(self, Cell::Clock(_))
    }

    pub fn is_op(&self) -> bool {
        matches!(self, Cell::Op(_))
    }

    /// Scheme truth: everything except #f is true.
    pub fn is_true(&self) -> bool {
        !matches!(self, Cell::Bool(false))
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Cell::Bool(false))
    }

    pub fn as_number(&self) -> Result<Number> {
        match self {
            Cell::Number(n) => Ok(*n),
            _ => Err(Error::mismatch("number", self)),
        }
    }

    pub fn as_char(&self) -> Result<char> {
        match self {
            Cell::Char(c) => Ok(*c),
            _ => Err(Error::mismatch("character", self)),
        }
    }

    pub fn as_symbol(&self) -> Result<Symbol> {
        match self {
            Cell::Symbol(s) => Ok(*s),
            _ => Err(Error::mismatch("symbol", self)),
        }
    }

    pub fn as_str(&self) -> Result<Rc<String>> {
        match self {
            Cell::Str(s) => Ok(s.clone()),
            _ => Err(Error::mismatch("string", self)),
        }
    }

    pub fn as_pair(&self) -> Result<PairRef> {
        match self {
            Cell::Pair(p) => Ok(p.clone()),
            _ => Err(Error::mismatch("pair", self)),
        }
    }

    pub fn as_port(&self) -> Result<PortRef> {
        match self {
            Cell::Port(p) => Ok(p.clone()),
            _ => Err(Error::mismatch("port", self)),
        }
    }

    /// Identity equality: handle identity for compound variants, value
    /// equality for immediates. Numbers must share the same representation.
    pub fn is_eq(&self, other: &Cell) -> bool {
        match (self, other) {
            (Cell::None, Cell::None) | (Cell::Nil, Cell::Nil) => true,
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            (Cell::Char(a), Cell::Char(b)) => a == b,
            (Cell::Number(a), Cell::Number(b)) => a.eq_repr(b),
            (Cell::Symbol(a), Cell::Symbol(b)) => a == b,
            (Cell::Op(a), Cell::Op(b)) => a == b,
            (Cell::Str(a), Cell::Str(b)) => Rc::ptr_eq(a, b),
            (Cell::Regex(a), Cell::Regex(b)) => Rc::ptr_eq(a, b),
            (Cell::Pair(a), Cell::Pair(b)) => Rc::ptr_eq(a, b),
            (Cell::Vector(a), Cell::Vector(b)) => Rc::ptr_eq(a, b),
            (Cell::Dict(a), Cell::Dict(b)) => Rc::ptr_eq(a, b),
            (Cell::Env(a), Cell::Env(b)) => a.ptr_eq(b),
            (Cell::Proc(a), Cell::Proc(b)) => Rc::ptr_eq(a, b),
            (Cell::Port(a), Cell::Port(b)) => Rc::ptr_eq(a, b),
            (Cell::Clock(a), Cell::Clock(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Structural equality; same as `==`.
    pub fn is_equal(&self, other: &Cell) -> bool {
        self == other
    }
}

// ============================================================================
// Equality and hashing
// ============================================================================

// Structural equality: deep for pair/vector/string/number, identity for the
// remaining handle variants.
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => a == b,
            (Cell::Str(a), Cell::Str(b)) => a == b,
            (Cell::Pair(a), Cell::Pair(b)) => {
                Rc::ptr_eq(a, b) || {
                    let (a, b) = (a.borrow(), b.borrow());
                    a.car == b.car && a.cdr == b.cdr
                }
            }
            (Cell::Vector(a), Cell::Vector(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            _ => self.is_eq(other),
        }
    }
}

impl Eq for Cell {}

// Consistent with structural equality: content hashes for strings and
// numbers (canonical numeric form, so Int(1) and Float(1.0) dict keys
// collide as required), deep hashes for pairs and vectors, pointer identity
// for the rest.
impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Cell::None => 0u8.hash(state),
            Cell::Nil => 1u8.hash(state),
            Cell::Bool(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            Cell::Char(c) => {
                3u8.hash(state);
                c.hash(state);
            }
            Cell::Number(n) => {
                4u8.hash(state);
                n.hash(state);
            }
            Cell::Str(s) => {
                5u8.hash(state);
                s.hash(state);
            }
            Cell::Symbol(s) => {
                6u8.hash(state);
                s.hash(state);
            }
            Cell::Op(op) => {
                7u8.hash(state);
                op.hash(state);
            }
            Cell::Pair(p) => {
                8u8.hash(state);
                let p = p.borrow();
                p.car.hash(state);
                p.cdr.hash(state);
            }
            Cell::Vector(v) => {
                9u8.hash(state);
                for item in v.borrow().iter() {
                    item.hash(state);
                }
            }
            Cell::Regex(r) => {
                10u8.hash(state);
                (Rc::as_ptr(r) as usize).hash(state);
            }
            Cell::Dict(d) => {
                11u8.hash(state);
                (Rc::as_ptr(d) as usize).hash(state);
            }
            Cell::Env(e) => {
                12u8.hash(state);
                (e.as_ptr() as usize).hash(state);
            }
            Cell::Proc(p) => {
                13u8.hash(state);
                (Rc::as_ptr(p) as usize).hash(state);
            }
            Cell::Port(p) => {
                14u8.hash(state);
                (Rc::as_ptr(p) as usize).hash(state);
            }
            Cell::Clock(c) => {
                15u8.hash(state);
                (Rc::as_ptr(c) as usize).hash(state);
            }
        }
    }
}

// ============================================================================
// Printing
// ============================================================================

// Printer names for characters the write form cannot emit raw.
fn char_write_name(c: char) -> Option<&'static str> {
    match c {
        EOF_CHAR => Some("eof"),
        '\u{7}' => Some("alarm"),
        '\u{8}' => Some("backspace"),
        '\u{7f}' => Some("delete"),
        '\u{1b}' => Some("escape"),
        '\n' => Some("newline"),
        '\0' => Some("null"),
        '\r' => Some("return"),
        ' ' => Some("space"),
        '\t' => Some("tab"),
        _ => None,
    }
}

fn fmt_char(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    match char_write_name(c) {
        Some(name) => write!(f, "#\\{name}"),
        None => write!(f, "#\\{c}"),
    }
}

// Cycle-safe list printer: the fast cursor advances two pairs per round,
// the slow cursor one. When the fast cursor catches the slow one the list
// is circular; print " ...)" and stop.
fn fmt_list(f: &mut fmt::Formatter<'_>, head: &PairRef) -> fmt::Result {
    write!(f, "({}", head.borrow().car)?;

    let mut iter = head.borrow().cdr.clone();
    let mut slow = iter.clone();

    loop {
        let p = match &iter {
            Cell::Pair(p) => p.clone(),
            _ => break,
        };
        write!(f, " {}", p.borrow().car)?;
        iter = p.borrow().cdr.clone();

        if !iter.is_pair() || iter.is_eq(&slow) {
            if iter.is_eq(&slow) {
                return write!(f, " ...)");
            }
            break;
        }

        let p = match &iter {
            Cell::Pair(p) => p.clone(),
            _ => unreachable!(),
        };
        write!(f, " {}", p.borrow().car)?;
        iter = p.borrow().cdr.clone();
        slow = cdr(&slow).unwrap_or(Cell::Nil);
    }

    if iter.is_nil() {
        write!(f, ")")
    } else {
        write!(f, " . {iter})")
    }
}

/// The write form: reader-reversible text.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::None => write!(f, "#<none>"),
            Cell::Nil => write!(f, "()"),
            Cell::Bool(true) => write!(f, "#t"),
            Cell::Bool(false) => write!(f, "#f"),
            Cell::Char(c) => fmt_char(f, *c),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Str(s) => write!(f, "\"{s}\""),
            Cell::Regex(_) => write!(f, "#<regex>"),
            Cell::Symbol(s) => write!(f, "{s}"),
            Cell::Pair(p) => fmt_list(f, p),
            Cell::Vector(v) => {
                write!(f, "#(")?;
                for (i, item) in v.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Cell::Dict(_) => write!(f, "#<dict>"),
            Cell::Env(e) => write!(f, "#<symenv {:p}>", e.as_ptr()),
            Cell::Proc(p) => {
                if p.is_macro {
                    write!(f, "#<macro>")
                } else {
                    write!(f, "#<clojure>")
                }
            }
            Cell::Port(_) => write!(f, "#<port>"),
            Cell::Clock(c) => write!(f, "#<clock {}>", c.borrow()),
            Cell::Op(op) => write!(f, "{op}"),
        }
    }
}

/// The display form: characters emit their raw code point and strings emit
/// their content with C-style escape sequences interpreted. Everything else
/// matches the write form.
pub struct Displayed<'a>(pub &'a Cell);

impl fmt::Display for Displayed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Cell::None => Ok(()),
            Cell::Char(c) => write!(f, "{c}"),
            Cell::Str(s) => {
                let mut chars = s.chars();
                while let Some(c) = chars.next() {
                    if c == '\\' {
                        match chars.next() {
                            Some('a') => write!(f, "\u{7}")?,
                            Some('b') => write!(f, "\u{8}")?,
                            Some('n') => writeln!(f)?,
                            Some('r') => write!(f, "\r")?,
                            Some('t') => write!(f, "\t")?,
                            Some(other) => write!(f, "{other}")?,
                            None => write!(f, "\\")?,
                        }
                    } else {
                        write!(f, "{c}")?;
                    }
                }
                Ok(())
            }
            other => write!(f, "{other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_accessors() {
        let p = cons(Cell::number(1), Cell::number(2));
        assert_eq!(car(&p).unwrap(), Cell::number(1));
        assert_eq!(cdr(&p).unwrap(), Cell::number(2));
        assert!(car(&Cell::Nil).is_err());
        assert!(cdr(&Cell::number(1)).is_err());
    }

    #[test]
    fn pair_mutation_is_visible() {
        let p = cons(Cell::number(1), Cell::Nil);
        set_car(&p, Cell::symbol("x")).unwrap();
        assert_eq!(car(&p).unwrap(), Cell::symbol("x"));
        assert!(car(&p).unwrap().is_eq(&Cell::symbol("x")));
        set_cdr(&p, Cell::number(2)).unwrap();
        assert_eq!(format!("{p}"), "(x . 2)");
    }

    #[test]
    fn equal_is_deep_eq_is_identity() {
        let a = list(vec![Cell::number(1), Cell::number(2)]);
        let b = list(vec![Cell::number(1), Cell::number(2)]);
        assert_eq!(a, b);
        assert!(!a.is_eq(&b));
        assert!(a.is_eq(&a.clone()));

        let s1 = Cell::string("hi");
        let s2 = Cell::string("hi");
        assert_eq!(s1, s2);
        assert!(!s1.is_eq(&s2));

        // same text interns to the same symbol handle
        assert!(Cell::symbol("foo").is_eq(&Cell::symbol("foo")));
    }

    #[test]
    fn eq_distinguishes_number_representations() {
        assert_eq!(Cell::number(1), Cell::number(1.0));
        assert!(!Cell::number(1).is_eq(&Cell::number(1.0)));
        assert!(Cell::number(1).is_eq(&Cell::number(1)));
    }

    #[test]
    fn numeric_dict_keys_collide_across_representations() {
        let dict: DictRef = Rc::new(RefCell::new(FxHashMap::default()));
        dict.borrow_mut()
            .insert(Cell::number(1), Cell::string("one"));
        let found = dict.borrow().get(&Cell::number(1.0)).cloned();
        assert_eq!(found, Some(Cell::string("one")));
    }

    #[test]
    fn write_forms() {
        assert_eq!(format!("{}", Cell::Nil), "()");
        assert_eq!(format!("{}", Cell::Bool(true)), "#t");
        assert_eq!(format!("{}", Cell::Char('a')), "#\\a");
        assert_eq!(format!("{}", Cell::Char('\n')), "#\\newline");
        assert_eq!(format!("{}", Cell::Char(EOF_CHAR)), "#\\eof");
        assert_eq!(format!("{}", Cell::string("hi")), "\"hi\"");
        let xs = list(vec![Cell::symbol("+"), Cell::number(1), Cell::number(2)]);
        assert_eq!(format!("{xs}"), "(+ 1 2)");
        let v = Cell::Vector(Rc::new(RefCell::new(vec![
            Cell::number(1),
            Cell::number(2),
            Cell::number(3),
        ])));
        assert_eq!(format!("{v}"), "#(1 2 3)");
    }

    #[test]
    fn display_interprets_string_escapes() {
        let s = Cell::string("a\\tb\\n");
        assert_eq!(format!("{}", Displayed(&s)), "a\tb\n");
        assert_eq!(format!("{}", Displayed(&Cell::Char('x'))), "x");
        assert_eq!(format!("{}", Displayed(&Cell::None)), "");
        // write form leaves the escapes alone
        assert_eq!(format!("{s}"), "\"a\\tb\\n\"");
    }

    #[test]
    fn circular_list_printing_terminates() {
        let p = cons(Cell::symbol("x"), Cell::Nil);
        set_cdr(&p, p.clone()).unwrap();
        assert_eq!(format!("{p}"), "(x x ...)");

        let q = cons(Cell::symbol("a"), Cell::Nil);
        let r = cons(Cell::symbol("b"), q.clone());
        set_cdr(&q, r.clone()).unwrap();
        assert!(format!("{q}").ends_with(" ...)"));
    }

    #[test]
    fn opaque_handles_print_opaquely() {
        let env = Env::new();
        let lambda = Cell::Proc(Rc::new(Procedure::new(
            env.clone(),
            Cell::Nil,
            Cell::Nil,
            false,
        )));
        assert_eq!(format!("{lambda}"), "#<clojure>");
        assert!(!lambda.is_macro());

        let mac = Cell::Proc(Rc::new(Procedure::new(env.clone(), Cell::Nil, Cell::Nil, true)));
        assert_eq!(format!("{mac}"), "#<macro>");
        assert!(mac.is_macro());

        assert!(format!("{}", Cell::Env(env)).starts_with("#<symenv "));
        let dict: DictRef = Rc::new(RefCell::new(FxHashMap::default()));
        assert_eq!(format!("{}", Cell::Dict(dict)), "#<dict>");
        assert_eq!(format!("{}", Cell::None), "#<none>");
    }

    #[test]
    fn dotted_pair_printing() {
        let p = cons(Cell::number(1), Cell::number(2));
        assert_eq!(format!("{p}"), "(1 . 2)");
        let q = cons(Cell::number(1), cons(Cell::number(2), Cell::number(3)));
        assert_eq!(format!("{q}"), "(1 2 . 3)");
    }
}
