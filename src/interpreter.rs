//! Interpreter facade
//!
//! `Interp` ties the core together for a host: it owns the top environment
//! with the primitive opcodes bound to their symbols, the default standard
//! ports, and the read/call/write entry points. Evaluation itself is the
//! host evaluator's job.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cell::{Cell, Displayed, PortRef};
use crate::environment::Env;
use crate::error::Result;
use crate::interner::Symbol;
use crate::parser::Parser;
use crate::port::Port;
use crate::primop::{self, PrimOp};

pub struct Interp {
    topenv: Env,
    stdin: PortRef,
    stdout: PortRef,
}

impl Interp {
    /// Create an interpreter with a fresh top environment holding the
    /// primitive-operation bindings.
    pub fn new() -> Self {
        let topenv = Env::new();
        install_primops(&topenv);
        Interp {
            topenv,
            stdin: Rc::new(RefCell::new(Port::standard_input())),
            stdout: Rc::new(RefCell::new(Port::standard_output())),
        }
    }

    /// The top environment of this interpreter.
    pub fn getenv(&self) -> Env {
        self.topenv.clone()
    }

    /// Insert or reassign a binding at the top environment.
    pub fn addenv(&self, sym: Symbol, val: Cell) {
        self.topenv.add(sym, val);
    }

    /// Create a new empty child environment, chained to the argument parent
    /// or to the top environment.
    pub fn newenv(&self, parent: Option<&Env>) -> Env {
        parent.unwrap_or(&self.topenv).child()
    }

    pub fn symbol(&self, name: &str) -> Symbol {
        Symbol::new(name)
    }

    pub fn stdin(&self) -> &PortRef {
        &self.stdin
    }

    pub fn stdout(&self) -> &PortRef {
        &self.stdout
    }

    /// A reader rooted at the top environment of this interpreter. Hosts
    /// driving a REPL keep one reader per input port.
    pub fn reader(&self) -> Parser {
        Parser::new(self.topenv.clone())
    }

    /// Read the next expression from the argument port.
    pub fn read(&self, port: &mut Port) -> Result<Cell> {
        self.reader().read(port)
    }

    /// Read the first expression of the argument text.
    pub fn read_str(&self, text: &str) -> Result<Cell> {
        let mut port = Port::string_input(text);
        self.reader().read(&mut port)
    }

    /// Call a primitive opcode with already-evaluated arguments.
    pub fn call(&self, env: &Env, op: PrimOp, args: &[Cell]) -> Result<Cell> {
        primop::call(self, env, op, args)
    }

    /// Write a cell in reader-reversible form to the argument port.
    pub fn write(&self, cell: &Cell, port: &mut Port) -> Result<()> {
        port.write_str(&format!("{cell}"))
    }

    /// Write a cell in display form to the argument port.
    pub fn display(&self, cell: &Cell, port: &mut Port) -> Result<()> {
        port.write_str(&format!("{}", Displayed(cell)))
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

/// Bind every primitive opcode to its symbol, so the host evaluator can
/// resolve read symbols straight to opcode cells.
fn install_primops(env: &Env) {
    let table: &[(&str, PrimOp)] = &[
        ("or", PrimOp::Or),
        ("and", PrimOp::And),
        ("if", PrimOp::If),
        ("cond", PrimOp::Cond),
        ("else", PrimOp::Else),
        ("=>", PrimOp::Arrow),
        ("when", PrimOp::When),
        ("unless", PrimOp::Unless),
        ("define", PrimOp::Define),
        ("set!", PrimOp::Set),
        ("begin", PrimOp::Begin),
        ("lambda", PrimOp::Lambda),
        ("define-macro", PrimOp::DefineMacro),
        ("apply", PrimOp::Apply),
        ("quote", PrimOp::Quote),
        ("quasiquote", PrimOp::QuasiQuote),
        ("unquote", PrimOp::Unquote),
        ("unquote-splicing", PrimOp::UnquoteSplice),
        ("cons", PrimOp::Cons),
        ("car", PrimOp::Car),
        ("cdr", PrimOp::Cdr),
        ("set-car!", PrimOp::SetCar),
        ("set-cdr!", PrimOp::SetCdr),
        ("list", PrimOp::List),
        ("+", PrimOp::Add),
        ("-", PrimOp::Sub),
        ("*", PrimOp::Mul),
        ("/", PrimOp::Div),
        ("write", PrimOp::Write),
        ("display", PrimOp::Display),
        ("newline", PrimOp::Newline),
    ];
    for (name, op) in table {
        env.add(Symbol::new(name), Cell::Op(*op));
    }
}
