//! Primitive operations
//!
//! A single `call` entry point maps an opcode plus a vector of
//! already-evaluated cells to a result cell. Arguments are consumed in
//! index order; side effects are observable immediately.

use std::fmt;

use crate::cell::{self, cons, Cell, Displayed};
use crate::environment::Env;
use crate::error::{Error, Result};
use crate::interpreter::Interp;
use crate::numeric::Number;

/// Inline primitive-operation tags. The syntax opcodes are resolved by the
/// evaluator and print with their Scheme names; the procedure opcodes are
/// dispatched by [`call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimOp {
    // scheme syntax opcodes
    Or,
    And,
    If,
    Cond,
    Else,
    Arrow,
    When,
    Unless,
    Define,
    Set,
    Begin,
    Lambda,
    DefineMacro,
    Apply,
    Quote,
    QuasiQuote,
    Unquote,
    UnquoteSplice,

    // pairs and lists
    Cons,
    Car,
    Cdr,
    SetCar,
    SetCdr,
    List,

    // arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // output
    Write,
    Display,
    Newline,
}

impl fmt::Display for PrimOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimOp::Or => "or",
            PrimOp::And => "and",
            PrimOp::If => "if",
            PrimOp::Cond => "cond",
            PrimOp::Else => "else",
            PrimOp::Arrow => "=>",
            PrimOp::When => "when",
            PrimOp::Unless => "unless",
            PrimOp::Define => "define",
            PrimOp::Set => "set!",
            PrimOp::Begin => "begin",
            PrimOp::Lambda => "lambda",
            PrimOp::DefineMacro => "define-macro",
            PrimOp::Apply => "apply",
            PrimOp::Quote => "quote",
            PrimOp::QuasiQuote => "quasiquote",
            PrimOp::Unquote => "unquote",
            PrimOp::UnquoteSplice => "unquote-splicing",
            _ => "#<primop>",
        };
        write!(f, "{name}")
    }
}

fn arg<'a>(args: &'a [Cell], index: usize, op: &'static str) -> Result<&'a Cell> {
    args.get(index).ok_or(Error::Arity(op))
}

/// Dispatch a primitive operation over an argument vector of evaluated
/// cells. An opcode outside the recognized set is an `InvalidOp` error.
pub fn call(scm: &Interp, _env: &Env, op: PrimOp, args: &[Cell]) -> Result<Cell> {
    match op {
        PrimOp::Cons => Ok(cons(
            arg(args, 0, "cons")?.clone(),
            arg(args, 1, "cons")?.clone(),
        )),
        PrimOp::Car => cell::car(arg(args, 0, "car")?),
        PrimOp::Cdr => cell::cdr(arg(args, 0, "cdr")?),
        PrimOp::SetCar => {
            cell::set_car(arg(args, 0, "set-car!")?, arg(args, 1, "set-car!")?.clone())?;
            Ok(Cell::None)
        }
        PrimOp::SetCdr => {
            cell::set_cdr(arg(args, 0, "set-cdr!")?, arg(args, 1, "set-cdr!")?.clone())?;
            Ok(Cell::None)
        }
        PrimOp::List => Ok(fun_list(args)),
        PrimOp::Add => fun_add(args),
        PrimOp::Sub => fun_sub(args),
        PrimOp::Mul => fun_mul(args),
        PrimOp::Div => fun_div(args),
        PrimOp::Write => fun_write(scm, args),
        PrimOp::Display => fun_display(scm, args),
        PrimOp::Newline => fun_newline(scm, args),
        _ => Err(Error::InvalidOp),
    }
}

/// Proper list of the arguments in order.
fn fun_list(args: &[Cell]) -> Cell {
    args.iter()
        .rev()
        .fold(Cell::Nil, |acc, val| cons(val.clone(), acc))
}

/// Left fold with identity 0.
fn fun_add(args: &[Cell]) -> Result<Cell> {
    let mut res = Number::Int(0);
    for val in args {
        res = res.add(&val.as_number()?);
    }
    Ok(Cell::Number(res))
}

/// First argument minus the rest; negation for a single argument.
fn fun_sub(args: &[Cell]) -> Result<Cell> {
    let mut res = arg(args, 0, "-")?.as_number()?;
    if args.len() == 1 {
        return Ok(Cell::Number(res.neg()));
    }
    for val in &args[1..] {
        res = res.sub(&val.as_number()?);
    }
    Ok(Cell::Number(res))
}

/// Left fold with identity 1.
fn fun_mul(args: &[Cell]) -> Result<Cell> {
    let mut res = Number::Int(1);
    for val in args {
        res = res.mul(&val.as_number()?);
    }
    Ok(Cell::Number(res))
}

/// First argument divided by the rest; reciprocal for a single argument.
fn fun_div(args: &[Cell]) -> Result<Cell> {
    let mut res = arg(args, 0, "/")?.as_number()?;
    if args.len() == 1 {
        return Ok(Cell::Number(res.inv()?));
    }
    for val in &args[1..] {
        res = res.div(&val.as_number()?)?;
    }
    Ok(Cell::Number(res))
}

fn write_text(scm: &Interp, port_arg: Option<&Cell>, text: &str) -> Result<Cell> {
    match port_arg {
        Some(cell) => cell.as_port()?.borrow_mut().write_str(text)?,
        None => scm.stdout().borrow_mut().write_str(text)?,
    }
    Ok(Cell::None)
}

/// Write the first argument in reader-reversible form.
fn fun_write(scm: &Interp, args: &[Cell]) -> Result<Cell> {
    let text = format!("{}", arg(args, 0, "write")?);
    write_text(scm, args.get(1), &text)
}

/// Write the first argument in display form.
fn fun_display(scm: &Interp, args: &[Cell]) -> Result<Cell> {
    let text = format!("{}", Displayed(arg(args, 0, "display")?));
    write_text(scm, args.get(1), &text)
}

fn fun_newline(scm: &Interp, args: &[Cell]) -> Result<Cell> {
    write_text(scm, args.first(), "\n")
}
