//! Core machinery of an embeddable Scheme interpreter
//!
//! This crate provides the four layers the rest of the language is built
//! on, each consumable without the one above it:
//!
//! 1. the tagged [`Cell`] value model with shared compound handles,
//! 2. the [`Number`] tower of integers, floats and Cartesian complex,
//! 3. the streaming reader ([`Parser`]) turning characters into cells,
//! 4. the primitive-operation dispatcher ([`primop::call`]).
//!
//! The evaluator, platform glue and higher-level library functions are
//! external collaborators; [`Interp`] is the facade a host embeds.

pub mod cell;
pub mod clock;
pub mod environment;
pub mod error;
pub mod interner;
pub mod interpreter;
pub mod numeric;
pub mod parser;
pub mod port;
pub mod primop;

// Re-export commonly used items for convenience
pub use cell::{
    cadr, car, cdr, cons, list, set_car, set_cdr, Cell, Displayed, Pair, Procedure, EOF_CHAR,
};
pub use clock::Clock;
pub use environment::Env;
pub use error::{Error, Result, StreamCondition};
pub use interner::Symbol;
pub use interpreter::Interp;
pub use numeric::Number;
pub use parser::{Parser, Token};
pub use port::Port;
pub use primop::{call, PrimOp};
