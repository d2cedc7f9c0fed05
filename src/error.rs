//! Error types for the interpreter core
//!
//! All fallible operations in the crate return [`Result`]. Errors unwind to
//! the nearest host-installed boundary; nothing is retried internally.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Sub-reason carried by port errors, distinguishing why an I/O operation
/// was rejected or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCondition {
    NotInput,
    NotOutput,
    Failed,
    EndOfFile,
    Bad,
    Unknown,
}

impl fmt::Display for StreamCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StreamCondition::NotInput => "not an input port",
            StreamCondition::NotOutput => "not an output port",
            StreamCondition::Failed => "read or write failed",
            StreamCondition::EndOfFile => "end of file reached",
            StreamCondition::Bad => "bad port state",
            StreamCondition::Unknown => "unknown port error",
        };
        write!(f, "{reason}")
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// The reader rejected the input.
    #[error("parse error: {0}")]
    Parse(String),

    /// An operation was applied to a cell of the wrong variant.
    #[error("argument {found} is not a {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// A primitive received too few arguments.
    #[error("{0}: too few arguments")]
    Arity(&'static str),

    /// Division by exact zero and friends.
    #[error("arithmetic error: {0}")]
    Arithmetic(&'static str),

    /// Opcode outside the recognized primitive set.
    #[error("invalid primary operation")]
    InvalidOp,

    /// Environment lookup or assignment of an unbound symbol.
    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("input port error: {0}")]
    InputPort(StreamCondition),

    #[error("output port error: {0}")]
    OutputPort(StreamCondition),
}

impl Error {
    /// Build a `TypeMismatch` from the expected type name and the offending
    /// value's printed form.
    pub fn mismatch(expected: &'static str, found: impl fmt::Display) -> Error {
        Error::TypeMismatch {
            expected,
            found: found.to_string(),
        }
    }
}
