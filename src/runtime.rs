//! runtimes are responsible for executing programs against the data model
use core::fmt;
use std::{io, rc::Rc};

use crate::{datum::Datum, syntax::ProcedureDefinition};

pub mod environment;
pub mod scheme_base;
pub mod treewalk;

/// Cancels the evaluation (or compilation) of the current top-level form
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SchemeError {
    #[error("Undefined variable '{0}'")]
    UndefinedVariable(Box<str>),
    #[error("Undefined procedure '{0}'")]
    UndefinedProcedure(Box<str>),
    #[error("Arguments count {got} does not match expected arity of {expected}")]
    ArityMismatch { got: usize, expected: usize },
    #[error("Arguments count {got} does not match expected minimal arity of {expected}")]
    MinimalArityMismatch { got: usize, expected: usize },
    #[error("Expected {expected} argument(s) but got {got} argument(s)")]
    ParameterMismatch { expected: usize, got: usize },
    #[error("Wrong argument type: Expected {0}")]
    WrongArgumentType(&'static str),
    #[error("Could not evaluate character literal '{0}'")]
    CharacterLiteral(Box<str>),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Could not write output: {0}")]
    Output(Box<str>),
}

impl From<io::Error> for SchemeError {
    fn from(value: io::Error) -> Self {
        Self::Output(value.to_string().into())
    }
}

/// Procedure arity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Min(usize),
}

impl Arity {
    pub fn is_satisfied(&self, len: usize) -> bool {
        match self {
            Self::Exact(e) => *e == len,
            Self::Min(m) => *m <= len,
        }
    }

    pub fn check(&self, len: usize) -> Result<(), SchemeError> {
        match self {
            _ if self.is_satisfied(len) => Ok(()),
            Self::Exact(expected) => Err(SchemeError::ArityMismatch {
                got: len,
                expected: *expected,
            }),
            Self::Min(expected) => Err(SchemeError::MinimalArityMismatch {
                got: len,
                expected: *expected,
            }),
        }
    }
}

/// A procedure implemented in Rust.
///
/// The arity is checked by the caller, so `call` only sees argument counts that satisfy it.
pub trait Callback {
    fn name(&self) -> &str;

    fn arity(&self) -> Arity;

    fn call(&self, output: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError>;
}

#[derive(Clone)]
pub struct NativeProcedure(Rc<dyn Callback>);
impl<T: Callback + 'static> From<T> for NativeProcedure {
    fn from(value: T) -> Self {
        Self(Rc::new(value))
    }
}

impl NativeProcedure {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn arity(&self) -> Arity {
        self.0.arity()
    }

    pub fn apply(
        &self,
        output: &mut dyn io::Write,
        arguments: &[Datum],
    ) -> Result<Datum, SchemeError> {
        self.arity().check(arguments.len())?;
        self.0.call(output, arguments)
    }
}

impl fmt::Debug for NativeProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<procedure {} {:p}>", self.name(), self.0)
    }
}

// It is up to runtimes to implement procedures
#[derive(Debug, Clone)]
pub enum Procedure {
    Code(Rc<ProcedureDefinition>),
    Native(NativeProcedure),
}
