//! Representation of values inside compiled programs
use num::BigInt;

use crate::{
    datum::{Atom, Datum},
    runtime::SchemeError,
};

// Type that stores all possible values!
// Unlike `Datum` this owns its elements outright, so it can live in a `static`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(BigInt),
    Character(char),
    // quoted identifiers are strings as well
    String(Box<str>),
    Boolean(bool),
    List(Vec<Value>),
    Vector(Vec<Value>),
    Quotation(Box<Value>),
    // the result of `display`
    Void,
}

impl Value {
    /// Reads the decimal text of an integer constant
    pub fn integer(text: &str) -> Result<Self, SchemeError> {
        text.parse()
            .map(Self::Integer)
            .map_err(|_| SchemeError::WrongArgumentType("integer"))
    }

    pub fn string(text: &str) -> Self {
        Self::String(text.into())
    }

    pub fn quotation(value: Value) -> Self {
        Self::Quotation(Box::new(value))
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Self::Integer(int) => Some(int),
            _ => None,
        }
    }

    /// Only the boolean `#f` is false
    pub fn is_true(&self) -> bool {
        !matches!(self, Self::Boolean(false))
    }
}

/// The declared type of a global.
///
/// Globals defined by a constant are declared with its kind, and every other one is
/// `Computed`, which admits any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Integer,
    Character,
    String,
    Boolean,
    Computed,
}

impl Kind {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Character => "character",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Computed => "computed",
        }
    }

    pub fn admits(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Computed, _)
                | (Self::Integer, Value::Integer(_))
                | (Self::Character, Value::Character(_))
                | (Self::String, Value::String(_))
                | (Self::Boolean, Value::Boolean(_))
        )
    }
}

impl From<&Datum> for Value {
    fn from(value: &Datum) -> Self {
        match value {
            Datum::Constant(constant) => match constant.value() {
                Atom::Integer(int) => Self::Integer(int.clone()),
                Atom::Character(chr) => Self::Character(*chr),
                Atom::String(string) => Self::String(string.clone()),
                Atom::Boolean(b) => Self::Boolean(*b),
            },
            Datum::List(list) => Self::List(list.elements().iter().map(Self::from).collect()),
            Datum::Vector(vector) => {
                Self::Vector(vector.elements().iter().map(Self::from).collect())
            }
            Datum::Quotation(quoted) => Self::quotation(Self::from(&**quoted)),
            Datum::Void => Self::Void,
        }
    }
}
