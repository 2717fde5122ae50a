//! Representation of Scheme data
use core::fmt;
use std::{collections::HashMap, rc::Rc, sync::LazyLock};

use num::BigInt;

use crate::{runtime::SchemeError, syntax};

/// The typed payload of a [`Constant`].
///
/// Symbols are strings too; only their text tells them apart.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Integer(BigInt),
    Character(char),
    String(Box<str>),
    Boolean(bool),
}

/// An atom together with its canonical source text
#[derive(Debug, Clone)]
pub struct Constant {
    value: Atom,
    text: Box<str>,
}

static NAMED_CHARACTERS: LazyLock<HashMap<&str, char>> = LazyLock::new(|| {
    let mut named_map = HashMap::new();
    named_map.insert("newline", '\n');
    named_map.insert("space", ' ');
    named_map
});

/// Reads the name that follows `#\` in a character literal
pub fn read_character(name: &str) -> Result<char, SchemeError> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(chr), None) => Ok(chr),
        _ => NAMED_CHARACTERS
            .get(name)
            .copied()
            .ok_or_else(|| SchemeError::CharacterLiteral(format!("#\\{name}").into())),
    }
}

/// The `#\` notation of a character
pub fn character_text(chr: char) -> String {
    match chr {
        '\n' => String::from("#\\newline"),
        ' ' => String::from("#\\space"),
        c => format!("#\\{c}"),
    }
}

impl Constant {
    pub fn integer(value: BigInt) -> Self {
        let text = value.to_string().into();
        Self {
            value: Atom::Integer(value),
            text,
        }
    }

    pub fn character(value: char) -> Self {
        Self {
            value: Atom::Character(value),
            text: character_text(value).into(),
        }
    }

    pub fn string(value: &str) -> Self {
        Self {
            value: Atom::String(value.into()),
            text: format!("\"{value}\"").into(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            value: Atom::Boolean(value),
            text: if value { "#t" } else { "#f" }.into(),
        }
    }

    /// The value of a quoted identifier: a string that prints as its own name
    pub fn symbol(name: &str) -> Self {
        Self {
            value: Atom::String(name.into()),
            text: name.into(),
        }
    }

    pub fn from_literal(literal: &syntax::Literal) -> Result<Self, SchemeError> {
        match literal {
            syntax::Literal::Integer(value) => Ok(Self::integer(value.clone())),
            syntax::Literal::Character(name) => read_character(name).map(Self::character),
            syntax::Literal::String(value) => Ok(Self::string(value)),
            syntax::Literal::Boolean(value) => Ok(Self::boolean(*value)),
        }
    }

    pub fn value(&self) -> &Atom {
        &self.value
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

// constants are compared by the value they wrap
impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// A Scheme list. Cloning and taking the `cdr` share the elements.
#[derive(Debug, Clone)]
pub struct SList {
    elements: Rc<[Datum]>,
    start: usize,
}

impl SList {
    pub fn new(elements: Vec<Datum>) -> Self {
        Self {
            elements: elements.into(),
            start: 0,
        }
    }

    pub fn elements(&self) -> &[Datum] {
        &self.elements[self.start..]
    }

    pub fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }

    pub fn car(&self) -> Result<&Datum, SchemeError> {
        self.elements()
            .first()
            .ok_or(SchemeError::WrongArgumentType("pair"))
    }

    pub fn cdr(&self) -> Result<SList, SchemeError> {
        if self.is_empty() {
            return Err(SchemeError::WrongArgumentType("pair"));
        }
        Ok(Self {
            elements: Rc::clone(&self.elements),
            start: self.start + 1,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Vector {
    elements: Rc<[Datum]>,
}

impl Vector {
    pub fn new(elements: Vec<Datum>) -> Self {
        Self {
            elements: elements.into(),
        }
    }

    pub fn elements(&self) -> &[Datum] {
        &self.elements
    }
}

// Type that stores all possible values!
#[derive(Debug, Clone)]
pub enum Datum {
    Constant(Constant),
    List(SList),
    Vector(Vector),
    Quotation(Rc<Datum>),
    // the unspecified value returned by `display`
    Void,
}

impl Datum {
    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::Constant(Constant::integer(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::Constant(Constant::boolean(value))
    }

    pub fn list(elements: Vec<Datum>) -> Self {
        Self::List(SList::new(elements))
    }

    /// Applies the quotation rules to quoted syntax
    pub fn from_quoted(datum: &syntax::Datum) -> Result<Self, SchemeError> {
        match datum {
            syntax::Datum::Constant(literal) => Constant::from_literal(literal).map(Self::Constant),
            syntax::Datum::Identifier(name) => Ok(Self::Constant(Constant::symbol(name))),
            syntax::Datum::List(elements) => elements
                .iter()
                .map(Self::from_quoted)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::list),
            syntax::Datum::Vector(elements) => elements
                .iter()
                .map(Self::from_quoted)
                .collect::<Result<Vec<_>, _>>()
                .map(|elements| Self::Vector(Vector::new(elements))),
            syntax::Datum::Quotation(quoted) => {
                Self::from_quoted(quoted).map(|inner| Self::Quotation(Rc::new(inner)))
            }
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Self::Constant(Constant {
                value: Atom::Integer(int),
                ..
            }) => Some(int),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&SList> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// Only the boolean `#f` is false
    pub fn is_true(&self) -> bool {
        !matches!(
            self,
            Self::Constant(Constant {
                value: Atom::Boolean(false),
                ..
            })
        )
    }

    /// Structural equality as `equal?` sees it
    pub fn equal(&self, other: &Datum) -> bool {
        fn sequence_equal(left: &[Datum], right: &[Datum]) -> bool {
            left.len() == right.len() && left.iter().zip(right).all(|(l, r)| l.equal(r))
        }

        match (self, other) {
            (Self::Constant(left), Self::Constant(right)) => left == right,
            (Self::List(left), Self::List(right)) => {
                sequence_equal(left.elements(), right.elements())
            }
            (Self::Vector(left), Self::Vector(right)) => {
                sequence_equal(left.elements(), right.elements())
            }
            (Self::Quotation(left), Self::Quotation(right)) => left.equal(right),
            (Self::Void, Self::Void) => true,
            _ => false,
        }
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

fn join(data: &[Datum]) -> String {
    data.iter()
        .map(|datum| datum.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(constant) => write!(f, "{}", constant.text()),
            Self::List(list) => write!(f, "({})", join(list.elements())),
            Self::Vector(vector) => write!(f, "#({})", join(vector.elements())),
            Self::Quotation(quoted) => write!(f, "'{quoted}"),
            Self::Void => Ok(()),
        }
    }
}
