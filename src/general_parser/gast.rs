//! The types of this module make the results of the general parser more
//! accessible by providing a strongly-typed layer on top of the CST produced
//! by the parser.
use num::BigInt;

use crate::lexer::Token;

/// GAst Syntax Types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[repr(u16)]
pub enum SyntaxKind {
    // Literals
    // (which correspond to tokens)
    /// (
    LPAREN = 0,
    /// )
    RPAREN,
    /// #(
    START_VECTOR,
    /// '
    ABBREV_SYM,
    /// ; comment
    COMMENT,
    /// any kind of inline whitespace
    WHITESPACE,
    /// \r | \n | \r\n
    LINEEND,
    /// a symbol literal (=identifier)
    SYMBOL,
    /// an integer literal
    NUMBER,
    /// a string literal
    STRING,
    /// a boolean literal
    BOOLEAN,
    /// a character literal, possibly with an unknown name
    CHARACTER,
    /// syntax errors
    ERROR,

    // composite nodes
    /// `(+ 2 3)` or `()`
    LIST,
    /// ' DATUM
    ABBREV,
    /// #(  data is "cool")
    VECTOR,
    /// wraps any valid datum
    DATUM,
    /// top-level node: a list of s-expressions
    ROOT,
}
use SyntaxKind::*;

/// Some boilerplate is needed, as rowan settled on using its own
/// `struct SyntaxKind(u16)` internally, instead of accepting the
/// user's `enum SyntaxKind` as a type parameter.
impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Implementing the `Language` trait teaches rowan to convert between
/// these two SyntaxKind types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ByteSchemeLang {}
impl rowan::Language for ByteSchemeLang {
    type Kind = SyntaxKind;
    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= ROOT as u16);
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }
    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SchemeSyntaxNode = rowan::SyntaxNode<ByteSchemeLang>;
pub type SchemeSyntaxToken = rowan::SyntaxToken<ByteSchemeLang>;
pub type SchemeSyntaxElement = rowan::NodeOrToken<SchemeSyntaxNode, SchemeSyntaxToken>;

/// Anything that is a non-terminal
pub trait GAstNode {
    fn cast(syntax: SchemeSyntaxNode) -> Option<Self>
    where
        Self: Sized;

    fn syntax(&self) -> &SchemeSyntaxNode;
}

/// Anything that is a terminal
pub trait GAstToken {
    fn cast(syntax: SchemeSyntaxToken) -> Option<Self>
    where
        Self: Sized;

    fn syntax(&self) -> &SchemeSyntaxToken;
}

macro_rules! simple_gast {
    (node $name:ident from $kind:ident) => {
        impl GAstNode for $name {
            fn cast(syntax: SchemeSyntaxNode) -> Option<Self>
            where
                Self: Sized,
            {
                (syntax.kind() == $kind).then_some(Self(syntax))
            }

            fn syntax(&self) -> &SchemeSyntaxNode {
                &self.0
            }
        }
    };

    (node $name:ident from $kind:ident $with:expr) => {
        impl GAstNode for $name {
            fn cast(syntax: SchemeSyntaxNode) -> Option<Self>
            where
                Self: Sized,
            {
                (syntax.kind() == $kind && $with(&syntax)).then_some(Self(syntax))
            }

            fn syntax(&self) -> &SchemeSyntaxNode {
                &self.0
            }
        }
    };
    (token $name:ident from $kind:ident) => {
        impl GAstToken for $name {
            fn cast(syntax: SchemeSyntaxToken) -> Option<Self>
            where
                Self: Sized,
            {
                (syntax.kind() == $kind).then_some(Self(syntax))
            }

            fn syntax(&self) -> &SchemeSyntaxToken {
                &self.0
            }
        }
    };
}

/// Any node that can contain datum
pub trait ContainsDatum {
    fn datum(&self) -> impl Iterator<Item = Datum>;
}

macro_rules! contains {
    (datum $tyn:ident) => {
        impl ContainsDatum for $tyn {
            fn datum(&self) -> impl Iterator<Item = Datum> {
                self.0.children().filter_map(Datum::cast)
            }
        }
    };
}

/// Root GAst type for a file
#[derive(Debug, Clone)]
pub struct Module(SchemeSyntaxNode);
simple_gast!(node Module from ROOT);
contains!(datum Module);

#[derive(Debug, Clone)]
pub struct Abbreviation(SchemeSyntaxNode);
simple_gast!(node Abbreviation from ABBREV);
contains!(datum Abbreviation);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatumKind {
    List,
    Vector,
    Abbreviation,
    Symbol,
    Number,
    StringToken,
    Character,
    Boolean,
}

#[derive(Debug, Clone)]
pub struct Datum(SchemeSyntaxNode);
impl Datum {
    // If this says `Some`, calling the correct as_* must return `Some`
    pub fn kind(&self) -> Option<DatumKind> {
        match self.0.children_with_tokens().next() {
            None => None,
            Some(SchemeSyntaxElement::Node(node)) => match node.kind() {
                LIST => Some(DatumKind::List),
                VECTOR => Some(DatumKind::Vector),
                ABBREV => Some(DatumKind::Abbreviation),
                _ => None,
            },
            Some(SchemeSyntaxElement::Token(tok)) => match tok.kind() {
                SYMBOL => Some(DatumKind::Symbol),
                NUMBER => Some(DatumKind::Number),
                STRING => Some(DatumKind::StringToken),
                CHARACTER => Some(DatumKind::Character),
                BOOLEAN => Some(DatumKind::Boolean),
                _ => None,
            },
        }
    }
}
// *all* validly parsed datum only contain 1 child
simple_gast!(node Datum from DATUM |syntax: &SchemeSyntaxNode| {
    syntax.children_with_tokens().count() == 1
});

macro_rules! datum_as_type {
    (node $name:ident for $type:ident from $stype:ident) => {
        impl Datum {
            pub fn $name(&self) -> Option<$type> {
                match self.0.children().next() {
                    Some(node) if node.kind() == $stype => $type::cast(node),
                    _ => None,
                }
            }
        }
    };

    (token $name:ident for $type:ident from $stype:ident) => {
        impl Datum {
            pub fn $name(&self) -> Option<$type> {
                match self.0.children_with_tokens().next() {
                    Some(SchemeSyntaxElement::Token(token)) if token.kind() == $stype => {
                        $type::cast(token)
                    }
                    _ => None,
                }
            }
        }
    };
}
datum_as_type!(node as_list for List from LIST);
datum_as_type!(node as_vector for Vector from VECTOR);
datum_as_type!(node as_abbreviation for Abbreviation from ABBREV);
datum_as_type!(token as_symbol for Symbol from SYMBOL);
datum_as_type!(token as_number for Number from NUMBER);
datum_as_type!(token as_string for StringToken from STRING);
datum_as_type!(token as_char for Character from CHARACTER);
datum_as_type!(token as_bool for Boolean from BOOLEAN);

#[derive(Debug, Clone)]
pub struct List(SchemeSyntaxNode);
impl List {
    /// Get the head element
    pub fn head(&self) -> Option<Datum> {
        self.datum().next()
    }

    /// The identifier in head position, if there is one
    pub fn head_identifier(&self) -> Option<Box<str>> {
        self.head()?.as_symbol()?.identifier()
    }
}
simple_gast!(node List from LIST);
contains!(datum List);

#[derive(Debug, Clone)]
pub struct Vector(SchemeSyntaxNode);
simple_gast!(node Vector from VECTOR);
contains!(datum Vector);

macro_rules! simple_extract {
    ($ty:ident::$name:ident from $stt:ident as $type:ty ) => {
        impl $ty {
            pub fn $name(&self) -> Option<$type> {
                if let Some(Ok(Token::$stt(val))) = Token::lexer(self.0.text()).next() {
                    Some(val)
                } else {
                    None
                }
            }
        }
    };
}

#[derive(Debug, Clone)]
pub struct Symbol(SchemeSyntaxToken);
simple_gast!(token Symbol from SYMBOL);
simple_extract!(Symbol::identifier from Identifier as Box<str>);

#[derive(Debug, Clone)]
pub struct Number(SchemeSyntaxToken);
simple_gast!(token Number from NUMBER);
simple_extract!(Number::number from Number as BigInt);

#[derive(Debug, Clone)]
pub struct StringToken(SchemeSyntaxToken);
simple_gast!(token StringToken from STRING);
simple_extract!(StringToken::string from String as Box<str>);

#[derive(Debug, Clone)]
pub struct Character(SchemeSyntaxToken);
simple_gast!(token Character from CHARACTER);
simple_extract!(Character::name from Character as Box<str>);

#[derive(Debug, Clone)]
pub struct Boolean(SchemeSyntaxToken);
simple_gast!(token Boolean from BOOLEAN);
simple_extract!(Boolean::bool from Boolean as bool);
