pub mod compiler;
pub mod datum;
pub mod general_parser;
pub mod lexer;
pub mod runtime;
pub mod syntax;
pub mod world;

pub use datum::Datum;
pub use general_parser::{gast::ContainsDatum, general_parse};
pub use runtime::{treewalk::Treewalk, SchemeError};
pub use syntax::{Program, SyntaxError};

/// Anything that can go wrong between source text and its values
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Scheme(#[from] SchemeError),
}
