//! The owned program tree that both the evaluator and the code generator walk.
//!
//! It is lowered from the typed layer of a [`general_parse`], and only keeps what
//! evaluation needs: every node kind is a closed enum that is matched exhaustively.
use std::rc::Rc;

use num::BigInt;

use crate::general_parser::{
    gast::{self, ContainsDatum, DatumKind, GAstNode},
    general_parse,
    special_forms::SpecialForm,
    ParseError,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Parse(Vec<ParseError>),
    #[error("Malformed definition '{0}'")]
    MalformedDefinition(String),
    #[error("Body of procedure {0} does not contain an expression")]
    EmptyBody(Box<str>),
    #[error("Definition is not allowed here: '{0}'")]
    MisplacedDefinition(String),
    #[error("'begin' is only allowed at top level: '{0}'")]
    MisplacedBegin(String),
    #[error("Malformed quotation '{0}'")]
    MalformedQuotation(String),
    #[error("Cannot evaluate the empty combination '()'")]
    EmptyApplication,
    #[error("Expected a procedure name but got '{0}'")]
    InvalidProcedure(String),
    #[error("Malformed datum '{0}'")]
    MalformedDatum(String),
}

/// A whole source text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub forms: Vec<Form>,
}

/// One top-level unit of a program
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    Expression(Expression),
    Definition(Definition),
    /// `(begin form ...)` groups forms at top level
    Begin(Vec<Form>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Variable(VariableDefinition),
    Procedure(Rc<ProcedureDefinition>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: Box<str>,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureDefinition {
    pub name: Box<str>,
    pub params: Vec<Box<str>>,
    /// Internal definitions, run on every call before the body
    pub definitions: Vec<Definition>,
    /// Body expressions evaluated only for their side effects
    pub effects: Vec<Expression>,
    /// The last body expression, whose value is the result of a call
    pub body: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(Literal),
    Identifier(Box<str>),
    Application(Application),
    Quotation(Datum),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub procedure: Box<str>,
    pub operands: Vec<Expression>,
}

/// A constant as written in the source.
///
/// Characters keep their raw name, they are only validated when evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(BigInt),
    Character(Box<str>),
    String(Box<str>),
    Boolean(bool),
}

/// Quoted data
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Constant(Literal),
    Identifier(Box<str>),
    List(Vec<Datum>),
    Vector(Vec<Datum>),
    Quotation(Box<Datum>),
}

impl Program {
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        let parse = general_parse(source);
        if !parse.errors().is_empty() {
            return Err(SyntaxError::Parse(parse.errors().to_vec()));
        }
        match parse.module() {
            Some(module) => Self::lower(&module),
            None => Err(SyntaxError::MalformedDatum(source.to_string())),
        }
    }

    pub fn lower(module: &gast::Module) -> Result<Self, SyntaxError> {
        let forms = module
            .datum()
            .map(|datum| lower_form(&datum))
            .collect::<Result<_, _>>()?;
        Ok(Self { forms })
    }
}

fn text(datum: &gast::Datum) -> String {
    datum.syntax().text().to_string()
}

fn is_definition(datum: &gast::Datum) -> bool {
    datum
        .as_list()
        .is_some_and(|list| SpecialForm::of(&list) == Some(SpecialForm::Define))
}

fn identifier(datum: &gast::Datum) -> Option<Box<str>> {
    datum.as_symbol()?.identifier()
}

fn lower_form(datum: &gast::Datum) -> Result<Form, SyntaxError> {
    if let Some(list) = datum.as_list() {
        match SpecialForm::of(&list) {
            Some(SpecialForm::Define) => return lower_definition(datum, &list).map(Form::Definition),
            Some(SpecialForm::Begin) => {
                return list
                    .datum()
                    .skip(1)
                    .map(|datum| lower_form(&datum))
                    .collect::<Result<_, _>>()
                    .map(Form::Begin)
            }
            _ => {}
        }
    }
    lower_expression(datum).map(Form::Expression)
}

fn lower_definition(datum: &gast::Datum, list: &gast::List) -> Result<Definition, SyntaxError> {
    let malformed = || SyntaxError::MalformedDefinition(text(datum));
    let mut parts = list.datum().skip(1);
    let target = parts.next().ok_or_else(malformed)?;

    // (define name expression)
    if let Some(name) = identifier(&target) {
        let (Some(value), None) = (parts.next(), parts.next()) else {
            return Err(malformed());
        };
        return Ok(Definition::Variable(VariableDefinition {
            name,
            expression: lower_expression(&value)?,
        }));
    }

    // (define (name params ...) definitions ... expressions ...)
    let signature = target.as_list().ok_or_else(malformed)?;
    let mut names = signature
        .datum()
        .map(|datum| identifier(&datum).ok_or_else(malformed));
    let name = names.next().ok_or_else(malformed)??;
    let params = names.collect::<Result<Vec<_>, _>>()?;

    let mut definitions = vec![];
    let mut effects = vec![];
    for part in parts {
        match part.as_list() {
            Some(inner) if is_definition(&part) => {
                if !effects.is_empty() {
                    return Err(SyntaxError::MisplacedDefinition(text(&part)));
                }
                definitions.push(lower_definition(&part, &inner)?);
            }
            _ => effects.push(lower_expression(&part)?),
        }
    }
    let Some(body) = effects.pop() else {
        return Err(SyntaxError::EmptyBody(name));
    };

    Ok(Definition::Procedure(Rc::new(ProcedureDefinition {
        name,
        params,
        definitions,
        effects,
        body,
    })))
}

fn lower_literal(datum: &gast::Datum) -> Option<Literal> {
    match datum.kind()? {
        DatumKind::Number => datum.as_number()?.number().map(Literal::Integer),
        DatumKind::Character => datum.as_char()?.name().map(Literal::Character),
        DatumKind::StringToken => datum.as_string()?.string().map(Literal::String),
        DatumKind::Boolean => datum.as_bool()?.bool().map(Literal::Boolean),
        _ => None,
    }
}

fn lower_expression(datum: &gast::Datum) -> Result<Expression, SyntaxError> {
    let malformed = || SyntaxError::MalformedDatum(text(datum));
    match datum.kind().ok_or_else(malformed)? {
        DatumKind::Number | DatumKind::Character | DatumKind::StringToken | DatumKind::Boolean => {
            lower_literal(datum)
                .map(Expression::Constant)
                .ok_or_else(malformed)
        }
        DatumKind::Symbol => identifier(datum)
            .map(Expression::Identifier)
            .ok_or_else(malformed),
        // vectors are self-evaluating
        DatumKind::Abbreviation | DatumKind::Vector => lower_datum(datum).map(|quoted| match quoted {
            Datum::Quotation(inner) => Expression::Quotation(*inner),
            vector => Expression::Quotation(vector),
        }),
        DatumKind::List => {
            let list = datum.as_list().ok_or_else(malformed)?;
            match SpecialForm::of(&list) {
                Some(SpecialForm::Quote) => {
                    return lower_datum(datum).and_then(|quoted| match quoted {
                        Datum::Quotation(inner) => Ok(Expression::Quotation(*inner)),
                        _ => Err(SyntaxError::MalformedQuotation(text(datum))),
                    })
                }
                Some(SpecialForm::Define) => {
                    return Err(SyntaxError::MisplacedDefinition(text(datum)))
                }
                Some(SpecialForm::Begin) => return Err(SyntaxError::MisplacedBegin(text(datum))),
                Some(SpecialForm::If) | None => {}
            }

            let mut parts = list.datum();
            let head = parts.next().ok_or(SyntaxError::EmptyApplication)?;
            let procedure =
                identifier(&head).ok_or_else(|| SyntaxError::InvalidProcedure(text(&head)))?;
            let operands = parts
                .map(|operand| lower_expression(&operand))
                .collect::<Result<_, _>>()?;
            Ok(Expression::Application(Application {
                procedure,
                operands,
            }))
        }
    }
}

fn lower_datum(datum: &gast::Datum) -> Result<Datum, SyntaxError> {
    let malformed = || SyntaxError::MalformedDatum(text(datum));
    match datum.kind().ok_or_else(malformed)? {
        DatumKind::Number | DatumKind::Character | DatumKind::StringToken | DatumKind::Boolean => {
            lower_literal(datum).map(Datum::Constant).ok_or_else(malformed)
        }
        DatumKind::Symbol => identifier(datum).map(Datum::Identifier).ok_or_else(malformed),
        DatumKind::Abbreviation => {
            let abbreviation = datum.as_abbreviation().ok_or_else(malformed)?;
            let quoted = abbreviation.datum().next().ok_or_else(malformed)?;
            Ok(Datum::Quotation(Box::new(lower_datum(&quoted)?)))
        }
        DatumKind::Vector => {
            let vector = datum.as_vector().ok_or_else(malformed)?;
            vector
                .datum()
                .map(|element| lower_datum(&element))
                .collect::<Result<_, _>>()
                .map(Datum::Vector)
        }
        DatumKind::List => {
            let list = datum.as_list().ok_or_else(malformed)?;
            let elements = list.datum().collect::<Vec<_>>();
            match (SpecialForm::of(&list), elements.as_slice()) {
                (Some(SpecialForm::Quote), [_, quoted]) => {
                    Ok(Datum::Quotation(Box::new(lower_datum(quoted)?)))
                }
                (Some(SpecialForm::Quote), _) => Err(SyntaxError::MalformedQuotation(text(datum))),
                _ => elements
                    .iter()
                    .map(lower_datum)
                    .collect::<Result<_, _>>()
                    .map(Datum::List),
            }
        }
    }
}
