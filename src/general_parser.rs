//! General parsing starts where the lexer dropped of, and handles nested syntax, while
//! also forming a GAST which is a relatively simple layer on top of a [`rowan`] CST.
use rowan::{GreenNode, GreenNodeBuilder};

use crate::lexer::{LexerError, Span, Token};

pub mod gast;
pub mod special_forms;

use gast::{GAstNode, Module, SchemeSyntaxNode, SyntaxKind, SyntaxKind::*};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{error}")]
    Lexer { span: Span, error: LexerError },
    #[error("unexpected `)`")]
    UnexpectedParen { span: Span },
    #[error("unclosed list")]
    Unclosed { span: Span },
    #[error("quote is missing its datum")]
    DanglingQuote { span: Span },
}

impl ParseError {
    /// Where in the source the error points to
    pub fn span(&self) -> Span {
        match self {
            Self::Lexer { span, .. }
            | Self::UnexpectedParen { span }
            | Self::Unclosed { span }
            | Self::DanglingQuote { span } => span.clone(),
        }
    }
}

/// The lossless tree of a source text, together with everything that went wrong
/// while building it.
#[derive(Debug, Clone)]
pub struct GeneralParse {
    green: GreenNode,
    errors: Vec<ParseError>,
}

impl GeneralParse {
    pub fn syntax(&self) -> SchemeSyntaxNode {
        SchemeSyntaxNode::new_root(self.green.clone())
    }

    pub fn module(&self) -> Option<Module> {
        Module::cast(self.syntax())
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}

pub fn general_parse(source: &str) -> GeneralParse {
    let tokens = Token::lexer(source)
        .spanned()
        .map(|(token, span)| {
            let text = &source[span.clone()];
            (token, span, text)
        })
        .collect();

    Parser {
        tokens,
        cursor: 0,
        builder: GreenNodeBuilder::new(),
        errors: vec![],
    }
    .parse()
}

fn token_kind(token: &Result<Token, LexerError>) -> SyntaxKind {
    match token {
        Ok(Token::IntralineWhitespace) => WHITESPACE,
        Ok(Token::LineEnding) => LINEEND,
        Ok(Token::Comment) => COMMENT,
        Ok(Token::LParen) => LPAREN,
        Ok(Token::RParen) => RPAREN,
        Ok(Token::Quote) => ABBREV_SYM,
        Ok(Token::StartVector) => START_VECTOR,
        Ok(Token::Identifier(_)) => SYMBOL,
        Ok(Token::Boolean(_)) => BOOLEAN,
        Ok(Token::Character(_)) => CHARACTER,
        Ok(Token::String(_)) => STRING,
        Ok(Token::Number(_)) => NUMBER,
        Err(_) => ERROR,
    }
}

struct Parser<'src> {
    tokens: Vec<(Result<Token, LexerError>, Span, &'src str)>,
    cursor: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
}

impl Parser<'_> {
    fn parse(mut self) -> GeneralParse {
        self.builder.start_node(ROOT.into());
        loop {
            self.eat_trivia();
            match self.peek() {
                None => break,
                Some(RPAREN) => {
                    let span = self.span();
                    self.errors.push(ParseError::UnexpectedParen { span });
                    self.bump_as(ERROR);
                }
                Some(_) => self.parse_datum(),
            }
        }
        self.builder.finish_node();

        GeneralParse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    fn peek(&self) -> Option<SyntaxKind> {
        self.tokens
            .get(self.cursor)
            .map(|(token, _, _)| token_kind(token))
    }

    fn span(&self) -> Span {
        match self.tokens.get(self.cursor) {
            Some((_, span, _)) => span.clone(),
            None => {
                let end = self.tokens.last().map_or(0, |(_, span, _)| span.end);
                end..end
            }
        }
    }

    fn bump(&mut self) {
        if let Some((token, _, _)) = self.tokens.get(self.cursor) {
            self.bump_as(token_kind(token));
        }
    }

    fn bump_as(&mut self, kind: SyntaxKind) {
        if let Some((token, span, text)) = self.tokens.get(self.cursor) {
            if let Err(error) = token {
                self.errors.push(ParseError::Lexer {
                    span: span.clone(),
                    error: error.clone(),
                });
            }
            self.builder.token(kind.into(), text);
            self.cursor += 1;
        }
    }

    fn eat_trivia(&mut self) {
        while let Some(WHITESPACE | LINEEND | COMMENT) = self.peek() {
            self.bump();
        }
    }

    // only called when the next token starts a datum (or is an error)
    fn parse_datum(&mut self) {
        match self.peek() {
            Some(LPAREN) => self.parse_sequence(LIST),
            Some(START_VECTOR) => self.parse_sequence(VECTOR),
            Some(ABBREV_SYM) => {
                let span = self.span();
                self.builder.start_node(DATUM.into());
                self.builder.start_node(ABBREV.into());
                self.bump();
                self.eat_trivia();
                match self.peek() {
                    None | Some(RPAREN) => self.errors.push(ParseError::DanglingQuote { span }),
                    Some(_) => self.parse_datum(),
                }
                self.builder.finish_node();
                self.builder.finish_node();
            }
            Some(ERROR) => self.bump(),
            Some(_) => {
                self.builder.start_node(DATUM.into());
                self.bump();
                self.builder.finish_node();
            }
            None => {}
        }
    }

    fn parse_sequence(&mut self, kind: SyntaxKind) {
        let open = self.span();
        self.builder.start_node(DATUM.into());
        self.builder.start_node(kind.into());
        self.bump();
        loop {
            self.eat_trivia();
            match self.peek() {
                None => {
                    self.errors.push(ParseError::Unclosed { span: open });
                    break;
                }
                Some(RPAREN) => {
                    self.bump();
                    break;
                }
                Some(_) => self.parse_datum(),
            }
        }
        self.builder.finish_node();
        self.builder.finish_node();
    }
}
