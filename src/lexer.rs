pub use logos::Span;
use logos::{Lexer, Logos};
use num::BigInt;

fn process_string(lexer: &mut Lexer<Token>) -> Box<str> {
    // the regex guarantees the surrounding quotes and the absence of escapes
    let slice = lexer.slice();
    Box::from(&slice[1..slice.len() - 1])
}

fn process_character(lexer: &mut Lexer<Token>) -> Box<str> {
    // skip the #\ at the front, the name is validated when the datum is built
    Box::from(&lexer.slice()[2..])
}

fn read_integer(lexer: &mut Lexer<Token>) -> Result<BigInt, LexerError> {
    lexer
        .slice()
        .parse::<BigInt>()
        .map_err(|_| LexerError::MalformedNumber)
}

#[derive(thiserror::Error, Debug, PartialEq, Clone, Default)]
pub enum LexerError {
    #[default]
    #[error("invalid token encountered")]
    Invalid,
    #[error("malformed number")]
    MalformedNumber,
}

/// Tokens are lexed from some source.
///
/// Strings are only accepted without escapes, so an embedded `"` or `\` is an error.
#[derive(Debug, Clone, PartialEq, Logos)]
#[logos(error = LexerError)]
pub enum Token {
    #[regex("[ \t\x0C]+")]
    IntralineWhitespace,
    #[token("\n")]
    #[token("\r\n")]
    #[token("\r")]
    LineEnding,
    #[regex(r";[^\n]*")]
    Comment,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("'")]
    Quote,
    #[token("#(")]
    StartVector,
    #[regex(r#"[a-zA-Z!$%&*/:<=>?^_~][0-9a-zA-Z!$%&*/:<=>?^_~+\-.@]*"#, |l| Box::from(l.slice()))]
    #[token("+", |l| Box::from(l.slice()))]
    #[token("-", |l| Box::from(l.slice()))]
    #[regex(r"[-+][a-zA-Z!$%&*/:<=>?^_~+\-@][0-9a-zA-Z!$%&*/:<=>?^_~+\-.@]*", |l| Box::from(l.slice()))]
    #[regex(r"[-+]\.[a-zA-Z!$%&*/:<=>?^_~+\-.@][0-9a-zA-Z!$%&*/:<=>?^_~+\-.@]*", |l| Box::from(l.slice()))]
    #[regex(r"\.[a-zA-Z!$%&*/:<=>?^_~+\-.@][0-9a-zA-Z!$%&*/:<=>?^_~+\-.@]*", |l| Box::from(l.slice()))]
    Identifier(Box<str>),
    #[regex("(?i)#t(rue)?", |_| true)]
    #[regex("(?i)#f(alse)?", |_| false)]
    Boolean(bool),
    #[regex(r"#\\.[^ \t\r\n()]*", process_character)]
    Character(Box<str>),
    #[regex(r#""[^"\\]*""#, process_string)]
    String(Box<str>),
    #[regex(r"[+-]?[0-9]+", read_integer)]
    Number(BigInt),
}

impl Token {
    pub fn lexer(source: &str) -> Lexer<Self> {
        <Self as Logos>::lexer(source)
    }
}

#[cfg(test)]
mod tests {
    use super::{LexerError, Token};
    use arbtest::arbtest;
    use assert2::{assert, check, let_assert};
    use num::BigInt;

    #[test]
    fn identifier_checklist() {
        macro_rules! test_valid {
            ($source:literal) => {{
                let mut lexer = Token::lexer($source);
                let token = lexer.next();
                let_assert!(Some(Ok(Token::Identifier(_))) = token);
                assert!(lexer.slice() == $source);
            }};
        }

        test_valid!("...");
        test_valid!("<=?");
        test_valid!("+");
        test_valid!("-");
        test_valid!("+soup+");
        test_valid!("->string");
        test_valid!("a34kTMNs");
        test_valid!("equal?");
        test_valid!("V17a");
        test_valid!("the-word-recursion-has-many-meanings");
        test_valid!("$.+");
        test_valid!("~.");
    }

    #[test]
    fn test_boolean() {
        check!(Token::lexer("#t").next() == Some(Ok(Token::Boolean(true))));
        check!(Token::lexer("#true").next() == Some(Ok(Token::Boolean(true))));
        check!(Token::lexer("#F").next() == Some(Ok(Token::Boolean(false))));
        check!(Token::lexer("#false").next() == Some(Ok(Token::Boolean(false))));
    }

    #[test]
    fn test_character() {
        check!(Token::lexer(r"#\a").next() == Some(Ok(Token::Character("a".into()))));
        check!(Token::lexer(r"#\(").next() == Some(Ok(Token::Character("(".into()))));
        check!(Token::lexer(r"#\λ").next() == Some(Ok(Token::Character("λ".into()))));
        check!(
            Token::lexer(r"#\newline").next() == Some(Ok(Token::Character("newline".into())))
        );
        // malformed names are still tokens, they are rejected later
        check!(Token::lexer(r"#\abc").next() == Some(Ok(Token::Character("abc".into()))));

        let mut lexer = Token::lexer(r"(#\a)");
        check!(lexer.next() == Some(Ok(Token::LParen)));
        check!(lexer.next() == Some(Ok(Token::Character("a".into()))));
        check!(lexer.next() == Some(Ok(Token::RParen)));
    }

    #[test]
    fn test_string() {
        check!(Token::lexer(r#""apple""#).next() == Some(Ok(Token::String("apple".into()))));
        check!(Token::lexer(r#""""#).next() == Some(Ok(Token::String("".into()))));

        let_assert!(Some(Err(LexerError::Invalid)) = Token::lexer(r#""\""#).next());
    }

    #[test]
    fn test_number() {
        check!(Token::lexer("51").next() == Some(Ok(Token::Number(BigInt::from(51)))));
        check!(Token::lexer("-1237").next() == Some(Ok(Token::Number(BigInt::from(-1237)))));
        check!(Token::lexer("+8").next() == Some(Ok(Token::Number(BigInt::from(8)))));

        let big = "123456789012345678901234567890";
        let_assert!(Some(Ok(Token::Number(n))) = Token::lexer(big).next());
        check!(n.to_string() == big);
    }

    #[test]
    fn test_number_arbtest_decimal() {
        arbtest(|u| {
            let number: i128 = u.arbitrary()?;
            let decimal = number.to_string();
            check!(
                Token::lexer(&decimal).next() == Some(Ok(Token::Number(BigInt::from(number)))),
                "{number} `{decimal}` does not roundtrip"
            );
            Ok(())
        });
    }

    #[test]
    fn trivia_is_tokenized() {
        let tokens: Vec<_> = Token::lexer("; comment\n (x)\r\n").collect();
        check!(
            tokens
                == vec![
                    Ok(Token::Comment),
                    Ok(Token::LineEnding),
                    Ok(Token::IntralineWhitespace),
                    Ok(Token::LParen),
                    Ok(Token::Identifier("x".into())),
                    Ok(Token::RParen),
                    Ok(Token::LineEnding),
                ]
        );
    }
}
