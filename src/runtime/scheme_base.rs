//! The predefined procedures every session starts with.
//!
//! Each entry also names the [`world`](crate::world) function that compiled programs
//! call in its place, so both modes dispatch through the same table.
use std::io;

use num::{BigInt, One, Zero};

use crate::{
    datum::{Datum, SList},
    world::{output, Value},
};

use super::{Arity, Callback, SchemeError};

type Function = fn(&mut dyn io::Write, &[Datum]) -> Result<Datum, SchemeError>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    /// The runtime function a compiled program calls instead
    pub host: &'static str,
    function: Function,
}

impl Callback for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn call(&self, output: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
        (self.function)(output, arguments)
    }
}

macro_rules! builtin {
    ($name:literal, $arity:expr, $host:ident) => {
        Builtin {
            name: $name,
            arity: $arity,
            host: stringify!($host),
            function: $host,
        }
    };
}

pub static PREDEFINED: &[Builtin] = &[
    builtin!("+", Arity::Min(1), add),
    builtin!("-", Arity::Min(1), subtract),
    builtin!("*", Arity::Min(1), multiply),
    builtin!("quotient", Arity::Exact(2), quotient),
    builtin!("<", Arity::Exact(2), less),
    builtin!("<=", Arity::Exact(2), less_equal),
    builtin!(">", Arity::Exact(2), greater),
    builtin!(">=", Arity::Exact(2), greater_equal),
    builtin!("=", Arity::Exact(2), numeric_equal),
    builtin!("equal?", Arity::Exact(2), equal),
    builtin!("car", Arity::Exact(1), car),
    builtin!("cdr", Arity::Exact(1), cdr),
    builtin!("list", Arity::Min(0), list),
    builtin!("display", Arity::Exact(1), display),
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    PREDEFINED.iter().find(|builtin| builtin.name == name)
}

fn integers(arguments: &[Datum]) -> Result<Vec<&BigInt>, SchemeError> {
    arguments
        .iter()
        .map(|datum| {
            datum
                .as_integer()
                .ok_or(SchemeError::WrongArgumentType("integer"))
        })
        .collect()
}

fn exactly<const N: usize>(arguments: &[Datum]) -> Result<&[Datum; N], SchemeError> {
    arguments
        .try_into()
        .map_err(|_| SchemeError::ArityMismatch {
            got: arguments.len(),
            expected: N,
        })
}

fn pair(datum: &Datum) -> Result<&SList, SchemeError> {
    datum.as_list().ok_or(SchemeError::WrongArgumentType("pair"))
}

fn add(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    let sum = integers(arguments)?
        .into_iter()
        .fold(BigInt::zero(), |sum, n| sum + n);
    Ok(Datum::integer(sum))
}

fn multiply(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    let product = integers(arguments)?
        .into_iter()
        .fold(BigInt::one(), |product, n| product * n);
    Ok(Datum::integer(product))
}

fn subtract(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    let integers = integers(arguments)?;
    match integers.split_first() {
        Some((only, [])) => Ok(Datum::integer(-*only)),
        Some((first, rest)) => Ok(Datum::integer(
            rest.iter()
                .fold((*first).clone(), |difference, n| difference - *n),
        )),
        None => Err(SchemeError::MinimalArityMismatch {
            got: 0,
            expected: 1,
        }),
    }
}

fn quotient(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    let [dividend, divisor] = exactly::<2>(arguments)?;
    let (dividend, divisor) = integer_pair(dividend, divisor)?;
    if divisor.is_zero() {
        return Err(SchemeError::DivisionByZero);
    }
    // BigInt division truncates toward zero
    Ok(Datum::integer(dividend / divisor))
}

fn integer_pair<'a>(
    left: &'a Datum,
    right: &'a Datum,
) -> Result<(&'a BigInt, &'a BigInt), SchemeError> {
    match (left.as_integer(), right.as_integer()) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(SchemeError::WrongArgumentType("integer")),
    }
}

fn compare(
    arguments: &[Datum],
    comparison: fn(&BigInt, &BigInt) -> bool,
) -> Result<Datum, SchemeError> {
    let [left, right] = exactly::<2>(arguments)?;
    let (left, right) = integer_pair(left, right)?;
    Ok(Datum::boolean(comparison(left, right)))
}

fn less(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    compare(arguments, |l, r| l < r)
}

fn less_equal(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    compare(arguments, |l, r| l <= r)
}

fn greater(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    compare(arguments, |l, r| l > r)
}

fn greater_equal(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    compare(arguments, |l, r| l >= r)
}

fn numeric_equal(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    compare(arguments, |l, r| l == r)
}

fn equal(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    let [left, right] = exactly::<2>(arguments)?;
    Ok(Datum::boolean(left.equal(right)))
}

fn car(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    let [list] = exactly::<1>(arguments)?;
    pair(list)?.car().cloned()
}

fn cdr(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    let [list] = exactly::<1>(arguments)?;
    pair(list)?.cdr().map(Datum::List)
}

fn list(_: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    Ok(Datum::list(arguments.to_vec()))
}

fn display(sink: &mut dyn io::Write, arguments: &[Datum]) -> Result<Datum, SchemeError> {
    let [datum] = exactly::<1>(arguments)?;
    writeln!(sink, "{}", output::format(&Value::from(datum)))?;
    Ok(Datum::Void)
}

#[cfg(test)]
mod tests {
    use super::lookup;
    use crate::{
        datum::{Constant, Datum},
        runtime::{Callback, NativeProcedure, SchemeError},
    };
    use assert2::{check, let_assert};

    fn apply(name: &str, arguments: &[Datum]) -> Result<Datum, SchemeError> {
        let_assert!(Some(builtin) = lookup(name));
        NativeProcedure::from(*builtin).apply(&mut std::io::sink(), arguments)
    }

    fn ints(values: &[i64]) -> Vec<Datum> {
        values.iter().copied().map(Datum::integer).collect()
    }

    #[test]
    fn arithmetic() {
        check!(apply("+", &ints(&[2, 3, 10, 6])) == Ok(Datum::integer(21)));
        check!(apply("-", &ints(&[20])) == Ok(Datum::integer(-20)));
        check!(apply("-", &ints(&[10, -195, 375, -20])) == Ok(Datum::integer(-150)));
        check!(apply("*", &ints(&[2, 10, 21])) == Ok(Datum::integer(420)));
        check!(apply("quotient", &ints(&[10, 2])) == Ok(Datum::integer(5)));
        check!(apply("quotient", &ints(&[-7, 2])) == Ok(Datum::integer(-3)));
        check!(apply("quotient", &ints(&[1, 0])) == Err(SchemeError::DivisionByZero));
    }

    #[test]
    fn arity_is_checked_first() {
        check!(
            apply("+", &[])
                == Err(SchemeError::MinimalArityMismatch {
                    got: 0,
                    expected: 1
                })
        );
        check!(
            apply("quotient", &ints(&[1, 2, 3]))
                == Err(SchemeError::ArityMismatch {
                    got: 3,
                    expected: 2
                })
        );
        check!(apply("list", &[]) == Ok(Datum::list(vec![])));
    }

    #[test]
    fn wrong_argument_types() {
        let string = Datum::Constant(Constant::string("1"));
        check!(
            apply("+", &[Datum::integer(1), string.clone()])
                == Err(SchemeError::WrongArgumentType("integer"))
        );
        check!(apply("car", &[string]) == Err(SchemeError::WrongArgumentType("pair")));
        check!(
            apply("cdr", &[Datum::list(vec![])]) == Err(SchemeError::WrongArgumentType("pair"))
        );
    }

    #[test]
    fn comparisons() {
        check!(apply("<", &ints(&[1, 2])) == Ok(Datum::boolean(true)));
        check!(apply("<=", &ints(&[2, 2])) == Ok(Datum::boolean(true)));
        check!(apply(">", &ints(&[1, 2])) == Ok(Datum::boolean(false)));
        check!(apply(">=", &ints(&[3, 2])) == Ok(Datum::boolean(true)));
        check!(apply("=", &ints(&[3, 2])) == Ok(Datum::boolean(false)));
    }

    #[test]
    fn display_writes_formatted_text() {
        let_assert!(Some(builtin) = lookup("display"));
        let mut output = vec![];
        let datum = Datum::list(vec![
            Datum::Constant(Constant::string("abc")),
            Datum::boolean(true),
        ]);
        check!(builtin.call(&mut output, &[datum]) == Ok(Datum::Void));
        check!(String::from_utf8_lossy(&output) == "(abc #t)\n");
    }
}
