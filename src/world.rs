//! The runtime that compiled programs link against.
//!
//! Every predefined procedure has a function here with the same arity and type
//! contract as its [`scheme_base`](crate::runtime::scheme_base) counterpart, working
//! on [`Value`]s instead of [`Datum`](crate::Datum)s.
//!
//! Globals and procedures are `static` slots that the generated `run` function fills
//! in as their definitions execute, so a redefinition only affects what runs after
//! it. Procedure calls that bind names read by other procedures push a [`Frame`],
//! and [`variable`] searches those frames from the innermost call outwards.
use std::{
    cell::RefCell,
    sync::{PoisonError, RwLock},
};

use num::{BigInt, One, Zero};

use crate::runtime::SchemeError;

pub mod output;
pub mod value;

pub use value::{Kind, Value};

thread_local! {
    static FRAMES: RefCell<Vec<Vec<(&'static str, Value)>>> = const { RefCell::new(Vec::new()) };
    static CAPTURED: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// A global variable of a compiled program
#[derive(Debug)]
pub struct Global {
    name: &'static str,
    kind: Kind,
    value: RwLock<Option<Value>>,
}

impl Global {
    pub const fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            value: RwLock::new(None),
        }
    }

    /// Binds (or rebinds) the global to a value of its declared kind
    pub fn define(&self, value: Value) -> Result<(), SchemeError> {
        if !self.kind.admits(&value) {
            return Err(SchemeError::WrongArgumentType(self.kind.describe()));
        }
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
        Ok(())
    }

    pub fn get(&self) -> Result<Value, SchemeError> {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| SchemeError::UndefinedVariable(self.name.into()))
    }
}

/// The code of a compiled procedure
pub type Code = fn(&[Value]) -> Result<Value, SchemeError>;

/// A procedure name of a compiled program, bound to the code of its latest
/// definition
#[derive(Debug)]
pub struct Procedure {
    name: &'static str,
    code: RwLock<Option<Code>>,
}

impl Procedure {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            code: RwLock::new(None),
        }
    }

    /// A user procedure that shares its name with a predefined one, which stays in
    /// effect until the first definition runs
    pub const fn predefined(name: &'static str, code: Code) -> Self {
        Self {
            name,
            code: RwLock::new(Some(code)),
        }
    }

    pub fn define(&self, code: Code) {
        *self.code.write().unwrap_or_else(PoisonError::into_inner) = Some(code);
    }

    pub fn call(&self, arguments: &[Value]) -> Result<Value, SchemeError> {
        let code = *self.code.read().unwrap_or_else(PoisonError::into_inner);
        let code = code.ok_or_else(|| SchemeError::UndefinedProcedure(self.name.into()))?;
        code(arguments)
    }
}

/// Unpacks the arguments of a compiled procedure with `N` parameters
pub fn parameters<const N: usize>(arguments: &[Value]) -> Result<[Value; N], SchemeError> {
    <&[Value; N]>::try_from(arguments)
        .cloned()
        .map_err(|_| SchemeError::ParameterMismatch {
            expected: N,
            got: arguments.len(),
        })
}

/// The bindings one procedure call makes visible to the procedures it calls.
/// They disappear when the frame is dropped.
#[derive(Debug)]
pub struct Frame {
    depth: usize,
}

impl Frame {
    pub fn enter() -> Self {
        FRAMES.with_borrow_mut(|frames| {
            frames.push(vec![]);
            Self {
                depth: frames.len(),
            }
        })
    }

    /// Binds `name` in this frame, replacing an earlier binding of it
    pub fn bind(&self, name: &'static str, value: Value) {
        FRAMES.with_borrow_mut(|frames| {
            let Some(frame) = frames.get_mut(self.depth - 1) else {
                return;
            };
            match frame.iter_mut().find(|(bound, _)| *bound == name) {
                Some((_, slot)) => *slot = value,
                None => frame.push((name, value)),
            }
        });
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        FRAMES.with_borrow_mut(|frames| frames.truncate(self.depth - 1));
    }
}

/// Reads a variable that callers may bind: the innermost frame binding `name`
/// wins, then `global` if the program defines one
pub fn variable(name: &'static str, global: Option<&Global>) -> Result<Value, SchemeError> {
    let bound = FRAMES.with_borrow(|frames| {
        frames.iter().rev().find_map(|frame| {
            frame
                .iter()
                .find(|(bound, _)| *bound == name)
                .map(|(_, value)| value.clone())
        })
    });
    match (bound, global) {
        (Some(value), _) => Ok(value),
        (None, Some(global)) => global.get(),
        (None, None) => Err(SchemeError::UndefinedVariable(name.into())),
    }
}

/// Runs `f`, collecting what `display` prints on this thread instead of writing it
/// to stdout
pub fn capture<T>(f: impl FnOnce() -> T) -> (T, String) {
    let outer = CAPTURED.replace(Some(String::new()));
    let result = f();
    let captured = CAPTURED.replace(outer).unwrap_or_default();
    (result, captured)
}

pub fn is_true(value: &Value) -> bool {
    value.is_true()
}

fn at_least(arguments: &[Value], expected: usize) -> Result<(), SchemeError> {
    if arguments.len() < expected {
        return Err(SchemeError::MinimalArityMismatch {
            got: arguments.len(),
            expected,
        });
    }
    Ok(())
}

fn exactly<const N: usize>(arguments: &[Value]) -> Result<&[Value; N], SchemeError> {
    arguments
        .try_into()
        .map_err(|_| SchemeError::ArityMismatch {
            got: arguments.len(),
            expected: N,
        })
}

fn integer(value: &Value) -> Result<&BigInt, SchemeError> {
    value
        .as_integer()
        .ok_or(SchemeError::WrongArgumentType("integer"))
}

fn integers(arguments: &[Value]) -> Result<Vec<&BigInt>, SchemeError> {
    arguments.iter().map(integer).collect()
}

fn pair(value: &Value) -> Result<&[Value], SchemeError> {
    match value {
        Value::List(elements) if !elements.is_empty() => Ok(elements),
        _ => Err(SchemeError::WrongArgumentType("pair")),
    }
}

pub fn add(arguments: &[Value]) -> Result<Value, SchemeError> {
    at_least(arguments, 1)?;
    let sum = integers(arguments)?
        .into_iter()
        .fold(BigInt::zero(), |sum, n| sum + n);
    Ok(Value::Integer(sum))
}

pub fn subtract(arguments: &[Value]) -> Result<Value, SchemeError> {
    at_least(arguments, 1)?;
    let integers = integers(arguments)?;
    let difference = match integers.as_slice() {
        [only] => -*only,
        [first, rest @ ..] => rest
            .iter()
            .fold((*first).clone(), |difference, n| difference - *n),
        [] => BigInt::zero(),
    };
    Ok(Value::Integer(difference))
}

pub fn multiply(arguments: &[Value]) -> Result<Value, SchemeError> {
    at_least(arguments, 1)?;
    let product = integers(arguments)?
        .into_iter()
        .fold(BigInt::one(), |product, n| product * n);
    Ok(Value::Integer(product))
}

pub fn quotient(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [dividend, divisor] = exactly::<2>(arguments)?;
    let (dividend, divisor) = (integer(dividend)?, integer(divisor)?);
    if divisor.is_zero() {
        return Err(SchemeError::DivisionByZero);
    }
    Ok(Value::Integer(dividend / divisor))
}

fn compare(
    arguments: &[Value],
    comparison: fn(&BigInt, &BigInt) -> bool,
) -> Result<Value, SchemeError> {
    let [left, right] = exactly::<2>(arguments)?;
    let (left, right) = (integer(left)?, integer(right)?);
    Ok(Value::Boolean(comparison(left, right)))
}

pub fn less(arguments: &[Value]) -> Result<Value, SchemeError> {
    compare(arguments, |l, r| l < r)
}

pub fn less_equal(arguments: &[Value]) -> Result<Value, SchemeError> {
    compare(arguments, |l, r| l <= r)
}

pub fn greater(arguments: &[Value]) -> Result<Value, SchemeError> {
    compare(arguments, |l, r| l > r)
}

pub fn greater_equal(arguments: &[Value]) -> Result<Value, SchemeError> {
    compare(arguments, |l, r| l >= r)
}

pub fn numeric_equal(arguments: &[Value]) -> Result<Value, SchemeError> {
    compare(arguments, |l, r| l == r)
}

pub fn equal(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [left, right] = exactly::<2>(arguments)?;
    Ok(Value::Boolean(left == right))
}

pub fn car(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [list] = exactly::<1>(arguments)?;
    Ok(pair(list)?[0].clone())
}

pub fn cdr(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [list] = exactly::<1>(arguments)?;
    Ok(Value::List(pair(list)?[1..].to_vec()))
}

pub fn list(arguments: &[Value]) -> Result<Value, SchemeError> {
    Ok(Value::List(arguments.to_vec()))
}

pub fn display(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [value] = exactly::<1>(arguments)?;
    let text = output::format(value);
    let captured = CAPTURED.with_borrow_mut(|captured| match captured {
        Some(buffer) => {
            buffer.push_str(&text);
            buffer.push('\n');
            true
        }
        None => false,
    });
    if !captured {
        println!("{text}");
    }
    Ok(Value::Void)
}

#[cfg(test)]
mod tests {
    use super::{Frame, Global, Kind, Procedure, Value};
    use crate::{runtime::SchemeError, world};
    use assert2::{check, let_assert};

    fn ints(values: &[i64]) -> Vec<Value> {
        values
            .iter()
            .map(|n| Value::Integer((*n).into()))
            .collect()
    }

    #[test]
    fn globals_start_undefined() {
        static COUNTER: Global = Global::new("counter", Kind::Computed);
        check!(COUNTER.get() == Err(SchemeError::UndefinedVariable("counter".into())));
        check!(COUNTER.define(Value::Boolean(true)) == Ok(()));
        check!(COUNTER.define(Value::string("redefined")) == Ok(()));
        check!(COUNTER.get() == Ok(Value::string("redefined")));
    }

    #[test]
    fn globals_keep_their_kind() {
        static ANSWER: Global = Global::new("answer", Kind::Integer);
        check!(ANSWER.define(Value::string("42")) == Err(SchemeError::WrongArgumentType("integer")));
        check!(ANSWER.define(Value::Integer(42.into())) == Ok(()));
        check!(ANSWER.get() == Ok(Value::Integer(42.into())));
    }

    fn one(arguments: &[Value]) -> Result<Value, SchemeError> {
        let [] = world::parameters::<0>(arguments)?;
        Ok(Value::Integer(1.into()))
    }

    fn identity(arguments: &[Value]) -> Result<Value, SchemeError> {
        let [x] = world::parameters::<1>(arguments)?;
        Ok(x)
    }

    #[test]
    fn procedures_follow_their_latest_definition() {
        static F: Procedure = Procedure::new("f");
        check!(F.call(&[]) == Err(SchemeError::UndefinedProcedure("f".into())));
        F.define(one);
        check!(F.call(&[]) == Ok(Value::Integer(1.into())));
        F.define(identity);
        check!(F.call(&[Value::Boolean(true)]) == Ok(Value::Boolean(true)));
        check!(F.call(&[]) == Err(SchemeError::ParameterMismatch { expected: 1, got: 0 }));

        static LIST: Procedure = Procedure::predefined("list", world::list);
        check!(LIST.call(&[Value::Void]) == Ok(Value::List(vec![Value::Void])));
    }

    #[test]
    fn frames_bind_dynamically() {
        static Y: Global = Global::new("y", Kind::Computed);
        check!(world::variable("y", None) == Err(SchemeError::UndefinedVariable("y".into())));
        check!(Y.define(Value::Integer(1.into())) == Ok(()));
        check!(world::variable("y", Some(&Y)) == Ok(Value::Integer(1.into())));
        {
            let outer = Frame::enter();
            outer.bind("y", Value::Integer(2.into()));
            {
                let inner = Frame::enter();
                inner.bind("z", Value::Void);
                check!(world::variable("y", Some(&Y)) == Ok(Value::Integer(2.into())));
                inner.bind("y", Value::Integer(3.into()));
                check!(world::variable("y", Some(&Y)) == Ok(Value::Integer(3.into())));
            }
            check!(world::variable("y", Some(&Y)) == Ok(Value::Integer(2.into())));
            check!(world::variable("z", None) == Err(SchemeError::UndefinedVariable("z".into())));
        }
        check!(world::variable("y", Some(&Y)) == Ok(Value::Integer(1.into())));
    }

    #[test]
    fn display_output_can_be_captured() {
        let (result, output) = world::capture(|| {
            world::display(&[Value::List(vec![Value::string("abc"), Value::Boolean(true)])])?;
            world::display(&[Value::Character(' ')])
        });
        check!(result == Ok(Value::Void));
        check!(output == "(abc #t)\n#\\space\n");
    }

    #[test]
    fn agrees_with_the_evaluator() {
        check!(world::add(&ints(&[2, 3, 10, 6])) == Ok(Value::Integer(21.into())));
        check!(world::subtract(&ints(&[20])) == Ok(Value::Integer((-20).into())));
        check!(world::subtract(&ints(&[10, -195, 375, -20])) == Ok(Value::Integer((-150).into())));
        check!(world::multiply(&ints(&[2, 10, 21])) == Ok(Value::Integer(420.into())));
        check!(world::quotient(&ints(&[10, 2])) == Ok(Value::Integer(5.into())));
        check!(world::quotient(&ints(&[10, 0])) == Err(SchemeError::DivisionByZero));
        check!(world::less(&ints(&[1, 2])) == Ok(Value::Boolean(true)));
        check!(world::greater_equal(&ints(&[1, 2])) == Ok(Value::Boolean(false)));
        check!(
            world::add(&[])
                == Err(SchemeError::MinimalArityMismatch {
                    got: 0,
                    expected: 1
                })
        );
    }

    #[test]
    fn list_primitives() {
        let_assert!(Ok(list) = world::list(&[Value::Integer(1.into()), Value::string("abc")]));
        check!(world::car(&[list.clone()]) == Ok(Value::Integer(1.into())));
        check!(world::cdr(&[list.clone()]) == Ok(Value::List(vec![Value::string("abc")])));
        check!(world::car(&[Value::List(vec![])]) == Err(SchemeError::WrongArgumentType("pair")));
        check!(world::equal(&[list.clone(), list.clone()]) == Ok(Value::Boolean(true)));
        check!(
            world::equal(&[list, Value::Vector(vec![Value::Integer(1.into()), Value::string("abc")])])
                == Ok(Value::Boolean(false))
        );
        check!(world::is_true(&Value::Integer(0.into())));
        check!(!world::is_true(&Value::Boolean(false)));
    }
}
