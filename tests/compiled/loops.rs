//! Compiled from loops.scm by bytescheme
#![allow(dead_code, non_snake_case, non_upper_case_globals, unused_mut, unused_variables, unused_imports, clippy::all)]
use bytescheme::{runtime::SchemeError, world::{self, Frame, Global, Kind, Procedure, Value}};

static proc_fact: Procedure = Procedure::new("fact");
static proc_fib: Procedure = Procedure::new("fib");
static proc_sign: Procedure = Procedure::new("sign");

fn proc_fact_0(arguments: &[Value]) -> Result<Value, SchemeError> {
    let mut params: [Value; 2] = world::parameters(arguments)?;
    while !world::is_true(&world::numeric_equal(&[params[0].clone(), Value::integer("0")?])?) {
        params = [world::subtract(&[params[0].clone(), Value::integer("1")?])?, world::multiply(&[params[0].clone(), params[1].clone()])?];
    }
    Ok(params[1].clone())
}

fn proc_fib_1(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [arg_n] = world::parameters::<1>(arguments)?;
    if world::is_true(&world::less(&[arg_n.clone(), Value::integer("3")?])?) {
        Ok(Value::integer("1")?)
    } else {
        Ok(world::add(&[proc_fib.call(&[world::subtract(&[arg_n.clone(), Value::integer("1")?])?])?, proc_fib.call(&[world::subtract(&[arg_n.clone(), Value::integer("2")?])?])?])?)
    }
}

fn if_3(arg_n: Value) -> Result<Value, SchemeError> {
    if world::is_true(&world::less(&[arg_n.clone(), Value::integer("0")?])?) {
        Ok(Value::string("negative"))
    } else {
        Ok(Value::string("positive"))
    }
}

fn proc_sign_2(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [arg_n] = world::parameters::<1>(arguments)?;
    Ok(world::list(&[arg_n.clone(), if_3(arg_n.clone())?])?)
}

pub fn run() -> Result<(), SchemeError> {
    proc_fact.define(proc_fact_0);
    proc_fib.define(proc_fib_1);
    proc_sign.define(proc_sign_2);
    world::display(&[proc_fact.call(&[Value::integer("20")?, Value::integer("1")?])?])?;
    world::display(&[proc_fib.call(&[Value::integer("15")?])?])?;
    world::display(&[proc_sign.call(&[world::subtract(&[Value::integer("4")?])?])?])?;
    world::display(&[Value::List(vec![Value::integer("1")?, Value::Vector(vec![Value::integer("2")?, Value::string("three")]), Value::Character('a')])])?;
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
