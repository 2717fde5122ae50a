//! Compiled from scoping.scm by bytescheme
#![allow(dead_code, non_snake_case, non_upper_case_globals, unused_mut, unused_variables, unused_imports, clippy::all)]
use bytescheme::{runtime::SchemeError, world::{self, Frame, Global, Kind, Procedure, Value}};

static global_greeting: Global = Global::new("greeting", Kind::String);
static global_y: Global = Global::new("y", Kind::Integer);
static proc_f: Procedure = Procedure::new("f");
static proc_g: Procedure = Procedure::new("g");
static proc_h: Procedure = Procedure::new("h");
static proc_area: Procedure = Procedure::new("area");
static proc_square: Procedure = Procedure::new("square");

fn proc_f_0(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [] = world::parameters::<0>(arguments)?;
    Ok(Value::integer("1")?)
}

fn proc_f_1(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [arg_x] = world::parameters::<1>(arguments)?;
    Ok(world::list(&[arg_x.clone(), global_greeting.get()?])?)
}

fn proc_g_2(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [] = world::parameters::<0>(arguments)?;
    Ok(world::variable("y", Some(&global_y))?)
}

fn proc_h_3(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [arg_y] = world::parameters::<1>(arguments)?;
    let frame = Frame::enter();
    frame.bind("y", arg_y.clone());
    Ok(proc_g.call(&[])?)
}

fn proc_area_4(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [arg_r] = world::parameters::<1>(arguments)?;
    let arg_pi = Value::integer("3")?;
    Ok(world::multiply(&[arg_pi.clone(), proc_square.call(&[arg_r.clone()])?])?)
}

fn proc_square_5(arguments: &[Value]) -> Result<Value, SchemeError> {
    let [arg_x] = world::parameters::<1>(arguments)?;
    Ok(world::multiply(&[arg_x.clone(), arg_x.clone()])?)
}

pub fn run() -> Result<(), SchemeError> {
    global_greeting.define(Value::string("hello"))?;
    proc_f.define(proc_f_0);
    world::display(&[proc_f.call(&[])?])?;
    proc_f.define(proc_f_1);
    world::display(&[proc_f.call(&[Value::integer("2")?])?])?;
    proc_g.define(proc_g_2);
    proc_h.define(proc_h_3);
    global_y.define(Value::integer("0")?)?;
    world::display(&[world::list(&[proc_g.call(&[])?, proc_h.call(&[Value::integer("5")?])?])?])?;
    proc_area.define(proc_area_4);
    proc_square.define(proc_square_5);
    world::display(&[proc_square.call(&[Value::integer("4")?])?])?;
    world::display(&[proc_area.call(&[Value::integer("2")?])?])?;
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
