//! Names and scopes of generated code.
//!
//! Scheme identifiers allow characters Rust identifiers do not, so every name is
//! mangled: ASCII alphanumerics are kept and anything else (including `_`) becomes
//! `_<hex code point>_`. The result is then prefixed per namespace, which keeps
//! procedures, globals, locals and helpers from ever colliding.
use std::fmt::Write;

pub fn mangle(name: &str) -> String {
    let mut mangled = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            mangled.push(c);
        } else {
            _ = write!(mangled, "_{:x}_", u32::from(c));
        }
    }
    mangled
}

pub fn procedure_name(name: &str) -> String {
    format!("proc_{}", mangle(name))
}

pub fn global_name(name: &str) -> String {
    format!("global_{}", mangle(name))
}

pub fn local_name(name: &str) -> String {
    format!("arg_{}", mangle(name))
}

/// The local bindings visible while generating the body of one function.
///
/// Each binding maps a Scheme name to the Rust expression that reads it.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: Vec<(Box<str>, String)>,
}

impl Scope {
    /// Parameters bound to function arguments
    pub fn parameters(params: &[Box<str>]) -> Self {
        Self {
            bindings: params
                .iter()
                .map(|param| (param.clone(), format!("{}.clone()", local_name(param))))
                .collect(),
        }
    }

    /// Parameters bound to the slots of the working array of a loop
    pub fn slots(params: &[Box<str>]) -> Self {
        Self {
            bindings: params
                .iter()
                .enumerate()
                .map(|(slot, param)| (param.clone(), format!("params[{slot}].clone()")))
                .collect(),
        }
    }

    /// Binds `name` to a local of the same (mangled) name
    pub fn bind(&mut self, name: &str) {
        self.bindings
            .push((name.into(), format!("{}.clone()", local_name(name))));
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| &**bound == name)
            .map(|(_, read)| read.as_str())
    }

    /// Every visible name once, in binding order
    pub fn visible(&self) -> Vec<&str> {
        let mut names: Vec<&str> = vec![];
        for (name, _) in &self.bindings {
            if !names.contains(&&**name) {
                names.push(name);
            }
        }
        names
    }
}
