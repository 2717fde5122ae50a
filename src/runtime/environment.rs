use std::collections::HashMap;

use crate::datum::Datum;

use super::{scheme_base, Procedure, SchemeError};

/// The bindings of one evaluation session.
///
/// Variables and procedures live in separate global tables. Each procedure call
/// pushes a frame holding its parameters (and internal variable definitions).
/// Scoping is dynamic: a name is looked up from the innermost frame outwards, so a
/// callee sees the parameters of its callers, and the globals come last.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    variables: HashMap<Box<str>, Datum>,
    procedures: HashMap<Box<str>, Procedure>,
    frames: Vec<HashMap<Box<str>, Datum>>,
}

impl Environment {
    /// An environment holding only the predefined procedures
    pub fn with_predefined() -> Self {
        let mut environment = Self::default();
        for builtin in scheme_base::PREDEFINED {
            environment.define_procedure(builtin.name, Procedure::Native((*builtin).into()));
        }
        environment
    }

    /// Binds in the current call frame, or globally outside of any call.
    /// A previous binding of the same name is replaced.
    pub fn define_variable(&mut self, name: &str, value: Datum) {
        let table = match self.frames.last_mut() {
            Some(frame) => frame,
            None => &mut self.variables,
        };
        table.insert(Box::from(name), value);
    }

    pub fn define_procedure(&mut self, name: &str, procedure: Procedure) {
        self.procedures.insert(Box::from(name), procedure);
    }

    pub fn variable(&self, name: &str) -> Result<&Datum, SchemeError> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.variables.get(name))
            .ok_or_else(|| SchemeError::UndefinedVariable(Box::from(name)))
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(name)
    }

    pub fn push_frame(&mut self, frame: HashMap<Box<str>, Datum>) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) {
        _ = self.frames.pop();
    }

    /// How many calls are currently active
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
