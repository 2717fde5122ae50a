//! The tree-walking evaluator.
//!
//! A [`Treewalk`] is one evaluation session: it owns the [`Environment`] (so
//! definitions persist from one [`Treewalk::run`] to the next) and the sink that
//! `display` writes to.
use std::{collections::HashMap, io, rc::Rc};

use crate::{
    datum::{Constant, Datum},
    syntax::{Application, Definition, Expression, Form, ProcedureDefinition, Program},
};

use super::{environment::Environment, Procedure, SchemeError};

pub struct Treewalk<W = io::Stdout> {
    environment: Environment,
    output: W,
}

impl Treewalk {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Treewalk {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: io::Write> Treewalk<W> {
    /// A fresh session whose `display` output goes to `output`
    pub fn with_output(output: W) -> Self {
        Self {
            environment: Environment::with_predefined(),
            output,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Parses and runs `source`, returning the values of its top-level expressions
    pub fn eval_source(&mut self, source: &str) -> Result<Vec<Datum>, crate::Error> {
        let program = Program::parse(source)?;
        Ok(self.run(&program)?)
    }

    /// Runs every form of `program` in order.
    ///
    /// The first error cancels the rest of the program, but definitions made
    /// (and output written) before it stay in effect.
    pub fn run(&mut self, program: &Program) -> Result<Vec<Datum>, SchemeError> {
        let mut values = vec![];
        for form in &program.forms {
            self.execute(form, &mut values)?;
        }
        Ok(values)
    }

    /// Runs a single top-level form, pushing the value of each expression it holds
    pub fn execute(&mut self, form: &Form, values: &mut Vec<Datum>) -> Result<(), SchemeError> {
        match form {
            Form::Expression(expression) => values.push(self.evaluate(expression)?),
            Form::Definition(definition) => self.define(definition)?,
            Form::Begin(forms) => {
                for form in forms {
                    self.execute(form, values)?;
                }
            }
        }
        Ok(())
    }

    fn define(&mut self, definition: &Definition) -> Result<(), SchemeError> {
        match definition {
            Definition::Variable(variable) => {
                let value = self.evaluate(&variable.expression)?;
                self.environment.define_variable(&variable.name, value);
            }
            Definition::Procedure(procedure) => self.define_procedure(procedure),
        }
        Ok(())
    }

    /// Registers `procedure` along with the procedures defined inside it. Internal
    /// variables are only bound when the procedure is called.
    fn define_procedure(&mut self, procedure: &Rc<ProcedureDefinition>) {
        self.environment
            .define_procedure(&procedure.name, Procedure::Code(Rc::clone(procedure)));
        for definition in &procedure.definitions {
            if let Definition::Procedure(inner) = definition {
                self.define_procedure(inner);
            }
        }
    }

    pub fn evaluate(&mut self, expression: &Expression) -> Result<Datum, SchemeError> {
        match expression {
            Expression::Constant(literal) => Constant::from_literal(literal).map(Datum::Constant),
            Expression::Quotation(datum) => Datum::from_quoted(datum),
            Expression::Identifier(name) => self.environment.variable(name).cloned(),
            Expression::Application(application) => self.apply(application),
        }
    }

    fn apply(&mut self, application: &Application) -> Result<Datum, SchemeError> {
        let Application {
            procedure,
            operands,
        } = application;

        if &**procedure == "if" {
            return self.conditional(operands);
        }

        let procedure = self
            .environment
            .procedure(procedure)
            .cloned()
            .ok_or_else(|| SchemeError::UndefinedProcedure(procedure.clone()))?;
        let arguments = operands
            .iter()
            .map(|operand| self.evaluate(operand))
            .collect::<Result<Vec<_>, _>>()?;

        match procedure {
            Procedure::Native(native) => native.apply(&mut self.output, &arguments),
            Procedure::Code(code) => self.call(&code, arguments),
        }
    }

    fn conditional(&mut self, operands: &[Expression]) -> Result<Datum, SchemeError> {
        let [condition, consequent, alternative] = operands else {
            return Err(SchemeError::ArityMismatch {
                got: operands.len(),
                expected: 3,
            });
        };
        if self.evaluate(condition)?.is_true() {
            self.evaluate(consequent)
        } else {
            self.evaluate(alternative)
        }
    }

    fn call(
        &mut self,
        procedure: &ProcedureDefinition,
        arguments: Vec<Datum>,
    ) -> Result<Datum, SchemeError> {
        if procedure.params.len() != arguments.len() {
            return Err(SchemeError::ParameterMismatch {
                expected: procedure.params.len(),
                got: arguments.len(),
            });
        }

        let frame: HashMap<_, _> = procedure.params.iter().cloned().zip(arguments).collect();
        self.environment.push_frame(frame);
        let result = self.call_body(procedure);
        self.environment.pop_frame();
        result
    }

    fn call_body(&mut self, procedure: &ProcedureDefinition) -> Result<Datum, SchemeError> {
        for definition in &procedure.definitions {
            if let Definition::Variable(variable) = definition {
                let value = self.evaluate(&variable.expression)?;
                self.environment.define_variable(&variable.name, value);
            }
        }
        for effect in &procedure.effects {
            self.evaluate(effect)?;
        }
        self.evaluate(&procedure.body)
    }
}
