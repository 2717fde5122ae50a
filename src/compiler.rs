//! Compile Scheme programs into Rust source
//! that links against [`world`](crate::world).
//!
//! For example:
//!
//! ```text
//! (define (fact n acc) (if (= n 0) acc (fact (- n 1) (* n acc))))
//! (display (fact 5 1))
//! ```
//!
//! compiles to (roughly)
//!
//! ```text
//! static proc_fact: Procedure = Procedure::new("fact");
//!
//! fn proc_fact_0(arguments: &[Value]) -> Result<Value, SchemeError> {
//!     let mut params: [Value; 2] = world::parameters(arguments)?;
//!     while !world::is_true(&world::numeric_equal(&[params[0].clone(), Value::integer("0")?])?) {
//!         params = [world::subtract(..)?, world::multiply(..)?];
//!     }
//!     Ok(params[1].clone())
//! }
//!
//! pub fn run() -> Result<(), SchemeError> {
//!     proc_fact.define(proc_fact_0);
//!     world::display(&[proc_fact.call(&[Value::integer("5")?, Value::integer("1")?])?])?;
//!     Ok(())
//! }
//! ```
//!
//! Every definition of a procedure becomes its own function, bound to the name when
//! the definition runs. Self-recursive procedures of that shape become loops (see
//! [`tail_call`]).

use std::collections::HashSet;

use crate::{
    datum::read_character,
    runtime::{scheme_base, SchemeError},
    syntax::{
        Application, Datum, Definition, Expression, Form, Literal, ProcedureDefinition, Program,
    },
    world::Kind,
};

use environment::{global_name, local_name, procedure_name, Scope};
use generated::{Function, GeneratedCode, ProcedureDeclaration, VariableDefinition};
use tail_call::{detect_tail_pattern, LoopPlan};

pub mod environment;
pub mod generated;
pub mod tail_call;

/// Compiles a whole program
pub fn compile(program: &Program) -> Result<GeneratedCode, SchemeError> {
    let mut generator = CodeGenerator::new(program);
    for form in &program.forms {
        generator.form(form)?;
    }
    Ok(generator.code)
}

fn indent(code: &str) -> String {
    code.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collects the identifiers `expression` reads that are not bound in `scope`
fn free_identifiers(expression: &Expression, scope: &[&str], free: &mut HashSet<Box<str>>) {
    match expression {
        Expression::Identifier(name) if !scope.contains(&&**name) => {
            free.insert(name.clone());
        }
        Expression::Application(application) => {
            for operand in &application.operands {
                free_identifiers(operand, scope, free);
            }
        }
        _ => {}
    }
}

/// State of one compilation run
pub struct CodeGenerator {
    /// Names of every user procedure, internal ones included
    procedures: HashSet<Box<str>>,
    /// Names of every top-level variable
    globals: HashSet<Box<str>>,
    /// Local names some procedure reads from the frame of a caller
    dynamic: HashSet<Box<str>>,
    code: GeneratedCode,
}

impl CodeGenerator {
    /// Procedures and globals may be used before their definition, so they are
    /// all collected up front
    pub fn new(program: &Program) -> Self {
        #[derive(Default)]
        struct Scan {
            procedures: HashSet<Box<str>>,
            globals: HashSet<Box<str>>,
            locals: HashSet<Box<str>>,
            free: HashSet<Box<str>>,
        }

        fn scan_procedure(scan: &mut Scan, procedure: &ProcedureDefinition) {
            scan.procedures.insert(procedure.name.clone());
            scan.locals.extend(procedure.params.iter().cloned());
            let mut scope: Vec<&str> = procedure.params.iter().map(|param| &**param).collect();
            for definition in &procedure.definitions {
                match definition {
                    Definition::Variable(variable) => {
                        free_identifiers(&variable.expression, &scope, &mut scan.free);
                        scope.push(&variable.name);
                        scan.locals.insert(variable.name.clone());
                    }
                    Definition::Procedure(inner) => scan_procedure(scan, inner),
                }
            }
            for expression in procedure.effects.iter().chain([&procedure.body]) {
                free_identifiers(expression, &scope, &mut scan.free);
            }
        }

        fn scan_form(scan: &mut Scan, form: &Form) {
            match form {
                Form::Expression(_) => {}
                Form::Definition(Definition::Variable(variable)) => {
                    scan.globals.insert(variable.name.clone());
                }
                Form::Definition(Definition::Procedure(procedure)) => scan_procedure(scan, procedure),
                Form::Begin(forms) => {
                    for form in forms {
                        scan_form(scan, form);
                    }
                }
            }
        }

        let mut scan = Scan::default();
        for form in &program.forms {
            scan_form(&mut scan, form);
        }
        Self {
            dynamic: scan.free.intersection(&scan.locals).cloned().collect(),
            procedures: scan.procedures,
            globals: scan.globals,
            code: GeneratedCode::default(),
        }
    }

    pub fn form(&mut self, form: &Form) -> Result<(), SchemeError> {
        match form {
            Form::Expression(expression) => {
                let code = self.expression(expression, &Scope::default())?;
                self.code.push_statement(format!("{code};"));
            }
            Form::Definition(Definition::Variable(variable)) => {
                let code = self.expression(&variable.expression, &Scope::default())?;
                let kind = self.variable_type(&variable.expression);
                self.code.declare_variable(VariableDefinition {
                    name: variable.name.clone(),
                    kind,
                });
                self.code
                    .push_statement(format!("{}.define({code})?;", global_name(&variable.name)));
            }
            Form::Definition(Definition::Procedure(procedure)) => self.define_procedure(procedure)?,
            Form::Begin(forms) => {
                for form in forms {
                    self.form(form)?;
                }
            }
        }
        Ok(())
    }

    fn variable_type(&self, expression: &Expression) -> Kind {
        match expression {
            Expression::Constant(Literal::Integer(_)) => Kind::Integer,
            Expression::Constant(Literal::Character(_)) => Kind::Character,
            Expression::Constant(Literal::String(_)) => Kind::String,
            Expression::Constant(Literal::Boolean(_)) => Kind::Boolean,
            Expression::Identifier(name) => self
                .code
                .variable(name)
                .map_or(Kind::Computed, |variable| variable.kind),
            Expression::Application(_) | Expression::Quotation(_) => Kind::Computed,
        }
    }

    /// Binds the procedure, and the procedures defined inside it, to fresh
    /// functions at this point of `run`
    fn define_procedure(&mut self, procedure: &ProcedureDefinition) -> Result<(), SchemeError> {
        let function = self.procedure(procedure)?;
        self.code.push_statement(format!(
            "{}.define({function});",
            procedure_name(&procedure.name)
        ));
        for definition in &procedure.definitions {
            if let Definition::Procedure(inner) = definition {
                self.define_procedure(inner)?;
            }
        }
        Ok(())
    }

    /// Generates one definition of a procedure, returning its function name
    fn procedure(&mut self, procedure: &ProcedureDefinition) -> Result<String, SchemeError> {
        self.code.declare_procedure(ProcedureDeclaration {
            name: procedure.name.clone(),
            predefined: scheme_base::lookup(&procedure.name).map(|builtin| builtin.host),
        });
        let name = self.code.fresh_name(&procedure_name(&procedure.name));

        let body = match detect_tail_pattern(procedure) {
            Some(plan) if !self.publishes(procedure) => self.loop_body(procedure, plan)?,
            _ => self.plain_body(procedure)?,
        };
        self.code.declare_function(Function {
            name: name.clone(),
            params: vec![String::from("arguments: &[Value]")],
            body,
        });
        Ok(name)
    }

    /// Whether a call of `procedure` binds names its callees may read
    fn publishes(&self, procedure: &ProcedureDefinition) -> bool {
        let internal = procedure.definitions.iter().filter_map(|definition| match definition {
            Definition::Variable(variable) => Some(&variable.name),
            Definition::Procedure(_) => None,
        });
        procedure
            .params
            .iter()
            .chain(internal)
            .any(|name| self.dynamic.contains(name))
    }

    fn loop_body(
        &mut self,
        procedure: &ProcedureDefinition,
        plan: LoopPlan,
    ) -> Result<Vec<String>, SchemeError> {
        let scope = Scope::slots(&procedure.params);
        let condition = self.expression(plan.condition, &scope)?;
        let updates = plan
            .updates
            .iter()
            .map(|update| self.expression(update, &scope))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(vec![
            format!(
                "let mut params: [Value; {}] = world::parameters(arguments)?;",
                procedure.params.len()
            ),
            format!(
                "while {}world::is_true(&{condition}) {{",
                if plan.negated { "!" } else { "" }
            ),
            format!("    params = [{}];", updates.join(", ")),
            String::from("}"),
            self.tail(plan.exit, &scope)?,
        ])
    }

    fn plain_body(&mut self, procedure: &ProcedureDefinition) -> Result<Vec<String>, SchemeError> {
        let params = &procedure.params;
        // a repeated parameter is bound to its last argument
        let pattern = params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                if params[i + 1..].contains(param) {
                    String::from("_")
                } else {
                    local_name(param)
                }
            })
            .collect::<Vec<_>>();
        let mut body = vec![format!(
            "let [{}] = world::parameters::<{}>(arguments)?;",
            pattern.join(", "),
            params.len()
        )];

        let mut published = HashSet::new();
        if self.publishes(procedure) {
            body.push(String::from("let frame = Frame::enter();"));
            for param in params {
                if self.dynamic.contains(param) && published.insert(param) {
                    body.push(format!("frame.bind({:?}, {}.clone());", &**param, local_name(param)));
                }
            }
        }

        let mut scope = Scope::parameters(params);
        for definition in &procedure.definitions {
            // internal procedures are bound along with the enclosing one
            let Definition::Variable(variable) = definition else {
                continue;
            };
            let code = self.expression(&variable.expression, &scope)?;
            let local = local_name(&variable.name);
            body.push(format!("let {local} = {code};"));
            if self.dynamic.contains(&variable.name) {
                body.push(format!("frame.bind({:?}, {local}.clone());", &*variable.name));
            }
            scope.bind(&variable.name);
        }
        for effect in &procedure.effects {
            let code = self.expression(effect, &scope)?;
            body.push(format!("{code};"));
        }
        body.push(self.tail(&procedure.body, &scope)?);
        Ok(body)
    }

    /// Code that returns the value of `expression` from the enclosing function
    fn tail(&mut self, expression: &Expression, scope: &Scope) -> Result<String, SchemeError> {
        match expression {
            Expression::Application(Application {
                procedure,
                operands,
            }) if &**procedure == "if" => {
                let [condition, consequent, alternative] = conditional(operands)?;
                let condition = self.expression(condition, scope)?;
                let consequent = self.tail(consequent, scope)?;
                let alternative = self.tail(alternative, scope)?;
                Ok(format!(
                    "if world::is_true(&{condition}) {{\n{}\n}} else {{\n{}\n}}",
                    indent(&consequent),
                    indent(&alternative)
                ))
            }
            _ => Ok(format!("Ok({})", self.expression(expression, scope)?)),
        }
    }

    /// Code that evaluates to the `Value` of `expression`
    fn expression(&mut self, expression: &Expression, scope: &Scope) -> Result<String, SchemeError> {
        match expression {
            Expression::Constant(literal) => constant(literal),
            Expression::Quotation(datum) => quoted(datum),
            Expression::Identifier(name) => {
                if let Some(read) = scope.lookup(name) {
                    Ok(read.to_string())
                } else if self.dynamic.contains(name) {
                    let global = if self.globals.contains(name) {
                        format!("Some(&{})", global_name(name))
                    } else {
                        String::from("None")
                    };
                    Ok(format!("world::variable({:?}, {global})?", &**name))
                } else if self.globals.contains(name) {
                    Ok(format!("{}.get()?", global_name(name)))
                } else {
                    Err(SchemeError::UndefinedVariable(name.clone()))
                }
            }
            Expression::Application(application) => self.application(application, scope),
        }
    }

    fn application(
        &mut self,
        application: &Application,
        scope: &Scope,
    ) -> Result<String, SchemeError> {
        let Application {
            procedure,
            operands,
        } = application;

        if &**procedure == "if" {
            return self.if_helper(operands, scope);
        }

        let arguments = |generator: &mut Self| {
            operands
                .iter()
                .map(|operand| generator.expression(operand, scope))
                .collect::<Result<Vec<_>, _>>()
                .map(|arguments| arguments.join(", "))
        };

        // the arity of a user procedure depends on the definition in effect
        if self.procedures.contains(procedure) {
            let arguments = arguments(self)?;
            return Ok(format!("{}.call(&[{arguments}])?", procedure_name(procedure)));
        }

        match scheme_base::lookup(procedure) {
            Some(builtin) => {
                builtin.arity.check(operands.len())?;
                let arguments = arguments(self)?;
                Ok(format!("world::{}(&[{arguments}])?", builtin.host))
            }
            None => Err(SchemeError::UndefinedProcedure(procedure.clone())),
        }
    }

    /// An `if` whose value is used by an enclosing expression becomes a helper
    /// function, called with every local in scope
    fn if_helper(&mut self, operands: &[Expression], scope: &Scope) -> Result<String, SchemeError> {
        conditional(operands)?;
        let name = self.code.fresh_name("if");
        let visible = scope.visible();
        let arguments = visible
            .iter()
            .filter_map(|local| scope.lookup(local))
            .collect::<Vec<_>>()
            .join(", ");
        let params = visible
            .iter()
            .map(|&local| Box::from(local))
            .collect::<Vec<Box<str>>>();

        let inner = Scope::parameters(&params);
        let body = self.tail(
            &Expression::Application(Application {
                procedure: "if".into(),
                operands: operands.to_vec(),
            }),
            &inner,
        )?;
        self.code.declare_function(Function {
            name: name.clone(),
            params: params
                .iter()
                .map(|param| format!("{}: Value", local_name(param)))
                .collect(),
            body: vec![body],
        });
        Ok(format!("{name}({arguments})?"))
    }
}

fn conditional(operands: &[Expression]) -> Result<&[Expression; 3], SchemeError> {
    operands.try_into().map_err(|_| SchemeError::ArityMismatch {
        got: operands.len(),
        expected: 3,
    })
}

fn constant(literal: &Literal) -> Result<String, SchemeError> {
    Ok(match literal {
        Literal::Integer(int) => format!("Value::integer(\"{int}\")?"),
        Literal::Character(name) => format!("Value::Character({:?})", read_character(name)?),
        Literal::String(string) => format!("Value::string({:?})", &**string),
        Literal::Boolean(b) => format!("Value::Boolean({b})"),
    })
}

fn quoted(datum: &Datum) -> Result<String, SchemeError> {
    let elements = |elements: &[Datum]| {
        elements
            .iter()
            .map(quoted)
            .collect::<Result<Vec<_>, _>>()
            .map(|elements| elements.join(", "))
    };
    match datum {
        Datum::Constant(literal) => constant(literal),
        Datum::Identifier(name) => Ok(format!("Value::string({:?})", &**name)),
        Datum::List(list) => Ok(format!("Value::List(vec![{}])", elements(list)?)),
        Datum::Vector(vector) => Ok(format!("Value::Vector(vec![{}])", elements(vector)?)),
        Datum::Quotation(inner) => Ok(format!("Value::quotation({})", quoted(inner)?)),
    }
}
