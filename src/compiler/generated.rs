//! The pieces of a generated program and how they are stitched into one file.
use std::fmt::Write;

use crate::world::Kind;

use super::environment::{global_name, procedure_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDefinition {
    /// The Scheme name
    pub name: Box<str>,
    pub kind: Kind,
}

/// A procedure name, declared as a slot that each definition of it rebinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureDeclaration {
    pub name: Box<str>,
    /// The `world` function of a predefined procedure of the same name
    pub predefined: Option<&'static str>,
}

/// A generated Rust function, either one definition of a procedure or a helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    /// Parameter declarations, as written in the signature
    pub params: Vec<String>,
    /// Statements, the last of which produces the result
    pub body: Vec<String>,
}

impl Function {
    fn render(&self, out: &mut String) -> std::fmt::Result {
        writeln!(
            out,
            "fn {}({}) -> Result<Value, SchemeError> {{",
            self.name,
            self.params.join(", ")
        )?;
        for line in self.body.iter().flat_map(|statement| statement.lines()) {
            writeln!(out, "    {line}")?;
        }
        writeln!(out, "}}")
    }
}

/// Everything a compilation run produced so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedCode {
    variables: Vec<VariableDefinition>,
    procedures: Vec<ProcedureDeclaration>,
    functions: Vec<Function>,
    main: Vec<String>,
    helper_count: usize,
}

impl GeneratedCode {
    /// Declares a global. A global defined with values of different kinds is
    /// declared `Computed`.
    pub fn declare_variable(&mut self, variable: VariableDefinition) {
        match self.variables.iter_mut().find(|v| v.name == variable.name) {
            Some(existing) if existing.kind != variable.kind => existing.kind = Kind::Computed,
            Some(_) => {}
            None => self.variables.push(variable),
        }
    }

    /// Declares the slot of a procedure name once
    pub fn declare_procedure(&mut self, procedure: ProcedureDeclaration) {
        if !self.procedures.iter().any(|p| p.name == procedure.name) {
            self.procedures.push(procedure);
        }
    }

    pub fn declare_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn push_statement(&mut self, statement: String) {
        self.main.push(statement);
    }

    /// A name no other call during this compilation returns
    pub fn fresh_name(&mut self, prefix: &str) -> String {
        let name = format!("{prefix}_{}", self.helper_count);
        self.helper_count += 1;
        name
    }

    pub fn variables(&self) -> &[VariableDefinition] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| &*v.name == name)
    }

    pub fn procedures(&self) -> &[ProcedureDeclaration] {
        &self.procedures
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn main(&self) -> &[String] {
        &self.main
    }

    /// Assembles a complete `main.rs` that links against this crate
    pub fn render(&self, source_name: &str) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        _ = self.render_into(&mut out, source_name);
        out
    }

    fn render_into(&self, out: &mut String, source_name: &str) -> std::fmt::Result {
        writeln!(out, "//! Compiled from {source_name} by bytescheme")?;
        writeln!(
            out,
            "#![allow(dead_code, non_snake_case, non_upper_case_globals, unused_mut, unused_variables, unused_imports, clippy::all)]"
        )?;
        writeln!(
            out,
            "use bytescheme::{{runtime::SchemeError, world::{{self, Frame, Global, Kind, Procedure, Value}}}};"
        )?;

        if !self.variables.is_empty() || !self.procedures.is_empty() {
            writeln!(out)?;
        }
        for variable in &self.variables {
            writeln!(
                out,
                "static {}: Global = Global::new({:?}, Kind::{:?});",
                global_name(&variable.name),
                &*variable.name,
                variable.kind
            )?;
        }
        for procedure in &self.procedures {
            let slot = procedure_name(&procedure.name);
            match procedure.predefined {
                Some(host) => writeln!(
                    out,
                    "static {slot}: Procedure = Procedure::predefined({:?}, world::{host});",
                    &*procedure.name
                )?,
                None => writeln!(
                    out,
                    "static {slot}: Procedure = Procedure::new({:?});",
                    &*procedure.name
                )?,
            }
        }

        for function in &self.functions {
            writeln!(out)?;
            function.render(out)?;
        }

        writeln!(out)?;
        writeln!(out, "pub fn run() -> Result<(), SchemeError> {{")?;
        for line in self.main.iter().flat_map(|statement| statement.lines()) {
            writeln!(out, "    {line}")?;
        }
        writeln!(out, "    Ok(())")?;
        writeln!(out, "}}")?;

        writeln!(out)?;
        writeln!(out, "fn main() {{")?;
        writeln!(out, "    if let Err(error) = run() {{")?;
        writeln!(out, "        eprintln!(\"{{error}}\");")?;
        writeln!(out, "        std::process::exit(1);")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::{Function, GeneratedCode, ProcedureDeclaration, VariableDefinition};
    use crate::world::Kind;
    use assert2::check;

    #[test]
    fn fresh_names_are_unique() {
        let mut code = GeneratedCode::default();
        let names = [code.fresh_name("if"), code.fresh_name("if"), code.fresh_name("loop")];
        check!(names == ["if_0", "if_1", "loop_2"]);
    }

    #[test]
    fn redeclarations_widen_the_kind() {
        let mut code = GeneratedCode::default();
        let variable = |kind| VariableDefinition {
            name: "x".into(),
            kind,
        };
        code.declare_variable(variable(Kind::Integer));
        code.declare_variable(variable(Kind::Integer));
        check!(code.variable("x").map(|v| v.kind) == Some(Kind::Integer));
        code.declare_variable(variable(Kind::String));
        code.declare_variable(variable(Kind::Integer));
        check!(code.variables() == [variable(Kind::Computed)]);

        let procedure = || ProcedureDeclaration {
            name: "f".into(),
            predefined: None,
        };
        code.declare_procedure(procedure());
        code.declare_procedure(procedure());
        check!(code.procedures() == [procedure()]);
    }

    #[test]
    fn renders_a_whole_program() {
        let mut code = GeneratedCode::default();
        code.declare_variable(VariableDefinition {
            name: "answer".into(),
            kind: Kind::Integer,
        });
        code.declare_procedure(ProcedureDeclaration {
            name: "id".into(),
            predefined: None,
        });
        code.declare_procedure(ProcedureDeclaration {
            name: "list".into(),
            predefined: Some("list"),
        });
        code.declare_function(Function {
            name: "proc_id_0".into(),
            params: vec!["arguments: &[Value]".into()],
            body: vec![
                "let [arg_x] = world::parameters::<1>(arguments)?;".into(),
                "Ok(arg_x.clone())".into(),
            ],
        });
        code.push_statement("global_answer.define(Value::integer(\"42\")?)?;".into());

        let rendered = code.render("answer.scm");
        check!(rendered.starts_with("//! Compiled from answer.scm by bytescheme\n"));
        check!(rendered.contains("static global_answer: Global = Global::new(\"answer\", Kind::Integer);\n"));
        check!(rendered.contains("static proc_id: Procedure = Procedure::new(\"id\");\n"));
        check!(rendered.contains("static proc_list: Procedure = Procedure::predefined(\"list\", world::list);\n"));
        check!(rendered.contains(
            "fn proc_id_0(arguments: &[Value]) -> Result<Value, SchemeError> {\n    let [arg_x] = world::parameters::<1>(arguments)?;\n    Ok(arg_x.clone())\n}\n"
        ));
        check!(rendered.contains(
            "pub fn run() -> Result<(), SchemeError> {\n    global_answer.define(Value::integer(\"42\")?)?;\n    Ok(())\n}\n"
        ));
        check!(rendered.ends_with("std::process::exit(1);\n    }\n}\n"));
    }
}
