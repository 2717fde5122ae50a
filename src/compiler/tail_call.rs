//! Recognizes the one shape of self recursion that compiles into a loop:
//!
//! ```scheme
//! (define (name params ...)
//!   (if condition
//!       (name updates ...)
//!       exit))
//! ```
//!
//! with the self call in either branch.
use crate::syntax::{Application, Expression, ProcedureDefinition};

/// How a self-recursive procedure runs as a loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopPlan<'a> {
    pub condition: &'a Expression,
    /// The loop runs while the condition is false (the self call is the else branch)
    pub negated: bool,
    /// The arguments of the self call, one per parameter
    pub updates: &'a [Expression],
    /// The branch whose value is returned once the loop stops
    pub exit: &'a Expression,
}

fn self_call<'a>(
    procedure: &ProcedureDefinition,
    expression: &'a Expression,
) -> Option<&'a [Expression]> {
    match expression {
        Expression::Application(Application {
            procedure: name,
            operands,
        }) if *name == procedure.name && operands.len() == procedure.params.len() => {
            Some(operands.as_slice())
        }
        _ => None,
    }
}

pub fn detect_tail_pattern(procedure: &ProcedureDefinition) -> Option<LoopPlan<'_>> {
    // anything run before the body would have to be repeated on every iteration
    if !procedure.definitions.is_empty() || !procedure.effects.is_empty() {
        return None;
    }

    let Expression::Application(Application {
        procedure: head,
        operands,
    }) = &procedure.body
    else {
        return None;
    };
    let [condition, consequent, alternative] = operands.as_slice() else {
        return None;
    };
    if &**head != "if" {
        return None;
    }

    match (self_call(procedure, consequent), self_call(procedure, alternative)) {
        (Some(updates), None) => Some(LoopPlan {
            condition,
            negated: false,
            updates,
            exit: alternative,
        }),
        (None, Some(updates)) => Some(LoopPlan {
            condition,
            negated: true,
            updates,
            exit: consequent,
        }),
        // both branches recurse (the loop would never exit) or neither does
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::detect_tail_pattern;
    use crate::syntax::{Definition, Expression, Form, Program};
    use assert2::{check, let_assert};

    fn plan_of(source: &str) -> Option<(String, bool, usize, String)> {
        let_assert!(Ok(program) = Program::parse(source));
        let_assert!([Form::Definition(Definition::Procedure(procedure))] = program.forms.as_slice());
        detect_tail_pattern(procedure).map(|plan| {
            let exit = match plan.exit {
                Expression::Identifier(name) => name.to_string(),
                other => format!("{other:?}"),
            };
            let condition = match plan.condition {
                Expression::Application(application) => application.procedure.to_string(),
                other => format!("{other:?}"),
            };
            (condition, plan.negated, plan.updates.len(), exit)
        })
    }

    #[test]
    fn tail_call_in_either_branch() {
        check!(
            plan_of("(define (loop n acc) (if (> n 0) (loop (- n 1) (* n acc)) acc))")
                == Some((">".into(), false, 2, "acc".into()))
        );
        check!(
            plan_of("(define (loop n acc) (if (= n 0) acc (loop (- n 1) (* n acc))))")
                == Some(("=".into(), true, 2, "acc".into()))
        );
    }

    #[test]
    fn other_shapes_are_left_alone() {
        // the recursion is not in tail position
        check!(plan_of("(define (fib n) (if (< n 3) 1 (+ (fib (- n 1)) (fib (- n 2)))))") == None);
        // wrong argument count
        check!(plan_of("(define (f n) (if (= n 0) 0 (f n n)))") == None);
        // both branches recurse
        check!(plan_of("(define (f n) (if (= n 0) (f n) (f n)))") == None);
        // a body with side effects
        check!(plan_of("(define (f n) (display n) (if (= n 0) 0 (f (- n 1))))") == None);
        check!(plan_of("(define (f n) n)") == None);
    }
}
