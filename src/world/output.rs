//! Renders values the way `display` shows them.
use crate::datum::character_text;

use super::Value;

fn join(values: &[Value]) -> String {
    values.iter().map(format).collect::<Vec<_>>().join(" ")
}

/// Print syntax of `value`, with strings written without their quotes
pub fn format(value: &Value) -> String {
    match value {
        Value::Integer(int) => int.to_string(),
        Value::Character(chr) => character_text(*chr),
        Value::String(string) => string.to_string(),
        Value::Boolean(true) => String::from("#t"),
        Value::Boolean(false) => String::from("#f"),
        Value::List(elements) => format!("({})", join(elements)),
        Value::Vector(elements) => format!("#({})", join(elements)),
        Value::Quotation(quoted) => format!("'{}", format(quoted)),
        Value::Void => String::new(),
    }
}
