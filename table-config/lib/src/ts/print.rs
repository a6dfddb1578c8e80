//! Deterministic TypeScript printer.
//!
//! Output conventions: two-space indentation, single-quoted strings, and a
//! trailing comma after every element of a multi-line literal. The printer is
//! a pure function of its input so regenerating the same model always yields
//! byte-identical text.

use super::expr::{Expr, Parameter, TypeNode};

const INDENT: &str = "  ";

/// Renders an expression starting at column zero.
pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, 0);
    out
}

/// Renders a type annotation.
pub fn print_type(node: &TypeNode) -> String {
    let mut out = String::new();
    write_type(&mut out, node);
    out
}

fn write_expr(out: &mut String, expr: &Expr, depth: usize) {
    match expr {
        Expr::Identifier(name) => out.push_str(name),
        Expr::PropertyAccess { object, property } => {
            write_expr(out, object, depth);
            out.push('.');
            out.push_str(property);
        }
        Expr::String(value) => write_string(out, value),
        Expr::Number(value) => out.push_str(value),
        Expr::Boolean(value) => out.push_str(if *value { "true" } else { "false" }),
        Expr::Raw(text) => out.push_str(text),
        Expr::Object {
            properties,
            multiline,
        } => {
            if properties.is_empty() {
                out.push_str("{}");
            } else if *multiline {
                out.push_str("{\n");
                for property in properties {
                    push_indent(out, depth + 1);
                    write_property_name(out, &property.name);
                    out.push_str(": ");
                    write_expr(out, &property.value, depth + 1);
                    out.push_str(",\n");
                }
                push_indent(out, depth);
                out.push('}');
            } else {
                out.push_str("{ ");
                for (index, property) in properties.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    write_property_name(out, &property.name);
                    out.push_str(": ");
                    write_expr(out, &property.value, depth);
                }
                out.push_str(" }");
            }
        }
        Expr::Array {
            elements,
            multiline,
        } => {
            if elements.is_empty() {
                out.push_str("[]");
            } else if *multiline {
                out.push_str("[\n");
                for element in elements {
                    push_indent(out, depth + 1);
                    write_expr(out, element, depth + 1);
                    out.push_str(",\n");
                }
                push_indent(out, depth);
                out.push(']');
            } else {
                out.push('[');
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    write_expr(out, element, depth);
                }
                out.push(']');
            }
        }
        Expr::Arrow { parameters, body } => {
            write_parameters(out, parameters);
            out.push_str(" => ");
            // An object body would otherwise parse as a block.
            if matches!(body.as_ref(), Expr::Object { .. }) {
                out.push('(');
                write_expr(out, body, depth);
                out.push(')');
            } else {
                write_expr(out, body, depth);
            }
        }
    }
}

fn write_type(out: &mut String, node: &TypeNode) {
    match node {
        TypeNode::Reference { name, arguments } => {
            out.push_str(name);
            if !arguments.is_empty() {
                out.push('<');
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    write_type(out, argument);
                }
                out.push('>');
            }
        }
        TypeNode::Keyword(name) => out.push_str(name),
        TypeNode::Array(element) => {
            if matches!(element.as_ref(), TypeNode::Function { .. }) {
                out.push('(');
                write_type(out, element);
                out.push(')');
            } else {
                write_type(out, element);
            }
            out.push_str("[]");
        }
        TypeNode::Function {
            parameters,
            returns,
        } => {
            write_parameters(out, parameters);
            out.push_str(" => ");
            write_type(out, returns);
        }
    }
}

fn write_parameters(out: &mut String, parameters: &[Parameter]) {
    out.push('(');
    for (index, parameter) in parameters.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        out.push_str(&parameter.name);
        out.push_str(": ");
        write_type(out, &parameter.type_node);
    }
    out.push(')');
}

fn write_property_name(out: &mut String, name: &str) {
    if is_identifier(name) {
        out.push_str(name);
    } else {
        write_string(out, name);
    }
}

fn write_string(out: &mut String, value: &str) {
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('\'');
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Whether `name` can be written as a bare property name.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
