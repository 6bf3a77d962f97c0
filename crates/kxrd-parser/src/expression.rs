//! # Expression Resolver
//!
//! Resolves the right-hand side of a metadata assignment against the
//! literal variables seen earlier in the same file. Supported forms:
//!
//! - a bound variable name: `_group`
//! - a quoted literal: `"example.org"`
//! - a format call: `"{}.{}".format(_sub, "example.org")`
//!
//! Resolution fails closed. Any argument that is not a bound name or a
//! literal (imports, attribute access, nested calls), and any template with
//! more placeholders than arguments, yields `None` rather than a partial
//! string. The resolved value typically feeds a globally unique resource
//! name, so the caller is left to supply an explicit value instead.

use std::collections::HashMap;

use crate::annotation::{split_top_level, unquote};

/// Literal variable bindings collected while scanning a file.
pub type Bindings = HashMap<String, String>;

/// Resolve `expr` against `vars`, or return `None`.
pub fn resolve(expr: &str, vars: &Bindings) -> Option<String> {
    let expr = expr.trim();

    if is_identifier(expr) {
        return vars.get(expr).cloned();
    }

    let (template, rest) = split_leading_literal(expr)?;
    let rest = rest.trim();
    if rest.is_empty() {
        return Some(template);
    }

    let args = rest.strip_prefix(".format(")?.strip_suffix(')')?;
    let values = split_top_level(args)
        .iter()
        .map(|arg| resolve_argument(arg, vars))
        .collect::<Option<Vec<_>>>()?;

    substitute(&template, &values)
}

fn resolve_argument(arg: &str, vars: &Bindings) -> Option<String> {
    if is_identifier(arg) {
        vars.get(arg).cloned()
    } else {
        unquote(arg)
    }
}

/// Replace `{}` placeholders left to right.
///
/// Fails when there are fewer values than placeholders, or when the
/// template uses any other brace form (`{0}`, `{name}`, `{{`).
fn substitute(template: &str, values: &[String]) -> Option<String> {
    let pieces: Vec<&str> = template.split("{}").collect();
    if pieces.iter().any(|p| p.contains('{') || p.contains('}')) {
        return None;
    }
    let placeholders = pieces.len() - 1;
    if values.len() < placeholders {
        return None;
    }

    let mut out = String::from(pieces[0]);
    for (piece, value) in pieces[1..].iter().zip(values) {
        out.push_str(value);
        out.push_str(piece);
    }
    Some(out)
}

/// Split a leading quoted literal from the rest of the expression.
fn split_leading_literal(expr: &str) -> Option<(String, &str)> {
    let quote = expr.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let mut escaped = false;
    for (i, ch) in expr.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            let end = i + ch.len_utf8();
            return Some((unquote(&expr[..end])?, &expr[end..]));
        }
    }
    None
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
