//! # Annotation Matcher
//!
//! Recognizes `@directive(args)` annotation comments and extracts typed
//! arguments. Supported argument shapes:
//!
//! | Shape                     | Accessor                       |
//! |---------------------------|--------------------------------|
//! | `@name`                   | [`Annotation::flag`]           |
//! | `@name(true)`             | [`Annotation::flag`]           |
//! | `@name("s")`              | [`Annotation::string_arg`]     |
//! | `@name(42)`               | [`Annotation::int_arg`]        |
//! | `@name(["a", "b"])`       | [`Annotation::list_arg`]       |
//! | `@name([["a"], ["b"]])`   | [`Annotation::groups_arg`]     |
//! | `@name("a", "b")`         | [`Annotation::string_args`]    |
//!
//! Every accessor returns `None` when the arguments do not have the
//! requested shape. A mismatch is never an error: the scanner leaves the
//! corresponding attribute unset and moves on.

use std::sync::LazyLock;

use regex::Regex;

/// `@name` optionally followed by a parenthesized argument list.
/// Groups: 1=name, 2=raw arguments.
static DIRECTIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@(\w+)\s*(?:\((.*)\))?\s*$").expect("directive pattern is valid")
});

/// A parsed annotation comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Directive name without the `@`.
    pub name: String,
    /// Raw text between the outer parentheses, trimmed.
    pub args: Option<String>,
}

impl Annotation {
    /// Parse annotation text.
    ///
    /// Accepts either the bare directive (`@minLength(3)`) or a full comment
    /// line (`  # @minLength(3)`). Returns `None` when the text is not an
    /// annotation.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_prefix('#').map(str::trim).unwrap_or(text);
        let caps = DIRECTIVE_PATTERN.captures(text)?;
        Some(Self {
            name: caps[1].to_string(),
            args: caps.get(2).map(|m| m.as_str().trim().to_string()),
        })
    }

    /// Boolean marker: bare `@name` is `true`; `@name(true|false)` is parsed
    /// case-insensitively.
    pub fn flag(&self) -> Option<bool> {
        match self.args.as_deref() {
            None | Some("") => Some(true),
            Some(raw) => parse_bool(raw),
        }
    }

    /// A single quoted string argument, unescaped.
    pub fn string_arg(&self) -> Option<String> {
        unquote(self.args.as_deref()?)
    }

    /// A single integer argument.
    pub fn int_arg(&self) -> Option<i64> {
        self.args.as_deref()?.parse().ok()
    }

    /// A bracketed list of strings.
    pub fn list_arg(&self) -> Option<Vec<String>> {
        parse_string_list(self.args.as_deref()?)
    }

    /// A bracketed list of bracketed string lists.
    pub fn groups_arg(&self) -> Option<Vec<Vec<String>>> {
        let inner = strip_brackets(self.args.as_deref()?)?;
        split_top_level(inner)
            .iter()
            .map(|group| parse_string_list(group))
            .collect()
    }

    /// Comma-separated quoted strings, e.g. `("rule", "message")`.
    ///
    /// Fails when any element is not a quoted string.
    pub fn string_args(&self) -> Option<Vec<String>> {
        split_top_level(self.args.as_deref()?)
            .iter()
            .map(|item| unquote(item))
            .collect()
    }
}

/// Parse `True`/`False` in any letter case.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse `["a", 'b', c]` into its unquoted elements.
///
/// Bare (unquoted) elements are kept verbatim. Empty elements are dropped.
pub fn parse_string_list(raw: &str) -> Option<Vec<String>> {
    let inner = strip_brackets(raw)?;
    Some(
        split_top_level(inner)
            .into_iter()
            .map(|item| unquote(&item).unwrap_or(item))
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

/// Strip a quoted string literal (single or double quotes) and unescape it.
///
/// Returns `None` unless `raw` is exactly one quoted literal.
pub fn unquote(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let quote = raw.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = raw.strip_prefix(quote)?.strip_suffix(quote)?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next @ ('\\' | '"' | '\'')) => out.push(next),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else if ch == quote {
            // An unescaped closing quote inside the body: two literals, not one.
            return None;
        } else {
            out.push(ch);
        }
    }
    Some(out)
}

/// Split on commas that are outside quotes and outside nested brackets.
///
/// Tracks quote-open/quote-close state character by character, honoring
/// backslash escapes, so commas inside quoted elements never split. Pieces
/// are trimmed; empty pieces are dropped.
pub fn split_top_level(s: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some(_), '\\') => {
                current.push(ch);
                escaped = true;
            }
            (Some(q), c) if c == q => {
                current.push(ch);
                quote = None;
            }
            (Some(_), _) => current.push(ch),
            (None, '"' | '\'') => {
                current.push(ch);
                quote = Some(ch);
            }
            (None, '[' | '{' | '(') => {
                current.push(ch);
                depth += 1;
            }
            (None, ']' | '}' | ')') => {
                current.push(ch);
                depth = depth.saturating_sub(1);
            }
            (None, ',') if depth == 0 => {
                push_trimmed(&mut items, &current);
                current.clear();
            }
            (None, _) => current.push(ch),
        }
    }
    push_trimmed(&mut items, &current);
    items
}

fn push_trimmed(items: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        items.push(piece.to_string());
    }
}

fn strip_brackets(raw: &str) -> Option<&str> {
    raw.trim().strip_prefix('[')?.strip_suffix(']')
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Quoted elements survive a list round-trip regardless of embedded commas.
        #[test]
        fn quoted_list_elements_survive(items in prop::collection::vec("[a-z ,:.]{1,12}", 1..6)) {
            let rendered = format!(
                "[{}]",
                items.iter().map(|i| format!("\"{i}\"")).collect::<Vec<_>>().join(", ")
            );
            let parsed = parse_string_list(&rendered).unwrap();
            prop_assert_eq!(parsed, items);
        }

        /// The splitter never panics on arbitrary input.
        #[test]
        fn split_never_panics(s in ".{0,64}") {
            let _ = split_top_level(&s);
        }
    }
}
