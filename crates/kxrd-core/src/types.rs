//! # Field Type Expressions
//!
//! A field's declared type is classified lexically from its raw token:
//!
//! | Token        | Classification                      |
//! |--------------|-------------------------------------|
//! | `str`        | [`Scalar::String`]                  |
//! | `int`        | [`Scalar::Integer`]                 |
//! | `float`      | [`Scalar::Number`]                  |
//! | `bool`       | [`Scalar::Boolean`]                 |
//! | `any`        | [`TypeExpr::Any`]                   |
//! | `[T]`        | [`TypeExpr::List`]                  |
//! | `{K:V}`      | [`TypeExpr::Dict`]                  |
//! | anything else| [`TypeExpr::Named`]                 |
//!
//! Named types are resolved against a schema table only by the mapper;
//! classification never consults one.

use std::fmt;

/// Scalar OpenAPI types reachable from primitive keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    String,
    Integer,
    Number,
    Boolean,
}

impl Scalar {
    /// Map a primitive keyword to its scalar type.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "str" => Some(Self::String),
            "int" => Some(Self::Integer),
            "float" => Some(Self::Number),
            "bool" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// The OpenAPI `type` keyword value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexical classification of a raw field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Scalar(Scalar),
    Any,
    List(Box<TypeExpr>),
    Dict {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Named(String),
}

impl TypeExpr {
    /// Classify a raw type token.
    ///
    /// Never fails: malformed brackets fall through to [`TypeExpr::Named`],
    /// which the mapper turns into a generic object.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            return Self::List(Box::new(Self::parse(inner)));
        }

        if let Some(inner) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
            if let Some((key, value)) = split_top_level_once(inner, ':') {
                return Self::Dict {
                    key: Box::new(Self::parse(key)),
                    value: Box::new(Self::parse(value)),
                };
            }
            return Self::Named(raw.to_string());
        }

        if raw == "any" {
            return Self::Any;
        }

        match Scalar::from_keyword(raw) {
            Some(scalar) => Self::Scalar(scalar),
            None => Self::Named(raw.to_string()),
        }
    }

    /// True for `{any:any}`, the arbitrary-object dict.
    pub fn is_any_dict(&self) -> bool {
        matches!(
            self,
            Self::Dict { key, value } if **key == Self::Any && **value == Self::Any
        )
    }

    /// The scalar type, when this is a primitive.
    pub fn scalar(&self) -> Option<Scalar> {
        match self {
            Self::Scalar(s) => Some(*s),
            _ => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(Scalar::String) => f.write_str("str"),
            Self::Scalar(Scalar::Integer) => f.write_str("int"),
            Self::Scalar(Scalar::Number) => f.write_str("float"),
            Self::Scalar(Scalar::Boolean) => f.write_str("bool"),
            Self::Any => f.write_str("any"),
            Self::List(item) => write!(f, "[{item}]"),
            Self::Dict { key, value } => write!(f, "{{{key}:{value}}}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Split `s` at the first `delim` that is not nested inside `[]` or `{}`.
fn split_top_level_once(s: &str, delim: char) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            c if c == delim && depth == 0 => {
                return Some((&s[..i], &s[i + c.len_utf8()..]));
            }
            _ => {}
        }
    }
    None
}
