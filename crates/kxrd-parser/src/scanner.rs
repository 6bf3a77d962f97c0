//! # Schema Scanner
//!
//! A single-pass, line-oriented state machine over KCL source text. It is
//! not a grammar: each line is classified by shape and handed to the first
//! matching line rule.
//!
//! ## States
//!
//! - `PreSchema`: file level. `__xrd_*` metadata and plain variable
//!   assignments are read here.
//! - `InSchema`: inside a `schema` body. Field declarations are read here.
//! - Block comment: orthogonal to both. Entered at a `"""` delimiter and
//!   left at the matching one, returning to whichever state was active.
//!
//! ## Rule Order
//!
//! | # | Rule            | Applies when                                      |
//! |---|-----------------|---------------------------------------------------|
//! | 1 | `block_comment` | inside a block comment, or a delimiter is present |
//! | 2 | `blank`         | the line is empty                                 |
//! | 3 | `schema_end`    | in a schema and the line is not indented past the header (falls through) |
//! | 4 | `metadata`      | at file level and the line assigns `__xrd_*`      |
//! | 5 | `variable`      | at file level and the line is `name = <expr>`     |
//! | 6 | `comment`       | the line starts with `#`                          |
//! | 7 | `schema_header` | the line is `schema <Name>:`                      |
//! | 8 | `field`         | in a schema                                       |
//!
//! ## Indentation
//!
//! Indentation width counts a space as one column and a tab as
//! [`TAB_WIDTH`] columns. A schema body line must be indented strictly
//! deeper than its header. Comment lines never end a schema, so annotations
//! for the next schema may sit at column zero between blocks.
//!
//! The first field declaration fixes the body's field column. Only lines
//! at exactly that column are read as fields; deeper lines are
//! continuations. A default that opens more brackets than it closes keeps
//! absorbing the following lines, joined by single spaces, until the
//! brackets balance.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use kxrd_core::{Field, Metadata, ParseResult, PrinterColumn, Result, Schema, XrdError};
use regex::Regex;

use crate::annotation::{parse_bool, parse_string_list, split_top_level, Annotation};
use crate::directives::{apply_field_directives, apply_schema_directives};
use crate::expression::{resolve, Bindings};

/// Columns a tab contributes to indentation width.
pub const TAB_WIDTH: usize = 4;

/// Prefix of file-level metadata variables.
pub const METADATA_PREFIX: &str = "__xrd_";

/// `schema Name:` with an optional trailing colon. Groups: 1=name.
static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*schema\s+(\w+)\s*:?\s*$").expect("header pattern is valid")
});

/// `name[?]: type [= default]`. Groups: 1=name, 2=optional marker, 3=type, 4=default.
static FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\s*(\?)?\s*:\s*(.+?)(?:\s*=\s*(.+))?$").expect("field pattern is valid")
});

/// `name = expression`. Groups: 1=name, 2=expression.
static ASSIGNMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_]\w*)\s*=\s*(.+)$").expect("assignment pattern is valid")
});

/// Block comment delimiters, in the order they are searched.
const BLOCK_DELIMITERS: [&str; 2] = [r#"""""#, "'''"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    PreSchema,
    InSchema,
}

#[derive(Debug)]
struct BlockComment {
    delimiter: &'static str,
    lines: Vec<String>,
}

/// One input line, pre-split for the rules.
#[derive(Debug)]
struct Line<'a> {
    number: usize,
    trimmed: &'a str,
    indent: usize,
}

impl<'a> Line<'a> {
    fn new(number: usize, raw: &'a str) -> Self {
        let indent = raw
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
            .sum();
        Self {
            number,
            trimmed: raw.trim(),
            indent,
        }
    }

    fn is_comment(&self) -> bool {
        self.trimmed.starts_with('#')
    }
}

/// What a rule did with a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// The line is handled; stop evaluating rules.
    Consumed,
    /// State changed; evaluate the remaining rules against the same line.
    Continue,
}

/// A (predicate, handler) pair.
struct LineRule {
    name: &'static str,
    applies: fn(&Scanner, &Line<'_>) -> bool,
    apply: fn(&mut Scanner, &Line<'_>) -> Flow,
}

/// Line rules in priority order.
static RULES: &[LineRule] = &[
    LineRule {
        name: "block_comment",
        applies: |s, l| s.block.is_some() || find_delimiter(l.trimmed).is_some(),
        apply: Scanner::on_block_comment,
    },
    LineRule {
        name: "blank",
        applies: |_, l| l.trimmed.is_empty(),
        apply: Scanner::on_blank,
    },
    LineRule {
        name: "schema_end",
        applies: |s, l| s.mode == Mode::InSchema && !l.is_comment() && l.indent <= s.header_indent,
        apply: Scanner::on_schema_end,
    },
    LineRule {
        name: "metadata",
        applies: |s, l| s.mode == Mode::PreSchema && l.trimmed.starts_with(METADATA_PREFIX),
        apply: Scanner::on_metadata,
    },
    LineRule {
        name: "variable",
        applies: |s, l| s.mode == Mode::PreSchema && ASSIGNMENT_PATTERN.is_match(l.trimmed),
        apply: Scanner::on_variable,
    },
    LineRule {
        name: "comment",
        applies: |_, l| l.is_comment(),
        apply: Scanner::on_comment,
    },
    LineRule {
        name: "schema_header",
        applies: |_, l| HEADER_PATTERN.is_match(l.trimmed),
        apply: Scanner::on_schema_header,
    },
    LineRule {
        name: "field",
        applies: |s, _| s.mode == Mode::InSchema,
        apply: Scanner::on_field,
    },
];

/// Names of the line rules in the order they are evaluated.
pub fn rule_order() -> Vec<&'static str> {
    RULES.iter().map(|r| r.name).collect()
}

/// Scanner state for one input.
///
/// All pending buffers live here rather than in globals, so each scan is
/// isolated and can be driven one line at a time.
#[derive(Debug)]
pub struct Scanner {
    mode: Mode,
    block: Option<BlockComment>,
    current: Option<Schema>,
    /// A field was the most recent declaration in `current`.
    field_open: bool,
    header_indent: usize,
    /// Column of the first field declaration in the open schema.
    field_indent: Option<usize>,
    /// Brackets still open in a multi-line default.
    open_brackets: usize,
    pending_annotations: Vec<Annotation>,
    pending_description: Vec<String>,
    schemas: BTreeMap<String, Schema>,
    primary: Option<String>,
    metadata: Metadata,
    variables: Bindings,
    line_number: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            mode: Mode::PreSchema,
            block: None,
            current: None,
            field_open: false,
            header_indent: 0,
            field_indent: None,
            open_brackets: 0,
            pending_annotations: Vec::new(),
            pending_description: Vec::new(),
            schemas: BTreeMap::new(),
            primary: None,
            metadata: Metadata::default(),
            variables: Bindings::new(),
            line_number: 0,
        }
    }

    /// Feed one line. Returns the name of the rule that consumed it, or
    /// `None` when no rule did.
    pub fn feed_line(&mut self, raw: &str) -> Option<&'static str> {
        self.line_number += 1;
        let line = Line::new(self.line_number, raw);

        for rule in RULES {
            if !(rule.applies)(self, &line) {
                continue;
            }
            tracing::trace!(line = line.number, rule = rule.name, "dispatch");
            if (rule.apply)(self, &line) == Flow::Consumed {
                return Some(rule.name);
            }
        }
        None
    }

    /// Feed every line of `source`.
    pub fn feed(&mut self, source: &str) {
        for raw in source.lines() {
            self.feed_line(raw);
        }
    }

    /// True while inside a `schema` body.
    pub fn in_schema(&self) -> bool {
        self.mode == Mode::InSchema
    }

    /// True while inside a block comment.
    pub fn in_block_comment(&self) -> bool {
        self.block.is_some()
    }

    /// Literal variable bindings seen so far.
    pub fn variables(&self) -> &Bindings {
        &self.variables
    }

    /// Close any open schema and produce the result.
    pub fn finish(mut self) -> Result<ParseResult> {
        if let Some(block) = self.block.take() {
            tracing::debug!(
                lines = block.lines.len(),
                "unterminated block comment discarded at end of input"
            );
        }
        self.close_schema();

        let primary = self
            .primary
            .and_then(|name| self.schemas.get(&name).cloned())
            .ok_or(XrdError::NoSchema)?;

        Ok(ParseResult {
            schemas: self.schemas,
            primary,
            metadata: self.metadata,
        })
    }

    fn on_block_comment(&mut self, line: &Line<'_>) -> Flow {
        match self.block.take() {
            Some(mut block) => match line.trimmed.find(block.delimiter) {
                Some(end) => {
                    push_nonempty(&mut block.lines, &line.trimmed[..end]);
                    self.attach_block_description(&block.lines);
                }
                None => {
                    push_nonempty(&mut block.lines, line.trimmed);
                    self.block = Some(block);
                }
            },
            None => {
                let Some((start, delimiter)) = find_delimiter(line.trimmed) else {
                    return Flow::Continue;
                };
                let rest = &line.trimmed[start + delimiter.len()..];
                let mut lines = Vec::new();
                match rest.find(delimiter) {
                    Some(end) => {
                        push_nonempty(&mut lines, &rest[..end]);
                        self.attach_block_description(&lines);
                    }
                    None => {
                        push_nonempty(&mut lines, rest);
                        self.block = Some(BlockComment { delimiter, lines });
                    }
                }
            }
        }
        Flow::Consumed
    }

    /// The most recent field takes the description; otherwise the open
    /// schema does, if it has none yet.
    fn attach_block_description(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        let text = lines.join(" ");
        let Some(schema) = self.current.as_mut() else {
            return;
        };
        if self.field_open {
            if let Some(field) = schema.fields.last_mut() {
                field.description = Some(text);
            }
        } else if schema.description.is_none() {
            schema.description = Some(text);
        }
    }

    fn on_blank(&mut self, _line: &Line<'_>) -> Flow {
        if self.mode == Mode::PreSchema {
            self.pending_description.clear();
        }
        Flow::Consumed
    }

    fn on_schema_end(&mut self, line: &Line<'_>) -> Flow {
        tracing::trace!(line = line.number, "schema body ended by indentation");
        self.close_schema();
        self.mode = Mode::PreSchema;
        Flow::Continue
    }

    fn on_metadata(&mut self, line: &Line<'_>) -> Flow {
        let text = strip_inline_comment(line.trimmed);
        let Some(caps) = ASSIGNMENT_PATTERN.captures(text) else {
            return Flow::Continue;
        };
        let name = &caps[1];
        let rhs = caps[2].trim();
        let Some(key) = name.strip_prefix(METADATA_PREFIX) else {
            return Flow::Continue;
        };

        match key {
            "kind" | "group" | "version" => match resolve(rhs, &self.variables) {
                Some(value) => {
                    self.variables.insert(name.to_string(), value.clone());
                    let slot = match key {
                        "kind" => &mut self.metadata.kind,
                        "group" => &mut self.metadata.group,
                        _ => &mut self.metadata.version,
                    };
                    *slot = Some(value);
                }
                None => {
                    tracing::debug!(
                        line = line.number,
                        variable = name,
                        expression = rhs,
                        "metadata expression unresolved; value left unset"
                    );
                }
            },
            "categories" => match parse_string_list(rhs) {
                Some(categories) => self.metadata.categories = categories,
                None => unparsed(line, name, rhs),
            },
            "printer_columns" => match parse_string_list(rhs) {
                Some(columns) => {
                    self.metadata.printer_columns = columns
                        .iter()
                        .filter_map(|c| {
                            let parsed = PrinterColumn::parse_compact(c);
                            if parsed.is_none() {
                                tracing::debug!(column = %c, "printer column needs name:type:jsonPath");
                            }
                            parsed
                        })
                        .collect();
                }
                None => unparsed(line, name, rhs),
            },
            "served" | "referenceable" | "status_preserve_unknown_fields" => {
                match parse_bool(rhs) {
                    Some(value) => {
                        let slot = match key {
                            "served" => &mut self.metadata.served,
                            "referenceable" => &mut self.metadata.referenceable,
                            _ => &mut self.metadata.status_preserve_unknown_fields,
                        };
                        *slot = Some(value);
                    }
                    None => unparsed(line, name, rhs),
                }
            }
            _ => {
                tracing::debug!(line = line.number, variable = name, "unknown metadata variable");
            }
        }
        Flow::Consumed
    }

    fn on_variable(&mut self, line: &Line<'_>) -> Flow {
        let text = strip_inline_comment(line.trimmed);
        if let Some(caps) = ASSIGNMENT_PATTERN.captures(text) {
            if let Some(value) = resolve(&caps[2], &self.variables) {
                self.variables.insert(caps[1].to_string(), value);
            }
        }
        Flow::Consumed
    }

    fn on_comment(&mut self, line: &Line<'_>) -> Flow {
        let text = line.trimmed.trim_start_matches('#').trim();
        if text.starts_with('@') {
            match Annotation::parse(text) {
                Some(annotation) => self.pending_annotations.push(annotation),
                None => tracing::debug!(line = line.number, text, "unrecognized annotation"),
            }
        } else if self.mode == Mode::InSchema {
            self.pending_description.push(text.to_string());
        }
        Flow::Consumed
    }

    fn on_schema_header(&mut self, line: &Line<'_>) -> Flow {
        let Some(caps) = HEADER_PATTERN.captures(line.trimmed) else {
            return Flow::Continue;
        };
        self.close_schema();

        let mut schema = Schema::new(&caps[1]);
        apply_schema_directives(&mut schema, &self.pending_annotations);
        tracing::debug!(line = line.number, schema = %schema.name, "schema opened");

        self.pending_annotations.clear();
        self.pending_description.clear();
        self.current = Some(schema);
        self.field_open = false;
        self.header_indent = line.indent;
        self.mode = Mode::InSchema;
        Flow::Consumed
    }

    fn on_field(&mut self, line: &Line<'_>) -> Flow {
        let text = strip_inline_comment(line.trimmed);
        if self.open_brackets > 0 {
            self.open_brackets = bracket_depth(self.open_brackets, text);
            self.extend_default(text);
            return Flow::Consumed;
        }
        if self.field_indent.is_some_and(|indent| line.indent != indent) {
            tracing::trace!(line = line.number, "continuation line skipped");
            return Flow::Consumed;
        }
        let Some(caps) = FIELD_PATTERN.captures(text) else {
            tracing::trace!(line = line.number, "schema body line is not a field");
            return Flow::Consumed;
        };
        let Some(schema) = self.current.as_mut() else {
            return Flow::Consumed;
        };

        let raw_type = split_top_level(&caps[3]).into_iter().next().unwrap_or_default();

        let mut field = Field::new(&caps[1], raw_type, caps.get(2).is_none());
        field.raw_default = caps
            .get(4)
            .map(|m| m.as_str().trim())
            .filter(|d| !d.is_empty() && *d != "Undefined")
            .map(str::to_string);

        apply_field_directives(&mut field, &self.pending_annotations);
        if !self.pending_description.is_empty() {
            field.description = Some(self.pending_description.join("\n"));
        }
        self.pending_annotations.clear();
        self.pending_description.clear();

        self.open_brackets = field
            .raw_default
            .as_deref()
            .map_or(0, |d| bracket_depth(0, d));
        schema.fields.push(field);
        self.field_open = true;
        if self.field_indent.is_none() {
            self.field_indent = Some(line.indent);
        }
        Flow::Consumed
    }

    /// Append a continuation line to the last field's default.
    fn extend_default(&mut self, text: &str) {
        let default = self
            .current
            .as_mut()
            .and_then(|schema| schema.fields.last_mut())
            .and_then(|field| field.raw_default.as_mut());
        if let Some(default) = default {
            if !text.is_empty() {
                default.push(' ');
                default.push_str(text);
            }
        }
    }

    /// Finalize the open schema into the table. A repeated name replaces
    /// the earlier definition.
    fn close_schema(&mut self) {
        self.field_open = false;
        self.field_indent = None;
        self.open_brackets = 0;
        if let Some(schema) = self.current.take() {
            if self.schemas.contains_key(&schema.name) {
                tracing::debug!(schema = %schema.name, "schema redefined; earlier definition discarded");
            }
            self.primary = Some(schema.name.clone());
            self.schemas.insert(schema.name.clone(), schema);
        }
    }
}

/// Scan complete source text.
pub fn scan(source: &str) -> Result<ParseResult> {
    let mut scanner = Scanner::new();
    scanner.feed(source);
    scanner.finish()
}

fn unparsed(line: &Line<'_>, name: &str, rhs: &str) {
    tracing::debug!(
        line = line.number,
        variable = name,
        value = rhs,
        "metadata value has the wrong shape; left unset"
    );
}

fn push_nonempty(lines: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        lines.push(text.to_string());
    }
}

/// Position and kind of the first block comment delimiter in `s`.
fn find_delimiter(s: &str) -> Option<(usize, &'static str)> {
    BLOCK_DELIMITERS
        .iter()
        .filter_map(|d| s.find(d).map(|pos| (pos, *d)))
        .min_by_key(|(pos, _)| *pos)
}

/// Bracket nesting after `s`, starting from `depth`. Quoted text is skipped.
fn bracket_depth(mut depth: usize, s: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in s.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[' | '{' | '(') => depth += 1,
            (None, ']' | '}' | ')') => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

/// Drop a trailing `# comment` that is outside any quoted string.
pub fn strip_inline_comment(s: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(ch),
            (None, '#') => return s[..i].trim_end(),
            _ => {}
        }
    }
    s.trim_end()
}
