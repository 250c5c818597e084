//! Attribute recovery from raw schema text.
//!
//! The structural parser does not report field `@map`, `@db.*`, relation
//! `onUpdate`, `@@index` or `@@fulltext`. This module finds them with a
//! line-oriented scan of each `model` block so the loader can overlay them
//! afterwards. A declaration whose brackets span lines counts as one line.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Attributes recovered for one field. At least one member is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveredAttributes {
    /// Column name from `@map("...")`.
    pub column_name: Option<String>,
    /// Native type without the `@db.` prefix, e.g. `VarChar(255)`.
    pub native_type: Option<String>,
    /// Referential action from `@relation(..., onUpdate: X)`.
    pub relation_on_update: Option<String>,
}

impl RecoveredAttributes {
    pub fn is_empty(&self) -> bool {
        self.column_name.is_none()
            && self.native_type.is_none()
            && self.relation_on_update.is_none()
    }
}

/// Everything recovered for one model block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveredModel {
    /// Recovered attributes keyed by field name.
    pub fields: HashMap<String, RecoveredAttributes>,
    /// `@@index(...)` and `@@fulltext(...)` declarations, verbatim and in
    /// source order. Arguments spread over several lines are joined.
    pub index_declarations: Vec<String>,
}

static PATTERNS: LazyLock<ScanPatterns> = LazyLock::new(ScanPatterns::new);

struct ScanPatterns {
    model_header: Regex,
    // `@map` not preceded by another `@`, so `@@map` never matches
    column_map: Regex,
    native_type: Regex,
    relation_on_update: Regex,
    block_index: Regex,
}

impl ScanPatterns {
    fn new() -> Self {
        Self {
            model_header: Regex::new(r"^\s*model\s+(\w+)\s*\{")
                .expect("static regex must compile"),
            column_map: Regex::new(r#"(?:^|[^@])@map\(\s*"((?:[^"\\]|\\.)*)"\s*\)"#)
                .expect("static regex must compile"),
            native_type: Regex::new(r"@db\.(\w+(?:\([^)]*\))?)")
                .expect("static regex must compile"),
            relation_on_update: Regex::new(r"@relation\([^)]*\bonUpdate:\s*(\w+)")
                .expect("static regex must compile"),
            block_index: Regex::new(r"^@@(?:index|fulltext)\(")
                .expect("static regex must compile"),
        }
    }
}

/// Scans `source` and returns the recovered attributes of every model block,
/// keyed by model name.
///
/// Blocks other than `model` are skipped. A field appears in the result only
/// when at least one attribute was found on its line; absence means the
/// parser's values stand.
///
/// # Examples
///
/// ```
/// use prismix::scan_schema;
///
/// let recovered = scan_schema(
///     "model User {\n  id Int @id\n  name String @map(\"user_name\") @db.VarChar(80)\n\n  @@index([name])\n  @@map(\"users\")\n}\n",
/// );
/// let user = &recovered["User"];
/// let name = &user.fields["name"];
/// assert_eq!(name.column_name.as_deref(), Some("user_name"));
/// assert_eq!(name.native_type.as_deref(), Some("VarChar(80)"));
/// assert!(!user.fields.contains_key("id"));
/// assert_eq!(user.index_declarations, vec!["@@index([name])"]);
/// ```
pub fn scan_schema(source: &str) -> HashMap<String, RecoveredModel> {
    let mut models = HashMap::new();

    for chunk in source.split("\n}") {
        let lines: Vec<&str> = chunk.lines().collect();
        let Some((header, name)) = lines.iter().enumerate().rev().find_map(|(i, line)| {
            PATTERNS
                .model_header
                .captures(line)
                .map(|caps| (i, caps[1].to_string()))
        }) else {
            continue;
        };

        let model = scan_model_body(&lines[header + 1..]);
        models.insert(name, model);
    }

    models
}

fn scan_model_body(lines: &[&str]) -> RecoveredModel {
    let mut model = RecoveredModel::default();

    for line in logical_lines(lines) {
        if PATTERNS.block_index.is_match(&line) {
            model.index_declarations.push(line);
            continue;
        }
        if line.starts_with("@@") {
            continue;
        }

        let attributes = scan_field_line(&line);
        if attributes.is_empty() {
            continue;
        }
        if let Some(field) = line.split_whitespace().next() {
            model.fields.insert(field.to_string(), attributes);
        }
    }

    model
}

/// Joins physical lines whose `(` or `[` arguments are still open into one
/// declaration per line. Comments are cut and blank lines dropped.
fn logical_lines(lines: &[&str]) -> Vec<String> {
    let mut joined = Vec::new();
    let mut pending = String::new();
    let mut depth = 0;

    for raw in lines {
        let line = strip_comment(raw.trim()).trim();
        if line.is_empty() {
            continue;
        }

        let tight = pending.ends_with(['(', '['])
            || line.starts_with([')', ']'])
            || line.starts_with(',');
        if !pending.is_empty() && !tight {
            pending.push(' ');
        }
        pending.push_str(line);
        depth += bracket_depth(line);

        if depth <= 0 {
            joined.push(std::mem::take(&mut pending));
            depth = 0;
        }
    }
    if !pending.is_empty() {
        joined.push(pending);
    }
    joined
}

/// Net count of opened `(` and `[` outside string literals.
fn bracket_depth(line: &str) -> i32 {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;

    for ch in line.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ => {}
        }
    }
    depth
}

fn scan_field_line(line: &str) -> RecoveredAttributes {
    let capture = |re: &Regex| re.captures(line).map(|caps| caps[1].to_string());
    RecoveredAttributes {
        column_name: capture(&PATTERNS.column_map),
        native_type: capture(&PATTERNS.native_type),
        relation_on_update: capture(&PATTERNS.relation_on_update),
    }
}

/// Cuts a trailing `//` comment that is not inside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    let mut previous_slash = false;

    for (i, ch) in line.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                previous_slash = false;
            }
            '/' if previous_slash => return &line[..i - 1],
            '/' => previous_slash = true,
            _ => previous_slash = false,
        }
    }
    line
}
