//! Front-matter-lite codec.
//!
//! Content files carry a metadata block delimited by lines containing only
//! `---`, holding one `key: value` pair per line. This is deliberately not
//! YAML: values are single-line, and multi-line text is encoded with a pipe
//! convention (`" | "` per line break, `" || "` for a blank-line paragraph
//! break). Files must round-trip through this encoder/decoder pair.
//!
//! The block stays hand-editable and diffable text, so serialization keeps
//! untouched keys exactly as written and only reformats the keys being
//! updated.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::Result;

/// Editor field types driving per-key formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Select,
    Date,
    Number,
    Checkbox,
    Gallery,
}

impl FieldType {
    /// Parse a field type name from collection configuration.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "select" => FieldType::Select,
            "date" => FieldType::Date,
            "number" => FieldType::Number,
            "checkbox" => FieldType::Checkbox,
            "gallery" => FieldType::Gallery,
            _ => FieldType::Text,
        }
    }
}

/// Field name to type mapping, resolved once per collection.
pub type FieldSchema = HashMap<String, FieldType>;

/// A decoded front-matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
}

/// Parsed front matter: raw `key: value` pairs in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    entries: Vec<(String, String)>,
}

impl FrontMatter {
    /// Raw value for a key, exactly as written in the file.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode a value according to the configured field type.
    ///
    /// `select` and `date` values keep their surrounding quotes; other types
    /// strip them. Keys named `gallery` or whose value starts with `[` are
    /// decoded as string lists, via JSON first and a manual comma split as
    /// fallback.
    pub fn get(&self, key: &str, schema: &FieldSchema) -> Option<FieldValue> {
        let raw = self.raw(key)?;
        let field_type = schema.get(key).copied().unwrap_or(FieldType::Text);

        if field_type == FieldType::Gallery || key == "gallery" || raw.starts_with('[') {
            return Some(FieldValue::List(decode_list(raw)));
        }

        Some(match field_type {
            FieldType::Select | FieldType::Date => FieldValue::Str(raw.to_string()),
            FieldType::Number => match raw.parse::<f64>() {
                Ok(n) => FieldValue::Number(n),
                Err(_) => FieldValue::Str(strip_quotes(raw).to_string()),
            },
            FieldType::Checkbox => FieldValue::Bool(raw == "true"),
            _ => FieldValue::Str(decode_multiline(strip_quotes(raw))),
        })
    }
}

/// Strip one pair of surrounding quotes, single or double.
fn strip_quotes(value: &str) -> &str {
    let v = value.trim();
    if v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"')) || (v.starts_with('\'') && v.ends_with('\'')))
    {
        &v[1..v.len() - 1]
    } else {
        v
    }
}

/// Decode a bracketed or comma-separated list of strings.
fn decode_list(raw: &str) -> Vec<String> {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
        return items;
    }
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(|item| strip_quotes(item).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Encode line breaks with the pipe convention.
fn encode_multiline(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace("\n\n", " || ")
        .replace('\n', " | ")
}

/// Reverse of [`encode_multiline`].
fn decode_multiline(text: &str) -> String {
    text.replace(" || ", "\n\n").replace(" | ", "\n")
}

/// Locate the leading front-matter block.
///
/// Returns `(block_lines, body)` when the content starts with a line that is
/// exactly `---` and a matching closing line exists. A single blank line
/// between the closing delimiter and the body is swallowed; serialization
/// puts it back.
fn split(content: &str) -> Option<(&str, &str)> {
    let after_open = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let block = after_open[..offset].trim_end_matches(['\r', '\n']);
            let mut body = &after_open[offset + line.len()..];
            body = body.strip_prefix("\r\n").or_else(|| body.strip_prefix('\n')).unwrap_or(body);
            return Some((block, body));
        }
        offset += line.len();
    }
    None
}

/// Parse content into its front matter and body.
///
/// Content without a front-matter block yields an empty map and the whole
/// content as body.
pub fn parse(content: &str) -> (FrontMatter, &str) {
    let Some((block, body)) = split(content) else {
        return (FrontMatter::default(), content);
    };

    let mut entries = Vec::new();
    for line in block.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                entries.push((key.to_string(), value.trim().to_string()));
            }
        }
    }
    (FrontMatter { entries }, body)
}

/// Whether content starts with a front-matter block.
pub fn has_front_matter(content: &str) -> bool {
    split(content).is_some()
}

/// Make sure content carries a front-matter block with a `tags` key.
///
/// Missing block: a minimal one (`tags: []`) is prepended. Existing block
/// without `tags`: the key is appended to the block, everything else kept
/// verbatim.
pub fn ensure_front_matter(content: &str) -> String {
    match split(content) {
        None => format!("---\ntags: []\n---\n\n{content}"),
        Some((block, body)) => {
            let (fm, _) = parse(content);
            if fm.raw("tags").is_some() {
                content.to_string()
            } else if block.is_empty() {
                format!("---\ntags: []\n---\n\n{body}")
            } else {
                format!("---\n{block}\ntags: []\n---\n\n{body}")
            }
        }
    }
}

/// Best-effort normalization of a date value to `YYYY-MM-DD`.
///
/// Unparsable input is returned as-is; a wrong-looking date in the file beats
/// silently dropping what the author wrote.
fn normalize_date(value: &str) -> String {
    let v = strip_quotes(value);
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(v, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    v.to_string()
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.parse::<f64>().is_ok()
}

/// Format one submitted value per its field type.
fn format_value(value: &str, field_type: FieldType) -> String {
    match field_type {
        FieldType::Select | FieldType::Date => {
            let v = if field_type == FieldType::Date {
                normalize_date(value)
            } else {
                strip_quotes(value).to_string()
            };
            format!("\"{v}\"")
        }
        FieldType::Number => {
            // Integer form only without a decimal point; "3.0" stays "3.0".
            let v = strip_quotes(value);
            match v.parse::<i64>() {
                Ok(n) if !v.contains('.') => n.to_string(),
                _ if v.parse::<f64>().is_ok() => v.to_string(),
                _ => format!("\"{v}\""),
            }
        }
        FieldType::Checkbox => {
            let truthy = matches!(value.to_lowercase().as_str(), "true" | "1" | "on" | "yes");
            truthy.to_string()
        }
        FieldType::Gallery => format_list(&decode_list(value)),
        FieldType::Text => {
            let v = strip_quotes(value);
            if is_numeric(v) {
                v.to_string()
            } else {
                format!("\"{}\"", encode_multiline(v))
            }
        }
    }
}

/// Bracketed, double-quoted list rendering.
fn format_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("\"{item}\"")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Serialize a front-matter block from existing entries plus submitted
/// field values.
///
/// Existing keys not in `field_values` are preserved verbatim, in order.
/// `categories` (the legacy alias for tags) renders as a bracketed list and
/// always comes first when present. Returns block content without the `---`
/// delimiters.
pub fn serialize(
    existing: &FrontMatter,
    field_values: &HashMap<String, String>,
    schema: &FieldSchema,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    let render = |key: &str| -> Option<String> {
        if key == "categories" {
            let raw = field_values
                .get(key)
                .map(|v| v.as_str())
                .or_else(|| existing.raw(key))?;
            return Some(format!("categories: {}", format_list(&decode_list(raw))));
        }
        match field_values.get(key) {
            Some(value) => {
                let field_type = schema.get(key).copied().unwrap_or(FieldType::Text);
                Some(format!("{key}: {}", format_value(value, field_type)))
            }
            None => existing.raw(key).map(|raw| format!("{key}: {raw}")),
        }
    };

    let mut seen: Vec<&str> = Vec::new();
    if existing.raw("categories").is_some() || field_values.contains_key("categories") {
        if let Some(line) = render("categories") {
            lines.push(line);
        }
        seen.push("categories");
    }

    for key in existing.keys() {
        if seen.contains(&key) {
            continue;
        }
        if let Some(line) = render(key) {
            lines.push(line);
        }
        seen.push(key);
    }

    // Newly submitted keys, in a stable order
    let mut new_keys: Vec<&String> = field_values
        .keys()
        .filter(|k| !seen.contains(&k.as_str()))
        .collect();
    new_keys.sort();
    for key in new_keys {
        if let Some(line) = render(key) {
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// Rewrite content's front matter from submitted field values, preserving
/// unknown keys and the body.
///
/// Fail-soft: any internal error returns the original content unmodified
/// rather than aborting the save.
pub fn update(
    content: &str,
    field_values: &HashMap<String, String>,
    schema: &FieldSchema,
) -> String {
    match try_update(content, field_values, schema) {
        Ok(updated) => updated,
        Err(e) => {
            tracing::warn!(error = %e, "front-matter update failed, keeping content as-is");
            content.to_string()
        }
    }
}

fn try_update(
    content: &str,
    field_values: &HashMap<String, String>,
    schema: &FieldSchema,
) -> Result<String> {
    let (existing, body) = parse(content);
    let had_block = has_front_matter(content);
    let block = serialize(&existing, field_values, schema);

    let body = if had_block { body } else { content };
    Ok(format!("---\n{block}\n---\n\n{body}"))
}
