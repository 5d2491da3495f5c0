//! Ruby literal rendering

use crate::model::{Record, RecordValue};

use super::error::{SerializeError, SerializeResult};

const INDENT: &str = "  ";

/// Renders record values as Ruby source
///
/// Indentation is tracked with an explicit depth counter. The depth is reset
/// to the base level at the start of every constructor call, so a record that
/// fails half-way never shifts the layout of the next one.
#[derive(Debug, Clone)]
pub struct RubySerializer {
    base: usize,
    indent: usize,
    include_blank: bool,
}

impl Default for RubySerializer {
    fn default() -> Self {
        Self::new(1)
    }
}

impl RubySerializer {
    /// Create a serializer whose constructor calls start at `base` depth
    pub fn new(base: usize) -> Self {
        Self {
            base,
            indent: base,
            include_blank: false,
        }
    }

    /// Keep null values and empty lists instead of dropping them
    pub fn with_include_blank(mut self, include_blank: bool) -> Self {
        self.include_blank = include_blank;
        self
    }

    pub fn include_blank(&self) -> bool {
        self.include_blank
    }

    fn i(&self) -> String {
        INDENT.repeat(self.indent)
    }

    /// Render `call(\n  {mapping}\n)` followed by `terminator`
    pub fn constructor(
        &mut self,
        call: &str,
        record: &Record,
        terminator: &str,
    ) -> SerializeResult<String> {
        self.indent = self.base;
        let outer = self.i();
        self.indent += 1;
        let inner = self.i();
        let body = self.map(record);
        self.indent = self.base;

        Ok(format!("{outer}{call}(\n{inner}{}\n{outer}){terminator}", body?))
    }

    /// Render a value at the current depth
    pub fn value(&mut self, value: &RecordValue) -> SerializeResult<String> {
        Ok(match value {
            RecordValue::Null => "nil".to_string(),
            RecordValue::Bool(b) => b.to_string(),
            RecordValue::Number(n) => n.to_string(),
            RecordValue::String(s) => escape_ruby_string(s)?,
            RecordValue::Date(d) => format!("Date.parse(\"{}\")", d.format("%Y-%m-%d")),
            RecordValue::DateTime(dt) => {
                format!("DateTime.parse(\"{}\")", dt.format("%Y-%m-%dT%H:%M:%SZ"))
            }
            RecordValue::Range(r) => r.to_string(),
            RecordValue::Expr(e) => e.clone(),
            RecordValue::List(items) => self.list(items)?,
            RecordValue::Map(map) => self.map(map)?,
        })
    }

    /// Render a mapping as a brace block
    pub fn map(&mut self, map: &Record) -> SerializeResult<String> {
        let include_blank = self.include_blank;
        let entries: Vec<(&String, &RecordValue)> = map
            .iter()
            .filter(|(_, v)| include_blank || !v.is_blank())
            .collect();
        if entries.is_empty() {
            return Ok("{}".to_string());
        }

        self.indent += 1;
        let i = self.i();
        let mut parts = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match self.value(value) {
                Ok(rendered) => parts.push(format!("{}: {}", ruby_key(key), rendered)),
                Err(e) => {
                    self.indent -= 1;
                    return Err(e);
                }
            }
        }
        self.indent -= 1;

        Ok(format!(
            "{{\n{i}{}\n{}}}",
            parts.join(&format!(",\n{i}")),
            self.i()
        ))
    }

    /// Render a sequence as a bracket block, or a flat list of ranges
    pub fn list(&mut self, items: &[RecordValue]) -> SerializeResult<String> {
        let include_blank = self.include_blank;
        let items: Vec<&RecordValue> = items
            .iter()
            .filter(|v| include_blank || !matches!(v, RecordValue::Null))
            .collect();
        if items.is_empty() {
            return Ok("[]".to_string());
        }

        if matches!(items[0], RecordValue::Range(_)) {
            let mut ranges = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    RecordValue::Range(r) => ranges.push(r.to_string()),
                    other => {
                        return Err(SerializeError::MixedRangeList {
                            found: other.type_name(),
                        });
                    }
                }
            }
            return Ok(format!("[{}]", ranges.join(", ")));
        }

        self.indent += 1;
        let i = self.i();
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            match self.value(item) {
                Ok(rendered) => parts.push(rendered),
                Err(e) => {
                    self.indent -= 1;
                    return Err(e);
                }
            }
        }
        self.indent -= 1;

        Ok(format!(
            "[\n{i}{}\n{}]",
            parts.join(&format!(",\n{i}")),
            self.i()
        ))
    }
}

/// Render a hash key: bare when it is a plain identifier, quoted otherwise
pub fn ruby_key(key: &str) -> String {
    let mut chars = key.chars();
    let plain = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if plain {
        key.to_string()
    } else {
        format!("'{}'", escape_single_quoted(key))
    }
}

/// Escape text for use inside a single-quoted Ruby string
pub fn escape_single_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

/// JSON-encode a string and neutralize Ruby interpolation
pub fn escape_ruby_string(s: &str) -> SerializeResult<String> {
    let encoded = serde_json::to_string(s)?;
    Ok(encoded
        .replace("#{", "\\#{")
        .replace("#@", "\\#@")
        .replace("#$", "\\#$"))
}
