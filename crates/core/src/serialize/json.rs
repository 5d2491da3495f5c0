//! JSON document rendering

use serde_json::{Map, Value};

use crate::model::{Record, RecordValue};

use super::error::{SerializeError, SerializeResult};

/// Opening of a JSON output unit
pub const JSON_ARRAY_HEADER: &str = "[\n";
/// Separator between records in a JSON output unit
pub const JSON_ARRAY_SEPARATOR: &str = ",\n";
/// Closing of a JSON output unit
pub const JSON_ARRAY_FOOTER: &str = "\n]\n";

/// Convert a value to JSON, dropping blank map entries
///
/// Dates become ISO strings and ranges become `"a..b"` strings.
pub fn to_json_value(value: &RecordValue) -> SerializeResult<Value> {
    Ok(match value {
        RecordValue::Null => Value::Null,
        RecordValue::Bool(b) => Value::Bool(*b),
        RecordValue::Number(n) => Value::Number(n.clone()),
        RecordValue::String(s) => Value::String(s.clone()),
        RecordValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        RecordValue::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        RecordValue::Range(r) => Value::String(r.to_string()),
        RecordValue::Expr(e) => return Err(SerializeError::ExprInJson(e.clone())),
        RecordValue::List(items) => Value::Array(
            items
                .iter()
                .map(to_json_value)
                .collect::<SerializeResult<Vec<_>>>()?,
        ),
        RecordValue::Map(map) => record_to_json(map)?,
    })
}

/// Convert a record to a JSON object
pub fn record_to_json(record: &Record) -> SerializeResult<Value> {
    let mut object = Map::new();
    for (key, value) in record {
        if value.is_blank() {
            continue;
        }
        object.insert(key.clone(), to_json_value(value)?);
    }
    Ok(Value::Object(object))
}

/// Pretty-print a value as one element of a pretty-printed array
pub fn pretty_array_item(value: &Value) -> SerializeResult<String> {
    let pretty = serde_json::to_string_pretty(value)?;
    Ok(pretty
        .lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n"))
}
