//! Saved search exporter

use std::path::PathBuf;

use serde_json::{Map, Value, json};

use crate::model::{RecordValue, parse_date};
use crate::serialize::{RubySerializer, escape_ruby_string};
use crate::source::{Collection, RecordSource, SourceDocument};

use super::driver::{Exporter, OutputLayout};
use super::error::{ExportError, ExportResult};
use super::templates::{SAVED_SEARCHES_FOOTER, SAVED_SEARCHES_HEADER};

/// v2 record type for a v1 saved search record type
pub fn saved_search_record_type(v1_type: &str) -> &str {
    match v1_type {
        "child" => "cases",
        "incident" => "incidents",
        other => other,
    }
}

/// Convert one v1 search filter to its v2 shape
pub fn convert_filter(filter: &Value) -> ExportResult<Value> {
    let Value::Object(fields) = filter else {
        return Ok(filter.clone());
    };
    let mut converted = fields.clone();
    let value = fields.get("value").cloned().unwrap_or(Value::Null);

    if let Value::Object(options) = &value {
        if let Some((name, or_value)) = or_operation(options) {
            converted.insert("name".to_string(), json!("or"));
            let mut or_values = Map::new();
            or_values.insert(name, or_value);
            converted.insert("value".to_string(), Value::Object(or_values));
        }
        return Ok(Value::Object(converted));
    }

    if fields.get("name").and_then(Value::as_str) == Some("flag") {
        converted.insert("name".to_string(), json!("flagged"));
        converted.insert("value".to_string(), json!(["true"]));
        return Ok(Value::Object(converted));
    }

    let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
    let first = items.first().and_then(Value::as_str);
    let last = items.last().and_then(Value::as_str).unwrap_or("");

    let new_value = match first {
        Some("date_range") => {
            let (from, to) = date_range(last)?;
            if fields.get("name").and_then(Value::as_str) == Some("last_updated_at") {
                json!(format!("{from}..{to}"))
            } else {
                json!({"from": from, "to": to})
            }
        }
        Some("list") | Some("location") => json!([last]),
        Some("range") => {
            let bounds: Vec<&str> = last.split('-').map(str::trim).collect();
            json!([bounds.join("..")])
        }
        Some("single") => json!(["true"]),
        _ => value,
    };
    converted.insert("value".to_string(), new_value);
    Ok(Value::Object(converted))
}

/// `{"sex": ["or_op", "male"]}` yields `("sex", "male")`
fn or_operation(options: &Map<String, Value>) -> Option<(String, Value)> {
    let flattened: Vec<&Value> = options
        .values()
        .flat_map(|v| match v {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect();
    if flattened.first().and_then(|v| v.as_str()) != Some("or_op") {
        return None;
    }
    let name = options.keys().next()?.clone();
    let last = flattened.last().map(|v| (*v).clone())?;
    Some((name, last))
}

/// `"01-Jan-2020.31-Jan-2020"` to start-of-day and end-of-day timestamps
fn date_range(raw: &str) -> ExportResult<(String, String)> {
    let dates = raw
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            parse_date(part).ok_or_else(|| {
                ExportError::invalid_document("saved_search", format!("invalid date '{part}'"))
            })
        })
        .collect::<ExportResult<Vec<_>>>()?;
    let start = dates.first().and_then(|d| d.and_hms_opt(0, 0, 0));
    let end = dates.last().and_then(|d| d.and_hms_opt(23, 59, 59));
    match (start, end) {
        (Some(start), Some(end)) => Ok((
            start.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            end.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        )),
        _ => Err(ExportError::invalid_document(
            "saved_search",
            format!("empty date range '{raw}'"),
        )),
    }
}

/// Writes `users/saved_searches.rb`
pub struct SavedSearchExporter {
    serializer: RubySerializer,
}

impl Default for SavedSearchExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SavedSearchExporter {
    pub fn new() -> Self {
        Self {
            serializer: RubySerializer::new(3),
        }
    }
}

impl Exporter for SavedSearchExporter {
    fn label(&self) -> &str {
        "saved searches"
    }

    fn collection(&self) -> Collection {
        Collection::SavedSearch
    }

    fn layout(&self) -> OutputLayout {
        OutputLayout::Single
    }

    fn unit_path(&self, _index: usize) -> PathBuf {
        PathBuf::from("users/saved_searches.rb")
    }

    fn header(&self) -> String {
        SAVED_SEARCHES_HEADER.to_string()
    }

    fn footer(&self) -> String {
        SAVED_SEARCHES_FOOTER.to_string()
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let user_name = document
            .str_field("user_name")
            .ok_or_else(|| ExportError::invalid_document("saved_search", "missing user_name"))?;
        let filters = document
            .array_field("filters")
            .iter()
            .map(convert_filter)
            .collect::<ExportResult<Vec<_>>>()?;
        let filters = self.serializer.value(&RecordValue::from(Value::Array(filters)))?;
        let module_id = self.serializer.value(&RecordValue::from(
            document.get("module_id").cloned().unwrap_or(Value::Null),
        ))?;
        let record_type =
            saved_search_record_type(document.str_field("record_type").unwrap_or(""));

        Ok(vec![
            [
                "  SavedSearch.new_with_user(".to_string(),
                format!("    User.find_by(user_name: {}),", escape_ruby_string(user_name)?),
                "    {".to_string(),
                format!("      record_type: {},", escape_ruby_string(record_type)?),
                format!("      filters: {filters},"),
                format!("      module_id: {module_id},"),
                format!(
                    "      name: {}",
                    escape_ruby_string(document.str_field("name").unwrap_or(""))?
                ),
                "    }".to_string(),
                "  ),\n".to_string(),
            ]
            .join("\n"),
        ])
    }
}
