//! Case alert exporter

use std::path::PathBuf;

use crate::model::{Record, RecordType, RecordValue, parse_date};
use crate::normalize::NormalizeError;
use crate::serialize::escape_ruby_string;
use crate::source::{Collection, RecordSource, SourceDocument};

use super::driver::Exporter;
use super::error::ExportResult;
use super::templates::{ALERTS_FOOTER, ALERTS_HEADER};
use super::{document_id, embedded_records};

/// Writes the alerts embedded in cases as `Alert.new(...)` literals
#[derive(Debug, Default)]
pub struct AlertExporter;

impl AlertExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Exporter for AlertExporter {
    fn label(&self) -> &str {
        "case alerts"
    }

    fn collection(&self) -> Collection {
        Collection::Child
    }

    fn unit_path(&self, index: usize) -> PathBuf {
        PathBuf::from("alerts").join(format!("alerts{index}.rb"))
    }

    fn header(&self) -> String {
        ALERTS_HEADER.to_string()
    }

    fn footer(&self) -> String {
        ALERTS_FOOTER.to_string()
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let alerts = embedded_records(document, "alerts");
        if alerts.is_empty() {
            return Ok(Vec::new());
        }

        let record_id = document_id(document, "case")?;
        alerts
            .iter()
            .map(|alert| alert_literal(alert, &record_id))
            .collect()
    }
}

fn alert_literal(alert: &Record, record_id: &str) -> ExportResult<String> {
    let text = |key: &str| alert.get(key).and_then(RecordValue::as_str).unwrap_or("");

    let raw_date = text("date");
    let date = parse_date(raw_date).ok_or_else(|| NormalizeError::InvalidDate {
        field: "date".to_string(),
        value: raw_date.to_string(),
    })?;

    let mut lines = vec![
        "  Alert.new(".to_string(),
        format!("    alert_for: {},", escape_ruby_string(text("alert_for"))?),
        format!("    type: {},", escape_ruby_string(text("type"))?),
        format!("    date: Date.parse(\"{}\"),", date.format("%Y-%m-%d")),
        format!("    unique_id: {},", escape_ruby_string(text("unique_id"))?),
        format!(
            "    form_sidebar_id: {},",
            escape_ruby_string(text("form_sidebar_id"))?
        ),
    ];
    let user = text("user");
    if !user.is_empty() {
        lines.push(format!(
            "    user: User.find_by(user_name: {}),",
            escape_ruby_string(user)?
        ));
    }
    let agency = text("agency");
    if !agency.is_empty() {
        lines.push(format!(
            "    agency: Agency.find_by(unique_id: {}),",
            escape_ruby_string(agency)?
        ));
    }
    lines.push(format!("    record_id: {},", escape_ruby_string(record_id)?));
    lines.push(format!(
        "    record_type: {}",
        escape_ruby_string(RecordType::Case.model_class())?
    ));
    lines.push("  ),\n".to_string());
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    fn case(alerts: serde_json::Value) -> SourceDocument {
        SourceDocument::from_value(
            json!({"_id": "0123456789abcdef0123456789abcdef", "alerts": alerts}),
            Collection::Child,
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_render_alert() {
        let source = MemorySource::new();
        let items = AlertExporter::new()
            .render(
                &case(json!([{
                    "alert_for": "new_form",
                    "type": "notes",
                    "date": "2020/02/03",
                    "unique_id": "a1",
                    "form_sidebar_id": "notes",
                    "user": "primero_cp"
                }])),
                &source,
            )
            .unwrap();
        assert_eq!(
            items,
            vec![concat!(
                "  Alert.new(\n",
                "    alert_for: \"new_form\",\n",
                "    type: \"notes\",\n",
                "    date: Date.parse(\"2020-02-03\"),\n",
                "    unique_id: \"a1\",\n",
                "    form_sidebar_id: \"notes\",\n",
                "    user: User.find_by(user_name: \"primero_cp\"),\n",
                "    record_id: \"01234567-89ab-cdef-0123-456789abcdef\",\n",
                "    record_type: \"Child\"\n",
                "  ),\n"
            )]
        );
    }

    #[test]
    fn test_invalid_date_fails_the_record() {
        let source = MemorySource::new();
        let result = AlertExporter::new().render(
            &case(json!([{"alert_for": "new_form", "date": "soon"}])),
            &source,
        );
        assert!(result.is_err());
    }
}
