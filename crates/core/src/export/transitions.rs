//! Transition exporter

use std::path::PathBuf;

use crate::model::{RecordType, RecordValue};
use crate::normalize::{ALWAYS_EXCLUDED, TRANSITION_RULES, apply_rules, type_fields};
use crate::serialize::RubySerializer;
use crate::source::{Collection, FieldIndex, FieldKind, RecordSource, SourceDocument};

use super::driver::Exporter;
use super::error::ExportResult;
use super::templates::{RECORDS_HEADER, transitions_footer};
use super::{document_id, embedded_records};

/// v2 transition type for a v1 transition type
pub fn transition_type(v1_type: &str) -> Option<&'static str> {
    match v1_type {
        "reassign" => Some("Assign"),
        "referral" => Some("Referral"),
        "transfer" => Some("Transfer"),
        _ => None,
    }
}

/// Writes the transitions embedded in records as `Transition.new(...)` literals
///
/// Transitions are written oldest first; v1 stores them newest first.
pub struct TransitionExporter {
    record_type: RecordType,
    label: String,
    dates: FieldIndex,
    serializer: RubySerializer,
}

impl TransitionExporter {
    pub fn new(record_type: RecordType) -> Self {
        let mut dates = FieldIndex::default();
        dates.insert("created_at", FieldKind::DateTime);
        Self {
            record_type,
            label: format!("{} transitions", record_type.file_stem()),
            dates,
            serializer: RubySerializer::new(1),
        }
    }

    fn batch_name(&self) -> &'static str {
        match self.record_type {
            RecordType::Case => "CaseTransitions",
            RecordType::Incident => "IncidentTransitions",
            RecordType::TracingRequest => "TracingRequestTransitions",
        }
    }
}

impl Exporter for TransitionExporter {
    fn label(&self) -> &str {
        &self.label
    }

    fn collection(&self) -> Collection {
        self.record_type.collection()
    }

    fn unit_path(&self, index: usize) -> PathBuf {
        let stem = self.record_type.file_stem();
        PathBuf::from(format!("{stem}_transitions")).join(format!("{stem}_transition{index}.rb"))
    }

    fn header(&self) -> String {
        RECORDS_HEADER.to_string()
    }

    fn footer(&self) -> String {
        transitions_footer(self.batch_name())
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let transitions = embedded_records(document, "transitions");
        if transitions.is_empty() {
            return Ok(Vec::new());
        }

        let record_id = document_id(document, self.record_type.file_stem())?;
        let mut items = Vec::with_capacity(transitions.len());
        for mut transition in transitions.into_iter().rev() {
            transition.retain(|key, value| {
                !value.is_blank()
                    && !ALWAYS_EXCLUDED.contains(&key.as_str())
                    && key != "owned_by_agency"
            });
            type_fields(&mut transition, &self.dates)?;

            transition.insert("record_id".to_string(), RecordValue::string(&record_id));
            transition.insert(
                "record_type".to_string(),
                RecordValue::string(self.record_type.model_class()),
            );
            let mapped = transition
                .get("type")
                .and_then(RecordValue::as_str)
                .and_then(transition_type);
            transition.insert(
                "type".to_string(),
                mapped.map(RecordValue::string).unwrap_or(RecordValue::Null),
            );
            apply_rules(&mut transition, TRANSITION_RULES)?;

            items.push(
                self.serializer
                    .constructor("Transition.new", &transition, ",\n")?,
            );
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    #[test]
    fn test_transition_type() {
        assert_eq!(transition_type("reassign"), Some("Assign"));
        assert_eq!(transition_type("referral"), Some("Referral"));
        assert_eq!(transition_type("transfer"), Some("Transfer"));
        assert_eq!(transition_type("transfer_request"), None);
    }

    #[test]
    fn test_render_transitions_oldest_first() {
        let source = MemorySource::new();
        let document = SourceDocument::from_value(
            json!({
                "_id": "0123456789abcdef0123456789abcdef",
                "transitions": [
                    {"unique_id": "t2", "type": "transfer", "to_user_local": "b", "created_at": "2020-01-02T00:00:00Z"},
                    {"unique_id": "t1", "type": "referral", "to_user_local": "a", "is_remote": false}
                ]
            }),
            Collection::Child,
            0,
        )
        .unwrap();

        let items = TransitionExporter::new(RecordType::Case)
            .render(&document, &source)
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            concat!(
                "  Transition.new(\n",
                "    {\n",
                "      type: \"Referral\",\n",
                "      record_id: \"01234567-89ab-cdef-0123-456789abcdef\",\n",
                "      record_type: \"Child\",\n",
                "      transitioned_to: \"a\",\n",
                "      remote: false\n",
                "    }\n",
                "  ),\n"
            )
        );
        assert!(items[1].contains("type: \"Transfer\""));
        assert!(items[1].contains("created_at: DateTime.parse(\"2020-01-02T00:00:00Z\")"));
        assert!(!items[1].contains("unique_id"));
    }

    #[test]
    fn test_footer_bulk_inserts() {
        let exporter = TransitionExporter::new(RecordType::Incident);
        assert!(exporter.footer().contains("Creating #{records.count} IncidentTransitions"));
        assert_eq!(
            exporter.unit_path(0),
            PathBuf::from("incident_transitions/incident_transition0.rb")
        );
    }
}
