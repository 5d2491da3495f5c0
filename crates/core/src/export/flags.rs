//! Record flag exporter

use std::path::PathBuf;

use crate::model::{RecordType, RecordValue};
use crate::normalize::type_fields;
use crate::serialize::RubySerializer;
use crate::source::{Collection, FieldIndex, FieldKind, RecordSource, SourceDocument};

use super::driver::Exporter;
use super::error::ExportResult;
use super::templates::{FLAGS_FOOTER, FLAGS_HEADER};
use super::{document_id, embedded_records};

/// Writes the flags embedded in records as `Flag.new(...)` literals
pub struct FlagExporter {
    record_type: RecordType,
    label: String,
    dates: FieldIndex,
    serializer: RubySerializer,
}

impl FlagExporter {
    pub fn new(record_type: RecordType) -> Self {
        let mut dates = FieldIndex::default();
        dates.insert("date", FieldKind::Date);
        dates.insert("unflagged_date", FieldKind::Date);
        dates.insert("created_at", FieldKind::DateTime);
        Self {
            record_type,
            label: format!("{} flags", record_type.file_stem()),
            dates,
            serializer: RubySerializer::new(1),
        }
    }
}

impl Exporter for FlagExporter {
    fn label(&self) -> &str {
        &self.label
    }

    fn collection(&self) -> Collection {
        self.record_type.collection()
    }

    fn unit_path(&self, index: usize) -> PathBuf {
        PathBuf::from("flags").join(format!("{}_flags{}.rb", self.record_type.file_stem(), index))
    }

    fn header(&self) -> String {
        FLAGS_HEADER.to_string()
    }

    fn footer(&self) -> String {
        FLAGS_FOOTER.to_string()
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let flags = embedded_records(document, "flags");
        if flags.is_empty() {
            return Ok(Vec::new());
        }

        let record_id = document_id(document, self.record_type.file_stem())?;
        let mut items = Vec::with_capacity(flags.len());
        for mut flag in flags {
            flag.retain(|key, value| !value.is_blank() && key != "id" && key != "unique_id");
            type_fields(&mut flag, &self.dates)?;
            flag.insert("record_id".to_string(), RecordValue::string(&record_id));
            flag.insert(
                "record_type".to_string(),
                RecordValue::string(self.record_type.model_class()),
            );
            items.push(self.serializer.constructor("Flag.new", &flag, ",\n")?);
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
    fn test_render_flags() {
        let source = MemorySource::new();
        let document = SourceDocument::from_value(
            json!({
                "_id": "0123456789abcdef0123456789abcdef",
                "flags": [{
                    "id": "f1",
                    "unique_id": "f1",
                    "message": "Check this",
                    "date": "2019-05-01",
                    "created_at": "2019-05-01T10:11:12Z",
                    "removed": false,
                    "unflagged_date": null
                }]
            }),
            Collection::Child,
            0,
        )
        .unwrap();

        let items = FlagExporter::new(RecordType::Case)
            .render(&document, &source)
            .unwrap();
        assert_eq!(
            items,
            vec![concat!(
                "  Flag.new(\n",
                "    {\n",
                "      message: \"Check this\",\n",
                "      date: Date.parse(\"2019-05-01\"),\n",
                "      created_at: DateTime.parse(\"2019-05-01T10:11:12Z\"),\n",
                "      removed: false,\n",
                "      record_id: \"01234567-89ab-cdef-0123-456789abcdef\",\n",
                "      record_type: \"Child\"\n",
                "    }\n",
                "  ),\n"
            )]
        );
    }

    #[test]
    fn test_record_without_flags_renders_nothing() {
        let source = MemorySource::new();
        let document =
            SourceDocument::from_value(json!({"_id": "abc"}), Collection::Child, 0).unwrap();
        let items = FlagExporter::new(RecordType::Case)
            .render(&document, &source)
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_unit_path_is_per_record_type() {
        let exporter = FlagExporter::new(RecordType::Incident);
        assert_eq!(
            exporter.unit_path(2),
            PathBuf::from("flags/incident_flags2.rb")
        );
    }
}
