//! Record history exporter

use std::path::PathBuf;

use tracing::error;

use crate::model::{Record, RecordType, RecordValue, parse_datetime};
use crate::normalize::NormalizeError;
use crate::serialize::{RubySerializer, escape_ruby_string};
use crate::source::{Collection, RecordSource, SourceDocument};

use super::driver::Exporter;
use super::error::ExportResult;
use super::templates::{HISTORIES_FOOTER, HISTORIES_HEADER};
use super::{document_id, embedded_records};

/// Writes record histories as `RecordHistory.new(...)` literals
///
/// A history entry that cannot be rendered is logged and skipped; the other
/// entries of the record are still written.
pub struct HistoryExporter {
    record_type: RecordType,
    label: String,
    changes: RubySerializer,
}

impl HistoryExporter {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            label: format!("{} histories", record_type.file_stem()),
            changes: RubySerializer::new(2).with_include_blank(true),
        }
    }

    fn history_literal(&mut self, history: &Record, record_id: &str) -> ExportResult<String> {
        let text = |key: &str| history.get(key).and_then(RecordValue::as_str).unwrap_or("");

        let raw = text("datetime");
        let datetime = parse_datetime(raw).ok_or_else(|| NormalizeError::InvalidDateTime {
            field: "datetime".to_string(),
            value: raw.to_string(),
        })?;
        let changes = self
            .changes
            .value(history.get("changes").unwrap_or(&RecordValue::Null))?;

        Ok([
            "  RecordHistory.new(".to_string(),
            format!("    record_id: {},", escape_ruby_string(record_id)?),
            format!(
                "    record_type: {},",
                escape_ruby_string(self.record_type.model_class())?
            ),
            format!(
                "    datetime: DateTime.parse(\"{}\"),",
                datetime.format("%Y-%m-%dT%H:%M:%SZ")
            ),
            format!("    user_name: {},", escape_ruby_string(text("user_name"))?),
            format!("    action: {},", escape_ruby_string(text("action"))?),
            format!("    record_changes: {changes}"),
            "  ),\n".to_string(),
        ]
        .join("\n"))
    }
}

impl Exporter for HistoryExporter {
    fn label(&self) -> &str {
        &self.label
    }

    fn collection(&self) -> Collection {
        self.record_type.collection()
    }

    fn unit_path(&self, index: usize) -> PathBuf {
        PathBuf::from("record_histories").join(format!(
            "{}_record_history{}.rb",
            self.record_type.file_stem(),
            index
        ))
    }

    fn header(&self) -> String {
        HISTORIES_HEADER.to_string()
    }

    fn footer(&self) -> String {
        HISTORIES_FOOTER.to_string()
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let histories = embedded_records(document, "histories");
        if histories.is_empty() {
            return Ok(Vec::new());
        }

        let record_id = document_id(document, self.record_type.file_stem())?;
        let mut items = Vec::with_capacity(histories.len());
        for (position, history) in histories.iter().enumerate() {
            match self.history_literal(history, &record_id) {
                Ok(item) => items.push(item),
                Err(e) => error!(
                    record_type = %self.record_type,
                    record_id = %record_id,
                    history = position,
                    error = %e,
                    "Failed to export history"
                ),
            }
        }
        Ok(items)
    }
}
