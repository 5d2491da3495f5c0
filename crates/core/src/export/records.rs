//! Record data exporter

use std::path::PathBuf;

use crate::model::RecordType;
use crate::normalize::RecordNormalizer;
use crate::serialize::{
    JSON_ARRAY_FOOTER, JSON_ARRAY_HEADER, JSON_ARRAY_SEPARATOR, RubySerializer,
    pretty_array_item, record_to_json,
};
use crate::source::{Collection, FormCatalog, RecordSource, SourceDocument};

use super::config::OutputFormat;
use super::driver::Exporter;
use super::error::ExportResult;
use super::templates::{RECORDS_FOOTER, RECORDS_HEADER};

/// Writes normalized cases, incidents or tracing requests
pub struct RecordExporter<'a> {
    record_type: RecordType,
    format: OutputFormat,
    normalizer: RecordNormalizer<'a>,
    serializer: RubySerializer,
}

impl<'a> RecordExporter<'a> {
    pub fn new(record_type: RecordType, catalog: &'a FormCatalog, format: OutputFormat) -> Self {
        Self {
            record_type,
            format,
            normalizer: RecordNormalizer::new(catalog),
            serializer: RubySerializer::new(1),
        }
    }
}

impl Exporter for RecordExporter<'_> {
    fn label(&self) -> &str {
        self.record_type.file_stem()
    }

    fn collection(&self) -> Collection {
        self.record_type.collection()
    }

    fn unit_path(&self, index: usize) -> PathBuf {
        PathBuf::from(self.record_type.plural()).join(format!(
            "{}{}.{}",
            self.record_type.file_stem(),
            index,
            self.format.extension()
        ))
    }

    fn header(&self) -> String {
        match self.format {
            OutputFormat::Script => RECORDS_HEADER.to_string(),
            OutputFormat::Json => JSON_ARRAY_HEADER.to_string(),
        }
    }

    fn footer(&self) -> String {
        match self.format {
            OutputFormat::Script => RECORDS_FOOTER.to_string(),
            OutputFormat::Json => JSON_ARRAY_FOOTER.to_string(),
        }
    }

    fn item_separator(&self) -> &str {
        match self.format {
            OutputFormat::Script => "",
            OutputFormat::Json => JSON_ARRAY_SEPARATOR,
        }
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let record = self.normalizer.normalize(self.record_type, document)?.to_record();
        let item = match self.format {
            OutputFormat::Script => {
                let call = format!("{}.new", self.record_type.model_class());
                self.serializer.constructor(&call, &record, ",\n")?
            }
            OutputFormat::Json => pretty_array_item(&record_to_json(&record)?)?,
        };
        Ok(vec![item])
    }
}
