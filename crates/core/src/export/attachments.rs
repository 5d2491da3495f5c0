//! Case attachment exporter
//!
//! Copies photo and document attachments out of the store into
//! `cases-attachments/<record id>/<form>/<file>` and writes a script per batch
//! that attaches each copied file to its record.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::model::{RecordType, parse_date};
use crate::normalize::NormalizeError;
use crate::serialize::escape_ruby_string;
use crate::source::{Collection, RecordSource, SourceDocument, detect_attachment_type};

use super::document_id;
use super::driver::Exporter;
use super::error::{ExportError, ExportResult};
use super::templates::ATTACHMENTS_HEADER;
use super::unit::write_file;

const ATTACHMENTS_DIR: &str = "cases-attachments";

/// Case attachment fields, in export order
pub const ATTACHMENT_FORMS: [&str; 4] = ["photo_keys", "bia_documents", "bid_documents", "other_documents"];

/// v2 field name for a v1 attachment field
pub fn attachment_field_name(form: &str) -> Option<&'static str> {
    match form {
        "audio_attachments" => Some("recorded_audio"),
        "photo_keys" => Some("current_photo_key"),
        "bia_documents" => Some("upload_bia_document"),
        "bid_documents" => Some("upload_bid_document"),
        "other_documents" => Some("other_documents"),
        _ => None,
    }
}

/// One file attached to a case field
#[derive(Debug, Clone, PartialEq)]
struct AttachedFile {
    key: String,
    file_name: String,
    date: Option<String>,
    comments: Option<String>,
    is_current: bool,
    description: Option<String>,
}

impl AttachedFile {
    /// Photo keys are bare strings, documents are objects keyed by `attachment_key`
    fn from_value(value: &Value) -> Option<Self> {
        if let Some(key) = value.as_str() {
            return Some(Self {
                key: key.to_string(),
                file_name: key.to_string(),
                date: None,
                comments: None,
                is_current: false,
                description: None,
            });
        }

        let text = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let key = text("attachment_key")?;
        Some(Self {
            file_name: text("file_name").unwrap_or_else(|| key.clone()),
            date: text("date"),
            comments: text("comments"),
            is_current: value.get("is_current").and_then(Value::as_bool).unwrap_or(false),
            description: text("document_description"),
            key,
        })
    }
}

/// Final component of an attachment file name, so the copy stays inside its form folder
fn stored_file_name(file_name: &str) -> ExportResult<&str> {
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .ok_or_else(|| {
            ExportError::invalid_document("case", format!("unusable attachment file name '{file_name}'"))
        })
}

/// Exports case attachments and the scripts that load them
pub struct AttachmentExporter {
    folder: PathBuf,
}

impl AttachmentExporter {
    /// Create an exporter writing under `export_dir`
    pub fn new(export_dir: &Path) -> Self {
        Self {
            folder: export_dir.join(ATTACHMENTS_DIR),
        }
    }

    fn attach_literal(
        &self,
        record_id: &str,
        form: &str,
        file: &AttachedFile,
        file_name: &str,
        path: &Path,
        bytes: &[u8],
    ) -> ExportResult<String> {
        let attachment_type = detect_attachment_type(bytes);
        let optional = |value: &Option<String>| -> ExportResult<String> {
            match value {
                Some(v) => Ok(escape_ruby_string(v)?),
                None => Ok("nil".to_string()),
            }
        };

        let mut lines = vec![
            format!("puts 'Inserting \"{attachment_type}\" to {record_id}'"),
            format!(
                "attachment = Attachment.new(record_type: {}, record_id: {}, file_name: {}, comments: {}, is_current: {}, description: {})",
                escape_ruby_string(RecordType::Case.model_class())?,
                escape_ruby_string(record_id)?,
                escape_ruby_string(file_name)?,
                optional(&file.comments)?,
                file.is_current,
                optional(&file.description)?,
            ),
        ];
        if let Some(raw) = &file.date {
            let date = parse_date(raw).ok_or_else(|| NormalizeError::InvalidDate {
                field: format!("{form}.date"),
                value: raw.clone(),
            })?;
            lines.push(format!("attachment.date = \"{}\"", date.format("%Y-%m-%d")));
        }
        lines.push(format!("attachment.record_type = {}", RecordType::Case.model_class()));
        lines.push(format!("attachment.attachment_type = '{attachment_type}'"));
        lines.push(format!(
            "attachment.field_name = '{}'",
            attachment_field_name(form).unwrap_or(form)
        ));
        lines.push(format!(
            "attachment.file.attach(io: File.open({}), filename: {})",
            escape_ruby_string(&path.display().to_string())?,
            escape_ruby_string(file_name)?
        ));
        lines.push("attachment.save!\n\n\n".to_string());
        Ok(lines.join("\n"))
    }
}

impl Exporter for AttachmentExporter {
    fn label(&self) -> &str {
        "case attachments"
    }

    fn collection(&self) -> Collection {
        Collection::Child
    }

    fn unit_path(&self, index: usize) -> PathBuf {
        PathBuf::from(ATTACHMENTS_DIR).join(format!("cases.{}.rb", index + 1))
    }

    fn header(&self) -> String {
        ATTACHMENTS_HEADER.to_string()
    }

    fn footer(&self) -> String {
        String::new()
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let has_attachments = matches!(
            document.get("_attachments"),
            Some(Value::Object(entries)) if !entries.is_empty()
        );
        if !has_attachments {
            return Ok(Vec::new());
        }

        let record_id = document_id(document, "case")?;
        let mut items = Vec::new();
        for form in ATTACHMENT_FORMS {
            let files: Vec<AttachedFile> = document
                .array_field(form)
                .iter()
                .filter_map(AttachedFile::from_value)
                .collect();
            if files.is_empty() {
                continue;
            }

            info!(form, record_id = %record_id, files = files.len(), "Exporting attachments");
            for file in &files {
                let file_name = stored_file_name(&file.file_name)?;
                let bytes = source.fetch_attachment(document, &file.key)?;
                let path = self.folder.join(&record_id).join(form).join(file_name);
                write_file(&path, &bytes)?;
                items.push(self.attach_literal(&record_id, form, file, file_name, &path, &bytes)?);
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const ID: &str = "0123456789abcdef0123456789abcdef";
    const CANONICAL: &str = "01234567-89ab-cdef-0123-456789abcdef";

    fn case() -> SourceDocument {
        SourceDocument::from_value(
            json!({
                "_id": ID,
                "_attachments": {"photo1": {}, "doc1": {}},
                "photo_keys": ["photo1"],
                "other_documents": [{
                    "attachment_key": "doc1",
                    "file_name": "report.pdf",
                    "date": "2021-03-04",
                    "is_current": true,
                    "document_description": "Report"
                }]
            }),
            Collection::Child,
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_field_names() {
        assert_eq!(attachment_field_name("photo_keys"), Some("current_photo_key"));
        assert_eq!(attachment_field_name("bia_documents"), Some("upload_bia_document"));
        assert_eq!(attachment_field_name("unknown"), None);
    }

    #[test]
    fn test_render_copies_files_and_scripts_them() {
        let dir = TempDir::new().unwrap();
        let source = MemorySource::new()
            .with_attachment(ID, "photo1", b"\xFF\xD8\xFF\xE0jpeg".to_vec())
            .with_attachment(ID, "doc1", b"%PDF-1.4".to_vec());
        let mut exporter = AttachmentExporter::new(dir.path());

        let items = exporter.render(&case(), &source).unwrap();
        assert_eq!(items.len(), 2);

        let photo = dir
            .path()
            .join(ATTACHMENTS_DIR)
            .join(CANONICAL)
            .join("photo_keys/photo1");
        assert_eq!(fs::read(&photo).unwrap(), b"\xFF\xD8\xFF\xE0jpeg".to_vec());
        assert!(items[0].starts_with(&format!("puts 'Inserting \"image\" to {CANONICAL}'")));
        assert!(items[0].contains("attachment.field_name = 'current_photo_key'"));
        assert!(items[0].ends_with("attachment.save!\n\n\n"));

        assert!(items[1].contains("attachment.attachment_type = 'document'"));
        assert!(items[1].contains("attachment.date = \"2021-03-04\""));
        assert!(items[1].contains("is_current: true, description: \"Report\""));
        assert!(items[1].contains("filename: \"report.pdf\")"));
    }

    #[test]
    fn test_record_without_attachments_is_skipped() {
        let dir = TempDir::new().unwrap();
        let source = MemorySource::new();
        let document =
            SourceDocument::from_value(json!({"_id": ID, "photo_keys": ["p"]}), Collection::Child, 0)
                .unwrap();
        let items = AttachmentExporter::new(dir.path())
            .render(&document, &source)
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_missing_attachment_fails_the_record_only() {
        let dir = TempDir::new().unwrap();
        let source = MemorySource::new();
        let err = AttachmentExporter::new(dir.path())
            .render(&case(), &source)
            .unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_stored_file_name_keeps_last_component() {
        assert_eq!(stored_file_name("report.pdf").unwrap(), "report.pdf");
        assert_eq!(stored_file_name("/etc/cron.d/report.pdf").unwrap(), "report.pdf");
        assert_eq!(stored_file_name("../../report.pdf").unwrap(), "report.pdf");
        assert!(stored_file_name("..").is_err());
        assert!(stored_file_name("docs/..").is_err());
        assert!(stored_file_name("").is_err());
        assert!(stored_file_name("/").is_err());
    }

    #[test]
    fn test_file_names_cannot_leave_the_export_dir() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let escaped = outside.path().join("escaped.pdf");
        let source = MemorySource::new().with_attachment(ID, "doc1", b"%PDF-1.4".to_vec());
        let document = SourceDocument::from_value(
            json!({
                "_id": ID,
                "_attachments": {"doc1": {}},
                "other_documents": [{
                    "attachment_key": "doc1",
                    "file_name": escaped.display().to_string()
                }]
            }),
            Collection::Child,
            0,
        )
        .unwrap();

        let items = AttachmentExporter::new(dir.path())
            .render(&document, &source)
            .unwrap();
        assert!(!escaped.exists());
        let copied = dir
            .path()
            .join(ATTACHMENTS_DIR)
            .join(CANONICAL)
            .join("other_documents/escaped.pdf");
        assert!(copied.is_file());
        assert!(items[0].contains("filename: \"escaped.pdf\")"));
    }

    #[test]
    fn test_parent_dir_file_name_fails_the_record() {
        let dir = TempDir::new().unwrap();
        let source = MemorySource::new().with_attachment(ID, "doc1", b"%PDF-1.4".to_vec());
        let document = SourceDocument::from_value(
            json!({
                "_id": ID,
                "_attachments": {"doc1": {}},
                "other_documents": [{"attachment_key": "doc1", "file_name": ".."}]
            }),
            Collection::Child,
            0,
        )
        .unwrap();

        let err = AttachmentExporter::new(dir.path())
            .render(&document, &source)
            .unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("unusable attachment file name"));
    }

    #[test]
    fn test_unit_path_starts_at_one() {
        let exporter = AttachmentExporter::new(Path::new("out"));
        assert_eq!(exporter.unit_path(0), PathBuf::from("cases-attachments/cases.1.rb"));
    }
}
