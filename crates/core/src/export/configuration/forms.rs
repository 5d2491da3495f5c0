//! Form section exporter

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use tracing::{error, info, info_span};

use crate::model::{Record, RecordValue};
use crate::normalize::form_field_name;
use crate::serialize::RubySerializer;
use crate::source::{FormCatalog, FormSection};

use super::super::error::ExportResult;
use super::super::stats::ExportStats;
use super::super::unit::OutputUnit;
use super::{attributes_except, create_call};

const FORM_EXCLUDED: [&str; 8] = [
    "fields",
    "base_language",
    "collapsed_fields",
    "fixed_order",
    "perm_visible",
    "perm_enabled",
    "validations",
    "_attachments",
];

const FIELD_EXCLUDED: [&str; 7] = [
    "id",
    "highlight_information",
    "base_language",
    "deletable",
    "searchable_select",
    "create_property",
    "subform_section_id",
];

/// v2 hash for one field of a form
pub fn field_hash(field: &Value, form_unique_id: &str, collapsed_fields: &[String]) -> Record {
    let mut hash: Record = match field {
        Value::Object(attributes) => attributes
            .iter()
            .filter(|(key, _)| !FIELD_EXCLUDED.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), RecordValue::from(value.clone())))
            .collect(),
        _ => return Record::new(),
    };
    let text = |key: &str| field.get(key).and_then(Value::as_str).unwrap_or("");
    let name = text("name");
    let field_type = text("type");

    if collapsed_fields.iter().any(|f| f == name) {
        hash.insert(
            "collapsed_field_for_subform_unique_id".to_string(),
            RecordValue::string(form_unique_id),
        );
    }
    if field_type == "subform" {
        hash.insert(
            "subform_unique_id".to_string(),
            field
                .get("subform_section_id")
                .cloned()
                .map(RecordValue::from)
                .unwrap_or(RecordValue::Null),
        );
    }
    if field_type.contains("upload_box") {
        hash.insert("disabled".to_string(), RecordValue::Bool(false));
    }
    let source = text("option_strings_source");
    if source.contains("use_api") {
        let first = source.split(' ').next().unwrap_or(source);
        hash.insert("option_strings_source".to_string(), RecordValue::string(first));
    }
    if !name.is_empty() {
        hash.insert(
            "name".to_string(),
            RecordValue::string(form_field_name(name, form_unique_id)),
        );
    }
    hash
}

/// v2 hash for a form, including its fields
pub fn form_hash(form: &FormSection) -> Record {
    let mut hash = attributes_except(&form.document, &FORM_EXCLUDED);
    hash.insert("visible".to_string(), RecordValue::Bool(form.visible));

    let collapsed = form.document.string_list("collapsed_fields");
    let fields = form
        .document
        .array_field("fields")
        .iter()
        .map(|field| RecordValue::Map(field_hash(field, &form.unique_id, &collapsed)))
        .collect();
    hash.insert("fields_attributes".to_string(), RecordValue::List(fields));
    hash
}

/// Writes one script per form group under `forms/<parent form>/`
pub struct FormExporter<'a> {
    catalog: &'a FormCatalog,
    serializer: RubySerializer,
}

impl<'a> FormExporter<'a> {
    pub fn new(catalog: &'a FormCatalog) -> Self {
        Self {
            catalog,
            serializer: RubySerializer::new(0),
        }
    }

    /// Path of a group's script, named after its last form
    pub fn group_path(group: &[FormSection]) -> Option<PathBuf> {
        let last = group.last()?;
        Some(
            PathBuf::from("forms")
                .join(&last.parent_form)
                .join(format!("{}.rb", last.unique_id)),
        )
    }

    /// Export every form group
    pub fn run(&mut self, export_dir: &Path) -> ExportResult<ExportStats> {
        let _span = info_span!("export", exporter = "forms").entered();
        let start = Instant::now();
        let mut stats = ExportStats::new("forms");

        for group in self.catalog.forms_with_subforms().values() {
            let Some(relative) = Self::group_path(group) else {
                continue;
            };

            let mut items = Vec::with_capacity(group.len());
            for form in group {
                stats.documents_read += 1;
                match create_call(&mut self.serializer, "FormSection", &form_hash(form)) {
                    Ok(item) => {
                        stats.records_exported += 1;
                        items.push(item);
                    }
                    Err(e) => {
                        error!(
                            record_type = "form_section",
                            record_id = %form.unique_id,
                            error = %e,
                            "Failed to export record"
                        );
                        stats.records_failed += 1;
                        stats.add_error(format!("form_section {}: {}", form.unique_id, e));
                    }
                }
            }
            if items.is_empty() {
                continue;
            }

            let path = export_dir.join(relative);
            let mut unit = OutputUnit::open(&path, "")?;
            for item in &items {
                unit.write_item(item)?;
            }
            stats.items_written += unit.close()?;
            info!(forms = items.len(), unit = %path.display(), "Wrote form group");
            stats.units.push(path);
        }

        stats.duration = start.elapsed();
        info!(
            forms = stats.records_exported,
            failed = stats.records_failed,
            units = stats.units.len(),
            "Export complete"
        );
        Ok(stats)
    }
}
