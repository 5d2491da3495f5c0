//! Configuration exporters
//!
//! Each configuration collection becomes one script of
//! `Model.create_or_update!(...)` calls rendered at the top level. Form
//! sections are the exception: they are written one file per form group.

mod base;
mod forms;
mod lookups;
mod roles;
mod system_settings;

use std::path::PathBuf;

use crate::model::{Record, RecordValue};
use crate::serialize::RubySerializer;
use crate::source::{Collection, RecordSource, SourceDocument};

use super::driver::{Exporter, OutputLayout};
use super::error::{ExportError, ExportResult};

pub use base::{
    MODULE_OPTION_FIELDS, convert_field_map, form_sections_expr, primero_program_expr,
};
pub use forms::{FormExporter, field_hash, form_hash};
pub use lookups::pdf_header_lookup;
pub use roles::RoleExporter;
pub use system_settings::{
    SystemSettingsExporter, approvals_labels, convert_age_ranges, convert_reporting_location_config,
};

/// Keys of a CouchDB document that never reach a configuration hash
const DOCUMENT_KEYS: [&str; 4] = ["_id", "_rev", "couchrest-type", "id"];

/// Simple configuration collections exported by [`ConfigExporter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    Agency,
    UserGroup,
    PrimeroProgram,
    PrimeroModule,
    Lookup,
}

impl ConfigKind {
    pub const ALL: [ConfigKind; 5] = [
        Self::Agency,
        Self::UserGroup,
        Self::PrimeroProgram,
        Self::PrimeroModule,
        Self::Lookup,
    ];

    pub fn collection(&self) -> Collection {
        match self {
            Self::Agency => Collection::Agency,
            Self::UserGroup => Collection::UserGroup,
            Self::PrimeroProgram => Collection::PrimeroProgram,
            Self::PrimeroModule => Collection::PrimeroModule,
            Self::Lookup => Collection::Lookup,
        }
    }

    fn plural(&self) -> &'static str {
        match self {
            Self::Agency => "agencies",
            Self::UserGroup => "user_groups",
            Self::PrimeroProgram => "primero_programs",
            Self::PrimeroModule => "primero_modules",
            Self::Lookup => "lookups",
        }
    }

    /// Attributes dropped on top of the document keys
    fn excluded(&self) -> &'static [&'static str] {
        match self {
            Self::Agency => &["base_language", "core_resource"],
            Self::UserGroup => &[],
            Self::PrimeroProgram => &["name", "description"],
            Self::PrimeroModule => &[
                "associated_form_ids",
                "field_map",
                "program_id",
                "agency_code_indicator",
                "workflow_status_indicator",
                "allow_searchable_ids",
                "selectable_approval_types",
                "use_workflow_service_implemented",
                "use_workflow_case_plan",
                "use_workflow_assessment",
                "reporting_location_filter",
                "user_group_filter",
            ],
            Self::Lookup => &["base_language", "editable"],
        }
    }

    /// v2 configuration hash for a document of this kind
    pub fn config_hash(&self, document: &SourceDocument) -> ExportResult<Record> {
        let mut hash = attributes_except(document, self.excluded());
        hash.insert("unique_id".to_string(), RecordValue::string(unique_id(document, self)?));

        match self {
            Self::PrimeroProgram => {
                hash.insert("name_en".to_string(), document_value(document, "name"));
                hash.insert(
                    "description_en".to_string(),
                    document_value(document, "description"),
                );
            }
            Self::PrimeroModule => base::module_fields(&mut hash, document),
            Self::Agency | Self::UserGroup | Self::Lookup => {}
        }
        Ok(hash)
    }
}

fn unique_id<'d>(document: &'d SourceDocument, kind: &ConfigKind) -> ExportResult<&'d str> {
    document
        .id()
        .ok_or_else(|| ExportError::invalid_document(kind.collection().file_stem(), "missing _id"))
}

/// Document attributes minus the CouchDB keys and `excluded`
pub fn attributes_except(document: &SourceDocument, excluded: &[&str]) -> Record {
    let mut record = document.to_record();
    record.retain(|key, _| {
        !DOCUMENT_KEYS.contains(&key.as_str()) && !excluded.contains(&key.as_str())
    });
    record
}

fn document_value(document: &SourceDocument, key: &str) -> RecordValue {
    document
        .get(key)
        .cloned()
        .map(RecordValue::from)
        .unwrap_or(RecordValue::Null)
}

/// `Model.create_or_update!(...)`, or `Model.create!(...)` without a unique id
pub fn create_call(
    serializer: &mut RubySerializer,
    model: &str,
    hash: &Record,
) -> ExportResult<String> {
    let has_unique_id = hash.get("unique_id").is_some_and(|v| !v.is_blank());
    let call = if has_unique_id {
        format!("{model}.create_or_update!")
    } else {
        format!("{model}.create!")
    };
    Ok(serializer.constructor(&call, hash, "\n\n")?)
}

/// Exports agencies, user groups, programs, modules or lookups
pub struct ConfigExporter {
    kind: ConfigKind,
    serializer: RubySerializer,
}

impl ConfigExporter {
    pub fn new(kind: ConfigKind) -> Self {
        Self {
            kind,
            serializer: RubySerializer::new(0),
        }
    }
}

impl Exporter for ConfigExporter {
    fn label(&self) -> &str {
        self.kind.plural()
    }

    fn collection(&self) -> Collection {
        self.kind.collection()
    }

    fn layout(&self) -> OutputLayout {
        OutputLayout::Single
    }

    fn unit_path(&self, _index: usize) -> PathBuf {
        let stem = self.kind.collection().file_stem();
        PathBuf::from(self.kind.plural()).join(format!("{stem}.rb"))
    }

    fn header(&self) -> String {
        String::new()
    }

    fn footer(&self) -> String {
        String::new()
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let hash = self.kind.config_hash(document)?;
        let model = self.kind.collection().model_name();
        Ok(vec![create_call(&mut self.serializer, model, &hash)?])
    }

    fn trailing_items(&mut self) -> ExportResult<Vec<String>> {
        if self.kind != ConfigKind::Lookup {
            return Ok(Vec::new());
        }
        Ok(vec![create_call(
            &mut self.serializer,
            "Lookup",
            &pdf_header_lookup(),
        )?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    fn document(collection: Collection, value: serde_json::Value) -> SourceDocument {
        SourceDocument::from_value(value, collection, 0).unwrap()
    }

    #[test]
    fn test_agency_script() {
        let source = MemorySource::new();
        let mut exporter = ConfigExporter::new(ConfigKind::Agency);
        let items = exporter
            .render(
                &document(
                    Collection::Agency,
                    json!({
                        "_id": "agency-unicef",
                        "_rev": "1-a",
                        "couchrest-type": "Agency",
                        "name_en": "UNICEF",
                        "agency_code": "UN",
                        "base_language": "en",
                        "core_resource": true
                    }),
                ),
                &source,
            )
            .unwrap();
        assert_eq!(
            items[0],
            concat!(
                "Agency.create_or_update!(\n",
                "  {\n",
                "    name_en: \"UNICEF\",\n",
                "    agency_code: \"UN\",\n",
                "    unique_id: \"agency-unicef\"\n",
                "  }\n",
                ")\n\n"
            )
        );
    }

    #[test]
    fn test_program_renames_name_and_description() {
        let hash = ConfigKind::PrimeroProgram
            .config_hash(&document(
                Collection::PrimeroProgram,
                json!({"_id": "primeroprogram-primero", "name": "Primero", "description": "Default"}),
            ))
            .unwrap();
        let keys: Vec<&str> = hash.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["unique_id", "name_en", "description_en"]);
        assert_eq!(hash["name_en"], RecordValue::string("Primero"));
    }

    #[test]
    fn test_create_without_unique_id() {
        let mut serializer = RubySerializer::new(0);
        let mut hash = Record::new();
        hash.insert("name".to_string(), RecordValue::string("x"));
        let out = create_call(&mut serializer, "ContactInformation", &hash).unwrap();
        assert!(out.starts_with("ContactInformation.create!(\n"));
    }

    #[test]
    fn test_lookups_end_with_pdf_header() {
        let mut exporter = ConfigExporter::new(ConfigKind::Lookup);
        let trailing = exporter.trailing_items().unwrap();
        assert_eq!(trailing.len(), 1);
        assert!(trailing[0].contains("unique_id: \"lookup-pdf-header\""));
        assert_eq!(exporter.unit_path(0), PathBuf::from("lookups/lookup.rb"));

        let mut agencies = ConfigExporter::new(ConfigKind::Agency);
        assert!(agencies.trailing_items().unwrap().is_empty());
        assert_eq!(agencies.unit_path(0), PathBuf::from("agencies/agency.rb"));
    }

    #[test]
    fn test_document_without_id_fails() {
        let result = ConfigKind::UserGroup
            .config_hash(&document(Collection::UserGroup, json!({"name": "Group"})));
        assert!(result.is_err());
    }
}
