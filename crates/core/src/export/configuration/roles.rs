//! Role exporter

use std::path::PathBuf;

use crate::permissions::RoleTransformer;
use crate::serialize::RubySerializer;
use crate::source::{Collection, RecordSource, SourceDocument};

use super::super::driver::{Exporter, OutputLayout};
use super::super::error::ExportResult;
use super::create_call;

/// Writes `roles/role.rb`
///
/// Roles without form restrictions are followed by a call linking them to
/// every form once the forms are loaded.
pub struct RoleExporter<'a> {
    transformer: RoleTransformer<'a>,
    serializer: RubySerializer,
}

impl<'a> RoleExporter<'a> {
    pub fn new(transformer: RoleTransformer<'a>) -> Self {
        Self {
            transformer,
            serializer: RubySerializer::new(0),
        }
    }
}

impl Exporter for RoleExporter<'_> {
    fn label(&self) -> &str {
        "roles"
    }

    fn collection(&self) -> Collection {
        Collection::Role
    }

    fn layout(&self) -> OutputLayout {
        OutputLayout::Single
    }

    fn unit_path(&self, _index: usize) -> PathBuf {
        PathBuf::from("roles/role.rb")
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
        let role = self.transformer.transform(document)?;
        let mut script = create_call(&mut self.serializer, "Role", &role.record)?;
        if role.associate_all_forms {
            script.push_str(&format!(
                "Role.find_by(unique_id: '{}')&.associate_all_forms\n\n",
                role.unique_id
            ));
        }
        Ok(vec![script])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FormCatalog, MemorySource};
    use serde_json::json;

    fn role(value: serde_json::Value) -> SourceDocument {
        SourceDocument::from_value(value, Collection::Role, 0).unwrap()
    }

    #[test]
    fn test_unrestricted_role_is_associated_with_all_forms() {
        let catalog = FormCatalog::new(Vec::new());
        let source = MemorySource::new();
        let mut exporter = RoleExporter::new(RoleTransformer::new(&catalog));
        let items = exporter
            .render(
                &role(json!({
                    "_id": "role-cp-case-worker",
                    "name": "CP Case Worker",
                    "group_permission": "self",
                    "permissions_list": [{"resource": "case", "actions": ["read"]}]
                })),
                &source,
            )
            .unwrap();
        assert!(items[0].starts_with("Role.create_or_update!(\n  {\n    name: \"CP Case Worker\",\n"));
        assert!(!items[0].contains("form_section_read_write"));
        assert!(items[0].ends_with(
            ")\n\nRole.find_by(unique_id: 'role-cp-case-worker')&.associate_all_forms\n\n"
        ));
    }

    #[test]
    fn test_restricted_role_lists_its_forms() {
        let catalog = FormCatalog::new(Vec::new());
        let source = MemorySource::new();
        let mut exporter = RoleExporter::new(RoleTransformer::new(&catalog));
        let items = exporter
            .render(
                &role(json!({
                    "_id": "role-gbv-worker",
                    "permitted_form_ids": ["gbv_survivor", "approvals"],
                    "permissions_list": []
                })),
                &source,
            )
            .unwrap();
        assert!(items[0].contains("    form_section_read_write: {\n      gbv_survivor: \"rw\"\n    }"));
        assert!(!items[0].contains("associate_all_forms"));
        assert!(items[0].contains("module_unique_ids: [\n      \"primeromodule-gbv\"\n    ]"));
    }
}
