//! Location exporter

use std::path::PathBuf;

use serde_json::Value;

use crate::serialize::escape_ruby_string;
use crate::source::{Collection, RecordSource, SourceDocument};

use super::driver::{Exporter, OutputLayout};
use super::error::{ExportError, ExportResult};
use super::templates::{LOCATIONS_FOOTER, LOCATIONS_HEADER};

/// Writes `locations/locations.rb`
///
/// Locations are written in source order, which the loader expects to be
/// by admin level so parents precede children.
pub struct LocationExporter {
    locales: Vec<String>,
}

impl LocationExporter {
    pub fn new(locales: Vec<String>) -> Self {
        Self { locales }
    }

    fn placenames(&self, location: &SourceDocument) -> ExportResult<String> {
        let mut names = Vec::new();
        for locale in &self.locales {
            if let Some(name) = location.str_field(&format!("placename_{locale}")) {
                names.push(format!("\"{locale}\": {}", escape_ruby_string(name)?));
            }
        }
        if names.is_empty() {
            return Ok("{}".to_string());
        }
        Ok(format!("{{ {} }}", names.join(", ")))
    }
}

impl Exporter for LocationExporter {
    fn label(&self) -> &str {
        "locations"
    }

    fn collection(&self) -> Collection {
        Collection::Location
    }

    fn layout(&self) -> OutputLayout {
        OutputLayout::Single
    }

    fn unit_path(&self, _index: usize) -> PathBuf {
        PathBuf::from("locations/locations.rb")
    }

    fn header(&self) -> String {
        LOCATIONS_HEADER.to_string()
    }

    fn footer(&self) -> String {
        LOCATIONS_FOOTER.to_string()
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let code = document
            .str_field("location_code")
            .ok_or_else(|| ExportError::invalid_document("location", "missing location_code"))?;
        let admin_level = match document.get("admin_level") {
            Some(Value::Number(n)) => n.to_string(),
            _ => "nil".to_string(),
        };
        let mut path = document.string_list("hierarchy");
        path.push(code.to_string());

        Ok(vec![format!(
            "  Location.new(placename_i18n: {}, location_code: {}, admin_level: {}, type: {}, hierarchy_path: {}),\n",
            self.placenames(document)?,
            escape_ruby_string(code)?,
            admin_level,
            escape_ruby_string(document.str_field("type").unwrap_or(""))?,
            escape_ruby_string(&path.join("."))?,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    fn location(value: Value) -> SourceDocument {
        SourceDocument::from_value(value, Collection::Location, 0).unwrap()
    }

    #[test]
    fn test_render_location() {
        let source = MemorySource::new();
        let mut exporter = LocationExporter::new(vec!["en".to_string(), "fr".to_string()]);
        let items = exporter
            .render(
                &location(json!({
                    "location_code": "GUI01",
                    "admin_level": 1,
                    "type": "province",
                    "placename_en": "Boke",
                    "placename_fr": "Boké",
                    "hierarchy": ["GUI"]
                })),
                &source,
            )
            .unwrap();
        assert_eq!(
            items[0],
            "  Location.new(placename_i18n: { \"en\": \"Boke\", \"fr\": \"Boké\" }, location_code: \"GUI01\", admin_level: 1, type: \"province\", hierarchy_path: \"GUI.GUI01\"),\n"
        );
    }

    #[test]
    fn test_missing_placenames_and_level() {
        let source = MemorySource::new();
        let mut exporter = LocationExporter::new(vec!["en".to_string(), "fr".to_string()]);
        let items = exporter
            .render(
                &location(json!({"location_code": "GUI", "type": "country", "placename_fr": "Guinée"})),
                &source,
            )
            .unwrap();
        assert!(items[0].contains("placename_i18n: { \"fr\": \"Guinée\" }"));
        assert!(items[0].contains("admin_level: nil"));
        assert!(items[0].contains("hierarchy_path: \"GUI\""));
    }

    #[test]
    fn test_location_without_code_fails() {
        let source = MemorySource::new();
        let mut exporter = LocationExporter::new(vec!["en".to_string()]);
        assert!(exporter.render(&location(json!({"type": "country"})), &source).is_err());
    }
}
