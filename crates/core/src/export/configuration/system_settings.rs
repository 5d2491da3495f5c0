//! System settings exporter

use std::path::PathBuf;

use serde_json::Value;

use crate::model::{RangeValue, Record, RecordValue};
use crate::serialize::RubySerializer;
use crate::source::{Collection, RecordSource, SourceDocument};

use super::super::driver::{Exporter, OutputLayout};
use super::super::error::ExportResult;
use super::super::templates::SYSTEM_SETTINGS_CREATE_METHOD;
use super::attributes_except;

const SETTINGS_EXCLUDED: [&str; 7] = [
    "default_locale",
    "locales",
    "primero_version",
    "show_provider_note_field",
    "set_service_implemented_on",
    "reporting_location_config",
    "_attachments",
];

/// Approval labels v2 expects for every locale
pub fn approvals_labels() -> Record {
    [
        ("assessment", "SER"),
        ("case_plan", "Case Plan"),
        ("closure", "Closure"),
        ("action_plan", "Action Plan"),
        ("gbv_closure", "GBV Closure"),
    ]
    .into_iter()
    .map(|(key, label)| (key.to_string(), RecordValue::string(label)))
    .collect()
}

/// Invert `admin_level_map` to `{label: [level]}` and map the reporting
/// admin level to `label_key`
pub fn convert_reporting_location_config(config: &Value) -> RecordValue {
    let Value::Object(attributes) = config else {
        return RecordValue::Null;
    };

    let mut hash: Record = attributes
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "admin_level_map" | "reg_ex_filter" | "label_key"))
        .map(|(key, value)| (key.clone(), RecordValue::from(value.clone())))
        .collect();

    let mut level_map = Record::new();
    if let Some(Value::Object(levels)) = attributes.get("admin_level_map") {
        for (level, label) in levels {
            let label = match label {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            level_map.insert(label, RecordValue::strings([level.clone()]));
        }
    }
    if let Some(admin_level) = attributes.get("admin_level") {
        let level = match admin_level {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let label_key = attributes
            .get("label_key")
            .cloned()
            .map(RecordValue::from)
            .unwrap_or(RecordValue::Null);
        level_map.insert(level, RecordValue::List(vec![label_key]));
    }
    hash.insert("admin_level_map".to_string(), RecordValue::Map(level_map));
    RecordValue::Map(hash)
}

/// Turn `"a..b"` strings under an age range setting into range values
pub fn convert_age_ranges(value: &Value) -> RecordValue {
    match value {
        Value::String(s) => RangeValue::parse(s)
            .map(RecordValue::Range)
            .unwrap_or_else(|| RecordValue::string(s.clone())),
        Value::Array(items) => RecordValue::List(items.iter().map(convert_age_ranges).collect()),
        Value::Object(map) => RecordValue::Map(
            map.iter()
                .map(|(key, value)| (key.clone(), convert_age_ranges(value)))
                .collect(),
        ),
        other => RecordValue::from(other.clone()),
    }
}

/// Writes `system_settings/system_settings.rb`
pub struct SystemSettingsExporter {
    locales: Vec<String>,
    serializer: RubySerializer,
}

impl SystemSettingsExporter {
    pub fn new(locales: Vec<String>) -> Self {
        Self {
            locales,
            serializer: RubySerializer::new(0),
        }
    }

    /// v2 settings hash for the settings document
    pub fn settings_hash(&self, document: &SourceDocument) -> Record {
        let mut hash = attributes_except(document, &SETTINGS_EXCLUDED);
        for key in ["primary_age_range", "age_ranges"] {
            if let Some(value) = document.get(key) {
                hash.insert(key.to_string(), convert_age_ranges(value));
            }
        }
        hash.insert(
            "reporting_location_config".to_string(),
            document
                .get("reporting_location_config")
                .map(convert_reporting_location_config)
                .unwrap_or(RecordValue::Null),
        );
        for locale in &self.locales {
            hash.insert(
                format!("approvals_labels_{locale}"),
                RecordValue::Map(approvals_labels()),
            );
        }
        hash
    }
}

impl Exporter for SystemSettingsExporter {
    fn label(&self) -> &str {
        "system_settings"
    }

    fn collection(&self) -> Collection {
        Collection::SystemSettings
    }

    fn layout(&self) -> OutputLayout {
        OutputLayout::Single
    }

    fn unit_path(&self, _index: usize) -> PathBuf {
        PathBuf::from("system_settings/system_settings.rb")
    }

    fn header(&self) -> String {
        SYSTEM_SETTINGS_CREATE_METHOD.to_string()
    }

    fn footer(&self) -> String {
        String::new()
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let hash = self.settings_hash(document);
        Ok(vec![self.serializer.constructor(
            "create_or_update_system_setting",
            &hash,
            "\n\n",
        )?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    #[test]
    fn test_reporting_location_config() {
        let converted = convert_reporting_location_config(&json!({
            "field_key": "owned_by_location",
            "admin_level": 2,
            "label_key": "district",
            "reg_ex_filter": null,
            "admin_level_map": {"1": "province", "2": "district"}
        }));
        let hash = converted.as_map().unwrap();
        assert_eq!(hash["field_key"], RecordValue::string("owned_by_location"));
        assert!(!hash.contains_key("label_key"));
        assert!(!hash.contains_key("reg_ex_filter"));

        let levels = hash["admin_level_map"].as_map().unwrap();
        assert_eq!(levels["province"], RecordValue::strings(["1"]));
        assert_eq!(levels["district"], RecordValue::strings(["2"]));
        assert_eq!(levels["2"], RecordValue::strings(["district"]));
    }

    #[test]
    fn test_age_ranges() {
        let converted = convert_age_ranges(&json!({"primero": ["0..5", "6..11"], "other": "x"}));
        let map = converted.as_map().unwrap();
        assert_eq!(
            map["primero"],
            RecordValue::List(vec![
                RecordValue::Range(RangeValue::new(0, 5)),
                RecordValue::Range(RangeValue::new(6, 11)),
            ])
        );
        assert_eq!(map["other"], RecordValue::string("x"));

        let exclusive = convert_age_ranges(&json!("0...5"));
        assert_eq!(exclusive, RecordValue::string("0...5"));
    }

    #[test]
    fn test_render_settings() {
        let source = MemorySource::new();
        let document = SourceDocument::from_value(
            json!({
                "_id": "system_settings",
                "default_locale": "en",
                "locales": ["en"],
                "primary_age_range": "primero",
                "age_ranges": {"primero": ["0..5"]},
                "due_date_from_appointment_date": false
            }),
            Collection::SystemSettings,
            0,
        )
        .unwrap();

        let mut exporter = SystemSettingsExporter::new(vec!["en".to_string()]);
        let items = exporter.render(&document, &source).unwrap();
        assert_eq!(
            items[0],
            concat!(
                "create_or_update_system_setting(\n",
                "  {\n",
                "    primary_age_range: \"primero\",\n",
                "    age_ranges: {\n",
                "      primero: [0..5]\n",
                "    },\n",
                "    due_date_from_appointment_date: false,\n",
                "    approvals_labels_en: {\n",
                "      assessment: \"SER\",\n",
                "      case_plan: \"Case Plan\",\n",
                "      closure: \"Closure\",\n",
                "      action_plan: \"Action Plan\",\n",
                "      gbv_closure: \"GBV Closure\"\n",
                "    }\n",
                "  }\n",
                ")\n\n"
            )
        );
        assert!(exporter.header().starts_with("def create_or_update_system_setting"));
    }
}
