//! Module configuration helpers

use serde_json::Value;

use crate::model::{Record, RecordValue};
use crate::source::{RETIRED_FORMS, SourceDocument};

/// Module attributes collected into `module_options`
pub const MODULE_OPTION_FIELDS: [&str; 9] = [
    "agency_code_indicator",
    "workflow_status_indicator",
    "allow_searchable_ids",
    "selectable_approval_types",
    "use_workflow_service_implemented",
    "use_workflow_case_plan",
    "use_workflow_assessment",
    "reporting_location_filter",
    "user_group_filter",
];

/// Keep only field mappings that do not come from incident details
///
/// Each mapping's `source` path collapses to its last element.
pub fn convert_field_map(field_map: &Value) -> RecordValue {
    let Value::Object(map) = field_map else {
        return RecordValue::from(field_map.clone());
    };

    let mut converted: Record = map
        .iter()
        .map(|(k, v)| (k.clone(), RecordValue::from(v.clone())))
        .collect();
    let fields: Vec<RecordValue> = map
        .get("fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|field| {
                    let source = field.get("source")?.as_array()?;
                    if source.first().and_then(Value::as_str) == Some("incident_details") {
                        return None;
                    }
                    let mut entry = Record::new();
                    entry.insert(
                        "source".to_string(),
                        source.last().cloned().map(RecordValue::from).unwrap_or(RecordValue::Null),
                    );
                    entry.insert(
                        "target".to_string(),
                        field.get("target").cloned().map(RecordValue::from).unwrap_or(RecordValue::Null),
                    );
                    Some(RecordValue::Map(entry))
                })
                .collect()
        })
        .unwrap_or_default();
    converted.insert("fields".to_string(), RecordValue::List(fields));
    RecordValue::Map(converted)
}

/// `FormSection.where(unique_id: %w[a b])` for the non-retired forms
pub fn form_sections_expr(form_ids: &[String]) -> RecordValue {
    let ids: Vec<&str> = form_ids
        .iter()
        .map(String::as_str)
        .filter(|id| !RETIRED_FORMS.contains(id))
        .collect();
    RecordValue::expr(format!("FormSection.where(unique_id: %w[{}])", ids.join(" ")))
}

pub fn primero_program_expr(program_id: &str) -> RecordValue {
    RecordValue::expr(format!("PrimeroProgram.find_by(unique_id: '{program_id}')"))
}

/// Add the derived module attributes
pub(super) fn module_fields(hash: &mut Record, document: &SourceDocument) {
    if let Some(field_map) = document.get("field_map") {
        hash.insert("field_map".to_string(), convert_field_map(field_map));
    }

    let options: Record = MODULE_OPTION_FIELDS
        .iter()
        .map(|field| {
            let value = document
                .get(field)
                .cloned()
                .map(RecordValue::from)
                .unwrap_or(RecordValue::Null);
            (field.to_string(), value)
        })
        .collect();
    hash.insert("module_options".to_string(), RecordValue::Map(options));

    hash.insert(
        "form_sections".to_string(),
        form_sections_expr(&document.string_list("associated_form_ids")),
    );
    if let Some(program_id) = document.str_field("program_id") {
        hash.insert("primero_program".to_string(), primero_program_expr(program_id));
    }
}
