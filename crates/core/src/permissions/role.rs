//! Role records

use indexmap::IndexMap;
use serde_json::Value;

use crate::model::{Record, RecordValue};
use crate::normalize::{NormalizeError, NormalizeResult};
use crate::source::{FormCatalog, FormSection, RETIRED_FORMS, SourceDocument};

use super::context::PermissionContext;
use super::{default_dashboard, incident_actions_from_case, rules_for_resource, transform_actions};

const SUPERUSER_ROLE: &str = "role-superuser";
const MODULE_CP: &str = "primeromodule-cp";
const MODULE_GBV: &str = "primeromodule-gbv";
const MODULE_MRM: &str = "primeromodule-mrm";

const DROPPED_ROLE_FIELDS: [&str; 6] = [
    "id",
    "_id",
    "_rev",
    "couchrest-type",
    "permissions_list",
    "permitted_form_ids",
];

/// A role converted for v2
#[derive(Debug, Clone, PartialEq)]
pub struct RoleRecord {
    pub unique_id: String,
    pub record: Record,
    /// The role has no form restrictions and must be linked to every form on load
    pub associate_all_forms: bool,
}

/// One entry of a v1 role's `permissions_list`
#[derive(Debug, Clone, Default, PartialEq)]
struct LegacyPermission {
    resource: String,
    actions: Vec<String>,
    agency_ids: Vec<String>,
    role_ids: Vec<String>,
}

impl LegacyPermission {
    fn from_value(value: &Value) -> Option<Self> {
        let strings = |key: &str| -> Vec<String> {
            value
                .get(key)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default()
        };
        Some(Self {
            resource: value.get("resource")?.as_str()?.to_string(),
            actions: strings("actions"),
            agency_ids: strings("agency_ids"),
            role_ids: strings("role_ids"),
        })
    }
}

/// Modules a role belongs to, derived from its id
pub fn role_modules(role_id: &str, all_modules: &[String]) -> Vec<String> {
    if role_id == SUPERUSER_ROLE {
        return all_modules.to_vec();
    }
    let module = if role_id.contains("gbv") {
        MODULE_GBV
    } else if role_id.contains("mrm") {
        MODULE_MRM
    } else {
        MODULE_CP
    };
    vec![module.to_string()]
}

/// Converts v1 role documents into v2 role records
pub struct RoleTransformer<'a> {
    catalog: &'a FormCatalog,
    all_modules: Vec<String>,
    due_date_from_appointment_date: bool,
}

impl<'a> RoleTransformer<'a> {
    pub fn new(catalog: &'a FormCatalog) -> Self {
        Self {
            catalog,
            all_modules: Vec::new(),
            due_date_from_appointment_date: false,
        }
    }

    /// Module ids granted to the superuser role
    pub fn with_all_modules(mut self, modules: Vec<String>) -> Self {
        self.all_modules = modules;
        self
    }

    pub fn with_due_date_from_appointment_date(mut self, enabled: bool) -> Self {
        self.due_date_from_appointment_date = enabled;
        self
    }

    /// Forms visible to a role: all groups, or only the permitted ones
    fn role_forms(&self, permitted: Option<&[String]>) -> Vec<&FormSection> {
        self.catalog
            .forms_with_subforms()
            .iter()
            .filter(|(unique_id, _)| permitted.is_none_or(|p| p.contains(*unique_id)))
            .flat_map(|(_, forms)| forms.iter())
            .collect()
    }

    fn context(
        &self,
        document: &SourceDocument,
        module_ids: Vec<String>,
        case_actions: Vec<String>,
    ) -> PermissionContext {
        let context = PermissionContext::new()
            .with_permitted_forms(document.string_list("permitted_form_ids"))
            .with_module_ids(module_ids)
            .with_case_actions(case_actions)
            .with_due_date_from_appointment_date(self.due_date_from_appointment_date);
        let context = match document.str_field("group_permission") {
            Some(group) => context.with_group_permission(group),
            None => context,
        };

        let forms = self.role_forms(context.permitted_forms.as_deref());
        let form_ids: Vec<String> = forms.iter().map(|f| f.unique_id.clone()).collect();
        let fields: Vec<String> = forms
            .iter()
            .flat_map(|f| f.visible_field_names())
            .map(str::to_string)
            .collect();
        context.with_form_ids(form_ids).with_visible_fields(fields)
    }

    /// Build the v2 permissions mapping
    fn permissions(&self, permissions: &[LegacyPermission], context: &PermissionContext) -> Record {
        let has_incident = permissions.iter().any(|p| p.resource == "incident");
        let mut result: IndexMap<String, RecordValue> = IndexMap::new();
        let mut objects = Record::new();

        for permission in permissions {
            let actions = match rules_for_resource(&permission.resource) {
                Some(table) => transform_actions(table, &permission.actions, context),
                None => permission.actions.clone(),
            };
            result.insert(permission.resource.clone(), RecordValue::strings(actions));

            if permission.resource == "case"
                && !has_incident
                && context.has_form("incident_details_container")
            {
                result.insert(
                    "incident".to_string(),
                    RecordValue::strings(incident_actions_from_case(&permission.actions)),
                );
            }
            if !permission.agency_ids.is_empty() {
                objects.insert(
                    "agency".to_string(),
                    RecordValue::strings(permission.agency_ids.clone()),
                );
            }
            if !permission.role_ids.is_empty() {
                objects.insert(
                    "role".to_string(),
                    RecordValue::strings(permission.role_ids.clone()),
                );
            }
        }

        if !result.contains_key("dashboard") {
            result.insert(
                "dashboard".to_string(),
                RecordValue::strings(default_dashboard(context)),
            );
        }
        result.insert("objects".to_string(), RecordValue::Map(objects));
        result
    }

    /// Convert one role document
    pub fn transform(&self, document: &SourceDocument) -> NormalizeResult<RoleRecord> {
        let unique_id = document
            .id()
            .ok_or(NormalizeError::MissingField("_id"))?
            .to_string();

        let permissions: Vec<LegacyPermission> = document
            .array_field("permissions_list")
            .iter()
            .filter_map(LegacyPermission::from_value)
            .collect();
        let case_actions = permissions
            .iter()
            .find(|p| p.resource == "case")
            .map(|p| p.actions.clone())
            .unwrap_or_default();

        let module_ids = role_modules(&unique_id, &self.all_modules);
        let context = self.context(document, module_ids.clone(), case_actions);

        let mut record = document.to_record();
        record.retain(|key, _| !DROPPED_ROLE_FIELDS.contains(&key.as_str()));
        record.insert("unique_id".to_string(), RecordValue::string(&unique_id));
        record.insert(
            "is_manager".to_string(),
            RecordValue::Bool(matches!(
                context.group_permission.as_deref(),
                Some("group") | Some("all")
            )),
        );
        record.insert(
            "module_unique_ids".to_string(),
            RecordValue::strings(module_ids),
        );
        record.insert(
            "permissions".to_string(),
            RecordValue::Map(self.permissions(&permissions, &context)),
        );

        let form_read_write = match &context.permitted_forms {
            Some(permitted) => RecordValue::Map(
                permitted
                    .iter()
                    .filter(|f| !RETIRED_FORMS.contains(&f.as_str()))
                    .map(|f| (f.clone(), RecordValue::string("rw")))
                    .collect(),
            ),
            None => RecordValue::Null,
        };
        record.insert("form_section_read_write".to_string(), form_read_write);

        Ok(RoleRecord {
            unique_id,
            record,
            associate_all_forms: context.is_unrestricted(),
        })
    }
}
