//! Role context for permission rules

use std::collections::HashSet;

/// Everything a permission rule may look at besides the resource's own actions
#[derive(Debug, Clone, Default)]
pub struct PermissionContext {
    /// Forms the role is restricted to; `None` means unrestricted
    pub permitted_forms: Option<Vec<String>>,
    pub group_permission: Option<String>,
    pub module_ids: Vec<String>,
    /// Legacy actions of the role's case permission
    pub case_actions: Vec<String>,
    /// Unique ids of the forms (and subforms) the role can see
    pub form_ids: HashSet<String>,
    /// Names of visible fields on those forms
    pub visible_fields: HashSet<String>,
    pub due_date_from_appointment_date: bool,
}

impl PermissionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the role to the given forms; an empty list means unrestricted
    pub fn with_permitted_forms(mut self, forms: Vec<String>) -> Self {
        self.permitted_forms = if forms.is_empty() { None } else { Some(forms) };
        self
    }

    pub fn with_group_permission(mut self, group_permission: impl Into<String>) -> Self {
        self.group_permission = Some(group_permission.into());
        self
    }

    pub fn with_module_ids(mut self, module_ids: Vec<String>) -> Self {
        self.module_ids = module_ids;
        self
    }

    pub fn with_case_actions(mut self, case_actions: Vec<String>) -> Self {
        self.case_actions = case_actions;
        self
    }

    pub fn with_form_ids(mut self, form_ids: impl IntoIterator<Item = String>) -> Self {
        self.form_ids = form_ids.into_iter().collect();
        self
    }

    pub fn with_visible_fields(mut self, fields: impl IntoIterator<Item = String>) -> Self {
        self.visible_fields = fields.into_iter().collect();
        self
    }

    pub fn with_due_date_from_appointment_date(mut self, enabled: bool) -> Self {
        self.due_date_from_appointment_date = enabled;
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.permitted_forms.is_none()
    }

    pub fn has_form(&self, form_id: &str) -> bool {
        self.form_ids.contains(form_id)
    }

    pub fn has_visible_field(&self, field: &str) -> bool {
        self.visible_fields.contains(field)
    }

    pub fn in_module(&self, module_id: &str) -> bool {
        self.module_ids.iter().any(|m| m == module_id)
    }

    pub fn case_has_any(&self, actions: &[&str]) -> bool {
        self.case_actions
            .iter()
            .any(|a| actions.contains(&a.as_str()))
    }
}
