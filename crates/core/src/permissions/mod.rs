//! Role permission transformation
//!
//! v2 renamed, retired and added many role actions. Each transformed
//! resource is described by a [`ResourceRules`] table: retired actions are
//! removed, and every [`ActionRule`] whose [`Condition`] holds adds its
//! action. The tables are plain data, so each rule can be tested on its own.

mod context;
mod role;
mod rules;

pub use context::PermissionContext;
pub use role::{RoleRecord, RoleTransformer, role_modules};
pub use rules::{
    ActionRule, CASE_PERMISSIONS, Condition, DASHBOARD_PERMISSIONS, DEFAULT_DASHBOARD_RULES,
    INCIDENT_PERMISSIONS, ResourceRules, TRACING_REQUEST_PERMISSIONS, rules_for_resource,
};

/// Transform the actions of one resource
///
/// Surviving old actions keep their order and are followed by the added
/// actions in table order, without duplicates. An empty action list stays
/// empty.
pub fn transform_actions(
    table: &ResourceRules,
    actions: &[String],
    context: &PermissionContext,
) -> Vec<String> {
    if actions.is_empty() {
        return Vec::new();
    }

    let mut result: Vec<String> = actions
        .iter()
        .filter(|a| !table.retired.contains(&a.as_str()))
        .cloned()
        .collect();
    for rule in table.rules {
        if rule.when.holds(actions, context) {
            result.push(rule.action.to_string());
        }
    }
    dedup_preserving_order(result)
}

/// Dashboard actions for a role that had no dashboard permission
pub fn default_dashboard(context: &PermissionContext) -> Vec<String> {
    dedup_preserving_order(
        DEFAULT_DASHBOARD_RULES
            .iter()
            .filter(|rule| rule.when.holds(&[], context))
            .map(|rule| rule.action.to_string())
            .collect(),
    )
}

/// Derived incident actions for a role that only had case permissions
pub fn incident_actions_from_case(case_actions: &[String]) -> Vec<String> {
    let mut actions = Vec::new();
    if case_actions.iter().any(|a| a == "read") {
        actions.push("read".to_string());
    }
    if case_actions.iter().any(|a| a == "create" || a == "write") {
        actions.push("write".to_string());
    }
    actions
}

fn dedup_preserving_order(actions: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    actions
        .into_iter()
        .filter(|a| seen.insert(a.clone()))
        .collect()
}
