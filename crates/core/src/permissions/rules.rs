//! Permission rule tables

use super::context::PermissionContext;

/// When a rule adds its action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    /// The resource's legacy actions include this one
    HasAction(&'static str),
    HasAnyAction(&'static [&'static str]),
    /// The role has no form restrictions
    Unrestricted,
    FormIncluded(&'static str),
    /// A visible field of the role's forms
    FieldIncluded(&'static str),
    InModule(&'static str),
    GroupPermission(&'static [&'static str]),
    /// The role's legacy case actions include any of these
    CaseHasAny(&'static [&'static str]),
    DueDateFromAppointment(bool),
    All(&'static [Condition]),
    AnyOf(&'static [Condition]),
}

impl Condition {
    /// Evaluate against a resource's legacy actions and the role context
    pub fn holds(&self, actions: &[String], context: &PermissionContext) -> bool {
        match self {
            Condition::Always => true,
            Condition::HasAction(action) => actions.iter().any(|a| a == action),
            Condition::HasAnyAction(any) => actions.iter().any(|a| any.contains(&a.as_str())),
            Condition::Unrestricted => context.is_unrestricted(),
            Condition::FormIncluded(form) => context.has_form(form),
            Condition::FieldIncluded(field) => context.has_visible_field(field),
            Condition::InModule(module) => context.in_module(module),
            Condition::GroupPermission(values) => context
                .group_permission
                .as_deref()
                .is_some_and(|g| values.contains(&g)),
            Condition::CaseHasAny(any) => context.case_has_any(any),
            Condition::DueDateFromAppointment(enabled) => {
                context.due_date_from_appointment_date == *enabled
            }
            Condition::All(conditions) => conditions.iter().all(|c| c.holds(actions, context)),
            Condition::AnyOf(conditions) => conditions.iter().any(|c| c.holds(actions, context)),
        }
    }
}

/// Adds `action` when `when` holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRule {
    pub action: &'static str,
    pub when: Condition,
}

const fn rule(action: &'static str, when: Condition) -> ActionRule {
    ActionRule { action, when }
}

/// Rule table for one permission resource
#[derive(Debug, Clone, Copy)]
pub struct ResourceRules {
    pub resource: &'static str,
    pub retired: &'static [&'static str],
    pub rules: &'static [ActionRule],
}

const INCIDENT_FROM_CASE: Condition = Condition::AnyOf(&[
    Condition::All(&[
        Condition::InModule("primeromodule-cp"),
        Condition::FormIncluded("incident_details_container"),
    ]),
    Condition::All(&[
        Condition::InModule("primeromodule-gbv"),
        Condition::HasAction("write"),
        Condition::FormIncluded("action_plan_form"),
    ]),
]);

const CLOSE_REOPEN: Condition = Condition::All(&[
    Condition::HasAction("write"),
    Condition::FormIncluded("basic_identity"),
]);

pub const CASE_PERMISSIONS: ResourceRules = ResourceRules {
    resource: "case",
    retired: &[
        "export_case_pdf",
        "export_child_pdf",
        "request_approval_bia",
        "approve_bia",
    ],
    rules: &[
        rule(
            "export_pdf",
            Condition::HasAnyAction(&["export_case_pdf", "export_child_pdf"]),
        ),
        rule(
            "request_approval_assessment",
            Condition::HasAction("request_approval_bia"),
        ),
        rule("approve_assessment", Condition::HasAction("approve_bia")),
        rule("enable_disable", Condition::HasAction("write")),
        rule("change_log", Condition::Unrestricted),
        rule(
            "view_incident_from_case",
            Condition::All(&[Condition::HasAction("read"), INCIDENT_FROM_CASE]),
        ),
        rule(
            "incident_from_case",
            Condition::All(&[
                Condition::HasAnyAction(&["create", "write"]),
                INCIDENT_FROM_CASE,
            ]),
        ),
        rule("close", CLOSE_REOPEN),
        rule("reopen", CLOSE_REOPEN),
    ],
};

pub const INCIDENT_PERMISSIONS: ResourceRules = ResourceRules {
    resource: "incident",
    retired: &[
        "export_photowall",
        "export_unhcr_csv",
        "assign",
        "request_approval_bia",
        "request_approval_case_plan",
        "request_approval_closure",
    ],
    rules: &[
        rule("enable_disable", Condition::HasAction("write")),
        rule("change_log", Condition::Unrestricted),
    ],
};

pub const TRACING_REQUEST_PERMISSIONS: ResourceRules = ResourceRules {
    resource: "tracing_request",
    retired: &["export_photowall", "export_unhcr_csv", "assign", "export_xls"],
    rules: &[
        rule("enable_disable", Condition::HasAction("write")),
        rule("change_log", Condition::Unrestricted),
    ],
};

const OVERVIEW_SELF: ActionRule = rule(
    "dash_case_overview",
    Condition::GroupPermission(&["self"]),
);
const OVERVIEW_GROUP: ActionRule = rule(
    "dash_group_overview",
    Condition::GroupPermission(&["group", "all"]),
);
const SHARED_WITH_ME: ActionRule = rule(
    "dash_shared_with_me",
    Condition::AnyOf(&[
        Condition::HasAction("view_assessment"),
        Condition::CaseHasAny(&["receive_referral", "receive_transfer"]),
    ]),
);
const SHARED_WITH_OTHERS: ActionRule = rule(
    "dash_shared_with_others",
    Condition::CaseHasAny(&["referral", "transfer", "referral_from_service"]),
);

const TASK_OVERDUE: Condition = Condition::HasAction("dash_cases_by_task_overdue");

pub const DASHBOARD_PERMISSIONS: ResourceRules = ResourceRules {
    resource: "dashboard",
    retired: &[
        "view_approvals",
        "view_assessment",
        "dash_cases_by_workflow",
        "dash_cases_by_task_overdue",
        "dash_manager_transfers",
        "dash_referrals_by_socal_worker",
        "dash_transfers_by_socal_worker",
    ],
    rules: &[
        rule("case_risk", Condition::HasAction("view_assessment")),
        rule("dash_workflow_team", Condition::HasAction("dash_cases_by_workflow")),
        rule(
            "dash_shared_with_my_team",
            Condition::HasAction("dash_referrals_by_socal_worker"),
        ),
        rule(
            "dash_shared_from_my_team",
            Condition::HasAction("dash_transfers_by_socal_worker"),
        ),
        OVERVIEW_SELF,
        OVERVIEW_GROUP,
        SHARED_WITH_ME,
        SHARED_WITH_OTHERS,
        rule(
            "approvals_assessment",
            Condition::All(&[
                Condition::HasAction("view_approvals"),
                Condition::CaseHasAny(&["request_approval_bia"]),
            ]),
        ),
        rule(
            "approvals_assessment_pending",
            Condition::All(&[
                Condition::HasAction("view_approvals"),
                Condition::CaseHasAny(&["approve_bia"]),
            ]),
        ),
        rule(
            "approvals_case_plan",
            Condition::All(&[
                Condition::HasAction("view_approvals"),
                Condition::CaseHasAny(&["request_approval_case_plan"]),
            ]),
        ),
        rule(
            "approvals_case_plan_pending",
            Condition::All(&[
                Condition::HasAction("view_approvals"),
                Condition::CaseHasAny(&["approve_case_plan"]),
            ]),
        ),
        rule(
            "approvals_closure",
            Condition::All(&[
                Condition::HasAction("view_approvals"),
                Condition::CaseHasAny(&["request_approval_closure"]),
            ]),
        ),
        rule(
            "approvals_closure_pending",
            Condition::All(&[
                Condition::HasAction("view_approvals"),
                Condition::CaseHasAny(&["approve_closure"]),
            ]),
        ),
        rule(
            "dash_case_incident_overview",
            Condition::FormIncluded("incident_details_container"),
        ),
        rule(
            "dash_cases_by_task_overdue_assessment",
            Condition::All(&[
                TASK_OVERDUE,
                Condition::FieldIncluded("assessment_requested_on"),
            ]),
        ),
        rule(
            "dash_cases_by_task_overdue_case_plan",
            Condition::All(&[TASK_OVERDUE, Condition::FieldIncluded("case_plan_due_date")]),
        ),
        rule(
            "dash_cases_by_task_overdue_services",
            Condition::All(&[
                TASK_OVERDUE,
                Condition::AnyOf(&[
                    Condition::All(&[
                        Condition::DueDateFromAppointment(false),
                        Condition::FieldIncluded("service_response_timeframe"),
                    ]),
                    Condition::All(&[
                        Condition::DueDateFromAppointment(true),
                        Condition::FieldIncluded("service_appointment_date"),
                    ]),
                ]),
            ]),
        ),
        rule(
            "dash_cases_by_task_overdue_followups",
            Condition::All(&[
                TASK_OVERDUE,
                Condition::FieldIncluded("followup_needed_by_date"),
            ]),
        ),
    ],
};

/// Dashboard actions granted to roles that had no dashboard permission
pub const DEFAULT_DASHBOARD_RULES: &[ActionRule] = &[
    OVERVIEW_SELF,
    OVERVIEW_GROUP,
    SHARED_WITH_ME,
    SHARED_WITH_OTHERS,
];

/// Rule table for a resource, if it is transformed at all
pub fn rules_for_resource(resource: &str) -> Option<&'static ResourceRules> {
    match resource {
        "case" => Some(&CASE_PERMISSIONS),
        "incident" => Some(&INCIDENT_PERMISSIONS),
        "tracing_request" => Some(&TRACING_REQUEST_PERMISSIONS),
        "dashboard" => Some(&DASHBOARD_PERMISSIONS),
        _ => None,
    }
}
