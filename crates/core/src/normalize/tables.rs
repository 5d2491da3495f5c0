//! Rule tables per record type

use crate::model::RecordType;

use super::rules::FieldRule;

const NOTE_RULES: &[FieldRule] = &[
    FieldRule::Rename {
        from: "notes_date",
        to: "note_date",
    },
    FieldRule::Rename {
        from: "field_notes_subform_fields",
        to: "note_text",
    },
];

/// Cases
pub const CASE_RULES: &[FieldRule] = &[
    FieldRule::Subform {
        field: "notes_section",
        rules: NOTE_RULES,
    },
    FieldRule::Negate {
        from: "unhcr_export_opt_out",
        to: "unhcr_export_opt_in",
    },
    FieldRule::Rename {
        from: "bia_approved",
        to: "assessment_approved",
    },
    FieldRule::Rename {
        from: "bia_approved_date",
        to: "assessment_approved_date",
    },
    FieldRule::Rename {
        from: "bia_approved_comments",
        to: "assessment_approved_comments",
    },
    FieldRule::Rename {
        from: "approval_status_bia",
        to: "approval_status_assessment",
    },
    FieldRule::Rename {
        from: "child_status",
        to: "status",
    },
    FieldRule::Rename {
        from: "cp_short_id",
        to: "short_id",
    },
    FieldRule::Rename {
        from: "owned_by_agency",
        to: "owned_by_agency_id",
    },
    // Stored in separate v2 tables and exported on their own
    FieldRule::Exclude(&[
        "other_documents",
        "incident_details",
        "transitions",
        "flags",
        "approval_subforms",
    ]),
];

/// Incidents
pub const INCIDENT_RULES: &[FieldRule] = &[
    FieldRule::Rename {
        from: "cp_short_id",
        to: "short_id",
    },
    FieldRule::Rename {
        from: "owned_by_agency",
        to: "owned_by_agency_id",
    },
    FieldRule::Exclude(&["incident_case_id"]),
];

/// Tracing requests
pub const TRACING_REQUEST_RULES: &[FieldRule] = &[
    FieldRule::Rename {
        from: "inquiry_status",
        to: "status",
    },
    FieldRule::Rename {
        from: "owned_by_agency",
        to: "owned_by_agency_id",
    },
];

/// Transitions embedded in records
pub const TRANSITION_RULES: &[FieldRule] = &[
    FieldRule::Rename {
        from: "to_user_local",
        to: "transitioned_to",
    },
    FieldRule::Rename {
        from: "to_user_remote",
        to: "transitioned_to_remote",
    },
    FieldRule::Rename {
        from: "to_user_agency",
        to: "transitioned_to_agency",
    },
    FieldRule::Rename {
        from: "to_user_local_status",
        to: "status",
    },
    FieldRule::Rename {
        from: "service_section_unique_id",
        to: "service_record_id",
    },
    FieldRule::Rename {
        from: "is_remote",
        to: "remote",
    },
    FieldRule::Rename {
        from: "note_on_referral_from_provider",
        to: "rejection_note",
    },
    FieldRule::Exclude(&["unique_id"]),
];

/// Rule table for a record type
pub fn rules_for(record_type: RecordType) -> &'static [FieldRule] {
    match record_type {
        RecordType::Case => CASE_RULES,
        RecordType::Incident => INCIDENT_RULES,
        RecordType::TracingRequest => TRACING_REQUEST_RULES,
    }
}

/// v2 name of a form field, mirroring the record tables
pub fn form_field_name(name: &str, form_unique_id: &str) -> String {
    if form_unique_id == "notes_section" {
        match name {
            "notes_date" => return "note_date".to_string(),
            "field_notes_subform_fields" => return "note_text".to_string(),
            _ => {}
        }
    }
    match name {
        "upload_other_document" => "other_documents".to_string(),
        "child_status" | "inquiry_status" => "status".to_string(),
        "unhcr_export_opt_out" => "unhcr_export_opt_in".to_string(),
        "approval_status_bia" => "approval_status_assessment".to_string(),
        "cp_short_id" => "short_id".to_string(),
        _ if name.contains("bia_approved") => name.replace("bia", "assessment"),
        _ => name.to_string(),
    }
}
