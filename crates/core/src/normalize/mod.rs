//! Field normalization
//!
//! Converts v1 record field shapes into v2 ones: blank and relocated fields
//! are dropped, typed fields are parsed, and a declarative per-record-type
//! rule table renames and derives the rest.

mod error;
mod normalizer;
mod rules;
mod tables;

pub use error::{NormalizeError, NormalizeResult};
pub use normalizer::{ALWAYS_EXCLUDED, NormalizedRecord, RecordNormalizer, type_fields};
pub use rules::{FieldRule, apply_rules, colliding_targets, validate_rules};
pub use tables::{
    CASE_RULES, INCIDENT_RULES, TRACING_REQUEST_RULES, TRANSITION_RULES, form_field_name,
    rules_for,
};
