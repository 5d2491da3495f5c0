//! Record normalizer

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{
    Record, RecordType, RecordValue, canonical_id, canonical_or_random, parse_date,
    parse_datetime,
};
use crate::source::{FieldIndex, FieldKind, FormCatalog, SourceDocument};

use super::error::{NormalizeError, NormalizeResult};
use super::rules::apply_rules;
use super::tables::rules_for;

/// Keys that never reach the v2 record data
pub const ALWAYS_EXCLUDED: [&str; 7] = [
    "histories",
    "_attachments",
    "other_documents",
    "flags",
    "_id",
    "_rev",
    "couchrest-type",
];

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9A-Za-z]").unwrap());

/// A record reshaped for v2
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// Canonical record id
    pub id: String,
    /// Canonical id of the case an incident was created from
    pub incident_case_id: Option<String>,
    pub data: Record,
}

impl NormalizedRecord {
    /// The `{id, incident_case_id, data}` mapping written to output
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("id".to_string(), RecordValue::string(&self.id));
        if let Some(case_id) = &self.incident_case_id {
            record.insert("incident_case_id".to_string(), RecordValue::string(case_id));
        }
        record.insert("data".to_string(), RecordValue::Map(self.data.clone()));
        record
    }
}

/// Normalizes v1 record documents using the form catalog
pub struct RecordNormalizer<'a> {
    catalog: &'a FormCatalog,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(catalog: &'a FormCatalog) -> Self {
        Self { catalog }
    }

    /// Normalize one document of the given record type
    pub fn normalize(
        &self,
        record_type: RecordType,
        document: &SourceDocument,
    ) -> NormalizeResult<NormalizedRecord> {
        let id = canonical_or_random(document.id())?;

        let mut data = document.to_record();
        data.retain(|key, value| !value.is_blank() && !ALWAYS_EXCLUDED.contains(&key.as_str()));

        type_fields(&mut data, self.catalog.field_index(record_type.parent_form()))?;

        let incident_case_id = match (record_type, data.get("incident_case_id")) {
            (RecordType::Incident, Some(RecordValue::String(case_id))) => {
                Some(canonical_id(case_id)?)
            }
            _ => None,
        };

        apply_rules(&mut data, rules_for(record_type))?;

        Ok(NormalizedRecord {
            id,
            incident_case_id,
            data,
        })
    }
}

/// Parse typed fields in place using a field index
///
/// Date and date-time strings become typed values, location codes are
/// stripped to alphanumerics and subform entries are handled recursively.
/// Empty strings are left alone.
pub fn type_fields(record: &mut Record, index: &FieldIndex) -> NormalizeResult<()> {
    if index.is_empty() {
        return Ok(());
    }

    for (key, value) in record.iter_mut() {
        let Some(kind) = index.kind(key) else {
            continue;
        };

        let typed = match (kind, &mut *value) {
            (FieldKind::Date, RecordValue::String(s)) if !s.is_empty() => {
                let date = parse_date(s).ok_or_else(|| NormalizeError::InvalidDate {
                    field: key.clone(),
                    value: s.clone(),
                })?;
                Some(RecordValue::Date(date))
            }
            (FieldKind::DateTime, RecordValue::String(s)) if !s.is_empty() => {
                let datetime = parse_datetime(s).ok_or_else(|| NormalizeError::InvalidDateTime {
                    field: key.clone(),
                    value: s.clone(),
                })?;
                Some(RecordValue::DateTime(datetime))
            }
            (FieldKind::Date, RecordValue::String(_))
            | (FieldKind::DateTime, RecordValue::String(_)) => None,
            (FieldKind::Date, other) => {
                return Err(NormalizeError::InvalidDate {
                    field: key.clone(),
                    value: other.type_name().to_string(),
                });
            }
            (FieldKind::DateTime, other) => {
                return Err(NormalizeError::InvalidDateTime {
                    field: key.clone(),
                    value: other.type_name().to_string(),
                });
            }
            (FieldKind::Location, RecordValue::String(s)) => {
                *s = NON_ALPHANUMERIC.replace_all(s, "").into_owned();
                None
            }
            (FieldKind::Subform(subform), RecordValue::List(entries)) => {
                for entry in entries.iter_mut() {
                    if let Some(map) = entry.as_map_mut() {
                        type_fields(map, subform)?;
                    }
                }
                None
            }
            _ => None,
        };

        if let Some(typed) = typed {
            *value = typed;
        }
    }
    Ok(())
}
