//! Source documents and collections

use serde_json::{Map, Value};

use crate::model::{Record, RecordValue};

use super::error::{SourceError, SourceResult};

/// Collections of the v1 store that the exporters read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Child,
    Incident,
    TracingRequest,
    Role,
    FormSection,
    Lookup,
    Agency,
    UserGroup,
    PrimeroProgram,
    PrimeroModule,
    SystemSettings,
    User,
    SavedSearch,
    Location,
}

impl Collection {
    pub const ALL: [Collection; 14] = [
        Self::Child,
        Self::Incident,
        Self::TracingRequest,
        Self::Role,
        Self::FormSection,
        Self::Lookup,
        Self::Agency,
        Self::UserGroup,
        Self::PrimeroProgram,
        Self::PrimeroModule,
        Self::SystemSettings,
        Self::User,
        Self::SavedSearch,
        Self::Location,
    ];

    /// Dump file stem for this collection
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Incident => "incident",
            Self::TracingRequest => "tracing_request",
            Self::Role => "role",
            Self::FormSection => "form_section",
            Self::Lookup => "lookup",
            Self::Agency => "agency",
            Self::UserGroup => "user_group",
            Self::PrimeroProgram => "primero_program",
            Self::PrimeroModule => "primero_module",
            Self::SystemSettings => "system_settings",
            Self::User => "user",
            Self::SavedSearch => "saved_search",
            Self::Location => "location",
        }
    }

    /// v1 model class name, as stored in `record_type` references
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::Child => "Child",
            Self::Incident => "Incident",
            Self::TracingRequest => "TracingRequest",
            Self::Role => "Role",
            Self::FormSection => "FormSection",
            Self::Lookup => "Lookup",
            Self::Agency => "Agency",
            Self::UserGroup => "UserGroup",
            Self::PrimeroProgram => "PrimeroProgram",
            Self::PrimeroModule => "PrimeroModule",
            Self::SystemSettings => "SystemSettings",
            Self::User => "User",
            Self::SavedSearch => "SavedSearch",
            Self::Location => "Location",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// One document read from the v1 store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceDocument {
    fields: Map<String, Value>,
}

impl SourceDocument {
    /// Wrap a JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a document from a JSON value, which must be an object
    pub fn from_value(value: Value, collection: Collection, index: usize) -> SourceResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(SourceError::NotAnObject {
                collection: collection.to_string(),
                index,
            }),
        }
    }

    /// Document id (`_id`, falling back to `id`)
    pub fn id(&self) -> Option<&str> {
        self.str_field("_id").or_else(|| self.str_field("id"))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Non-empty string attribute
    pub fn str_field(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    /// Array attribute; missing or non-array attributes read as empty
    pub fn array_field(&self, key: &str) -> &[Value] {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// String items of an array attribute
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.array_field(key)
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Copy the document into a [`Record`]
    pub fn to_record(&self) -> Record {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), RecordValue::from(v.clone())))
            .collect()
    }
}

impl From<Map<String, Value>> for SourceDocument {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}
