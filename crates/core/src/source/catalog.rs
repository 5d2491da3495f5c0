//! Form catalog
//!
//! Loaded once from the `form_section` collection and passed by reference
//! to the normalizer, the role transformer and the form exporter. The
//! derived tables are computed lazily on first use and then reused.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use serde_json::Value;

use super::document::{Collection, SourceDocument};
use super::error::SourceResult;
use super::RecordSource;

/// Forms that v2 hard codes; their configuration is not migrated
pub const RETIRED_FORMS: [&str; 8] = [
    "approvals",
    "approval_subforms",
    "referral_transfer",
    "record_owner",
    "incident_record_owner",
    "cp_incident_record_owner",
    "transitions",
    "reopened_logs",
];

const HIDDEN_FORM: &str = "incident_details_container";
const MAX_SUBFORM_DEPTH: usize = 8;

/// A field definition on a form
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub field_type: String,
    pub visible: bool,
    pub date_include_time: bool,
    pub option_strings_source: Option<String>,
    pub subform_section_id: Option<String>,
}

impl FormField {
    fn from_value(value: &Value) -> Option<Self> {
        let name = value.get("name")?.as_str()?.to_string();
        Some(Self {
            name,
            field_type: value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            visible: value.get("visible").and_then(Value::as_bool).unwrap_or(true),
            date_include_time: value
                .get("date_include_time")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            option_strings_source: value
                .get("option_strings_source")
                .and_then(Value::as_str)
                .map(str::to_string),
            subform_section_id: value
                .get("subform_section_id")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    fn is_location(&self) -> bool {
        self.field_type == "select_box"
            && self
                .option_strings_source
                .as_deref()
                .is_some_and(|source| source.starts_with("Location"))
    }
}

/// A form section definition
#[derive(Debug, Clone, PartialEq)]
pub struct FormSection {
    pub unique_id: String,
    pub parent_form: String,
    pub is_nested: bool,
    pub visible: bool,
    pub fields: Vec<FormField>,
    /// The raw document, for exporting the full configuration
    pub document: SourceDocument,
}

impl FormSection {
    /// Build a form from its source document; documents without a unique id are ignored
    pub fn from_document(document: SourceDocument) -> Option<Self> {
        let unique_id = document.str_field("unique_id")?.to_string();
        Some(Self {
            unique_id,
            parent_form: document
                .str_field("parent_form")
                .unwrap_or("case")
                .to_string(),
            is_nested: document.bool_field("is_nested").unwrap_or(false),
            visible: document.bool_field("visible").unwrap_or(true),
            fields: document
                .array_field("fields")
                .iter()
                .filter_map(FormField::from_value)
                .collect(),
            document,
        })
    }

    /// Ids of the subforms referenced by this form's subform fields
    pub fn subform_ids(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.field_type == "subform")
            .filter_map(|f| f.subform_section_id.as_deref())
    }

    /// Names of the visible fields on this form
    pub fn visible_field_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.visible)
            .map(|f| f.name.as_str())
    }
}

/// How the normalizer treats a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Date,
    DateTime,
    Location,
    /// A list of subform entries, with the subform's own field index
    Subform(FieldIndex),
}

/// Typed fields of one record type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldIndex {
    fields: HashMap<String, FieldKind>,
}

impl FieldIndex {
    pub fn kind(&self, field: &str) -> Option<&FieldKind> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, kind: FieldKind) {
        self.fields.insert(field.into(), kind);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// All form sections with lazily built lookup tables
#[derive(Debug, Default)]
pub struct FormCatalog {
    forms: Vec<FormSection>,
    grouped: OnceCell<IndexMap<String, Vec<FormSection>>>,
    field_indexes: OnceCell<HashMap<String, FieldIndex>>,
}

impl FormCatalog {
    /// Load every form section from the store
    pub fn load(source: &dyn RecordSource) -> SourceResult<Self> {
        let mut forms = Vec::new();
        for document in source.enumerate(Collection::FormSection)? {
            let document = document?;
            match FormSection::from_document(document) {
                Some(form) => forms.push(form),
                None => tracing::warn!("Skipping form section without unique_id"),
            }
        }
        tracing::info!("Loaded {} form sections", forms.len());
        Ok(Self::new(forms))
    }

    pub fn new(forms: Vec<FormSection>) -> Self {
        Self {
            forms,
            grouped: OnceCell::new(),
            field_indexes: OnceCell::new(),
        }
    }

    pub fn forms(&self) -> &[FormSection] {
        &self.forms
    }

    pub fn find(&self, unique_id: &str) -> Option<&FormSection> {
        self.forms.iter().find(|f| f.unique_id == unique_id)
    }

    /// Top-level forms keyed by unique id, each followed by its subforms
    ///
    /// Retired forms are left out. Within a group, nested forms sort first.
    pub fn forms_with_subforms(&self) -> &IndexMap<String, Vec<FormSection>> {
        self.grouped.get_or_init(|| {
            let mut groups: IndexMap<String, Vec<FormSection>> = IndexMap::new();
            for form in self.forms.iter().filter(|f| !f.is_nested) {
                groups
                    .entry(form.unique_id.clone())
                    .or_default()
                    .push(form.clone());
            }

            groups.retain(|unique_id, _| !RETIRED_FORMS.contains(&unique_id.as_str()));

            for (unique_id, group) in groups.iter_mut() {
                if unique_id == HIDDEN_FORM {
                    if let Some(first) = group.first_mut() {
                        first.visible = false;
                    }
                }
                let subforms = self.subforms_of(group);
                group.extend(subforms);
                group.sort_by_key(|form| if form.is_nested { 0 } else { 1 });
            }
            groups
        })
    }

    fn subforms_of(&self, forms: &[FormSection]) -> Vec<FormSection> {
        let mut seen: HashSet<&str> = forms.iter().map(|f| f.unique_id.as_str()).collect();
        let mut pending: Vec<&str> = forms.iter().flat_map(|f| f.subform_ids()).collect();
        let mut subforms = Vec::new();

        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(subform) = self.forms.iter().find(|f| f.is_nested && f.unique_id == id) {
                pending.extend(subform.subform_ids());
                subforms.push(subform.clone());
            }
        }
        subforms.sort_by(|a, b| a.unique_id.cmp(&b.unique_id));
        subforms
    }

    /// Date, date-time, location and subform fields of a record type
    pub fn field_index(&self, parent_form: &str) -> &FieldIndex {
        static EMPTY: std::sync::OnceLock<FieldIndex> = std::sync::OnceLock::new();
        self.field_indexes
            .get_or_init(|| self.build_field_indexes())
            .get(parent_form)
            .unwrap_or_else(|| EMPTY.get_or_init(FieldIndex::default))
    }

    fn build_field_indexes(&self) -> HashMap<String, FieldIndex> {
        let mut indexes: HashMap<String, FieldIndex> = HashMap::new();
        for form in self.forms.iter().filter(|f| !f.is_nested) {
            let index = indexes.entry(form.parent_form.clone()).or_default();
            self.index_fields(&form.fields, index, 0);
        }
        indexes
    }

    fn index_fields(&self, fields: &[FormField], index: &mut FieldIndex, depth: usize) {
        for field in fields {
            let kind = match field.field_type.as_str() {
                "date_field" if field.date_include_time => FieldKind::DateTime,
                "date_field" => FieldKind::Date,
                "subform" if depth < MAX_SUBFORM_DEPTH => {
                    let mut subform_index = FieldIndex::default();
                    if let Some(subform) = field
                        .subform_section_id
                        .as_deref()
                        .and_then(|id| self.find(id))
                    {
                        self.index_fields(&subform.fields, &mut subform_index, depth + 1);
                    }
                    FieldKind::Subform(subform_index)
                }
                _ if field.is_location() => FieldKind::Location,
                _ => continue,
            };
            index.insert(field.name.clone(), kind);
        }
    }
}
