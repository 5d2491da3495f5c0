//! Incidents created from case incident details
//!
//! v1 cases carry linked incidents inline as `incident_details`. Each entry
//! becomes an `Incident.new(...)` literal pointing back at its case through
//! `incident_case_id`. The case's module `field_map` decides which values
//! are copied; without one the detail is copied as is.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{RecordType, canonical_id};
use crate::normalize::RecordNormalizer;
use crate::serialize::RubySerializer;
use crate::source::{Collection, FormCatalog, RecordSource, SourceDocument};

use super::document_id;
use super::driver::Exporter;
use super::error::ExportResult;
use super::templates::{RECORDS_FOOTER, RECORDS_HEADER};

const DETAILS_KEY: &str = "incident_details";

/// Case fields describing ownership, carried over to the new incident
const OWNERSHIP_FIELDS: [&str; 4] = [
    "owned_by",
    "owned_by_agency",
    "owned_by_groups",
    "associated_user_names",
];

/// One `field_map` entry of a module
#[derive(Debug, Clone, PartialEq)]
struct FieldMapping {
    from_detail: bool,
    source: String,
    target: String,
}

/// How a module maps case data onto linked incidents
#[derive(Debug, Clone, Default, PartialEq)]
struct ModuleFieldMap {
    map_to: Option<String>,
    fields: Vec<FieldMapping>,
}

impl ModuleFieldMap {
    fn from_value(field_map: &Value) -> Self {
        let fields = field_map
            .get("fields")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|field| {
                        let source = field.get("source")?.as_array()?;
                        Some(FieldMapping {
                            from_detail: source.first().and_then(Value::as_str) == Some(DETAILS_KEY),
                            source: source.last()?.as_str()?.to_string(),
                            target: field.get("target")?.as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            map_to: field_map
                .get("map_to")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            fields,
        }
    }
}

/// Writes one incident per case incident detail
pub struct LinkedIncidentExporter<'a> {
    normalizer: RecordNormalizer<'a>,
    serializer: RubySerializer,
    field_maps: HashMap<String, ModuleFieldMap>,
    linked_case_ids: HashSet<String>,
}

impl<'a> LinkedIncidentExporter<'a> {
    pub fn new(catalog: &'a FormCatalog) -> Self {
        Self {
            normalizer: RecordNormalizer::new(catalog),
            serializer: RubySerializer::new(1),
            field_maps: HashMap::new(),
            linked_case_ids: HashSet::new(),
        }
    }

    /// Read module field maps and the cases that already have an incident
    pub fn load(catalog: &'a FormCatalog, source: &dyn RecordSource) -> ExportResult<Self> {
        let mut exporter = Self::new(catalog);

        for module in source.enumerate(Collection::PrimeroModule)? {
            let module = module?;
            if let (Some(id), Some(field_map)) = (module.id(), module.get("field_map")) {
                exporter
                    .field_maps
                    .insert(id.to_string(), ModuleFieldMap::from_value(field_map));
            }
        }

        for incident in source.enumerate(Collection::Incident)? {
            let incident = incident?;
            if let Some(case_id) = incident
                .str_field("incident_case_id")
                .and_then(|id| canonical_id(id).ok())
            {
                exporter.linked_case_ids.insert(case_id);
            }
        }
        Ok(exporter)
    }

    fn incident_fields(&self, case: &SourceDocument, case_id: &str, detail: &Map<String, Value>) -> Map<String, Value> {
        let module_id = case.str_field("module_id");
        let field_map = module_id.and_then(|id| self.field_maps.get(id));

        let mut fields = Map::new();
        let module = field_map
            .and_then(|map| map.map_to.as_deref())
            .or(module_id);
        if let Some(module) = module {
            fields.insert("module_id".to_string(), Value::String(module.to_string()));
        }
        fields.insert("incident_case_id".to_string(), Value::String(case_id.to_string()));

        match field_map {
            Some(map) if !map.fields.is_empty() => {
                for mapping in &map.fields {
                    let value = if mapping.from_detail {
                        detail.get(&mapping.source)
                    } else {
                        case.get(&mapping.source)
                    };
                    if let Some(value) = value.filter(|v| !v.is_null()) {
                        fields.insert(mapping.target.clone(), value.clone());
                    }
                }
            }
            _ => {
                for (key, value) in detail {
                    if key != "unique_id" {
                        fields.insert(key.clone(), value.clone());
                    }
                }
            }
        }

        for key in OWNERSHIP_FIELDS {
            if let Some(value) = case.get(key) {
                fields.insert(key.to_string(), value.clone());
            }
        }
        fields
    }
}

impl Exporter for LinkedIncidentExporter<'_> {
    fn label(&self) -> &str {
        "incidents from cases"
    }

    fn collection(&self) -> Collection {
        Collection::Child
    }

    fn unit_path(&self, index: usize) -> PathBuf {
        PathBuf::from("incident_from_cases").join(format!("incident_from_case{index}.rb"))
    }

    fn header(&self) -> String {
        RECORDS_HEADER.to_string()
    }

    fn footer(&self) -> String {
        RECORDS_FOOTER.to_string()
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        let details: Vec<&Map<String, Value>> = document
            .array_field(DETAILS_KEY)
            .iter()
            .filter_map(Value::as_object)
            .collect();
        if details.is_empty() {
            return Ok(Vec::new());
        }

        let case_id = document_id(document, "case")?;
        if self.linked_case_ids.contains(&case_id) {
            debug!(record_id = %case_id, "Case already has a linked incident");
            return Ok(Vec::new());
        }

        let mut items = Vec::with_capacity(details.len());
        for detail in details {
            let incident = SourceDocument::new(self.incident_fields(document, &case_id, detail));
            let record = self
                .normalizer
                .normalize(RecordType::Incident, &incident)?
                .to_record();
            items.push(self.serializer.constructor("Incident.new", &record, ",\n")?);
        }
        Ok(items)
    }
}
