//! Exporters
//!
//! Every script family implements [`Exporter`] and is run by a
//! [`BatchDriver`]. [`ExporterKind`] is the dispatch table from what to
//! export to the exporter that writes it; [`ExportContext`] holds the
//! lookups shared by all of them for one run.

mod alerts;
mod attachments;
mod config;
pub mod configuration;
mod driver;
mod error;
mod flags;
mod histories;
mod linked_incidents;
mod locations;
mod records;
mod saved_searches;
mod stats;
pub mod templates;
mod transitions;
mod unit;
mod users;

use tracing::{info, warn};

use crate::model::{Record, RecordType, canonical_id};
use crate::permissions::RoleTransformer;
use crate::source::{Collection, FormCatalog, RecordSource, SourceDocument};

pub use alerts::AlertExporter;
pub use attachments::{ATTACHMENT_FORMS, AttachmentExporter, attachment_field_name};
pub use config::{DEFAULT_BATCH_SIZE, ExportConfig, OutputFormat};
pub use configuration::{ConfigExporter, ConfigKind, FormExporter, RoleExporter, SystemSettingsExporter};
pub use driver::{BatchDriver, Exporter, OutputLayout, log_id};
pub use error::{ExportError, ExportResult};
pub use flags::FlagExporter;
pub use histories::HistoryExporter;
pub use linked_incidents::LinkedIncidentExporter;
pub use locations::LocationExporter;
pub use records::RecordExporter;
pub use saved_searches::{SavedSearchExporter, convert_filter, saved_search_record_type};
pub use stats::ExportStats;
pub use transitions::{TransitionExporter, transition_type};
pub use unit::{OutputUnit, create_dir, write_file};
pub use users::{UserExportOptions, UserExporter, user_hash};

/// Canonical id of a document, required by every per-record exporter
pub(crate) fn document_id(document: &SourceDocument, collection: &'static str) -> ExportResult<String> {
    let id = document
        .id()
        .ok_or_else(|| ExportError::invalid_document(collection, "missing _id"))?;
    Ok(canonical_id(id)?)
}

/// Object entries of an embedded list such as `flags` or `histories`
pub(crate) fn embedded_records(document: &SourceDocument, key: &str) -> Vec<Record> {
    document
        .array_field(key)
        .iter()
        .filter_map(|entry| entry.as_object())
        .map(|fields| SourceDocument::new(fields.clone()).to_record())
        .collect()
}

/// Lookups and options shared by the exporters of one run
#[derive(Debug, Default)]
pub struct ExportContext {
    pub catalog: FormCatalog,
    pub locales: Vec<String>,
    /// Ids of every module, granted to the superuser role
    pub all_modules: Vec<String>,
    pub due_date_from_appointment_date: bool,
    pub users: UserExportOptions,
}

impl ExportContext {
    /// Load the form catalog, module ids and system settings from the store
    pub fn load(source: &dyn RecordSource) -> ExportResult<Self> {
        let catalog = FormCatalog::load(source)?;

        let mut all_modules = Vec::new();
        for module in source.enumerate(Collection::PrimeroModule)? {
            if let Some(id) = module?.id() {
                all_modules.push(id.to_string());
            }
        }

        let mut due_date_from_appointment_date = false;
        if let Some(settings) = source.enumerate(Collection::SystemSettings)?.next() {
            due_date_from_appointment_date = settings?
                .bool_field("due_date_from_appointment_date")
                .unwrap_or(false);
        }

        info!(
            forms = catalog.forms().len(),
            modules = all_modules.len(),
            due_date_from_appointment_date,
            "Loaded export context"
        );
        Ok(Self {
            catalog,
            locales: vec!["en".to_string()],
            all_modules,
            due_date_from_appointment_date,
            users: UserExportOptions::default(),
        })
    }

    pub fn with_locales(mut self, locales: Vec<String>) -> Self {
        if locales.is_empty() {
            warn!("No locales configured, keeping {:?}", self.locales);
        } else {
            self.locales = locales;
        }
        self
    }

    pub fn with_user_options(mut self, users: UserExportOptions) -> Self {
        self.users = users;
        self
    }
}

/// What to export, mapped to the exporter that writes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExporterKind {
    Records(RecordType),
    Flags(RecordType),
    Histories(RecordType),
    Transitions(RecordType),
    Alerts,
    IncidentFromCase,
    Attachments,
    Roles,
    Config(ConfigKind),
    SystemSettings,
    Locations,
    Users,
    SavedSearches,
}

impl ExporterKind {
    /// Exporters of the `data` command for the given record types
    pub fn data(record_types: &[RecordType]) -> Vec<ExporterKind> {
        let mut kinds: Vec<ExporterKind> = record_types.iter().map(|rt| Self::Records(*rt)).collect();
        if record_types.contains(&RecordType::Case) {
            kinds.push(Self::Alerts);
            kinds.push(Self::IncidentFromCase);
        }
        kinds.extend(record_types.iter().map(|rt| Self::Flags(*rt)));
        kinds.extend(record_types.iter().map(|rt| Self::Histories(*rt)));
        kinds.extend(record_types.iter().map(|rt| Self::Transitions(*rt)));
        kinds
    }

    /// Exporters of the `config` command, apart from form sections
    pub fn config() -> Vec<ExporterKind> {
        let mut kinds = vec![Self::Roles];
        kinds.extend(ConfigKind::ALL.iter().map(|kind| Self::Config(*kind)));
        kinds.push(Self::SystemSettings);
        kinds.push(Self::Locations);
        kinds
    }

    /// Exporters of the `users` command
    pub fn users() -> Vec<ExporterKind> {
        vec![Self::Users, Self::SavedSearches]
    }

    /// Construct the exporter for this kind
    pub fn build<'a>(
        &self,
        context: &'a ExportContext,
        source: &dyn RecordSource,
        config: &ExportConfig,
    ) -> ExportResult<Box<dyn Exporter + 'a>> {
        Ok(match *self {
            Self::Records(rt) => Box::new(RecordExporter::new(rt, &context.catalog, config.format)),
            Self::Flags(rt) => Box::new(FlagExporter::new(rt)),
            Self::Histories(rt) => Box::new(HistoryExporter::new(rt)),
            Self::Transitions(rt) => Box::new(TransitionExporter::new(rt)),
            Self::Alerts => Box::new(AlertExporter::new()),
            Self::IncidentFromCase => {
                Box::new(LinkedIncidentExporter::load(&context.catalog, source)?)
            }
            Self::Attachments => Box::new(AttachmentExporter::new(config.export_dir())),
            Self::Roles => Box::new(RoleExporter::new(
                RoleTransformer::new(&context.catalog)
                    .with_all_modules(context.all_modules.clone())
                    .with_due_date_from_appointment_date(context.due_date_from_appointment_date),
            )),
            Self::Config(kind) => Box::new(ConfigExporter::new(kind)),
            Self::SystemSettings => Box::new(SystemSettingsExporter::new(context.locales.clone())),
            Self::Locations => Box::new(LocationExporter::new(context.locales.clone())),
            Self::Users => Box::new(UserExporter::new(context.users.clone(), source)?),
            Self::SavedSearches => Box::new(SavedSearchExporter::new()),
        })
    }

    /// Build the exporter and run it to completion
    pub fn run(&self, context: &ExportContext, driver: &BatchDriver<'_>) -> ExportResult<ExportStats> {
        let mut exporter = self.build(context, driver.source(), driver.config())?;
        driver.run(exporter.as_mut())
    }
}
