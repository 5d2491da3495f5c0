//! CLI command implementations

pub mod attachments;
pub mod config;
pub mod data;
pub mod users;

use std::path::{Path, PathBuf};

use primero_migration_core::export::{DEFAULT_BATCH_SIZE, ExportConfig, ExportStats};
use primero_migration_core::{DumpStore, ExportContext};
use tracing::info;

use crate::error::CliError;
use crate::settings::Settings;

/// Arguments shared by every command
#[derive(Debug, Clone)]
pub struct CommonArgs {
    /// Directory of v1 CouchDB dumps
    pub source: PathBuf,
    pub export_dir: Option<PathBuf>,
    pub batch_size: Option<usize>,
}

impl CommonArgs {
    /// Core configuration: arguments first, then settings, then `default_dir`
    pub fn export_config(&self, settings: &Settings, default_dir: &str) -> ExportConfig {
        let export_dir = self
            .export_dir
            .clone()
            .or_else(|| settings.export_dir.clone())
            .unwrap_or_else(|| PathBuf::from(default_dir));
        let batch_size = self
            .batch_size
            .or(settings.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        ExportConfig::new()
            .with_export_dir(export_dir)
            .with_batch_size(batch_size)
    }

    /// Open the dump directory and load the shared lookups
    pub fn open(&self, settings: &Settings) -> Result<(DumpStore, ExportContext), CliError> {
        let store = open_store(&self.source)?;
        let context = ExportContext::load(&store)?
            .with_locales(settings.locales.clone())
            .with_user_options(settings.users.clone());
        Ok((store, context))
    }
}

fn open_store(path: &Path) -> Result<DumpStore, CliError> {
    let store = DumpStore::open(path)?;
    info!(source = %path.display(), "Opened v1 dump");
    Ok(store)
}

/// Print one line per exporter and a total to stderr
pub fn print_summary(command: &str, stats: &[ExportStats]) {
    let mut total = ExportStats::new(command);
    for run in stats {
        eprintln!(
            "  {:<28} {:>7} exported {:>5} failed {:>4} files  {}",
            run.label,
            run.records_exported,
            run.records_failed,
            run.units.len(),
            run.duration_string()
        );
        total.merge(run.clone());
    }
    eprintln!(
        "{}: {} records exported, {} failed, {} files written in {}",
        command,
        total.records_exported,
        total.records_failed,
        total.units.len(),
        total.duration_string()
    );
    if total.errors_count > 0 {
        eprintln!("  {} errors, see the log file for details", total.errors_count);
    }
}
