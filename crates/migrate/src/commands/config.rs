//! `config` command: roles, forms, lookups and the other configuration

use primero_migration_core::export::{BatchDriver, ExportStats, ExporterKind, FormExporter};
use tracing::info_span;

use super::CommonArgs;
use crate::error::CliError;
use crate::settings::Settings;

pub const DEFAULT_EXPORT_DIR: &str = "seed-files";

/// Handle the `config` command
pub fn handle_config(args: &CommonArgs, settings: &Settings) -> Result<Vec<ExportStats>, CliError> {
    let _span = info_span!("config").entered();
    let (store, context) = args.open(settings)?;
    let driver = BatchDriver::new(&store, args.export_config(settings, DEFAULT_EXPORT_DIR))?;

    let mut stats = Vec::new();
    for kind in ExporterKind::config() {
        stats.push(kind.run(&context, &driver)?);
    }
    stats.push(FormExporter::new(&context.catalog).run(driver.config().export_dir())?);
    Ok(stats)
}
