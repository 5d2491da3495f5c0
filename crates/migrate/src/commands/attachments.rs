//! `attachments` command: case photos and documents

use primero_migration_core::export::{BatchDriver, ExportStats, ExporterKind};
use tracing::info_span;

use super::CommonArgs;
use super::data::DEFAULT_EXPORT_DIR;
use crate::error::CliError;
use crate::settings::Settings;

/// Handle the `attachments` command
pub fn handle_attachments(
    args: &CommonArgs,
    settings: &Settings,
) -> Result<Vec<ExportStats>, CliError> {
    let _span = info_span!("attachments").entered();
    let (store, context) = args.open(settings)?;
    let driver = BatchDriver::new(&store, args.export_config(settings, DEFAULT_EXPORT_DIR))?;
    Ok(vec![ExporterKind::Attachments.run(&context, &driver)?])
}
