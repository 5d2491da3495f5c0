//! `users` command: users and saved searches

use primero_migration_core::export::{BatchDriver, ExportStats, ExporterKind};
use tracing::info_span;

use super::CommonArgs;
use crate::error::CliError;
use crate::settings::Settings;

pub const DEFAULT_EXPORT_DIR: &str = "seed-files";

/// Arguments for the `users` command
#[derive(Debug, Clone)]
pub struct UsersArgs {
    pub common: CommonArgs,
    /// Overrides `users.send_reset_email` from the settings
    pub send_reset_email: Option<bool>,
    /// Overrides `users.admin_user_name` from the settings
    pub admin_user_name: Option<String>,
}

/// Handle the `users` command
pub fn handle_users(args: &UsersArgs, settings: &Settings) -> Result<Vec<ExportStats>, CliError> {
    let _span = info_span!("users").entered();
    let (store, context) = args.common.open(settings)?;

    let mut options = context.users.clone();
    if let Some(send_reset_email) = args.send_reset_email {
        options = options.with_send_reset_email(send_reset_email);
    }
    if let Some(name) = &args.admin_user_name {
        options = options.with_admin_user_name(Some(name.clone()));
    }
    let context = context.with_user_options(options);

    let driver = BatchDriver::new(&store, args.common.export_config(settings, DEFAULT_EXPORT_DIR))?;
    let mut stats = Vec::new();
    for kind in ExporterKind::users() {
        stats.push(kind.run(&context, &driver)?);
    }
    Ok(stats)
}
