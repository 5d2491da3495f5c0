//! primero-migrate: export a Primero v1 store as v2 seed scripts
//!
//! Every command reads a directory of CouchDB dumps and writes Ruby seed
//! scripts (or JSON for record data) that the v2 loader runs.

mod commands;
mod error;
mod logging;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use primero_migration_core::OutputFormat;
use tracing::{error, info};

use commands::CommonArgs;
use commands::data::{DataArgs, parse_record_types};
use commands::users::UsersArgs;
use error::CliError;
use settings::Settings;

#[derive(Parser)]
#[command(name = "primero-migrate")]
#[command(about = "Export Primero v1 data and configuration as v2 seed scripts", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export roles, forms, lookups and the rest of the configuration
    Config {
        /// Directory of v1 dumps
        source: PathBuf,
        /// Output directory (default: seed-files)
        export_dir: Option<PathBuf>,
        batch_size: Option<usize>,
    },
    /// Export cases, incidents and tracing requests with their flags,
    /// alerts, linked incidents, histories and transitions
    Data {
        /// Directory of v1 dumps
        source: PathBuf,
        /// Output directory (default: record-data-files)
        export_dir: Option<PathBuf>,
        batch_size: Option<usize>,
        /// Record types separated by `||` or `,` (default: all)
        record_types: Option<String>,
        /// script or json
        format: Option<OutputFormat>,
    },
    /// Export case attachments and the scripts that load them
    Attachments {
        /// Directory of v1 dumps
        source: PathBuf,
        /// Output directory (default: record-data-files)
        export_dir: Option<PathBuf>,
        batch_size: Option<usize>,
    },
    /// Export users and saved searches
    Users {
        /// Directory of v1 dumps
        source: PathBuf,
        /// Output directory (default: seed-files)
        export_dir: Option<PathBuf>,
        batch_size: Option<usize>,
        /// Send password reset emails to created users
        send_reset_email: Option<bool>,
        /// User that sends the welcome emails
        admin_user_name: Option<String>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Config { .. } => "config",
            Commands::Data { .. } => "data",
            Commands::Attachments { .. } => "attachments",
            Commands::Users { .. } => "users",
        }
    }
}

fn common(source: PathBuf, export_dir: Option<PathBuf>, batch_size: Option<usize>) -> CommonArgs {
    CommonArgs {
        source,
        export_dir,
        batch_size,
    }
}

fn run(command: Commands, settings: &Settings) -> Result<(), CliError> {
    let name = command.name();
    let stats = match command {
        Commands::Config {
            source,
            export_dir,
            batch_size,
        } => commands::config::handle_config(&common(source, export_dir, batch_size), settings)?,
        Commands::Data {
            source,
            export_dir,
            batch_size,
            record_types,
            format,
        } => {
            let args = DataArgs {
                common: common(source, export_dir, batch_size),
                record_types: parse_record_types(record_types.as_deref())?,
                format: format.unwrap_or_default(),
            };
            commands::data::handle_data(&args, settings)?
        }
        Commands::Attachments {
            source,
            export_dir,
            batch_size,
        } => commands::attachments::handle_attachments(
            &common(source, export_dir, batch_size),
            settings,
        )?,
        Commands::Users {
            source,
            export_dir,
            batch_size,
            send_reset_email,
            admin_user_name,
        } => {
            let args = UsersArgs {
                common: common(source, export_dir, batch_size),
                send_reset_email,
                admin_user_name,
            };
            commands::users::handle_users(&args, settings)?
        }
    };
    commands::print_summary(name, &stats);
    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    let log_file = logging::init(cli.command.name(), &settings.log_dir)
        .context("Failed to set up logging")?;
    info!(log_file = %log_file.display(), "Logging to file");

    match run(cli.command, &settings) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}
