//! `data` command: records and their flags, alerts, linked incidents, histories and transitions

use primero_migration_core::RecordType;
use primero_migration_core::export::{BatchDriver, ExportStats, ExporterKind, OutputFormat};
use tracing::{info, info_span};

use super::CommonArgs;
use crate::error::CliError;
use crate::settings::Settings;

pub const DEFAULT_EXPORT_DIR: &str = "record-data-files";

/// Arguments for the `data` command
#[derive(Debug, Clone)]
pub struct DataArgs {
    pub common: CommonArgs,
    pub record_types: Vec<RecordType>,
    pub format: OutputFormat,
}

/// Parse `case||incident` or `case,incident`; empty means every record type
pub fn parse_record_types(value: Option<&str>) -> Result<Vec<RecordType>, CliError> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(RecordType::ALL.to_vec());
    };
    let mut types = Vec::new();
    for name in value.split([',', '|']).map(str::trim).filter(|n| !n.is_empty()) {
        let record_type: RecordType = name.parse().map_err(CliError::InvalidArgument)?;
        if !types.contains(&record_type) {
            types.push(record_type);
        }
    }
    Ok(types)
}

/// Handle the `data` command
pub fn handle_data(args: &DataArgs, settings: &Settings) -> Result<Vec<ExportStats>, CliError> {
    let _span = info_span!("data").entered();
    let (store, context) = args.common.open(settings)?;
    let config = args
        .common
        .export_config(settings, DEFAULT_EXPORT_DIR)
        .with_format(args.format);
    let driver = BatchDriver::new(&store, config)?;

    info!(record_types = ?args.record_types, format = %args.format, "Exporting record data");
    let mut stats = Vec::new();
    for kind in ExporterKind::data(&args.record_types) {
        stats.push(kind.run(&context, &driver)?);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_types() {
        assert_eq!(parse_record_types(None).unwrap(), RecordType::ALL.to_vec());
        assert_eq!(
            parse_record_types(Some("Case||TracingRequest")).unwrap(),
            vec![RecordType::Case, RecordType::TracingRequest]
        );
        assert_eq!(
            parse_record_types(Some("incident, incident")).unwrap(),
            vec![RecordType::Incident]
        );
        assert!(matches!(
            parse_record_types(Some("report")),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
