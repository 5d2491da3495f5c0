//! Migratable record types

use serde::{Deserialize, Serialize};

use crate::source::Collection;

/// Record types carried over as v2 record data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Case,
    Incident,
    TracingRequest,
}

impl RecordType {
    /// All record types in export order
    pub const ALL: [RecordType; 3] = [Self::Case, Self::Incident, Self::TracingRequest];

    /// v2 model class used in generated scripts
    pub fn model_class(&self) -> &'static str {
        match self {
            Self::Case => "Child",
            Self::Incident => "Incident",
            Self::TracingRequest => "TracingRequest",
        }
    }

    /// Source collection holding this record type
    pub fn collection(&self) -> Collection {
        match self {
            Self::Case => Collection::Child,
            Self::Incident => Collection::Incident,
            Self::TracingRequest => Collection::TracingRequest,
        }
    }

    /// Form `parent_form` value for this record type
    pub fn parent_form(&self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Incident => "incident",
            Self::TracingRequest => "tracing_request",
        }
    }

    /// Singular file name stem (`case`, `incident`, `tracing_request`)
    pub fn file_stem(&self) -> &'static str {
        self.parent_form()
    }

    /// Plural directory name (`cases`, `incidents`, `tracing_requests`)
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Case => "cases",
            Self::Incident => "incidents",
            Self::TracingRequest => "tracing_requests",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.parent_form())
    }
}

impl std::str::FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "case" | "cases" | "child" | "children" => Ok(Self::Case),
            "incident" | "incidents" => Ok(Self::Incident),
            "tracing_request" | "tracing_requests" | "tracingrequest" => {
                Ok(Self::TracingRequest)
            }
            _ => Err(format!(
                "Unknown record type: {}. Expected: case, incident, tracing_request",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_parse() {
        assert_eq!("case".parse::<RecordType>().unwrap(), RecordType::Case);
        assert_eq!("Child".parse::<RecordType>().unwrap(), RecordType::Case);
        assert_eq!(
            "tracing-request".parse::<RecordType>().unwrap(),
            RecordType::TracingRequest
        );
        assert!("report".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_record_type_names() {
        assert_eq!(RecordType::Case.model_class(), "Child");
        assert_eq!(RecordType::Case.plural(), "cases");
        assert_eq!(RecordType::TracingRequest.file_stem(), "tracing_request");
        assert_eq!(RecordType::Incident.collection(), Collection::Incident);
    }
}
