//! Export run statistics

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Statistics from one exporter run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    /// Exporter label
    pub label: String,
    /// Documents read from the source
    pub documents_read: usize,
    /// Documents that rendered without error
    pub records_exported: usize,
    /// Documents skipped because they failed to render
    pub records_failed: usize,
    /// Fragments written to output units
    pub items_written: usize,
    /// Output units written, in order
    pub units: Vec<PathBuf>,
    /// Number of errors encountered
    pub errors_count: usize,
    /// List of errors (limited to first 100)
    pub errors: Vec<String>,
    /// Duration of the run
    #[serde(skip)]
    pub duration: Duration,
}

impl ExportStats {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Add an error (limited to 100)
    pub fn add_error(&mut self, error: String) {
        self.errors_count += 1;
        if self.errors.len() < 100 {
            self.errors.push(error);
        }
    }

    /// Fold another run's counts into this one
    pub fn merge(&mut self, other: ExportStats) {
        self.documents_read += other.documents_read;
        self.records_exported += other.records_exported;
        self.records_failed += other.records_failed;
        self.items_written += other.items_written;
        self.units.extend(other.units);
        for error in other.errors {
            if self.errors.len() < 100 {
                self.errors.push(error);
            }
        }
        self.errors_count += other.errors_count;
        self.duration += other.duration;
    }

    /// Format duration as human-readable string
    pub fn duration_string(&self) -> String {
        let secs = self.duration.as_secs();
        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else {
            format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_capped() {
        let mut stats = ExportStats::new("case");
        for i in 0..150 {
            stats.add_error(format!("error {i}"));
        }
        assert_eq!(stats.errors_count, 150);
        assert_eq!(stats.errors.len(), 100);
    }

    #[test]
    fn test_merge() {
        let mut total = ExportStats::new("data");
        let mut run = ExportStats::new("case");
        run.documents_read = 3;
        run.records_exported = 2;
        run.records_failed = 1;
        run.units.push(PathBuf::from("cases/case0.rb"));
        run.add_error("bad".to_string());
        total.merge(run);
        assert_eq!(total.documents_read, 3);
        assert_eq!(total.records_failed, 1);
        assert_eq!(total.units.len(), 1);
        assert_eq!(total.errors_count, 1);
    }

    #[test]
    fn test_duration_string() {
        let mut stats = ExportStats::new("case");
        stats.duration = Duration::from_secs(42);
        assert_eq!(stats.duration_string(), "42s");
        stats.duration = Duration::from_secs(125);
        assert_eq!(stats.duration_string(), "2m 5s");
        stats.duration = Duration::from_secs(3725);
        assert_eq!(stats.duration_string(), "1h 2m 5s");
    }
}
