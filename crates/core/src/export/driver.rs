//! Batch driver
//!
//! Streams a collection from a [`RecordSource`], slices it into batches and
//! hands every document to an [`Exporter`]. Each batch lands in its own
//! output unit (or in one shared unit for single-file exporters), which is
//! flushed before the next batch is pulled.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{error, info, info_span, warn};

use crate::model::canonical_id;
use crate::source::{Collection, DocumentIter, RecordSource, SourceDocument, batches};

use super::config::ExportConfig;
use super::error::{ExportError, ExportResult};
use super::stats::ExportStats;
use super::unit::{OutputUnit, create_dir};

/// How an exporter's output is split into files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// One unit per batch
    PerBatch,
    /// All batches in one unit
    Single,
}

/// Renders documents of one collection into output fragments
pub trait Exporter {
    /// Name used in logs and summaries
    fn label(&self) -> &str;

    /// Collection the documents are read from
    fn collection(&self) -> Collection;

    fn layout(&self) -> OutputLayout {
        OutputLayout::PerBatch
    }

    /// Unit path for a batch index, relative to the export directory
    fn unit_path(&self, index: usize) -> PathBuf;

    fn header(&self) -> String;

    fn footer(&self) -> String;

    /// Text written between consecutive fragments of a unit
    fn item_separator(&self) -> &str {
        ""
    }

    /// Render one document into zero or more fragments
    fn render(
        &mut self,
        document: &SourceDocument,
        source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>>;

    /// Fragments appended after the last document of a single-unit export
    fn trailing_items(&mut self) -> ExportResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Id used to identify a document in logs
pub fn log_id(document: &SourceDocument) -> String {
    match document.id() {
        Some(id) => canonical_id(id).unwrap_or_else(|_| id.to_string()),
        None => "<no id>".to_string(),
    }
}

/// Drives exporters over a source store
pub struct BatchDriver<'a> {
    source: &'a dyn RecordSource,
    config: ExportConfig,
}

impl<'a> BatchDriver<'a> {
    /// Create a driver, validating the configuration
    pub fn new(source: &'a dyn RecordSource, config: ExportConfig) -> ExportResult<Self> {
        config.validate().map_err(ExportError::InvalidConfig)?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn source(&self) -> &'a dyn RecordSource {
        self.source
    }

    /// Run one exporter over its whole collection
    pub fn run(&self, exporter: &mut dyn Exporter) -> ExportResult<ExportStats> {
        let label = exporter.label().to_string();
        let _span = info_span!("export", exporter = %label).entered();
        let start = Instant::now();
        let mut stats = ExportStats::new(&label);

        info!(
            collection = %exporter.collection(),
            batch_size = self.config.batch_size,
            "Starting export"
        );

        create_dir(&self.config.export_dir)?;
        let documents = self.source.enumerate(exporter.collection())?;

        match exporter.layout() {
            OutputLayout::PerBatch => self.run_per_batch(exporter, documents, &mut stats)?,
            OutputLayout::Single => self.run_single(exporter, documents, &mut stats)?,
        }

        stats.duration = start.elapsed();
        info!(
            documents = stats.documents_read,
            exported = stats.records_exported,
            failed = stats.records_failed,
            units = stats.units.len(),
            duration = %stats.duration_string(),
            "Export complete"
        );
        Ok(stats)
    }

    fn run_per_batch(
        &self,
        exporter: &mut dyn Exporter,
        documents: DocumentIter<'_>,
        stats: &mut ExportStats,
    ) -> ExportResult<()> {
        for (index, batch) in batches(documents, self.config.batch_size).enumerate() {
            let batch = batch?;
            let items = self.render_batch(exporter, &batch, stats)?;
            if items.is_empty() {
                info!(batch = index, documents = batch.len(), "Nothing to write for batch");
                continue;
            }

            let path = self.config.export_dir.join(exporter.unit_path(index));
            let mut unit = OutputUnit::open(&path, exporter.item_separator())?;
            unit.write_raw(&exporter.header())?;
            for item in &items {
                unit.write_item(item)?;
            }
            unit.write_raw(&exporter.footer())?;
            let written = unit.close()?;

            info!(
                batch = index,
                documents = batch.len(),
                items = written,
                unit = %path.display(),
                "Wrote batch"
            );
            stats.items_written += written;
            stats.units.push(path);
        }
        Ok(())
    }

    fn run_single(
        &self,
        exporter: &mut dyn Exporter,
        documents: DocumentIter<'_>,
        stats: &mut ExportStats,
    ) -> ExportResult<()> {
        let path = self.config.export_dir.join(exporter.unit_path(0));
        let mut unit = OutputUnit::open(&path, exporter.item_separator())?;
        unit.write_raw(&exporter.header())?;

        for (index, batch) in batches(documents, self.config.batch_size).enumerate() {
            let batch = batch?;
            let items = self.render_batch(exporter, &batch, stats)?;
            for item in &items {
                unit.write_item(item)?;
            }
            unit.flush()?;
            info!(batch = index, documents = batch.len(), items = items.len(), "Wrote batch");
        }

        for item in exporter.trailing_items()? {
            unit.write_item(&item)?;
        }
        unit.write_raw(&exporter.footer())?;
        let written = unit.close()?;

        if written == 0 {
            warn!(unit = %path.display(), "Wrote unit without any items");
        }
        info!(items = written, unit = %path.display(), "Wrote unit");
        stats.items_written += written;
        stats.units.push(path);
        Ok(())
    }

    fn render_batch(
        &self,
        exporter: &mut dyn Exporter,
        batch: &[SourceDocument],
        stats: &mut ExportStats,
    ) -> ExportResult<Vec<String>> {
        let mut items = Vec::new();
        for document in batch {
            stats.documents_read += 1;
            match exporter.render(document, self.source) {
                Ok(fragments) => {
                    stats.records_exported += 1;
                    items.extend(fragments);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let record_id = log_id(document);
                    error!(
                        record_type = %exporter.label(),
                        record_id = %record_id,
                        error = %e,
                        "Failed to export record"
                    );
                    stats.records_failed += 1;
                    stats.add_error(format!("{} {}: {}", exporter.label(), record_id, e));
                }
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MemorySource, SourceError};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    /// Writes each document's `name`, failing on documents named "bad"
    struct NameExporter {
        layout: OutputLayout,
    }

    impl Exporter for NameExporter {
        fn label(&self) -> &str {
            "agency"
        }

        fn collection(&self) -> Collection {
            Collection::Agency
        }

        fn layout(&self) -> OutputLayout {
            self.layout
        }

        fn unit_path(&self, index: usize) -> PathBuf {
            PathBuf::from(format!("names/names{index}.txt"))
        }

        fn header(&self) -> String {
            "start\n".to_string()
        }

        fn footer(&self) -> String {
            "end\n".to_string()
        }

        fn render(
            &mut self,
            document: &SourceDocument,
            _source: &dyn RecordSource,
        ) -> ExportResult<Vec<String>> {
            match document.str_field("name") {
                Some("bad") => Err(ExportError::invalid_document("agency", "bad name")),
                Some("skip") => Ok(Vec::new()),
                Some(name) => Ok(vec![format!("{name}\n")]),
                None => Err(ExportError::invalid_document("agency", "no name")),
            }
        }

        fn trailing_items(&mut self) -> ExportResult<Vec<String>> {
            Ok(vec!["extra\n".to_string()])
        }
    }

    fn source(names: &[&str]) -> MemorySource {
        MemorySource::new().with_documents(
            Collection::Agency,
            names
                .iter()
                .enumerate()
                .map(|(i, name)| json!({"_id": format!("a{i}"), "name": name})),
        )
    }

    fn config(dir: &TempDir, batch_size: usize) -> ExportConfig {
        ExportConfig::new()
            .with_export_dir(dir.path())
            .with_batch_size(batch_size)
    }

    #[test]
    fn test_one_unit_per_batch() {
        let dir = TempDir::new().unwrap();
        let source = source(&["a", "b", "c"]);
        let driver = BatchDriver::new(&source, config(&dir, 2)).unwrap();
        let stats = driver
            .run(&mut NameExporter {
                layout: OutputLayout::PerBatch,
            })
            .unwrap();

        assert_eq!(stats.documents_read, 3);
        assert_eq!(stats.units.len(), 2);
        let first = fs::read_to_string(dir.path().join("names/names0.txt")).unwrap();
        assert_eq!(first, "start\na\nb\nend\n");
        let second = fs::read_to_string(dir.path().join("names/names1.txt")).unwrap();
        assert_eq!(second, "start\nc\nend\n");
    }

    #[test]
    fn test_failed_record_is_skipped() {
        let dir = TempDir::new().unwrap();
        let source = source(&["a", "bad", "c"]);
        let driver = BatchDriver::new(&source, config(&dir, 10)).unwrap();
        let stats = driver
            .run(&mut NameExporter {
                layout: OutputLayout::PerBatch,
            })
            .unwrap();

        assert_eq!(stats.records_exported, 2);
        assert_eq!(stats.records_failed, 1);
        assert_eq!(stats.errors.len(), 1);
        let unit = fs::read_to_string(dir.path().join("names/names0.txt")).unwrap();
        assert_eq!(unit, "start\na\nc\nend\n");
    }

    #[test]
    fn test_empty_batch_writes_no_unit() {
        let dir = TempDir::new().unwrap();
        let source = source(&["skip", "skip", "a"]);
        let driver = BatchDriver::new(&source, config(&dir, 2)).unwrap();
        let stats = driver
            .run(&mut NameExporter {
                layout: OutputLayout::PerBatch,
            })
            .unwrap();

        assert_eq!(stats.units, vec![dir.path().join("names/names1.txt")]);
        assert!(!dir.path().join("names/names0.txt").exists());
    }

    #[test]
    fn test_single_unit_collects_all_batches() {
        let dir = TempDir::new().unwrap();
        let source = source(&["a", "b", "c"]);
        let driver = BatchDriver::new(&source, config(&dir, 1)).unwrap();
        let stats = driver
            .run(&mut NameExporter {
                layout: OutputLayout::Single,
            })
            .unwrap();

        assert_eq!(stats.units.len(), 1);
        assert_eq!(stats.items_written, 4);
        let unit = fs::read_to_string(dir.path().join("names/names0.txt")).unwrap();
        assert_eq!(unit, "start\na\nb\nc\nextra\nend\n");
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let source = MemorySource::new();
        let result = BatchDriver::new(&source, ExportConfig::new().with_batch_size(0));
        assert!(matches!(result, Err(ExportError::InvalidConfig(_))));
    }

    #[test]
    fn test_fatal_errors() {
        let missing = ExportError::Source(SourceError::AttachmentNotFound {
            id: "1".to_string(),
            key: "photo".to_string(),
        });
        assert!(!missing.is_fatal());
        assert!(!ExportError::invalid_document("user", "x").is_fatal());
        let io = ExportError::Write {
            path: PathBuf::from("x"),
            source: std::io::Error::other("disk full"),
        };
        assert!(io.is_fatal());
    }

    #[test]
    fn test_log_id() {
        let doc = SourceDocument::from_value(
            json!({"_id": "0123456789abcdef0123456789abcdef"}),
            Collection::Child,
            0,
        )
        .unwrap();
        assert_eq!(log_id(&doc), "01234567-89ab-cdef-0123-456789abcdef");
        let doc = SourceDocument::from_value(json!({"_id": "short"}), Collection::Child, 0).unwrap();
        assert_eq!(log_id(&doc), "short");
    }
}
